use serde::Serialize;

use crate::features::classes::types::ClassRecord;
use crate::features::grades::grid::{build_grid, GridQuery, GridView};
use crate::store::{CollectionPath, DocumentStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct ListRowsQuery {
    pub class_id: String,
    pub grid: GridQuery,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRowsResponse {
    /// `courseCode - yearSection`
    pub header: String,
    pub class: ClassRecord,
    #[serde(flatten)]
    pub grid: GridView,
}

#[derive(Debug, thiserror::Error)]
pub enum ListRowsError {
    #[error("Class '{0}' not found")]
    ClassNotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// Look up the class a grid belongs to.
pub(crate) async fn load_class(
    store: &dyn DocumentStore,
    class_id: &str,
) -> Result<ClassRecord, ListRowsError> {
    match store.get(&CollectionPath::classes(), class_id).await {
        Ok(Some(document)) => Ok(ClassRecord::from_document(&document)),
        Ok(None) | Err(StoreError::InvalidPath(_)) => {
            Err(ListRowsError::ClassNotFound(class_id.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(skip(store), fields(class_id = %query.class_id))]
pub async fn handle(
    store: &dyn DocumentStore,
    query: ListRowsQuery,
) -> Result<ListRowsResponse, ListRowsError> {
    let class = load_class(store, &query.class_id).await?;
    let roster = CollectionPath::class_students(&query.class_id)?;
    let documents = store.list(&roster).await?;

    Ok(ListRowsResponse {
        header: class.header(),
        class,
        grid: build_grid(&documents, &query.grid),
    })
}
