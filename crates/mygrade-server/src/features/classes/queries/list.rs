use serde::{Deserialize, Serialize};

use crate::features::classes::types::{filter_classes, ClassRecord};
use crate::store::{CollectionPath, DocumentStore, StoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListClassesQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListClassesResponse {
    pub classes: Vec<ClassRecord>,
    pub total: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ListClassesError {
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl ListClassesQuery {
    /// The search term, if it is not blank
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn DocumentStore,
    query: ListClassesQuery,
) -> Result<ListClassesResponse, ListClassesError> {
    let documents = store.list(&CollectionPath::classes()).await?;
    let classes = filter_classes(&documents, query.term());

    Ok(ListClassesResponse {
        total: classes.len(),
        classes,
    })
}
