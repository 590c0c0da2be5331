use serde::{Deserialize, Serialize};

use crate::features::classes::types::ClassRecord;
use crate::store::{CollectionPath, DocumentStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetClassQuery {
    pub class_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetClassError {
    #[error("Class '{0}' not found")]
    NotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn DocumentStore,
    query: GetClassQuery,
) -> Result<ClassRecord, GetClassError> {
    match store.get(&CollectionPath::classes(), &query.class_id).await {
        Ok(Some(document)) => Ok(ClassRecord::from_document(&document)),
        Ok(None) | Err(StoreError::InvalidPath(_)) => Err(GetClassError::NotFound(query.class_id)),
        Err(e) => Err(e.into()),
    }
}
