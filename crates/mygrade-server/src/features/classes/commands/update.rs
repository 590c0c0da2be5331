use serde::{Deserialize, Serialize};

use super::create::{class_fields, validate_class_fields};
use crate::features::classes::types::{ClassRecord, UPDATED_AT_KEY};
use crate::features::shared::validation::RequiredFieldsError;
use crate::store::{CollectionPath, DocumentStore, StoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassCommand {
    #[serde(skip)]
    pub class_id: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub year_section: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateClassError {
    #[error(transparent)]
    Validation(#[from] RequiredFieldsError),
    #[error("Class '{0}' not found")]
    NotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl UpdateClassCommand {
    pub fn validate(&self) -> Result<(), RequiredFieldsError> {
        validate_class_fields(&self.course_code, &self.subject_name, &self.year_section)
    }
}

/// Rewrite an existing class in place. Never creates a document.
#[tracing::instrument(skip(store), fields(class_id = %command.class_id))]
pub async fn handle(
    store: &dyn DocumentStore,
    command: UpdateClassCommand,
) -> Result<ClassRecord, UpdateClassError> {
    command.validate()?;

    let collection = CollectionPath::classes();
    let data = class_fields(
        &command.course_code,
        &command.subject_name,
        &command.year_section,
        UPDATED_AT_KEY,
    );

    store
        .update(&collection, &command.class_id, data)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } | StoreError::InvalidPath(_) => {
                UpdateClassError::NotFound(command.class_id.clone())
            },
            other => UpdateClassError::Store(other),
        })?;

    let document = store
        .get(&collection, &command.class_id)
        .await?
        .ok_or_else(|| UpdateClassError::NotFound(command.class_id.clone()))?;

    tracing::info!("Class updated");
    Ok(ClassRecord::from_document(&document))
}
