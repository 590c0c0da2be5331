use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::features::classes::types::{
    ClassRecord, COURSE_CODE_KEY, CREATED_AT_KEY, SUBJECT_NAME_KEY, YEAR_SECTION_KEY,
};
use crate::features::shared::validation::{
    require_fields, RequiredFieldsError, COMPLETE_REQUIRED_FIELDS,
};
use crate::store::{CollectionPath, Document, DocumentStore, Fields, StoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassCommand {
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub year_section: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateClassError {
    #[error(transparent)]
    Validation(#[from] RequiredFieldsError),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl CreateClassCommand {
    pub fn validate(&self) -> Result<(), RequiredFieldsError> {
        validate_class_fields(&self.course_code, &self.subject_name, &self.year_section)
    }
}

pub(crate) fn validate_class_fields(
    course_code: &str,
    subject_name: &str,
    year_section: &str,
) -> Result<(), RequiredFieldsError> {
    require_fields(
        &[
            (COURSE_CODE_KEY, course_code),
            (SUBJECT_NAME_KEY, subject_name),
            (YEAR_SECTION_KEY, year_section),
        ],
        COMPLETE_REQUIRED_FIELDS,
    )
}

/// Trimmed class fields plus a timestamp under `timestamp_key`
pub(crate) fn class_fields(
    course_code: &str,
    subject_name: &str,
    year_section: &str,
    timestamp_key: &str,
) -> Fields {
    let mut data = Fields::new();
    data.insert(COURSE_CODE_KEY.to_string(), json!(course_code.trim()));
    data.insert(SUBJECT_NAME_KEY.to_string(), json!(subject_name.trim()));
    data.insert(YEAR_SECTION_KEY.to_string(), json!(year_section.trim()));
    data.insert(timestamp_key.to_string(), json!(Utc::now().to_rfc3339()));
    data
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn DocumentStore,
    command: CreateClassCommand,
) -> Result<ClassRecord, CreateClassError> {
    command.validate()?;

    let data = class_fields(
        &command.course_code,
        &command.subject_name,
        &command.year_section,
        CREATED_AT_KEY,
    );
    let id = store.add(&CollectionPath::classes(), data.clone()).await?;

    tracing::info!(class_id = %id, "Class created");
    Ok(ClassRecord::from_document(&Document { id, data }))
}
