use mygrade_common::sanitize::sanitize_row;
use serde::{Deserialize, Serialize};

use super::dual_write;
use crate::features::grades::spreadsheet::{self, SpreadsheetError};
use crate::store::{CollectionPath, DocumentStore, StoreError};

/// Largest accepted workbook
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit of upload routes: the workbook plus multipart framing
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadGradesCommand {
    pub class_id: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGradesResponse {
    pub class_id: String,
    pub uploaded: usize,
    /// Rows without a student ID
    pub skipped: usize,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadGradesError {
    #[error("Please choose a spreadsheet to upload.")]
    MissingFile,
    #[error("File exceeds the {} MB upload limit", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge,
    #[error("Class '{0}' not found")]
    ClassNotFound(String),
    #[error(transparent)]
    Parse(#[from] SpreadsheetError),
    #[error("Database error: {source}")]
    Store {
        #[source]
        source: StoreError,
        /// Rows written before the failure; they are not rolled back
        uploaded: usize,
    },
}

impl UploadGradesCommand {
    pub fn validate(&self) -> Result<(), UploadGradesError> {
        if self.bytes.is_empty() {
            return Err(UploadGradesError::MissingFile);
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadGradesError::TooLarge);
        }
        Ok(())
    }
}

impl From<StoreError> for UploadGradesError {
    fn from(source: StoreError) -> Self {
        UploadGradesError::Store {
            source,
            uploaded: 0,
        }
    }
}

/// Import a grade sheet into a class.
///
/// The workbook is parsed in full before anything is written. Rows are then
/// sanitized and written one at a time; a failed write stops the import and
/// leaves the rows before it in place.
#[tracing::instrument(
    skip(store, command),
    fields(class_id = %command.class_id, file = ?command.file_name, size = command.bytes.len())
)]
pub async fn handle(
    store: &dyn DocumentStore,
    command: UploadGradesCommand,
) -> Result<UploadGradesResponse, UploadGradesError> {
    command.validate()?;

    let class_exists = match store.get(&CollectionPath::classes(), &command.class_id).await {
        Ok(document) => document.is_some(),
        Err(StoreError::InvalidPath(_)) => false,
        Err(e) => return Err(e.into()),
    };
    if !class_exists {
        return Err(UploadGradesError::ClassNotFound(command.class_id));
    }

    let rows = spreadsheet::read_rows(command.bytes).await.map_err(|e| {
        tracing::warn!("Rejected grade spreadsheet: {:?}", e);
        e
    })?;
    let total = rows.len();

    let mut uploaded = 0;
    for row in rows.into_iter().filter_map(sanitize_row) {
        if let Err(source) = dual_write(store, &command.class_id, row).await {
            tracing::error!(uploaded, "Grade upload stopped: {}", source);
            return Err(UploadGradesError::Store { source, uploaded });
        }
        uploaded += 1;
    }

    let skipped = total - uploaded;
    tracing::info!(uploaded, skipped, "Grade spreadsheet imported");

    Ok(UploadGradesResponse {
        class_id: command.class_id,
        uploaded,
        skipped,
        message: format!("{} records uploaded.", uploaded),
    })
}
