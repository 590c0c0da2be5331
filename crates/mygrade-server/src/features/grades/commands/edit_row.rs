use mygrade_common::{
    grades::ID_NUMBER_KEY,
    sanitize::{sanitize_edit, RawRow},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dual_write;
use crate::store::{DocumentStore, StoreError};

/// Commit of one inline grid edit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRowCommand {
    #[serde(skip)]
    pub class_id: String,
    /// The row being edited; the ID itself cannot be changed
    #[serde(skip)]
    pub id_number: String,
    #[serde(default)]
    pub fields: RawRow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRowResponse {
    pub id_number: String,
    pub fields: RawRow,
}

#[derive(Debug, thiserror::Error)]
pub enum EditRowError {
    #[error("Student ID is required.")]
    MissingId,
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// Sanitize the edited cells and merge them into both collections.
///
/// Grade fields the edit did not carry keep their stored values.
#[tracing::instrument(skip(store, command), fields(class_id = %command.class_id, id_number = %command.id_number))]
pub async fn handle(
    store: &dyn DocumentStore,
    command: EditRowCommand,
) -> Result<EditRowResponse, EditRowError> {
    let mut row = command.fields;
    row.insert(
        ID_NUMBER_KEY.to_string(),
        Value::String(command.id_number.clone()),
    );

    let row = sanitize_edit(row).ok_or(EditRowError::MissingId)?;
    let response = EditRowResponse {
        id_number: row.id_number.clone(),
        fields: row.fields.clone(),
    };

    dual_write(store, &command.class_id, row).await?;

    tracing::info!("Grade row updated");
    Ok(response)
}
