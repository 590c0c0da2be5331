pub mod delete_row;
pub mod edit_row;
pub mod upload;

use mygrade_common::{grades::CLASS_ID_KEY, sanitize::SanitizedRow};
use serde_json::Value;

use crate::store::{CollectionPath, DocumentStore, StoreError};

pub use delete_row::{DeleteRowCommand, DeleteRowError, DeleteRowResponse};
pub use edit_row::{EditRowCommand, EditRowError, EditRowResponse};
pub use upload::{UploadGradesCommand, UploadGradesError, UploadGradesResponse};

/// Merge a sanitized row into the class sheet, then into the flat lookup
/// collection with the owning class attached.
pub(crate) async fn dual_write(
    store: &dyn DocumentStore,
    class_id: &str,
    row: SanitizedRow,
) -> Result<(), StoreError> {
    let roster = CollectionPath::class_students(class_id)?;
    store.set_merge(&roster, &row.id_number, row.fields.clone()).await?;

    let mut flat = row.fields;
    flat.insert(CLASS_ID_KEY.to_string(), Value::String(class_id.to_string()));
    store
        .set_merge(&CollectionPath::students(), &row.id_number, flat)
        .await
}
