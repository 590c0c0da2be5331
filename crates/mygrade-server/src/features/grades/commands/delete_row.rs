use mygrade_common::grades::{value_to_text, FIRST_NAME_KEY, LAST_NAME_KEY};
use serde::{Deserialize, Serialize};

use crate::store::{CollectionPath, DocumentStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRowCommand {
    pub class_id: String,
    pub id_number: String,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRowResponse {
    pub id_number: String,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteRowError {
    #[error("{prompt}")]
    ConfirmationRequired { prompt: String },
    #[error("Student '{0}' not found in this class")]
    NotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// `Are you sure you want to delete LAST, FIRST?` with the names as stored
pub fn delete_prompt(last_name: &str, first_name: &str) -> String {
    format!("Are you sure you want to delete {}, {}?", last_name, first_name)
}

/// Delete a student from the class sheet and the flat lookup collection.
#[tracing::instrument(skip(store), fields(class_id = %command.class_id, id_number = %command.id_number))]
pub async fn handle(
    store: &dyn DocumentStore,
    command: DeleteRowCommand,
) -> Result<DeleteRowResponse, DeleteRowError> {
    let roster = CollectionPath::class_students(&command.class_id)
        .map_err(|_| DeleteRowError::NotFound(command.id_number.clone()))?;

    let document = match store.get(&roster, &command.id_number).await {
        Ok(Some(document)) => document,
        Ok(None) | Err(StoreError::InvalidPath(_)) => {
            return Err(DeleteRowError::NotFound(command.id_number))
        },
        Err(e) => return Err(e.into()),
    };

    if !command.confirmed {
        let name = |key: &str| document.data.get(key).map(value_to_text).unwrap_or_default();
        return Err(DeleteRowError::ConfirmationRequired {
            prompt: delete_prompt(&name(LAST_NAME_KEY), &name(FIRST_NAME_KEY)),
        });
    }

    store.delete(&roster, &command.id_number).await?;
    store
        .delete(&CollectionPath::students(), &command.id_number)
        .await?;

    tracing::info!("Grade row deleted");
    Ok(DeleteRowResponse {
        id_number: command.id_number,
        deleted: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{seed_class, seed_student};
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn seeded() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let class_id = seed_class(&store, "IT101", "Programming", "BSIT 1A").await;
        seed_student(
            &store,
            &class_id,
            json!({ "idNumber": "1", "firstName": "Ana", "lastName": "Reyes" }),
        )
        .await;
        (store, class_id)
    }

    #[tokio::test]
    async fn test_prompt_uses_stored_names() {
        let (store, class_id) = seeded().await;

        let result = handle(
            &store,
            DeleteRowCommand {
                class_id,
                id_number: "1".to_string(),
                confirmed: false,
            },
        )
        .await;
        match result {
            Err(DeleteRowError::ConfirmationRequired { prompt }) => {
                assert_eq!(prompt, "Are you sure you want to delete Reyes, Ana?")
            },
            other => panic!("expected a confirmation prompt, got {:?}", other),
        }
        assert!(store.get(&CollectionPath::students(), "1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_both_documents() {
        let (store, class_id) = seeded().await;

        let result = handle(
            &store,
            DeleteRowCommand {
                class_id: class_id.clone(),
                id_number: "1".to_string(),
                confirmed: true,
            },
        )
        .await;
        assert!(result.is_ok());

        let roster = CollectionPath::class_students(&class_id).unwrap();
        assert!(store.get(&roster, "1").await.unwrap().is_none());
        assert!(store.get(&CollectionPath::students(), "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_row() {
        let (store, class_id) = seeded().await;
        let result = handle(
            &store,
            DeleteRowCommand {
                class_id,
                id_number: "2".to_string(),
                confirmed: true,
            },
        )
        .await;
        assert!(matches!(result, Err(DeleteRowError::NotFound(_))));
    }
}
