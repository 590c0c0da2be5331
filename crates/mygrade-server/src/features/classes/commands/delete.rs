use serde::{Deserialize, Serialize};

use crate::store::{CollectionPath, DocumentStore, StoreError};

pub const DELETE_CLASS_PROMPT: &str = "Delete this class and all students inside it?";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteClassCommand {
    pub class_id: String,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteClassResponse {
    pub class_id: String,
    pub students_deleted: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteClassError {
    #[error("Delete this class and all students inside it?")]
    ConfirmationRequired,
    #[error("Class '{0}' not found")]
    NotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// Delete a class together with its student sheet.
///
/// Nested students are deleted one at a time, then the class document. A
/// failure stops the cascade before the class document is touched; students
/// deleted so far stay deleted. Flat `students/{id}` records are left alone.
#[tracing::instrument(skip(store), fields(class_id = %command.class_id))]
pub async fn handle(
    store: &dyn DocumentStore,
    command: DeleteClassCommand,
) -> Result<DeleteClassResponse, DeleteClassError> {
    if !command.confirmed {
        return Err(DeleteClassError::ConfirmationRequired);
    }

    let classes = CollectionPath::classes();
    let exists = match store.get(&classes, &command.class_id).await {
        Ok(document) => document.is_some(),
        Err(StoreError::InvalidPath(_)) => false,
        Err(e) => return Err(e.into()),
    };
    if !exists {
        return Err(DeleteClassError::NotFound(command.class_id));
    }

    let roster = CollectionPath::class_students(&command.class_id)?;
    let students = store.list(&roster).await?;

    let mut students_deleted = 0;
    for student in &students {
        if let Err(e) = store.delete(&roster, &student.id).await {
            tracing::error!(
                students_deleted,
                remaining = students.len() - students_deleted,
                "Cascade delete stopped: {}",
                e
            );
            return Err(e.into());
        }
        students_deleted += 1;
    }

    store.delete(&classes, &command.class_id).await?;

    tracing::info!(students_deleted, "Class deleted");
    Ok(DeleteClassResponse {
        class_id: command.class_id,
        students_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{seed_class, seed_student, FaultyStore};
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn seed_roster(store: &dyn DocumentStore) -> String {
        let id = seed_class(store, "IT101", "Programming", "BSIT 1A").await;
        for (number, name) in [("1", "Ana"), ("2", "Ben"), ("3", "Cy")] {
            seed_student(
                store,
                &id,
                json!({ "idNumber": number, "firstName": name, "lastName": "Reyes" }),
            )
            .await;
        }
        id
    }

    #[tokio::test]
    async fn test_handle_requires_confirmation() {
        let store = MemoryStore::new();
        let id = seed_roster(&store).await;

        let result = handle(
            &store,
            DeleteClassCommand {
                class_id: id.clone(),
                confirmed: false,
            },
        )
        .await;
        assert!(matches!(result, Err(DeleteClassError::ConfirmationRequired)));
        assert!(store.get(&CollectionPath::classes(), &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_handle_cascades() {
        let store = MemoryStore::new();
        let id = seed_roster(&store).await;

        let result = handle(
            &store,
            DeleteClassCommand {
                class_id: id.clone(),
                confirmed: true,
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().students_deleted, 3);

        assert!(store.get(&CollectionPath::classes(), &id).await.unwrap().is_none());
        let roster = CollectionPath::class_students(&id).unwrap();
        assert!(store.list(&roster).await.unwrap().is_empty());
        // flat records survive the cascade
        assert_eq!(store.list(&CollectionPath::students()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_stops_before_class_delete() {
        // writes: delete student 1 (ok), delete student 2 (fails)
        let store = FaultyStore::failing_at_write(1);
        let id = seed_roster(store.inner()).await;

        let result = handle(
            &store,
            DeleteClassCommand {
                class_id: id.clone(),
                confirmed: true,
            },
        )
        .await;
        assert!(matches!(result, Err(DeleteClassError::Store(_))));

        let roster = CollectionPath::class_students(&id).unwrap();
        let left: Vec<String> = store
            .list(&roster)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(left, vec!["2", "3"]);
        assert!(store.get(&CollectionPath::classes(), &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_handle_unknown_class() {
        let store = MemoryStore::new();
        let result = handle(
            &store,
            DeleteClassCommand {
                class_id: "missing".to_string(),
                confirmed: true,
            },
        )
        .await;
        assert!(matches!(result, Err(DeleteClassError::NotFound(_))));
    }
}
