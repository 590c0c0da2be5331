//! Session-scoped student snapshot

use mygrade_common::{student::StudentSnapshot, MyGradeError};
use serde_json::Value;
use thiserror::Error;
use tower_sessions::{session::Error as SessionError, Session};

/// Session key of the saved student record
pub const STUDENT_RECORD_KEY: &str = "studentRecord";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] MyGradeError),
}

/// Reads and writes the student snapshot of one browser session.
///
/// Reading validates the stored shape; a value that is not a usable student
/// record is removed and reported as absent.
#[derive(Clone)]
pub struct SnapshotStore {
    session: Session,
}

impl SnapshotStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub async fn save(&self, snapshot: &StudentSnapshot) -> Result<(), SnapshotError> {
        self.session
            .insert(STUDENT_RECORD_KEY, snapshot.to_value()?)
            .await?;
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<StudentSnapshot>, SnapshotError> {
        let Some(value) = self.session.get::<Value>(STUDENT_RECORD_KEY).await? else {
            return Ok(None);
        };

        match StudentSnapshot::from_value(&value) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!("Discarding unusable student snapshot: {}", e);
                self.clear().await?;
                Ok(None)
            },
        }
    }

    /// Whether a record is saved, without validating it
    pub async fn is_saved(&self) -> Result<bool, SnapshotError> {
        Ok(self.session.get_value(STUDENT_RECORD_KEY).await?.is_some())
    }

    pub async fn clear(&self) -> Result<(), SnapshotError> {
        self.session.remove_value(STUDENT_RECORD_KEY).await?;
        Ok(())
    }
}
