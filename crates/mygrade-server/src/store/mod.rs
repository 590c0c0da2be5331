//! Document storage
//!
//! Grades and classes live in schemaless collections addressed the way a
//! hierarchical document database addresses them:
//!
//! - `classes/{classId}` - class roster entries
//! - `classes/{classId}/students/{idNumber}` - the per-class grade sheet
//! - `students/{idNumber}` - flat projection used by the public lookup
//!
//! A sub-collection is independent of its parent document: deleting
//! `classes/{id}` leaves `classes/{id}/students/*` in place, so cascades are
//! the caller's job.
//!
//! Two backends implement [`DocumentStore`]: [`memory::MemoryStore`] for
//! development and tests, and [`postgres::PostgresStore`] backed by a single
//! JSONB table with `LISTEN/NOTIFY` change feeds.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Body of a document
pub type Fields = Map<String, Value>;

const CLASSES: &str = "classes";
const STUDENTS: &str = "students";

/// Errors raised by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document '{collection}/{id}' not found")]
    NotFound { collection: String, id: String },

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: &CollectionPath, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Path of a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn classes() -> Self {
        Self(CLASSES.to_string())
    }

    pub fn students() -> Self {
        Self(STUDENTS.to_string())
    }

    /// `classes/{class_id}/students`
    pub fn class_students(class_id: &str) -> Result<Self, StoreError> {
        validate_document_id(class_id)?;
        Ok(Self(format!("{}/{}/{}", CLASSES, class_id, STUDENTS)))
    }

    /// Parse a path received from a change feed.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            [CLASSES] => Ok(Self::classes()),
            [STUDENTS] => Ok(Self::students()),
            [CLASSES, class_id, STUDENTS] => Self::class_students(class_id),
            _ => Err(StoreError::InvalidPath(path.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document IDs are single, non-empty path segments.
pub fn validate_document_id(id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(StoreError::InvalidPath(id.to_string()));
    }
    Ok(())
}

/// One stored document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    /// String value of a top-level field, if it holds one
    pub fn text(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Collection-oriented document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    async fn get(&self, collection: &CollectionPath, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Every document of a collection, ordered by ID
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    /// Insert a document under a generated ID and return that ID.
    async fn add(&self, collection: &CollectionPath, data: Fields) -> Result<String, StoreError>;

    /// Create the document or merge `data` into it, key by key at the top level.
    async fn set_merge(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError>;

    /// Merge `data` into an existing document; [`StoreError::NotFound`] otherwise.
    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<(), StoreError>;

    /// Feed of collections touched by writes
    fn changes(&self) -> broadcast::Receiver<CollectionPath>;
}

/// Full contents of a collection at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub collection: String,
    pub documents: Vec<Document>,
}

/// Live view of one collection.
///
/// The first call to [`Subscription::next`] yields the current contents;
/// every later call waits for a write to the collection and yields the new
/// contents. The change feed is attached when the subscription is opened, so
/// writes that land between opening and the first snapshot are not lost.
/// Dropping the subscription closes it.
pub struct Subscription {
    store: Arc<dyn DocumentStore>,
    collection: CollectionPath,
    changes: broadcast::Receiver<CollectionPath>,
    primed: bool,
}

impl Subscription {
    pub fn open(store: Arc<dyn DocumentStore>, collection: CollectionPath) -> Self {
        let changes = store.changes();
        Self {
            store,
            collection,
            changes,
            primed: false,
        }
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Next snapshot, or `None` once the store's change feed has closed.
    pub async fn next(&mut self) -> Option<Result<Snapshot, StoreError>> {
        if !self.primed {
            self.primed = true;
            return Some(self.fetch().await);
        }

        loop {
            match self.changes.recv().await {
                Ok(changed) if changed == self.collection => return Some(self.fetch().await),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        collection = %self.collection,
                        skipped,
                        "Subscription lagged behind the change feed, re-reading collection"
                    );
                    return Some(self.fetch().await);
                },
                Err(RecvError::Closed) => return None,
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot, StoreError> {
        let documents = self.store.list(&self.collection).await?;
        Ok(Snapshot {
            collection: self.collection.to_string(),
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(CollectionPath::classes().as_str(), "classes");
        assert_eq!(CollectionPath::students().as_str(), "students");
        assert_eq!(
            CollectionPath::class_students("abc").unwrap().as_str(),
            "classes/abc/students"
        );
        assert!(CollectionPath::class_students("").is_err());
        assert!(CollectionPath::class_students("a/b").is_err());
    }

    #[test]
    fn test_parse_round_trip() {
        for path in [
            CollectionPath::classes(),
            CollectionPath::students(),
            CollectionPath::class_students("c1").unwrap(),
        ] {
            assert_eq!(CollectionPath::parse(path.as_str()).unwrap(), path);
        }
        assert!(CollectionPath::parse("classes/c1").is_err());
        assert!(CollectionPath::parse("teachers").is_err());
    }

    #[tokio::test]
    async fn test_subscription_yields_initial_then_changes() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let classes = CollectionPath::classes();
        let mut subscription = Subscription::open(store.clone(), classes.clone());

        let initial = subscription.next().await.unwrap().unwrap();
        assert!(initial.documents.is_empty());

        // writes elsewhere are not delivered
        store
            .set_merge(&CollectionPath::students(), "1", fields(json!({ "a": 1 })))
            .await
            .unwrap();
        store
            .add(&classes, fields(json!({ "courseCode": "IT101" })))
            .await
            .unwrap();

        let next = subscription.next().await.unwrap().unwrap();
        assert_eq!(next.collection, "classes");
        assert_eq!(next.documents.len(), 1);
        assert_eq!(next.documents[0].text("courseCode"), Some("IT101"));
    }
}
