//! Test helpers for feature tests
//!
//! # Examples
//!
//! ```rust,ignore
//! let store = FaultyStore::failing_at_write(1);
//! seed_class(store.inner(), "IT101", "Programming", "BSIT 1A").await;
//! // the second write through `store` fails
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

use crate::store::{
    CollectionPath, Document, DocumentStore, Fields, MemoryStore, StoreError,
};

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

/// Insert a class document and return its ID
pub async fn seed_class(
    store: &dyn DocumentStore,
    course_code: &str,
    subject_name: &str,
    year_section: &str,
) -> String {
    store
        .add(
            &CollectionPath::classes(),
            fields(json!({
                "courseCode": course_code,
                "subjectName": subject_name,
                "yearSection": year_section,
            })),
        )
        .await
        .unwrap()
}

/// Insert a student into a class sheet and the flat collection
pub async fn seed_student(store: &dyn DocumentStore, class_id: &str, data: Value) {
    let data = fields(data);
    let id = data["idNumber"].as_str().unwrap().to_string();
    store
        .set_merge(
            &CollectionPath::class_students(class_id).unwrap(),
            &id,
            data.clone(),
        )
        .await
        .unwrap();
    let mut flat = data;
    flat.insert("classId".to_string(), json!(class_id));
    store
        .set_merge(&CollectionPath::students(), &id, flat)
        .await
        .unwrap();
}

/// Memory store whose N-th write (0-based, counted across add, set_merge,
/// update and delete) fails with [`StoreError::Unavailable`]. Reads always
/// succeed.
pub struct FaultyStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    fail_at: usize,
}

impl FaultyStore {
    pub fn failing_at_write(fail_at: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            writes: AtomicUsize::new(0),
            fail_at,
        }
    }

    /// Direct access for seeding, bypassing the write counter
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(
        &self,
        collection: &CollectionPath,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection).await
    }

    async fn add(&self, collection: &CollectionPath, data: Fields) -> Result<String, StoreError> {
        self.check_write()?;
        self.inner.add(collection, data).await
    }

    async fn set_merge(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.set_merge(collection, id, data).await
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.update(collection, id, data).await
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.delete(collection, id).await
    }

    fn changes(&self) -> broadcast::Receiver<CollectionPath> {
        self.inner.changes()
    }
}
