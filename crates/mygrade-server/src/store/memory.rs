//! In-process document store

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{
    validate_document_id, CollectionPath, Document, DocumentStore, Fields, StoreError,
};

const CHANGE_FEED_CAPACITY: usize = 256;

type Collection = BTreeMap<String, Fields>;

/// Document store held entirely in memory. Contents are lost on restart.
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionPath, Collection>>,
    changes: broadcast::Sender<CollectionPath>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn announce(&self, collection: &CollectionPath) {
        // No subscribers is fine.
        let _ = self.changes.send(collection.clone());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(
        &self,
        collection: &CollectionPath,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        validate_document_id(id)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add(&self, collection: &CollectionPath, data: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.clone())
                .or_default()
                .insert(id.clone(), data);
        }
        self.announce(collection);
        Ok(id)
    }

    async fn set_merge(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError> {
        validate_document_id(id)?;
        {
            let mut collections = self.collections.write().await;
            let document = collections
                .entry(collection.clone())
                .or_default()
                .entry(id.to_string())
                .or_default();
            document.extend(data);
        }
        self.announce(collection);
        Ok(())
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError> {
        validate_document_id(id)?;
        {
            let mut collections = self.collections.write().await;
            let document = collections
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            document.extend(data);
        }
        self.announce(collection);
        Ok(())
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<(), StoreError> {
        validate_document_id(id)?;
        let removed = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(collection)
                .and_then(|documents| documents.remove(id))
                .is_some()
        };
        if removed {
            self.announce(collection);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<CollectionPath> {
        self.changes.subscribe()
    }
}
