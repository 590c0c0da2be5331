//! In-memory session records with expiry pruning

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};

/// Session store kept in process memory.
///
/// Expired records are never returned, and [`SessionMemory::prune`] drops
/// them for good. Run [`SessionMemory::spawn_pruning`] in a server so that
/// browsers which never come back do not accumulate.
#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired record. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| record.expiry_date > now);
        before - records.len()
    }

    /// Prune every `period` until the runtime shuts down.
    pub fn spawn_pruning(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let pruned = store.prune();
                if pruned > 0 {
                    tracing::debug!(pruned, "Expired sessions pruned");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Id, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for SessionMemory {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.lock();
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.lock().insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .lock()
            .get(id)
            .filter(|record| record.expiry_date > now)
            .cloned())
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.lock().remove(id);
        Ok(())
    }
}
