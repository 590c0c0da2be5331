//! PostgreSQL document store
//!
//! All collections share the `documents` table (see `migrations/`). Writes
//! fire a trigger that publishes the collection path on the
//! `document_changes` channel; a background listener forwards those
//! notifications to subscribers.

use async_trait::async_trait;
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    types::Json,
    PgPool, Row,
};
use std::time::Duration;
use tokio::{sync::broadcast, task::JoinHandle};
use uuid::Uuid;

use super::{
    validate_document_id, CollectionPath, Document, DocumentStore, Fields, StoreError,
};
use crate::config::DatabaseConfig;

/// Channel the `documents` trigger notifies on
pub const CHANGE_CHANNEL: &str = "document_changes";

const CHANGE_FEED_CAPACITY: usize = 256;
const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Create a connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool established"
    );

    Ok(pool)
}

/// Apply the bundled migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub struct PostgresStore {
    pool: PgPool,
    changes: broadcast::Sender<CollectionPath>,
    listener: JoinHandle<()>,
}

impl PostgresStore {
    /// Wrap a pool and start forwarding change notifications.
    pub async fn connect(pool: PgPool) -> Result<Self, StoreError> {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let feed = changes.clone();
        let listener = tokio::spawn(async move { forward_notifications(listener, feed).await });

        Ok(Self {
            pool,
            changes,
            listener,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for PostgresStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn forward_notifications(
    mut listener: PgListener,
    changes: broadcast::Sender<CollectionPath>,
) {
    loop {
        match listener.recv().await {
            Ok(notification) => match CollectionPath::parse(notification.payload()) {
                Ok(collection) => {
                    let _ = changes.send(collection);
                },
                Err(e) => {
                    tracing::warn!(payload = notification.payload(), "Ignoring change notification: {}", e);
                },
            },
            Err(e) => {
                // PgListener reconnects on the next recv.
                tracing::error!("Change listener error: {}", e);
                tokio::time::sleep(LISTENER_RETRY_DELAY).await;
            },
        }
    }
}

fn to_document(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    let id: String = row.try_get("id")?;
    let Json(data): Json<Fields> = row.try_get("data")?;
    Ok(Document { id, data })
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get(
        &self,
        collection: &CollectionPath,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        validate_document_id(id)?;
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(to_document).transpose()
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = $1 ORDER BY id")
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(to_document).collect()
    }

    #[tracing::instrument(skip(self, data), fields(collection = %collection))]
    async fn add(&self, collection: &CollectionPath, data: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(Json(&data))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    #[tracing::instrument(skip(self, data), fields(collection = %collection))]
    async fn set_merge(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError> {
        validate_document_id(id)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, data), fields(collection = %collection))]
    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Fields,
    ) -> Result<(), StoreError> {
        validate_document_id(id)?;
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(collection = %collection))]
    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<(), StoreError> {
        validate_document_id(id)?;
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<CollectionPath> {
        self.changes.subscribe()
    }
}
