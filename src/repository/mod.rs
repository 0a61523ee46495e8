//! Repository layer: the book store contract and its backends

pub mod books;
pub mod memory;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tokio_stream::Stream;

use crate::{
    config::{DatabaseConfig, StorageBackend},
    error::AppResult,
    models::{BookId, BookRecord},
};

/// Lazily consumed sequence of stored records
pub type BookStream = Pin<Box<dyn Stream<Item = AppResult<BookRecord>> + Send>>;

/// Persistence contract used by the collection and the identifier generator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert or replace a record, returning the saved value
    async fn create_or_update(&self, record: BookRecord) -> AppResult<BookRecord>;

    async fn delete(&self, record: &BookRecord) -> AppResult<()>;

    async fn find_by_id(&self, id: &BookId) -> AppResult<Option<BookRecord>>;

    /// All records, in the backend's iteration order
    fn find_all(&self) -> BookStream;

    async fn exists_by_id(&self, id: &BookId) -> AppResult<bool>;
}

/// Open the configured store. For PostgreSQL this also runs pending migrations.
pub async fn open(
    backend: StorageBackend,
    database: &DatabaseConfig,
) -> AppResult<Arc<dyn BookStore>> {
    match backend {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory book store, data is lost on shutdown");
            Ok(Arc::new(memory::InMemoryBookStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .min_connections(database.min_connections)
                .connect(&database.url)
                .await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| crate::error::AppError::Internal(format!("Migration failed: {}", e)))?;
            tracing::info!("Database migrations completed");

            Ok(Arc::new(books::BooksRepository::new(pool)))
        }
    }
}
