mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Filter, Patch, Record};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no records found")]
    NotFound,

    #[error("url or short code already stored")]
    Duplicate,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            err => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What the record service needs from a persistence backend.
///
/// Lookups follow the dual-key rule of [`Filter::matches`]: a record is
/// located by its URL or by its short code, and at most one record is ever
/// affected.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Stores a new record and returns the id assigned to it. Fails with
    /// [`StoreError::Duplicate`] when its url or short code is already held.
    async fn insert(&self, record: &Record) -> StoreResult<String>;

    async fn find_one(&self, filter: &Filter) -> StoreResult<Record>;

    /// Merges the fields present in `patch` into the record matching
    /// `filter`, leaving every other field untouched. Fails with
    /// [`StoreError::Duplicate`] when the patch would take another record's
    /// url or short code.
    async fn update_one(&self, filter: &Filter, patch: &Patch) -> StoreResult<()>;

    async fn delete_one(&self, filter: &Filter) -> StoreResult<()>;

    /// Up to `limit` records in store order.
    async fn find_many(&self, limit: usize) -> StoreResult<Vec<Record>>;
}

/// Opens the SQLite store at `database_url`, or an in-memory store when no
/// database is configured.
pub async fn connect(database_url: Option<&str>) -> StoreResult<Arc<dyn RecordStore>> {
    match database_url {
        Some(url) => {
            let store = SqliteStore::connect(url).await?;
            tracing::info!(database_url = url, "using sqlite store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
