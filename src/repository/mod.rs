//! Repository layer: the persistence boundary holding visitor records

pub mod json_file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::AppResult,
    models::visitor::VisitorRecord,
};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Load-all / save-all access to the visitor records.
///
/// The collection is unordered by contract. There is no transactional
/// guarantee between calls: the last writer wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every stored record. A store that holds nothing yet returns an empty vector.
    async fn load_all(&self) -> AppResult<Vec<VisitorRecord>>;

    /// Replace the whole collection.
    async fn save_all(&self, records: &[VisitorRecord]) -> AppResult<()>;

    /// Add one record.
    async fn append(&self, record: VisitorRecord) -> AppResult<()>;

    /// Set the departure of the first open record arriving at `arrival`.
    /// Returns `false` when no open record matches.
    async fn mark_departure(
        &self,
        arrival: NaiveDateTime,
        at: NaiveDateTime,
    ) -> AppResult<bool> {
        let mut records = self.load_all().await?;
        let Some(record) = records
            .iter_mut()
            .find(|r| r.arrival == arrival && r.is_open())
        else {
            return Ok(false);
        };
        record.check_out(at)?;
        self.save_all(&records).await?;
        Ok(true)
    }
}

/// Open the store selected in the configuration
pub async fn connect(config: &StorageConfig) -> AppResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&config.path)),
        StorageBackend::Sqlite => Arc::new(SqliteStore::connect(&config.url).await?),
        StorageBackend::Memory => Arc::new(MemoryStore::default()),
    };
    Ok(store)
}
