//! In-memory record store

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::visitor::VisitorRecord,
};

use super::RecordStore;

/// Volatile store, used by tests and the `memory` backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<VisitorRecord>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<VisitorRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Vec<VisitorRecord>>> {
        self.records
            .lock()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_all(&self) -> AppResult<Vec<VisitorRecord>> {
        Ok(self.lock()?.clone())
    }

    async fn save_all(&self, records: &[VisitorRecord]) -> AppResult<()> {
        *self.lock()? = records.to_vec();
        Ok(())
    }

    async fn append(&self, record: VisitorRecord) -> AppResult<()> {
        self.lock()?.push(record);
        Ok(())
    }
}
