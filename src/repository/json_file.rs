//! Flat-file record store: one JSON array of visitor objects

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::visitor::VisitorRecord,
};

use super::RecordStore;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a garbled register file is moved aside before being replaced
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Copy the current file aside if it exists but is not a JSON array,
    /// so the next write does not destroy it.
    async fn preserve_garbled(&self) -> AppResult<()> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace)
            || serde_json::from_slice::<Vec<serde_json::Value>>(&bytes).is_ok()
        {
            return Ok(());
        }

        let backup = self.backup_path();
        tokio::fs::write(&backup, &bytes).await?;
        tracing::error!(
            "Register file {} is corrupt, previous content saved to {}",
            self.path.display(),
            backup.display()
        );
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    /// A missing, unreadable or non-array file reads as an empty register.
    /// A well-formed array holding an unparseable record is an error.
    async fn load_all(&self) -> AppResult<Vec<VisitorRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No register file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!("Cannot read register file {}: {}", self.path.display(), e);
                return Ok(Vec::new());
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(
                    "Register file {} is corrupt, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                return Ok(Vec::new());
            }
        };

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|e| AppError::CorruptRecord {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn save_all(&self, records: &[VisitorRecord]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        self.preserve_garbled().await?;
        let body = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&self.path, body).await?;
        tracing::debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    async fn append(&self, record: VisitorRecord) -> AppResult<()> {
        let mut records = self.load_all().await?;
        records.push(record);
        self.save_all(&records).await
    }
}
