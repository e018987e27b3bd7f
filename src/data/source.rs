//! Row sources the snapshot store can load from

use std::path::PathBuf;

use super::loader::load_directory;
use super::snapshot::Dataset;
use crate::error::DataError;

#[async_trait::async_trait]
pub trait DatasetSource: Send + Sync {
    /// Build a complete dataset; partial results are never returned
    async fn load(&self) -> Result<Dataset, DataError>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Loads the CSV exports found in one directory
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl DatasetSource for CsvDirectorySource {
    async fn load(&self) -> Result<Dataset, DataError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_directory(&dir))
            .await
            .map_err(|e| DataError::Task(e.to_string()))?
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.dir.display())
    }
}

/// Serves a fixed, pre-built dataset
#[derive(Debug, Clone)]
pub struct InMemorySource {
    dataset: Dataset,
}

impl InMemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

#[async_trait::async_trait]
impl DatasetSource for InMemorySource {
    async fn load(&self) -> Result<Dataset, DataError> {
        Ok(self.dataset.clone().with_loaded_at(chrono::Utc::now()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
