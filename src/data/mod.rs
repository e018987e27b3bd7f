//! CSV ingestion and the in-memory snapshot store.

pub mod loader;
pub mod schema;
pub mod snapshot;
pub mod source;

pub use loader::{load_directory, LoadReport, RowError};
pub use snapshot::{Dataset, ForecastFilter, SnapshotStore};
pub use source::{CsvDirectorySource, DatasetSource, InMemorySource};
