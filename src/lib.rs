// ShadowWatch - Crime report store with validated JSON import/export

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod seed;
pub mod storage;
pub mod store;
pub mod transfer;

// Re-export main types for convenience
pub use config::{Backend, StoreConfig};
pub use error::{ImportError, RecordRef, ReportError};
pub use filter::{Filter, SearchMode};
pub use models::{CrimeRecord, CrimeType, CrimesDocument, NewReport, ReportStatus};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::{CRIMES_KEY, Store};
