// Typed errors surfaced to callers

use std::fmt;
use thiserror::Error;

/// Identifies an imported record in error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    Id(i64),
    Index(usize),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Id(id) => write!(f, "record with id {}", id),
            RecordRef::Index(i) => write!(f, "record at index {}", i),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid data format: expected a top-level \"crimes\" array")]
    MissingCrimesArray,
    #[error("invalid {record}: {field} {reason}")]
    InvalidRecord {
        record: RecordRef,
        field: &'static str,
        reason: String,
    },
    #[error("storage unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("report details must be at least {min} characters (got {got})")]
    DetailsTooShort { min: usize, got: usize },
    #[error("no report id left after {}", i64::MAX)]
    IdsExhausted,
    #[error("{field} {value} is out of range ({min} to {max})")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
