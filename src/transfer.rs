// JSON export and validated import of the whole dataset

use crate::error::{ImportError, RecordRef};
use crate::models::{CrimeRecord, CrimeType, CrimesDocument, ReportStatus};
use crate::store::Store;
use chrono::{NaiveDate, Utc};
use eyre::{Context, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{info, warn};

static REPORT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-\d{2}$").unwrap_or_else(|_| unreachable!()));

const REQUIRED_FIELDS: [&str; 7] = [
    "id",
    "report_details",
    "crime_type",
    "report_status",
    "report_date_time",
    "latitude",
    "longitude",
];

/// Serialize every stored record under a `{ "crimes": [...] }` envelope
///
/// Fails only when the storage medium itself cannot be read.
pub fn export_document(store: &Store) -> Result<String> {
    let crimes = store.try_get_all().context("Failed to read crimes for export")?;
    let count = crimes.len();
    let json = serde_json::to_string_pretty(&CrimesDocument { crimes })?;
    info!(count, "Exported crime records");
    Ok(json)
}

/// `shadow-watch-crimes-<YYYY-MM-DD>.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("shadow-watch-crimes-{}.json", date.format("%Y-%m-%d"))
}

pub fn default_export_file_name() -> String {
    export_file_name(Utc::now().date_naive())
}

/// Replace the store's contents with a validated document
///
/// Import is all-or-nothing: every record is validated before anything is
/// written, and the first invalid record aborts the whole import with the
/// store left as it was. Duplicate ids are accepted as-is. Returns the number
/// of imported records.
pub fn import_document(store: &mut Store, text: &str) -> Result<usize, ImportError> {
    let crimes = validate_document(text).inspect_err(|e| warn!(error = %e, "Import rejected"))?;
    let count = crimes.len();

    if !store.replace_all(crimes) {
        return Err(ImportError::Storage("failed to write crimes slot".to_string()));
    }
    info!(count, "Imported crime records");
    Ok(count)
}

/// Parse and validate a `{ "crimes": [...] }` document without touching any store
pub fn validate_document(text: &str) -> Result<Vec<CrimeRecord>, ImportError> {
    let doc: Value = serde_json::from_str(text)?;
    let crimes = doc
        .get("crimes")
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingCrimesArray)?;

    crimes
        .iter()
        .enumerate()
        .map(|(index, value)| validate_record(index, value))
        .collect()
}

fn invalid(record: &RecordRef, field: &'static str, reason: impl Into<String>) -> ImportError {
    ImportError::InvalidRecord {
        record: record.clone(),
        field,
        reason: reason.into(),
    }
}

fn validate_record(index: usize, value: &Value) -> Result<CrimeRecord, ImportError> {
    let Some(obj) = value.as_object() else {
        return Err(invalid(&RecordRef::Index(index), "record", "must be a JSON object"));
    };

    let record = obj
        .get("id")
        .and_then(Value::as_i64)
        .map_or(RecordRef::Index(index), RecordRef::Id);

    for field in REQUIRED_FIELDS {
        if obj.get(field).is_none_or(Value::is_null) {
            return Err(invalid(&record, field, "is missing"));
        }
    }

    let id = obj
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(&record, "id", "must be an integer"))?;

    let report_details = str_field(obj, &record, "report_details")?;
    if report_details.trim().is_empty() {
        return Err(invalid(&record, "report_details", "must not be empty"));
    }

    let crime_type = str_field(obj, &record, "crime_type")?;
    let crime_type = CrimeType::ALL
        .into_iter()
        .find(|t| t.as_str() == crime_type)
        .ok_or_else(|| invalid(&record, "crime_type", one_of(CrimeType::ALL.map(|t| t.as_str()))))?;

    let report_status = str_field(obj, &record, "report_status")?;
    let report_status = ReportStatus::ALL
        .into_iter()
        .find(|s| s.as_str() == report_status)
        .ok_or_else(|| invalid(&record, "report_status", one_of(ReportStatus::ALL.map(|s| s.as_str()))))?;

    let report_date_time = str_field(obj, &record, "report_date_time")?;
    if !REPORT_TIME_RE.is_match(report_date_time) {
        return Err(invalid(&record, "report_date_time", "must match YYYY-MM-DD-HH-MM"));
    }

    let latitude = coordinate(obj, &record, "latitude", 90.0)?;
    let longitude = coordinate(obj, &record, "longitude", 180.0)?;

    Ok(CrimeRecord {
        id,
        report_details: report_details.to_string(),
        crime_type,
        report_date_time: report_date_time.to_string(),
        report_status,
        latitude,
        longitude,
    })
}

fn str_field<'a>(obj: &'a Map<String, Value>, record: &RecordRef, field: &'static str) -> Result<&'a str, ImportError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(record, field, "must be a string"))
}

fn coordinate(obj: &Map<String, Value>, record: &RecordRef, field: &'static str, limit: f64) -> Result<f64, ImportError> {
    let value = obj
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(record, field, "must be a number"))?;
    if !(-limit..=limit).contains(&value) {
        return Err(invalid(record, field, format!("must be between {} and {}", -limit, limit)));
    }
    Ok(value)
}

fn one_of<const N: usize>(names: [&str; N]) -> String {
    format!("must be one of: {}", names.join(", "))
}
