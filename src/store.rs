// Crime record store over a single persisted slot

use crate::error::ReportError;
use crate::filter::Filter;
use crate::models::{CrimeRecord, NewReport, ReportStatus, format_report_time};
use crate::storage::Storage;
use chrono::{Local, NaiveDateTime};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

/// Key of the persisted slot holding the whole record sequence
pub const CRIMES_KEY: &str = "crimes";

/// Minimum length of `report_details` on submission, counted in characters
/// including surrounding whitespace
pub const MIN_DETAILS_LEN: usize = 10;

/// Source of the "now" stamped on appended records
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Record store backed by one JSON array under [`CRIMES_KEY`]
///
/// Every mutation is a full read-modify-write of the slot. Nothing guards the
/// window between the read and the write, so two writers sharing a backend
/// can overwrite each other. Storage failures are logged and the operation
/// degrades to an empty result or a no-op.
pub struct Store {
    storage: Box<dyn Storage>,
    clock: Clock,
}

impl Store {
    pub fn new<S: Storage + 'static>(storage: S) -> Self {
        Self {
            storage: Box::new(storage),
            clock: local_now,
        }
    }

    /// Replace the clock used to stamp appended records
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // ========================================================================
    // Slot access
    // ========================================================================

    /// Read the whole sequence, propagating storage and decode errors
    pub fn try_get_all(&self) -> Result<Vec<CrimeRecord>> {
        match self.storage.get(CRIMES_KEY)? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json).context("Failed to decode crimes slot"),
        }
    }

    fn save(&mut self, records: &[CrimeRecord]) -> Result<()> {
        let json = serde_json::to_string(records).context("Failed to serialize crimes")?;
        self.storage.set(CRIMES_KEY, &json)?;
        debug!(count = records.len(), "Saved crimes slot");
        Ok(())
    }

    fn save_or_warn(&mut self, records: &[CrimeRecord], op: &str) -> bool {
        match self.save(records) {
            Ok(()) => true,
            Err(e) => {
                warn!(op, error = ?e, "Failed to write crimes slot");
                false
            }
        }
    }

    // ========================================================================
    // Record operations
    // ========================================================================

    /// All records in stored order; empty if the slot is missing or unreadable
    pub fn get_all(&self) -> Vec<CrimeRecord> {
        match self.try_get_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = ?e, "Failed to read crimes slot, returning no records");
                Vec::new()
            }
        }
    }

    /// Append one record as a fresh report
    ///
    /// The status is forced to `Pending` and the timestamp to now, whatever
    /// the caller passed. The id is kept as given. Returns the stored record,
    /// or `None` if it could not be persisted.
    pub fn append(&mut self, mut record: CrimeRecord) -> Option<CrimeRecord> {
        record.report_status = ReportStatus::Pending;
        record.report_date_time = format_report_time((self.clock)());

        let mut records = match self.try_get_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = ?e, "Failed to read crimes slot, report not saved");
                return None;
            }
        };
        records.push(record.clone());

        if !self.save_or_warn(&records, "append") {
            return None;
        }
        info!(id = record.id, crime_type = %record.crime_type, "Appended crime report");
        Some(record)
    }

    /// Validate a new report, assign the next id and append it
    pub fn submit(&mut self, report: NewReport) -> Result<Option<CrimeRecord>, ReportError> {
        validate_report(&report)?;
        let id = self.next_id().ok_or(ReportError::IdsExhausted)?;

        let record = CrimeRecord {
            id,
            report_details: report.report_details,
            crime_type: report.crime_type,
            report_date_time: String::new(),
            report_status: ReportStatus::Pending,
            latitude: report.latitude,
            longitude: report.longitude,
        };
        Ok(self.append(record))
    }

    /// `max(id) + 1`, or 1 for an empty store; `None` once `i64::MAX` is taken
    pub fn next_id(&self) -> Option<i64> {
        match self.get_all().iter().map(|r| r.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// Overwrite the slot with `records`
    pub fn replace_all(&mut self, records: Vec<CrimeRecord>) -> bool {
        let ok = self.save_or_warn(&records, "replace_all");
        if ok {
            info!(count = records.len(), "Replaced all crime records");
        }
        ok
    }

    /// Replace the first record with `id`; nothing is written if it is absent
    pub fn update_by_id(&mut self, id: i64, mut updated: CrimeRecord) -> bool {
        let mut records = self.get_all();
        let Some(slot) = records.iter_mut().find(|r| r.id == id) else {
            info!(id, "Crime not found, nothing to update");
            return false;
        };
        updated.id = id;
        *slot = updated;
        self.save_or_warn(&records, "update_by_id")
    }

    /// Change the status of the first record with `id`
    pub fn set_status(&mut self, id: i64, status: ReportStatus) -> bool {
        match self.get_by_id(id) {
            Some(mut record) => {
                record.report_status = status;
                self.update_by_id(id, record)
            }
            None => false,
        }
    }

    /// Remove the first record with `id`; nothing is written if it is absent
    pub fn delete_by_id(&mut self, id: i64) -> bool {
        let mut records = self.get_all();
        let Some(pos) = records.iter().position(|r| r.id == id) else {
            info!(id, "Crime not found, nothing to delete");
            return false;
        };
        records.remove(pos);
        self.save_or_warn(&records, "delete_by_id")
    }

    pub fn get_by_id(&self, id: i64) -> Option<CrimeRecord> {
        let found = self.get_all().into_iter().find(|r| r.id == id);
        if found.is_none() {
            info!(id, "Crime not found");
        }
        found
    }

    /// Remove the slot entirely
    pub fn clear(&mut self) -> bool {
        match self.storage.remove(CRIMES_KEY) {
            Ok(()) => {
                info!("Cleared crimes slot");
                true
            }
            Err(e) => {
                warn!(error = ?e, "Failed to clear crimes slot");
                false
            }
        }
    }

    pub fn search(&self, filter: &Filter) -> Vec<CrimeRecord> {
        filter.apply(self.get_all())
    }
}

fn validate_report(report: &NewReport) -> Result<(), ReportError> {
    let len = report.report_details.chars().count();
    if len < MIN_DETAILS_LEN {
        return Err(ReportError::DetailsTooShort {
            min: MIN_DETAILS_LEN,
            got: len,
        });
    }
    check_range("latitude", report.latitude, 90.0)?;
    check_range("longitude", report.longitude, 180.0)?;
    Ok(())
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), ReportError> {
    if !(-limit..=limit).contains(&value) {
        return Err(ReportError::CoordinateOutOfRange {
            field,
            value,
            min: -limit,
            max: limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CrimeType;
    use crate::storage::{FileStorage, MemoryStorage};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(7, 4, 0)
            .unwrap()
    }

    fn test_store() -> Store {
        Store::new(MemoryStorage::new()).with_clock(fixed_clock)
    }

    fn record(id: i64, details: &str) -> CrimeRecord {
        CrimeRecord {
            id,
            report_details: details.to_string(),
            crime_type: CrimeType::Robbery,
            report_date_time: "2025-03-08-14-30".to_string(),
            report_status: ReportStatus::UnderInvestigation,
            latitude: 23.588,
            longitude: 58.3829,
        }
    }

    fn new_report(details: &str, latitude: f64, longitude: f64) -> NewReport {
        NewReport {
            report_details: details.to_string(),
            crime_type: CrimeType::Theft,
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_empty_store_reads_empty() {
        let store = test_store();
        assert!(store.get_all().is_empty());
        assert_eq!(store.next_id(), Some(1));
    }

    #[test]
    fn test_append_forces_pending_and_now() {
        let mut store = test_store();

        let stored = store.append(record(5, "Store window smashed")).unwrap();
        assert_eq!(stored.id, 5);
        assert_eq!(stored.report_status, ReportStatus::Pending);
        assert_eq!(stored.report_date_time, "2025-03-09-07-04");

        let all = store.get_all();
        assert_eq!(all, vec![stored]);
    }

    #[test]
    fn test_append_with_default_clock_uses_today() {
        let mut store = Store::new(MemoryStorage::new());
        let stored = store.append(record(1, "Bicycle stolen outside")).unwrap();
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert!(stored.report_date_time.starts_with(&today));
        assert_eq!(stored.report_date_time.len(), "YYYY-MM-DD-HH-MM".len());
    }

    #[test]
    fn test_submit_assigns_next_id() {
        let mut store = test_store();
        store.replace_all(vec![record(3, "first record"), record(9, "second record")]);

        let stored = store
            .submit(new_report("Car stolen from a driveway", 23.6, 58.4))
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, 10);
        assert_eq!(stored.crime_type, CrimeType::Theft);
        assert_eq!(stored.report_status, ReportStatus::Pending);
        assert_eq!(store.get_all().len(), 3);
    }

    #[test]
    fn test_submit_validation() {
        let mut store = test_store();

        let err = store.submit(new_report("too short", 0.0, 0.0)).unwrap_err();
        assert_eq!(err, ReportError::DetailsTooShort { min: 10, got: 9 });

        let err = store
            .submit(new_report("Long enough details here", 91.0, 0.0))
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::CoordinateOutOfRange { field: "latitude", .. }
        ));

        let err = store
            .submit(new_report("Long enough details here", 0.0, -180.5))
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::CoordinateOutOfRange { field: "longitude", .. }
        ));

        assert!(store.submit(new_report("Long enough details here", f64::NAN, 0.0)).is_err());
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_submit_after_max_id_is_rejected() {
        let mut store = test_store();
        store.replace_all(vec![record(i64::MAX, "imported with the largest id")]);

        assert_eq!(store.next_id(), None);
        let err = store
            .submit(new_report("Car stolen from a driveway", 23.6, 58.4))
            .unwrap_err();
        assert_eq!(err, ReportError::IdsExhausted);
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_submit_details_length_counts_whitespace() {
        let mut store = test_store();
        assert!(store.submit(new_report("  a theft ", 1.0, 1.0)).unwrap().is_some());

        let err = store.submit(new_report(" theft   ", 1.0, 1.0)).unwrap_err();
        assert_eq!(err, ReportError::DetailsTooShort { min: 10, got: 9 });
    }

    #[test]
    fn test_submit_accepts_boundary_coordinates() {
        let mut store = test_store();
        let stored = store
            .submit(new_report("Incident at the pole", 90.0, -180.0))
            .unwrap();
        assert!(stored.is_some());
    }

    #[test]
    fn test_get_by_id() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one"), record(2, "two")]);

        assert_eq!(store.get_by_id(2).unwrap().report_details, "two");
        assert!(store.get_by_id(7).is_none());
    }

    #[test]
    fn test_update_by_id() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one"), record(2, "two")]);

        let mut changed = record(99, "two, revised");
        changed.report_status = ReportStatus::Resolved;
        assert!(store.update_by_id(2, changed));

        let updated = store.get_by_id(2).unwrap();
        assert_eq!(updated.report_details, "two, revised");
        assert_eq!(updated.report_status, ReportStatus::Resolved);
        assert!(store.get_by_id(99).is_none());
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one")]);
        let before = store.get_all();

        assert!(!store.update_by_id(5, record(5, "five")));
        assert_eq!(store.get_all(), before);
    }

    #[test]
    fn test_set_status() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one")]);

        assert!(store.set_status(1, ReportStatus::OnScene));
        assert_eq!(store.get_by_id(1).unwrap().report_status, ReportStatus::OnScene);
        assert!(!store.set_status(2, ReportStatus::OnScene));
    }

    #[test]
    fn test_delete_by_id() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one"), record(2, "two"), record(3, "three")]);

        assert!(store.delete_by_id(2));
        let ids: Vec<i64> = store.get_all().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_delete_missing_id_leaves_sequence_unchanged() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one"), record(2, "two")]);
        let before = store.get_all();

        assert!(!store.delete_by_id(42));
        assert_eq!(store.get_all(), before);
    }

    #[test]
    fn test_duplicate_ids_act_on_first() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "first"), record(1, "second")]);

        assert_eq!(store.get_by_id(1).unwrap().report_details, "first");
        assert!(store.delete_by_id(1));
        assert_eq!(store.get_by_id(1).unwrap().report_details, "second");
    }

    #[test]
    fn test_clear_then_read_is_empty() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "one")]);

        assert!(store.clear());
        assert!(store.get_all().is_empty());
        assert_eq!(store.next_id(), Some(1));
    }

    #[test]
    fn test_search_delegates_to_filter() {
        let mut store = test_store();
        store.replace_all(vec![record(1, "Armed robbery"), record(3, "Stolen vehicle")]);

        assert_eq!(store.search(&Filter::by_id("3")).len(), 1);
        assert_eq!(store.search(&Filter::by_details("")).len(), 2);
        assert_eq!(store.search(&Filter::by_details("ROBBERY")).len(), 1);
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let mut store = Store::new(MemoryStorage::unavailable()).with_clock(fixed_clock);

        assert!(store.get_all().is_empty());
        assert!(store.try_get_all().is_err());
        assert!(store.append(record(1, "one")).is_none());
        assert!(!store.replace_all(vec![record(1, "one")]));
        assert!(!store.update_by_id(1, record(1, "one")));
        assert!(!store.delete_by_id(1));
        assert!(store.get_by_id(1).is_none());
        assert!(!store.clear());
        assert_eq!(store.submit(new_report("Long enough details", 1.0, 1.0)), Ok(None));
    }

    #[test]
    fn test_corrupt_slot_reads_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(CRIMES_KEY, "{not json").unwrap();
        let store = Store::new(storage);

        assert!(store.get_all().is_empty());
        assert!(store.try_get_all().is_err());
    }

    #[test]
    fn test_file_backed_store_persists() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = Store::new(FileStorage::open(temp.path()).unwrap()).with_clock(fixed_clock);
            store.append(record(1, "Persisted across runs")).unwrap();
        }
        let store = Store::new(FileStorage::open(temp.path()).unwrap());
        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].report_details, "Persisted across runs");
    }
}
