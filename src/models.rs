// Data models for ShadowWatch

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format used for `report_date_time`, e.g. `2025-03-08-14-30`
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Category of a reported crime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrimeType {
    Assault,
    Robbery,
    Homicide,
    Kidnapping,
    Theft,
}

impl CrimeType {
    pub const ALL: [CrimeType; 5] = [
        CrimeType::Assault,
        CrimeType::Robbery,
        CrimeType::Homicide,
        CrimeType::Kidnapping,
        CrimeType::Theft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrimeType::Assault => "Assault",
            CrimeType::Robbery => "Robbery",
            CrimeType::Homicide => "Homicide",
            CrimeType::Kidnapping => "Kidnapping",
            CrimeType::Theft => "Theft",
        }
    }
}

/// Lifecycle of a report, from submission to resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    #[serde(rename = "En Route")]
    EnRoute,
    #[serde(rename = "On Scene")]
    OnScene,
    #[serde(rename = "Under Investigation")]
    UnderInvestigation,
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 5] = [
        ReportStatus::Pending,
        ReportStatus::EnRoute,
        ReportStatus::OnScene,
        ReportStatus::UnderInvestigation,
        ReportStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::EnRoute => "En Route",
            ReportStatus::OnScene => "On Scene",
            ReportStatus::UnderInvestigation => "Under Investigation",
            ReportStatus::Resolved => "Resolved",
        }
    }
}

// Lenient matching for CLI input: "en-route", "under_investigation", "THEFT"
fn normalize(s: &str) -> String {
    s.trim().replace(['-', '_'], " ").to_lowercase()
}

impl FromStr for CrimeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown crime type: {}", s))
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown report status: {}", s))
    }
}

impl fmt::Display for CrimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single crime report as persisted in the slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub id: i64,
    pub report_details: String,
    pub crime_type: CrimeType,
    pub report_date_time: String,
    pub report_status: ReportStatus,
    pub latitude: f64,
    pub longitude: f64,
}

/// User-supplied part of a new report; id, status and timestamp are assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub report_details: String,
    pub crime_type: CrimeType,
    pub latitude: f64,
    pub longitude: f64,
}

/// Envelope used by export and import files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimesDocument {
    pub crimes: Vec<CrimeRecord>,
}

pub fn format_report_time(at: NaiveDateTime) -> String {
    at.format(REPORT_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_status_serialization_uses_display_names() {
        let json = serde_json::to_string(&ReportStatus::UnderInvestigation).unwrap();
        assert_eq!(json, "\"Under Investigation\"");

        let status: ReportStatus = serde_json::from_str("\"En Route\"").unwrap();
        assert_eq!(status, ReportStatus::EnRoute);
    }

    #[test]
    fn test_legacy_statuses_rejected() {
        assert!(serde_json::from_str::<ReportStatus>("\"In Progress\"").is_err());
        assert!(serde_json::from_str::<ReportStatus>("\"Closed\"").is_err());
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("theft".parse::<CrimeType>().unwrap(), CrimeType::Theft);
        assert_eq!("on-scene".parse::<ReportStatus>().unwrap(), ReportStatus::OnScene);
        assert_eq!(
            "under_investigation".parse::<ReportStatus>().unwrap(),
            ReportStatus::UnderInvestigation
        );
        assert!("arson".parse::<CrimeType>().is_err());
    }

    #[test]
    fn test_format_report_time() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(format_report_time(at), "2025-03-08-09-05");
    }

    #[test]
    fn test_record_serialization() {
        let record = CrimeRecord {
            id: 1,
            report_details: "A group of masked individuals".to_string(),
            crime_type: CrimeType::Robbery,
            report_date_time: "2025-03-08-14-30".to_string(),
            report_status: ReportStatus::Pending,
            latitude: 23.588,
            longitude: 58.3829,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["crime_type"], "Robbery");
        assert_eq!(value["report_status"], "Pending");
        assert_eq!(value["id"], 1);

        let back: CrimeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
