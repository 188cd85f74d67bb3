// Query filtering for crime records

use crate::models::{CrimeRecord, CrimeType};
use std::str::FromStr;

/// How a search term is matched against records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Exact match on the numeric id
    Id,
    /// Case-insensitive substring match on `report_details`
    #[default]
    Details,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(SearchMode::Id),
            "details" => Ok(SearchMode::Details),
            other => Err(format!("unknown search mode: {} (expected id or details)", other)),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Id => write!(f, "id"),
            SearchMode::Details => write!(f, "details"),
        }
    }
}

/// Filter for searching records
#[derive(Debug, Clone)]
pub struct Filter {
    /// Match mode
    pub mode: SearchMode,
    /// Raw search term as typed
    pub term: String,
}

impl Filter {
    pub fn by_id(term: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::Id,
            term: term.into(),
        }
    }

    pub fn by_details(term: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::Details,
            term: term.into(),
        }
    }

    /// Returns a predicate for this filter
    ///
    /// The term is parsed once up front. An id term that is not an integer
    /// (including an empty one) matches nothing; an empty details term
    /// matches everything.
    pub fn matcher(&self) -> impl Fn(&CrimeRecord) -> bool + '_ {
        let wanted_id = match self.mode {
            SearchMode::Id => self.term.trim().parse::<i64>().ok(),
            SearchMode::Details => None,
        };
        let needle = self.term.to_lowercase();

        move |record: &CrimeRecord| match self.mode {
            SearchMode::Id => wanted_id == Some(record.id),
            SearchMode::Details => record.report_details.to_lowercase().contains(&needle),
        }
    }

    pub fn apply(&self, records: Vec<CrimeRecord>) -> Vec<CrimeRecord> {
        let matches = self.matcher();
        records.into_iter().filter(|r| matches(r)).collect()
    }
}

/// Keep only records whose crime type is in `types`
pub fn filter_by_types(records: Vec<CrimeRecord>, types: &[CrimeType]) -> Vec<CrimeRecord> {
    records
        .into_iter()
        .filter(|r| types.contains(&r.crime_type))
        .collect()
}

/// Distinct crime types in first-seen order
pub fn crime_types_present(records: &[CrimeRecord]) -> Vec<CrimeType> {
    let mut seen = Vec::new();
    for record in records {
        if !seen.contains(&record.crime_type) {
            seen.push(record.crime_type);
        }
    }
    seen
}
