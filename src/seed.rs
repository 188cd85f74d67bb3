// Bundled sample dataset

use crate::error::ImportError;
use crate::models::CrimeRecord;
use crate::store::Store;
use crate::transfer::validate_document;
use tracing::info;

/// Fifteen sample reports in export format
pub const SAMPLE_CRIMES: &str = include_str!("../data/sample_crimes.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded(usize),
    /// Store already had records and `force` was not set
    Skipped { existing: usize },
}

pub fn sample_crimes() -> Result<Vec<CrimeRecord>, ImportError> {
    validate_document(SAMPLE_CRIMES)
}

/// Load the sample dataset, only into an empty store unless `force` is set
pub fn seed(store: &mut Store, force: bool) -> Result<SeedOutcome, ImportError> {
    let existing = store.get_all().len();
    if existing > 0 && !force {
        info!(existing, "Store already has records, not seeding");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let crimes = sample_crimes()?;
    let count = crimes.len();
    if !store.replace_all(crimes) {
        return Err(ImportError::Storage("failed to write crimes slot".to_string()));
    }
    Ok(SeedOutcome::Seeded(count))
}
