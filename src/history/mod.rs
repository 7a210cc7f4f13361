//! Change detection against the last committed revision.
//!
//! Each source unit is compared twice: raw bytes (any change at all) and prose
//! text with link markup stripped (narrative change). Version history is only
//! read, never written.
#[cfg(test)]
pub(crate) mod fixture;
mod git;
mod prose;

pub use git::GitRevisionStore;
use prose::prose_text;

use crate::sources::SourceUnit;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

/// Why a unit's committed state could not be determined.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("version history is unavailable")]
    Unavailable,
    #[error("{unit} is not in the last committed revision")]
    Untracked { unit: String },
    #[error("read {unit}: {message}")]
    Io { unit: String, message: String },
    #[error("git failed for {unit}: {stderr}")]
    Git { unit: String, stderr: String },
}

/// Comparison of a unit's current text with its committed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitChange {
    /// Narrative text differs once link markup and whitespace are normalized.
    pub prose_changed: bool,
    /// Raw bytes differ.
    pub any_changed: bool,
}

/// First and most recent commit dates touching a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitDates {
    pub created: DateTime<Utc>,
    pub committed: DateTime<Utc>,
}

/// Read-only access to a unit's committed and current text.
pub trait RevisionStore {
    /// Whether any version history can be consulted during this run.
    fn is_available(&self) -> bool;

    /// Unit bytes as of the last committed revision, in working-tree form
    /// (line-ending and smudge conversion applied as a checkout would).
    fn committed_content(&self, unit: &SourceUnit) -> Result<Vec<u8>, HistoryError>;

    /// Unit bytes as they are now.
    fn current_content(&self, unit: &SourceUnit) -> Result<Vec<u8>, HistoryError> {
        fs::read(&unit.path).map_err(|err| HistoryError::Io {
            unit: unit.name.clone(),
            message: err.to_string(),
        })
    }

    /// Commit dates for the unit, when history records any.
    fn unit_dates(&self, _unit: &SourceUnit) -> Option<UnitDates> {
        None
    }
}

/// Store used when history is disabled or cannot be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl RevisionStore for NoHistory {
    fn is_available(&self) -> bool {
        false
    }

    fn committed_content(&self, _unit: &SourceUnit) -> Result<Vec<u8>, HistoryError> {
        Err(HistoryError::Unavailable)
    }
}

/// Compare one unit against its committed revision.
///
/// Both sides are decoded the same lossy way for the prose comparison, so a
/// unit that is not valid UTF-8 still compares cleanly against itself.
pub fn classify_unit(
    store: &dyn RevisionStore,
    unit: &SourceUnit,
) -> Result<UnitChange, HistoryError> {
    let committed = store.committed_content(unit)?;
    let current = store.current_content(unit)?;
    if committed == current {
        return Ok(UnitChange::default());
    }
    Ok(UnitChange {
        prose_changed: prose_text(&String::from_utf8_lossy(&committed))
            != prose_text(&String::from_utf8_lossy(&current)),
        any_changed: true,
    })
}

/// Per-run change detector. Each unit is classified once and remembered.
pub struct ChangeDetector<'a> {
    store: &'a dyn RevisionStore,
    changes: HashMap<SourceUnit, Result<UnitChange, HistoryError>>,
    dates: HashMap<SourceUnit, Option<UnitDates>>,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(store: &'a dyn RevisionStore) -> Self {
        Self {
            store,
            changes: HashMap::new(),
            dates: HashMap::new(),
        }
    }

    pub fn history_available(&self) -> bool {
        self.store.is_available()
    }

    pub fn classify(&mut self, unit: &SourceUnit) -> Result<UnitChange, HistoryError> {
        if let Some(cached) = self.changes.get(unit) {
            return cached.clone();
        }
        let result = classify_unit(self.store, unit);
        match &result {
            Ok(change) => tracing::debug!(
                unit = %unit,
                prose_changed = change.prose_changed,
                any_changed = change.any_changed,
                "unit classified"
            ),
            Err(err) => tracing::warn!(unit = %unit, error = %err, "unit change undetermined"),
        }
        self.changes.insert(unit.clone(), result.clone());
        result
    }

    pub fn dates(&mut self, unit: &SourceUnit) -> Option<UnitDates> {
        if let Some(cached) = self.dates.get(unit) {
            return *cached;
        }
        let dates = self.store.unit_dates(unit);
        self.dates.insert(unit.clone(), dates);
        dates
    }
}
