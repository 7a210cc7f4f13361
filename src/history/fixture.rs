//! In-memory revision store for tests.
use super::{HistoryError, RevisionStore, UnitDates};
use crate::sources::SourceUnit;
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct FixtureStore {
    unavailable: bool,
    committed: HashMap<String, Vec<u8>>,
    current: HashMap<String, Vec<u8>>,
    dates: HashMap<String, UnitDates>,
    committed_reads: Cell<usize>,
}

impl FixtureStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub(crate) fn committed(mut self, unit: &str, text: impl AsRef<[u8]>) -> Self {
        self.committed
            .insert(unit.to_string(), text.as_ref().to_vec());
        self
    }

    pub(crate) fn current(mut self, unit: &str, text: impl AsRef<[u8]>) -> Self {
        self.current.insert(unit.to_string(), text.as_ref().to_vec());
        self
    }

    /// Same committed and current text.
    pub(crate) fn clean(self, unit: &str, text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        self.committed(unit, text).current(unit, text)
    }

    pub(crate) fn dated(mut self, unit: &str, dates: UnitDates) -> Self {
        self.dates.insert(unit.to_string(), dates);
        self
    }

    pub(crate) fn committed_reads(&self) -> usize {
        self.committed_reads.get()
    }
}

impl RevisionStore for FixtureStore {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn committed_content(&self, unit: &SourceUnit) -> Result<Vec<u8>, HistoryError> {
        self.committed_reads.set(self.committed_reads.get() + 1);
        if self.unavailable {
            return Err(HistoryError::Unavailable);
        }
        self.committed
            .get(&unit.name)
            .cloned()
            .ok_or_else(|| HistoryError::Untracked {
                unit: unit.name.clone(),
            })
    }

    fn current_content(&self, unit: &SourceUnit) -> Result<Vec<u8>, HistoryError> {
        self.current
            .get(&unit.name)
            .cloned()
            .ok_or_else(|| HistoryError::Io {
                unit: unit.name.clone(),
                message: "missing from fixture".to_string(),
            })
    }

    fn unit_dates(&self, unit: &SourceUnit) -> Option<UnitDates> {
        self.dates.get(&unit.name).copied()
    }
}
