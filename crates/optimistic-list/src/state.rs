//! List State
//!
//! Ordered entries plus the last-error slot and the loading flag.
//! Entries created optimistically carry a correlation id until the server
//! confirms them.

use std::fmt;

use crate::record::{Record, RecordId};

/// Client-generated tag matching a placeholder to its confirmed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One element of the list
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<R> {
    record: R,
    correlation: Option<CorrelationId>,
}

impl<R: Record> Entry<R> {
    /// A record known to the server
    pub fn confirmed(record: R) -> Self {
        Self { record, correlation: None }
    }

    /// A locally created record awaiting confirmation
    pub fn pending(record: R, correlation: CorrelationId) -> Self {
        Self { record, correlation: Some(correlation) }
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn correlation(&self) -> Option<CorrelationId> {
        self.correlation
    }

    pub fn is_pending(&self) -> bool {
        self.correlation.is_some()
    }
}

/// Observable state of a synchronized list
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<R> {
    entries: Vec<Entry<R>>,
    last_error: Option<String>,
    loading: bool,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            last_error: None,
            loading: false,
        }
    }
}

impl<R: Record> ListState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry<R>] {
        &self.entries
    }

    /// Records in display order
    pub fn records(&self) -> Vec<R> {
        self.entries.iter().map(|entry| entry.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // ========================
    // Mutations (crate-private)
    // ========================

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Copy of the entries, taken before an optimistic change
    pub(crate) fn snapshot(&self) -> Vec<Entry<R>> {
        self.entries.clone()
    }

    pub(crate) fn restore(&mut self, snapshot: Vec<Entry<R>>) {
        self.entries = snapshot;
    }

    /// Replace every entry with freshly fetched records
    pub(crate) fn replace_all(&mut self, records: Vec<R>) {
        self.entries = records.into_iter().map(Entry::confirmed).collect();
    }

    pub(crate) fn prepend(&mut self, entry: Entry<R>) {
        self.entries.insert(0, entry);
    }

    /// Swap the placeholder tagged `correlation` for the confirmed record.
    /// Returns false when the placeholder is no longer in the list.
    pub(crate) fn confirm(&mut self, correlation: CorrelationId, record: R) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.correlation == Some(correlation))
        {
            Some(entry) => {
                *entry = Entry::confirmed(record);
                true
            }
            None => false,
        }
    }

    /// Overwrite the entry with `id` in place. Returns false if absent.
    pub(crate) fn replace_by_id(&mut self, id: RecordId, updated: R) -> bool {
        match self.entries.iter_mut().find(|entry| entry.record.id() == id) {
            Some(entry) => {
                entry.record = updated;
                true
            }
            None => false,
        }
    }

    /// Remove entries with `id`. Returns how many were removed.
    pub(crate) fn remove_by_id(&mut self, id: RecordId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.record.id() != id);
        before - self.entries.len()
    }
}
