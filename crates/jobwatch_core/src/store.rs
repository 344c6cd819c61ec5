use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::JobPosting;

/// Postings already notified, keyed by fingerprint.
///
/// Entries are inserted once and only leave through [`SeenStore::evict_older_than`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenStore {
    entries: HashMap<String, JobPosting>,
}

impl SeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from previously persisted entries.
    pub fn from_entries(entries: HashMap<String, JobPosting>) -> Self {
        Self { entries }
    }

    pub fn has(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Inserts a posting. Returns `false` and leaves the existing entry untouched
    /// when the fingerprint is already known.
    pub fn insert(&mut self, posting: JobPosting) -> bool {
        if self.entries.contains_key(&posting.fingerprint) {
            return false;
        }
        self.entries.insert(posting.fingerprint.clone(), posting);
        true
    }

    /// Drops every entry with `now - found_at > window`. Returns how many were removed.
    pub fn evict_older_than(&mut self, window: Duration, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, posting| now.signed_duration_since(posting.found_at) <= window);
        before - self.entries.len()
    }

    pub fn get(&self, fingerprint: &str) -> Option<&JobPosting> {
        self.entries.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &HashMap<String, JobPosting> {
        &self.entries
    }
}
