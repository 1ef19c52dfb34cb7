//! Operator-installed canned responses keyed by request path.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A canned response served instead of proxying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockEntry {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Path → mock table. Read on every request, written by the admin API.
#[derive(Debug, Default)]
pub struct MockTable {
    inner: DashMap<String, MockEntry>,
}

impl MockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the mock for `path`.
    pub fn set(&self, path: impl Into<String>, entry: MockEntry) {
        self.inner.insert(path.into(), entry);
    }

    /// Remove the mock for `path`. Returns whether one existed.
    pub fn clear(&self, path: &str) -> bool {
        self.inner.remove(path).is_some()
    }

    pub fn lookup(&self, path: &str) -> Option<MockEntry> {
        self.inner.get(path).map(|r| r.value().clone())
    }

    /// All mocks, sorted by path.
    pub fn list(&self) -> BTreeMap<String, MockEntry> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
