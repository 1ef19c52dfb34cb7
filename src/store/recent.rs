//! Bounded history of completed request/response exchanges.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::routing::UpstreamTarget;

/// Summary of one proxied exchange. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentRequestEntry {
    /// Request ID (the `x-request-id` assigned on entry).
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
    pub method: String,
    /// Original path and query as received.
    pub url: String,
    pub target: UpstreamTarget,
    /// Whether the client was classified as Android.
    pub android: bool,
    pub request_body: Option<String>,
    pub response_status: u16,
    pub response_headers: BTreeMap<String, String>,
    pub response_body: Option<String>,
    pub elapsed_ms: u64,
}

/// First `max` bytes of a body, lossily decoded. `None` for an empty body.
pub fn snippet(body: &[u8], max: usize) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let end = body.len().min(max);
    Some(String::from_utf8_lossy(&body[..end]).into_owned())
}

/// FIFO ring buffer holding at most `capacity` entries.
#[derive(Debug)]
pub struct RecentRequests {
    entries: Mutex<VecDeque<RecentRequestEntry>>,
    capacity: usize,
}

impl RecentRequests {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting the oldest ones beyond capacity.
    /// Returns the length after the append.
    pub fn record(&self, entry: RecentRequestEntry) -> usize {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        entries.len()
    }

    /// Up to `limit` most recent entries, newest first.
    pub fn list(&self, limit: usize) -> Vec<RecentRequestEntry> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Every entry in insertion order (oldest first).
    pub fn snapshot(&self) -> Vec<RecentRequestEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<RecentRequestEntry> {
        self.entries.lock().iter().rev().find(|e| e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_entry(id: &str) -> RecentRequestEntry {
    RecentRequestEntry {
        id: id.to_string(),
        timestamp: Utc::now(),
        client_ip: "127.0.0.1".into(),
        user_agent: "test".into(),
        method: "GET".into(),
        url: format!("/{}", id),
        target: UpstreamTarget::BlockCity,
        android: false,
        request_body: None,
        response_status: 200,
        response_headers: BTreeMap::new(),
        response_body: Some("ok".into()),
        elapsed_ms: 1,
    }
}
