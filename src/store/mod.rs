//! Observability store: recent-request history and mock table.
//!
//! # Data Flow
//! ```text
//! Dispatcher (completed exchange)
//!     → Store::record
//!         → recent.rs (ring buffer, oldest evicted past capacity)
//!         → journal.rs (JSON lines file, verbose mode only)
//!
//! Dispatcher (every request)
//!     → Store::mocks().lookup(path) → canned response or proxy
//!
//! Admin API
//!     → mocks.rs set/clear, recent.rs list/get
//! ```
//!
//! # Design Decisions
//! - One Store per server, passed by Arc; no global state
//! - Nothing expires by time
//! - Ring buffer serialized by a mutex, mock table read-mostly (sharded locks)

pub mod journal;
pub mod mocks;
pub mod recent;

pub use journal::Journal;
pub use mocks::{MockEntry, MockTable};
pub use recent::{snippet, RecentRequestEntry, RecentRequests};

use crate::config::{ObservabilityConfig, StoreConfig};
use crate::observability::metrics;

#[derive(Debug)]
pub struct Store {
    recent: RecentRequests,
    mocks: MockTable,
    journal: Option<Journal>,
    verbose: bool,
}

impl Store {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: RecentRequests::new(capacity),
            mocks: MockTable::new(),
            journal: None,
            verbose: false,
        }
    }

    /// Build from configuration. The journal is only started in verbose mode
    /// with a log file configured, and only inside a Tokio runtime.
    pub fn from_config(store: &StoreConfig, observability: &ObservabilityConfig) -> Self {
        let mut this = Self::new(store.capacity).verbose(observability.verbose);

        if let (true, Some(path)) = (observability.verbose, observability.log_file.as_deref()) {
            if tokio::runtime::Handle::try_current().is_ok() {
                this = this.with_journal(Journal::spawn(path));
            } else {
                tracing::warn!(path = %path, "No async runtime, journal disabled");
            }
        }

        this
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn recent(&self) -> &RecentRequests {
        &self.recent
    }

    pub fn mocks(&self) -> &MockTable {
        &self.mocks
    }

    /// Record a completed exchange.
    pub fn record(&self, entry: RecentRequestEntry) {
        if self.verbose {
            tracing::info!(
                request_id = %entry.id,
                method = %entry.method,
                url = %entry.url,
                upstream = %entry.target,
                android = entry.android,
                status = entry.response_status,
                elapsed_ms = entry.elapsed_ms,
                "Recorded exchange"
            );
            if let Some(journal) = &self.journal {
                journal.append(&entry);
            }
        }

        let len = self.recent.record(entry);
        metrics::record_recent_entries(len);
    }
}
