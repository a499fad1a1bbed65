use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FailureKind;

/// Per-client counters of upstream calls, kept for diagnostics only.
#[derive(Debug)]
pub struct FetchStats {
    requests: AtomicU64,
    transport_failures: AtomicU64,
    malformed_responses: AtomicU64,
    absent_results: AtomicU64,
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStats {
    pub const fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            malformed_responses: AtomicU64::new(0),
            absent_results: AtomicU64::new(0),
        }
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: FailureKind) {
        let counter = match kind {
            FailureKind::Transport => &self.transport_failures,
            FailureKind::Malformed => &self.malformed_responses,
            FailureKind::Absent => &self.absent_results,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            malformed_responses: self.malformed_responses.load(Ordering::Relaxed),
            absent_results: self.absent_results.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FetchSnapshot {
    pub requests: u64,
    pub transport_failures: u64,
    pub malformed_responses: u64,
    pub absent_results: u64,
}
