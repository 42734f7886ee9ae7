use std::fmt;

use collector_core::{IdentityError, Termination};
use thiserror::Error;

use crate::sink::SinkError;

/// Raw record as returned by a source. The collector never interprets its
/// contents beyond extracting the identity key.
pub type RawRecord = serde_json::Value;

/// Per-page progress numbers, observable while a run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStats {
    /// 1-based index of the fetch call within the run.
    pub page_index: u64,
    /// Cursor offset the page was fetched at.
    pub offset: u64,
    /// Raw records in the page.
    pub fetched: usize,
    /// Records that survived deduplication.
    pub accepted: usize,
    /// Accepted records delivered so far, including this page.
    pub running_total: u64,
    /// Total count the source reported alongside the page, if any.
    pub reported_total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorEvent {
    PageFetched(PageStats),
    RetryScheduled {
        offset: u64,
        attempt: u32,
        reason: String,
    },
    Finished {
        termination: Termination,
        accepted: u64,
    },
}

/// Receives collector progress events.
///
/// Implementations must be cheap; they are called from the run loop
/// between requests.
pub trait ProgressSink {
    fn emit(&self, event: CollectorEvent);
}

/// Progress sink that discards all events.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: CollectorEvent) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Endpoint URL did not parse; reported at fetcher construction.
    InvalidUrl,
    /// Non-2xx response status.
    HttpStatus(u16),
    Timeout,
    Network,
    /// Response body could not be interpreted as a page of records.
    MalformedPage,
}

impl FetchErrorKind {
    /// Transient failures are retried; a malformed body is a contract
    /// violation and retrying it risks an infinite loop.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchErrorKind::HttpStatus(_) | FetchErrorKind::Timeout | FetchErrorKind::Network
        )
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::InvalidUrl => write!(f, "invalid url"),
            FetchErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Network => write!(f, "network error"),
            FetchErrorKind::MalformedPage => write!(f, "malformed page"),
        }
    }
}

/// Report for a run that fetched to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_fetched: u64,
    /// Raw records fetched, duplicates included.
    pub records_fetched: u64,
    /// Records delivered to the sink.
    pub records_accepted: u64,
    /// Retries performed across the whole run.
    pub retries: u32,
    pub termination: Termination,
}

/// A failed run.
///
/// Every variant reports how many records were already delivered to the
/// sink before the failure; those are kept, never rolled back. A re-run
/// with an idempotent sink completes the rest.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(
        "retries exhausted after {attempts} attempts at offset {offset} \
         ({yielded} records already delivered): {last}"
    )]
    RetriesExhausted {
        attempts: u32,
        offset: u64,
        yielded: u64,
        last: FetchError,
    },
    #[error("malformed page at offset {offset} ({yielded} records already delivered): {message}")]
    MalformedPage {
        offset: u64,
        yielded: u64,
        message: String,
    },
    #[error("bad record identity at offset {offset} ({yielded} records already delivered)")]
    BadIdentity {
        offset: u64,
        yielded: u64,
        #[source]
        source: IdentityError,
    },
    #[error("sink rejected a record ({yielded} records already delivered)")]
    Sink {
        yielded: u64,
        #[source]
        source: SinkError,
    },
    #[error("run cancelled ({yielded} records already delivered)")]
    Cancelled { yielded: u64 },
}

impl RunError {
    /// Records that had reached the sink before the run failed.
    pub fn yielded(&self) -> u64 {
        match self {
            RunError::RetriesExhausted { yielded, .. }
            | RunError::MalformedPage { yielded, .. }
            | RunError::BadIdentity { yielded, .. }
            | RunError::Sink { yielded, .. }
            | RunError::Cancelled { yielded } => *yielded,
        }
    }
}
