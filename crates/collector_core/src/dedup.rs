use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Source-defined unique key for one record.
///
/// Opaque to the collector: it is compared for equality and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("record has no identity under key `{0}`")]
    MissingKey(String),
    #[error("identity under key `{key}` is not usable: {reason}")]
    Unusable { key: String, reason: String },
}

/// Extracts the deduplication identity from a raw record.
///
/// Must be pure: it is invoked once per raw record per page, including for
/// records that turn out to be repeats. A record without a usable identity
/// is a source contract violation, not something to skip silently.
pub trait Identify<R> {
    fn identity(&self, record: &R) -> Result<RecordId, IdentityError>;
}

impl<R, F> Identify<R> for F
where
    F: Fn(&R) -> Result<RecordId, IdentityError>,
{
    fn identity(&self, record: &R) -> Result<RecordId, IdentityError> {
        self(record)
    }
}

/// Records from one page that survived deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted<R> {
    /// First occurrences, in page order.
    pub records: Vec<R>,
    /// Raw record count of the page these came from. The cursor advances
    /// by this, while termination looks at `accepted()`.
    pub raw_len: usize,
}

impl<R> Admitted<R> {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}

/// Tracks the identities seen during one run and filters out repeats.
///
/// Owned by a single run; the seen set grows monotonically and is discarded
/// when the run ends. Re-runs re-derive it from scratch and rely on the
/// sink's idempotence instead of cross-run persistence.
#[derive(Debug, Default)]
pub struct Accumulator {
    seen: HashSet<RecordId>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits one page of records: first occurrences are kept in order,
    /// repeats are dropped silently. Within one call a given identity is
    /// counted at most once, even if it appears twice in the same page.
    pub fn admit<R>(
        &mut self,
        records: Vec<R>,
        identify: &impl Identify<R>,
    ) -> Result<Admitted<R>, IdentityError> {
        let raw_len = records.len();
        let mut kept = Vec::with_capacity(raw_len);
        for record in records {
            let id = identify.identity(&record)?;
            if self.seen.insert(id) {
                kept.push(record);
            }
        }
        Ok(Admitted {
            records: kept,
            raw_len,
        })
    }

    /// Number of distinct identities observed so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
