use std::fmt;

/// Offset position within the source's absolute result ordering.
///
/// The cursor advances by the raw record count of each page, never the
/// deduplicated count: offset pagination is defined by the server's own
/// positions, independent of any client-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Cursor(u64);

impl Cursor {
    /// Start of the result set.
    pub const START: Cursor = Cursor(0);

    pub fn offset(self) -> u64 {
        self.0
    }

    /// The cursor after a page of `raw_records` records, deduplicated or not.
    #[must_use]
    pub fn advanced_by(self, raw_records: usize) -> Cursor {
        Cursor(self.0 + raw_records as u64)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
