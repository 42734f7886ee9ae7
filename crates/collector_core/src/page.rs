/// One batch of raw records returned by a single paginated fetch call.
///
/// Pages are transient: the accumulator consumes them immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R> {
    pub records: Vec<R>,
    /// Total result count as reported by the source, when present.
    /// Advisory only: some sources report stale or plainly wrong totals,
    /// so termination never rests on this field alone.
    pub total: Option<u64>,
}

impl<R> Page<R> {
    pub fn new(records: Vec<R>, total: Option<u64>) -> Self {
        Self { records, total }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
