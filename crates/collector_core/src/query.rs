/// Immutable filter parameters for one collection run.
///
/// A query carries source-specific filters (date range, organisation id,
/// free-text terms) as opaque key/value pairs plus the requested page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
    page_size: usize,
}

impl Query {
    /// Creates a query with no filters. A zero page size is clamped to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            params: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    /// Adds one filter parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The page size the caller asked for. A hint, not a contract: sources
    /// may return fewer or (rarely) more records per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Page size to actually request: the smaller of the caller's size and
    /// the source's known cap. Some servers silently truncate a page to a
    /// lower maximum (observed: 51 rows) instead of erroring.
    pub fn effective_page_size(&self, cap: Option<usize>) -> usize {
        match cap {
            Some(cap) if cap > 0 && cap < self.page_size => cap,
            _ => self.page_size,
        }
    }
}
