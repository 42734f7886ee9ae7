use crate::Cursor;

/// Why a run stopped fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The source returned a page with zero records.
    EmptyPage,
    /// The source reported a total count and the cursor has covered it.
    TotalReached,
    /// A non-empty page produced zero new records: every row was a repeat.
    /// Guards against sources whose total count is absent or unreliable.
    Stagnated,
}

/// Next action after accumulating one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stop(Termination),
    /// Keep fetching from the advanced cursor after the inter-request delay.
    Continue(Cursor),
}

/// Pure termination decision for one processed page.
///
/// `raw_len` is the page's record count before deduplication, `accepted`
/// the count after. The checks run in a fixed order: an empty page always
/// ends the run, so a stale reported total can never keep it looping, and
/// the stagnation guard fires even when no total is reported at all.
pub fn decide(cursor: Cursor, raw_len: usize, accepted: usize, total: Option<u64>) -> Step {
    if raw_len == 0 {
        return Step::Stop(Termination::EmptyPage);
    }
    if let Some(total) = total {
        if cursor.offset() + raw_len as u64 >= total {
            return Step::Stop(Termination::TotalReached);
        }
    }
    if accepted == 0 {
        return Step::Stop(Termination::Stagnated);
    }
    Step::Continue(cursor.advanced_by(raw_len))
}
