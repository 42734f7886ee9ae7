//! Collector core: pure pagination, deduplication, and retry policy logic.
//!
//! Nothing in this crate performs IO. The engine crate wires these pieces
//! to an HTTP fetcher and a record sink.
mod cursor;
mod dedup;
mod page;
mod query;
mod retry;
mod step;

pub use cursor::Cursor;
pub use dedup::{Accumulator, Admitted, Identify, IdentityError, RecordId};
pub use page::Page;
pub use query::Query;
pub use retry::RetryPolicy;
pub use step::{decide, Step, Termination};
