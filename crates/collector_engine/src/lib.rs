//! Collector engine: paginated fetch, pacing, and the run loop.
//!
//! The engine drives a [`collector_core`] run against a live HTTP source:
//! one request in flight at a time, a fixed gap between requests, bounded
//! retry on transient failures, and incremental delivery of deduplicated
//! records to a caller-supplied sink.
mod driver;
mod fetch;
mod identity;
mod pace;
mod sink;
mod types;

pub use driver::{CancelFlag, Collector, RunSettings};
pub use fetch::{EndpointConfig, FetchSettings, PageFetcher, PageShape, PagingStyle, ReqwestPageFetcher};
pub use identity::FieldIdentity;
pub use pace::Pacer;
pub use sink::{JsonLinesSink, RecordSink, SinkError, VecSink};
pub use types::{
    CollectorEvent, FetchError, FetchErrorKind, NullProgressSink, PageStats, ProgressSink,
    RawRecord, RunError, RunSummary,
};
