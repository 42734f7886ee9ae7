use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collector_core::{decide, Accumulator, Cursor, Identify, Page, Query, RetryPolicy, Step};
use collector_logging::{collect_info, collect_warn};

use crate::fetch::PageFetcher;
use crate::pace::Pacer;
use crate::sink::RecordSink;
use crate::types::{
    CollectorEvent, PageStats, ProgressSink, RawRecord, RunError, RunSummary,
};

/// Cooperative cancellation flag, checked once per loop iteration.
///
/// There is no mid-request cancellation: at worst one in-flight request
/// completes after the flag is raised.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-run knobs that are not part of the query itself.
///
/// These were process-wide constants in the scripts this replaces; here
/// they are explicit per-source configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Minimum spacing between requests.
    pub min_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Drives one paginated collection run: fetch, deduplicate, deliver,
/// pace, decide termination.
///
/// A collector instance owns nothing shared; to collect several sources
/// in parallel, run one collector per source side by side.
pub struct Collector<F, I> {
    fetcher: F,
    identify: I,
    settings: RunSettings,
}

impl<F, I> Collector<F, I>
where
    F: PageFetcher,
    I: Identify<RawRecord>,
{
    pub fn new(fetcher: F, identify: I, settings: RunSettings) -> Self {
        Self {
            fetcher,
            identify,
            settings,
        }
    }

    /// The fetcher this collector drives.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs to completion. Accepted records are delivered to `sink`
    /// incrementally; on failure the error reports how many were already
    /// delivered, and those stay with the sink.
    pub async fn run(
        &self,
        query: &Query,
        sink: &mut dyn RecordSink,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<RunSummary, RunError> {
        let mut accumulator = Accumulator::new();
        let mut pacer = Pacer::new(self.settings.min_interval);
        let mut cursor = Cursor::START;
        let mut pages_fetched = 0u64;
        let mut records_fetched = 0u64;
        let mut records_accepted = 0u64;
        let mut retries = 0u32;

        loop {
            if cancel.is_cancelled() {
                collect_warn!(
                    "run cancelled at offset {cursor}, {records_accepted} records delivered"
                );
                return Err(RunError::Cancelled {
                    yielded: records_accepted,
                });
            }
            pacer.pause().await;

            let page = self
                .fetch_with_retry(
                    query,
                    cursor,
                    &mut pacer,
                    &mut retries,
                    records_accepted,
                    progress,
                )
                .await?;
            pages_fetched += 1;
            let raw_len = page.len();
            let reported_total = page.total;
            records_fetched += raw_len as u64;

            let admitted = accumulator
                .admit(page.records, &self.identify)
                .map_err(|source| RunError::BadIdentity {
                    offset: cursor.offset(),
                    yielded: records_accepted,
                    source,
                })?;
            for record in &admitted.records {
                sink.deliver(record).map_err(|source| RunError::Sink {
                    yielded: records_accepted,
                    source,
                })?;
                records_accepted += 1;
            }

            collect_info!(
                "page {pages_fetched} at offset {cursor}: fetched {raw_len}, accepted {}, \
                 running total {records_accepted}",
                admitted.accepted()
            );
            progress.emit(CollectorEvent::PageFetched(PageStats {
                page_index: pages_fetched,
                offset: cursor.offset(),
                fetched: raw_len,
                accepted: admitted.accepted(),
                running_total: records_accepted,
                reported_total,
            }));

            match decide(cursor, raw_len, admitted.accepted(), reported_total) {
                Step::Stop(termination) => {
                    collect_info!(
                        "run finished ({termination:?}): {records_accepted} accepted of \
                         {records_fetched} fetched over {pages_fetched} pages"
                    );
                    progress.emit(CollectorEvent::Finished {
                        termination,
                        accepted: records_accepted,
                    });
                    return Ok(RunSummary {
                        pages_fetched,
                        records_fetched,
                        records_accepted,
                        retries,
                        termination,
                    });
                }
                Step::Continue(next) => cursor = next,
            }
        }
    }

    /// Blocking wrapper for callers without their own runtime.
    pub fn run_blocking(
        &self,
        query: &Query,
        sink: &mut dyn RecordSink,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<RunSummary, RunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        runtime.block_on(self.run(query, sink, progress, cancel))
    }

    async fn fetch_with_retry(
        &self,
        query: &Query,
        cursor: Cursor,
        pacer: &mut Pacer,
        retries: &mut u32,
        yielded: u64,
        progress: &dyn ProgressSink,
    ) -> Result<Page<RawRecord>, RunError> {
        let mut attempt = 1u32;
        loop {
            match self.fetcher.fetch_page(query, cursor).await {
                Ok(page) => return Ok(page),
                Err(err) if !err.kind.is_retryable() => {
                    return Err(RunError::MalformedPage {
                        offset: cursor.offset(),
                        yielded,
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    if !self.settings.retry.allows_retry(attempt) {
                        return Err(RunError::RetriesExhausted {
                            attempts: attempt,
                            offset: cursor.offset(),
                            yielded,
                            last: err,
                        });
                    }
                    let delay = self.settings.retry.delay_for(attempt);
                    collect_warn!(
                        "fetch at offset {cursor} failed ({err}); retry {attempt} in {delay:?}"
                    );
                    progress.emit(CollectorEvent::RetryScheduled {
                        offset: cursor.offset(),
                        attempt,
                        reason: err.to_string(),
                    });
                    *retries += 1;
                    pacer.backoff(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
