use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Enforces the minimum spacing between requests to one source.
///
/// The sources in this domain are small government and municipal APIs not
/// engineered for concurrent load; one request in flight with a fixed gap
/// between calls (observed: 0.15s to 3s per source) keeps them from
/// rate-limiting or blocking the client.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Waits until the minimum interval since the previous request has
    /// elapsed, then marks the next request as started. The first call
    /// never waits.
    pub async fn pause(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Sleeps out a retry delay computed by the retry policy, counting it
    /// as request spacing too.
    pub async fn backoff(&mut self, delay: Duration) {
        sleep(delay).await;
        self.last_request = Some(Instant::now());
    }
}
