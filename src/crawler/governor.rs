//! Rate governor
//!
//! Two throttles keep the crawl polite towards the API:
//! - `DetailGovernor` bounds how many post lookups are in flight at once
//! - `Pacer` pauses after each processed page of a channel

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Bounded fan-out for post detail lookups
///
/// Callers see results in submission order regardless of completion order.
#[derive(Debug, Clone)]
pub struct DetailGovernor {
    semaphore: Arc<Semaphore>,
    permits: usize,
}

impl DetailGovernor {
    /// Creates a governor allowing `permits` concurrent calls (at least one)
    pub fn new(permits: usize) -> Self {
        let permits = permits.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
        }
    }

    /// Maximum number of calls in flight
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs one call while holding a permit
    pub async fn run<F: Future>(&self, call: F) -> F::Output {
        // The semaphore is never closed
        let _permit = self.semaphore.acquire().await.ok();
        call.await
    }

    /// Runs a batch of calls, at most `permits` at a time, returning results in order
    pub async fn run_all<I, F>(&self, calls: I) -> Vec<F::Output>
    where
        I: IntoIterator<Item = F>,
        F: Future,
    {
        join_all(calls.into_iter().map(|call| self.run(call))).await
    }
}

/// Enforces a fixed pause between the end of one page and the next page request
///
/// The pause starts when the previous page has been fully processed, so slow
/// post lookups never eat into it.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    finished: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            finished: None,
        }
    }

    /// Marks the current page as fully processed; the pause starts now
    pub fn page_finished(&mut self) {
        self.finished = Some(Instant::now());
    }

    /// Returns how long to wait before the next request, or None if it may go now
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        let finished = self.finished?;
        let elapsed = now.duration_since(finished);
        if elapsed < self.delay {
            Some(self.delay - elapsed)
        } else {
            None
        }
    }

    /// Waits out the pause after the previous page, if any
    pub async fn wait_turn(&mut self) {
        if let Some(wait) = self.time_until_next(Instant::now()) {
            tracing::debug!("Pacing: waiting {:?} before next page", wait);
            tokio::time::sleep(wait).await;
        }
        self.finished = None;
    }
}
