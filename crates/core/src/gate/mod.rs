//! Bounded-concurrency, retrying gate for outbound ILS requests.
//!
//! Every call to the ILS goes through one process-wide [`RequestGate`]:
//! - a semaphore caps the number of attempts in flight at once,
//! - failed attempts are retried with exponential backoff, whatever the cause,
//! - every attempt (retries included) is counted.
//!
//! A permit is held for one attempt only, so a request waiting out its
//! backoff does not block other requests.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::ils::IlsError;
use crate::metrics;

/// Snapshot of gate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    /// Attempts started, retries included.
    pub attempts: u64,
    /// Attempts that were followed by a retry.
    pub retries: u64,
    /// Calls that failed after exhausting their retries.
    pub failures: u64,
    /// Attempts currently in flight.
    pub in_flight: usize,
    /// Highest number of attempts ever in flight at once.
    pub peak_in_flight: usize,
}

/// Process-wide gate for ILS requests.
pub struct RequestGate {
    semaphore: Semaphore,
    max_concurrent: usize,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    attempts: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Decrements the in-flight count even if the attempt future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RequestGate {
    /// Creates a gate from configuration.
    pub fn new(config: &GateConfig) -> Self {
        let max_concurrent = config.max_concurrent_requests.max(1);
        Self {
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Configured concurrency limit.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Returns the current counters.
    pub fn stats(&self) -> GateStats {
        GateStats {
            attempts: self.attempts.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Runs `attempt` under the concurrency limit, retrying on failure.
    ///
    /// `attempt` is invoked once per try. The last error is returned once
    /// `max_retries` retries have failed.
    pub async fn call<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, IlsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, IlsError>>,
    {
        let mut retry = 0u32;

        loop {
            let result = {
                let _permit = self
                    .semaphore
                    .acquire()
                    .await
                    .map_err(|_| IlsError::GateClosed)?;

                self.attempts.fetch_add(1, Ordering::SeqCst);
                metrics::REQUEST_ATTEMPTS
                    .with_label_values(&[operation])
                    .inc();

                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                let _in_flight = InFlight(&self.in_flight);
                self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

                attempt().await
            };

            match result {
                Ok(value) => return Ok(value),
                Err(error) if retry < self.max_retries => {
                    retry += 1;
                    self.retries.fetch_add(1, Ordering::SeqCst);
                    let delay = self.backoff_delay(retry);
                    warn!(
                        operation = operation,
                        retry = retry,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "ILS request failed, retrying after backoff"
                    );
                    sleep(delay).await;
                }
                Err(error) => {
                    self.failures.fetch_add(1, Ordering::SeqCst);
                    metrics::REQUEST_FAILURES
                        .with_label_values(&[operation])
                        .inc();
                    debug!(
                        operation = operation,
                        attempts = retry + 1,
                        error = %error,
                        "All ILS retry attempts exhausted"
                    );
                    return Err(error);
                }
            }
        }
    }
}
