//! Bounded status polling with an injectable wait strategy
//!
//! Both lifecycle state machines block on asynchronous provider
//! transitions (account creation, account closure). Polling is a fixed
//! interval with a bounded attempt budget; the sleep function is injected
//! so tests can simulate elapsed time without real delay. Transient
//! provider errors (throttling) are retried inside the budget; anything
//! else propagates immediately.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::aws::error::classify_anyhow_error;

/// Configuration for fixed-interval status polling.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Attempt budget before the poll is abandoned
    pub max_attempts: u32,
}

impl PollConfig {
    pub fn new(interval_secs: u64, max_attempts: u32) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            max_attempts,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(
            org_lifecycle_common::defaults::DEFAULT_POLL_INTERVAL_SECS,
            org_lifecycle_common::defaults::DEFAULT_POLL_MAX_ATTEMPTS,
        )
    }
}

/// Outcome of a bounded poll.
///
/// Exhausting the budget is not an error at this layer: the remote side
/// effect may still complete asynchronously, so callers decide whether a
/// timeout degrades to a warning (closure) or a retriable failure
/// (creation).
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// The condition was observed within the budget
    Ready(T),
    /// The budget was exhausted without a terminal observation
    TimedOut { attempts: u32 },
}

/// Poll a remote condition until it yields a value or the budget runs out.
///
/// * `check` returns `Ok(Some(v))` when terminal, `Ok(None)` to keep
///   polling, or `Err` to abort (throttling errors are retried instead).
/// * `sleep` is the wait strategy; production passes [`tokio_sleep`].
pub async fn poll_until<T, F, Fut, S, SFut>(
    config: PollConfig,
    mut check: F,
    sleep: S,
    resource_name: &str,
) -> Result<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    for attempt in 1..=config.max_attempts {
        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, attempt, "Poll condition reached");
                return Ok(PollOutcome::Ready(value));
            }
            Ok(None) => {
                debug!(
                    resource = %resource_name,
                    attempt,
                    max_attempts = config.max_attempts,
                    "Not ready, waiting"
                );
            }
            Err(e) => {
                let classified = classify_anyhow_error(&e);
                if classified.is_retryable() {
                    warn!(
                        resource = %resource_name,
                        attempt,
                        error = %classified,
                        "Transient error during poll, retrying"
                    );
                } else {
                    return Err(e);
                }
            }
        }

        if attempt < config.max_attempts {
            sleep(config.interval).await;
        }
    }

    Ok(PollOutcome::TimedOut {
        attempts: config.max_attempts,
    })
}

/// Production wait strategy.
pub async fn tokio_sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
