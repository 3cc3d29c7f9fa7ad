//! Bounded-concurrency batch runner
//!
//! Runs one async job per input with at most `concurrency` jobs in flight.
//! Each job is retried with exponential backoff; a job that still fails is
//! reported in its [`BatchItemResult`] and never aborts the rest of the batch.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Batch runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum jobs in flight
    pub concurrency: usize,
    /// Attempts per item, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl BatchConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << (attempt - 1).min(16)))
    }
}

/// Outcome of one item
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItemResult<T> {
    /// Position of the item in the input
    pub index: usize,
    /// Value, or the last error message
    pub result: Result<T, String>,
    /// Attempts made
    pub attempts: u32,
}

/// Runs jobs over a list of inputs with a concurrency cap and retry
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    config: BatchConfig,
}

impl BatchProcessor {
    /// Create a processor; a zero concurrency or attempt count is raised to 1
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config: BatchConfig {
                concurrency: config.concurrency.max(1),
                max_attempts: config.max_attempts.max(1),
                ..config
            },
        }
    }

    /// Active configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run `job` over every item; results come back in input order
    ///
    /// Every failure is retried until `max_attempts` is reached.
    pub async fn run<I, T, E, F, Fut>(&self, items: Vec<I>, job: F) -> Vec<BatchItemResult<T>>
    where
        I: Send,
        T: Send,
        E: Display + Send,
        F: Fn(&I) -> Fut + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        self.run_with_retry(items, job, |_: &E| true).await
    }

    /// Like [`run`](Self::run), but only errors accepted by `retryable` are retried
    ///
    /// A rejected error ends the item on the attempt that produced it.
    pub async fn run_with_retry<I, T, E, F, Fut, R>(
        &self,
        items: Vec<I>,
        job: F,
        retryable: R,
    ) -> Vec<BatchItemResult<T>>
    where
        I: Send,
        T: Send,
        E: Display + Send,
        F: Fn(&I) -> Fut + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
        R: Fn(&E) -> bool + Sync,
    {
        let jobs: Vec<BoxFuture<'_, BatchItemResult<T>>> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| run_item(&self.config, index, item, &job, &retryable).boxed())
            .collect();

        let mut results: Vec<BatchItemResult<T>> = stream::iter(jobs)
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        results.sort_by_key(|r| r.index);
        results
    }
}

async fn run_item<I, T, E, F, Fut, R>(
    config: &BatchConfig,
    index: usize,
    item: I,
    job: &F,
    retryable: &R,
) -> BatchItemResult<T>
where
    E: Display,
    F: Fn(&I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let error = match job(&item).await {
            Ok(value) => {
                debug!(index, attempts, "Batch item succeeded");
                return BatchItemResult {
                    index,
                    result: Ok(value),
                    attempts,
                };
            }
            Err(e) => e,
        };

        if attempts >= config.max_attempts || !retryable(&error) {
            warn!(index, attempts, error = %error, "Batch item failed");
            return BatchItemResult {
                index,
                result: Err(error.to_string()),
                attempts,
            };
        }

        let delay = config.delay_for(attempts);
        warn!(index, attempts, ?delay, error = %error, "Batch item failed, retrying");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast(concurrency: usize) -> BatchProcessor {
        BatchProcessor::new(BatchConfig {
            concurrency,
            max_attempts: 3,
            base_delay_ms: 1,
        })
    }

    #[test]
    fn test_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay_for(1), Duration::from_millis(500));
        assert_eq!(config.delay_for(3), Duration::from_millis(2000));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let items = vec![30u64, 10, 20, 0];
        let results = fast(4)
            .run(items, |ms| {
                let ms = *ms;
                async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok::<_, String>(ms * 2)
                }
            })
            .await;

        let values: Vec<u64> = results.iter().map(|r| r.result.clone().unwrap()).collect();
        assert_eq!(values, vec![60, 20, 40, 0]);
        assert!(results.iter().enumerate().all(|(i, r)| r.index == i));
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let items: Vec<usize> = (0..12).collect();

        fast(3)
            .run(items, |_| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                }
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let results = fast(1)
            .run(vec!["flaky"], |_| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("transient")
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(results[0].result, Ok("done"));
        assert_eq!(results[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_propagated() {
        let items = vec![1, 2, 3];
        let results = fast(2)
            .run(items, |n| {
                let n = *n;
                async move {
                    if n == 2 {
                        Err(format!("item {} broke", n))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(results[0].result, Ok(1));
        assert_eq!(results[1].result, Err("item 2 broke".to_string()));
        assert_eq!(results[1].attempts, 3);
        assert_eq!(results[2].result, Ok(3));
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_after_first_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let results = fast(2)
            .run_with_retry(
                vec!["", "ok"],
                |text| {
                    let calls = calls.clone();
                    let text = text.to_string();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        if text.is_empty() {
                            Err("blank".to_string())
                        } else {
                            Ok(text)
                        }
                    }
                },
                |e: &String| e != "blank",
            )
            .await;

        assert_eq!(results[0].result, Err("blank".to_string()));
        assert_eq!(results[0].attempts, 1);
        assert_eq!(results[1].result, Ok("ok".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_batch_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        let processor = BatchProcessor::default();
        let future = processor.run(vec![String::from("a")], |s| {
            let s = s.clone();
            async move { Ok::<_, String>(s.len()) }
        });
        assert_send(&future);
    }
}
