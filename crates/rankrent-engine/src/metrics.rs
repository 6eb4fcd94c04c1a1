//! Keyword metrics with fallback data and call pacing.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use rankrent_core::{KeywordMetrics, Outcome};

use crate::remote::MetricsService;

/// Fetches metrics for one keyword at a time.
///
/// Every successful service call is followed by a fixed pause so that a
/// sequential search never exceeds the upstream request rate.
#[derive(Clone)]
pub struct MetricsFetcher {
    service: Arc<dyn MetricsService>,
    delay: Duration,
    fallback: bool,
}

impl MetricsFetcher {
    /// Create a fetcher pausing `delay` after each successful call.
    #[must_use]
    pub fn new(service: Arc<dyn MetricsService>, delay: Duration) -> Self {
        Self {
            service,
            delay,
            fallback: true,
        }
    }

    /// Report failures as [`Outcome::Failed`] instead of synthesizing values.
    #[must_use]
    pub fn without_fallback(mut self) -> Self {
        self.fallback = false;
        self
    }

    /// Fetch metrics for `keyword`.
    ///
    /// - `Ok` - clean service data
    /// - `Degraded` - service data carrying an error message, or synthetic
    ///   fallback data after a failed call
    /// - `Failed` - the call failed and fallback is disabled
    pub async fn fetch(&self, keyword: &str) -> Outcome<KeywordMetrics> {
        match self.service.keyword_metrics(keyword).await {
            Ok(metrics) => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }

                match metrics.error_message.clone() {
                    Some(reason) => {
                        tracing::debug!(keyword = %keyword, reason = %reason, "Metrics service returned estimates");
                        Outcome::Degraded(metrics, reason)
                    }
                    None => Outcome::Ok(metrics),
                }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(keyword = %keyword, error = %reason, "Metrics lookup failed");

                if self.fallback {
                    Outcome::Degraded(fallback_metrics(&reason), reason)
                } else {
                    Outcome::Failed(reason)
                }
            }
        }
    }
}

/// Synthetic metrics used when the service cannot be reached.
///
/// Search volume is uniform in `[100, 5100)`; CPC is uniform in
/// `[1.00, 16.00)` with two decimals.
fn fallback_metrics(reason: &str) -> KeywordMetrics {
    let mut rng = rand::thread_rng();
    let cents: u32 = rng.gen_range(100..1600);

    KeywordMetrics {
        search_volume: rng.gen_range(100..5100),
        cpc: f64::from(cents) / 100.0,
        error_message: Some(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        response: Option<KeywordMetrics>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricsService for Scripted {
        async fn keyword_metrics(&self, _keyword: &str) -> Result<KeywordMetrics, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .ok_or(RemoteError::EmptyPayload("metrics service"))
        }
    }

    fn fetcher(response: Option<KeywordMetrics>, delay: Duration) -> (MetricsFetcher, Arc<Scripted>) {
        let service = Arc::new(Scripted {
            response,
            calls: AtomicUsize::new(0),
        });
        (MetricsFetcher::new(service.clone(), delay), service)
    }

    #[tokio::test]
    async fn failure_yields_fallback_in_range() {
        let (fetcher, _) = fetcher(None, Duration::ZERO);

        for _ in 0..200 {
            let outcome = fetcher.fetch("plumber austin").await;
            assert!(outcome.is_degraded());
            let metrics = outcome.into_value().unwrap();
            assert!((100..5100).contains(&metrics.search_volume));
            assert!(metrics.cpc >= 1.0 && metrics.cpc < 16.0);
            assert_eq!((metrics.cpc * 100.0).round() / 100.0, metrics.cpc);
            assert!(metrics.error_message.is_some());
        }
    }

    #[tokio::test]
    async fn failure_without_fallback_is_failed() {
        let (fetcher, _) = fetcher(None, Duration::ZERO);
        let outcome = fetcher.without_fallback().fetch("plumber austin").await;
        assert!(outcome.value().is_none());
        assert!(outcome.reason().unwrap().contains("no data"));
    }

    #[tokio::test]
    async fn service_estimates_are_accepted_as_degraded() {
        let metrics = KeywordMetrics {
            search_volume: 720,
            cpc: 4.25,
            error_message: Some("estimated".into()),
        };
        let (fetcher, service) = fetcher(Some(metrics.clone()), Duration::ZERO);

        let outcome = fetcher.fetch("roofing waco").await;
        assert_eq!(outcome, Outcome::Degraded(metrics, "estimated".into()));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_calls_are_paced() {
        let metrics = KeywordMetrics {
            search_volume: 1000,
            cpc: 3.0,
            error_message: None,
        };
        let (fetcher, _) = fetcher(Some(metrics), Duration::from_millis(1000));

        let started = tokio::time::Instant::now();
        assert!(fetcher.fetch("a").await.is_ok());
        assert!(fetcher.fetch("b").await.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_calls_are_not_paced() {
        let (fetcher, _) = fetcher(None, Duration::from_millis(1000));

        let started = tokio::time::Instant::now();
        let _ = fetcher.fetch("a").await;
        assert!(started.elapsed() < Duration::from_millis(1000));
    }
}
