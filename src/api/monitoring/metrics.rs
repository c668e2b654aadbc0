//! Request counters
//!
//! Counts every network call the executor performs, so callers can tell
//! real traffic from simulated results.

use super::config::MonitoringConfig;
use super::logging::{RequestContext, RequestOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Shared collector; clones observe the same counters
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Counters>>,
    per_operation: bool,
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: u64,
    failed_requests: u64,
    total_duration: Duration,
    operations: BTreeMap<String, OperationStats>,
}

/// Counters for one `METHOD endpoint` key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationStats {
    pub requests: u64,
    pub failures: u64,
    pub max_duration_ms: u64,
    /// Response status counts; calls without a response are not counted here
    pub status_codes: BTreeMap<u16, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub average_duration_ms: u64,
    pub operations: BTreeMap<String, OperationStats>,
}

impl MetricsCollector {
    /// The per-operation breakdown follows `performance_metrics`; totals are always kept
    pub fn new(config: MonitoringConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Counters::default())),
            per_operation: config.performance_metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // A poisoned lock only means a panic mid-update; counters stay usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, context: &RequestContext, outcome: &RequestOutcome) {
        let mut counters = self.lock();

        counters.total_requests += 1;
        if !outcome.is_success() {
            counters.failed_requests += 1;
        }
        counters.total_duration += outcome.duration;

        if self.per_operation {
            let stats = counters.operations.entry(context.operation_key()).or_default();
            stats.requests += 1;
            if !outcome.is_success() {
                stats.failures += 1;
            }
            stats.max_duration_ms = stats.max_duration_ms.max(outcome.duration.as_millis() as u64);
            if let Some(status) = outcome.status_code {
                *stats.status_codes.entry(status).or_insert(0) += 1;
            }
        }
    }

    /// Number of network calls made so far
    pub fn total_requests(&self) -> u64 {
        self.lock().total_requests
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.lock();
        let average_duration_ms = match counters.total_requests {
            0 => 0,
            n => (counters.total_duration.as_millis() / n as u128) as u64,
        };

        MetricsSnapshot {
            total_requests: counters.total_requests,
            failed_requests: counters.failed_requests,
            average_duration_ms,
            operations: counters.operations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(method: &'static str, endpoint: &str, status: Option<u16>, error: Option<&str>, millis: u64) -> (RequestContext, RequestOutcome) {
        let context = RequestContext::new(method, "workspaces/ws-1", endpoint, "corr");
        let outcome = RequestOutcome {
            duration: Duration::from_millis(millis),
            status_code: status,
            error: error.map(str::to_string),
        };
        (context, outcome)
    }

    #[test]
    fn test_records_totals_and_breakdown() {
        let collector = MetricsCollector::new(MonitoringConfig::default());

        for (context, outcome) in [
            finished("GET", "items", Some(200), None, 100),
            finished("GET", "items", Some(404), Some("HTTP 404: not found"), 300),
            finished("POST", "items", None, Some("timed out"), 50),
        ] {
            collector.record(&context, &outcome);
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.failed_requests, 2);
        assert_eq!(snapshot.average_duration_ms, 150);

        let get_items = &snapshot.operations["GET items"];
        assert_eq!(get_items.requests, 2);
        assert_eq!(get_items.failures, 1);
        assert_eq!(get_items.max_duration_ms, 300);
        assert_eq!(get_items.status_codes.get(&404), Some(&1));
        assert!(snapshot.operations["POST items"].status_codes.is_empty());
    }

    #[test]
    fn test_totals_counted_when_breakdown_disabled() {
        let collector = MetricsCollector::new(MonitoringConfig::disabled());
        let (context, outcome) = finished("GET", "items", Some(200), None, 10);
        collector.record(&context, &outcome);

        assert_eq!(collector.total_requests(), 1);
        assert!(collector.snapshot().operations.is_empty());
    }

    #[test]
    fn test_snapshot_serializes_for_log() {
        let collector = MetricsCollector::new(MonitoringConfig::default());
        let (context, outcome) = finished("DELETE", "items/1", Some(200), None, 5);
        collector.record(&context, &outcome);

        let rendered: serde_json::Value = serde_json::from_str(&serde_json::to_string(&collector.snapshot()).unwrap()).unwrap();
        assert_eq!(rendered["total_requests"], 1);
        assert_eq!(rendered["operations"]["DELETE items/1"]["status_codes"]["200"], 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let collector = MetricsCollector::new(MonitoringConfig::default());
        let clone = collector.clone();

        let (context, outcome) = finished("DELETE", "items/1", Some(200), None, 5);
        clone.record(&context, &outcome);

        assert_eq!(collector.total_requests(), 1);
        assert_eq!(collector.snapshot().average_duration_ms, 5);
    }
}
