//! Request monitoring
//!
//! Structured request logging with correlation ids, and counters for the
//! network calls made through the gateway.

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::{LogLevel, MonitoringConfig};
pub use logging::{ApiLogger, RequestContext, RequestOutcome};
pub use metrics::{MetricsCollector, MetricsSnapshot, OperationStats};
