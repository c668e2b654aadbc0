//! Fabric REST API plumbing
//!
//! Request/response models, the error taxonomy, endpoint constants and the
//! request executor that performs a single outbound call per operation.

pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod monitoring;

pub use client::{HttpExecutor, RequestDefaults, RequestExecutor};
pub use error::{AuthError, GatewayError};
pub use models::{
    AuthMethod, AuthStatus, CachedCredential, CallerToken, GatewayResult, HttpMethod, ItemUpdate, JobExecutionResult,
    NewItem, RequestSpec,
};
pub use monitoring::{MetricsCollector, MetricsSnapshot, MonitoringConfig};
