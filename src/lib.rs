//! Authenticated gateway for Microsoft Fabric workspace operations
//!
//! Credential acquisition and caching, single-attempt request execution with a
//! hard timeout, and a simulation fallback when no credential is usable.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod gateway;

pub use api::{CallerToken, GatewayError, GatewayResult, JobExecutionResult};
pub use config::{AuthConfig, GatewayConfig};
pub use gateway::{Gateway, GatewayState};
