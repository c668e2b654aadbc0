//! Per-request structured logging
//!
//! Each outbound call is logged as a `request_sent` event and a single
//! `request_finished` event, both tagged with the call's correlation id.
//! Credentials never reach the log.

use super::config::{LogLevel, MonitoringConfig};
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};

/// Headers whose values are replaced before logging
const REDACTED_HEADER_MARKERS: [&str; 3] = ["authorization", "token", "key"];

#[derive(Debug, Clone)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// One outbound call to a workspace endpoint
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
    pub method: &'static str,
    pub scope: String,
    pub endpoint: String,
    pub started: Instant,
}

impl RequestContext {
    pub fn new(method: &'static str, scope: &str, endpoint: &str, correlation_id: &str) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            method,
            scope: scope.to_string(),
            endpoint: endpoint.to_string(),
            started: Instant::now(),
        }
    }

    /// Metrics key, e.g. `GET items`
    pub fn operation_key(&self) -> String {
        format!("{} {}", self.method, self.endpoint)
    }

    /// Close the call with its result; duration is measured from creation
    pub fn outcome(&self, status_code: Option<u16>, error: Option<String>) -> RequestOutcome {
        RequestOutcome {
            duration: self.started.elapsed(),
            status_code,
            error,
        }
    }
}

/// How a call ended
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub duration: Duration,
    /// Absent when no response arrived (transport failure or timeout)
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn kind(&self) -> &'static str {
        match (&self.error, self.status_code) {
            (None, _) => "success",
            (Some(_), Some(status)) if !(200..300).contains(&status) => "remote_error",
            (Some(_), Some(_)) => "body_error",
            (Some(_), None) => "transport_error",
        }
    }
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    pub fn log_request(&self, context: &RequestContext, url: &str, headers: &HeaderMap) {
        if !self.config.request_logging || !self.config.log_level.allows(LogLevel::Debug) {
            return;
        }

        let event = json!({
            "event": "request_sent",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "scope": context.scope,
            "url": url,
            "headers": redact_headers(headers),
        });
        debug!("{}", event);
    }

    pub fn log_outcome(&self, context: &RequestContext, outcome: &RequestOutcome) {
        let level = if outcome.is_success() { LogLevel::Info } else { LogLevel::Warn };
        if !self.config.request_logging || !self.config.log_level.allows(level) {
            return;
        }

        let event = json!({
            "event": "request_finished",
            "correlation_id": context.correlation_id,
            "operation": context.operation_key(),
            "scope": context.scope,
            "outcome": outcome.kind(),
            "status_code": outcome.status_code,
            "duration_ms": outcome.duration.as_millis() as u64,
            "error": outcome.error,
        });

        if outcome.is_success() {
            info!("{}", event);
        } else {
            warn!("{}", event);
        }
    }
}

fn redact_headers(headers: &HeaderMap) -> Value {
    let mut rendered = Map::new();
    for (name, value) in headers {
        let name = name.as_str();
        let shown = if REDACTED_HEADER_MARKERS.iter().any(|marker| name.contains(marker)) {
            "[REDACTED]".to_string()
        } else {
            value.to_str().unwrap_or("[non-ascii]").to_string()
        };
        rendered.insert(name.to_string(), Value::String(shown));
    }
    Value::Object(rendered)
}
