use super::constants::{self, headers};
use super::error::GatewayError;
use super::models::{GatewayResult, RequestSpec};
use super::monitoring::{ApiLogger, MetricsCollector, MonitoringConfig, RequestContext};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

/// Request-level defaults shared by every call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub api_base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl RequestDefaults {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            api_base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            user_agent: constants::default_user_agent(),
            timeout_ms: constants::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Performs exactly one outbound call per invocation and normalizes the outcome
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, scope: &str, request: RequestSpec, bearer_token: &str) -> GatewayResult<Value>;
}

/// reqwest-backed executor for the Fabric REST API
#[derive(Clone)]
pub struct HttpExecutor {
    http_client: reqwest::Client,
    defaults: RequestDefaults,
    api_logger: ApiLogger,
    metrics_collector: MetricsCollector,
}

impl HttpExecutor {
    pub fn new(defaults: RequestDefaults, monitoring: MonitoringConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(constants::CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_custom_client(defaults, monitoring, http_client))
    }

    /// Create an executor around an existing HTTP client
    pub fn with_custom_client(defaults: RequestDefaults, monitoring: MonitoringConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            defaults,
            api_logger: ApiLogger::new(monitoring.clone()),
            metrics_collector: MetricsCollector::new(monitoring),
        }
    }

    /// Metrics for every network call made by this executor (shared across clones)
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics_collector
    }

    /// `{base}/{scope}/{endpoint}[?query]`
    pub fn build_url(&self, scope: &str, request: &RequestSpec) -> Result<Url, GatewayError> {
        let raw = format!(
            "{}/{}/{}",
            self.defaults.api_base_url.trim_end_matches('/'),
            scope.trim_matches('/'),
            request.endpoint_path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| GatewayError::Transport(format!("invalid URL '{}': {}", raw, e)))?;

        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    /// Default headers, then caller headers, then Authorization (never overridable)
    pub fn build_headers(&self, request: &RequestSpec, bearer_token: &str, correlation_id: &str) -> Result<HeaderMap, GatewayError> {
        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static(headers::CONTENT_TYPE_JSON));
        header_map.insert(ACCEPT, HeaderValue::from_static(headers::CONTENT_TYPE_JSON));
        header_map.insert(USER_AGENT, header_value(&self.defaults.user_agent)?);

        if self.api_logger.config().correlation_ids {
            header_map.insert(HeaderName::from_static(headers::X_CORRELATION_ID), header_value(correlation_id)?);
        }

        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GatewayError::Transport(format!("invalid header name '{}': {}", name, e)))?;
            if header_name == AUTHORIZATION {
                log::warn!("Ignoring caller-supplied Authorization header");
                continue;
            }
            header_map.insert(header_name, header_value(value)?);
        }

        let mut auth_value = header_value(&format!("Bearer {}", bearer_token))?;
        auth_value.set_sensitive(true);
        header_map.insert(AUTHORIZATION, auth_value);

        Ok(header_map)
    }

    /// Send and classify; the status is `None` when no response arrived
    async fn send(builder: reqwest::RequestBuilder) -> (Option<u16>, Result<Value, GatewayError>) {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return (None, Err(GatewayError::Transport(e.to_string()))),
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return (Some(status.as_u16()), Err(GatewayError::Transport(e.to_string()))),
        };

        if !status.is_success() {
            return (
                Some(status.as_u16()),
                Err(GatewayError::Remote {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                }),
            );
        }

        // No content (delete, accepted job) maps to null
        let data = if bytes.iter().all(u8::is_ascii_whitespace) {
            Ok(Value::Null)
        } else {
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Serialization(e.to_string()))
        };

        (Some(status.as_u16()), data)
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, scope: &str, request: RequestSpec, bearer_token: &str) -> GatewayResult<Value> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let context = RequestContext::new(request.method.as_str(), scope, &request.endpoint_path, &correlation_id);

        // Request construction failures never reach the network
        let url = match self.build_url(scope, &request) {
            Ok(url) => url,
            Err(e) => return e.into(),
        };
        let header_map = match self.build_headers(&request, bearer_token, &correlation_id) {
            Ok(header_map) => header_map,
            Err(e) => return e.into(),
        };
        self.api_logger.log_request(&context, url.as_str(), &header_map);

        let mut builder = self
            .http_client
            .request(request.method.into(), url)
            .headers(header_map);

        if let Some(body) = &request.body {
            match serde_json::to_vec(body) {
                Ok(bytes) => builder = builder.body(bytes),
                Err(e) => return GatewayError::Serialization(e.to_string()).into(),
            }
        }

        let timeout_ms = self.defaults.timeout_ms;
        let (status_code, result) = tokio::time::timeout(self.defaults.timeout(), Self::send(builder))
            .await
            .unwrap_or_else(|_| {
                (
                    None,
                    Err(GatewayError::Transport(format!("request timed out after {}ms", timeout_ms))),
                )
            });

        let outcome = context.outcome(status_code, result.as_ref().err().map(|e| e.to_string()));
        self.api_logger.log_outcome(&context, &outcome);
        self.metrics_collector.record(&context, &outcome);

        match result {
            Ok(data) => GatewayResult::success(data),
            Err(e) => e.into(),
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value).map_err(|e| GatewayError::Transport(format!("invalid header value: {}", e)))
}
