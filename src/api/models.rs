use super::error::GatewayError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Authentication strategy, chosen once at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// The caller supplies a token per call; no acquisition happens
    #[default]
    BearerToken,
    ServicePrincipal,
    DeviceCode,
    Interactive,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::BearerToken => "bearer_token",
            AuthMethod::ServicePrincipal => "service_principal",
            AuthMethod::DeviceCode => "device_code",
            AuthMethod::Interactive => "interactive",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both snake_case and kebab-case spellings
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bearer_token" | "bearer" => Ok(AuthMethod::BearerToken),
            "service_principal" => Ok(AuthMethod::ServicePrincipal),
            "device_code" => Ok(AuthMethod::DeviceCode),
            "interactive" => Ok(AuthMethod::Interactive),
            other => Err(format!("Unknown authentication method: {}", other)),
        }
    }
}

/// Access token plus its expiry, as handed out by the identity provider
#[derive(Clone, PartialEq)]
pub struct CachedCredential {
    pub access_token: String,
    pub expires_on: DateTime<Utc>,
}

impl CachedCredential {
    pub fn new(access_token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_on,
        }
    }

    /// Valid iff `now < expires_on`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_on
    }
}

impl fmt::Debug for CachedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCredential")
            .field("access_token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// HTTP verbs used by workspace operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One outbound call, relative to the workspace scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSpec {
    pub endpoint_path: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
    /// Scalar values only; each is string-converted when appended to the URL
    pub query_params: Option<BTreeMap<String, Value>>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, endpoint_path: impl Into<String>) -> Self {
        Self {
            endpoint_path: endpoint_path.into(),
            method,
            ..Default::default()
        }
    }

    pub fn get(endpoint_path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint_path)
    }

    pub fn post(endpoint_path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, endpoint_path).with_body(body)
    }

    pub fn patch(endpoint_path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, endpoint_path).with_body(body)
    }

    pub fn delete(endpoint_path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint_path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Query parameters rendered as string pairs
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_params
            .iter()
            .flatten()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}

/// The single outcome shape crossing every boundary of the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GatewayResult<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> GatewayResult<T> {
    pub fn success(data: T) -> Self {
        GatewayResult::Success { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GatewayResult::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GatewayResult::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            GatewayResult::Success { data } => Some(data),
            GatewayResult::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            GatewayResult::Success { .. } => None,
            GatewayResult::Error { message } => Some(message),
        }
    }
}

impl GatewayResult<Value> {
    /// Decode a JSON payload into a typed one; a shape mismatch becomes an `Error`
    pub fn decode<T: DeserializeOwned>(self) -> GatewayResult<T> {
        match self {
            GatewayResult::Success { data } => match serde_json::from_value(data) {
                Ok(typed) => GatewayResult::Success { data: typed },
                Err(e) => GatewayError::Serialization(e.to_string()).into(),
            },
            GatewayResult::Error { message } => GatewayResult::Error { message },
        }
    }
}

impl<T> From<GatewayError> for GatewayResult<T> {
    fn from(err: GatewayError) -> Self {
        GatewayResult::Error {
            message: err.to_string(),
        }
    }
}

/// Token supplied by the caller of a façade operation
#[derive(Clone, PartialEq, Eq, Default)]
pub enum CallerToken {
    Explicit(String),
    /// Resolve through the configured auth method, or simulate
    #[default]
    UseEnvironmentAuth,
}

impl From<Option<String>> for CallerToken {
    fn from(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => CallerToken::Explicit(token),
            _ => CallerToken::UseEnvironmentAuth,
        }
    }
}

impl fmt::Debug for CallerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerToken::Explicit(_) => f.write_str("Explicit([REDACTED])"),
            CallerToken::UseEnvironmentAuth => f.write_str("UseEnvironmentAuth"),
        }
    }
}

/// Job instance as returned by job trigger/poll endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobExecutionResult {
    pub id: String,
    pub status: String,
    pub created_date_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body for item creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub display_name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewItem {
    pub fn new(item_type: &str, display_name: &str, description: Option<&str>) -> Self {
        Self {
            display_name: display_name.to_string(),
            item_type: item_type.to_string(),
            // Empty descriptions are not sent
            description: description.filter(|d| !d.is_empty()).map(str::to_string),
        }
    }
}

/// Partial update for an item; unset fields are left out of the body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.description.is_none()
    }
}

/// Diagnostic snapshot of the authentication state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub auth_method: AuthMethod,
    pub has_valid_token: bool,
    pub client_id: String,
    pub tenant_id: String,
    pub default_workspace: String,
    pub token_expiry: String,
}
