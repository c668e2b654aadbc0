//! Gateway façade
//!
//! Binds the auth selector and the request executor to a workspace scope and
//! exposes the workspace operations. When no usable token exists the façade
//! answers with a simulated success instead of calling the network.

use crate::api::client::{HttpExecutor, RequestExecutor};
use crate::api::constants;
use crate::api::error::GatewayError;
use crate::api::models::{AuthStatus, CallerToken, GatewayResult, ItemUpdate, NewItem, RequestSpec};
use crate::api::monitoring::MetricsCollector;
use crate::auth::{AuthSelector, EntraIdentityClient, IdentityProvider, TokenCache};
use crate::config::{AuthConfig, GatewayConfig};
use log::{debug, info};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Item type that means "no filter" when listing
pub const ALL_ITEM_TYPES: &str = "All";

/// Process-wide authentication state: configuration, token cache and the lazily built provider
pub struct GatewayState {
    selector: AuthSelector,
}

impl GatewayState {
    pub fn new(config: AuthConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            selector: AuthSelector::new(Arc::new(config), identity),
        }
    }

    pub fn auth_config(&self) -> &AuthConfig {
        self.selector.config()
    }

    pub fn token_cache(&self) -> &TokenCache {
        self.selector.cache()
    }

    pub fn selector(&self) -> &AuthSelector {
        &self.selector
    }
}

/// A façade call, ready to run or to simulate
struct Operation {
    name: &'static str,
    params: Value,
    request: RequestSpec,
}

impl Operation {
    fn new(name: &'static str, params: Value, request: RequestSpec) -> Self {
        Self { name, params, request }
    }
}

pub struct Gateway {
    state: Arc<GatewayState>,
    executor: Arc<dyn RequestExecutor>,
    metrics: Option<MetricsCollector>,
}

impl Gateway {
    pub fn new(state: Arc<GatewayState>, executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            state,
            executor,
            metrics: None,
        }
    }

    /// Gateway backed by Microsoft Entra ID and the reqwest executor
    pub fn from_config(auth: AuthConfig, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let executor = HttpExecutor::new(config.request_defaults(), config.monitoring.clone())?;
        let metrics = executor.metrics().clone();
        let state = Arc::new(GatewayState::new(auth, Arc::new(EntraIdentityClient::new()?)));

        Ok(Self::new(state, Arc::new(executor)).with_metrics(metrics))
    }

    /// Attach the collector that tracks the executor's network calls
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }

    /// List items, optionally filtered by type (`All` lists everything)
    pub async fn list_items(
        &self,
        token: &CallerToken,
        workspace_id: Option<&str>,
        item_type: Option<&str>,
    ) -> GatewayResult<Value> {
        let mut request = RequestSpec::get(constants::items_endpoint());
        if let Some(item_type) = item_type.filter(|t| !t.is_empty() && *t != ALL_ITEM_TYPES) {
            request = request.with_query("type", item_type);
        }

        let mut params = Map::new();
        insert_opt(&mut params, "itemType", item_type);

        self.run(token, workspace_id, Operation::new("list-items", Value::Object(params), request))
            .await
    }

    pub async fn get_item(&self, token: &CallerToken, workspace_id: Option<&str>, item_id: &str) -> GatewayResult<Value> {
        let request = RequestSpec::get(constants::item_endpoint(item_id));
        self.run(
            token,
            workspace_id,
            Operation::new("get-item", json!({ "itemId": item_id }), request),
        )
        .await
    }

    pub async fn create_item(
        &self,
        token: &CallerToken,
        workspace_id: Option<&str>,
        item_type: &str,
        display_name: &str,
        description: Option<&str>,
    ) -> GatewayResult<Value> {
        let body = match to_body(&NewItem::new(item_type, display_name, description)) {
            Ok(body) => body,
            Err(e) => return e.into(),
        };

        let mut params = Map::new();
        params.insert("itemType".to_string(), json!(item_type));
        params.insert("displayName".to_string(), json!(display_name));
        insert_opt(&mut params, "description", description);

        let request = RequestSpec::post(constants::items_endpoint(), body);
        self.run(token, workspace_id, Operation::new("create-item", Value::Object(params), request))
            .await
    }

    /// Partial update; only the fields set in `updates` are sent
    pub async fn update_item(
        &self,
        token: &CallerToken,
        workspace_id: Option<&str>,
        item_id: &str,
        updates: &ItemUpdate,
    ) -> GatewayResult<Value> {
        let body = match to_body(updates) {
            Ok(body) => body,
            Err(e) => return e.into(),
        };

        let params = json!({ "itemId": item_id, "updates": body.clone() });
        let request = RequestSpec::patch(constants::item_endpoint(item_id), body);
        self.run(token, workspace_id, Operation::new("update-item", params, request))
            .await
    }

    pub async fn delete_item(&self, token: &CallerToken, workspace_id: Option<&str>, item_id: &str) -> GatewayResult<Value> {
        let request = RequestSpec::delete(constants::item_endpoint(item_id));
        self.run(
            token,
            workspace_id,
            Operation::new("delete-item", json!({ "itemId": item_id }), request),
        )
        .await
    }

    /// Start a job for an item; the payload decodes into `JobExecutionResult`
    pub async fn execute_job(
        &self,
        token: &CallerToken,
        workspace_id: Option<&str>,
        item_id: &str,
        parameters: Option<Value>,
    ) -> GatewayResult<Value> {
        let mut params = Map::new();
        params.insert("itemId".to_string(), json!(item_id));

        let body = match parameters {
            Some(parameters) => {
                params.insert("parameters".to_string(), parameters.clone());
                json!({ "parameters": parameters })
            }
            None => json!({}),
        };

        let request = RequestSpec::post(constants::job_instances_endpoint(item_id), body);
        self.run(token, workspace_id, Operation::new("execute-job", Value::Object(params), request))
            .await
    }

    pub async fn get_job_status(&self, token: &CallerToken, workspace_id: Option<&str>, job_id: &str) -> GatewayResult<Value> {
        let request = RequestSpec::get(constants::job_instance_endpoint(job_id));
        self.run(
            token,
            workspace_id,
            Operation::new("get-job-status", json!({ "jobId": job_id }), request),
        )
        .await
    }

    /// Snapshot of the authentication state; may trigger an acquisition
    pub async fn auth_status(&self) -> AuthStatus {
        let config = self.state.auth_config();
        let has_valid_token = self.state.selector().resolve_token().await.is_some();
        let token_expiry = self
            .state
            .token_cache()
            .peek()
            .map(|credential| credential.expires_on.to_rfc3339())
            .unwrap_or_else(|| "Not available".to_string());

        AuthStatus {
            auth_method: config.method,
            has_valid_token,
            client_id: config.masked_client_id(),
            tenant_id: config.masked_tenant_id(),
            default_workspace: config.default_scope_display(),
            token_expiry,
        }
    }

    async fn run(&self, token: &CallerToken, workspace_id: Option<&str>, operation: Operation) -> GatewayResult<Value> {
        let bearer_token = match token {
            CallerToken::Explicit(token) => Some(token.clone()),
            CallerToken::UseEnvironmentAuth => self.state.selector().resolve_token().await,
        };

        let Some(bearer_token) = bearer_token else {
            info!("No credential available, simulating {}", operation.name);
            return simulate(operation);
        };

        let Some(workspace_id) = self.resolve_workspace(workspace_id) else {
            return GatewayError::Configuration(
                "No workspace id provided and FABRIC_DEFAULT_WORKSPACE_ID is not set".to_string(),
            )
            .into();
        };

        debug!("Executing {} in workspace {}", operation.name, workspace_id);
        let scope = constants::workspace_scope(workspace_id);
        self.executor.execute(&scope, operation.request, &bearer_token).await
    }

    fn resolve_workspace<'a>(&'a self, workspace_id: Option<&'a str>) -> Option<&'a str> {
        workspace_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.state.auth_config().default_scope_id.as_deref())
    }
}

fn simulate(operation: Operation) -> GatewayResult<Value> {
    GatewayResult::success(json!({
        "message": format!("Simulation: {} completed", operation.name),
        "params": operation.params,
    }))
}

fn insert_opt(params: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        params.insert(key.to_string(), json!(value));
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Serialization(e.to_string()))
}
