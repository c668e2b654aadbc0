//! API Constants and Configuration for the Fabric REST API

/// Default Fabric REST API base address
pub const DEFAULT_API_BASE_URL: &str = "https://api.fabric.microsoft.com/v1";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection establishment timeout, independent of the per-request timeout
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Path segment that prefixes every workspace-scoped endpoint
pub const WORKSPACES_SEGMENT: &str = "workspaces";

/// OAuth scope requested for Fabric API tokens
pub const FABRIC_SCOPE: &str = "https://api.fabric.microsoft.com/.default";

/// Authority host for Microsoft Entra ID
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Authority used when no tenant is configured
pub const COMMON_TENANT: &str = "organizations";

/// Default user agent, versioned with the crate
pub fn default_user_agent() -> String {
    format!("Fabric-Workspace-Gateway/{}", env!("CARGO_PKG_VERSION"))
}

/// Standard headers for Fabric requests
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Header carrying the per-request correlation id
    pub const X_CORRELATION_ID: &str = "x-ms-client-request-id";
}

/// Build the workspace scope prefix, e.g. `workspaces/{id}`
pub fn workspace_scope(workspace_id: &str) -> String {
    format!("{}/{}", WORKSPACES_SEGMENT, urlencoding::encode(workspace_id))
}

/// Collection endpoint for workspace items
pub fn items_endpoint() -> String {
    "items".to_string()
}

/// Endpoint for a single item
pub fn item_endpoint(item_id: &str) -> String {
    format!("items/{}", urlencoding::encode(item_id))
}

/// Endpoint that starts a job for an item
pub fn job_instances_endpoint(item_id: &str) -> String {
    format!("items/{}/jobs/instances", urlencoding::encode(item_id))
}

/// Endpoint for polling a job instance
pub fn job_instance_endpoint(job_id: &str) -> String {
    format!("items/jobs/instances/{}", urlencoding::encode(job_id))
}
