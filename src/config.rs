use crate::api::client::RequestDefaults;
use crate::api::constants;
use crate::api::error::AuthError;
use crate::api::monitoring::MonitoringConfig;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub use crate::api::models::AuthMethod;

pub const ENV_AUTH_METHOD: &str = "FABRIC_AUTH_METHOD";
pub const ENV_CLIENT_ID: &str = "FABRIC_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "FABRIC_CLIENT_SECRET";
pub const ENV_TENANT_ID: &str = "FABRIC_TENANT_ID";
pub const ENV_DEFAULT_WORKSPACE_ID: &str = "FABRIC_DEFAULT_WORKSPACE_ID";
pub const ENV_API_BASE_URL: &str = "FABRIC_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "FABRIC_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "FABRIC_USER_AGENT";
pub const ENV_MONITORING: &str = "FABRIC_MONITORING";

const NOT_CONFIGURED: &str = "Not configured";

/// Authentication settings, fixed for the lifetime of the process
#[derive(Clone, Default, PartialEq)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub default_scope_id: Option<String>,
    unrecognized_method: Option<String>,
}

impl AuthConfig {
    pub fn new(method: AuthMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_default_scope_id(mut self, scope_id: impl Into<String>) -> Self {
        self.default_scope_id = Some(scope_id.into());
        self
    }

    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let (method, unrecognized_method) = match get(ENV_AUTH_METHOD) {
            None => (AuthMethod::default(), None),
            Some(raw) => match raw.parse::<AuthMethod>() {
                Ok(method) => (method, None),
                Err(e) => {
                    warn!("{}; falling back to {}", e, AuthMethod::BearerToken);
                    (AuthMethod::BearerToken, Some(raw))
                }
            },
        };

        let config = Self {
            method,
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            tenant_id: get(ENV_TENANT_ID),
            default_scope_id: get(ENV_DEFAULT_WORKSPACE_ID),
            unrecognized_method,
        };
        debug!("Auth configuration: {:?}", config);
        config
    }

    /// Check that the selected method has every field it needs
    pub fn validate(&self) -> Result<(), AuthError> {
        if let Some(raw) = &self.unrecognized_method {
            return Err(AuthError::Configuration(format!(
                "Unknown authentication method '{}', using {}",
                raw,
                AuthMethod::BearerToken
            )));
        }

        match self.method {
            AuthMethod::BearerToken => Ok(()),
            AuthMethod::ServicePrincipal => {
                if self.client_id.is_none() || self.client_secret.is_none() || self.tenant_id.is_none() {
                    return Err(AuthError::Configuration(format!(
                        "{} requires {}, {} and {}",
                        self.method, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_TENANT_ID
                    )));
                }
                Ok(())
            }
            AuthMethod::DeviceCode | AuthMethod::Interactive => {
                if self.client_id.is_none() {
                    return Err(AuthError::Configuration(format!(
                        "{} requires {}",
                        self.method, ENV_CLIENT_ID
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn masked_client_id(&self) -> String {
        mask_identifier(self.client_id.as_deref())
    }

    pub fn masked_tenant_id(&self) -> String {
        mask_identifier(self.tenant_id.as_deref())
    }

    pub fn default_scope_display(&self) -> String {
        self.default_scope_id
            .clone()
            .unwrap_or_else(|| NOT_CONFIGURED.to_string())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("method", &self.method)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_id", &self.tenant_id)
            .field("default_scope_id", &self.default_scope_id)
            .finish()
    }
}

/// First 8 characters followed by `...`, or `Not configured`
pub fn mask_identifier(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => {
            let prefix: String = value.chars().take(8).collect();
            format!("{}...", prefix)
        }
        _ => NOT_CONFIGURED.to_string(),
    }
}

/// Request defaults and logging settings, read from `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub log_file: String,
    pub monitoring: MonitoringConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            user_agent: constants::default_user_agent(),
            timeout_ms: constants::DEFAULT_TIMEOUT_MS,
            log_file: "fabric-gateway.log".to_string(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("fabric-gateway")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".fabric-gateway")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        if !path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: GatewayConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!("Loaded config targeting {}", config.api_base_url);
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(ENV_API_BASE_URL) {
            self.api_base_url = base_url;
        }
        if let Some(user_agent) = get(ENV_USER_AGENT) {
            self.user_agent = user_agent;
        }
        if let Some(raw) = get(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(timeout_ms) => self.timeout_ms = timeout_ms,
                Err(_) => warn!("Ignoring invalid {} value: {}", ENV_TIMEOUT_MS, raw),
            }
        }
        if let Some(raw) = get(ENV_MONITORING) {
            match raw.trim().to_lowercase().as_str() {
                "off" | "false" | "0" => self.monitoring = MonitoringConfig::disabled(),
                "on" | "true" | "1" => {}
                _ => warn!("Ignoring invalid {} value: {}", ENV_MONITORING, raw),
            }
        }
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            api_base_url: self.api_base_url.clone(),
            user_agent: self.user_agent.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}
