//! Auth selector
//!
//! Answers "give me a usable token, or none" for the configured method, reusing
//! the cached credential while it is valid.

use super::cache::TokenCache;
use super::identity::IdentityProvider;
use super::provider::CredentialProvider;
use crate::api::models::AuthMethod;
use crate::config::AuthConfig;
use log::{debug, error, info};
use once_cell::sync::OnceCell;
use std::sync::Arc;

pub struct AuthSelector {
    config: Arc<AuthConfig>,
    cache: TokenCache,
    identity: Arc<dyn IdentityProvider>,
    provider: OnceCell<CredentialProvider>,
}

impl AuthSelector {
    pub fn new(config: Arc<AuthConfig>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            config,
            cache: TokenCache::new(),
            identity,
            provider: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Credential provider, built on first use and reused afterwards
    fn provider(&self) -> &CredentialProvider {
        self.provider
            .get_or_init(|| CredentialProvider::new(Arc::clone(&self.identity)))
    }

    /// A usable bearer token, or `None` when the caller should fall back to simulation
    ///
    /// Acquisition failures are logged and reported as `None`. Concurrent misses are
    /// not coalesced; each acquires on its own and the last write wins.
    pub async fn resolve_token(&self) -> Option<String> {
        if self.config.method == AuthMethod::BearerToken {
            return None;
        }
        let client_id = self.config.client_id.as_deref()?;

        if let Some(credential) = self.cache.get() {
            debug!("Using cached token (expires {})", credential.expires_on);
            return Some(credential.access_token);
        }

        info!("Acquiring new token using {}", self.config.method);
        let result = self
            .provider()
            .acquire(
                self.config.method,
                client_id,
                self.config.client_secret.as_deref(),
                self.config.tenant_id.as_deref(),
            )
            .await;

        match result {
            Ok(credential) => {
                debug!("Token acquired, expires {}", credential.expires_on);
                let token = credential.access_token.clone();
                self.cache.put(credential);
                Some(token)
            }
            Err(e) => {
                error!("Token acquisition failed for {}: {}", self.config.method, e);
                None
            }
        }
    }
}
