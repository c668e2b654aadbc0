//! Credential provider
//!
//! Maps an [`AuthMethod`] onto the matching identity-provider flow after checking
//! that the fields the flow needs are present.

use super::identity::IdentityProvider;
use crate::api::error::AuthError;
use crate::api::models::{AuthMethod, CachedCredential};
use std::sync::Arc;

pub struct CredentialProvider {
    identity: Arc<dyn IdentityProvider>,
}

impl CredentialProvider {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Acquire a fresh credential for `method`
    ///
    /// Fails with [`AuthError::Configuration`] before any exchange when a required
    /// field is missing, and with [`AuthError::Acquisition`] when the identity
    /// provider rejects the request. The cache is left to the caller.
    pub async fn acquire(
        &self,
        method: AuthMethod,
        client_id: &str,
        client_secret: Option<&str>,
        tenant_id: Option<&str>,
    ) -> Result<CachedCredential, AuthError> {
        let client_secret = non_empty(client_secret);
        let tenant_id = non_empty(tenant_id);

        match method {
            AuthMethod::BearerToken => Err(AuthError::Configuration(
                "bearer_token does not acquire credentials; supply a token per call".to_string(),
            )),
            AuthMethod::ServicePrincipal => {
                require_client_id(client_id, method)?;
                let (Some(secret), Some(tenant)) = (client_secret, tenant_id) else {
                    return Err(AuthError::Configuration(
                        "service_principal requires FABRIC_CLIENT_SECRET and FABRIC_TENANT_ID".to_string(),
                    ));
                };
                self.identity.client_credentials_auth(client_id, secret, tenant).await
            }
            AuthMethod::DeviceCode => {
                require_client_id(client_id, method)?;
                self.identity.device_code_auth(client_id, tenant_id).await
            }
            AuthMethod::Interactive => {
                require_client_id(client_id, method)?;
                self.identity.interactive_auth(client_id, tenant_id).await
            }
        }
    }
}

fn require_client_id(client_id: &str, method: AuthMethod) -> Result<(), AuthError> {
    if client_id.trim().is_empty() {
        return Err(AuthError::Configuration(format!("{} requires FABRIC_CLIENT_ID", method)));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    /// Records which flow was invoked and with what tenant
    #[derive(Default)]
    struct RecordingIdentity {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingIdentity {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn issue(&self, call: String) -> Result<CachedCredential, AuthError> {
            self.calls.lock().unwrap().push(call);
            Ok(CachedCredential::new("issued", Utc::now() + Duration::hours(1)))
        }
    }

    #[async_trait]
    impl IdentityProvider for RecordingIdentity {
        async fn client_credentials_auth(&self, client_id: &str, _secret: &str, tenant_id: &str) -> Result<CachedCredential, AuthError> {
            self.issue(format!("client_credentials:{}:{}", client_id, tenant_id))
        }

        async fn device_code_auth(&self, client_id: &str, tenant_id: Option<&str>) -> Result<CachedCredential, AuthError> {
            self.issue(format!("device_code:{}:{}", client_id, tenant_id.unwrap_or("-")))
        }

        async fn interactive_auth(&self, client_id: &str, tenant_id: Option<&str>) -> Result<CachedCredential, AuthError> {
            self.issue(format!("interactive:{}:{}", client_id, tenant_id.unwrap_or("-")))
        }
    }

    fn provider() -> (Arc<RecordingIdentity>, CredentialProvider) {
        let identity = Arc::new(RecordingIdentity::default());
        (identity.clone(), CredentialProvider::new(identity))
    }

    #[tokio::test]
    async fn test_service_principal_requires_secret_and_tenant() {
        let (identity, provider) = provider();

        let err = provider
            .acquire(AuthMethod::ServicePrincipal, "app", None, Some("tenant"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));

        let err = provider
            .acquire(AuthMethod::ServicePrincipal, "app", Some("secret"), Some(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));

        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn test_service_principal_delegates() {
        let (identity, provider) = provider();

        let credential = provider
            .acquire(AuthMethod::ServicePrincipal, "app", Some("secret"), Some("tenant"))
            .await
            .unwrap();

        assert_eq!(credential.access_token, "issued");
        assert_eq!(identity.calls(), vec!["client_credentials:app:tenant"]);
    }

    #[tokio::test]
    async fn test_device_code_and_interactive_tenant_optional() {
        let (identity, provider) = provider();

        provider.acquire(AuthMethod::DeviceCode, "app", None, None).await.unwrap();
        provider
            .acquire(AuthMethod::Interactive, "app", None, Some("contoso"))
            .await
            .unwrap();

        assert_eq!(identity.calls(), vec!["device_code:app:-", "interactive:app:contoso"]);
    }

    #[tokio::test]
    async fn test_missing_client_id_and_bearer_token() {
        let (identity, provider) = provider();

        let err = provider.acquire(AuthMethod::DeviceCode, " ", None, None).await.unwrap_err();
        assert_eq!(err, AuthError::Configuration("device_code requires FABRIC_CLIENT_ID".to_string()));

        let err = provider.acquire(AuthMethod::BearerToken, "app", None, None).await.unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));

        assert!(identity.calls().is_empty());
    }
}
