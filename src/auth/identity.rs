//! Identity provider collaborator
//!
//! The gateway only needs three capability calls from an identity provider.
//! [`EntraIdentityClient`] implements them against Microsoft Entra ID; tests
//! substitute their own [`IdentityProvider`].

use crate::api::constants;
use crate::api::error::AuthError;
use crate::api::models::CachedCredential;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Token lifetime assumed when the provider omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Upper bound for a single call to the authority
const IDENTITY_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Device-code polls are never closer together than this
const MIN_POLL_INTERVAL_SECS: u64 = 1;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn client_credentials_auth(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
    ) -> Result<CachedCredential, AuthError>;

    async fn device_code_auth(&self, client_id: &str, tenant_id: Option<&str>) -> Result<CachedCredential, AuthError>;

    async fn interactive_auth(&self, client_id: &str, tenant_id: Option<&str>) -> Result<CachedCredential, AuthError>;
}

/// Device authorization response
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_poll_interval() -> u64 {
    5
}

impl DeviceCodeResponse {
    /// Text shown to the user to complete sign-in
    pub fn instructions(&self) -> String {
        self.message.clone().unwrap_or_else(|| {
            format!(
                "To sign in, open {} and enter the code {}",
                self.verification_uri, self.user_code
            )
        })
    }
}

/// Microsoft Entra ID client for the Fabric API scope
pub struct EntraIdentityClient {
    client: reqwest::Client,
    authority_host: String,
    scope: String,
}

impl EntraIdentityClient {
    pub fn new() -> Result<Self, AuthError> {
        Self::with_authority_host(constants::AUTHORITY_HOST)
    }

    /// Point the client at a different authority host (sovereign clouds, tests)
    pub fn with_authority_host(authority_host: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IDENTITY_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(constants::CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            authority_host: authority_host.trim_end_matches('/').to_string(),
            scope: constants::FABRIC_SCOPE.to_string(),
        })
    }

    fn tenant_url(&self, tenant_id: Option<&str>, endpoint: &str) -> String {
        let tenant = tenant_id.filter(|t| !t.is_empty()).unwrap_or(constants::COMMON_TENANT);
        format!("{}/{}/oauth2/v2.0/{}", self.authority_host, tenant, endpoint)
    }

    /// Start a device authorization flow
    pub async fn request_device_code(&self, client_id: &str, tenant_id: Option<&str>) -> Result<DeviceCodeResponse, AuthError> {
        let url = self.tenant_url(tenant_id, "devicecode");
        debug!("Requesting device code from {}", url);

        let response = self
            .client
            .post(&url)
            .form(&[("client_id", client_id), ("scope", self.scope.as_str())])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<DeviceCodeResponse>().await?)
        } else {
            let error_text = response.text().await?;
            Err(AuthError::Acquisition(format!("Device code request failed: {}", error_text)))
        }
    }

    /// Poll the token endpoint until the user finishes sign-in or the code expires
    pub async fn poll_device_code(
        &self,
        client_id: &str,
        tenant_id: Option<&str>,
        device: &DeviceCodeResponse,
    ) -> Result<CachedCredential, AuthError> {
        let url = self.tenant_url(tenant_id, "token");
        let deadline = Instant::now()
            .checked_add(Duration::from_secs(device.expires_in))
            .ok_or_else(|| AuthError::Acquisition(format!("Device code lifetime out of range: {}s", device.expires_in)))?;
        let mut interval = Duration::from_secs(device.interval.max(MIN_POLL_INTERVAL_SECS));

        loop {
            if Instant::now() >= deadline {
                return Err(AuthError::Acquisition(
                    "Device code expired before sign-in completed".to_string(),
                ));
            }
            tokio::time::sleep(interval).await;

            let response = self
                .client
                .post(&url)
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", client_id),
                    ("device_code", device.device_code.as_str()),
                ])
                .send()
                .await?;

            if response.status().is_success() {
                let token_data: Value = response.json().await?;
                return parse_token_response(&token_data);
            }

            let error_data: Value = response.json().await.unwrap_or(Value::Null);
            match error_data.get("error").and_then(Value::as_str) {
                Some("authorization_pending") => {
                    debug!("Device code authorization pending");
                }
                Some("slow_down") => {
                    interval += Duration::from_secs(5);
                    debug!("Device code polling slowed to {:?}", interval);
                }
                _ => {
                    let description = error_data
                        .get("error_description")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error_data.to_string());
                    return Err(AuthError::Acquisition(format!("Device code sign-in failed: {}", description)));
                }
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for EntraIdentityClient {
    async fn client_credentials_auth(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
    ) -> Result<CachedCredential, AuthError> {
        let url = self.tenant_url(Some(tenant_id), "token");
        info!("Authenticating service principal {} against tenant {}", client_id, tenant_id);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        debug!("Token request status: {}", response.status());

        if response.status().is_success() {
            let token_data: Value = response.json().await?;
            parse_token_response(&token_data)
        } else {
            let error_text = response.text().await?;
            Err(AuthError::Acquisition(format!("Token request failed: {}", error_text)))
        }
    }

    async fn device_code_auth(&self, client_id: &str, tenant_id: Option<&str>) -> Result<CachedCredential, AuthError> {
        let device = self.request_device_code(client_id, tenant_id).await?;
        eprintln!("{}", device.instructions());
        info!("Waiting for device code sign-in (user code {})", device.user_code);

        self.poll_device_code(client_id, tenant_id, &device).await
    }

    async fn interactive_auth(&self, client_id: &str, tenant_id: Option<&str>) -> Result<CachedCredential, AuthError> {
        let device = self.request_device_code(client_id, tenant_id).await?;
        let prompt = format!("{}\nHave you completed sign-in in the browser?", device.instructions());

        let confirmed = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(true)
                .interact()
        })
        .await
        .map_err(|e| AuthError::Acquisition(format!("Interactive prompt failed: {}", e)))?
        .map_err(|e| AuthError::Acquisition(format!("Interactive prompt failed: {}", e)))?;

        if !confirmed {
            return Err(AuthError::Acquisition("Interactive sign-in cancelled".to_string()));
        }

        self.poll_device_code(client_id, tenant_id, &device).await
    }
}

/// Build a credential from a token endpoint response
pub fn parse_token_response(token_data: &Value) -> Result<CachedCredential, AuthError> {
    let access_token = token_data
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::Acquisition("No access token in response".to_string()))?;

    // expires_in arrives as a number or, from some endpoints, a string
    let expires_in = token_data
        .get("expires_in")
        .and_then(|e| e.as_i64().or_else(|| e.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    let expires_on = ChronoDuration::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| AuthError::Acquisition(format!("Token lifetime out of range: {}s", expires_in)))?;

    Ok(CachedCredential::new(access_token, expires_on))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_token_response() {
        let before = Utc::now();
        let credential = parse_token_response(&json!({
            "access_token": "abc",
            "expires_in": 600
        }))
        .unwrap();

        assert_eq!(credential.access_token, "abc");
        assert!(credential.expires_on >= before + ChronoDuration::seconds(600));
        assert!(credential.expires_on <= Utc::now() + ChronoDuration::seconds(600));
    }

    #[test]
    fn test_parse_token_response_defaults_and_strings() {
        let credential = parse_token_response(&json!({"access_token": "abc"})).unwrap();
        assert!(credential.expires_on > Utc::now() + ChronoDuration::seconds(3500));

        let credential = parse_token_response(&json!({"access_token": "abc", "expires_in": "120"})).unwrap();
        assert!(credential.expires_on <= Utc::now() + ChronoDuration::seconds(120));
    }

    #[test]
    fn test_parse_token_response_without_token() {
        let err = parse_token_response(&json!({"token_type": "Bearer"})).unwrap_err();
        assert_eq!(err, AuthError::Acquisition("No access token in response".to_string()));
    }

    #[test]
    fn test_parse_token_response_rejects_out_of_range_lifetime() {
        for expires_in in [json!(i64::MAX), json!(1_000_000_000_000_000i64), json!(i64::MIN)] {
            let err = parse_token_response(&json!({"access_token": "abc", "expires_in": expires_in})).unwrap_err();
            assert!(matches!(err, AuthError::Acquisition(ref msg) if msg.starts_with("Token lifetime out of range")));
        }
    }

    #[test]
    fn test_tenant_url() {
        let client = EntraIdentityClient::with_authority_host("https://login.example.com/").unwrap();
        assert_eq!(
            client.tenant_url(Some("contoso"), "token"),
            "https://login.example.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(
            client.tenant_url(None, "devicecode"),
            "https://login.example.com/organizations/oauth2/v2.0/devicecode"
        );
    }

    #[test]
    fn test_device_code_instructions() {
        let device: DeviceCodeResponse = serde_json::from_value(json!({
            "device_code": "dc",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://microsoft.com/devicelogin",
            "expires_in": 900
        }))
        .unwrap();

        assert_eq!(device.interval, 5);
        assert_eq!(
            device.instructions(),
            "To sign in, open https://microsoft.com/devicelogin and enter the code ABCD-EFGH"
        );
    }
}
