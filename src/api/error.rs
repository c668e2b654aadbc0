//! Error taxonomy for the gateway
//!
//! Everything below the façade is expressed as a [`GatewayError`]; the façade folds it
//! into a `GatewayResult::Error` so no error escapes as a hard failure.

use thiserror::Error;

/// Errors produced while acquiring a credential
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// A field required by the selected auth method is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The identity provider rejected or failed the exchange
    #[error("Authentication failed: {0}")]
    Acquisition(String),
}

/// Errors produced while executing a gateway operation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    AuthAcquisition(String),

    /// Network failure or timeout
    #[error("Request failed: {0}")]
    Transport(String),

    /// Non-2xx response, body kept verbatim for diagnostics
    #[error("HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// A 2xx response whose body was not valid JSON
    #[error("Invalid JSON response: {0}")]
    Serialization(String),
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Configuration(msg) => GatewayError::Configuration(msg),
            AuthError::Acquisition(msg) => GatewayError::AuthAcquisition(msg),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Acquisition(err.to_string())
    }
}
