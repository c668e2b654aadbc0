//! Credential lifecycle: identity provider flows, acquisition, caching and selection

pub mod cache;
pub mod identity;
pub mod provider;
pub mod selector;

pub use cache::TokenCache;
pub use identity::{EntraIdentityClient, IdentityProvider};
pub use provider::CredentialProvider;
pub use selector::AuthSelector;
