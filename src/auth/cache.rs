//! Single-slot token cache
//!
//! Holds at most one credential. The slot is swapped atomically so readers
//! never see a token paired with another token's expiry.

use crate::api::models::CachedCredential;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TokenCache {
    slot: ArcSwapOption<CachedCredential>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached credential if it is still valid now
    pub fn get(&self) -> Option<CachedCredential> {
        self.get_at(Utc::now())
    }

    /// Cached credential if it is valid at `now`; expired entries read as absent but stay in place
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<CachedCredential> {
        self.slot
            .load_full()
            .filter(|credential| credential.is_valid_at(now))
            .map(|credential| (*credential).clone())
    }

    /// Whatever is in the slot, expired or not
    pub fn peek(&self) -> Option<CachedCredential> {
        self.slot.load_full().map(|credential| (*credential).clone())
    }

    /// Replace the slot unconditionally
    pub fn put(&self, credential: CachedCredential) {
        self.slot.store(Some(Arc::new(credential)));
    }
}
