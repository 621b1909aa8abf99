/// Early token invalidation.
///
/// Logout and password reset kill tokens before their natural expiry by
/// blacklisting the jti. Entries carry a TTL equal to the token's
/// remaining validity; after that the token is dead on its own and the
/// entry is garbage. The trait keeps the backing store swappable: the
/// in-memory map here, a networked cache in a multi-instance deployment.
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ApiError;

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Blacklist `jti` until `now + ttl`. Idempotent; a second call
    /// overwrites the expiry.
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), ApiError>;

    /// True if `jti` is blacklisted and the entry has not yet lapsed.
    /// Unknown jtis are not revoked.
    async fn is_revoked(&self, jti: &str) -> Result<bool, ApiError>;
}

/// Process-local revocation store.
///
/// Inserts are atomic under the write lock, so a revoked token can never
/// be observed as valid once `revoke` returns. Expired entries are swept
/// lazily on insert; reads ignore lapsed entries regardless of sweep
/// timing.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), ApiError> {
        let expires_at = Utc::now() + ttl;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ApiError::Internal("revocation store lock poisoned".to_string()))?;

        let now = Utc::now();
        entries.retain(|_, expiry| *expiry > now);
        entries.insert(jti.to_string(), expires_at);

        tracing::info!(
            jti = %jti,
            ttl_seconds = ttl.num_seconds(),
            "token revoked"
        );
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, ApiError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ApiError::Internal("revocation store lock poisoned".to_string()))?;

        Ok(entries
            .get(jti)
            .map(|expiry| *expiry > Utc::now())
            .unwrap_or(false))
    }
}
