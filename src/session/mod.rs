use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::Shop;
use crate::store::StoreError;

// ============================================================================
// Shop Sessions - boundary to the identity provider
// ============================================================================
//
// The identity provider issues a random (uuid v4) token per session and
// stores only its SHA-256 hex digest, next to the shop's Admin API access
// token. Requests present the token as `Authorization: Bearer <token>`;
// resolving it is the only way a request obtains a `Shop`. Lookups go by
// digest and never by a row id, which may be derived from the shop name.
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::MemorySessionProvider;
pub use postgres::PgSessionProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct ShopSession {
    pub shop: Shop,
    pub access_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Missing session token")]
    Missing,

    #[error("Unknown session token")]
    Unknown,

    #[error("Session expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<ShopSession, SessionError>;
}

/// Lowercase hex SHA-256 of a bearer token, as stored in `shop_sessions.token_hash`.
pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
