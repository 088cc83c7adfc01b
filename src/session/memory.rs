use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::Shop;

use super::{token_hash, SessionError, SessionProvider, ShopSession};

struct IssuedSession {
    session: ShopSession,
    expires_at: Option<DateTime<Utc>>,
}

/// Session table kept in process, for the memory backend and tests.
/// Keyed by token digest, like `shop_sessions`.
#[derive(Default)]
pub struct MemorySessionProvider {
    sessions: RwLock<HashMap<String, IssuedSession>>,
}

impl MemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session for `shop` and returns its bearer token.
    pub async fn issue(
        &self,
        shop: Shop,
        access_token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> String {
        let token = Uuid::new_v4().to_string();
        let session = ShopSession {
            shop,
            access_token: access_token.into(),
        };

        self.sessions
            .write()
            .await
            .insert(token_hash(&token), IssuedSession { session, expires_at });

        token
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn resolve(&self, token: &str) -> Result<ShopSession, SessionError> {
        let sessions = self.sessions.read().await;
        let issued = sessions
            .get(&token_hash(token))
            .ok_or(SessionError::Unknown)?;

        if issued.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(SessionError::Expired);
        }

        Ok(issued.session.clone())
    }
}
