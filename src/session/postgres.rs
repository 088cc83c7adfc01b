use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::domain::Shop;
use crate::store::StoreError;

use super::{token_hash, SessionError, SessionProvider, ShopSession};

/// Reads the identity provider's `shop_sessions` table.
///
/// Bearer tokens are matched on `token_hash`; the provider's `id` column is
/// shop-derived and never consulted.
pub struct PgSessionProvider {
    pool: PgPool,
}

impl PgSessionProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_BY_TOKEN: &str =
    "SELECT shop, access_token, expires_at FROM shop_sessions WHERE token_hash = $1";

#[derive(sqlx::FromRow)]
struct SessionRow {
    shop: String,
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl SessionProvider for PgSessionProvider {
    async fn resolve(&self, token: &str) -> Result<ShopSession, SessionError> {
        let row: Option<SessionRow> = sqlx::query_as(SESSION_BY_TOKEN)
            .bind(token_hash(token))
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let row = row.ok_or(SessionError::Unknown)?;

        if row.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(SessionError::Expired);
        }

        Ok(ShopSession {
            shop: Shop::new(row.shop),
            access_token: row.access_token,
        })
    }
}
