use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::ShopSession;
use crate::utils::{CircuitBreakerError, IsTransient};

// ============================================================================
// Catalog Query Service
// ============================================================================
//
// Read-only product/variant lookup used when picking SKUs for a contract.
// Contract CRUD never depends on it; a catalog outage only fails /products.
//
// ============================================================================

mod shopify;

pub use shopify::{CatalogConfig, ShopifyCatalog};

pub const DEFAULT_PRODUCT_LIMIT: u32 = 50;
pub const MAX_PRODUCT_LIMIT: u32 = 250;
pub const VARIANTS_PER_PRODUCT: u32 = 100;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub variants: Vec<ProductVariant>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub inventory_quantity: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ProductQuery {
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PRODUCT_LIMIT)
            .clamp(1, MAX_PRODUCT_LIMIT)
    }

    /// Shopify search syntax for a title substring match.
    pub fn search_filter(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("title:*{}*", s))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: circuit breaker open")]
    CircuitOpen,

    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Catalog responded with status {0}")]
    Upstream(u16),

    #[error("Catalog query rejected: {0}")]
    GraphQl(String),

    #[error("Catalog response missing data")]
    EmptyResponse,
}

impl IsTransient for CatalogError {
    fn is_transient(&self) -> bool {
        match self {
            CatalogError::Request(e) => e.is_timeout() || e.is_connect(),
            CatalogError::Upstream(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<CircuitBreakerError<CatalogError>> for CatalogError {
    fn from(err: CircuitBreakerError<CatalogError>) -> Self {
        match err {
            CircuitBreakerError::CircuitOpen => CatalogError::CircuitOpen,
            CircuitBreakerError::OperationFailed(inner) => inner,
        }
    }
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_products(
        &self,
        session: &ShopSession,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(ProductQuery::default().effective_limit(), 50);
        let huge = ProductQuery { limit: Some(10_000), ..Default::default() };
        assert_eq!(huge.effective_limit(), 250);
        let zero = ProductQuery { limit: Some(0), ..Default::default() };
        assert_eq!(zero.effective_limit(), 1);
    }

    #[test]
    fn test_search_filter_matches_title_substring() {
        let query = ProductQuery { search: Some(" board ".to_string()), ..Default::default() };
        assert_eq!(query.search_filter().as_deref(), Some("title:*board*"));

        let blank = ProductQuery { search: Some("  ".to_string()), ..Default::default() };
        assert_eq!(blank.search_filter(), None);
    }

    #[test]
    fn test_transient_classification() {
        assert!(CatalogError::Upstream(503).is_transient());
        assert!(CatalogError::Upstream(429).is_transient());
        assert!(!CatalogError::Upstream(401).is_transient());
        assert!(!CatalogError::GraphQl("bad query".to_string()).is_transient());
        assert!(!CatalogError::CircuitOpen.is_transient());
    }

    #[test]
    fn test_breaker_error_unwraps_to_catalog_error() {
        let open: CatalogError = CircuitBreakerError::CircuitOpen.into();
        assert!(matches!(open, CatalogError::CircuitOpen));

        let failed: CatalogError =
            CircuitBreakerError::OperationFailed(CatalogError::Upstream(502)).into();
        assert!(matches!(failed, CatalogError::Upstream(502)));
    }
}
