use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::Shop;
use crate::metrics::Metrics;
use crate::session::ShopSession;
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig,
};

use super::{CatalogClient, CatalogError, Product, ProductQuery, ProductVariant, VARIANTS_PER_PRODUCT};

// ============================================================================
// Shopify Admin GraphQL catalog
// ============================================================================
//
// Every shop is a separate upstream (`https://{shop}/admin/...`), so each
// shop gets its own circuit breaker. A lookup is retried inside the breaker
// and the breaker sees one outcome per lookup.
//
// ============================================================================

const PRODUCTS_QUERY: &str = r#"
query getProducts($first: Int!, $query: String, $variantsFirst: Int!) {
  products(first: $first, query: $query) {
    edges {
      node {
        id
        title
        handle
        variants(first: $variantsFirst) {
          edges {
            node {
              id
              title
              sku
              price
              inventoryQuantity
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_version: String,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_version: "2024-10".to_string(),
            request_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

pub struct ShopifyCatalog {
    client: reqwest::Client,
    api_version: String,
    retry: RetryConfig,
    breaker_config: CircuitBreakerConfig,
    breakers: Mutex<HashMap<Shop, CircuitBreaker>>,
    metrics: Arc<Metrics>,
}

impl ShopifyCatalog {
    pub fn new(config: CatalogConfig, metrics: Arc<Metrics>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_version: config.api_version,
            retry: config.retry,
            breaker_config: config.breaker,
            breakers: Mutex::new(HashMap::new()),
            metrics,
        })
    }

    fn endpoint(&self, session: &ShopSession) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            session.shop, self.api_version
        )
    }

    async fn breaker_for(&self, shop: &Shop) -> CircuitBreaker {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(shop.clone())
            .or_insert_with(|| CircuitBreaker::new(self.breaker_config.clone()))
            .clone()
    }

    async fn open_breakers(&self) -> i64 {
        let breakers: Vec<CircuitBreaker> = self.breakers.lock().await.values().cloned().collect();

        let mut open = 0;
        for breaker in &breakers {
            if breaker.state().await == CircuitState::Open {
                open += 1;
            }
        }
        open
    }

    async fn fetch_products(
        &self,
        session: &ShopSession,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, CatalogError> {
        let body = json!({
            "query": PRODUCTS_QUERY,
            "variables": {
                "first": query.effective_limit(),
                "query": query.search_filter(),
                "variantsFirst": VARIANTS_PER_PRODUCT,
            }
        });

        let response = self
            .client
            .post(self.endpoint(session))
            .header("X-Shopify-Access-Token", &session.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Upstream(status.as_u16()));
        }

        let payload: GraphQlResponse = response.json().await?;
        payload.into_products()
    }
}

#[async_trait]
impl CatalogClient for ShopifyCatalog {
    async fn search_products(
        &self,
        session: &ShopSession,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, CatalogError> {
        let breaker = self.breaker_for(&session.shop).await;
        let before = breaker.state().await;

        let result = breaker
            .call(retry_on_transient(self.retry.clone(), move |_attempt| {
                self.fetch_products(session, query)
            }))
            .await
            .map_err(CatalogError::from);

        let after = breaker.state().await;
        if before != after {
            tracing::warn!(
                shop = %session.shop,
                from = before.as_str(),
                to = after.as_str(),
                "Catalog circuit breaker changed state"
            );
            self.metrics
                .record_circuit_breaker_transition(before.as_str(), after.as_str());
        }
        self.metrics.set_open_circuit_breakers(self.open_breakers().await);

        match &result {
            Ok(products) => {
                self.metrics.record_catalog_request("success");
                tracing::debug!(
                    shop = %session.shop,
                    count = products.len(),
                    "Fetched catalog products"
                );
            }
            Err(CatalogError::CircuitOpen) => {
                self.metrics.record_catalog_request("circuit_open");
                tracing::error!(shop = %session.shop, "Circuit breaker open - catalog unavailable");
            }
            Err(e) => {
                self.metrics.record_catalog_request("failure");
                tracing::error!(shop = %session.shop, error = %e, "Catalog lookup failed");
            }
        }

        result
    }
}

// ============================================================================
// GraphQL response shape
// ============================================================================

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<ProductsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct ProductsData {
    products: Connection<ProductNode>,
}

#[derive(Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Deserialize)]
struct ProductNode {
    id: String,
    title: String,
    handle: String,
    variants: Connection<ProductVariant>,
}

impl GraphQlResponse {
    fn into_products(self) -> Result<Vec<Product>, CatalogError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(CatalogError::GraphQl(messages.join("; ")));
        }

        let data = self.data.ok_or(CatalogError::EmptyResponse)?;

        Ok(data
            .products
            .edges
            .into_iter()
            .map(|Edge { node }| Product {
                id: node.id,
                title: node.title,
                handle: node.handle,
                variants: node.variants.edges.into_iter().map(|edge| edge.node).collect(),
            })
            .collect())
    }
}
