use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpResponse, ResponseError};
use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::domain::contract::ContractRepository;
use crate::domain::signature::SignatureLedger;
use crate::metrics::Metrics;
use crate::session::SessionProvider;

// ============================================================================
// HTTP API
// ============================================================================
//
//   GET    /contracts          list (newest first, with counts)
//   POST   /contracts          create
//   GET    /contracts/{id}     fetch with mappings
//   PUT    /contracts/{id}     update + replace mapping set
//   DELETE /contracts/{id}     delete (mappings cascade)
//   GET    /products           catalog search for SKU selection
//   GET    /signatures         signature ledger, optional ?contractId=
//
// Every route requires a shop session (see auth.rs).
//
// ============================================================================

mod auth;
mod contracts;
mod error;
mod products;
mod signatures;

pub use error::ApiError;

pub struct AppState {
    pub contracts: ContractRepository,
    pub signatures: SignatureLedger,
    pub catalog: Arc<dyn CatalogClient>,
    pub sessions: Arc<dyn SessionProvider>,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| {
            let message = match &err {
                JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
                other => format!("Invalid JSON body: {}", other),
            };
            ApiError::BadRequest(message).into()
        }),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid query: {}", err)).into()),
    )
    .service(
        web::resource("/contracts")
            .route(web::get().to(contracts::list))
            .route(web::post().to(contracts::create)),
    )
    .service(
        web::resource("/contracts/{id}")
            .route(web::get().to(contracts::get))
            .route(web::put().to(contracts::update))
            .route(web::delete().to(contracts::delete)),
    )
    .route("/products", web::get().to(products::search))
    .route("/signatures", web::get().to(signatures::list));
}

fn status_of(result: &Result<HttpResponse, ApiError>) -> u16 {
    match result {
        Ok(response) => response.status().as_u16(),
        Err(err) => err.status_code().as_u16(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;

    use crate::catalog::{CatalogError, Product, ProductQuery, ProductVariant};
    use crate::domain::Shop;
    use crate::session::{MemorySessionProvider, ShopSession};
    use crate::store::MemoryContractStore;

    pub const ACME: &str = "acme.myshopify.com";
    pub const OTHER: &str = "other.myshopify.com";

    /// Catalog double returning one fixed product, or failing on demand.
    pub struct StubCatalog {
        pub fail: bool,
    }

    #[async_trait]
    impl CatalogClient for StubCatalog {
        async fn search_products(
            &self,
            _session: &ShopSession,
            query: &ProductQuery,
        ) -> Result<Vec<Product>, CatalogError> {
            if self.fail {
                return Err(CatalogError::Upstream(502));
            }

            let product = Product {
                id: "gid://shopify/Product/1".to_string(),
                title: format!("Surfboard ({})", query.effective_limit()),
                handle: "surfboard".to_string(),
                variants: vec![ProductVariant {
                    id: "gid://shopify/ProductVariant/11".to_string(),
                    title: "7ft".to_string(),
                    sku: Some("SURF-7".to_string()),
                    price: Some("450.00".to_string()),
                    inventory_quantity: Some(3),
                }],
            };
            Ok(vec![product])
        }
    }

    pub struct Harness {
        pub store: Arc<MemoryContractStore>,
        pub state: web::Data<AppState>,
        pub acme_token: String,
        pub other_token: String,
    }

    pub async fn harness(catalog_fails: bool) -> Harness {
        let store = Arc::new(MemoryContractStore::new());
        let sessions = Arc::new(MemorySessionProvider::new());
        let acme_token = sessions.issue(Shop::new(ACME), "shpat_acme", None).await;
        let other_token = sessions.issue(Shop::new(OTHER), "shpat_other", None).await;

        let state = web::Data::new(AppState {
            contracts: ContractRepository::new(store.clone()),
            signatures: SignatureLedger::new(store.clone()),
            catalog: Arc::new(StubCatalog { fail: catalog_fails }),
            sessions,
            metrics: Arc::new(Metrics::new().expect("metrics registry")),
        });

        Harness {
            store,
            state,
            acme_token,
            other_token,
        }
    }

    /// Builds the API service over a harness' state.
    macro_rules! init_app {
        ($harness:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data($harness.state.clone())
                    .configure(crate::api::configure),
            )
            .await
        };
    }
    pub(crate) use init_app;

    pub fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}
