use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::catalog::{Product, ProductQuery};

use super::auth::AuthenticatedShop;
use super::error::{ApiError, Failure};
use super::{status_of, AppState};

#[derive(Serialize)]
struct ProductsBody {
    products: Vec<Product>,
}

/// Catalog search backing the SKU picker, using the shop's own access token.
pub async fn search(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("search_products");

    let result = state
        .catalog
        .search_products(auth.session(), &query)
        .await
        .map(|products| HttpResponse::Ok().json(ProductsBody { products }))
        .map_err(|e| {
            Failure {
                operation: "search_products",
                shop: auth.shop(),
                contract_id: None,
                message: "Failed to fetch products",
            }
            .internal(e)
        });

    timer.finish(status_of(&result));
    result
}
