use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::Metrics;
use crate::store::ContractStore;

struct MetricsState {
    metrics: Arc<Metrics>,
    store: Arc<dyn ContractStore>,
}

/// Serves /metrics and /health on their own port, apart from the API.
pub async fn start_metrics_server(
    metrics: Arc<Metrics>,
    store: Arc<dyn ContractStore>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    let state = web::Data::new(MetricsState { metrics, store });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(state: web::Data<MetricsState>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(state: web::Data<MetricsState>) -> impl Responder {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "shop-contracts"
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed: store unreachable");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "shop-contracts"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContractStore;
    use actix_web::{http::StatusCode, test};

    fn state(store: Arc<MemoryContractStore>) -> web::Data<MetricsState> {
        web::Data::new(MetricsState {
            metrics: Arc::new(Metrics::new().unwrap()),
            store,
        })
    }

    #[actix_web::test]
    async fn test_health_reflects_store_reachability() {
        let store = Arc::new(MemoryContractStore::new());
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .route("/health", web::get().to(health_handler)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");

        store.set_unavailable(true);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_metrics_are_exposed_as_text() {
        let store = Arc::new(MemoryContractStore::new());
        let data = state(store);
        data.metrics.record_request("list_contracts", 200, 0.02);

        let app = test::init_service(
            App::new()
                .app_data(data)
                .route("/metrics", web::get().to(metrics_handler)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("api_requests_total"));
    }
}
