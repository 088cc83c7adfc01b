use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::domain::signature::{SignatureFilter, SignatureRecord};

use super::auth::AuthenticatedShop;
use super::error::{ApiError, Failure};
use super::{status_of, AppState};

#[derive(Serialize)]
struct SignaturesBody {
    signatures: Vec<SignatureRecord>,
}

pub async fn list(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
    filter: web::Query<SignatureFilter>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("list_signatures");

    let result = state
        .signatures
        .for_shop(auth.shop())
        .list(&filter)
        .await
        .map(|signatures| HttpResponse::Ok().json(SignaturesBody { signatures }))
        .map_err(|e| {
            Failure {
                operation: "list_signatures",
                shop: auth.shop(),
                contract_id: filter.contract_id,
                message: "Failed to fetch signatures",
            }
            .internal(e)
        });

    timer.finish(status_of(&result));
    result
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use serde_json::{json, Value};

    use crate::api::test_support::{bearer, harness, init_app, Harness};

    async fn create_contract(h: &Harness, token: &str, name: &str) -> i64 {
        let app = init_app!(h);
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/contracts")
                .insert_header(bearer(token))
                .set_json(json!({ "name": name, "content": "Terms apply" }))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        body["contract"]["id"].as_i64().unwrap()
    }

    #[actix_web::test]
    async fn test_lists_signatures_with_contract_name() {
        let h = harness(false).await;
        let waiver = create_contract(&h, &h.acme_token, "Waiver").await;
        let rental = create_contract(&h, &h.acme_token, "Rental").await;
        h.store.record_signature(waiver, Some("Ada"), Some("ada@example.com"), Some("#1001")).await.unwrap();
        h.store.record_signature(rental, None, None, Some("#1002")).await.unwrap();

        let app = init_app!(h);

        let resp = test::call_service(
            &app,
            TestRequest::get()
                .uri("/signatures")
                .insert_header(bearer(&h.acme_token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let signatures = body["signatures"].as_array().unwrap();
        assert_eq!(signatures.len(), 2);
        assert!(signatures
            .iter()
            .any(|s| s["contract"]["name"] == "Waiver" && s["customerEmail"] == "ada@example.com"));

        let resp = test::call_service(
            &app,
            TestRequest::get()
                .uri(&format!("/signatures?contractId={}", rental))
                .insert_header(bearer(&h.acme_token))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        let signatures = body["signatures"].as_array().unwrap();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0]["orderId"], "#1002");
        assert_eq!(signatures[0]["customerName"], Value::Null);
    }

    #[actix_web::test]
    async fn test_signatures_are_scoped_to_shop() {
        let h = harness(false).await;
        let waiver = create_contract(&h, &h.acme_token, "Waiver").await;
        h.store.record_signature(waiver, Some("Ada"), None, None).await.unwrap();

        let app = init_app!(h);

        for uri in ["/signatures".to_string(), format!("/signatures?contractId={}", waiver)] {
            let resp = test::call_service(
                &app,
                TestRequest::get()
                    .uri(&uri)
                    .insert_header(bearer(&h.other_token))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["signatures"], json!([]));
        }
    }

    #[actix_web::test]
    async fn test_store_failure_is_generic_500() {
        let h = harness(false).await;
        let app = init_app!(h);
        h.store.set_unavailable(true);

        let resp = test::call_service(
            &app,
            TestRequest::get()
                .uri("/signatures")
                .insert_header(bearer(&h.acme_token))
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Failed to fetch signatures" }));
    }
}
