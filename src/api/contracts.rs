use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::domain::contract::{Contract, ContractId, ContractSummary, CreateContract, UpdateContract};

use super::auth::AuthenticatedShop;
use super::error::{ApiError, Failure};
use super::{status_of, AppState};

#[derive(Serialize)]
struct ContractsBody {
    contracts: Vec<ContractSummary>,
}

#[derive(Serialize)]
struct ContractBody {
    contract: Contract,
}

#[derive(Serialize)]
struct DeletedBody {
    success: bool,
}

pub async fn list(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("list_contracts");

    let result = state
        .contracts
        .for_shop(auth.shop())
        .list()
        .await
        .map(|contracts| HttpResponse::Ok().json(ContractsBody { contracts }))
        .map_err(|e| {
            Failure {
                operation: "list_contracts",
                shop: auth.shop(),
                contract_id: None,
                message: "Failed to fetch contracts",
            }
            .contract(e)
        });

    timer.finish(status_of(&result));
    result
}

pub async fn create(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
    body: web::Json<CreateContract>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("create_contract");

    let result = state
        .contracts
        .for_shop(auth.shop())
        .create(body.into_inner())
        .await
        .map(|contract| {
            state.metrics.record_mappings_written(contract.sku_mappings.len());
            HttpResponse::Ok().json(ContractBody { contract })
        })
        .map_err(|e| {
            Failure {
                operation: "create_contract",
                shop: auth.shop(),
                contract_id: None,
                message: "Failed to create contract",
            }
            .contract(e)
        });

    timer.finish(status_of(&result));
    result
}

pub async fn get(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
    path: web::Path<ContractId>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("get_contract");
    let id = path.into_inner();

    let result = state
        .contracts
        .for_shop(auth.shop())
        .get(id)
        .await
        .map(|contract| HttpResponse::Ok().json(ContractBody { contract }))
        .map_err(|e| {
            Failure {
                operation: "get_contract",
                shop: auth.shop(),
                contract_id: Some(id),
                message: "Failed to fetch contract",
            }
            .contract(e)
        });

    timer.finish(status_of(&result));
    result
}

pub async fn update(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
    path: web::Path<ContractId>,
    body: web::Json<UpdateContract>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("update_contract");
    let id = path.into_inner();

    let result = state
        .contracts
        .for_shop(auth.shop())
        .update(id, body.into_inner())
        .await
        .map(|contract| {
            state.metrics.record_mappings_written(contract.sku_mappings.len());
            HttpResponse::Ok().json(ContractBody { contract })
        })
        .map_err(|e| {
            Failure {
                operation: "update_contract",
                shop: auth.shop(),
                contract_id: Some(id),
                message: "Failed to process contract action",
            }
            .contract(e)
        });

    timer.finish(status_of(&result));
    result
}

pub async fn delete(
    auth: AuthenticatedShop,
    state: web::Data<AppState>,
    path: web::Path<ContractId>,
) -> Result<HttpResponse, ApiError> {
    let timer = state.metrics.track("delete_contract");
    let id = path.into_inner();

    let result = state
        .contracts
        .for_shop(auth.shop())
        .delete(id)
        .await
        .map(|()| HttpResponse::Ok().json(DeletedBody { success: true }))
        .map_err(|e| {
            Failure {
                operation: "delete_contract",
                shop: auth.shop(),
                contract_id: Some(id),
                message: "Failed to process contract action",
            }
            .contract(e)
        });

    timer.finish(status_of(&result));
    result
}

// ============================================================================
// HTTP Tests
// ============================================================================
