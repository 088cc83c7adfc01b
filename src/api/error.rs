use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::contract::{ContractError, ContractId};
use crate::domain::Shop;

// ============================================================================
// API Errors
// ============================================================================
//
// The response body is always `{"error": "<message>"}`. Messages for 5xx are
// fixed per operation; the underlying cause is logged and never returned.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Contract not found")]
    NotFound,

    #[error("Contract has recorded signatures and cannot be deleted")]
    Conflict,

    #[error("{0}")]
    Internal(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Where a contract operation failed; used to log store failures.
pub struct Failure<'a> {
    pub operation: &'static str,
    pub shop: &'a Shop,
    pub contract_id: Option<ContractId>,
    pub message: &'static str,
}

impl Failure<'_> {
    pub fn contract(self, err: ContractError) -> ApiError {
        match err {
            ContractError::Validation(message) => {
                tracing::debug!(
                    operation = self.operation,
                    shop = %self.shop,
                    reason = %message,
                    "Rejected invalid contract payload"
                );
                ApiError::BadRequest(message)
            }
            ContractError::NotFound(id) => {
                tracing::debug!(operation = self.operation, shop = %self.shop, contract_id = id, "Contract not found");
                ApiError::NotFound
            }
            ContractError::HasSignatures(id) => {
                tracing::warn!(
                    operation = self.operation,
                    shop = %self.shop,
                    contract_id = id,
                    "Refused to delete a signed contract"
                );
                ApiError::Conflict
            }
            ContractError::Store(store_err) => {
                tracing::error!(
                    operation = self.operation,
                    shop = %self.shop,
                    contract_id = ?self.contract_id,
                    error = %store_err,
                    "Contract operation failed"
                );
                ApiError::Internal(self.message)
            }
        }
    }

    /// For failures that are always internal (store, catalog).
    pub fn internal(self, err: impl std::fmt::Display) -> ApiError {
        tracing::error!(
            operation = self.operation,
            shop = %self.shop,
            contract_id = ?self.contract_id,
            error = %err,
            "Request failed"
        );
        ApiError::Internal(self.message)
    }
}
