use super::value_objects::ContractId;
use crate::store::StoreError;

// ============================================================================
// Contract Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("{0}")]
    Validation(String),

    /// Also returned for ids owned by another shop.
    #[error("Contract not found: {0}")]
    NotFound(ContractId),

    #[error("Contract {0} has recorded signatures")]
    HasSignatures(ContractId),

    #[error(transparent)]
    Store(#[from] StoreError),
}
