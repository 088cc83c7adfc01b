use async_trait::async_trait;

use crate::domain::contract::{Contract, ContractChanges, ContractId, ContractSummary, NewContract};
use crate::domain::signature::{SignatureFilter, SignatureRecord};
use crate::domain::Shop;

// ============================================================================
// Contract Store - Persistence port
// ============================================================================
//
// Every method takes the tenant as a mandatory argument; implementations must
// apply it as a predicate on every statement.
//
// Multi-statement writes (insert with mappings, scalar update + mapping
// replacement, delete) are all-or-nothing: on error the stored state is
// exactly what it was before the call.
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::MemoryContractStore;
pub use postgres::PgContractStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    HasSignatures,
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Newest first, each with its mappings and signature count.
    async fn list_contracts(&self, shop: &Shop) -> Result<Vec<ContractSummary>, StoreError>;

    async fn find_contract(
        &self,
        shop: &Shop,
        id: ContractId,
    ) -> Result<Option<Contract>, StoreError>;

    async fn insert_contract(
        &self,
        shop: &Shop,
        draft: &NewContract,
    ) -> Result<Contract, StoreError>;

    /// Applies the scalar changes and swaps the mapping set for
    /// `changes.mappings` in one transaction. `None` when the contract does
    /// not exist under `shop`.
    async fn replace_contract(
        &self,
        shop: &Shop,
        id: ContractId,
        changes: &ContractChanges,
    ) -> Result<Option<Contract>, StoreError>;

    async fn delete_contract(
        &self,
        shop: &Shop,
        id: ContractId,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Newest signature first.
    async fn list_signatures(
        &self,
        shop: &Shop,
        filter: &SignatureFilter,
    ) -> Result<Vec<SignatureRecord>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
