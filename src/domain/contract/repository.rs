use std::sync::Arc;

use crate::domain::Shop;
use crate::store::{ContractStore, DeleteOutcome};

use super::commands::{CreateContract, UpdateContract};
use super::errors::ContractError;
use super::value_objects::{Contract, ContractId, ContractSummary};

// ============================================================================
// Contract Repository
// ============================================================================
//
// Orchestrates: Command → validation → ContractStore
//
// The repository itself is tenant-agnostic; all operations hang off the
// `ShopContracts` view returned by `for_shop`, so a call cannot be made
// without naming the shop it acts for.
//
// Mapping sets are replaced wholesale on update (delete all, insert the
// supplied list) inside the store's transaction. Retrying an update with the
// same payload converges on the same mapping set.
//
// ============================================================================

#[derive(Clone)]
pub struct ContractRepository {
    store: Arc<dyn ContractStore>,
}

impl ContractRepository {
    pub fn new(store: Arc<dyn ContractStore>) -> Self {
        Self { store }
    }

    pub fn for_shop<'a>(&'a self, shop: &'a Shop) -> ShopContracts<'a> {
        ShopContracts {
            store: self.store.as_ref(),
            shop,
        }
    }
}

pub struct ShopContracts<'a> {
    store: &'a dyn ContractStore,
    shop: &'a Shop,
}

impl ShopContracts<'_> {
    pub async fn list(&self) -> Result<Vec<ContractSummary>, ContractError> {
        let contracts = self.store.list_contracts(self.shop).await?;
        tracing::debug!(shop = %self.shop, count = contracts.len(), "Listed contracts");
        Ok(contracts)
    }

    pub async fn get(&self, id: ContractId) -> Result<Contract, ContractError> {
        self.store
            .find_contract(self.shop, id)
            .await?
            .ok_or(ContractError::NotFound(id))
    }

    pub async fn create(&self, command: CreateContract) -> Result<Contract, ContractError> {
        let draft = command.validate()?;
        let contract = self.store.insert_contract(self.shop, &draft).await?;

        tracing::info!(
            shop = %self.shop,
            contract_id = contract.id,
            mapping_count = contract.sku_mappings.len(),
            "✅ Contract created"
        );

        Ok(contract)
    }

    pub async fn update(
        &self,
        id: ContractId,
        command: UpdateContract,
    ) -> Result<Contract, ContractError> {
        let changes = command.validate()?;

        let contract = self
            .store
            .replace_contract(self.shop, id, &changes)
            .await?
            .ok_or(ContractError::NotFound(id))?;

        tracing::info!(
            shop = %self.shop,
            contract_id = id,
            mapping_count = contract.sku_mappings.len(),
            is_active = contract.is_active,
            "✅ Contract updated"
        );

        Ok(contract)
    }

    pub async fn delete(&self, id: ContractId) -> Result<(), ContractError> {
        match self.store.delete_contract(self.shop, id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!(shop = %self.shop, contract_id = id, "🗑️ Contract deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(ContractError::NotFound(id)),
            DeleteOutcome::HasSignatures => Err(ContractError::HasSignatures(id)),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
