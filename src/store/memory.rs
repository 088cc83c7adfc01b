use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::contract::{
    Contract, ContractChanges, ContractId, ContractSummary, NewContract, SkuMapping, SkuSelection,
};
use crate::domain::signature::{ContractRef, SignatureFilter, SignatureRecord};
use crate::domain::Shop;

use super::{ContractStore, DeleteOutcome, StoreError};

// ============================================================================
// In-Memory Contract Store
// ============================================================================
//
// Used for local demos and as the test double for the repository.
//
// Writes are applied to a copy of the state which replaces the live state
// only after the whole operation succeeded, so a failure part-way through
// leaves nothing behind. Readers hold the read lock and never see the copy.
//
// `record_signature` stands in for the checkout extension, which owns
// signature creation; the demo backend uses it to seed the ledger.
//
// Test-only switches:
// - `set_unavailable(true)`     every call fails with StoreError::Unavailable
// - `fail_next_replace()`       the next replace fails after its mapping delete
//
// ============================================================================

#[derive(Clone, Default)]
struct MemoryState {
    last_contract_id: ContractId,
    last_mapping_id: i64,
    contracts: BTreeMap<ContractId, StoredContract>,
    signatures: Vec<StoredSignature>,
}

#[derive(Clone)]
struct StoredContract {
    shop: Shop,
    name: String,
    content: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    mappings: Vec<SkuMapping>,
}

#[derive(Clone)]
struct StoredSignature {
    id: i64,
    contract_id: ContractId,
    customer_name: Option<String>,
    customer_email: Option<String>,
    order_id: Option<String>,
    signed_at: DateTime<Utc>,
}

impl MemoryState {
    fn owned(&self, shop: &Shop, id: ContractId) -> Option<&StoredContract> {
        self.contracts.get(&id).filter(|c| &c.shop == shop)
    }

    fn owned_mut(&mut self, shop: &Shop, id: ContractId) -> Option<&mut StoredContract> {
        self.contracts.get_mut(&id).filter(|c| &c.shop == shop)
    }

    fn link(&mut self, contract_id: ContractId, selections: &[SkuSelection]) -> Vec<SkuMapping> {
        selections
            .iter()
            .map(|selection| {
                self.last_mapping_id += 1;
                SkuMapping {
                    id: self.last_mapping_id,
                    contract_id,
                    sku: selection.sku.clone(),
                    product_id: selection.product_id.clone(),
                    variant_id: selection.variant_id.clone(),
                }
            })
            .collect()
    }

    fn signature_count(&self, contract_id: ContractId) -> i64 {
        self.signatures
            .iter()
            .filter(|s| s.contract_id == contract_id)
            .count() as i64
    }
}

impl StoredContract {
    fn to_contract(&self, id: ContractId) -> Contract {
        Contract {
            id,
            shop: self.shop.clone(),
            name: self.name.clone(),
            content: self.content.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sku_mappings: self.mappings.clone(),
        }
    }
}

#[derive(Default)]
pub struct MemoryContractStore {
    state: RwLock<MemoryState>,
    unavailable: AtomicBool,
    fail_next_replace: AtomicBool,
}

impl MemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the next `replace_contract` fail after it discarded the old
    /// mappings and before it inserted the new ones.
    #[cfg(test)]
    pub fn fail_next_replace(&self) {
        self.fail_next_replace.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    pub async fn record_signature(
        &self,
        contract_id: ContractId,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<i64, StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if !state.contracts.contains_key(&contract_id) {
            return Err(StoreError::TransactionFailed(format!(
                "signature references missing contract {}",
                contract_id
            )));
        }

        // The ledger is append-only, so ids stay dense.
        let id = state.signatures.len() as i64 + 1;
        state.signatures.push(StoredSignature {
            id,
            contract_id,
            customer_name: customer_name.map(str::to_string),
            customer_email: customer_email.map(str::to_string),
            order_id: order_id.map(str::to_string),
            signed_at: Utc::now(),
        });

        Ok(id)
    }
}

#[async_trait]
impl ContractStore for MemoryContractStore {
    async fn list_contracts(&self, shop: &Shop) -> Result<Vec<ContractSummary>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut summaries: Vec<ContractSummary> = state
            .contracts
            .iter()
            .filter(|(_, c)| &c.shop == shop)
            .map(|(id, c)| ContractSummary::new(c.to_contract(*id), state.signature_count(*id)))
            .collect();

        summaries.sort_by(|a, b| {
            b.contract
                .created_at
                .cmp(&a.contract.created_at)
                .then(b.contract.id.cmp(&a.contract.id))
        });

        Ok(summaries)
    }

    async fn find_contract(
        &self,
        shop: &Shop,
        id: ContractId,
    ) -> Result<Option<Contract>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.owned(shop, id).map(|c| c.to_contract(id)))
    }

    async fn insert_contract(
        &self,
        shop: &Shop,
        draft: &NewContract,
    ) -> Result<Contract, StoreError> {
        self.check_available()?;
        let mut live = self.state.write().await;
        let mut working = live.clone();

        working.last_contract_id += 1;
        let id = working.last_contract_id;
        let now = Utc::now();
        let mappings = working.link(id, &draft.mappings);

        let stored = StoredContract {
            shop: shop.clone(),
            name: draft.name.clone(),
            content: draft.content.clone(),
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
            mappings,
        };
        let contract = stored.to_contract(id);
        working.contracts.insert(id, stored);

        *live = working;
        Ok(contract)
    }

    async fn replace_contract(
        &self,
        shop: &Shop,
        id: ContractId,
        changes: &ContractChanges,
    ) -> Result<Option<Contract>, StoreError> {
        self.check_available()?;
        let mut live = self.state.write().await;
        let mut working = live.clone();

        let Some(stored) = working.owned_mut(shop, id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            stored.name = name.clone();
        }
        if let Some(content) = &changes.content {
            stored.content = content.clone();
        }
        if let Some(is_active) = changes.is_active {
            stored.is_active = is_active;
        }
        stored.updated_at = Utc::now();
        stored.mappings.clear();

        if self.fail_next_replace.swap(false, Ordering::SeqCst) {
            return Err(StoreError::TransactionFailed(
                "injected failure after mapping delete".to_string(),
            ));
        }

        let mappings = working.link(id, &changes.mappings);
        let contract = match working.contracts.get_mut(&id) {
            Some(stored) => {
                stored.mappings = mappings;
                stored.to_contract(id)
            }
            None => return Ok(None),
        };

        *live = working;
        Ok(Some(contract))
    }

    async fn delete_contract(
        &self,
        shop: &Shop,
        id: ContractId,
    ) -> Result<DeleteOutcome, StoreError> {
        self.check_available()?;
        let mut live = self.state.write().await;

        if live.owned(shop, id).is_none() {
            return Ok(DeleteOutcome::NotFound);
        }
        if live.signature_count(id) > 0 {
            return Ok(DeleteOutcome::HasSignatures);
        }

        // Mappings live inside the contract entry and go with it.
        live.contracts.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_signatures(
        &self,
        shop: &Shop,
        filter: &SignatureFilter,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut records: Vec<SignatureRecord> = state
            .signatures
            .iter()
            .filter(|s| filter.contract_id.map_or(true, |wanted| s.contract_id == wanted))
            .filter_map(|s| {
                let contract = state.owned(shop, s.contract_id)?;
                Some(SignatureRecord {
                    id: s.id,
                    contract_id: s.contract_id,
                    customer_name: s.customer_name.clone(),
                    customer_email: s.customer_email.clone(),
                    order_id: s.order_id.clone(),
                    signed_at: s.signed_at,
                    contract: ContractRef {
                        id: s.contract_id,
                        name: contract.name.clone(),
                    },
                })
            })
            .collect();

        records.sort_by(|a, b| b.signed_at.cmp(&a.signed_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
