use std::sync::Arc;

use crate::domain::Shop;
use crate::store::{ContractStore, StoreError};

use super::value_objects::{SignatureFilter, SignatureRecord};

// ============================================================================
// Signature Ledger
// ============================================================================
//
// Signatures are written by the checkout extension; this side only reads.
//
// ============================================================================

#[derive(Clone)]
pub struct SignatureLedger {
    store: Arc<dyn ContractStore>,
}

impl SignatureLedger {
    pub fn new(store: Arc<dyn ContractStore>) -> Self {
        Self { store }
    }

    pub fn for_shop<'a>(&'a self, shop: &'a Shop) -> ShopSignatures<'a> {
        ShopSignatures {
            store: self.store.as_ref(),
            shop,
        }
    }
}

pub struct ShopSignatures<'a> {
    store: &'a dyn ContractStore,
    shop: &'a Shop,
}

impl ShopSignatures<'_> {
    pub async fn list(&self, filter: &SignatureFilter) -> Result<Vec<SignatureRecord>, StoreError> {
        let signatures = self.store.list_signatures(self.shop, filter).await?;

        tracing::debug!(
            shop = %self.shop,
            contract_id = ?filter.contract_id,
            count = signatures.len(),
            "Listed signatures"
        );

        Ok(signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{ContractRepository, CreateContract};
    use crate::store::MemoryContractStore;

    async fn seeded() -> (Arc<MemoryContractStore>, i64, i64) {
        let store = Arc::new(MemoryContractStore::new());
        let repository = ContractRepository::new(store.clone());
        let shop = Shop::new("acme.myshopify.com");
        let contracts = repository.for_shop(&shop);

        let first = contracts
            .create(CreateContract {
                name: Some("Rental".to_string()),
                content: Some("Return it".to_string()),
                skus: None,
            })
            .await
            .unwrap();
        let second = contracts
            .create(CreateContract {
                name: Some("Waiver".to_string()),
                content: Some("At your own risk".to_string()),
                skus: None,
            })
            .await
            .unwrap();

        store
            .record_signature(first.id, Some("Ada"), Some("ada@example.com"), Some("#1001"))
            .await
            .unwrap();
        store
            .record_signature(second.id, Some("Grace"), None, Some("#1002"))
            .await
            .unwrap();
        store
            .record_signature(first.id, None, None, None)
            .await
            .unwrap();

        (store, first.id, second.id)
    }

    #[tokio::test]
    async fn test_lists_newest_signature_first() {
        let (store, first, second) = seeded().await;
        let ledger = SignatureLedger::new(store);
        let shop = Shop::new("acme.myshopify.com");

        let all = ledger.for_shop(&shop).list(&SignatureFilter::default()).await.unwrap();
        let contracts: Vec<_> = all.iter().map(|s| s.contract_id).collect();
        assert_eq!(contracts, vec![first, second, first]);
        assert_eq!(all[1].contract.name, "Waiver");
    }

    #[tokio::test]
    async fn test_filters_by_contract() {
        let (store, first, _) = seeded().await;
        let ledger = SignatureLedger::new(store);
        let shop = Shop::new("acme.myshopify.com");

        let filtered = ledger
            .for_shop(&shop)
            .list(&SignatureFilter { contract_id: Some(first) })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|s| s.contract.name == "Rental"));
    }

    #[tokio::test]
    async fn test_other_shop_sees_nothing() {
        let (store, first, _) = seeded().await;
        let ledger = SignatureLedger::new(store);
        let intruder = Shop::new("other.myshopify.com");

        let all = ledger.for_shop(&intruder).list(&SignatureFilter::default()).await.unwrap();
        assert!(all.is_empty());

        let targeted = ledger
            .for_shop(&intruder)
            .list(&SignatureFilter { contract_id: Some(first) })
            .await
            .unwrap();
        assert!(targeted.is_empty());
    }
}
