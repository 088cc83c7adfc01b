use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::domain::Shop;

// ============================================================================
// Contract Value Objects
// ============================================================================

pub type ContractId = i64;

/// One product variant a caller wants linked to a contract.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkuSelection {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub variant_id: String,
}

/// A persisted link between a contract and a product variant.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkuMapping {
    pub id: i64,
    pub contract_id: ContractId,
    pub sku: String,
    pub product_id: String,
    pub variant_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub shop: Shop,
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sku_mappings: Vec<SkuMapping>,
}

/// Row of the contract list: the contract plus its link and signature counts.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    #[serde(flatten)]
    pub contract: Contract,
    pub mapping_count: usize,
    pub signature_count: i64,
}

impl ContractSummary {
    pub fn new(contract: Contract, signature_count: i64) -> Self {
        Self {
            mapping_count: contract.sku_mappings.len(),
            contract,
            signature_count,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
