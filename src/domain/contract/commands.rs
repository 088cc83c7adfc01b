use serde::Deserialize;
use std::collections::HashSet;

use super::errors::ContractError;
use super::value_objects::SkuSelection;

// ============================================================================
// Contract Commands - Request payloads
// ============================================================================
//
// Payloads arrive loosely typed (every field optional) and are turned into
// their validated forms before anything touches the store.
//
// ============================================================================

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateContract {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub skus: Option<Vec<SkuSelection>>,
}

/// Absent scalar fields keep their stored value. Absent `skus` clears the
/// contract's links, exactly like an empty list.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContract {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub skus: Option<Vec<SkuSelection>>,
}

/// Validated input for inserting a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContract {
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub mappings: Vec<SkuSelection>,
}

/// Validated input for an update: scalar changes plus the complete new
/// mapping set.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractChanges {
    pub name: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
    pub mappings: Vec<SkuSelection>,
}

impl CreateContract {
    pub fn validate(self) -> Result<NewContract, ContractError> {
        let name = self.name.filter(|n| !n.trim().is_empty());
        let content = self.content.filter(|c| !c.trim().is_empty());

        let (Some(name), Some(content)) = (name, content) else {
            return Err(ContractError::Validation(
                "Name and content are required".to_string(),
            ));
        };

        let mappings = self.skus.unwrap_or_default();
        validate_selections(&mappings)?;

        Ok(NewContract {
            name,
            content,
            is_active: true,
            mappings,
        })
    }
}

impl UpdateContract {
    pub fn validate(self) -> Result<ContractChanges, ContractError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(ContractError::Validation("Name cannot be empty".to_string()));
        }
        if matches!(&self.content, Some(c) if c.trim().is_empty()) {
            return Err(ContractError::Validation("Content cannot be empty".to_string()));
        }

        let mappings = self.skus.unwrap_or_default();
        validate_selections(&mappings)?;

        Ok(ContractChanges {
            name: self.name,
            content: self.content,
            is_active: self.is_active,
            mappings,
        })
    }
}

/// A variant may be linked at most once per contract.
fn validate_selections(selections: &[SkuSelection]) -> Result<(), ContractError> {
    let mut seen = HashSet::with_capacity(selections.len());

    for (index, selection) in selections.iter().enumerate() {
        if selection.variant_id.trim().is_empty() {
            return Err(ContractError::Validation(format!(
                "SKU entry {} is missing a variantId",
                index
            )));
        }
        if selection.product_id.trim().is_empty() {
            return Err(ContractError::Validation(format!(
                "SKU entry {} is missing a productId",
                index
            )));
        }
        if !seen.insert(selection.variant_id.as_str()) {
            return Err(ContractError::Validation(format!(
                "Variant {} is linked more than once",
                selection.variant_id
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
