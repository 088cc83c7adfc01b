use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::domain::contract::ContractId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractRef {
    pub id: ContractId,
    pub name: String,
}

/// A customer's acceptance of a contract, joined with the contract's name.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub id: i64,
    pub contract_id: ContractId,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub order_id: Option<String>,
    pub signed_at: DateTime<Utc>,
    pub contract: ContractRef,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureFilter {
    #[serde(default)]
    pub contract_id: Option<ContractId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_all_contracts() {
        let filter: SignatureFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, SignatureFilter::default());

        let filter: SignatureFilter = serde_json::from_str(r#"{"contractId": 4}"#).unwrap();
        assert_eq!(filter.contract_id, Some(4));
    }

    #[test]
    fn test_record_serializes_contract_reference() {
        let record = SignatureRecord {
            id: 1,
            contract_id: 9,
            customer_name: None,
            customer_email: Some("a@example.com".to_string()),
            order_id: Some("#1001".to_string()),
            signed_at: Utc::now(),
            contract: ContractRef {
                id: 9,
                name: "Waiver".to_string(),
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["contractId"], 9);
        assert_eq!(value["contract"]["name"], "Waiver");
        assert!(value["customerName"].is_null());
    }
}
