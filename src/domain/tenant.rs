use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Tenant Identity
// ============================================================================

/// The merchant a request acts on behalf of, e.g. `acme.myshopify.com`.
///
/// Every store query takes a `&Shop`, so an unscoped query cannot be written.
/// Handlers only ever receive one from an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shop(String);

impl Shop {
    pub fn new(domain: impl Into<String>) -> Self {
        Self(domain.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Shop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_serializes_as_plain_string() {
        let shop = Shop::new("acme.myshopify.com");
        let json = serde_json::to_string(&shop).unwrap();
        assert_eq!(json, "\"acme.myshopify.com\"");
        assert_eq!(shop.to_string(), "acme.myshopify.com");
    }

    #[test]
    fn test_shops_compare_by_domain() {
        assert_eq!(Shop::new("a.myshopify.com"), Shop::new("a.myshopify.com"));
        assert_ne!(Shop::new("a.myshopify.com"), Shop::new("b.myshopify.com"));
    }
}
