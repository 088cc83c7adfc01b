// ============================================================================
// Domain Layer - Contracts, SKU links and signatures
// ============================================================================
//
// Each area has its own subdirectory with:
// - Value objects
// - Commands (request payloads and their validated forms)
// - Errors
// - The tenant-scoped entry point (repository / ledger)
//
// Persistence lives behind the `ContractStore` trait in crate::store.
//
// ============================================================================

pub mod tenant;
pub mod contract;
pub mod signature;

pub use tenant::Shop;
