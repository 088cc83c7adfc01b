// ============================================================================
// Contract Domain
// ============================================================================
//
// - Value objects (Contract, SkuMapping, SkuSelection)
// - Commands (CreateContract, UpdateContract and their validated forms)
// - Errors (ContractError)
// - Repository (tenant-scoped lifecycle + mapping-set replacement)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod repository;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use repository::*;
