// ============================================================================
// Signature Ledger - read-only view over signatures captured at checkout
// ============================================================================

pub mod value_objects;
pub mod ledger;

pub use value_objects::*;
pub use ledger::*;
