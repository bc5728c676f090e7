//! Utility modules

pub mod memory_ledger;
pub mod memory_rows;
pub mod validation;

pub use memory_ledger::*;
pub use memory_rows::*;
pub use validation::*;
