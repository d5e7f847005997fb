//! Utility modules

pub mod memory_storage;
pub mod rates;
pub mod validation;

pub use memory_storage::*;
pub use rates::*;
pub use validation::*;
