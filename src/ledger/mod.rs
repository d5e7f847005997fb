//! Ledger module containing entry construction, balance checks and transaction processing

pub mod audit;
pub mod core;
pub mod transaction;
pub mod validation;

pub use self::core::*;
pub use audit::*;
pub use transaction::*;
pub use validation::*;
