//! # Household Ledger
//!
//! A multi-currency double-entry ledger engine for household finance tracking.
//!
//! ## Features
//!
//! - **Balanced entries**: Expenses, income, transfers, debt payments and opening
//!   balances each become a set of entries whose base-currency amounts sum to zero
//! - **Multi-currency**: Integer minor-unit amounts with per-currency decimal places
//!   and half-away-from-zero conversion into the household base currency
//! - **Balance validation**: Structured check results that callers can surface directly
//! - **Auditing**: Detection of persisted transactions whose entries do not balance
//! - **Storage abstraction**: Database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use household_ledger::{ExpenseParams, Target};
//! use household_ledger::ledger::transaction::create_expense_entries;
//!
//! let entries = create_expense_entries(ExpenseParams {
//!     category_id: "groceries".to_string(),
//!     account_id: "checking".to_string(),
//!     amount_cents: 5000,
//!     currency: "SGD".to_string(),
//!     base_currency: "SGD".to_string(),
//!     exchange_rate: None,
//! })
//! .unwrap();
//!
//! assert_eq!(entries[0].target, Target::Category("groceries".to_string()));
//! assert_eq!(entries.iter().map(|e| e.base_amount).sum::<i64>(), 0);
//! ```

pub mod config;
pub mod currency;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use ledger::*;
pub use traits::*;
pub use types::*;
