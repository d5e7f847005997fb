//! Traits for the engine's collaborators: storage, rates and validation rules

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::ledger::validation::validate_entries;
use crate::types::*;

/// Storage abstraction for transactions and their entries
///
/// Implementations must write a transaction's entries all-or-nothing: the
/// balance invariant must never be observable in a half-written state.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Persist a new transaction together with its entries
    async fn insert_transaction(
        &mut self,
        header: &TransactionHeader,
        entries: &[Entry],
    ) -> LedgerResult<()>;

    /// Replace a transaction's header and its entire entry set
    async fn replace_transaction(
        &mut self,
        header: &TransactionHeader,
        entries: &[Entry],
    ) -> LedgerResult<()>;

    /// Mark a transaction deleted; its entries stay for history but no
    /// longer count towards balances
    async fn soft_delete_transaction(
        &mut self,
        transaction_id: &str,
        deleted_at: NaiveDateTime,
    ) -> LedgerResult<()>;

    /// Get a transaction by ID, deleted or not
    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>>;

    /// List transactions ordered by date, optionally including deleted ones
    async fn list_transactions(&self, include_deleted: bool) -> LedgerResult<Vec<Transaction>>;

    /// Every persisted `(transaction_id, base_amount)` pair, for auditing
    async fn base_amounts_by_transaction(&self) -> LedgerResult<Vec<(String, i64)>>;
}

/// Source of exchange rates, consulted by callers before building entries
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Units of `to` per unit of `from` on `date`, if known
    async fn rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> LedgerResult<Option<ExchangeRate>>;
}

/// Trait for implementing custom transaction validation rules
pub trait TransactionValidator: Send + Sync {
    /// Validate a transaction header before saving
    fn validate_header(&self, header: &TransactionHeader) -> LedgerResult<()>;

    /// Validate the entry set before saving
    fn validate_entries(&self, entries: &[Entry]) -> LedgerResult<()>;
}

/// Default validator: the balance rules only
pub struct DefaultTransactionValidator;

impl TransactionValidator for DefaultTransactionValidator {
    fn validate_header(&self, _header: &TransactionHeader) -> LedgerResult<()> {
        Ok(())
    }

    fn validate_entries(&self, entries: &[Entry]) -> LedgerResult<()> {
        validate_entries(entries).into_result(entries.len())?;
        Ok(())
    }
}
