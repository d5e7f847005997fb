//! Main ledger orchestrator: builds, validates and persists transactions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::ledger::audit::{audit_entry_sums, AuditReport};
use crate::ledger::transaction::{build_entries, OpeningBalanceParams, TransactionRequest};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_non_zero_amount, validate_request};

/// A transaction as submitted by a caller, before entries are built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub request: TransactionRequest,
}

/// Main ledger system that turns user actions into persisted, balanced entries
pub struct Ledger<S: LedgerStorage> {
    storage: S,
    config: LedgerConfig,
    validator: Box<dyn TransactionValidator>,
}

impl<S: LedgerStorage> Ledger<S> {
    /// Create a new ledger with the given configuration and storage backend
    pub fn new(config: LedgerConfig, storage: S) -> LedgerResult<Self> {
        Self::with_validator(config, storage, Box::new(DefaultTransactionValidator))
    }

    /// Create a new ledger with a custom validator
    pub fn with_validator(
        config: LedgerConfig,
        storage: S,
        validator: Box<dyn TransactionValidator>,
    ) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            config,
            validator,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Build and check the entry set for a request
    fn prepare_entries(&self, request: &TransactionRequest) -> LedgerResult<Vec<Entry>> {
        if request.base_currency() != self.config.base_currency {
            return Err(LedgerError::Validation(format!(
                "request uses base currency {} but the household reports in {}",
                request.base_currency(),
                self.config.base_currency
            )));
        }
        if !self.config.allow_zero_amounts {
            validate_non_zero_amount(request.amount_cents())?;
        }
        validate_request(request)?;

        let entries = build_entries(request)?;
        self.validator.validate_entries(&entries)?;
        Ok(entries)
    }

    /// Record a new transaction
    pub async fn record_transaction(&mut self, new: NewTransaction) -> LedgerResult<Transaction> {
        let entries = self.prepare_entries(&new.request)?;
        let header =
            TransactionHeader::new(new.date, new.request.kind(), new.description, new.notes);
        self.validator.validate_header(&header)?;

        self.storage.insert_transaction(&header, &entries).await?;
        info!(
            transaction_id = %header.id,
            kind = header.kind.label(),
            entries = entries.len(),
            "recorded transaction"
        );

        Ok(Transaction { header, entries })
    }

    /// Record the opening balance of a newly created account against the
    /// configured equity account. A zero balance records nothing.
    pub async fn create_opening_balance(
        &mut self,
        account_id: &str,
        amount_cents: i64,
        currency: &str,
        date: NaiveDate,
        exchange_rate: Option<ExchangeRate>,
    ) -> LedgerResult<Option<Transaction>> {
        if amount_cents == 0 {
            debug!(account_id, "no opening balance to record");
            return Ok(None);
        }

        let request = TransactionRequest::OpeningBalance(OpeningBalanceParams {
            account_id: account_id.to_string(),
            equity_account_id: self.config.equity_account_id.clone(),
            amount_cents,
            currency: currency.to_string(),
            base_currency: self.config.base_currency.clone(),
            exchange_rate,
        });
        let transaction = self
            .record_transaction(NewTransaction {
                date,
                description: Some(format!("Opening balance: {account_id}")),
                notes: None,
                request,
            })
            .await?;
        Ok(Some(transaction))
    }

    /// Get a transaction by ID
    pub async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        self.storage.get_transaction(transaction_id).await
    }

    /// Get a transaction by ID, returning an error if not found
    pub async fn get_transaction_required(&self, transaction_id: &str) -> LedgerResult<Transaction> {
        self.storage
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))
    }

    /// All transactions that have not been deleted, oldest first
    pub async fn list_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        self.storage.list_transactions(false).await
    }

    /// Edit a transaction: its whole entry set is rebuilt from the new inputs
    /// and swapped in as one unit
    pub async fn update_transaction(
        &mut self,
        transaction_id: &str,
        new: NewTransaction,
    ) -> LedgerResult<Transaction> {
        let existing = self.get_transaction_required(transaction_id).await?;
        if existing.header.is_deleted() {
            return Err(LedgerError::TransactionDeleted(transaction_id.to_string()));
        }

        let entries = self.prepare_entries(&new.request)?;
        let header = TransactionHeader {
            date: new.date,
            description: new.description,
            notes: new.notes,
            kind: new.request.kind(),
            updated_at: chrono::Utc::now().naive_utc(),
            ..existing.header
        };
        self.validator.validate_header(&header)?;

        self.storage.replace_transaction(&header, &entries).await?;
        info!(
            transaction_id = %header.id,
            kind = ?header.kind,
            replaced = existing.entries.len(),
            entries = entries.len(),
            "updated transaction"
        );

        Ok(Transaction { header, entries })
    }

    /// Soft-delete a transaction; deleting twice is a no-op
    pub async fn delete_transaction(&mut self, transaction_id: &str) -> LedgerResult<()> {
        let existing = self.get_transaction_required(transaction_id).await?;
        if existing.header.is_deleted() {
            debug!(transaction_id, "transaction already deleted");
            return Ok(());
        }

        self.storage
            .soft_delete_transaction(transaction_id, chrono::Utc::now().naive_utc())
            .await?;
        info!(transaction_id, "deleted transaction");
        Ok(())
    }

    /// Native balances of an account keyed by currency, over active
    /// transactions. Entries carry the transaction currency, so a card
    /// charged abroad holds more than one.
    pub async fn account_balance(&self, account_id: &str) -> LedgerResult<BTreeMap<String, i64>> {
        let mut totals: BTreeMap<String, i128> = BTreeMap::new();
        for txn in self.list_transactions().await? {
            for entry in txn
                .entries
                .iter()
                .filter(|entry| entry.target.account_id() == Some(account_id))
            {
                *totals.entry(entry.currency.clone()).or_default() += i128::from(entry.amount);
            }
        }
        totals
            .into_iter()
            .map(|(currency, total)| narrow(total).map(|total| (currency, total)))
            .collect()
    }

    /// Balance of an account in the base currency, over active transactions
    pub async fn account_base_balance(&self, account_id: &str) -> LedgerResult<i64> {
        self.sum_active(|entry| match &entry.target {
            Target::Account(id) if id == account_id => Some(entry.base_amount),
            _ => None,
        })
        .await
    }

    /// Total of a category in the base currency, over active transactions.
    /// Expense categories come out positive, income categories negative.
    pub async fn category_total(&self, category_id: &str) -> LedgerResult<i64> {
        self.sum_active(|entry| match &entry.target {
            Target::Category(id) if id == category_id => Some(entry.base_amount),
            _ => None,
        })
        .await
    }

    async fn sum_active<F>(&self, pick: F) -> LedgerResult<i64>
    where
        F: Fn(&Entry) -> Option<i64>,
    {
        let total: i128 = self
            .list_transactions()
            .await?
            .iter()
            .flat_map(|txn| txn.entries.iter())
            .filter_map(|entry| pick(entry))
            .map(i128::from)
            .sum();
        narrow(total)
    }

    /// Check every persisted transaction, deleted ones included, for balance
    pub async fn audit(&self) -> LedgerResult<AuditReport> {
        let rows = self.storage.base_amounts_by_transaction().await?;
        Ok(audit_entry_sums(rows))
    }
}

fn narrow(total: i128) -> LedgerResult<i64> {
    i64::try_from(total)
        .map_err(|_| LedgerError::AmountOverflow(format!("balance {total} exceeds i64")))
}
