//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Store entries as-is, bypassing validation; lets tests plant corrupt rows
    pub fn insert_unchecked(&self, header: TransactionHeader, entries: Vec<Entry>) -> LedgerResult<()> {
        self.write()?
            .insert(header.id.clone(), Transaction { header, entries });
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, HashMap<String, Transaction>>> {
        self.transactions
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, HashMap<String, Transaction>>> {
        self.transactions
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn insert_transaction(
        &mut self,
        header: &TransactionHeader,
        entries: &[Entry],
    ) -> LedgerResult<()> {
        let mut transactions = self.write()?;
        if transactions.contains_key(&header.id) {
            return Err(LedgerError::Storage(format!(
                "transaction {} already exists",
                header.id
            )));
        }
        transactions.insert(
            header.id.clone(),
            Transaction {
                header: header.clone(),
                entries: entries.to_vec(),
            },
        );
        Ok(())
    }

    async fn replace_transaction(
        &mut self,
        header: &TransactionHeader,
        entries: &[Entry],
    ) -> LedgerResult<()> {
        let mut transactions = self.write()?;
        match transactions.get_mut(&header.id) {
            Some(existing) => {
                existing.header = header.clone();
                existing.entries = entries.to_vec();
                Ok(())
            }
            None => Err(LedgerError::TransactionNotFound(header.id.clone())),
        }
    }

    async fn soft_delete_transaction(
        &mut self,
        transaction_id: &str,
        deleted_at: NaiveDateTime,
    ) -> LedgerResult<()> {
        let mut transactions = self.write()?;
        match transactions.get_mut(transaction_id) {
            Some(existing) => {
                existing.header.deleted_at = Some(deleted_at);
                existing.header.updated_at = deleted_at;
                Ok(())
            }
            None => Err(LedgerError::TransactionNotFound(transaction_id.to_string())),
        }
    }

    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        Ok(self.read()?.get(transaction_id).cloned())
    }

    async fn list_transactions(&self, include_deleted: bool) -> LedgerResult<Vec<Transaction>> {
        let mut listed: Vec<Transaction> = self
            .read()?
            .values()
            .filter(|txn| include_deleted || !txn.header.is_deleted())
            .cloned()
            .collect();
        listed.sort_by(|a, b| {
            (a.header.date, a.header.created_at, &a.header.id).cmp(&(
                b.header.date,
                b.header.created_at,
                &b.header.id,
            ))
        });
        Ok(listed)
    }

    async fn base_amounts_by_transaction(&self) -> LedgerResult<Vec<(String, i64)>> {
        Ok(self
            .read()?
            .values()
            .flat_map(|txn| {
                txn.entries
                    .iter()
                    .map(|entry| (txn.header.id.clone(), entry.base_amount))
            })
            .collect())
    }
}
