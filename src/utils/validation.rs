//! Validation utilities

use crate::ledger::transaction::TransactionRequest;
use crate::traits::*;
use crate::types::*;

/// Validate that an amount is not zero
pub fn validate_non_zero_amount(amount: i64) -> LedgerResult<()> {
    if amount == 0 {
        Err(LedgerError::InvalidAmount(
            "Amount cannot be zero".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an account or category ID is valid
pub fn validate_target_id(id: &str) -> LedgerResult<()> {
    if id.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account or category ID cannot be empty".to_string(),
        ));
    }

    if id.len() > 64 {
        return Err(LedgerError::Validation(
            "Account or category ID cannot exceed 64 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Account or category ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate an ISO-style currency code: three ASCII uppercase letters
pub fn validate_currency_code(code: &str) -> LedgerResult<()> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "Invalid currency code '{code}'"
        )))
    }
}

/// Validate that a transaction description is valid
pub fn validate_transaction_description(description: &str) -> LedgerResult<()> {
    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Transaction description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Check the identifiers and currencies a request refers to
pub fn validate_request(request: &TransactionRequest) -> LedgerResult<()> {
    let (ids, currencies): (Vec<&str>, Vec<&str>) = match request {
        TransactionRequest::Expense(p) => (
            vec![p.category_id.as_str(), p.account_id.as_str()],
            vec![p.currency.as_str(), p.base_currency.as_str()],
        ),
        TransactionRequest::Income(p) => (
            vec![p.category_id.as_str(), p.account_id.as_str()],
            vec![p.currency.as_str(), p.base_currency.as_str()],
        ),
        TransactionRequest::Transfer(p) | TransactionRequest::DebtPayment(p) => {
            if p.from_account_id == p.to_account_id {
                return Err(LedgerError::Validation(
                    "Source and destination accounts must differ".to_string(),
                ));
            }
            (
                vec![p.from_account_id.as_str(), p.to_account_id.as_str()],
                vec![p.from_currency.as_str(), p.to_currency.as_str(), p.base_currency.as_str()],
            )
        }
        TransactionRequest::OpeningBalance(p) => (
            vec![p.account_id.as_str(), p.equity_account_id.as_str()],
            vec![p.currency.as_str(), p.base_currency.as_str()],
        ),
    };

    for id in ids {
        validate_target_id(id)?;
    }
    for code in currencies {
        validate_currency_code(code)?;
    }
    Ok(())
}

/// Enhanced transaction validator with detailed checks
pub struct EnhancedTransactionValidator;

impl TransactionValidator for EnhancedTransactionValidator {
    fn validate_header(&self, header: &TransactionHeader) -> LedgerResult<()> {
        if let Some(description) = &header.description {
            validate_transaction_description(description)?;
        }
        Ok(())
    }

    fn validate_entries(&self, entries: &[Entry]) -> LedgerResult<()> {
        // Basic validation
        DefaultTransactionValidator.validate_entries(entries)?;

        for entry in entries {
            validate_currency_code(&entry.currency)?;
            match &entry.target {
                Target::Account(id) | Target::Category(id) => validate_target_id(id)?,
            }
        }

        Ok(())
    }
}
