//! Entry construction for each transaction archetype
//!
//! Every recipe returns a balanced entry set: the base amounts sum to zero
//! exactly. Accounts follow "debit increases" whatever their type, while
//! categories carry the inverse sign (spending grows an expense category
//! positive, income grows an income category negative).

use bigdecimal::RoundingMode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::currency::{self, from_minor_units};
use crate::types::*;

/// Scale used when a transfer's rate has to be derived from its two amounts
const IMPLIED_RATE_SCALE: i64 = 10;

/// Parameters for an expense paid from an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseParams {
    pub category_id: String,
    pub account_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub base_currency: String,
    #[serde(default)]
    pub exchange_rate: Option<ExchangeRate>,
}

/// Parameters for income received into an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeParams {
    pub category_id: String,
    pub account_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub base_currency: String,
    #[serde(default)]
    pub exchange_rate: Option<ExchangeRate>,
}

/// Parameters for moving money between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferParams {
    pub from_account_id: String,
    pub to_account_id: String,
    /// Amount leaving the source account, in `from_currency` minor units
    pub amount_cents: i64,
    pub from_currency: String,
    pub to_currency: String,
    pub base_currency: String,
    /// Rate from `from_currency` to the other side of each conversion.
    /// When neither side is the base currency this is the from→base rate
    /// and `to_amount_cents` must be given.
    #[serde(default)]
    pub exchange_rate: Option<ExchangeRate>,
    /// Amount actually received, when the receiving side reports its own figure
    #[serde(default)]
    pub to_amount_cents: Option<i64>,
}

impl TransferParams {
    /// Source, destination and base are three different currencies, so one
    /// rate cannot serve both the from→to and the from→base conversion
    pub fn crosses_three_currencies(&self) -> bool {
        self.from_currency != self.to_currency
            && self.from_currency != self.base_currency
            && self.to_currency != self.base_currency
    }
}

/// Parameters for the initial balance of a newly created account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningBalanceParams {
    pub account_id: String,
    /// The reserved opening-balances equity account
    pub equity_account_id: String,
    /// Signed as entered; negative for liabilities
    pub amount_cents: i64,
    pub currency: String,
    pub base_currency: String,
    #[serde(default)]
    pub exchange_rate: Option<ExchangeRate>,
}

/// A user-facing action, ready to be turned into entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionRequest {
    Expense(ExpenseParams),
    Income(IncomeParams),
    Transfer(TransferParams),
    /// Paying down a liability; recorded as a transfer into the liability account
    DebtPayment(TransferParams),
    OpeningBalance(OpeningBalanceParams),
}

impl TransactionRequest {
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionRequest::Expense(_) => TransactionKind::Expense,
            TransactionRequest::Income(_) => TransactionKind::Income,
            TransactionRequest::Transfer(_) => TransactionKind::Transfer,
            TransactionRequest::DebtPayment(_) => TransactionKind::DebtPayment,
            TransactionRequest::OpeningBalance(_) => TransactionKind::OpeningBalance,
        }
    }

    /// The household base currency the request was built against
    pub fn base_currency(&self) -> &str {
        match self {
            TransactionRequest::Expense(p) => &p.base_currency,
            TransactionRequest::Income(p) => &p.base_currency,
            TransactionRequest::Transfer(p) | TransactionRequest::DebtPayment(p) => &p.base_currency,
            TransactionRequest::OpeningBalance(p) => &p.base_currency,
        }
    }

    /// The primary amount the user entered
    pub fn amount_cents(&self) -> i64 {
        match self {
            TransactionRequest::Expense(p) => p.amount_cents,
            TransactionRequest::Income(p) => p.amount_cents,
            TransactionRequest::Transfer(p) | TransactionRequest::DebtPayment(p) => p.amount_cents,
            TransactionRequest::OpeningBalance(p) => p.amount_cents,
        }
    }
}

/// Build the entries for any request
pub fn build_entries(request: &TransactionRequest) -> LedgerResult<Vec<Entry>> {
    match request.clone() {
        TransactionRequest::Expense(params) => create_expense_entries(params),
        TransactionRequest::Income(params) => create_income_entries(params),
        TransactionRequest::Transfer(params) | TransactionRequest::DebtPayment(params) => {
            create_transfer_entries(params)
        }
        TransactionRequest::OpeningBalance(params) => create_opening_balance_entries(params),
    }
}

/// Expense: debit the spending category, credit the paying account
pub fn create_expense_entries(params: ExpenseParams) -> LedgerResult<Vec<Entry>> {
    let entries = paired_entries(
        Target::Category(params.category_id),
        Target::Account(params.account_id),
        params.amount_cents,
        params.currency,
        &params.base_currency,
        params.exchange_rate.as_ref(),
    )?;
    debug!(
        kind = ?TransactionKind::Expense,
        currency = %entries[0].currency,
        base_currency = %params.base_currency,
        base_amount = entries[0].base_amount,
        "built expense entries"
    );
    Ok(entries)
}

/// Income: debit the receiving account, credit the income category
pub fn create_income_entries(params: IncomeParams) -> LedgerResult<Vec<Entry>> {
    let entries = paired_entries(
        Target::Account(params.account_id),
        Target::Category(params.category_id),
        params.amount_cents,
        params.currency,
        &params.base_currency,
        params.exchange_rate.as_ref(),
    )?;
    debug!(
        kind = ?TransactionKind::Income,
        currency = %entries[0].currency,
        base_currency = %params.base_currency,
        base_amount = entries[0].base_amount,
        "built income entries"
    );
    Ok(entries)
}

/// Transfer: debit the destination account, credit the source account.
///
/// The destination's base amount is always the negated source base amount,
/// never recomputed from the destination amount, so an independently rounded
/// `to_amount_cents` cannot unbalance the transaction.
pub fn create_transfer_entries(params: TransferParams) -> LedgerResult<Vec<Entry>> {
    if params.crosses_three_currencies() && params.to_amount_cents.is_none() {
        return Err(LedgerError::Validation(format!(
            "transfer from {} to {} with base {} needs the received amount",
            params.from_currency, params.to_currency, params.base_currency
        )));
    }

    let rate = params.exchange_rate.as_ref();
    let source_base = to_base_amount(
        params.amount_cents,
        &params.from_currency,
        &params.base_currency,
        rate,
    )?;

    let to_amount = match params.to_amount_cents {
        Some(amount) => amount,
        None if params.from_currency == params.to_currency => params.amount_cents,
        None => currency::convert(
            params.amount_cents,
            &params.from_currency,
            &params.to_currency,
            require_rate(rate, &params.from_currency, &params.to_currency)?,
        )?,
    };

    // Here the supplied rate is from→base, so the destination gets the
    // from→to rate its two amounts imply
    let destination_rate = if params.to_currency == params.base_currency {
        None
    } else if params.crosses_three_currencies() {
        implied_rate(&params, to_amount).or_else(|| rate.cloned())
    } else {
        match rate {
            Some(rate) => Some(rate.clone()),
            None => Some(implied_rate(&params, to_amount).ok_or_else(|| {
                LedgerError::MissingExchangeRate {
                    from: params.from_currency.clone(),
                    to: params.to_currency.clone(),
                }
            })?),
        }
    };

    let entries = vec![
        Entry {
            target: Target::Account(params.to_account_id),
            amount: to_amount,
            currency: params.to_currency,
            base_amount: source_base,
            exchange_rate: destination_rate,
        },
        Entry {
            target: Target::Account(params.from_account_id),
            amount: negate(params.amount_cents)?,
            exchange_rate: entry_rate(&params.from_currency, &params.base_currency, rate),
            currency: params.from_currency,
            base_amount: negate(source_base)?,
        },
    ];
    debug!(
        kind = ?TransactionKind::Transfer,
        from_currency = %entries[1].currency,
        to_currency = %entries[0].currency,
        base_currency = %params.base_currency,
        base_amount = source_base,
        "built transfer entries"
    );
    Ok(entries)
}

/// Opening balance: the account takes the amount as entered, the equity
/// account absorbs the offset in the base currency
pub fn create_opening_balance_entries(params: OpeningBalanceParams) -> LedgerResult<Vec<Entry>> {
    let rate = params.exchange_rate.as_ref();
    let base_amount = to_base_amount(
        params.amount_cents,
        &params.currency,
        &params.base_currency,
        rate,
    )?;

    let entries = vec![
        Entry {
            target: Target::Account(params.account_id),
            amount: params.amount_cents,
            exchange_rate: entry_rate(&params.currency, &params.base_currency, rate),
            currency: params.currency,
            base_amount,
        },
        Entry {
            target: Target::Account(params.equity_account_id),
            amount: negate(params.amount_cents)?,
            currency: params.base_currency.clone(),
            base_amount: negate(base_amount)?,
            exchange_rate: None,
        },
    ];
    debug!(
        kind = ?TransactionKind::OpeningBalance,
        currency = %entries[0].currency,
        base_currency = %params.base_currency,
        base_amount,
        "built opening balance entries"
    );
    Ok(entries)
}

/// Debit/credit pair in a single currency
fn paired_entries(
    debit: Target,
    credit: Target,
    amount: i64,
    currency: String,
    base_currency: &str,
    rate: Option<&ExchangeRate>,
) -> LedgerResult<Vec<Entry>> {
    let base_amount = to_base_amount(amount, &currency, base_currency, rate)?;
    let exchange_rate = entry_rate(&currency, base_currency, rate);

    Ok(vec![
        Entry {
            target: debit,
            amount,
            currency: currency.clone(),
            base_amount,
            exchange_rate: exchange_rate.clone(),
        },
        Entry {
            target: credit,
            amount: negate(amount)?,
            currency,
            base_amount: negate(base_amount)?,
            exchange_rate,
        },
    ])
}

fn to_base_amount(
    amount: i64,
    currency: &str,
    base_currency: &str,
    rate: Option<&ExchangeRate>,
) -> LedgerResult<i64> {
    if currency == base_currency {
        return Ok(amount);
    }
    let rate = require_rate(rate, currency, base_currency)?;
    currency::convert(amount, currency, base_currency, rate)
}

fn require_rate<'a>(
    rate: Option<&'a ExchangeRate>,
    from: &str,
    to: &str,
) -> LedgerResult<&'a ExchangeRate> {
    rate.ok_or_else(|| LedgerError::MissingExchangeRate {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// The rate recorded on an entry: only when its currency is not the base
fn entry_rate(
    currency: &str,
    base_currency: &str,
    rate: Option<&ExchangeRate>,
) -> Option<ExchangeRate> {
    if currency == base_currency {
        None
    } else {
        rate.cloned()
    }
}

/// from→to rate implied by the magnitudes of the two sides of a transfer;
/// `None` when either side is zero
fn implied_rate(params: &TransferParams, to_amount: i64) -> Option<ExchangeRate> {
    let sent = params.amount_cents.checked_abs().filter(|a| *a != 0)?;
    let received = to_amount.checked_abs().filter(|a| *a != 0)?;
    let ratio = from_minor_units(received, &params.to_currency)
        / from_minor_units(sent, &params.from_currency);
    ExchangeRate::new(ratio.with_scale_round(IMPLIED_RATE_SCALE, RoundingMode::HalfUp)).ok()
}

fn negate(amount: i64) -> LedgerResult<i64> {
    amount
        .checked_neg()
        .ok_or_else(|| LedgerError::AmountOverflow(format!("cannot negate {amount}")))
}
