//! Core types and data structures for the ledger engine

use bigdecimal::num_traits::Zero;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Account types for balance-sheet accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Assets - what the household owns (checking, savings, property, etc.)
    Asset,
    /// Liabilities - what the household owes (credit cards, mortgages, loans)
    Liability,
    /// Equity - the reserved opening balances account
    Equity,
}

impl AccountType {
    /// Returns the balance as it should be shown to a user.
    ///
    /// Entries always follow "debit increases" for every account, so a credit
    /// card with money owed carries a negative ledger balance. Liabilities and
    /// equity are flipped here so that "more owed" reads as a positive figure.
    pub fn display_balance(&self, balance: i64) -> i64 {
        match self {
            AccountType::Asset => balance,
            AccountType::Liability | AccountType::Equity => balance.saturating_neg(),
        }
    }
}

/// Finer-grained account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSubType {
    Checking,
    Savings,
    Investment,
    Property,
    Cash,
    OtherAsset,
    CreditCard,
    Mortgage,
    StudentLoan,
    PersonalLoan,
    OtherLiability,
    OpeningBalances,
}

impl AccountSubType {
    /// The account type this sub type belongs to
    pub fn account_type(&self) -> AccountType {
        match self {
            AccountSubType::Checking
            | AccountSubType::Savings
            | AccountSubType::Investment
            | AccountSubType::Property
            | AccountSubType::Cash
            | AccountSubType::OtherAsset => AccountType::Asset,
            AccountSubType::CreditCard
            | AccountSubType::Mortgage
            | AccountSubType::StudentLoan
            | AccountSubType::PersonalLoan
            | AccountSubType::OtherLiability => AccountType::Liability,
            AccountSubType::OpeningBalances => AccountType::Equity,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AccountSubType::Checking => "Checking Account",
            AccountSubType::Savings => "Savings Account",
            AccountSubType::Investment => "Investment",
            AccountSubType::Property => "Property",
            AccountSubType::Cash => "Cash",
            AccountSubType::OtherAsset => "Other Asset",
            AccountSubType::CreditCard => "Credit Card",
            AccountSubType::Mortgage => "Mortgage",
            AccountSubType::StudentLoan => "Student Loan",
            AccountSubType::PersonalLoan => "Personal Loan",
            AccountSubType::OtherLiability => "Other Liability",
            AccountSubType::OpeningBalances => "Opening Balances",
        }
    }
}

/// The user-facing kind of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
    DebtPayment,
    OpeningBalance,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Income => "Income",
            TransactionKind::Transfer => "Transfer",
            TransactionKind::DebtPayment => "Debt Payment",
            TransactionKind::OpeningBalance => "Opening Balance",
        }
    }
}

/// A strictly positive exchange rate.
///
/// Stored as an exact decimal so that rates such as `0.74` never pick up
/// binary floating point error on their way into a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeRate(BigDecimal);

impl ExchangeRate {
    /// Create a rate, rejecting zero and negative values
    pub fn new(value: BigDecimal) -> LedgerResult<Self> {
        if value <= BigDecimal::zero() {
            return Err(LedgerError::InvalidExchangeRate(format!(
                "exchange rate must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Create a rate from a float using its shortest decimal representation
    pub fn from_f64(value: f64) -> LedgerResult<Self> {
        if !value.is_finite() {
            return Err(LedgerError::InvalidExchangeRate(format!(
                "exchange rate must be finite, got {value}"
            )));
        }
        value.to_string().parse()
    }

    pub fn value(&self) -> &BigDecimal {
        &self.0
    }

    pub fn into_inner(self) -> BigDecimal {
        self.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ExchangeRate {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigDecimal::from_str(s.trim()).map_err(|e| {
            LedgerError::InvalidExchangeRate(format!("cannot parse exchange rate '{s}': {e}"))
        })?;
        Self::new(value)
    }
}

impl Serialize for ExchangeRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for ExchangeRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(f64),
        }

        let parsed = match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse(),
            Repr::Number(number) => ExchangeRate::from_f64(number),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// What a ledger entry is posted against: an account or a category, never both
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Target {
    Account(String),
    Category(String),
}

impl Target {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Target::Account(id) => Some(id),
            Target::Category(_) => None,
        }
    }

    pub fn category_id(&self) -> Option<&str> {
        match self {
            Target::Account(_) => None,
            Target::Category(id) => Some(id),
        }
    }
}

/// One signed line of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Account or category this line is posted against
    pub target: Target,
    /// Minor units of `currency`; positive = debit, negative = credit
    pub amount: i64,
    /// Currency code the amount is denominated in
    pub currency: String,
    /// Minor units of the household base currency
    pub base_amount: i64,
    /// Rate used to restate `amount` in the base currency, when they differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<ExchangeRate>,
}

/// Flat form of an entry as it is stored or received from outside the engine.
///
/// Unlike [`Entry`] this can represent malformed rows (both or neither target
/// set), which is exactly what the balance validator has to catch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub base_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<ExchangeRate>,
}

impl EntryRecord {
    /// True when exactly one of account or category is set
    pub fn has_single_target(&self) -> bool {
        let has_account = self.account_id.as_deref().is_some_and(|id| !id.is_empty());
        let has_category = self.category_id.as_deref().is_some_and(|id| !id.is_empty());
        has_account != has_category
    }
}

impl From<Entry> for EntryRecord {
    fn from(entry: Entry) -> Self {
        let (account_id, category_id) = match entry.target {
            Target::Account(id) => (Some(id), None),
            Target::Category(id) => (None, Some(id)),
        };
        Self {
            account_id,
            category_id,
            amount: entry.amount,
            currency: entry.currency,
            base_amount: entry.base_amount,
            exchange_rate: entry.exchange_rate,
        }
    }
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        entry.clone().into()
    }
}

impl TryFrom<EntryRecord> for Entry {
    type Error = LedgerError;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        let account_id = record.account_id.filter(|id| !id.is_empty());
        let category_id = record.category_id.filter(|id| !id.is_empty());
        let target = match (account_id, category_id) {
            (Some(id), None) => Target::Account(id),
            (None, Some(id)) => Target::Category(id),
            _ => {
                return Err(LedgerError::InvalidEntry(
                    "Each entry must have exactly one of account_id or category_id".to_string(),
                ))
            }
        };
        Ok(Self {
            target,
            amount: record.amount,
            currency: record.currency,
            base_amount: record.base_amount,
            exchange_rate: record.exchange_rate,
        })
    }
}

/// Transaction header; the entries are stored alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Unique identifier for the transaction
    pub id: String,
    /// Date when the transaction occurred
    pub date: NaiveDate,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Which construction recipe produced the entries
    pub kind: TransactionKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Set when the transaction is soft-deleted
    pub deleted_at: Option<NaiveDateTime>,
}

impl TransactionHeader {
    /// Create a new header with a fresh id
    pub fn new(
        date: NaiveDate,
        kind: TransactionKind,
        description: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            description,
            notes,
            kind,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A transaction header together with its entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub entries: Vec<Entry>,
}

/// Outcome of checking an entry set for balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub valid: bool,
    /// Sum of base amounts, computed even when the check fails
    pub sum: i128,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Which rule failed, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<BalanceViolation>,
}

/// The rule an entry set broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceViolation {
    /// Fewer than two entries
    TooFewEntries,
    /// An entry with both or neither of account and category
    TargetMismatch,
    /// Base amounts do not sum to zero
    NonZeroSum,
}

impl BalanceCheck {
    /// Convert into a `Result`, for callers that want to propagate with `?`
    pub fn into_result(self, entry_count: usize) -> LedgerResult<i128> {
        match self.violation {
            None => Ok(self.sum),
            Some(BalanceViolation::TooFewEntries) => {
                Err(LedgerError::InsufficientEntries(entry_count))
            }
            Some(BalanceViolation::TargetMismatch) => Err(LedgerError::InvalidEntry(
                self.error.unwrap_or_default(),
            )),
            Some(BalanceViolation::NonZeroSum) => Err(LedgerError::Unbalanced { sum: self.sum }),
        }
    }
}

/// Errors that can occur in the ledger engine
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
    #[error("Transaction must have at least 2 entries, got {0}")]
    InsufficientEntries(usize),
    #[error("Entries do not sum to zero (sum = {sum})")]
    Unbalanced { sum: i128 },
    #[error("Exchange rate required to convert {from} to {to}")]
    MissingExchangeRate { from: String, to: String },
    #[error("Invalid exchange rate: {0}")]
    InvalidExchangeRate(String),
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Transaction has been deleted: {0}")]
    TransactionDeleted(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_rate_rejects_non_positive() {
        assert!(matches!(
            "0".parse::<ExchangeRate>(),
            Err(LedgerError::InvalidExchangeRate(_))
        ));
        assert!(matches!(
            "-1.35".parse::<ExchangeRate>(),
            Err(LedgerError::InvalidExchangeRate(_))
        ));
        assert!(ExchangeRate::from_f64(f64::NAN).is_err());
        assert!("abc".parse::<ExchangeRate>().is_err());
    }

    #[test]
    fn test_exchange_rate_from_float_is_exact() {
        let rate = ExchangeRate::from_f64(0.74).unwrap();
        assert_eq!(rate, "0.74".parse::<ExchangeRate>().unwrap());
        assert_eq!(rate.to_string(), "0.74");
    }

    #[test]
    fn test_exchange_rate_serde() {
        let rate: ExchangeRate = serde_json::from_str("0.01").unwrap();
        assert_eq!(rate, "0.01".parse().unwrap());
        let rate: ExchangeRate = serde_json::from_str("\"1.35\"").unwrap();
        assert_eq!(serde_json::to_string(&rate).unwrap(), "\"1.35\"");
        assert!(serde_json::from_str::<ExchangeRate>("-2").is_err());
    }

    #[test]
    fn test_entry_record_round_trip_through_target() {
        let entry = Entry {
            target: Target::Category("groceries".to_string()),
            amount: 5000,
            currency: "SGD".to_string(),
            base_amount: 5000,
            exchange_rate: None,
        };
        let record = EntryRecord::from(&entry);
        assert_eq!(record.category_id.as_deref(), Some("groceries"));
        assert!(record.account_id.is_none());
        assert_eq!(Entry::try_from(record).unwrap(), entry);
    }

    #[test]
    fn test_entry_record_rejects_both_targets() {
        let record = EntryRecord {
            account_id: Some("a".to_string()),
            category_id: Some("c".to_string()),
            amount: 100,
            currency: "SGD".to_string(),
            base_amount: 100,
            exchange_rate: None,
        };
        let err = Entry::try_from(record).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_entry_record_omits_absent_fields() {
        let record = EntryRecord {
            account_id: Some("checking".to_string()),
            category_id: None,
            amount: -5000,
            currency: "SGD".to_string(),
            base_amount: -5000,
            exchange_rate: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("category_id").is_none());
        assert!(json.get("exchange_rate").is_none());
    }

    #[test]
    fn test_display_balance_flips_liabilities() {
        assert_eq!(AccountType::Asset.display_balance(500), 500);
        assert_eq!(AccountType::Liability.display_balance(-200000), 200000);
        assert_eq!(
            AccountSubType::CreditCard.account_type(),
            AccountType::Liability
        );
        assert_eq!(
            AccountSubType::OpeningBalances.account_type(),
            AccountType::Equity
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(AccountSubType::CreditCard.label(), "Credit Card");
        assert_eq!(AccountSubType::OpeningBalances.label(), "Opening Balances");
        assert_eq!(TransactionKind::DebtPayment.label(), "Debt Payment");
        assert_eq!(TransactionKind::OpeningBalance.label(), "Opening Balance");
    }
}
