//! Household ledger configuration

use serde::{Deserialize, Serialize};

use crate::currency::DEFAULT_CURRENCY;
use crate::types::*;

/// Settings threaded explicitly into every ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// The household's reporting currency
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// The reserved opening-balances equity account
    pub equity_account_id: String,
    /// Accept transactions whose amount is zero
    #[serde(default)]
    pub allow_zero_amounts: bool,
}

fn default_base_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl LedgerConfig {
    pub fn new(base_currency: impl Into<String>, equity_account_id: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into(),
            equity_account_id: equity_account_id.into(),
            allow_zero_amounts: false,
        }
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.base_currency.trim().is_empty() {
            return Err(LedgerError::Config(
                "base currency cannot be empty".to_string(),
            ));
        }
        if self.equity_account_id.trim().is_empty() {
            return Err(LedgerError::Config(
                "equity account id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_defaults() {
        let config = LedgerConfig::from_json(r#"{"equity_account_id": "equity"}"#).unwrap();
        assert_eq!(config.base_currency, "SGD");
        assert_eq!(config.equity_account_id, "equity");
        assert!(!config.allow_zero_amounts);
    }

    #[test]
    fn test_from_json_rejects_blank_fields() {
        let err = LedgerConfig::from_json(r#"{"base_currency": "", "equity_account_id": "e"}"#)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));

        let err = LedgerConfig::from_json(r#"{"base_currency": "USD"}"#).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
