//! Currency metadata, minor-unit conversion and formatting
//!
//! Amounts travel through the engine as integer minor units ("cents"). How
//! many minor units make up one major unit depends on the currency: two
//! decimal places for most, none for currencies such as JPY or KRW.
//!
//! Cross-currency conversion is computed exactly in [`BigDecimal`] and then
//! rounded half away from zero, so converting `-x` always yields the negation
//! of converting `x`.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::num_traits::ToPrimitive;
use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Display and precision metadata for a currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: String,
    pub symbol: String,
    pub name: String,
    /// Number of minor-unit decimal places
    pub decimals: u32,
}

struct KnownCurrency {
    code: &'static str,
    symbol: &'static str,
    name: &'static str,
    decimals: u32,
}

const fn known(
    code: &'static str,
    symbol: &'static str,
    name: &'static str,
    decimals: u32,
) -> KnownCurrency {
    KnownCurrency {
        code,
        symbol,
        name,
        decimals,
    }
}

const COMMON_CURRENCIES: &[KnownCurrency] = &[
    known("SGD", "S$", "Singapore Dollar", 2),
    known("USD", "$", "US Dollar", 2),
    known("EUR", "€", "Euro", 2),
    known("GBP", "£", "British Pound", 2),
    known("JPY", "¥", "Japanese Yen", 0),
    known("MYR", "RM", "Malaysian Ringgit", 2),
    known("CNY", "¥", "Chinese Yuan", 2),
    known("HKD", "HK$", "Hong Kong Dollar", 2),
    known("THB", "฿", "Thai Baht", 2),
    known("AUD", "A$", "Australian Dollar", 2),
    known("KRW", "₩", "South Korean Won", 0),
    known("INR", "₹", "Indian Rupee", 2),
    known("IDR", "Rp", "Indonesian Rupiah", 0),
    known("TWD", "NT$", "Taiwan Dollar", 2),
    known("PHP", "₱", "Philippine Peso", 2),
    known("VND", "₫", "Vietnamese Dong", 0),
    known("CAD", "C$", "Canadian Dollar", 2),
    known("CHF", "CHF", "Swiss Franc", 2),
    known("NZD", "NZ$", "New Zealand Dollar", 2),
    known("AED", "AED", "UAE Dirham", 2),
];

/// Currency used when a household has not chosen one
pub const DEFAULT_CURRENCY: &str = "SGD";

const FALLBACK_DECIMALS: u32 = 2;

/// Look up a currency; unknown codes get two decimals and the code as symbol
pub fn currency_config(code: &str) -> CurrencyConfig {
    match COMMON_CURRENCIES.iter().find(|c| c.code == code) {
        Some(c) => CurrencyConfig {
            code: c.code.to_string(),
            symbol: c.symbol.to_string(),
            name: c.name.to_string(),
            decimals: c.decimals,
        },
        None => CurrencyConfig {
            code: code.to_string(),
            symbol: code.to_string(),
            name: code.to_string(),
            decimals: FALLBACK_DECIMALS,
        },
    }
}

/// All currencies with built-in metadata
pub fn common_currencies() -> Vec<CurrencyConfig> {
    COMMON_CURRENCIES
        .iter()
        .map(|c| currency_config(c.code))
        .collect()
}

pub fn currency_symbol(code: &str) -> String {
    currency_config(code).symbol
}

/// Number of minor-unit decimal places for a currency
pub fn decimal_places(code: &str) -> u32 {
    COMMON_CURRENCIES
        .iter()
        .find(|c| c.code == code)
        .map_or(FALLBACK_DECIMALS, |c| c.decimals)
}

fn pow10(exp: u32) -> BigDecimal {
    BigDecimal::from(BigInt::from(10).pow(exp))
}

fn round_to_minor(value: BigDecimal, context: impl FnOnce() -> String) -> LedgerResult<i64> {
    value
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| LedgerError::AmountOverflow(context()))
}

/// Parse a user-entered major-unit amount ("50.99") into minor units.
///
/// Parsing is exact; digits beyond the currency's precision are rounded half
/// away from zero ("3000.5" JPY becomes 3001).
pub fn to_minor_units(major: &str, code: &str) -> LedgerResult<i64> {
    let trimmed = major.trim();
    let value = BigDecimal::from_str(trimmed)
        .map_err(|e| LedgerError::InvalidAmount(format!("cannot parse '{trimmed}': {e}")))?;
    round_to_minor(value * pow10(decimal_places(code)), || {
        format!("{trimmed} {code} does not fit in minor units")
    })
}

/// Minor units expressed as a major-unit decimal (5099 SGD cents is 50.99)
pub fn from_minor_units(amount: i64, code: &str) -> BigDecimal {
    BigDecimal::new(BigInt::from(amount), i64::from(decimal_places(code)))
}

/// Convert minor units of one currency into minor units of another.
///
/// `rate` is the number of `to` major units per `from` major unit. It is not
/// consulted when both currencies are the same.
pub fn convert(amount: i64, from: &str, to: &str, rate: &ExchangeRate) -> LedgerResult<i64> {
    if from == to {
        return Ok(amount);
    }
    let converted = from_minor_units(amount, from) * rate.value() * pow10(decimal_places(to));
    round_to_minor(converted, || {
        format!("{amount} {from} at rate {rate} overflows {to}")
    })
}

/// Options for [`format_money`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Prefix positive amounts with "+"
    pub show_sign: bool,
    /// Abbreviate amounts of 1,000 or more as "1.5K" / "1.0M"
    pub compact: bool,
}

/// Format minor units with symbol and thousands separators: `S$1,234.56`
pub fn format_money(amount: i64, code: &str, options: FormatOptions) -> String {
    let config = currency_config(code);
    let abs = u128::from(amount.unsigned_abs());
    let unit = 10u128.pow(config.decimals);

    let body = if options.compact && abs >= 1_000 * unit {
        if abs >= 1_000_000 * unit {
            format!("{}M", tenths(abs, 1_000_000 * unit))
        } else {
            format!("{}K", tenths(abs, 1_000 * unit))
        }
    } else {
        plain_amount(abs, config.decimals)
    };

    let sign = match amount.signum() {
        -1 => "-",
        1 if options.show_sign => "+",
        _ => "",
    };

    format!("{sign}{}{body}", config.symbol)
}

/// Format the absolute value without a symbol: `50.00`
pub fn format_amount(amount: i64, code: &str) -> String {
    plain_amount(u128::from(amount.unsigned_abs()), decimal_places(code))
}

fn plain_amount(abs: u128, decimals: u32) -> String {
    let unit = 10u128.pow(decimals);
    let whole = group_thousands(abs / unit);
    if decimals == 0 {
        whole
    } else {
        format!(
            "{whole}.{:0width$}",
            abs % unit,
            width = decimals as usize
        )
    }
}

/// `value / divisor` to one decimal place, halves rounded up
fn tenths(value: u128, divisor: u128) -> String {
    let scaled = (value * 10 + divisor / 2) / divisor;
    format!("{}.{}", scaled / 10, scaled % 10)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(value: &str) -> ExchangeRate {
        value.parse().unwrap()
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places("SGD"), 2);
        assert_eq!(decimal_places("USD"), 2);
        assert_eq!(decimal_places("JPY"), 0);
        assert_eq!(decimal_places("KRW"), 0);
        assert_eq!(decimal_places("VND"), 0);
        assert_eq!(decimal_places("XYZ"), 2);
    }

    #[test]
    fn test_currency_config_fallback() {
        let sgd = currency_config("SGD");
        assert_eq!(sgd.symbol, "S$");
        assert_eq!(sgd.decimals, 2);

        let unknown = currency_config("XYZ");
        assert_eq!(unknown.symbol, "XYZ");
        assert_eq!(unknown.name, "XYZ");
        assert_eq!(unknown.decimals, 2);

        assert_eq!(currency_symbol("MYR"), "RM");
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(common_currencies().len(), 20);
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units("50", "SGD").unwrap(), 5000);
        assert_eq!(to_minor_units("50.99", "SGD").unwrap(), 5099);
        assert_eq!(to_minor_units("0.01", "SGD").unwrap(), 1);
        assert_eq!(to_minor_units("19.99", "SGD").unwrap(), 1999);
        assert_eq!(to_minor_units("3000", "JPY").unwrap(), 3000);
        assert_eq!(to_minor_units("3000.5", "JPY").unwrap(), 3001);
        assert_eq!(to_minor_units("-3000.5", "JPY").unwrap(), -3001);
        assert_eq!(to_minor_units(" 0 ", "SGD").unwrap(), 0);
        assert!(matches!(
            to_minor_units("abc", "SGD"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(to_minor_units("", "SGD").is_err());
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(from_minor_units(5099, "SGD"), BigDecimal::from_str("50.99").unwrap());
        assert_eq!(from_minor_units(3000, "JPY"), BigDecimal::from(3000));
    }

    #[test]
    fn test_convert_same_currency_ignores_rate() {
        assert_eq!(convert(5000, "SGD", "SGD", &rate("3.5")).unwrap(), 5000);
    }

    #[test]
    fn test_convert_across_decimal_places() {
        assert_eq!(convert(10000, "SGD", "USD", &rate("0.74")).unwrap(), 7400);
        assert_eq!(convert(135000, "SGD", "USD", &rate("0.74")).unwrap(), 99900);
        // 3000 JPY at 0.01 is S$30.00
        assert_eq!(convert(3000, "JPY", "SGD", &rate("0.01")).unwrap(), 3000);
        // S$30.00 at 100 is 3000 JPY
        assert_eq!(convert(3000, "SGD", "JPY", &rate("100")).unwrap(), 3000);
    }

    #[test]
    fn test_convert_rounds_half_away_from_zero() {
        // 1 JPY at 0.005 is half a cent
        assert_eq!(convert(1, "JPY", "SGD", &rate("0.005")).unwrap(), 1);
        assert_eq!(convert(-1, "JPY", "SGD", &rate("0.005")).unwrap(), -1);
        // 0.4 of a cent rounds down
        assert_eq!(convert(1, "JPY", "SGD", &rate("0.004")).unwrap(), 0);
        // 0.125 USD -> 12.5 cents
        assert_eq!(convert(25, "SGD", "USD", &rate("0.5")).unwrap(), 13);
        assert_eq!(convert(-25, "SGD", "USD", &rate("0.5")).unwrap(), -13);
        // 1.5 yen from 1 cent at 150
        assert_eq!(convert(1, "USD", "JPY", &rate("150")).unwrap(), 2);
    }

    #[test]
    fn test_convert_overflow() {
        let err = convert(i64::MAX, "JPY", "SGD", &rate("1000")).unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow(_)));
    }

    #[test]
    fn test_format_money() {
        let plain = FormatOptions::default();
        assert_eq!(format_money(5000, "SGD", plain), "S$50.00");
        assert_eq!(format_money(123456, "SGD", plain), "S$1,234.56");
        assert_eq!(format_money(3000, "JPY", plain), "¥3,000");
        assert_eq!(format_money(-5000, "SGD", plain), "-S$50.00");
        assert_eq!(format_money(10000, "USD", plain), "$100.00");
        assert_eq!(format_money(10050, "MYR", plain), "RM100.50");
        assert_eq!(format_money(5, "SGD", plain), "S$0.05");
    }

    #[test]
    fn test_format_money_sign_and_compact() {
        let signed = FormatOptions {
            show_sign: true,
            ..Default::default()
        };
        assert_eq!(format_money(5000, "SGD", signed), "+S$50.00");
        assert_eq!(format_money(-5000, "SGD", signed), "-S$50.00");
        assert_eq!(format_money(0, "SGD", signed), "S$0.00");

        let compact = FormatOptions {
            compact: true,
            ..Default::default()
        };
        assert_eq!(format_money(100000000, "SGD", compact), "S$1.0M");
        assert_eq!(format_money(150000, "SGD", compact), "S$1.5K");
        assert_eq!(format_money(99999, "SGD", compact), "S$999.99");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(5000, "SGD"), "50.00");
        assert_eq!(format_amount(-5000, "SGD"), "50.00");
        assert_eq!(format_amount(1234567, "JPY"), "1,234,567");
        assert_eq!(format_amount(i64::MIN, "JPY"), "9,223,372,036,854,775,808");
    }
}
