//! In-memory rate source and helpers for resolving rates before building entries

use async_trait::async_trait;
use bigdecimal::num_traits::One;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::currency;
use crate::ledger::transaction::TransactionRequest;
use crate::traits::*;
use crate::types::*;

/// Significant digits kept when deriving an inverse rate
const INVERSE_PRECISION: u64 = 12;

/// A fixed table of rates, independent of date
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<(String, String), ExchangeRate>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rate: one unit of `from` buys `rate` units of `to`
    pub fn with_rate(mut self, from: &str, to: &str, rate: ExchangeRate) -> Self {
        self.rates.insert((from.to_string(), to.to_string()), rate);
        self
    }

    fn lookup(&self, from: &str, to: &str) -> LedgerResult<Option<ExchangeRate>> {
        if from == to {
            return ExchangeRate::new(BigDecimal::one()).map(Some);
        }
        if let Some(rate) = self.rates.get(&(from.to_string(), to.to_string())) {
            return Ok(Some(rate.clone()));
        }
        match self.rates.get(&(to.to_string(), from.to_string())) {
            Some(inverse) => {
                let rate = (BigDecimal::one() / inverse.value()).with_prec(INVERSE_PRECISION);
                ExchangeRate::new(rate).map(Some)
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RateSource for FixedRates {
    async fn rate(
        &self,
        from: &str,
        to: &str,
        _date: NaiveDate,
    ) -> LedgerResult<Option<ExchangeRate>> {
        self.lookup(from, to)
    }
}

/// Fill in a missing exchange rate on a request from a rate source.
///
/// Only asks for a rate when the request actually needs a conversion; an
/// explicitly supplied rate is never replaced. A transfer between two
/// non-base currencies also gets its received amount from the from→to rate,
/// leaving the from→base rate on the request. Fails with
/// [`LedgerError::MissingExchangeRate`] when the source has no rate either.
pub async fn fill_exchange_rate<R>(
    request: &mut TransactionRequest,
    source: &R,
    date: NaiveDate,
) -> LedgerResult<()>
where
    R: RateSource + ?Sized,
{
    let (slot, from, to) = match request {
        TransactionRequest::Transfer(p) | TransactionRequest::DebtPayment(p)
            if p.crosses_three_currencies() =>
        {
            if p.to_amount_cents.is_none() {
                let rate = required_rate(source, &p.from_currency, &p.to_currency, date).await?;
                p.to_amount_cents = Some(currency::convert(
                    p.amount_cents,
                    &p.from_currency,
                    &p.to_currency,
                    &rate,
                )?);
            }
            (&mut p.exchange_rate, &p.from_currency, &p.base_currency)
        }
        TransactionRequest::Expense(p) => (&mut p.exchange_rate, &p.currency, &p.base_currency),
        TransactionRequest::Income(p) => (&mut p.exchange_rate, &p.currency, &p.base_currency),
        TransactionRequest::OpeningBalance(p) => {
            (&mut p.exchange_rate, &p.currency, &p.base_currency)
        }
        TransactionRequest::Transfer(p) | TransactionRequest::DebtPayment(p) => {
            // The transfer rate converts out of the source currency, towards
            // the destination unless the source already is the base currency
            let to = if p.from_currency != p.to_currency && p.to_amount_cents.is_none() {
                &p.to_currency
            } else {
                &p.base_currency
            };
            (&mut p.exchange_rate, &p.from_currency, to)
        }
    };

    if slot.is_some() || from == to {
        return Ok(());
    }

    *slot = Some(required_rate(source, from, to, date).await?);
    Ok(())
}

async fn required_rate<R>(
    source: &R,
    from: &str,
    to: &str,
    date: NaiveDate,
) -> LedgerResult<ExchangeRate>
where
    R: RateSource + ?Sized,
{
    source
        .rate(from, to, date)
        .await?
        .ok_or_else(|| LedgerError::MissingExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
        })
}
