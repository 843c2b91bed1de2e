//! Immutable currency-amount type with exact integer arithmetic.
//!
//! A [`MoneyValue`] carries an amount in the currency's smallest unit, the
//! currency identity (native sentinel or token address), and an optional
//! cached USD estimate as a 2-decimal string. Arithmetic between two values
//! is only defined when their currency identity and network match; every
//! operation returns a new instance.

use std::cmp::Ordering;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::warn;

use crate::chain::reader::ChainReader;
use crate::errors::{Error, Result};
use crate::usd::UsdRateSource;

/// Currency identity: the chain's native currency or an ERC-20 token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CurrencyId {
    Native,
    Token(Address),
}

impl CurrencyId {
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, CurrencyId::Native)
    }

    /// Token address, when token-denominated.
    #[must_use]
    pub fn token(&self) -> Option<Address> {
        match self {
            CurrencyId::Native => None,
            CurrencyId::Token(addr) => Some(*addr),
        }
    }
}

impl std::fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurrencyId::Native => f.write_str("native"),
            CurrencyId::Token(addr) => write!(f, "{addr}"),
        }
    }
}

/// Native-currency symbol for well-known networks.
fn native_symbol(network_id: u64) -> &'static str {
    match network_id {
        137 | 80002 => "POL",
        _ => "ETH",
    }
}

/// An amount of one currency on one network. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyValue {
    #[serde(serialize_with = "serialize_u256_decimal")]
    amount: U256,
    decimals: u8,
    currency: CurrencyId,
    symbol: String,
    usd: Option<String>,
    network_id: u64,
}

fn serialize_u256_decimal<S: serde::Serializer>(
    value: &U256,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

impl MoneyValue {
    /// Resolve a value's currency metadata (and optionally a USD estimate)
    /// and construct it.
    ///
    /// Native values resolve decimals/symbol locally; token values read
    /// symbol and decimals through `reader`. The USD lookup is best-effort:
    /// a failing rate source logs a warning and leaves the estimate unset.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when a token currency is given without a reader to
    /// resolve its metadata; otherwise whatever the metadata read returns.
    pub async fn create(
        amount: U256,
        network_id: u64,
        currency: CurrencyId,
        reader: Option<&dyn ChainReader>,
        usd_source: Option<&dyn UsdRateSource>,
    ) -> Result<MoneyValue> {
        let (decimals, symbol) = match currency {
            CurrencyId::Native => (18, native_symbol(network_id).to_string()),
            CurrencyId::Token(token) => {
                let reader = reader.ok_or_else(|| {
                    Error::invalid_input("token currency requires a chain connection")
                        .with_address(token.to_string())
                })?;
                let meta = reader.erc20_metadata(token).await?;
                (meta.decimals, meta.symbol)
            }
        };

        let mut value = MoneyValue::from_raw(amount, decimals, currency, symbol, network_id);
        if let Some(source) = usd_source {
            match source.rate(network_id, currency).await {
                Ok(rate) => value.usd = format_usd(amount, decimals, rate),
                Err(err) => warn!(%currency, network_id, %err, "usd rate lookup failed"),
            }
        }
        Ok(value)
    }

    /// Construct from already-resolved currency metadata.
    #[must_use]
    pub fn from_raw(
        amount: U256,
        decimals: u8,
        currency: CurrencyId,
        symbol: impl Into<String>,
        network_id: u64,
    ) -> MoneyValue {
        MoneyValue {
            amount,
            decimals,
            currency,
            symbol: symbol.into(),
            usd: None,
            network_id,
        }
    }

    /// Zero of the native currency on `network_id`.
    #[must_use]
    pub fn native_zero(network_id: u64) -> MoneyValue {
        MoneyValue::from_raw(
            U256::ZERO,
            18,
            CurrencyId::Native,
            native_symbol(network_id),
            network_id,
        )
    }

    /// A zero value in the same currency as `self`.
    #[must_use]
    pub fn zero_like(&self) -> MoneyValue {
        let mut v = self.clone();
        v.amount = U256::ZERO;
        v.usd = self.usd.as_ref().map(|_| "0.00".to_string());
        v
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn currency(&self) -> CurrencyId {
        self.currency
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Cached USD estimate, rounded to two decimal places.
    pub fn usd(&self) -> Option<&str> {
        self.usd.as_deref()
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.amount.is_zero()
    }

    #[cfg(test)]
    pub(crate) fn test_with_usd(mut self, usd: &str) -> MoneyValue {
        self.usd = Some(usd.to_string());
        self
    }

    fn check_same_currency(&self, other: &MoneyValue) -> Result<()> {
        if self.currency != other.currency || self.network_id != other.network_id {
            return Err(Error::currency_mismatch(
                format!("{} ({})", self.currency, self.network_id),
                format!("{} ({})", other.currency, other.network_id),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Currency mismatch, or amount overflow.
    pub fn add(&self, other: &MoneyValue) -> Result<MoneyValue> {
        self.check_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| Error::invalid_input("amount overflow in add"))?;
        let usd = combine_usd(&self.usd, &other.usd, |a, b| a + b);
        Ok(MoneyValue { amount, usd, ..self.clone() })
    }

    /// # Errors
    ///
    /// Currency mismatch, or a result that would be negative.
    pub fn subtract(&self, other: &MoneyValue) -> Result<MoneyValue> {
        self.check_same_currency(other)?;
        if other.amount > self.amount {
            return Err(Error::invalid_input("subtraction result would be negative"));
        }
        let usd = combine_usd(&self.usd, &other.usd, |a, b| (a - b).max(0.0));
        Ok(MoneyValue {
            amount: self.amount - other.amount,
            usd,
            ..self.clone()
        })
    }

    /// Scale by a non-negative decimal factor. The factor is applied at
    /// micro precision (six fractional digits), truncating toward zero.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for negative or non-finite factors, or on overflow.
    pub fn multiply(&self, factor: f64) -> Result<MoneyValue> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(Error::invalid_input("multiply factor must be a non-negative number"));
        }
        const MICRO: u64 = 1_000_000;
        let numer = (factor * MICRO as f64).round() as u128;
        let amount = self
            .amount
            .checked_mul(U256::from(numer))
            .ok_or_else(|| Error::invalid_input("amount overflow in multiply"))?
            / U256::from(MICRO);
        let usd = scale_usd(&self.usd, |v| v * factor);
        Ok(MoneyValue { amount, usd, ..self.clone() })
    }

    /// Exact multiplication by an integer count.
    ///
    /// # Errors
    ///
    /// `InvalidInput` on overflow.
    pub fn multiply_int(&self, count: u64) -> Result<MoneyValue> {
        let amount = self
            .amount
            .checked_mul(U256::from(count))
            .ok_or_else(|| Error::invalid_input("amount overflow in multiply_int"))?;
        let usd = scale_usd(&self.usd, |v| v * count as f64);
        Ok(MoneyValue { amount, usd, ..self.clone() })
    }

    /// Integer division, truncating toward zero.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the divisor is zero.
    pub fn divide_int(&self, divisor: u64) -> Result<MoneyValue> {
        if divisor == 0 {
            return Err(Error::invalid_input("divisor must be a positive integer"));
        }
        let usd = scale_usd(&self.usd, |v| v / divisor as f64);
        Ok(MoneyValue {
            amount: self.amount / U256::from(divisor),
            usd,
            ..self.clone()
        })
    }

    /// # Errors
    ///
    /// Currency mismatch.
    pub fn compare_to(&self, other: &MoneyValue) -> Result<Ordering> {
        self.check_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// # Errors
    ///
    /// Currency mismatch.
    pub fn is_less_than(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare_to(other)? == Ordering::Less)
    }

    /// # Errors
    ///
    /// Currency mismatch.
    pub fn is_greater_than(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare_to(other)? == Ordering::Greater)
    }

    /// # Errors
    ///
    /// Currency mismatch.
    pub fn is_equal_to(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare_to(other)? == Ordering::Equal)
    }
}

impl std::fmt::Display for MoneyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} (raw)", self.amount, self.symbol)
    }
}

/// Format an amount as a USD string, rounded to two decimal places.
fn format_usd(amount: U256, decimals: u8, rate: f64) -> Option<String> {
    if !rate.is_finite() || rate < 0.0 {
        return None;
    }
    let raw: f64 = amount.to_string().parse().ok()?;
    let units = raw / 10f64.powi(i32::from(decimals));
    Some(format!("{:.2}", units * rate))
}

fn parse_usd(usd: &str) -> Option<f64> {
    usd.parse::<f64>().ok()
}

/// Combine the USD figures of two operands; absent on either side means
/// absent in the result.
fn combine_usd(a: &Option<String>, b: &Option<String>, op: impl Fn(f64, f64) -> f64) -> Option<String> {
    let (a, b) = (parse_usd(a.as_deref()?)?, parse_usd(b.as_deref()?)?);
    Some(format!("{:.2}", op(a, b)))
}

fn scale_usd(usd: &Option<String>, op: impl Fn(f64) -> f64) -> Option<String> {
    let v = parse_usd(usd.as_deref()?)?;
    Some(format!("{:.2}", op(v).max(0.0)))
}
