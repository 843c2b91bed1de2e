//! Multi-currency cost aggregation.

use std::collections::HashMap;

use serde::Serialize;

use crate::errors::Result;
use crate::money::{CurrencyId, MoneyValue};

/// The full price of a prepared purchase, broken out by component and by
/// currency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    /// Product cost (unit price × quantity), in the sale's currency.
    pub product: MoneyValue,
    /// Protocol surcharge (per-unit fee × quantity), always native.
    pub platform_fee: MoneyValue,
    /// Total native value the mint transaction must carry.
    pub native_total: MoneyValue,
    /// Per-token totals for token-denominated components.
    pub token_totals: Vec<MoneyValue>,
    /// Aggregate USD estimate; present only when every component carries one.
    pub total_usd: Option<String>,
}

/// Accumulates values keyed by currency identity, merging same-currency
/// amounts exactly.
#[derive(Debug, Default)]
pub struct CurrencyTotals {
    totals: HashMap<CurrencyId, MoneyValue>,
}

impl CurrencyTotals {
    pub fn new() -> Self {
        CurrencyTotals::default()
    }

    /// Merge a value into its currency bucket.
    ///
    /// # Errors
    ///
    /// Propagates the currency-mismatch error if a bucket somehow holds a
    /// value of a different network (buckets are keyed by currency, so this
    /// only fires across networks).
    pub fn add(&mut self, value: MoneyValue) -> Result<()> {
        match self.totals.remove(&value.currency()) {
            Some(existing) => {
                let merged = existing.add(&value)?;
                self.totals.insert(value.currency(), merged);
            }
            None => {
                self.totals.insert(value.currency(), value);
            }
        }
        Ok(())
    }

    pub fn get(&self, currency: &CurrencyId) -> Option<&MoneyValue> {
        self.totals.get(currency)
    }

    /// Non-zero totals in deterministic order: native first, then tokens by
    /// ascending address.
    pub fn into_ordered(self) -> Vec<MoneyValue> {
        let mut values: Vec<MoneyValue> = self
            .totals
            .into_values()
            .filter(MoneyValue::is_positive)
            .collect();
        values.sort_by_key(|v| match v.currency() {
            CurrencyId::Native => (0u8, None),
            CurrencyId::Token(addr) => (1u8, Some(addr)),
        });
        values
    }
}

/// Sum the USD figures of the given values; `None` unless every value
/// carries one.
pub fn aggregate_usd<'a>(values: impl IntoIterator<Item = &'a MoneyValue>) -> Option<String> {
    let mut sum = 0.0f64;
    for value in values {
        sum += value.usd()?.parse::<f64>().ok()?;
    }
    Some(format!("{sum:.2}"))
}
