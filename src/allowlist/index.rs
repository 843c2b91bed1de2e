//! Allowlist index service: committed entry sets plus per-wallet slot status.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;

use crate::allowlist::merkle::AllowlistEntry;
use crate::chain::types::parse_address;
use crate::errors::{Error, Result};
use crate::http::HttpClient;
use crate::money::{CurrencyId, MoneyValue};

/// One mint slot a wallet holds on an allowlist, with its on-chain
/// claimed/unclaimed status.
#[derive(Debug, Clone)]
pub struct WalletSlot {
    /// Position of the entry within the committed set; submitted on-chain as
    /// the mint index.
    pub index: u32,
    pub entry: AllowlistEntry,
    pub claimed: bool,
}

/// Index service capability contract.
#[async_trait]
pub trait AllowlistIndex: Send + Sync {
    /// The full committed entry set for a tree. Required to rebuild the tree
    /// deterministically.
    async fn entries(&self, tree_id: u64) -> Result<Vec<AllowlistEntry>>;

    /// The slots a wallet holds on a tree, with claimed status.
    async fn wallet_slots(&self, tree_id: u64, address: Address) -> Result<Vec<WalletSlot>>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceResponse {
    amount: String,
    decimals: u8,
    symbol: String,
    token: Option<String>,
    network_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryResponse {
    address: String,
    max_quantity: Option<u32>,
    price: Option<PriceResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotResponse {
    index: u32,
    claimed: bool,
    #[serde(flatten)]
    entry: EntryResponse,
}

fn convert_price(price: PriceResponse) -> Result<MoneyValue> {
    let amount = U256::from_str_radix(&price.amount, 10)
        .map_err(|e| Error::api("invalid price amount from index", e.to_string()))?;
    let currency = match price.token {
        Some(token) => CurrencyId::Token(parse_address(&token)?),
        None => CurrencyId::Native,
    };
    Ok(MoneyValue::from_raw(
        amount,
        price.decimals,
        currency,
        price.symbol,
        price.network_id,
    ))
}

fn convert_entry(entry: EntryResponse) -> Result<AllowlistEntry> {
    Ok(AllowlistEntry {
        address: parse_address(&entry.address)?,
        max_quantity: entry.max_quantity,
        price: entry.price.map(convert_price).transpose()?,
    })
}

/// Index service backed by an HTTP API:
/// `GET {base}/trees/{id}/entries` and `GET {base}/trees/{id}/wallets/{addr}`.
#[derive(Debug, Clone)]
pub struct HttpAllowlistIndex {
    http: HttpClient,
}

impl HttpAllowlistIndex {
    pub fn new(http: HttpClient) -> Self {
        HttpAllowlistIndex { http }
    }
}

#[async_trait]
impl AllowlistIndex for HttpAllowlistIndex {
    async fn entries(&self, tree_id: u64) -> Result<Vec<AllowlistEntry>> {
        let raw: Vec<EntryResponse> = self
            .http
            .get_json(&format!("/trees/{tree_id}/entries"))
            .await?;
        raw.into_iter().map(convert_entry).collect()
    }

    async fn wallet_slots(&self, tree_id: u64, address: Address) -> Result<Vec<WalletSlot>> {
        let raw: Vec<SlotResponse> = self
            .http
            .get_json(&format!("/trees/{tree_id}/wallets/{address}"))
            .await?;
        raw.into_iter()
            .map(|slot| {
                Ok(WalletSlot {
                    index: slot.index,
                    claimed: slot.claimed,
                    entry: convert_entry(slot.entry)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_conversion_normalizes_addresses() {
        let entry = convert_entry(EntryResponse {
            address: "0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
            max_quantity: Some(3),
            price: None,
        })
        .unwrap();
        assert_eq!(entry.max_quantity, Some(3));
        assert_eq!(
            entry.address,
            parse_address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap()
        );
    }

    #[test]
    fn price_conversion_builds_token_money() {
        let price = convert_price(PriceResponse {
            amount: "2500000".to_string(),
            decimals: 6,
            symbol: "USDC".to_string(),
            token: Some("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string()),
            network_id: 1,
        })
        .unwrap();
        assert_eq!(price.amount(), U256::from(2_500_000u64));
        assert!(!price.currency().is_native());
    }

    #[test]
    fn malformed_price_amount_is_an_api_error() {
        let err = convert_price(PriceResponse {
            amount: "not-a-number".to_string(),
            decimals: 6,
            symbol: "USDC".to_string(),
            token: None,
            network_id: 1,
        })
        .unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ApiError);
    }
}
