//! On-chain sale configuration and status derivation.

use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

use crate::money::CurrencyId;

/// The on-chain record describing one sale instance: price, supply caps,
/// time window, and allowlist commitment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnchainClaim {
    /// Units minted so far.
    pub total: u32,
    /// Supply cap; `None` means open edition.
    pub total_max: Option<u32>,
    /// Per-wallet cap; `None` means uncapped.
    pub wallet_max: Option<u32>,
    /// Sale opens at this unix timestamp; `None` means already open.
    pub start_date: Option<u64>,
    /// Sale closes at this unix timestamp; `None` means no deadline.
    pub end_date: Option<u64>,
    /// Per-unit product cost in the currency's smallest unit.
    #[serde(serialize_with = "crate::claim::types::serialize_u256")]
    pub cost: U256,
    /// Payment token; `None` means the chain's native currency.
    pub erc20: Option<Address>,
    /// Allowlist commitment; zero or absent means a public sale.
    pub merkle_root: Option<B256>,
    /// Identifier for the committed allowlist in the index service.
    pub tree_id: Option<u64>,
}

pub(crate) fn serialize_u256<S: serde::Serializer>(
    value: &U256,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

/// Sale lifecycle state derived from the claim record and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaleStatus {
    Upcoming,
    Active,
    Ended,
    SoldOut,
}

impl OnchainClaim {
    pub fn currency(&self) -> CurrencyId {
        match self.erc20 {
            Some(token) => CurrencyId::Token(token),
            None => CurrencyId::Native,
        }
    }

    /// True when minting requires a merkle membership proof.
    pub fn is_allowlist_gated(&self) -> bool {
        self.merkle_root.is_some_and(|root| root != B256::ZERO)
    }

    /// Units still available under the supply cap; `None` when open.
    pub fn remaining_supply(&self) -> Option<u32> {
        self.total_max.map(|max| max.saturating_sub(self.total))
    }

    /// Derive the sale status at `now` (unix seconds). The time window is
    /// checked before supply so a closed sale reports `Ended` rather than
    /// `SoldOut`.
    pub fn status(&self, now: u64) -> SaleStatus {
        if self.start_date.is_some_and(|start| now < start) {
            return SaleStatus::Upcoming;
        }
        if self.end_date.is_some_and(|end| now >= end) {
            return SaleStatus::Ended;
        }
        if self.remaining_supply() == Some(0) {
            return SaleStatus::SoldOut;
        }
        SaleStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> OnchainClaim {
        OnchainClaim {
            total: 0,
            total_max: Some(100),
            wallet_max: Some(5),
            start_date: Some(1_000),
            end_date: Some(2_000),
            cost: U256::from(1u64),
            erc20: None,
            merkle_root: None,
            tree_id: None,
        }
    }

    #[test]
    fn status_follows_time_window() {
        let c = claim();
        assert_eq!(c.status(500), SaleStatus::Upcoming);
        assert_eq!(c.status(1_000), SaleStatus::Active);
        assert_eq!(c.status(1_999), SaleStatus::Active);
        assert_eq!(c.status(2_000), SaleStatus::Ended);
    }

    #[test]
    fn exhausted_supply_is_sold_out() {
        let mut c = claim();
        c.total = 100;
        assert_eq!(c.status(1_500), SaleStatus::SoldOut);
        // closed window wins over supply
        assert_eq!(c.status(2_500), SaleStatus::Ended);
    }

    #[test]
    fn open_edition_never_sells_out() {
        let mut c = claim();
        c.total_max = None;
        c.total = u32::MAX;
        assert_eq!(c.status(1_500), SaleStatus::Active);
        assert_eq!(c.remaining_supply(), None);
    }

    #[test]
    fn zero_root_is_not_gated() {
        let mut c = claim();
        assert!(!c.is_allowlist_gated());
        c.merkle_root = Some(B256::ZERO);
        assert!(!c.is_allowlist_gated());
        c.merkle_root = Some(B256::repeat_byte(1));
        assert!(c.is_allowlist_gated());
    }
}
