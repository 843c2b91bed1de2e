//! The completed-purchase record.

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::purchase::cost::CostBreakdown;

/// One token delivered by the mint, derived from its event logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAllocation {
    pub contract: Address,
    #[serde(serialize_with = "crate::claim::types::serialize_u256")]
    pub token_id: U256,
    pub quantity: u64,
}

/// Result of a completed purchase. Never persisted by the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub recipient: Address,
    /// Total cost paid, as prepared.
    pub cost: CostBreakdown,
    pub allocations: Vec<TokenAllocation>,
}
