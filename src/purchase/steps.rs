//! Transaction-step descriptors.
//!
//! A step is data, not a closure: an immutable input snapshot taken at
//! preparation time. The executor combines the snapshot with a fresh gas
//! estimate (and, for gated mints, freshly resolved proofs) when the step
//! actually runs, so nothing captured at preparation can go stale.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::claim::adapter::SaleAdapter;
use crate::purchase::cost::CostBreakdown;

/// Step classification. All approvals precede the single terminal mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Approval,
    Mint,
}

/// Immutable input snapshot for one step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StepInput {
    #[serde(rename_all = "camelCase")]
    Approval {
        token: Address,
        spender: Address,
        #[serde(serialize_with = "crate::claim::types::serialize_u256")]
        amount: U256,
    },
    #[serde(rename_all = "camelCase")]
    Mint {
        payer: Address,
        recipient: Address,
        quantity: u32,
        /// Native value the mint transaction carries.
        #[serde(serialize_with = "crate::claim::types::serialize_u256")]
        value: U256,
        /// Allowlist tree to re-resolve proofs from at execution time;
        /// `None` for public sales.
        tree_id: Option<u64>,
    },
}

/// One atomic on-chain transaction required to complete a purchase.
#[derive(Clone, Serialize)]
pub struct TransactionStep {
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    pub kind: StepKind,
    /// Contract the transaction targets.
    pub contract: Address,
    pub network_id: u64,
    pub input: StepInput,
    /// Variant that owns the mint encoding; `None` for approval steps.
    #[serde(skip)]
    pub(crate) adapter: Option<Arc<dyn SaleAdapter>>,
}

impl std::fmt::Debug for TransactionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionStep")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("contract", &self.contract)
            .field("network_id", &self.network_id)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// An executable purchase: cost breakdown plus ordered steps. Produced once
/// per `prepare_purchase` call and consumed at most once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPurchase {
    pub cost: CostBreakdown,
    /// Strictly ordered: approvals first, the terminal mint last.
    pub steps: Vec<TransactionStep>,
    pub is_eligible: bool,
}

/// Caller-controlled headroom applied to fresh gas estimates before
/// submission.
pub trait GasPolicy: Send + Sync {
    fn apply(&self, estimate: u64) -> u64;
}

/// Adds fixed percentage headroom (default 20%).
#[derive(Debug, Clone, Copy)]
pub struct DefaultGasPolicy {
    pub headroom_percent: u64,
}

impl Default for DefaultGasPolicy {
    fn default() -> Self {
        DefaultGasPolicy {
            headroom_percent: 20,
        }
    }
}

impl GasPolicy for DefaultGasPolicy {
    fn apply(&self, estimate: u64) -> u64 {
        estimate.saturating_add(estimate / 100 * self.headroom_percent)
    }
}
