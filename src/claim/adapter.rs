//! Dynamic dispatch across sale variants.
//!
//! Every variant implements the same fixed capability interface and owns its
//! own on-chain encoding knowledge (mint calldata, event parsing). Call
//! sites never branch on variant tags.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::chain::reader::ChainReader;
use crate::chain::types::LogEntry;
use crate::claim::edition::EditionSale;
use crate::claim::types::OnchainClaim;
use crate::errors::{Error, Result};
use crate::purchase::cost::CostBreakdown;
use crate::purchase::order::Order;

/// Everything the terminal mint call needs, resolved at call time.
#[derive(Debug, Clone)]
pub struct MintInput {
    pub quantity: u32,
    /// Allowlist mint indices, one per unit; empty for public sales.
    pub mint_indices: Vec<u32>,
    /// Sibling paths matching `mint_indices` one-to-one.
    pub merkle_proofs: Vec<Vec<B256>>,
    pub recipient: Address,
}

/// Static identity and fee schedule shared by all variants.
#[derive(Debug, Clone)]
pub struct SaleConfig {
    pub network_id: u64,
    /// Claim-extension contract the purchase transacts with.
    pub extension: Address,
    /// Creator collection the extension mints into.
    pub creator_contract: Address,
    pub instance_id: u64,
    /// Per-unit protocol surcharge for public mints, in wei.
    pub mint_fee: U256,
    /// Per-unit protocol surcharge for allowlist-gated mints, in wei.
    pub mint_fee_gated: U256,
}

impl SaleConfig {
    /// Default protocol fee schedule (gated mints carry the higher rate).
    pub fn new(
        network_id: u64,
        extension: Address,
        creator_contract: Address,
        instance_id: u64,
    ) -> Self {
        SaleConfig {
            network_id,
            extension,
            creator_contract,
            instance_id,
            mint_fee: U256::from(500_000_000_000_000u64), // 0.0005
            mint_fee_gated: U256::from(690_000_000_000_000u64), // 0.00069
        }
    }
}

/// Fixed interface implemented by every sale variant.
#[async_trait]
pub trait SaleAdapter: Send + Sync {
    fn network_id(&self) -> u64;
    fn extension_address(&self) -> Address;
    fn creator_contract(&self) -> Address;
    fn instance_id(&self) -> u64;

    /// Read the current sale configuration from chain state.
    async fn fetch_onchain_data(&self, reader: &dyn ChainReader) -> Result<OnchainClaim>;

    /// Units `wallet` has already minted for this instance.
    async fn wallet_minted(&self, reader: &dyn ChainReader, wallet: Address) -> Result<u32>;

    /// Per-unit protocol surcharge in wei; gated mints pay a distinct rate.
    fn platform_fee(&self, allowlist_gated: bool) -> U256;

    /// Encode the mint calldata for this variant.
    fn encode_mint(&self, input: &MintInput) -> Result<Bytes>;

    /// Derive the order from the mint receipt's event logs.
    fn parse_order(
        &self,
        recipient: Address,
        cost: CostBreakdown,
        logs: &[LogEntry],
    ) -> Result<Order>;
}

impl std::fmt::Debug for dyn SaleAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn SaleAdapter")
    }
}

/// Construct the adapter for a contract-variant tag.
///
/// # Errors
///
/// `UnsupportedType` for tags this build does not recognize.
pub fn sale_adapter(kind: &str, config: SaleConfig) -> Result<Arc<dyn SaleAdapter>> {
    match kind {
        "edition" | "erc721-claim" => Ok(Arc::new(EditionSale::new(config))),
        other => Err(Error::unsupported(format!(
            "unrecognized sale variant '{other}'"
        ))
        .with_instance(config.instance_id)),
    }
}
