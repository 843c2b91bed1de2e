//! Read/query capability contract for a single chain endpoint.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::chain::types::{LogEntry, TokenMetadata, TransactionRequest};
use crate::claim::types::OnchainClaim;
use crate::errors::Result;

/// One read-capable connection to a chain.
///
/// Implementations wrap whatever transport the application uses (JSON-RPC
/// provider, archive gateway, test double). All reads the engine performs go
/// through this trait so the [`ReadEndpointRouter`](crate::chain::router::ReadEndpointRouter)
/// can fall back across endpoints.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Chain identity reported by the endpoint itself. Used by the router to
    /// reject misconfigured endpoints.
    async fn chain_id(&self) -> Result<u64>;

    /// Read the sale configuration record for one claim instance.
    async fn read_claim(
        &self,
        extension: Address,
        creator_contract: Address,
        instance_id: u64,
    ) -> Result<OnchainClaim>;

    /// Number of units a wallet has already minted for one claim instance.
    async fn wallet_minted(
        &self,
        extension: Address,
        creator_contract: Address,
        instance_id: u64,
        wallet: Address,
    ) -> Result<u32>;

    /// ERC-20 symbol and decimals.
    async fn erc20_metadata(&self, token: Address) -> Result<TokenMetadata>;

    /// ERC-20 balance of `owner`.
    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256>;

    /// ERC-20 spending allowance granted by `owner` to `spender`.
    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256>;

    /// Native-currency balance of `owner`.
    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// Gas estimate for a prospective call. Estimates go stale as state
    /// drifts; callers re-estimate at execution time.
    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64>;

    /// Event logs emitted by a landed transaction.
    async fn transaction_logs(&self, tx_hash: B256) -> Result<Vec<LogEntry>>;
}

impl std::fmt::Debug for dyn ChainReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ChainReader")
    }
}
