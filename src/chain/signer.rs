//! Write capability contract. The engine never signs directly; a
//! caller-supplied implementation owns key material and submission.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::chain::types::{Receipt, TransactionRequest};
use crate::errors::Result;

/// Default confirmation depth awaited after submission.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Signing interface supplied by the caller.
///
/// `send_transaction` submits and awaits the requested confirmation depth.
/// Once submitted, a transaction commits regardless of what the caller does
/// afterwards; there is no cancellation.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Address of the signing wallet.
    async fn address(&self) -> Result<Address>;

    /// Native balance of the signing wallet on `network_id`.
    async fn balance(&self, network_id: u64) -> Result<U256>;

    /// Ensure the wallet is connected to `network_id` before submission.
    async fn switch_network(&self, network_id: u64) -> Result<()>;

    /// Sign, submit, and await `confirmations` blocks.
    async fn send_transaction(
        &self,
        request: TransactionRequest,
        confirmations: u64,
    ) -> Result<Receipt>;
}
