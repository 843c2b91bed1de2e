#![deny(unreachable_pub)]

//! # claimkit
//!
//! Purchase orchestration engine for blockchain-issued collectibles sold
//! under configurable rules: fixed or open supply, per-wallet caps, time
//! windows, allowlist gating via merkle membership proofs, and
//! multi-currency pricing with a protocol surcharge.
//!
//! The flow: a sale variant adapter reads on-chain sale parameters through
//! the [`ReadEndpointRouter`]; the [`PurchaseOrchestrator`] validates
//! status/eligibility, aggregates costs, resolves proofs, and emits a
//! [`PreparedPurchase`] of ordered transaction steps; the caller hands it to
//! the [`PurchaseExecutor`] together with a [`WalletSigner`], which runs the
//! steps sequentially and returns the [`Order`].

// Core modules
pub mod allowlist;
pub mod chain;
pub mod claim;
mod errors;
mod http;
pub mod money;
pub mod purchase;
pub mod usd;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports
pub use allowlist::{
    AllowlistEntry, AllowlistIndex, AllowlistProofEngine, HttpAllowlistIndex, MerkleProof,
    MerkleTree, WalletSlot,
};
pub use chain::{
    parse_address, ChainReader, LogEntry, ReadEndpointRouter, Receipt, TokenMetadata,
    TransactionRequest, WalletSigner, DEFAULT_CONFIRMATIONS,
};
pub use claim::{sale_adapter, EditionSale, MintInput, OnchainClaim, SaleAdapter, SaleConfig, SaleStatus};
pub use errors::{Error, ErrorDetails, ErrorKind, Result};
pub use http::HttpClient;
pub use money::{CurrencyId, MoneyValue};
pub use purchase::{
    CostBreakdown, DefaultGasPolicy, GasPolicy, Order, PrepareRequest, PreparedPurchase,
    PurchaseExecutor, PurchaseOrchestrator, PurchaseOutcome, StepInput, StepKind,
    TokenAllocation, TransactionStep,
};
pub use usd::{HttpUsdSource, UsdRateSource};
