//! Wire-level types shared across the chain interfaces.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A prospective contract call: destination, calldata, attached native value,
/// gas limit, and the network it must be submitted on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub network_id: u64,
}

/// Confirmation record for a landed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub network_id: u64,
    pub tx_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
}

/// One event log from a landed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Contract that emitted the log.
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// ERC-20 identity metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
}

/// Parse an EVM address string, case-normalizing before the hex decode so
/// mixed-case (checksummed) and lower-case inputs are treated alike.
///
/// # Errors
///
/// Returns `InvalidInput` when the string is not `0x` + 40 hex characters.
pub fn parse_address(address: &str) -> Result<Address> {
    let lowered = address.to_ascii_lowercase();
    if !lowered.starts_with("0x") {
        return Err(
            Error::invalid_input("address must start with '0x'").with_address(address)
        );
    }
    Address::from_str(&lowered).map_err(|_| {
        Error::invalid_input("address must be 0x followed by 40 hex characters")
            .with_address(address)
    })
}
