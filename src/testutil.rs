//! Shared test doubles: scripted reader, signer, and allowlist index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::allowlist::index::{AllowlistIndex, WalletSlot};
use crate::allowlist::merkle::AllowlistEntry;
use crate::chain::reader::ChainReader;
use crate::chain::signer::WalletSigner;
use crate::chain::types::{LogEntry, Receipt, TokenMetadata, TransactionRequest};
use crate::claim::edition::TRANSFER_TOPIC;
use crate::claim::types::OnchainClaim;
use crate::errors::{Error, Result};

/// ERC-721 mint log (`Transfer` from the zero address).
pub(crate) fn mint_log(contract: Address, to: Address, token_id: u64) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![
            TRANSFER_TOPIC,
            Address::ZERO.into_word(),
            to.into_word(),
            B256::from(U256::from(token_id)),
        ],
        data: Bytes::new(),
    }
}

/// Scripted [`ChainReader`].
#[derive(Default)]
pub(crate) struct MockReader {
    chain_id: u64,
    chain_id_calls: AtomicUsize,
    claim: Mutex<Option<OnchainClaim>>,
    minted: Mutex<HashMap<Address, u32>>,
    metadata: Mutex<HashMap<Address, TokenMetadata>>,
    erc20_balances: Mutex<HashMap<(Address, Address), U256>>,
    erc20_allowances: Mutex<HashMap<(Address, Address), U256>>,
    native_balances: Mutex<HashMap<Address, U256>>,
    logs: Mutex<Vec<LogEntry>>,
    gas_estimate: u64,
}

impl MockReader {
    pub(crate) fn new(chain_id: u64) -> Self {
        MockReader {
            chain_id,
            gas_estimate: 50_000,
            ..MockReader::default()
        }
    }

    pub(crate) fn chain_id_calls(&self) -> usize {
        self.chain_id_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_claim(&self, claim: OnchainClaim) {
        *self.claim.lock().unwrap() = Some(claim);
    }

    pub(crate) fn set_minted(&self, wallet: Address, count: u32) {
        self.minted.lock().unwrap().insert(wallet, count);
    }

    pub(crate) fn set_metadata(&self, token: Address, symbol: &str, decimals: u8) {
        self.metadata.lock().unwrap().insert(
            token,
            TokenMetadata {
                symbol: symbol.to_string(),
                decimals,
            },
        );
    }

    pub(crate) fn set_erc20_balance(&self, token: Address, owner: Address, amount: U256) {
        self.erc20_balances
            .lock()
            .unwrap()
            .insert((token, owner), amount);
    }

    pub(crate) fn set_erc20_allowance(&self, token: Address, owner: Address, amount: U256) {
        self.erc20_allowances
            .lock()
            .unwrap()
            .insert((token, owner), amount);
    }

    pub(crate) fn set_logs(&self, logs: Vec<LogEntry>) {
        *self.logs.lock().unwrap() = logs;
    }
}

#[async_trait]
impl ChainReader for MockReader {
    async fn chain_id(&self) -> Result<u64> {
        self.chain_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id)
    }

    async fn read_claim(
        &self,
        _extension: Address,
        _creator_contract: Address,
        _instance_id: u64,
    ) -> Result<OnchainClaim> {
        self.claim
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::api("no claim configured", "mock"))
    }

    async fn wallet_minted(
        &self,
        _extension: Address,
        _creator_contract: Address,
        _instance_id: u64,
        wallet: Address,
    ) -> Result<u32> {
        Ok(self.minted.lock().unwrap().get(&wallet).copied().unwrap_or(0))
    }

    async fn erc20_metadata(&self, token: Address) -> Result<TokenMetadata> {
        self.metadata
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .ok_or_else(|| Error::api("unknown token", token.to_string()))
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(self
            .erc20_balances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        _spender: Address,
    ) -> Result<U256> {
        Ok(self
            .erc20_allowances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self
            .native_balances
            .lock()
            .unwrap()
            .get(&owner)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> Result<u64> {
        Ok(self.gas_estimate)
    }

    async fn transaction_logs(&self, _tx_hash: B256) -> Result<Vec<LogEntry>> {
        Ok(self.logs.lock().unwrap().clone())
    }
}

/// Scripted [`WalletSigner`]: records submissions, optionally fails at a
/// fixed step index.
pub(crate) struct MockSigner {
    address: Address,
    native_balance: Mutex<Result<U256>>,
    fail_at: Option<usize>,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl MockSigner {
    pub(crate) fn new(address: Address) -> Self {
        MockSigner {
            address,
            native_balance: Mutex::new(Ok(U256::MAX)),
            fail_at: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_native_balance(self, balance: U256) -> Self {
        *self.native_balance.lock().unwrap() = Ok(balance);
        self
    }

    pub(crate) fn with_broken_balance_probe(self) -> Self {
        *self.native_balance.lock().unwrap() = Err(Error::api("probe broken", "mock"));
        self
    }

    /// Fail the `index`-th submitted transaction (0-based).
    pub(crate) fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub(crate) fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for MockSigner {
    async fn address(&self) -> Result<Address> {
        Ok(self.address)
    }

    async fn balance(&self, _network_id: u64) -> Result<U256> {
        self.native_balance.lock().unwrap().clone()
    }

    async fn switch_network(&self, _network_id: u64) -> Result<()> {
        Ok(())
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
        _confirmations: u64,
    ) -> Result<Receipt> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len();
        if self.fail_at == Some(index) {
            return Err(Error::api("transaction reverted", format!("step {index}")));
        }
        sent.push(request.clone());
        Ok(Receipt {
            network_id: request.network_id,
            tx_hash: B256::repeat_byte(index as u8 + 1),
            block_number: 1_000 + index as u64,
            gas_used: request.gas_limit,
        })
    }
}

/// In-memory [`AllowlistIndex`].
#[derive(Default)]
pub(crate) struct MockIndex {
    entries: Mutex<Vec<AllowlistEntry>>,
    slots: Mutex<HashMap<Address, Vec<WalletSlot>>>,
}

impl MockIndex {
    pub(crate) fn new() -> Self {
        MockIndex::default()
    }

    pub(crate) fn set_entries(&self, entries: Vec<AllowlistEntry>) {
        *self.entries.lock().unwrap() = entries;
    }

    pub(crate) fn set_slots(&self, wallet: Address, slots: Vec<WalletSlot>) {
        self.slots.lock().unwrap().insert(wallet, slots);
    }
}

#[async_trait]
impl AllowlistIndex for MockIndex {
    async fn entries(&self, _tree_id: u64) -> Result<Vec<AllowlistEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn wallet_slots(&self, _tree_id: u64, address: Address) -> Result<Vec<WalletSlot>> {
        Ok(self
            .slots
            .lock()
            .unwrap()
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }
}
