//! Sequential step execution with partial-failure reporting.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use tracing::{debug, info, warn};

use crate::allowlist::engine::AllowlistProofEngine;
use crate::allowlist::index::AllowlistIndex;
use crate::chain::encode::encode_approve;
use crate::chain::router::ReadEndpointRouter;
use crate::chain::signer::{WalletSigner, DEFAULT_CONFIRMATIONS};
use crate::chain::types::{Receipt, TransactionRequest};
use crate::claim::adapter::MintInput;
use crate::errors::{Error, ErrorKind, Result};
use crate::purchase::order::Order;
use crate::purchase::steps::{
    DefaultGasPolicy, GasPolicy, PreparedPurchase, StepInput, StepKind, TransactionStep,
};

/// Receipts plus the order produced by the terminal mint.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub order: Order,
    /// One receipt per executed step, in step order.
    pub receipts: Vec<Receipt>,
}

/// Executes a [`PreparedPurchase`] strictly in step order through a
/// caller-supplied signing interface.
///
/// Submitted transactions are irreversible: a failing step aborts the
/// remaining steps but never undoes the ones that landed. The error then
/// carries the failing step id and every receipt collected so far.
pub struct PurchaseExecutor {
    router: Arc<ReadEndpointRouter>,
    proof_engine: Arc<AllowlistProofEngine>,
    allowlist_index: Option<Arc<dyn AllowlistIndex>>,
    gas_policy: Box<dyn GasPolicy>,
    confirmations: u64,
}

impl PurchaseExecutor {
    pub fn new(router: Arc<ReadEndpointRouter>, proof_engine: Arc<AllowlistProofEngine>) -> Self {
        PurchaseExecutor {
            router,
            proof_engine,
            allowlist_index: None,
            gas_policy: Box::new(DefaultGasPolicy::default()),
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }

    #[must_use]
    pub fn with_allowlist_index(mut self, index: Arc<dyn AllowlistIndex>) -> Self {
        self.allowlist_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_gas_policy(mut self, policy: Box<dyn GasPolicy>) -> Self {
        self.gas_policy = policy;
        self
    }

    /// Confirmation depth awaited after each submission (default 1).
    #[must_use]
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Run every step in order. On success the terminal mint step must have
    /// produced an [`Order`].
    ///
    /// # Errors
    ///
    /// `TransactionFailed` carrying the failing step id and the receipts of
    /// the steps that landed before it.
    pub async fn purchase(
        &self,
        prepared: &PreparedPurchase,
        signer: &dyn WalletSigner,
    ) -> Result<PurchaseOutcome> {
        let mut receipts: Vec<Receipt> = Vec::new();
        let mut order: Option<Order> = None;

        for step in &prepared.steps {
            debug!(step = %step.id, kind = ?step.kind, "executing step");
            match self.execute_step(prepared, step, signer).await {
                Ok((receipt, step_order)) => {
                    receipts.push(receipt);
                    if step_order.is_some() {
                        order = step_order;
                    }
                }
                Err(err) => {
                    return Err(Error::transaction_failed(
                        &step.id,
                        receipts,
                        err.to_string(),
                    ));
                }
            }
        }

        match order {
            Some(order) => {
                info!(
                    steps = receipts.len(),
                    allocations = order.allocations.len(),
                    "purchase complete"
                );
                Ok(PurchaseOutcome { order, receipts })
            }
            None => Err(Error::transaction_failed(
                prepared
                    .steps
                    .last()
                    .map_or("mint", |step| step.id.as_str()),
                receipts,
                "no order produced",
            )),
        }
    }

    async fn execute_step(
        &self,
        prepared: &PreparedPurchase,
        step: &TransactionStep,
        signer: &dyn WalletSigner,
    ) -> Result<(Receipt, Option<Order>)> {
        let conn = self.router.get_connection(step.network_id).await?;
        signer.switch_network(step.network_id).await?;

        let (calldata, value) = self.build_calldata(step).await?;

        // gas from preparation time is never reused; state may have drifted
        let mut request = TransactionRequest {
            to: step.contract,
            data: calldata,
            value,
            gas_limit: 0,
            network_id: step.network_id,
        };
        let estimate = conn.estimate_gas(&request).await?;
        request.gas_limit = self.gas_policy.apply(estimate);

        let receipt = signer.send_transaction(request, self.confirmations).await?;

        // the mint has landed at this point; a failing order derivation
        // must not discard its receipt, so it degrades to "no order"
        let order = match (step.kind, &step.input) {
            (StepKind::Mint, StepInput::Mint { recipient, .. }) => {
                let adapter = step
                    .adapter
                    .as_ref()
                    .ok_or_else(|| Error::invalid_input("mint step lost its sale adapter"))?;
                match conn.transaction_logs(receipt.tx_hash).await {
                    Ok(logs) => {
                        match adapter.parse_order(*recipient, prepared.cost.clone(), &logs) {
                            Ok(order) => Some(order),
                            Err(err) => {
                                warn!(step = %step.id, %err, "order derivation failed");
                                None
                            }
                        }
                    }
                    Err(err) => {
                        warn!(step = %step.id, %err, "receipt log fetch failed");
                        None
                    }
                }
            }
            _ => None,
        };
        Ok((receipt, order))
    }

    /// Rebuild a step's calldata at execution time. Mint steps re-resolve
    /// their allowlist proofs so claims that landed since preparation are
    /// excluded.
    async fn build_calldata(&self, step: &TransactionStep) -> Result<(Bytes, U256)> {
        match &step.input {
            StepInput::Approval {
                token: _,
                spender,
                amount,
            } => Ok((encode_approve(*spender, *amount), U256::ZERO)),
            StepInput::Mint {
                payer: _,
                recipient,
                quantity,
                value,
                tree_id,
            } => {
                let adapter = step
                    .adapter
                    .as_ref()
                    .ok_or_else(|| Error::invalid_input("mint step lost its sale adapter"))?;

                let (mint_indices, merkle_proofs) = match tree_id {
                    Some(tree_id) => {
                        self.resolve_proofs(*tree_id, *recipient, *quantity).await?
                    }
                    None => (Vec::new(), Vec::new()),
                };
                let input = MintInput {
                    quantity: *quantity,
                    mint_indices,
                    merkle_proofs,
                    recipient: *recipient,
                };
                Ok((adapter.encode_mint(&input)?, *value))
            }
        }
    }

    async fn resolve_proofs(
        &self,
        tree_id: u64,
        recipient: Address,
        quantity: u32,
    ) -> Result<(Vec<u32>, Vec<Vec<alloy::primitives::B256>>)> {
        let index = self.allowlist_index.as_ref().ok_or_else(|| {
            Error::api(
                "allowlist-gated mint requires an index service",
                "none configured",
            )
        })?;
        let unclaimed: Vec<_> = index
            .wallet_slots(tree_id, recipient)
            .await?
            .into_iter()
            .filter(|slot| !slot.claimed)
            .collect();
        if unclaimed.len() < quantity as usize {
            return Err(Error::new(
                ErrorKind::NotEligible,
                "allowlist slots were claimed since preparation",
            )
            .with_address(recipient.to_string()));
        }

        let entries = index.entries(tree_id).await?;
        let mut mint_indices = Vec::with_capacity(quantity as usize);
        let mut merkle_proofs = Vec::with_capacity(quantity as usize);
        for slot in &unclaimed[..quantity as usize] {
            let proof = self.proof_engine.proof_for(&entries, &slot.entry)?;
            mint_indices.push(slot.index);
            merkle_proofs.push(proof.path);
        }
        Ok((mint_indices, merkle_proofs))
    }
}
