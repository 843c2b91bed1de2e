//! Purchase preparation: eligibility gating, cost aggregation, proof
//! resolution, and ordered step generation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::Address;
use tracing::{debug, warn};

use crate::allowlist::engine::AllowlistProofEngine;
use crate::allowlist::index::{AllowlistIndex, WalletSlot};
use crate::chain::router::ReadEndpointRouter;
use crate::chain::signer::WalletSigner;
use crate::chain::types::TransactionRequest;
use crate::claim::adapter::{MintInput, SaleAdapter};
use crate::claim::types::SaleStatus;
use crate::errors::{Error, ErrorKind, Result};
use crate::money::{CurrencyId, MoneyValue};
use crate::purchase::cost::{aggregate_usd, CostBreakdown, CurrencyTotals};
use crate::purchase::steps::{PreparedPurchase, StepInput, StepKind, TransactionStep};
use crate::usd::UsdRateSource;

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Caller inputs for one preparation.
#[derive(Default)]
pub struct PrepareRequest<'a> {
    pub quantity: u32,
    /// Acting (paying) address; derived from the signer when absent.
    pub payer: Option<Address>,
    /// Mint recipient; defaults to the acting address.
    pub recipient: Option<Address>,
    /// Optional signing-interface collaborator, used to derive the acting
    /// address and to probe native balance.
    pub signer: Option<&'a dyn WalletSigner>,
}

/// Validates a sale against a wallet and emits an executable
/// [`PreparedPurchase`]. Owns the proof engine (and its bounded tree cache)
/// and the read-endpoint router it queries through.
pub struct PurchaseOrchestrator {
    router: Arc<ReadEndpointRouter>,
    proof_engine: Arc<AllowlistProofEngine>,
    allowlist_index: Option<Arc<dyn AllowlistIndex>>,
    usd_source: Option<Arc<dyn UsdRateSource>>,
}

impl PurchaseOrchestrator {
    pub fn new(router: Arc<ReadEndpointRouter>) -> Self {
        PurchaseOrchestrator {
            router,
            proof_engine: Arc::new(AllowlistProofEngine::new()),
            allowlist_index: None,
            usd_source: None,
        }
    }

    #[must_use]
    pub fn with_allowlist_index(mut self, index: Arc<dyn AllowlistIndex>) -> Self {
        self.allowlist_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_usd_source(mut self, source: Arc<dyn UsdRateSource>) -> Self {
        self.usd_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_proof_engine(mut self, engine: Arc<AllowlistProofEngine>) -> Self {
        self.proof_engine = engine;
        self
    }

    pub fn proof_engine(&self) -> &Arc<AllowlistProofEngine> {
        &self.proof_engine
    }

    pub fn router(&self) -> &Arc<ReadEndpointRouter> {
        &self.router
    }

    pub fn allowlist_index(&self) -> Option<&Arc<dyn AllowlistIndex>> {
        self.allowlist_index.as_ref()
    }

    /// Validate the sale for this wallet and build the ordered step list.
    ///
    /// Fails fast at each gate; no steps are ever returned once a gate
    /// fails. See the step-by-step gates inline.
    pub async fn prepare_purchase(
        &self,
        adapter: &Arc<dyn SaleAdapter>,
        request: PrepareRequest<'_>,
    ) -> Result<PreparedPurchase> {
        let instance_id = adapter.instance_id();
        let network_id = adapter.network_id();

        // 1. Resolve acting address and recipient.
        if request.quantity == 0 {
            return Err(Error::invalid_input("quantity must be at least one")
                .with_instance(instance_id));
        }
        let payer = match request.payer {
            Some(payer) => payer,
            None => match request.signer {
                Some(signer) => signer.address().await?,
                None => {
                    return Err(Error::invalid_input(
                        "no acting address: supply a payer or a signing interface",
                    )
                    .with_instance(instance_id))
                }
            },
        };
        let recipient = request.recipient.unwrap_or(payer);
        let quantity = request.quantity;

        // 2. Sale status gate.
        let conn = self.router.get_connection(network_id).await?;
        let claim = adapter.fetch_onchain_data(conn.as_ref()).await?;
        match claim.status(current_timestamp()) {
            SaleStatus::Upcoming => {
                return Err(Error::new(ErrorKind::NotStarted, "sale has not started")
                    .with_instance(instance_id))
            }
            SaleStatus::Ended => {
                return Err(
                    Error::new(ErrorKind::Ended, "sale has ended").with_instance(instance_id)
                )
            }
            SaleStatus::SoldOut => {
                return Err(
                    Error::new(ErrorKind::SoldOut, "sale is sold out").with_instance(instance_id)
                )
            }
            SaleStatus::Active => {}
        }

        // 3. Allocation gate: min(remaining supply, wallet cap, unclaimed
        //    allowlist slots).
        let gated = claim.is_allowlist_gated();
        let mut unclaimed: Vec<WalletSlot> = Vec::new();
        if gated {
            let index = self.require_index(instance_id)?;
            let tree_id = claim.tree_id.ok_or_else(|| {
                Error::api("gated claim carries no allowlist tree id", "claim record")
                    .with_instance(instance_id)
            })?;
            unclaimed = index
                .wallet_slots(tree_id, recipient)
                .await?
                .into_iter()
                .filter(|slot| !slot.claimed)
                .collect();
            if unclaimed.is_empty() {
                return Err(Error::new(
                    ErrorKind::NotEligible,
                    "wallet has no unclaimed allowlist slots",
                )
                .with_instance(instance_id)
                .with_address(recipient.to_string()));
            }
        }

        let mut limits: Vec<u32> = Vec::new();
        if let Some(remaining) = claim.remaining_supply() {
            limits.push(remaining);
        }
        if let Some(cap) = claim.wallet_max {
            let minted = adapter.wallet_minted(conn.as_ref(), recipient).await?;
            limits.push(cap.saturating_sub(minted));
        }
        if gated {
            limits.push(u32::try_from(unclaimed.len()).unwrap_or(u32::MAX));
        }
        let allocation = limits.iter().copied().min();
        if allocation == Some(0) {
            return Err(
                Error::new(ErrorKind::NotEligible, "wallet has no remaining allocation")
                    .with_instance(instance_id)
                    .with_address(recipient.to_string()),
            );
        }
        if let Some(allocation) = allocation {
            if quantity > allocation {
                return Err(Error::invalid_input(format!(
                    "requested quantity {quantity} exceeds allocation {allocation}"
                ))
                .with_instance(instance_id));
            }
        }

        // 4. Per-unit costs, aggregated by currency identity. Allowlist
        //    slots may carry a price override; each sliced slot contributes
        //    its own unit price.
        let sliced = if gated {
            &unclaimed[..quantity as usize]
        } else {
            &[][..]
        };
        let reader = Some(conn.as_ref());
        let usd = self.usd_source.as_deref();
        let default_unit =
            MoneyValue::create(claim.cost, network_id, claim.currency(), reader, usd).await?;
        let product = if gated {
            let mut acc: Option<MoneyValue> = None;
            for slot in sliced {
                let unit = match &slot.entry.price {
                    Some(price) => {
                        MoneyValue::create(price.amount(), network_id, price.currency(), reader, usd)
                            .await?
                    }
                    None => default_unit.clone(),
                };
                acc = Some(match acc {
                    Some(sum) => sum.add(&unit)?,
                    None => unit,
                });
            }
            match acc {
                Some(product) => product,
                // unreachable: quantity >= 1 was enforced above
                None => default_unit,
            }
        } else {
            default_unit.multiply_int(u64::from(quantity))?
        };
        let platform_fee = MoneyValue::create(
            adapter.platform_fee(gated),
            network_id,
            CurrencyId::Native,
            reader,
            usd,
        )
        .await?
        .multiply_int(u64::from(quantity))?;

        let mut totals = CurrencyTotals::new();
        totals.add(product.clone())?;
        totals.add(platform_fee.clone())?;
        let ordered = totals.into_ordered();

        // 5. Funds and approvals per non-zero currency total.
        let mut steps: Vec<TransactionStep> = Vec::new();
        for total in &ordered {
            match total.currency() {
                CurrencyId::Token(token) => {
                    let (balance, allowance) = tokio::join!(
                        conn.erc20_balance(token, payer),
                        conn.erc20_allowance(token, payer, adapter.extension_address())
                    );
                    let balance = balance?;
                    if balance < total.amount() {
                        return Err(Error::new(
                            ErrorKind::InsufficientFunds,
                            format!("wallet holds too little {}", total.symbol()),
                        )
                        .with_instance(instance_id)
                        .with_address(payer.to_string()));
                    }
                    if allowance? < total.amount() {
                        steps.push(TransactionStep {
                            id: format!("approve-{token:#x}"),
                            name: format!("Approve {}", total.symbol()),
                            kind: StepKind::Approval,
                            contract: token,
                            network_id,
                            input: StepInput::Approval {
                                token,
                                spender: adapter.extension_address(),
                                amount: total.amount(),
                            },
                            adapter: None,
                        });
                    }
                }
                CurrencyId::Native => match request.signer {
                    Some(signer) => match signer.balance(network_id).await {
                        Ok(balance) if balance < total.amount() => {
                            return Err(Error::new(
                                ErrorKind::InsufficientFunds,
                                format!("wallet holds too little {}", total.symbol()),
                            )
                            .with_instance(instance_id)
                            .with_address(payer.to_string()));
                        }
                        Ok(_) => {}
                        // probe failure never aborts preparation
                        Err(err) => warn!(%err, network_id, "native balance probe failed"),
                    },
                    None => debug!(network_id, "no signing interface, skipping balance probe"),
                },
            }
        }

        // 6. Merkle proofs for the sliced slots, checked against the
        //    on-chain root before anything is returned.
        let mut mint_indices = Vec::new();
        let mut merkle_proofs = Vec::new();
        if gated {
            let index = self.require_index(instance_id)?;
            let tree_id = claim.tree_id.unwrap_or_default();
            let entries = index.entries(tree_id).await?;
            let onchain_root = claim.merkle_root.unwrap_or_default();
            for slot in sliced {
                let proof = self.proof_engine.proof_for(&entries, &slot.entry)?;
                if proof.root != onchain_root {
                    return Err(Error::api(
                        "allowlist index does not match the on-chain root",
                        format!("computed {}, on-chain {onchain_root}", proof.root),
                    )
                    .with_instance(instance_id));
                }
                mint_indices.push(slot.index);
                merkle_proofs.push(proof.path);
            }
        }

        // 7. Terminal mint step.
        let native_total = ordered
            .iter()
            .find(|total| total.currency().is_native())
            .cloned()
            .unwrap_or_else(|| MoneyValue::native_zero(network_id));
        let token_totals: Vec<MoneyValue> = ordered
            .iter()
            .filter(|total| !total.currency().is_native())
            .cloned()
            .collect();

        let mint_input = MintInput {
            quantity,
            mint_indices,
            merkle_proofs,
            recipient,
        };
        let calldata = adapter.encode_mint(&mint_input)?;
        if steps.is_empty() {
            // the mint estimate reverts while an approval is still pending,
            // so only probe when no approval step precedes it
            let probe = TransactionRequest {
                to: adapter.extension_address(),
                data: calldata,
                value: native_total.amount(),
                gas_limit: 0,
                network_id,
            };
            if let Err(err) = conn.estimate_gas(&probe).await {
                warn!(%err, instance_id, "preparation-time gas estimate failed");
            }
        }
        steps.push(TransactionStep {
            id: format!("mint-{instance_id}"),
            name: "Mint".to_string(),
            kind: StepKind::Mint,
            contract: adapter.extension_address(),
            network_id,
            input: StepInput::Mint {
                payer,
                recipient,
                quantity,
                value: native_total.amount(),
                tree_id: if gated { claim.tree_id } else { None },
            },
            adapter: Some(Arc::clone(adapter)),
        });

        // 8. Done: cost breakdown plus the ordered steps.
        let total_usd = aggregate_usd([&product, &platform_fee]);
        Ok(PreparedPurchase {
            cost: CostBreakdown {
                product,
                platform_fee,
                native_total,
                token_totals,
                total_usd,
            },
            steps,
            is_eligible: true,
        })
    }

    fn require_index(&self, instance_id: u64) -> Result<&Arc<dyn AllowlistIndex>> {
        self.allowlist_index.as_ref().ok_or_else(|| {
            Error::api(
                "allowlist-gated sale requires an index service",
                "none configured",
            )
            .with_instance(instance_id)
        })
    }
}
