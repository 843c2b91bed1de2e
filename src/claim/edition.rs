//! Edition sale variant: a lazy-delivery ERC-721 claim extension.

use alloy::primitives::{b256, Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::chain::reader::ChainReader;
use crate::chain::types::LogEntry;
use crate::claim::adapter::{MintInput, SaleAdapter, SaleConfig};
use crate::claim::types::OnchainClaim;
use crate::errors::{Error, Result};
use crate::purchase::cost::CostBreakdown;
use crate::purchase::order::{Order, TokenAllocation};

sol! {
    interface IEditionClaim {
        function mintBatch(
            address creatorContractAddress,
            uint256 instanceId,
            uint16 mintCount,
            uint32[] calldata mintIndices,
            bytes32[][] calldata merkleProofs,
            address mintFor
        ) external payable;
    }
}

/// `Transfer(address,address,uint256)`
pub(crate) const TRANSFER_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// The ERC-721 claim-extension sale variant.
pub struct EditionSale {
    config: SaleConfig,
}

impl EditionSale {
    pub fn new(config: SaleConfig) -> Self {
        EditionSale { config }
    }
}

#[async_trait]
impl SaleAdapter for EditionSale {
    fn network_id(&self) -> u64 {
        self.config.network_id
    }

    fn extension_address(&self) -> Address {
        self.config.extension
    }

    fn creator_contract(&self) -> Address {
        self.config.creator_contract
    }

    fn instance_id(&self) -> u64 {
        self.config.instance_id
    }

    async fn fetch_onchain_data(&self, reader: &dyn ChainReader) -> Result<OnchainClaim> {
        reader
            .read_claim(
                self.config.extension,
                self.config.creator_contract,
                self.config.instance_id,
            )
            .await
    }

    async fn wallet_minted(&self, reader: &dyn ChainReader, wallet: Address) -> Result<u32> {
        reader
            .wallet_minted(
                self.config.extension,
                self.config.creator_contract,
                self.config.instance_id,
                wallet,
            )
            .await
    }

    fn platform_fee(&self, allowlist_gated: bool) -> U256 {
        if allowlist_gated {
            self.config.mint_fee_gated
        } else {
            self.config.mint_fee
        }
    }

    fn encode_mint(&self, input: &MintInput) -> Result<Bytes> {
        let mint_count = u16::try_from(input.quantity)
            .map_err(|_| Error::invalid_input("mint quantity exceeds the uint16 call limit"))?;
        if input.mint_indices.len() != input.merkle_proofs.len() {
            return Err(Error::invalid_input(
                "mint indices and merkle proofs must match one-to-one",
            ));
        }
        let call = IEditionClaim::mintBatchCall {
            creatorContractAddress: self.config.creator_contract,
            instanceId: U256::from(self.config.instance_id),
            mintCount: mint_count,
            mintIndices: input.mint_indices.clone(),
            merkleProofs: input.merkle_proofs.clone(),
            mintFor: input.recipient,
        };
        Ok(call.abi_encode().into())
    }

    fn parse_order(
        &self,
        recipient: Address,
        cost: CostBreakdown,
        logs: &[LogEntry],
    ) -> Result<Order> {
        let mut allocations = Vec::new();
        for log in logs {
            if log.address != self.config.creator_contract || log.topics.len() != 4 {
                continue;
            }
            let [topic0, from, to, token_id] = [log.topics[0], log.topics[1], log.topics[2], log.topics[3]];
            let is_mint_to_recipient = topic0 == TRANSFER_TOPIC
                && Address::from_word(from) == Address::ZERO
                && Address::from_word(to) == recipient;
            if is_mint_to_recipient {
                allocations.push(TokenAllocation {
                    contract: log.address,
                    token_id: U256::from_be_bytes(token_id.0),
                    quantity: 1,
                });
            }
        }
        if allocations.is_empty() {
            return Err(Error::api(
                "mint transaction emitted no transfer to the recipient",
                format!("{} logs scanned", logs.len()),
            )
            .with_instance(self.config.instance_id));
        }
        Ok(Order {
            recipient,
            cost,
            allocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{CurrencyId, MoneyValue};
    use crate::purchase::cost::CostBreakdown;

    fn sale() -> EditionSale {
        EditionSale::new(SaleConfig::new(
            1,
            Address::repeat_byte(2),
            Address::repeat_byte(3),
            7,
        ))
    }

    fn native(amount: u64) -> MoneyValue {
        MoneyValue::from_raw(U256::from(amount), 18, CurrencyId::Native, "ETH", 1)
    }

    fn cost() -> CostBreakdown {
        CostBreakdown {
            product: native(2),
            platform_fee: native(1),
            native_total: native(3),
            token_totals: Vec::new(),
            total_usd: None,
        }
    }

    fn transfer_log(contract: Address, from: Address, to: Address, token_id: u64) -> LogEntry {
        LogEntry {
            address: contract,
            topics: vec![
                TRANSFER_TOPIC,
                from.into_word(),
                to.into_word(),
                B256::from(U256::from(token_id)),
            ],
            data: Bytes::new(),
        }
    }

    #[test]
    fn mint_calldata_has_expected_shape() {
        let input = MintInput {
            quantity: 2,
            mint_indices: vec![0, 1],
            merkle_proofs: vec![vec![B256::repeat_byte(1)], vec![B256::repeat_byte(2)]],
            recipient: Address::repeat_byte(9),
        };
        let data = sale().encode_mint(&input).unwrap();
        let decoded = IEditionClaim::mintBatchCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.mintCount, 2);
        assert_eq!(decoded.mintIndices, vec![0, 1]);
        assert_eq!(decoded.instanceId, U256::from(7u64));
        assert_eq!(decoded.mintFor, Address::repeat_byte(9));
    }

    #[test]
    fn encode_rejects_mismatched_proofs() {
        let input = MintInput {
            quantity: 2,
            mint_indices: vec![0, 1],
            merkle_proofs: vec![vec![B256::repeat_byte(1)]],
            recipient: Address::repeat_byte(9),
        };
        assert!(sale().encode_mint(&input).is_err());
    }

    #[test]
    fn parse_order_collects_mints_to_recipient() {
        let sale = sale();
        let recipient = Address::repeat_byte(9);
        let other = Address::repeat_byte(8);
        let logs = vec![
            transfer_log(sale.creator_contract(), Address::ZERO, recipient, 11),
            transfer_log(sale.creator_contract(), Address::ZERO, recipient, 12),
            // not a mint: regular transfer
            transfer_log(sale.creator_contract(), other, recipient, 13),
            // mint into a different collection
            transfer_log(Address::repeat_byte(0x77), Address::ZERO, recipient, 14),
        ];
        let order = sale.parse_order(recipient, cost(), &logs).unwrap();
        assert_eq!(order.allocations.len(), 2);
        assert_eq!(order.allocations[0].token_id, U256::from(11u64));
        assert_eq!(order.allocations[1].token_id, U256::from(12u64));
    }

    #[test]
    fn parse_order_with_no_mint_logs_fails() {
        let sale = sale();
        let err = sale
            .parse_order(Address::repeat_byte(9), cost(), &[])
            .unwrap_err();
        assert!(err.message.contains("no transfer"));
    }
}
