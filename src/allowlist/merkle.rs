//! Deterministic merkle tree over allowlist entries.
//!
//! Leaf encoding and the pairing convention must bit-match the on-chain
//! verifier: fixed-width packed leaf fields with no length prefixes,
//! lexicographically sorted leaves, sorted-pair parent hashing, and an odd
//! trailing node promoted unchanged to the next layer (never duplicated).

use alloy::primitives::{keccak256, Address, B256};
use serde::Serialize;

use crate::money::MoneyValue;

/// One allowlist entry: an address plus optional per-entry quantity cap and
/// price override. A wallet may hold several entries (one mint slot each).
#[derive(Debug, Clone, PartialEq)]
pub struct AllowlistEntry {
    /// Case-normalized at parse time; the raw 20 bytes are what gets hashed.
    pub address: Address,
    pub max_quantity: Option<u32>,
    pub price: Option<MoneyValue>,
}

impl AllowlistEntry {
    pub fn new(address: Address) -> Self {
        AllowlistEntry {
            address,
            max_quantity: None,
            price: None,
        }
    }

    #[must_use]
    pub fn with_max_quantity(mut self, max_quantity: u32) -> Self {
        self.max_quantity = Some(max_quantity);
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: MoneyValue) -> Self {
        self.price = Some(price);
        self
    }
}

/// Membership proof for one leaf, with the quantity/price metadata tied to
/// that leaf.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub root: B256,
    /// Sibling hashes, leaf level first.
    pub path: Vec<B256>,
    pub leaf: B256,
    pub max_quantity: Option<u32>,
    #[serde(skip)]
    pub price: Option<MoneyValue>,
}

/// Hash one entry into its leaf: 20-byte address, then 4-byte big-endian
/// quantity when present, then 32-byte big-endian price amount when present.
pub fn hash_leaf(entry: &AllowlistEntry) -> B256 {
    let mut packed = Vec::with_capacity(56);
    packed.extend_from_slice(entry.address.as_slice());
    if let Some(quantity) = entry.max_quantity {
        packed.extend_from_slice(&quantity.to_be_bytes());
    }
    if let Some(price) = &entry.price {
        packed.extend_from_slice(&price.amount().to_be_bytes::<32>());
    }
    keccak256(&packed)
}

fn hash_pair(a: B256, b: B256) -> B256 {
    let mut packed = [0u8; 64];
    if a <= b {
        packed[..32].copy_from_slice(a.as_slice());
        packed[32..].copy_from_slice(b.as_slice());
    } else {
        packed[..32].copy_from_slice(b.as_slice());
        packed[32..].copy_from_slice(a.as_slice());
    }
    keccak256(packed)
}

/// Fully materialized tree. Layer 0 holds the sorted leaves; the last layer
/// holds the root alone.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Build from entries. Leaves are sorted before layering, so the root is
    /// independent of entry order.
    pub fn build(entries: &[AllowlistEntry]) -> MerkleTree {
        let mut leaves: Vec<B256> = entries.iter().map(hash_leaf).collect();
        leaves.sort_unstable();
        MerkleTree::from_sorted_leaves(leaves)
    }

    pub(crate) fn from_sorted_leaves(leaves: Vec<B256>) -> MerkleTree {
        let mut layers = vec![leaves];
        loop {
            let current = match layers.last() {
                Some(layer) if layer.len() > 1 => layer,
                _ => break,
            };
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for pair in current.chunks(2) {
                match pair {
                    [a, b] => next.push(hash_pair(*a, *b)),
                    // odd trailing node is promoted unchanged
                    [a] => next.push(*a),
                    _ => unreachable!(),
                }
            }
            layers.push(next);
        }
        MerkleTree { layers }
    }

    /// Root hash, or zero for an empty tree.
    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(B256::ZERO)
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Sibling path for `leaf`, or `None` when the leaf is not in the tree.
    pub fn proof(&self, leaf: B256) -> Option<Vec<B256>> {
        let mut index = self.layers.first()?.iter().position(|l| *l == leaf)?;
        let mut path = Vec::new();
        for layer in &self.layers[..self.layers.len().saturating_sub(1)] {
            let sibling = index ^ 1;
            // a promoted node has no sibling at this layer
            if sibling < layer.len() {
                path.push(layer[sibling]);
            }
            index /= 2;
        }
        Some(path)
    }
}

/// Recompute the root from `leaf` along `path` and compare to `root`.
pub fn verify(path: &[B256], leaf: B256, root: B256) -> bool {
    let computed = path.iter().fold(leaf, |acc, sibling| hash_pair(acc, *sibling));
    computed == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use crate::money::CurrencyId;

    fn entries(n: u8) -> Vec<AllowlistEntry> {
        (1..=n)
            .map(|i| AllowlistEntry::new(Address::repeat_byte(i)).with_max_quantity(u32::from(i)))
            .collect()
    }

    #[test]
    fn root_is_entry_order_independent() {
        let forward = entries(7);
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            MerkleTree::build(&forward).root(),
            MerkleTree::build(&reversed).root()
        );
    }

    #[test]
    fn every_leaf_proves_membership() {
        for n in 1..=9u8 {
            let list = entries(n);
            let tree = MerkleTree::build(&list);
            for entry in &list {
                let leaf = hash_leaf(entry);
                let path = tree.proof(leaf).expect("leaf present");
                assert!(verify(&path, leaf, tree.root()), "n = {n}");
            }
        }
    }

    #[test]
    fn flipped_leaf_byte_fails_verification() {
        let list = entries(4);
        let tree = MerkleTree::build(&list);
        let leaf = hash_leaf(&list[2]);
        let path = tree.proof(leaf).unwrap();

        let mut bad_leaf = leaf;
        bad_leaf.0[7] ^= 0x01;
        assert!(!verify(&path, bad_leaf, tree.root()));
    }

    #[test]
    fn flipped_path_byte_fails_verification() {
        let list = entries(5);
        let tree = MerkleTree::build(&list);
        let leaf = hash_leaf(&list[0]);
        let path = tree.proof(leaf).unwrap();

        for i in 0..path.len() {
            let mut bad = path.clone();
            bad[i].0[31] ^= 0x80;
            assert!(!verify(&bad, leaf, tree.root()), "element {i}");
        }
    }

    #[test]
    fn odd_trailing_leaf_is_promoted_not_duplicated() {
        // With promotion, a 3-leaf root is hash(hash(a,b), c). Duplication
        // would instead produce hash(hash(a,b), hash(c,c)).
        let list = entries(3);
        let mut leaves: Vec<B256> = list.iter().map(hash_leaf).collect();
        leaves.sort_unstable();
        let expected = hash_pair(hash_pair(leaves[0], leaves[1]), leaves[2]);
        assert_eq!(MerkleTree::build(&list).root(), expected);
    }

    #[test]
    fn leaf_hash_covers_optional_fields() {
        let base = AllowlistEntry::new(Address::repeat_byte(1));
        let with_qty = base.clone().with_max_quantity(10);
        let price =
            MoneyValue::from_raw(U256::from(42u64), 6, CurrencyId::Token(Address::repeat_byte(9)), "USDC", 1);
        let with_price = base.clone().with_price(price);

        let h0 = hash_leaf(&base);
        let h1 = hash_leaf(&with_qty);
        let h2 = hash_leaf(&with_price);
        assert_ne!(h0, h1);
        assert_ne!(h0, h2);
        assert_ne!(h1, h2);
    }

    #[test]
    fn missing_leaf_has_no_proof() {
        let tree = MerkleTree::build(&entries(4));
        let outsider = hash_leaf(&AllowlistEntry::new(Address::repeat_byte(0xee)));
        assert!(tree.proof(outsider).is_none());
    }

    #[test]
    fn single_leaf_tree_has_empty_proof() {
        let list = entries(1);
        let tree = MerkleTree::build(&list);
        let leaf = hash_leaf(&list[0]);
        assert_eq!(tree.root(), leaf);
        let path = tree.proof(leaf).unwrap();
        assert!(path.is_empty());
        assert!(verify(&path, leaf, tree.root()));
    }
}
