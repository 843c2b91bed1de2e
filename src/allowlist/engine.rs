//! Proof generation over cached trees.

use std::sync::{Arc, Mutex};

use alloy::primitives::B256;

use crate::allowlist::cache::{leaf_set_digest, TreeCache, DEFAULT_TREE_CACHE_CAPACITY};
use crate::allowlist::merkle::{self, hash_leaf, AllowlistEntry, MerkleProof, MerkleTree};
use crate::errors::{Error, ErrorKind, Result};

/// Builds and caches allowlist trees, and generates verifier-compatible
/// membership proofs. Owned by the orchestrator instance; the cache is
/// bounded with oldest-first eviction.
pub struct AllowlistProofEngine {
    cache: Mutex<TreeCache>,
}

impl AllowlistProofEngine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TREE_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        AllowlistProofEngine {
            cache: Mutex::new(TreeCache::new(capacity)),
        }
    }

    /// Tree for an entry set, reusing a cached build when the canonical leaf
    /// digest matches.
    pub fn tree_for(&self, entries: &[AllowlistEntry]) -> Arc<MerkleTree> {
        let mut leaves: Vec<B256> = entries.iter().map(hash_leaf).collect();
        leaves.sort_unstable();
        let key = leaf_set_digest(&leaves);

        let mut cache = self.cache.lock().expect("tree cache poisoned");
        if let Some(tree) = cache.get(&key) {
            return tree;
        }
        let tree = Arc::new(MerkleTree::from_sorted_leaves(leaves));
        cache.insert(key, Arc::clone(&tree));
        tree
    }

    /// Membership proof for `entry` within `entries`.
    ///
    /// # Errors
    ///
    /// `NotEligible` when the entry is not part of the set.
    pub fn proof_for(
        &self,
        entries: &[AllowlistEntry],
        entry: &AllowlistEntry,
    ) -> Result<MerkleProof> {
        let tree = self.tree_for(entries);
        let leaf = hash_leaf(entry);
        let path = tree.proof(leaf).ok_or_else(|| {
            Error::new(ErrorKind::NotEligible, "address is not on the allowlist")
                .with_address(entry.address.to_string())
        })?;
        Ok(MerkleProof {
            root: tree.root(),
            path,
            leaf,
            max_quantity: entry.max_quantity,
            price: entry.price.clone(),
        })
    }

    /// Validate a proof against a root using the construction-time pairing
    /// rule.
    pub fn verify(proof: &MerkleProof, leaf: B256, root: B256) -> bool {
        proof.leaf == leaf && proof.root == root && merkle::verify(&proof.path, leaf, root)
    }

    /// Drop all cached trees.
    pub fn clear(&self) {
        self.cache.lock().expect("tree cache poisoned").clear();
    }

    #[cfg(test)]
    pub(crate) fn cached_trees(&self) -> usize {
        self.cache.lock().expect("tree cache poisoned").len()
    }
}

impl Default for AllowlistProofEngine {
    fn default() -> Self {
        Self::new()
    }
}
