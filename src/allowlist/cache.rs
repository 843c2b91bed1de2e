//! Bounded tree cache keyed by a canonical digest of the entry set.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use alloy::primitives::{keccak256, B256};

use crate::allowlist::merkle::MerkleTree;

/// Default number of trees kept per engine instance.
pub const DEFAULT_TREE_CACHE_CAPACITY: usize = 16;

/// Canonical digest of a sorted leaf set, used as the cache key. Two entry
/// sets that hash to the same leaves in any order share a key.
pub fn leaf_set_digest(sorted_leaves: &[B256]) -> B256 {
    let mut packed = Vec::with_capacity(sorted_leaves.len() * 32);
    for leaf in sorted_leaves {
        packed.extend_from_slice(leaf.as_slice());
    }
    keccak256(&packed)
}

/// Insertion-ordered bounded cache with oldest-first eviction.
#[derive(Debug)]
pub struct TreeCache {
    capacity: usize,
    trees: HashMap<B256, Arc<MerkleTree>>,
    order: VecDeque<B256>,
}

impl TreeCache {
    pub fn new(capacity: usize) -> Self {
        TreeCache {
            capacity: capacity.max(1),
            trees: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &B256) -> Option<Arc<MerkleTree>> {
        self.trees.get(key).map(Arc::clone)
    }

    pub fn insert(&mut self, key: B256, tree: Arc<MerkleTree>) {
        if self.trees.insert(key, tree).is_none() {
            self.order.push_back(key);
        }
        while self.trees.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.trees.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Drop everything; used to isolate test runs.
    pub fn clear(&mut self) {
        self.trees.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::merkle::{hash_leaf, AllowlistEntry};
    use alloy::primitives::Address;

    fn tree(seed: u8) -> Arc<MerkleTree> {
        let entries = [AllowlistEntry::new(Address::repeat_byte(seed))];
        Arc::new(MerkleTree::build(&entries))
    }

    #[test]
    fn evicts_oldest_first() {
        let mut cache = TreeCache::new(2);
        cache.insert(B256::repeat_byte(1), tree(1));
        cache.insert(B256::repeat_byte(2), tree(2));
        cache.insert(B256::repeat_byte(3), tree(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&B256::repeat_byte(1)).is_none());
        assert!(cache.get(&B256::repeat_byte(2)).is_some());
        assert!(cache.get(&B256::repeat_byte(3)).is_some());
    }

    #[test]
    fn digest_depends_only_on_leaf_set() {
        let a = hash_leaf(&AllowlistEntry::new(Address::repeat_byte(1)));
        let b = hash_leaf(&AllowlistEntry::new(Address::repeat_byte(2)));
        let mut sorted = vec![a, b];
        sorted.sort_unstable();
        assert_eq!(leaf_set_digest(&sorted), leaf_set_digest(&sorted.clone()));
        assert_ne!(leaf_set_digest(&sorted), leaf_set_digest(&sorted[..1]));
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = TreeCache::new(4);
        cache.insert(B256::repeat_byte(1), tree(1));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
