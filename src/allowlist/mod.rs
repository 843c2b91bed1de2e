//! Allowlist membership: merkle proofs, tree caching, and the index service
//! contract.

pub mod cache;
pub mod engine;
pub mod index;
pub mod merkle;

pub use cache::{TreeCache, DEFAULT_TREE_CACHE_CAPACITY};
pub use engine::AllowlistProofEngine;
pub use index::{AllowlistIndex, HttpAllowlistIndex, WalletSlot};
pub use merkle::{hash_leaf, verify, AllowlistEntry, MerkleProof, MerkleTree};
