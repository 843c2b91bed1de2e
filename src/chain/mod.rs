//! Chain interfaces: wire types, the read/query and signing capability
//! contracts, calldata encoding, and the read-endpoint router.

pub mod encode;
pub mod reader;
pub mod router;
pub mod signer;
pub mod types;

pub use encode::encode_approve;
pub use reader::ChainReader;
pub use router::ReadEndpointRouter;
pub use signer::{WalletSigner, DEFAULT_CONFIRMATIONS};
pub use types::{parse_address, LogEntry, Receipt, TokenMetadata, TransactionRequest};
