//! Sale configuration records and the variant dispatch seam.

pub mod adapter;
pub mod edition;
pub mod types;

pub use adapter::{sale_adapter, MintInput, SaleAdapter, SaleConfig};
pub use edition::EditionSale;
pub use types::{OnchainClaim, SaleStatus};
