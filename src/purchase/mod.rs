//! The purchase orchestration engine: cost aggregation, step generation,
//! and sequential execution.

pub mod cost;
pub mod executor;
pub mod orchestrator;
pub mod order;
pub mod steps;

pub use cost::CostBreakdown;
pub use executor::{PurchaseExecutor, PurchaseOutcome};
pub use orchestrator::{PrepareRequest, PurchaseOrchestrator};
pub use order::{Order, TokenAllocation};
pub use steps::{
    DefaultGasPolicy, GasPolicy, PreparedPurchase, StepInput, StepKind, TransactionStep,
};
