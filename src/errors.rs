//! Structured error type for the purchase engine.
//!
//! Every failure surfaced by this crate is a single [`Error`] carrying a
//! machine-readable [`ErrorKind`], a human-readable message, and a details
//! payload for programmatic handling (offending address, claim instance,
//! failing step id, partial receipts).

use serde::Serialize;
use thiserror::Error;

use crate::chain::types::Receipt;

/// Machine-readable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Malformed or out-of-range caller input (bad address, excessive
    /// quantity, mismatched currencies).
    InvalidInput,
    /// The sale has not opened yet.
    NotStarted,
    /// The sale window has closed.
    Ended,
    /// Supply is exhausted.
    SoldOut,
    /// The wallet has no allocation (allowlist miss or cap reached).
    NotEligible,
    /// The paying wallet cannot cover a required currency total.
    InsufficientFunds,
    /// An on-chain step failed during execution.
    TransactionFailed,
    /// An upstream read or index service failed.
    ApiError,
    /// Unrecognized sale or contract variant.
    UnsupportedType,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NotStarted => "not started",
            ErrorKind::Ended => "ended",
            ErrorKind::SoldOut => "sold out",
            ErrorKind::NotEligible => "not eligible",
            ErrorKind::InsufficientFunds => "insufficient funds",
            ErrorKind::TransactionFailed => "transaction failed",
            ErrorKind::ApiError => "api error",
            ErrorKind::UnsupportedType => "unsupported type",
        };
        f.write_str(s)
    }
}

/// Supplemental context attached to an [`Error`].
#[derive(Debug, Clone, Default)]
pub struct ErrorDetails {
    /// Claim instance the failure relates to.
    pub instance_id: Option<u64>,
    /// Offending address, when one is known.
    pub address: Option<String>,
    /// Id of the step that failed during execution.
    pub failed_step: Option<String>,
    /// Receipts of the steps that landed before the failure, in order.
    pub receipts: Vec<Receipt>,
    /// Stringified nested cause.
    pub cause: Option<String>,
}

/// The single error type surfaced by this crate.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub details: ErrorDetails,
}

// Convenience constructors for common error patterns
impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            details: ErrorDetails::default(),
        }
    }

    /// Attach a claim instance id.
    #[must_use]
    pub fn with_instance(mut self, instance_id: u64) -> Self {
        self.details.instance_id = Some(instance_id);
        self
    }

    /// Attach the offending address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.details.address = Some(address.into());
        self
    }

    /// Create an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidInput, message)
    }

    /// Create an `ApiError`, recording the nested cause.
    pub fn api(message: impl Into<String>, cause: impl Into<String>) -> Self {
        let mut err = Error::new(ErrorKind::ApiError, message);
        err.details.cause = Some(cause.into());
        err
    }

    /// Create an `UnsupportedType` error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::UnsupportedType, message)
    }

    /// Currency-mismatch arithmetic error (an `InvalidInput` whose message
    /// names both currencies).
    pub fn currency_mismatch(lhs: impl std::fmt::Display, rhs: impl std::fmt::Display) -> Self {
        Error::invalid_input(format!("currency mismatch: {lhs} vs {rhs}"))
    }

    /// Create a `TransactionFailed` error carrying the failing step id and
    /// the receipts collected before the failure.
    pub fn transaction_failed(
        step_id: impl Into<String>,
        receipts: Vec<Receipt>,
        cause: impl Into<String>,
    ) -> Self {
        let step_id = step_id.into();
        let mut err = Error::new(
            ErrorKind::TransactionFailed,
            format!("step '{step_id}' failed"),
        );
        err.details.failed_step = Some(step_id);
        err.details.receipts = receipts;
        err.details.cause = Some(cause.into());
        err
    }

    /// True when this error is the currency-mismatch flavor of
    /// `InvalidInput`.
    #[must_use]
    pub fn is_currency_mismatch(&self) -> bool {
        self.kind == ErrorKind::InvalidInput && self.message.starts_with("currency mismatch")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
