//! Stable error taxonomy for everything that can go wrong talking to the ledger.

use serde::{Deserialize, Serialize};

pub mod classifier;

pub use classifier::classify;

/// Closed set of failure categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    NotRegistered,
    NotFound,
    AlreadyVerified,
    AlreadyRegistered,
    InsufficientFunds,
    NonceError,
    ReplacementConflict,
    AlreadySubmitted,
    Underpriced,
    NetworkError,
    Timeout,
    WritesDisabled,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{category:?}: {message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, message)
    }

    pub fn writes_disabled() -> Self {
        Self::new(
            ErrorCategory::WritesDisabled,
            "Direct ledger writes are disabled; use the prepared transaction instead",
        )
    }

    /// Adapter failure for a record that decoded but is missing a required field.
    pub fn malformed(kind: &str, field: &str) -> Self {
        Self::new(
            ErrorCategory::Unclassified,
            format!("malformed {} record: missing field {}", kind, field),
        )
    }
}
