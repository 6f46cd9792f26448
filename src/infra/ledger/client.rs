//! The seam between the service and whatever actually talks to the ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A ledger failure as it arrived, before classification.
///
/// Different node implementations and client bindings report failures in
/// different places: a decoded revert reason, a short human message, a message
/// nested in the error payload, or only a free-text message. Each of those
/// lands in its own field here; `message` is always populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RawLedgerError {
    pub reason: Option<String>,
    pub short_message: Option<String>,
    pub data_message: Option<String>,
    pub message: String,
}

impl RawLedgerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_short_message(mut self, short: impl Into<String>) -> Self {
        self.short_message = Some(short.into());
        self
    }

    pub fn with_data_message(mut self, data: impl Into<String>) -> Self {
        self.data_message = Some(data.into());
        self
    }
}

impl From<reqwest::Error> for RawLedgerError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest hides the root cause (timeouts, refused connections) behind
        // a generic top-level message, so include the whole chain.
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        if e.is_timeout() && !message.to_lowercase().contains("timed out") {
            message.push_str(" (request timed out)");
        }
        RawLedgerError::new(message)
    }
}

/// A `ManufacturerRegistered` log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEvent {
    pub manufacturer: String,
    pub block_number: u64,
}

/// A fully specified transaction the service submits under its own account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub method: String,
    pub args: Vec<JsonValue>,
    pub from: String,
    pub gas_limit: u64,
    pub gas_price_wei: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    /// `false` when the transaction was mined but reverted.
    pub success: bool,
}

/// Read/write access to the authentication contract.
///
/// Implementations must be safe for concurrent use; the service shares one
/// instance across all requests.
///
/// `call` returns the raw decoded result: the bare value for single-output
/// methods, and either a positional array or a named-field object for
/// multi-output methods, depending on the binding.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Executes a read-only contract call.
    async fn call(&self, method: &str, args: &[JsonValue]) -> Result<JsonValue, RawLedgerError>;

    /// Returns the latest block number.
    async fn latest_block(&self) -> Result<u64, RawLedgerError>;

    /// Returns `ManufacturerRegistered` events in `[from_block, to_block]`, oldest first.
    async fn registration_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RegistrationEvent>, RawLedgerError>;

    /// Estimates gas for a contract write.
    async fn estimate_gas(
        &self,
        method: &str,
        args: &[JsonValue],
        from: &str,
    ) -> Result<u64, RawLedgerError>;

    /// Submits a write and returns its transaction hash.
    async fn send_transaction(&self, request: &WriteRequest) -> Result<String, RawLedgerError>;

    /// Waits until the transaction is mined and returns its receipt.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RawLedgerError>;
}
