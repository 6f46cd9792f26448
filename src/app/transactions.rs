//! Contract writes.
//!
//! Two independent paths:
//! - `prepare`: builds an inert [`TransactionDescriptor`] for an external
//!   signer (the user's wallet). No ledger interaction at all.
//! - [`DirectWriter`]: submits under the service-held account. Gated behind
//!   `ENABLE_DEV_WRITES`; when the flag is off nothing touches the ledger.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::domain::errors::{classify, ClassifiedError, ErrorCategory};
use crate::infra::config::WriteSettings;
use crate::infra::ledger::{LedgerClient, RawLedgerError, WriteRequest};

/// Gas estimates are padded by 30% (13/10, rounded up).
const GAS_SAFETY_NUMERATOR: u128 = 13;
const GAS_SAFETY_DENOMINATOR: u128 = 10;

/// Every write the contract accepts, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "method",
    content = "args",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum WriteAction {
    RegisterManufacturer {
        address: String,
        name: String,
        license: String,
        email: String,
    },
    VerifyManufacturer {
        address: String,
    },
    DeactivateManufacturer {
        address: String,
    },
    RegisterMedicineBatch {
        batch_id: String,
        medicine_name: String,
        manufacturing_date: u64,
        expiry_date: u64,
    },
    MarkBatchRecalled {
        batch_id: String,
    },
    RecordExpiredScan {
        batch_id: String,
    },
}

impl WriteAction {
    pub fn method(&self) -> &'static str {
        match self {
            Self::RegisterManufacturer { .. } => "registerManufacturer",
            Self::VerifyManufacturer { .. } => "verifyManufacturer",
            Self::DeactivateManufacturer { .. } => "deactivateManufacturer",
            Self::RegisterMedicineBatch { .. } => "registerMedicineBatch",
            Self::MarkBatchRecalled { .. } => "markBatchRecalled",
            Self::RecordExpiredScan { .. } => "recordExpiredScan",
        }
    }

    /// Arguments in contract parameter order.
    pub fn ordered_args(&self) -> Vec<JsonValue> {
        match self {
            Self::RegisterManufacturer {
                address,
                name,
                license,
                email,
            } => vec![json!(address), json!(name), json!(license), json!(email)],
            Self::VerifyManufacturer { address } | Self::DeactivateManufacturer { address } => {
                vec![json!(address)]
            }
            Self::RegisterMedicineBatch {
                batch_id,
                medicine_name,
                manufacturing_date,
                expiry_date,
            } => vec![
                json!(batch_id),
                json!(medicine_name),
                json!(manufacturing_date),
                json!(expiry_date),
            ],
            Self::MarkBatchRecalled { batch_id } | Self::RecordExpiredScan { batch_id } => {
                vec![json!(batch_id)]
            }
        }
    }
}

/// Unsigned description of an intended write. Never signed or sent by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub target_contract_ref: String,
    pub method_name: String,
    pub ordered_args: Vec<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub explorer_url: String,
}

pub fn prepare(contract_address: &str, action: &WriteAction) -> TransactionDescriptor {
    TransactionDescriptor {
        target_contract_ref: contract_address.to_string(),
        method_name: action.method().to_string(),
        ordered_args: action.ordered_args(),
    }
}

/// `ceil(estimate * 1.3)` when an estimate exists, the configured default otherwise.
pub fn submission_gas_limit(estimate: Option<u64>, default_gas_limit: u64) -> u64 {
    match estimate {
        Some(e) => {
            let padded = (e as u128 * GAS_SAFETY_NUMERATOR).div_ceil(GAS_SAFETY_DENOMINATOR);
            u64::try_from(padded).unwrap_or(u64::MAX)
        }
        None => default_gas_limit,
    }
}

pub struct DirectWriter<'a, L: LedgerClient + ?Sized> {
    ledger: &'a L,
    settings: &'a WriteSettings,
    explorer_base_url: &'a str,
}

impl<'a, L: LedgerClient + ?Sized> DirectWriter<'a, L> {
    pub fn new(ledger: &'a L, settings: &'a WriteSettings, explorer_base_url: &'a str) -> Self {
        Self {
            ledger,
            settings,
            explorer_base_url,
        }
    }

    /// Estimates, submits and waits for confirmation. Estimation failure falls
    /// back to the default gas limit; every later failure is returned as is.
    pub async fn execute(&self, action: &WriteAction) -> Result<WriteReceipt, ClassifiedError> {
        if !self.settings.enabled {
            return Err(ClassifiedError::writes_disabled());
        }
        let from = self.settings.signer_address.as_deref().ok_or_else(|| {
            ClassifiedError::new(
                ErrorCategory::Unclassified,
                "SIGNER_ADDRESS is not configured for direct writes",
            )
        })?;

        let method = action.method();
        let args = action.ordered_args();

        let estimate = match self.ledger.estimate_gas(method, &args, from).await {
            Ok(gas) => Some(gas),
            Err(e) => {
                let classified = classify(&e);
                warn!(
                    method,
                    category = ?classified.category,
                    error = %classified.message,
                    default_gas_limit = self.settings.default_gas_limit,
                    "gas estimation failed, using default gas limit"
                );
                None
            }
        };
        let gas_limit = submission_gas_limit(estimate, self.settings.default_gas_limit);

        let request = WriteRequest {
            method: method.to_string(),
            args,
            from: from.to_string(),
            gas_limit,
            gas_price_wei: self.settings.gas_price_wei,
        };
        let tx_hash = self
            .ledger
            .send_transaction(&request)
            .await
            .map_err(|e| classify(&e))?;
        let receipt = self
            .ledger
            .wait_for_receipt(&tx_hash)
            .await
            .map_err(|e| classify(&e))?;

        if !receipt.success {
            return Err(classify(&RawLedgerError::new(format!(
                "transaction {} reverted on-chain in block {}",
                receipt.tx_hash, receipt.block_number
            ))));
        }

        info!(
            method,
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction confirmed"
        );
        Ok(WriteReceipt {
            explorer_url: format!("{}/tx/{}", self.explorer_base_url, receipt.tx_hash),
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_limit_is_estimate_times_1_3_rounded_up() {
        assert_eq!(submission_gas_limit(Some(100_000), 500_000), 130_000);
        assert_eq!(submission_gas_limit(Some(21_001), 500_000), 27_302);
        assert_eq!(submission_gas_limit(Some(1), 500_000), 2);
        assert_eq!(submission_gas_limit(Some(0), 500_000), 0);
    }

    #[test]
    fn gas_limit_falls_back_to_default_without_estimate() {
        assert_eq!(submission_gas_limit(None, 500_000), 500_000);
    }

    #[test]
    fn gas_limit_saturates() {
        assert_eq!(submission_gas_limit(Some(u64::MAX), 1), u64::MAX);
    }

    #[test]
    fn prepare_keeps_contract_argument_order() {
        let action = WriteAction::RegisterMedicineBatch {
            batch_id: "BATCH-001".into(),
            medicine_name: "Amoxicillin 500mg".into(),
            manufacturing_date: 1_700_000_000,
            expiry_date: 1_800_000_000,
        };
        let tx = prepare("0x5FbDB2315678afecb367f032d93F642f64180aa3", &action);
        assert_eq!(tx.method_name, "registerMedicineBatch");
        assert_eq!(
            tx.ordered_args,
            vec![
                json!("BATCH-001"),
                json!("Amoxicillin 500mg"),
                json!(1_700_000_000u64),
                json!(1_800_000_000u64)
            ]
        );

        let wire = serde_json::to_value(&tx).unwrap();
        assert_eq!(wire["targetContractRef"], "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        assert_eq!(wire["methodName"], "registerMedicineBatch");
    }

    #[test]
    fn actions_deserialize_from_method_and_args() {
        let action: WriteAction = serde_json::from_value(json!({
            "method": "markBatchRecalled",
            "args": { "batchId": "BATCH-001" }
        }))
        .unwrap();
        assert_eq!(
            action,
            WriteAction::MarkBatchRecalled {
                batch_id: "BATCH-001".into()
            }
        );
    }
}
