use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::extract::{self, field};
use crate::domain::errors::ClassifiedError;

const KIND: &str = "batch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub batch_id: String,
    pub medicine_name: String,
    pub manufacturer_address: String,
    pub manufacturing_date: u64,
    pub manufacturing_date_formatted: String,
    pub expiry_date: u64,
    pub expiry_date_formatted: String,
    pub is_active: bool,
    pub is_recalled: bool,
    pub created_at: u64,
    pub created_at_formatted: String,
    pub expired_scan_count: u64,
}

impl BatchRecord {
    /// Normalizes a `verifyBatch` result.
    ///
    /// Layout: `[batchId, medicineName, manufacturerAddress, manufacturingDate,
    /// expiryDate, isActive, isRecalled, createdAt, expiredScanCount]`.
    pub fn from_raw(raw: &JsonValue) -> Result<Self, ClassifiedError> {
        let batch_id = field(raw, 0, "batchId")
            .and_then(extract::as_string)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ClassifiedError::not_found("Batch not found on the ledger"))?;

        let number = |index: usize, name: &str| {
            field(raw, index, name)
                .and_then(extract::as_u64)
                .ok_or_else(|| ClassifiedError::malformed(KIND, name))
        };
        let flag = |index: usize, name: &str| {
            field(raw, index, name)
                .and_then(extract::as_bool)
                .ok_or_else(|| ClassifiedError::malformed(KIND, name))
        };

        let medicine_name = field(raw, 1, "medicineName")
            .and_then(extract::as_string)
            .ok_or_else(|| ClassifiedError::malformed(KIND, "medicineName"))?;
        let manufacturer_address = field(raw, 2, "manufacturerAddress")
            .and_then(extract::as_address)
            .ok_or_else(|| ClassifiedError::malformed(KIND, "manufacturerAddress"))?;
        let manufacturing_date = number(3, "manufacturingDate")?;
        let expiry_date = number(4, "expiryDate")?;
        let is_active = flag(5, "isActive")?;
        let is_recalled = flag(6, "isRecalled")?;
        let created_at = number(7, "createdAt")?;
        let expired_scan_count = number(8, "expiredScanCount")?;

        Ok(Self {
            batch_id,
            medicine_name,
            manufacturer_address,
            manufacturing_date,
            manufacturing_date_formatted: extract::format_epoch(manufacturing_date),
            expiry_date,
            expiry_date_formatted: extract::format_epoch(expiry_date),
            is_active,
            is_recalled,
            created_at,
            created_at_formatted: extract::format_epoch(created_at),
            expired_scan_count,
        })
    }
}

/// A batch together with the contract's own validity and expiry verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchVerification {
    pub batch: BatchRecord,
    pub is_valid: bool,
    pub is_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredScanReport {
    pub batch_id: String,
    pub reporter: String,
    pub reported_at: u64,
    pub reported_at_formatted: String,
}

impl ExpiredScanReport {
    /// Normalizes `getExpiredMedicineReports`, which returns three parallel
    /// arrays: `[batchIds, reporters, timestamps]`.
    pub fn list_from_raw(raw: &JsonValue) -> Result<Vec<Self>, ClassifiedError> {
        const REPORT: &str = "expired scan report";

        let batch_ids = field(raw, 0, "batchIds")
            .and_then(extract::as_string_list)
            .ok_or_else(|| ClassifiedError::malformed(REPORT, "batchIds"))?;
        let reporters = field(raw, 1, "reporters")
            .and_then(extract::as_address_list)
            .ok_or_else(|| ClassifiedError::malformed(REPORT, "reporters"))?;
        let timestamps = field(raw, 2, "timestamps")
            .and_then(extract::as_u64_list)
            .ok_or_else(|| ClassifiedError::malformed(REPORT, "timestamps"))?;

        if reporters.len() != batch_ids.len() {
            return Err(ClassifiedError::malformed(REPORT, "reporters"));
        }
        if timestamps.len() != batch_ids.len() {
            return Err(ClassifiedError::malformed(REPORT, "timestamps"));
        }

        Ok(batch_ids
            .into_iter()
            .zip(reporters)
            .zip(timestamps)
            .map(|((batch_id, reporter), reported_at)| Self {
                batch_id,
                reporter,
                reported_at,
                reported_at_formatted: extract::format_epoch(reported_at),
            })
            .collect())
    }
}
