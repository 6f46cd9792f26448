use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::extract::{self, field};
use crate::domain::errors::ClassifiedError;

const KIND: &str = "contract stats";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStats {
    pub total_batches: u64,
    pub total_manufacturers: u64,
    pub total_recalled_batches: u64,
    pub total_expired_scans: u64,
    pub admin_address: String,
    pub active_batches: u64,
    /// Percentage with two decimals, e.g. `"12.50"`.
    pub recall_rate: String,
}

impl ContractStats {
    /// Combines the `getContractStats` counters
    /// (`[totalBatches, totalManufacturers, totalRecalledBatches, totalExpiredScans]`)
    /// with the `admin()` result.
    pub fn from_raw(counters: &JsonValue, admin: &JsonValue) -> Result<Self, ClassifiedError> {
        let number = |index: usize, name: &str| {
            field(counters, index, name)
                .and_then(extract::as_u64)
                .ok_or_else(|| ClassifiedError::malformed(KIND, name))
        };

        let total_batches = number(0, "totalBatches")?;
        let total_manufacturers = number(1, "totalManufacturers")?;
        let total_recalled_batches = number(2, "totalRecalledBatches")?;
        let total_expired_scans = number(3, "totalExpiredScans")?;
        let admin_address = extract::as_address(admin)
            .ok_or_else(|| ClassifiedError::malformed(KIND, "adminAddress"))?;

        Ok(Self {
            total_batches,
            total_manufacturers,
            total_recalled_batches,
            total_expired_scans,
            admin_address,
            active_batches: total_batches.saturating_sub(total_recalled_batches),
            recall_rate: recall_rate(total_recalled_batches, total_batches),
        })
    }
}

/// Half-up rounding in basis points; exact ties go up (1 of 32 is `"3.13"`).
fn recall_rate(recalled: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    let total = total as u128;
    let basis_points = (recalled as u128 * 10_000 + total / 2) / total;
    format!("{}.{:02}", basis_points / 100, basis_points % 100)
}
