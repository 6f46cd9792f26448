//! Single-entity reads: one or more ledger calls, normalized through the
//! record adapter, failures classified.

use serde_json::{json, Value as JsonValue};

use crate::domain::errors::{classify, ClassifiedError};
use crate::domain::records::extract;
use crate::domain::records::{
    BatchRecord, BatchVerification, ContractStats, ExpiredScanReport, ManufacturerRecord,
};
use crate::infra::ledger::LedgerClient;

async fn call<L>(ledger: &L, method: &str, args: &[JsonValue]) -> Result<JsonValue, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    ledger.call(method, args).await.map_err(|e| classify(&e))
}

/// Some bindings wrap single return values in a one-element array.
fn unwrap_single(raw: &JsonValue) -> &JsonValue {
    match raw {
        JsonValue::Array(items) if items.len() == 1 && items[0].is_array() => &items[0],
        JsonValue::Array(items) if items.len() == 1 && items[0].is_boolean() => &items[0],
        _ => raw,
    }
}

fn bool_result(raw: &JsonValue, method: &str) -> Result<bool, ClassifiedError> {
    extract::as_bool(unwrap_single(raw)).ok_or_else(|| ClassifiedError::malformed(method, "result"))
}

pub async fn manufacturer<L>(ledger: &L, address: &str) -> Result<ManufacturerRecord, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let raw = call(ledger, "getManufacturer", &[json!(address)]).await?;
    ManufacturerRecord::from_raw(&raw)
}

pub async fn batch<L>(ledger: &L, batch_id: &str) -> Result<BatchRecord, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let raw = call(ledger, "verifyBatch", &[json!(batch_id)]).await?;
    BatchRecord::from_raw(&raw)
}

/// The batch record plus `isBatchValid` and `isBatchExpired`, read concurrently.
pub async fn batch_verification<L>(
    ledger: &L,
    batch_id: &str,
) -> Result<BatchVerification, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let args = [json!(batch_id)];
    let (record, valid, expired) = tokio::try_join!(
        batch(ledger, batch_id),
        call(ledger, "isBatchValid", &args),
        call(ledger, "isBatchExpired", &args),
    )?;

    Ok(BatchVerification {
        batch: record,
        is_valid: bool_result(&valid, "isBatchValid")?,
        is_expired: bool_result(&expired, "isBatchExpired")?,
    })
}

/// Counters and admin address, read concurrently.
pub async fn contract_stats<L>(ledger: &L) -> Result<ContractStats, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let (counters, admin) = tokio::try_join!(
        call(ledger, "getContractStats", &[]),
        call(ledger, "admin", &[]),
    )?;
    ContractStats::from_raw(&counters, unwrap_single(&admin))
}

pub async fn batches_by_manufacturer<L>(ledger: &L, address: &str) -> Result<Vec<String>, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let raw = call(ledger, "getBatchesByManufacturer", &[json!(address)]).await?;
    extract::as_string_list(unwrap_single(&raw))
        .ok_or_else(|| ClassifiedError::malformed("batch list", "batchIds"))
}

pub async fn expired_scan_reports<L>(ledger: &L) -> Result<Vec<ExpiredScanReport>, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let raw = call(ledger, "getExpiredMedicineReports", &[]).await?;
    ExpiredScanReport::list_from_raw(&raw)
}

/// Tier-1 enumeration primitive. Absent on older contract versions.
pub async fn all_manufacturer_addresses<L>(ledger: &L) -> Result<Vec<String>, ClassifiedError>
where
    L: LedgerClient + ?Sized,
{
    let raw = call(ledger, "getAllManufacturerAddresses", &[]).await?;
    extract::as_address_list(unwrap_single(&raw))
        .ok_or_else(|| ClassifiedError::malformed("manufacturer list", "addresses"))
}
