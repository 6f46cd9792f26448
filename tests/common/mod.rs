//! Scripted in-memory ledger shared by the integration tests.
//!
//! Every trait method records itself in `log` before answering, so tests can
//! assert both on results and on which ledger calls were (not) made.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use medchain_ledger::infra::config::WriteSettings;
use medchain_ledger::infra::ledger::{
    LedgerClient, RawLedgerError, RegistrationEvent, TxReceipt, WriteRequest,
};
use medchain_ledger::{LedgerService, ServiceConfig};

pub const CONTRACT: &str = "0x5555555555555555555555555555555555555555";
pub const SIGNER: &str = "0x8888888888888888888888888888888888888888";
pub const EXPLORER: &str = "https://sepolia.etherscan.io";

type Scripted<T> = Result<T, RawLedgerError>;

/// Digit-only addresses so the checksummed form equals the input.
pub fn addr(n: u8) -> String {
    assert!((1..=9).contains(&n));
    format!("0x{}", n.to_string().repeat(40))
}

pub fn manufacturer_tuple(address: &str, name: &str, verified: bool, active: bool, registered_at: u64) -> JsonValue {
    json!([
        address,
        name,
        format!("LIC-{}", name.to_uppercase()),
        format!("{}@example.com", name.to_lowercase()),
        verified,
        active,
        registered_at.to_string()
    ])
}

#[derive(Default)]
pub struct MockLedger {
    calls: Mutex<HashMap<String, Scripted<JsonValue>>>,
    manufacturers: Mutex<HashMap<String, Scripted<JsonValue>>>,
    latest_block: Mutex<Option<Scripted<u64>>>,
    events: Mutex<Option<Scripted<Vec<RegistrationEvent>>>>,
    estimate: Mutex<Option<Scripted<u64>>>,
    send: Mutex<Option<Scripted<String>>>,
    receipt: Mutex<Option<Scripted<TxReceipt>>>,

    pub log: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<WriteRequest>>,
    pub event_ranges: Mutex<Vec<(u64, u64)>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call(self, method: &str, response: Scripted<JsonValue>) -> Self {
        self.calls.lock().unwrap().insert(method.to_string(), response);
        self
    }

    pub fn with_manufacturer(self, address: &str, response: Scripted<JsonValue>) -> Self {
        self.manufacturers
            .lock()
            .unwrap()
            .insert(address.to_lowercase(), response);
        self
    }

    pub fn with_latest_block(self, response: Scripted<u64>) -> Self {
        *self.latest_block.lock().unwrap() = Some(response);
        self
    }

    pub fn with_events(self, response: Scripted<Vec<RegistrationEvent>>) -> Self {
        *self.events.lock().unwrap() = Some(response);
        self
    }

    pub fn with_estimate(self, response: Scripted<u64>) -> Self {
        *self.estimate.lock().unwrap() = Some(response);
        self
    }

    pub fn with_send(self, response: Scripted<String>) -> Self {
        *self.send.lock().unwrap() = Some(response);
        self
    }

    pub fn with_receipt(self, response: Scripted<TxReceipt>) -> Self {
        *self.receipt.lock().unwrap() = Some(response);
        self
    }

    /// Stats answer used by the summary tier.
    pub fn with_stats(self, total_batches: u64, total_manufacturers: u64, recalled: u64, scans: u64) -> Self {
        self.with_call(
            "getContractStats",
            Ok(json!([total_batches, total_manufacturers, recalled, scans])),
        )
        .with_call("admin", Ok(json!(addr(9))))
    }

    pub fn total_calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn unscripted(what: &str) -> RawLedgerError {
        RawLedgerError::new(format!("mock ledger has no response for {}", what))
    }

    fn answer<T: Clone>(slot: &Mutex<Option<Scripted<T>>>, what: &str) -> Scripted<T> {
        slot.lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(Self::unscripted(what)))
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn call(&self, method: &str, args: &[JsonValue]) -> Result<JsonValue, RawLedgerError> {
        self.record(format!("call:{}", method));
        if method == "getManufacturer" {
            let key = args
                .first()
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_lowercase();
            return self
                .manufacturers
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Ok(manufacturer_tuple("0x0000000000000000000000000000000000000000", "", false, false, 0)));
        }
        self.calls
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(Self::unscripted(method)))
    }

    async fn latest_block(&self) -> Result<u64, RawLedgerError> {
        self.record("latest_block".to_string());
        Self::answer(&self.latest_block, "latest_block")
    }

    async fn registration_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RegistrationEvent>, RawLedgerError> {
        self.record("registration_events".to_string());
        self.event_ranges.lock().unwrap().push((from_block, to_block));
        Self::answer(&self.events, "registration_events")
    }

    async fn estimate_gas(&self, method: &str, _args: &[JsonValue], _from: &str) -> Result<u64, RawLedgerError> {
        self.record(format!("estimate_gas:{}", method));
        Self::answer(&self.estimate, "estimate_gas")
    }

    async fn send_transaction(&self, request: &WriteRequest) -> Result<String, RawLedgerError> {
        self.record(format!("send_transaction:{}", request.method));
        self.sent.lock().unwrap().push(request.clone());
        Self::answer(&self.send, "send_transaction")
    }

    async fn wait_for_receipt(&self, _tx_hash: &str) -> Result<TxReceipt, RawLedgerError> {
        self.record("wait_for_receipt".to_string());
        Self::answer(&self.receipt, "wait_for_receipt")
    }
}

pub fn service_config(writes_enabled: bool) -> ServiceConfig {
    ServiceConfig {
        contract_address: CONTRACT.to_string(),
        event_scan_window: 50_000,
        explorer_base_url: EXPLORER.to_string(),
        writes: WriteSettings {
            enabled: writes_enabled,
            signer_address: Some(SIGNER.to_string()),
            ..WriteSettings::default()
        },
    }
}

pub fn service(ledger: &Arc<MockLedger>, writes_enabled: bool) -> LedgerService<MockLedger> {
    LedgerService::new(Arc::clone(ledger), service_config(writes_enabled))
}
