//! Responsible for all communication with the ledger node over JSON-RPC.

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::abi::{decode_revert_data, ContractAbi};
use super::client::{LedgerClient, RawLedgerError, RegistrationEvent, TxReceipt, WriteRequest};
use crate::infra::config::LedgerConfig;

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<JsonValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    block_number: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    gas_used: String,
    #[serde(default)]
    status: Option<String>,
}

impl RpcErrorObject {
    /// Spreads the node's error object over the fields the classifier reads.
    fn into_raw(self) -> RawLedgerError {
        let mut raw = RawLedgerError::new(self.message);
        match self.data {
            Some(JsonValue::String(hex_data)) => {
                if let Some(reason) = decode_hex(&hex_data).ok().and_then(|b| decode_revert_data(&b)) {
                    raw = raw.with_reason(reason);
                }
            }
            Some(JsonValue::Object(map)) => {
                if let Some(msg) = map.get("message").and_then(|v| v.as_str()) {
                    raw = raw.with_data_message(msg);
                }
                let nested = map
                    .get("data")
                    .and_then(|v| v.as_str())
                    .and_then(|h| decode_hex(h).ok())
                    .and_then(|b| decode_revert_data(&b));
                if let Some(reason) = nested {
                    raw = raw.with_reason(reason);
                }
            }
            _ => {}
        }
        debug!(code = self.code, message = %raw.message, "ledger node returned an error");
        raw
    }
}

/// Ledger client speaking Ethereum JSON-RPC to a single node.
///
/// Writes go through `eth_sendTransaction`, so the signing account must be
/// managed by the node.
pub struct JsonRpcLedger {
    http: reqwest::Client,
    rpc_url: String,
    contract: Address,
    abi: ContractAbi,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    pub fn new(config: &LedgerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.rpc_timeout)
            .build()?;
        let contract = Address::from_str(&config.contract_address).map_err(|e| {
            anyhow::anyhow!("CONTRACT_ADDRESS is not a valid address: {}", e)
        })?;

        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            contract,
            abi: ContractAbi::new()?,
            poll_interval: config.receipt_poll_interval,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn contract_address(&self) -> String {
        self.contract.to_checksum(None)
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64, RawLedgerError> {
        let hex_id: String = self.rpc("eth_chainId", json!([])).await?;
        parse_quantity(&hex_id)
    }

    /// Size of the deployed bytecode at the contract address (0 means nothing is deployed).
    pub async fn contract_code_len(&self) -> Result<usize, RawLedgerError> {
        let code: String = self
            .rpc("eth_getCode", json!([self.contract_address(), "latest"]))
            .await?;
        Ok(decode_hex(&code)?.len())
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: JsonValue) -> Result<T, RawLedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.rpc_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RawLedgerError::new(format!(
                "network error: ledger node answered {} to {}",
                status, method
            )));
        }

        let envelope: RpcResponse = response.json().await?;
        if let Some(err) = envelope.error {
            return Err(err.into_raw());
        }

        serde_json::from_value(envelope.result.unwrap_or(JsonValue::Null)).map_err(|e| {
            RawLedgerError::new(format!("unexpected {} response: {}", method, e))
        })
    }

    fn call_object(&self, method: &str, args: &[JsonValue]) -> Result<serde_json::Map<String, JsonValue>, RawLedgerError> {
        let data = self.abi.encode_call(method, args)?;
        let mut obj = serde_json::Map::new();
        obj.insert("to".into(), JsonValue::String(self.contract_address()));
        obj.insert("data".into(), JsonValue::String(format!("0x{}", hex::encode(data))));
        Ok(obj)
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn call(&self, method: &str, args: &[JsonValue]) -> Result<JsonValue, RawLedgerError> {
        let call = self.call_object(method, args)?;
        let result: String = self.rpc("eth_call", json!([call, "latest"])).await?;
        self.abi.decode_output(method, &decode_hex(&result)?)
    }

    async fn latest_block(&self) -> Result<u64, RawLedgerError> {
        let n: String = self.rpc("eth_blockNumber", json!([])).await?;
        parse_quantity(&n)
    }

    async fn registration_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RegistrationEvent>, RawLedgerError> {
        let filter = json!({
            "address": self.contract_address(),
            "topics": [format!("0x{}", hex::encode(self.abi.registration_topic()))],
            "fromBlock": format!("{:#x}", from_block),
            "toBlock": format!("{:#x}", to_block),
        });
        let logs: Vec<RpcLog> = self.rpc("eth_getLogs", json!([filter])).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            // topic[1] is the indexed manufacturer address, left-padded to 32 bytes.
            let Some(topic) = log.topics.get(1) else {
                debug!("skipping registration log without indexed manufacturer");
                continue;
            };
            let word = decode_hex(topic)?;
            if word.len() != 32 {
                debug!(topic = %topic, "skipping registration log with malformed topic");
                continue;
            }
            let manufacturer = Address::from_slice(&word[12..]).to_checksum(None);
            let block_number = match log.block_number.as_deref() {
                Some(n) => parse_quantity(n)?,
                None => 0,
            };
            events.push(RegistrationEvent {
                manufacturer,
                block_number,
            });
        }
        Ok(events)
    }

    async fn estimate_gas(
        &self,
        method: &str,
        args: &[JsonValue],
        from: &str,
    ) -> Result<u64, RawLedgerError> {
        let mut call = self.call_object(method, args)?;
        call.insert("from".into(), JsonValue::String(from.to_string()));
        let gas: String = self.rpc("eth_estimateGas", json!([call])).await?;
        parse_quantity(&gas)
    }

    async fn send_transaction(&self, request: &WriteRequest) -> Result<String, RawLedgerError> {
        let mut tx = self.call_object(&request.method, &request.args)?;
        tx.insert("from".into(), JsonValue::String(request.from.clone()));
        tx.insert("gas".into(), JsonValue::String(format!("{:#x}", request.gas_limit)));
        tx.insert(
            "gasPrice".into(),
            JsonValue::String(format!("{:#x}", request.gas_price_wei)),
        );
        let tx_hash: String = self.rpc("eth_sendTransaction", json!([tx])).await?;
        info!(method = %request.method, tx_hash = %tx_hash, "transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RawLedgerError> {
        loop {
            let receipt: Option<RpcReceipt> = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(r) = receipt {
                if let Some(block) = r.block_number.as_deref() {
                    return Ok(TxReceipt {
                        tx_hash: r.transaction_hash,
                        block_number: parse_quantity(block)?,
                        gas_used: parse_quantity(&r.gas_used)?,
                        success: receipt_succeeded(r.status.as_deref()),
                    });
                }
            } else {
                // No receipt yet; make sure the node still knows the transaction.
                let pending: Option<JsonValue> = self
                    .rpc("eth_getTransactionByHash", json!([tx_hash]))
                    .await?;
                if pending.is_none() {
                    return Err(RawLedgerError::new(format!(
                        "transaction {} was dropped before confirmation",
                        tx_hash
                    )));
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Post-Byzantium receipts carry `status` (`0x1` success, `0x0` reverted).
/// Older receipts have none and are treated as successful.
fn receipt_succeeded(status: Option<&str>) -> bool {
    status.map_or(true, |s| parse_quantity(s) == Ok(1))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, RawLedgerError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| RawLedgerError::new(format!("invalid hex from ledger node: {}", e)))
}

fn parse_quantity(s: &str) -> Result<u64, RawLedgerError> {
    let digits = s.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| RawLedgerError::new(format!("invalid quantity '{}' from ledger node: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x0"), Ok(0));
        assert_eq!(parse_quantity("0x1a"), Ok(26));
        assert_eq!(parse_quantity("0x"), Ok(0));
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn receipt_status_maps_to_success() {
        assert!(receipt_succeeded(Some("0x1")));
        assert!(!receipt_succeeded(Some("0x0")));
        assert!(!receipt_succeeded(Some("0xzz")));
        assert!(receipt_succeeded(None));
    }

    #[test]
    fn node_error_with_revert_data_yields_a_reason() {
        // Error(string) payload for "Manufacturer not registered"
        let mut payload = vec![0x08, 0xc3, 0x79, 0xa0];
        payload.extend(
            alloy_dyn_abi::DynSolValue::String("Manufacturer not registered".into()).abi_encode(),
        );
        let err = RpcErrorObject {
            code: 3,
            message: "execution reverted: Manufacturer not registered".into(),
            data: Some(JsonValue::String(format!("0x{}", hex::encode(payload)))),
        }
        .into_raw();

        assert_eq!(err.reason.as_deref(), Some("Manufacturer not registered"));
        assert_eq!(err.message, "execution reverted: Manufacturer not registered");
    }

    #[test]
    fn node_error_with_nested_message_fills_data_message() {
        let err = RpcErrorObject {
            code: -32000,
            message: "Internal JSON-RPC error.".into(),
            data: Some(json!({ "message": "insufficient funds for gas * price + value" })),
        }
        .into_raw();

        assert_eq!(
            err.data_message.as_deref(),
            Some("insufficient funds for gas * price + value")
        );
        assert!(err.reason.is_none());
    }
}
