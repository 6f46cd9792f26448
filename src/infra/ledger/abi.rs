//! Contract interface and the JSON <-> ABI conversions used by the RPC client.
//!
//! Arguments travel through the service as JSON (the same values that end up
//! in a `TransactionDescriptor`), so encoding coerces each JSON value to the
//! parameter's Solidity type, and decoding renders results back into JSON.

use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Event, Function};
use alloy_primitives::B256;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use super::client::RawLedgerError;

const FUNCTIONS: &[&str] = &[
    // reads
    "function admin() returns (address)",
    "function getManufacturer(address manufacturer) returns (address, string, string, string, bool, bool, uint256)",
    "function getContractStats() returns (uint256, uint256, uint256, uint256)",
    "function verifyBatch(string batchId) returns (string, string, address, uint256, uint256, bool, bool, uint256, uint256)",
    "function isBatchValid(string batchId) returns (bool)",
    "function isBatchExpired(string batchId) returns (bool)",
    "function getBatchesByManufacturer(address manufacturer) returns (string[])",
    "function getExpiredMedicineReports() returns (string[], address[], uint256[])",
    "function getAllManufacturerAddresses() returns (address[])",
    // writes
    "function registerManufacturer(address manufacturer, string name, string license, string email)",
    "function verifyManufacturer(address manufacturer)",
    "function deactivateManufacturer(address manufacturer)",
    "function registerMedicineBatch(string batchId, string medicineName, uint256 manufacturingDate, uint256 expiryDate)",
    "function markBatchRecalled(string batchId)",
    "function recordExpiredScan(string batchId)",
];

const REGISTRATION_EVENT: &str =
    "event ManufacturerRegistered(address indexed manufacturer, string name, uint256 timestamp)";

/// `Error(string)`
const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// `Panic(uint256)`
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

pub struct ContractAbi {
    functions: HashMap<String, Function>,
    registration_topic: B256,
}

impl ContractAbi {
    pub fn new() -> anyhow::Result<Self> {
        let mut functions = HashMap::new();
        for sig in FUNCTIONS {
            let f = Function::parse(sig)
                .map_err(|e| anyhow::anyhow!("invalid ABI signature '{}': {}", sig, e))?;
            functions.insert(f.name.clone(), f);
        }
        let event = Event::parse(REGISTRATION_EVENT)
            .map_err(|e| anyhow::anyhow!("invalid event signature: {}", e))?;
        Ok(Self {
            functions,
            registration_topic: event.selector(),
        })
    }

    pub fn registration_topic(&self) -> B256 {
        self.registration_topic
    }

    fn function(&self, method: &str) -> Result<&Function, RawLedgerError> {
        self.functions
            .get(method)
            .ok_or_else(|| RawLedgerError::new(format!("method not found: {}", method)))
    }

    /// Selector + ABI-encoded arguments.
    pub fn encode_call(&self, method: &str, args: &[JsonValue]) -> Result<Vec<u8>, RawLedgerError> {
        let function = self.function(method)?;
        if function.inputs.len() != args.len() {
            return Err(RawLedgerError::new(format!(
                "{} expects {} arguments, got {}",
                method,
                function.inputs.len(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for (param, arg) in function.inputs.iter().zip(args) {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| RawLedgerError::new(format!("unsupported parameter type: {}", e)))?;
            values.push(json_to_sol(&ty, arg).map_err(|e| {
                RawLedgerError::new(format!("invalid argument '{}' for {}: {}", param.name, method, e))
            })?);
        }

        function
            .abi_encode_input(&values)
            .map_err(|e| RawLedgerError::new(format!("failed to encode {}: {}", method, e)))
    }

    /// Decodes return data. Single-output methods yield the bare value,
    /// everything else a positional array.
    pub fn decode_output(&self, method: &str, data: &[u8]) -> Result<JsonValue, RawLedgerError> {
        let function = self.function(method)?;
        if data.is_empty() && !function.outputs.is_empty() {
            return Err(RawLedgerError::new(format!(
                "call to {} returned no data (method may not exist on this contract version)",
                method
            )));
        }

        let mut decoded = function
            .abi_decode_output(data, true)
            .map_err(|e| RawLedgerError::new(format!("failed to decode {} result: {}", method, e)))?;

        if decoded.len() == 1 {
            Ok(sol_to_json(&decoded.remove(0)))
        } else {
            Ok(JsonValue::Array(decoded.iter().map(sol_to_json).collect()))
        }
    }
}

fn json_to_sol(ty: &DynSolType, v: &JsonValue) -> Result<DynSolValue, String> {
    match (ty, v) {
        (DynSolType::Bool, JsonValue::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (DynSolType::Array(inner), JsonValue::Array(items)) => items
            .iter()
            .map(|item| json_to_sol(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (_, JsonValue::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, JsonValue::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, JsonValue::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        (_, other) => Err(format!("cannot encode {} as {}", other, ty.sol_type_name())),
    }
}

/// Integers that fit in a u64 become JSON numbers, larger ones decimal strings.
pub fn sol_to_json(v: &DynSolValue) -> JsonValue {
    match v {
        DynSolValue::Bool(b) => JsonValue::Bool(*b),
        DynSolValue::Uint(u, _) => {
            if u.bit_len() <= 64 {
                JsonValue::from(u.to::<u64>())
            } else {
                JsonValue::String(u.to_string())
            }
        }
        DynSolValue::Int(i, _) => {
            let text = i.to_string();
            match text.parse::<i64>() {
                Ok(n) => JsonValue::from(n),
                Err(_) => JsonValue::String(text),
            }
        }
        DynSolValue::Address(a) => JsonValue::String(a.to_checksum(None)),
        DynSolValue::String(s) => JsonValue::String(s.clone()),
        DynSolValue::Bytes(b) => JsonValue::String(format!("0x{}", hex::encode(b))),
        DynSolValue::FixedBytes(word, size) => {
            JsonValue::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            JsonValue::Array(items.iter().map(sol_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => JsonValue::String(format!("{:?}", other)),
    }
}

/// Extracts a human-readable reason from revert data, if it is a standard
/// `Error(string)` or `Panic(uint256)` payload.
pub fn decode_revert_data(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (selector, body) = data.split_at(4);
    if selector == REVERT_SELECTOR {
        match DynSolType::String.abi_decode(body) {
            Ok(DynSolValue::String(reason)) => Some(reason),
            _ => None,
        }
    } else if selector == PANIC_SELECTOR {
        match DynSolType::Uint(256).abi_decode(body) {
            Ok(DynSolValue::Uint(code, _)) => Some(format!("panic code 0x{:x}", code)),
            _ => None,
        }
    } else {
        None
    }
}
