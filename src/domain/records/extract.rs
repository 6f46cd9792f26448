//! Index-then-name field access over raw read results.
//!
//! A raw result is either a positional JSON array or a JSON object keyed by
//! field name. Objects produced by ethers-style serializers carry both the
//! numeric keys ("0", "1", ...) and the names, so the positional lookup also
//! tries the stringified index on objects before falling back to the name.

use alloy_primitives::Address;
use chrono::{DateTime, SecondsFormat};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Formatted-date sentinel for epoch 0.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Positional slot first, then the named field.
pub fn field<'a>(raw: &'a JsonValue, index: usize, name: &str) -> Option<&'a JsonValue> {
    let positional = match raw {
        JsonValue::Array(items) => items.get(index),
        JsonValue::Object(map) => map.get(&index.to_string()),
        _ => None,
    };
    positional
        .filter(|v| !v.is_null())
        .or_else(|| raw.as_object().and_then(|m| m.get(name)).filter(|v| !v.is_null()))
}

pub fn as_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn as_bool(v: &JsonValue) -> Option<bool> {
    match v {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Accepts JSON numbers, decimal strings and `0x` hex strings.
pub fn as_u64(v: &JsonValue) -> Option<u64> {
    match v {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x") {
                Some(hex_digits) => u64::from_str_radix(hex_digits, 16).ok(),
                None => s.parse::<u64>().ok(),
            }
        }
        _ => None,
    }
}

/// Parses an address and renders it EIP-55 checksummed.
pub fn as_address(v: &JsonValue) -> Option<String> {
    let s = v.as_str()?;
    Address::from_str(s.trim()).ok().map(|a| a.to_checksum(None))
}

pub fn is_zero_address(address: &str) -> bool {
    Address::from_str(address)
        .map(|a| a == Address::ZERO)
        .unwrap_or(false)
}

pub fn as_string_list(v: &JsonValue) -> Option<Vec<String>> {
    v.as_array()?.iter().map(as_string).collect()
}

pub fn as_address_list(v: &JsonValue) -> Option<Vec<String>> {
    v.as_array()?.iter().map(as_address).collect()
}

pub fn as_u64_list(v: &JsonValue) -> Option<Vec<u64>> {
    v.as_array()?.iter().map(as_u64).collect()
}

/// RFC 3339 UTC with second precision, or [`UNKNOWN_DATE`] for epoch 0.
pub fn format_epoch(epoch: u64) -> String {
    if epoch == 0 {
        return UNKNOWN_DATE.to_string();
    }
    i64::try_from(epoch)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positional_index_is_tried_before_the_name() {
        let raw = json!({ "0": "by-index", "name": "by-name" });
        assert_eq!(field(&raw, 0, "name"), Some(&json!("by-index")));

        let raw = json!({ "name": "by-name" });
        assert_eq!(field(&raw, 0, "name"), Some(&json!("by-name")));

        let raw = json!(["by-index"]);
        assert_eq!(field(&raw, 0, "name"), Some(&json!("by-index")));
        assert_eq!(field(&raw, 3, "name"), None);
    }

    #[test]
    fn null_slots_fall_back_to_the_name() {
        let raw = json!({ "1": null, "license": "LIC-1" });
        assert_eq!(field(&raw, 1, "license"), Some(&json!("LIC-1")));
    }

    #[test]
    fn integers_accept_numbers_decimal_and_hex() {
        assert_eq!(as_u64(&json!(1700000000)), Some(1_700_000_000));
        assert_eq!(as_u64(&json!("1700000000")), Some(1_700_000_000));
        assert_eq!(as_u64(&json!("0x6553f100")), Some(1_700_000_000));
        assert_eq!(as_u64(&json!(-1)), None);
        assert_eq!(as_u64(&json!(true)), None);
    }

    #[test]
    fn addresses_are_checksummed() {
        let lower = json!("0x5fbdb2315678afecb367f032d93f642f64180aa3");
        assert_eq!(
            as_address(&lower).as_deref(),
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")
        );
        assert_eq!(as_address(&json!("not-an-address")), None);
        assert!(is_zero_address("0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn epoch_formatting() {
        assert_eq!(format_epoch(0), "Unknown");
        assert_eq!(format_epoch(1_700_000_000), "2023-11-14T22:13:20Z");
    }
}
