use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::extract::{self, field};
use crate::domain::errors::ClassifiedError;

const KIND: &str = "manufacturer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManufacturerStatus {
    ActiveVerified,
    ActiveUnverified,
    InactiveVerified,
    InactiveUnverified,
    /// Only carried by the degraded enumeration placeholder.
    EnumerationLimited,
}

impl ManufacturerStatus {
    pub fn derive(is_active: bool, is_verified: bool) -> Self {
        match (is_active, is_verified) {
            (true, true) => Self::ActiveVerified,
            (true, false) => Self::ActiveUnverified,
            (false, true) => Self::InactiveVerified,
            (false, false) => Self::InactiveUnverified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerRecord {
    pub address: String,
    pub name: String,
    pub license: String,
    pub email: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub registered_at: u64,
    pub registered_at_formatted: String,
    pub status: ManufacturerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ManufacturerRecord {
    /// Normalizes a `getManufacturer` result.
    ///
    /// Layout: `[address, name, license, email, isVerified, isActive, registeredAt]`.
    /// A missing or zero address means the ledger has no such manufacturer.
    pub fn from_raw(raw: &JsonValue) -> Result<Self, ClassifiedError> {
        let address = field(raw, 0, "address")
            .and_then(extract::as_address)
            .filter(|a| !extract::is_zero_address(a))
            .ok_or_else(|| ClassifiedError::not_found("Manufacturer not found on the ledger"))?;

        let text = |index: usize, name: &str| {
            field(raw, index, name)
                .and_then(extract::as_string)
                .ok_or_else(|| ClassifiedError::malformed(KIND, name))
        };
        let flag = |index: usize, name: &str| {
            field(raw, index, name)
                .and_then(extract::as_bool)
                .ok_or_else(|| ClassifiedError::malformed(KIND, name))
        };

        let name = text(1, "name")?;
        let license = text(2, "license")?;
        let email = text(3, "email")?;
        let is_verified = flag(4, "isVerified")?;
        let is_active = flag(5, "isActive")?;
        let registered_at = field(raw, 6, "registeredAt")
            .and_then(extract::as_u64)
            .ok_or_else(|| ClassifiedError::malformed(KIND, "registeredAt"))?;

        Ok(Self {
            address,
            name,
            license,
            email,
            is_verified,
            is_active,
            registered_at,
            registered_at_formatted: extract::format_epoch(registered_at),
            status: ManufacturerStatus::derive(is_active, is_verified),
            total_count: None,
            note: None,
        })
    }

    /// Stand-in returned when no enumeration strategy worked but the total is known.
    pub fn enumeration_limited(total_count: u64, contract_address: &str) -> Self {
        Self {
            address: contract_address.to_string(),
            name: "Manufacturer list unavailable".to_string(),
            license: String::new(),
            email: String::new(),
            is_verified: false,
            is_active: false,
            registered_at: 0,
            registered_at_formatted: extract::format_epoch(0),
            status: ManufacturerStatus::EnumerationLimited,
            total_count: Some(total_count),
            note: Some(format!(
                "{} manufacturers are registered, but the deployed contract cannot list them; \
                 full enumeration requires a contract upgrade",
                total_count
            )),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == ManufacturerStatus::EnumerationLimited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorCategory;
    use serde_json::json;

    const ACME: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    #[test]
    fn status_covers_all_four_combinations_exactly_once() {
        let mut seen = std::collections::HashSet::new();
        for is_active in [true, false] {
            for is_verified in [true, false] {
                let status = ManufacturerStatus::derive(is_active, is_verified);
                assert_ne!(status, ManufacturerStatus::EnumerationLimited);
                assert!(seen.insert(status));
            }
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(
            ManufacturerStatus::derive(false, true),
            ManufacturerStatus::InactiveVerified
        );
    }

    #[test]
    fn tuple_result_becomes_active_verified_record() {
        let raw = json!([ACME, "Acme", "LIC-1", "a@acme.com", true, true, 1700000000]);
        let m = ManufacturerRecord::from_raw(&raw).unwrap();
        assert_eq!(m.status, ManufacturerStatus::ActiveVerified);
        assert_eq!(m.registered_at_formatted, "2023-11-14T22:13:20Z");

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["status"], "active_verified");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn positional_and_named_shapes_serialize_identically() {
        let positional = json!([
            ACME.to_lowercase(),
            "Acme",
            "LIC-1",
            "a@acme.com",
            false,
            true,
            "1700000000"
        ]);
        let named = json!({
            "address": ACME,
            "name": "Acme",
            "license": "LIC-1",
            "email": "a@acme.com",
            "isVerified": "false",
            "isActive": true,
            "registeredAt": 1700000000
        });
        let a = serde_json::to_vec(&ManufacturerRecord::from_raw(&positional).unwrap()).unwrap();
        let b = serde_json::to_vec(&ManufacturerRecord::from_raw(&named).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_address_is_not_found() {
        let raw = json!([
            "0x0000000000000000000000000000000000000000",
            "",
            "",
            "",
            false,
            false,
            0
        ]);
        let err = ManufacturerRecord::from_raw(&raw).unwrap_err();
        assert_eq!(err.category, ErrorCategory::NotFound);
    }

    #[test]
    fn missing_field_fails_instead_of_returning_partial_record() {
        let raw = json!({ "address": ACME, "name": "Acme" });
        let err = ManufacturerRecord::from_raw(&raw).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unclassified);
        assert!(err.message.contains("license"));
    }

    #[test]
    fn placeholder_carries_count_and_note() {
        let p = ManufacturerRecord::enumeration_limited(12, ACME);
        assert!(p.is_placeholder());
        assert_eq!(p.total_count, Some(12));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["status"], "enumeration_limited");
        assert!(json["note"].as_str().unwrap().contains("contract upgrade"));
    }
}
