//! Maps raw ledger failures onto the [`ErrorCategory`] taxonomy.
//!
//! Message selection order: structured reason, short message, nested data
//! message, revert reason embedded in the raw text, canonical keyword message,
//! and finally the raw text itself. The category comes from the keyword rules,
//! applied to the raw text first so that e.g. "insufficient funds" always wins
//! no matter which field it was reported in.

use regex::Regex;
use std::sync::LazyLock;

use super::{ClassifiedError, ErrorCategory};
use crate::infra::ledger::RawLedgerError;

struct KeywordRule {
    needles: &'static [&'static str],
    category: ErrorCategory,
    message: &'static str,
}

// Order matters. Insufficient funds outranks everything, even when the node
// also mentions a missing or duplicate record. "replacement transaction
// underpriced" must hit the replacement rule before the nonce and underpriced
// rules see it.
const RULES: &[KeywordRule] = &[
    KeywordRule {
        needles: &["insufficient funds"],
        category: ErrorCategory::InsufficientFunds,
        message: "Insufficient funds to pay for gas",
    },
    KeywordRule {
        needles: &["not registered"],
        category: ErrorCategory::NotRegistered,
        message: "Manufacturer is not registered",
    },
    KeywordRule {
        needles: &["not found", "does not exist"],
        category: ErrorCategory::NotFound,
        message: "Requested record was not found on the ledger",
    },
    KeywordRule {
        needles: &["already verified"],
        category: ErrorCategory::AlreadyVerified,
        message: "Manufacturer is already verified",
    },
    KeywordRule {
        needles: &["already registered", "already exists"],
        category: ErrorCategory::AlreadyRegistered,
        message: "Record is already registered",
    },
    KeywordRule {
        needles: &["replacement transaction", "replacement fee"],
        category: ErrorCategory::ReplacementConflict,
        message: "A pending transaction with the same nonce conflicts with this one",
    },
    KeywordRule {
        needles: &["nonce"],
        category: ErrorCategory::NonceError,
        message: "Transaction nonce is out of sync with the account",
    },
    KeywordRule {
        needles: &["already known"],
        category: ErrorCategory::AlreadySubmitted,
        message: "Transaction was already submitted",
    },
    KeywordRule {
        needles: &["underpriced"],
        category: ErrorCategory::Underpriced,
        message: "Gas price is too low for the network",
    },
    KeywordRule {
        needles: &["timeout", "timed out"],
        category: ErrorCategory::Timeout,
        message: "Ledger request timed out",
    },
    KeywordRule {
        needles: &[
            "network",
            "connection",
            "econnrefused",
            "error sending request",
        ],
        category: ErrorCategory::NetworkError,
        message: "Could not reach the ledger node",
    },
];

static REVERT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"reverted with reason string '([^']*)'",
        r"(?i)execution reverted:\s*(.+)",
        r"(?i)\brevert\s+(.+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Pulls the revert reason out of free text such as
/// `VM Exception while processing transaction: revert Batch not found`.
pub fn extract_revert_reason(message: &str) -> Option<String> {
    REVERT_PATTERNS.iter().find_map(|re| {
        re.captures(message)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|s| !s.is_empty())
    })
}

fn keyword_rule(text: &str) -> Option<&'static KeywordRule> {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|n| lower.contains(n)))
}

/// Classifies a raw failure. Total: every input yields exactly one pair.
pub fn classify(raw: &RawLedgerError) -> ClassifiedError {
    let raw_rule = keyword_rule(&raw.message);

    let selected: String = non_empty(&raw.reason)
        .or_else(|| non_empty(&raw.short_message))
        .or_else(|| non_empty(&raw.data_message))
        .map(str::to_string)
        .or_else(|| extract_revert_reason(&raw.message))
        .or_else(|| raw_rule.map(|r| r.message.to_string()))
        .unwrap_or_else(|| raw.message.clone());

    let category = raw_rule
        .or_else(|| keyword_rule(&selected))
        .map(|r| r.category)
        .unwrap_or(ErrorCategory::Unclassified);

    ClassifiedError::new(category, selected)
}

impl From<RawLedgerError> for ClassifiedError {
    fn from(raw: RawLedgerError) -> Self {
        classify(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reason_wins_over_everything_else() {
        let raw = RawLedgerError::new("execution reverted: something else")
            .with_reason("Manufacturer not registered")
            .with_short_message("short")
            .with_data_message("nested");
        let c = classify(&raw);
        assert_eq!(c.message, "Manufacturer not registered");
        assert_eq!(c.category, ErrorCategory::NotRegistered);
    }

    #[test]
    fn short_message_then_data_message() {
        let raw = RawLedgerError::new("opaque").with_short_message("Batch already exists");
        assert_eq!(classify(&raw).message, "Batch already exists");
        assert_eq!(classify(&raw).category, ErrorCategory::AlreadyRegistered);

        let raw = RawLedgerError::new("Internal JSON-RPC error.")
            .with_data_message("nonce too low");
        let c = classify(&raw);
        assert_eq!(c.message, "nonce too low");
        assert_eq!(c.category, ErrorCategory::NonceError);
    }

    #[test]
    fn revert_reason_is_extracted_from_free_text() {
        let c = classify(&RawLedgerError::new(
            "VM Exception while processing transaction: revert Manufacturer already verified",
        ));
        assert_eq!(c.message, "Manufacturer already verified");
        assert_eq!(c.category, ErrorCategory::AlreadyVerified);

        let c = classify(&RawLedgerError::new(
            "Error: VM Exception while processing transaction: reverted with reason string 'Batch not found'",
        ));
        assert_eq!(c.message, "Batch not found");
        assert_eq!(c.category, ErrorCategory::NotFound);
    }

    #[test]
    fn keyword_fallback_uses_canonical_message() {
        let c = classify(&RawLedgerError::new(
            "replacement transaction underpriced",
        ));
        assert_eq!(c.category, ErrorCategory::ReplacementConflict);
        assert_eq!(
            c.message,
            "A pending transaction with the same nonce conflicts with this one"
        );

        let c = classify(&RawLedgerError::new("transaction underpriced"));
        assert_eq!(c.category, ErrorCategory::Underpriced);

        let c = classify(&RawLedgerError::new("already known"));
        assert_eq!(c.category, ErrorCategory::AlreadySubmitted);
    }

    #[test]
    fn insufficient_funds_wins_regardless_of_shape() {
        let shapes = vec![
            RawLedgerError::new("insufficient funds for gas * price + value"),
            RawLedgerError::new("sender has insufficient funds").with_reason("Unauthorized"),
            RawLedgerError::new("Insufficient Funds: balance 0").with_short_message("tx failed"),
            RawLedgerError::new("insufficient funds").with_data_message("nonce too low"),
            RawLedgerError::new("execution reverted: insufficient funds"),
        ];
        for raw in shapes {
            assert_eq!(
                classify(&raw).category,
                ErrorCategory::InsufficientFunds,
                "shape: {:?}",
                raw
            );
        }
    }

    #[test]
    fn insufficient_funds_outranks_other_keywords() {
        let mixed = [
            "insufficient funds for gas * price + value: sender account not found",
            "Manufacturer not registered; insufficient funds",
            "insufficient funds: token already exists",
            "already verified, insufficient funds",
        ];
        for message in mixed {
            let c = classify(&RawLedgerError::new(message));
            assert_eq!(c.category, ErrorCategory::InsufficientFunds, "message: {}", message);
        }
    }

    #[test]
    fn transport_failures_map_to_network_and_timeout() {
        let c = classify(&RawLedgerError::new(
            "error sending request for url (http://127.0.0.1:8545/): client error (Connect): tcp connect error: Connection refused",
        ));
        assert_eq!(c.category, ErrorCategory::NetworkError);

        let c = classify(&RawLedgerError::new(
            "error sending request for url (http://node/): operation timed out",
        ));
        assert_eq!(c.category, ErrorCategory::Timeout);
    }

    #[test]
    fn unknown_failures_pass_through_verbatim() {
        let c = classify(&RawLedgerError::new("the ledger is sad"));
        assert_eq!(c.category, ErrorCategory::Unclassified);
        assert_eq!(c.message, "the ledger is sad");

        let c = classify(&RawLedgerError::default());
        assert_eq!(c.category, ErrorCategory::Unclassified);
        assert_eq!(c.message, "");
    }

    #[test]
    fn blank_structured_fields_are_ignored() {
        let raw = RawLedgerError::new("execution reverted: Batch already exists").with_reason("  ");
        assert_eq!(classify(&raw).message, "Batch already exists");
    }

    #[test]
    fn bare_execution_reverted_is_not_a_reason() {
        assert_eq!(extract_revert_reason("execution reverted"), None);
    }
}
