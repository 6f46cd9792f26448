//! Centralized configuration (environment variables + defaults).
//!
//! Everything is read once at process start into an immutable [`LedgerConfig`]
//! which is then handed to the ledger client and the service.

use anyhow::{anyhow, Context};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_GAS_LIMIT: u64 = 500_000;
const DEFAULT_GAS_PRICE_WEI: u128 = 20_000_000_000;
const DEFAULT_EVENT_SCAN_WINDOW: u64 = 50_000;
const DEFAULT_EXPLORER_BASE_URL: &str = "https://sepolia.etherscan.io";
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the ledger node (`LEDGER_RPC_URL`, required).
    pub rpc_url: String,
    /// Address of the deployed authentication contract (`CONTRACT_ADDRESS`, required).
    pub contract_address: String,
    /// Service-held write settings. Writes are off unless `ENABLE_DEV_WRITES=true`.
    pub writes: WriteSettings,
    /// Trailing block window for the registration-event scan (`EVENT_SCAN_WINDOW`).
    pub event_scan_window: u64,
    /// Block explorer used to build receipt links (`EXPLORER_BASE_URL`).
    pub explorer_base_url: String,
    /// Per-request HTTP timeout for the RPC client (`RPC_TIMEOUT_SECS`).
    pub rpc_timeout: Duration,
    /// Delay between receipt polls while waiting for confirmation (`RECEIPT_POLL_INTERVAL_MS`).
    pub receipt_poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSettings {
    pub enabled: bool,
    /// Node-managed account used as `from` on direct writes (`SIGNER_ADDRESS`).
    pub signer_address: Option<String>,
    /// Used when gas estimation fails (`DEFAULT_GAS_LIMIT`).
    pub default_gas_limit: u64,
    /// Static gas price for direct writes (`GAS_PRICE_WEI`).
    pub gas_price_wei: u128,
}

impl Default for WriteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            signer_address: None,
            default_gas_limit: DEFAULT_GAS_LIMIT,
            gas_price_wei: DEFAULT_GAS_PRICE_WEI,
        }
    }
}

impl LedgerConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Used by `from_env` and by tests.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rpc_url = get("LEDGER_RPC_URL").ok_or_else(|| anyhow!("LEDGER_RPC_URL must be set"))?;
        let contract_address =
            get("CONTRACT_ADDRESS").ok_or_else(|| anyhow!("CONTRACT_ADDRESS must be set"))?;

        let enabled = match get("ENABLE_DEV_WRITES") {
            Some(v) => parse_flag(&v).context("ENABLE_DEV_WRITES must be true or false")?,
            None => false,
        };
        let signer_address = get("SIGNER_ADDRESS");
        if enabled && signer_address.is_none() {
            return Err(anyhow!("SIGNER_ADDRESS must be set when ENABLE_DEV_WRITES=true"));
        }

        let writes = WriteSettings {
            enabled,
            signer_address,
            default_gas_limit: parse_or(get("DEFAULT_GAS_LIMIT"), "DEFAULT_GAS_LIMIT", DEFAULT_GAS_LIMIT)?,
            gas_price_wei: parse_or(get("GAS_PRICE_WEI"), "GAS_PRICE_WEI", DEFAULT_GAS_PRICE_WEI)?,
        };

        let rpc_timeout_secs: u64 =
            parse_or(get("RPC_TIMEOUT_SECS"), "RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?;
        let poll_ms: u64 = parse_or(
            get("RECEIPT_POLL_INTERVAL_MS"),
            "RECEIPT_POLL_INTERVAL_MS",
            DEFAULT_RECEIPT_POLL_INTERVAL_MS,
        )?;

        Ok(Self {
            rpc_url,
            contract_address,
            writes,
            event_scan_window: parse_or(
                get("EVENT_SCAN_WINDOW"),
                "EVENT_SCAN_WINDOW",
                DEFAULT_EVENT_SCAN_WINDOW,
            )?,
            explorer_base_url: get("EXPLORER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_EXPLORER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            rpc_timeout: Duration::from_secs(rpc_timeout_secs.max(1)),
            receipt_poll_interval: Duration::from_millis(poll_ms.max(1)),
        })
    }
}

fn parse_flag(v: &str) -> anyhow::Result<bool> {
    match v.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(anyhow!("invalid boolean '{}'", other)),
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
{
    match raw {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| anyhow!("{} must be a valid unsigned integer (got '{}')", key, v)),
        None => Ok(default),
    }
}
