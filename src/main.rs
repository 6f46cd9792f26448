//! Operator inspector for the authentication contract.
//!
//! Prints canonical records as JSON; classified errors are printed the same
//! way and exit with status 1.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use medchain_ledger::{
    ClassifiedError, JsonRpcLedger, LedgerConfig, LedgerService, ServiceConfig, WriteAction,
};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: medchain-ledger <command>\n\
         \n\
         Commands:\n\
           stats                      aggregate contract stats\n\
           manufacturers              enumerate all manufacturers\n\
           manufacturer <address>     read one manufacturer\n\
           batch <batch-id>           read and verify one batch\n\
           batches <address>          batch ids registered by a manufacturer\n\
           reports                    expired-medicine scan reports\n\
           prepare '<action-json>'    unsigned transaction for an external signer\n\
           write '<action-json>'      direct write (requires ENABLE_DEV_WRITES=true)\n\
         \n\
         Action JSON: {{\"method\":\"markBatchRecalled\",\"args\":{{\"batchId\":\"BATCH-001\"}}}}\n\
         \n\
         Requires env vars:\n\
           LEDGER_RPC_URL, CONTRACT_ADDRESS\n"
    );
    std::process::exit(2);
}

fn render<T: Serialize>(result: Result<T, ClassifiedError>) -> anyhow::Result<(serde_json::Value, bool)> {
    Ok(match result {
        Ok(value) => (serde_json::to_value(value)?, true),
        Err(e) => (json!({ "error": e }), false),
    })
}

fn parse_action(raw: &str) -> anyhow::Result<WriteAction> {
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("Invalid action JSON: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = LedgerConfig::from_env()?;
    let ledger = Arc::new(JsonRpcLedger::new(&config)?);
    let service = LedgerService::new(ledger, ServiceConfig::from(&config));

    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    let (output, ok) = match argv.as_slice() {
        ["stats"] => render(service.read_contract_stats().await)?,
        ["manufacturers"] => render(service.enumerate_manufacturers_detailed().await)?,
        ["manufacturer", address] => render(service.read_manufacturer(address).await)?,
        ["batch", batch_id] => render(service.verify_batch(batch_id).await)?,
        ["batches", address] => render(service.batches_by_manufacturer(address).await)?,
        ["reports"] => render(service.expired_scan_reports().await)?,
        ["prepare", action] => {
            let action = parse_action(action)?;
            (serde_json::to_value(service.prepare(&action))?, true)
        }
        ["write", action] => {
            let action = parse_action(action)?;
            render(service.dev_write(&action).await)?
        }
        _ => usage_and_exit(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
