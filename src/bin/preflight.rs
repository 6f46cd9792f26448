use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use medchain_ledger::domain::reads;
use medchain_ledger::{classify, EnumerationSource, JsonRpcLedger, LedgerConfig, LedgerService, ServiceConfig};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Requires env vars:\n\
           LEDGER_RPC_URL, CONTRACT_ADDRESS\n\
         Optional:\n\
           ENABLE_DEV_WRITES, SIGNER_ADDRESS, DEFAULT_GAS_LIMIT, GAS_PRICE_WEI,\n\
           EVENT_SCAN_WINDOW, EXPLORER_BASE_URL, RPC_TIMEOUT_SECS, RECEIPT_POLL_INTERVAL_MS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    // Force-read config (nice error messages if missing)
    let config = LedgerConfig::from_env()?;

    println!("> Preflight:");
    println!("  LEDGER_RPC_URL={}", config.rpc_url);
    println!("  CONTRACT_ADDRESS={}", config.contract_address);
    println!("  ENABLE_DEV_WRITES={}", config.writes.enabled);
    println!("  EVENT_SCAN_WINDOW={}", config.event_scan_window);

    let ledger = Arc::new(JsonRpcLedger::new(&config)?);

    // Basic RPC connectivity
    let chain_id = ledger.chain_id().await.map_err(|e| {
        let c = classify(&e);
        anyhow::anyhow!("RPC not reachable ({:?}): {}", c.category, c.message)
    })?;
    println!("  Chain id: {}", chain_id);

    // Contract deployment
    let code_len = ledger
        .contract_code_len()
        .await
        .map_err(|e| anyhow::anyhow!("Could not read contract code: {}", e))?;
    if code_len == 0 {
        return Err(anyhow::anyhow!(
            "No contract deployed at {} on chain {}",
            ledger.contract_address(),
            chain_id
        ));
    }
    println!("  Contract code present ({} bytes).", code_len);

    // Stats readable
    let stats = reads::contract_stats(ledger.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!("Contract stats not readable ({:?}): {}", e.category, e.message))?;
    println!(
        "  Stats: {} batches, {} manufacturers, admin {}",
        stats.total_batches, stats.total_manufacturers, stats.admin_address
    );

    // Which enumeration tier this deployment supports
    let service = LedgerService::new(ledger.clone(), ServiceConfig::from(&config));
    match service.enumerate_manufacturers_detailed().await {
        Ok(e) => match e.source {
            EnumerationSource::Direct => println!(
                "  Enumeration: direct ({} manufacturers).",
                e.manufacturers.len()
            ),
            EnumerationSource::EventScan => println!(
                "  Enumeration: event scan over last {} blocks ({} manufacturers).",
                config.event_scan_window,
                e.manufacturers.len()
            ),
            EnumerationSource::Summary => {
                eprintln!("  Warning: enumeration degraded to summary only; contract upgrade needed.")
            }
        },
        Err(e) => eprintln!("  Warning: manufacturers cannot be enumerated: {}", e),
    }

    if config.writes.enabled {
        println!(
            "  Dev writes ENABLED from {}.",
            config.writes.signer_address.as_deref().unwrap_or("<unset>")
        );
    }

    println!("> Preflight OK.");
    Ok(())
}
