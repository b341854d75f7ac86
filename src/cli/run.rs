//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::app::Orchestrator;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::secrets::EnvCredentials;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    // Apply CLI overrides
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if args.auto_trading {
        config.auto_trading = true;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if let Some(min_spread) = args.min_spread {
        config.min_spread_pct = min_spread;
    }
    if let Some(quantity) = args.quantity {
        config.trade_quantity = quantity;
    }
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }

    config.init_logging();
    info!("arbhound starting");

    let orchestrator = Orchestrator::new(config, &EnvCredentials)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut loop_handle = tokio::spawn(orchestrator.run_with_shutdown(shutdown_rx));

    tokio::select! {
        result = &mut loop_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "Fatal error");
                    std::process::exit(1);
                }
                Err(e) => {
                    error!(error = %e, "Trading loop panicked");
                    std::process::exit(1);
                }
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
            // Let an in-flight cycle finish before exiting
            let _ = loop_handle.await;
        }
    }

    info!("arbhound stopped");
    Ok(())
}
