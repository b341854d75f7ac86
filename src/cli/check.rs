//! Handler for `check config`.

use crate::cli::ConfigPathArg;
use crate::config::Config;
use crate::error::Result;

pub fn execute_config(args: &ConfigPathArg) -> Result<()> {
    let config = Config::load(&args.config)?;

    println!("Configuration OK: {}", args.config.display());
    println!("  instruments: {}", config.instruments.join(", "));
    println!("  venues:");
    for (name, venue) in &config.venues {
        println!(
            "    {name} ({:?}, taker fee {})",
            venue.kind, venue.taker_fee
        );
    }
    println!("  min spread: {}%", config.min_spread_pct);
    println!("  poll interval: {}s", config.poll_interval_secs);
    println!(
        "  auto-trading: {}  dry-run: {}",
        config.auto_trading, config.dry_run
    );
    println!(
        "  risk: loss limit {} | max exposure {} | failure streak {}",
        config.risk.daily_loss_limit, config.risk.max_exposure,
        config.risk.max_consecutive_failures
    );
    Ok(())
}
