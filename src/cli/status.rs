//! Handler for the `status` command.
//!
//! Reads the status file written by a running instance plus the audit
//! journal's recent trades and prints a summary.

use std::fs;

use crate::app::StatusFile;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{self, SqliteJournal};

pub fn execute(args: &StatusArgs) -> Result<()> {
    let config = Config::load(&args.config)?;

    match &config.status_file {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "cannot read status file {}: {e} (is arbhound running?)",
                    path.display()
                )))
            })?;
            let status: StatusFile = serde_json::from_str(&content)?;
            print_status(&status);
        }
        None => println!("No status file configured."),
    }

    print_trades(&config, args.trades)?;
    Ok(())
}

fn print_status(status: &StatusFile) {
    println!("arbhound status (pid {})", status.pid);
    println!("  started:  {}", status.started_at);
    println!("  updated:  {}", status.updated_at);
    println!(
        "  venues:   {}",
        status.config.venues.join(", ")
    );
    println!(
        "  instruments: {}",
        status.config.instruments.join(", ")
    );
    println!(
        "  auto-trading: {}  dry-run: {}",
        status.config.auto_trading, status.config.dry_run
    );
    println!(
        "  cycles:   {} completed, {} failed",
        status.cycles.completed, status.cycles.failed
    );
    println!(
        "  activity: {} opportunities, {} trades",
        status.cycles.opportunities_detected, status.cycles.trades_executed
    );

    if let Some(risk) = &status.risk {
        println!(
            "  risk:     pnl {} | failures {} | breaker {}",
            risk.daily_pnl,
            risk.consecutive_failed_trades,
            if risk.circuit_breaker_active {
                "TRIPPED"
            } else {
                "normal"
            }
        );
    }

    if status.opportunities.is_empty() {
        println!("  no current opportunities");
    } else {
        println!("  current opportunities:");
        for opp in &status.opportunities {
            println!(
                "    {} buy {} -> sell {} ({}%)",
                opp.instrument, opp.buy_venue, opp.sell_venue, opp.spread_pct
            );
        }
    }
}

fn print_trades(config: &Config, limit: i64) -> Result<()> {
    let pool = store::create_pool(&config.database)?;
    store::run_migrations(&pool)?;
    let journal = SqliteJournal::new(pool);

    let trades = journal.recent_trades(limit);
    if trades.is_empty() {
        println!("  no recorded trades");
        return Ok(());
    }

    println!("  recent trades:");
    for trade in trades {
        println!(
            "    {} {} {} {}->{} qty {} pnl {} {}",
            trade.created_at,
            trade.status,
            trade.instrument,
            trade.buy_venue,
            trade.sell_venue,
            trade.quantity,
            trade.pnl,
            trade.error.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}
