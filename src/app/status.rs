//! Status file for external monitoring.
//!
//! Writes a JSON status file that external tools (and the `status` CLI
//! command) can poll. This is the read-side surface onto the core's
//! state; there is no HTTP API.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::service::RiskStatus;

/// Current status file format version.
const STATUS_VERSION: &str = "1";

/// Top-level status file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFile {
    /// Schema version for forward compatibility.
    pub version: String,
    /// When the process started.
    pub started_at: DateTime<Utc>,
    /// Process ID.
    pub pid: u32,
    /// Static configuration snapshot.
    pub config: StatusConfig,
    /// Risk gate state as of the last cycle.
    pub risk: Option<RiskStatusView>,
    /// Cycle counters.
    pub cycles: StatusCycles,
    /// Opportunities from the most recent cycle.
    pub opportunities: Vec<OpportunityView>,
    /// When this file was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Static configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    pub instruments: Vec<String>,
    pub venues: Vec<String>,
    pub min_spread_pct: Decimal,
    pub auto_trading: bool,
    pub dry_run: bool,
}

/// Serializable view of the risk gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskStatusView {
    pub daily_pnl: Decimal,
    pub total_exposure: Decimal,
    pub consecutive_failed_trades: u32,
    pub circuit_breaker_active: bool,
    pub can_trade: bool,
}

impl From<&RiskStatus> for RiskStatusView {
    fn from(status: &RiskStatus) -> Self {
        Self {
            daily_pnl: status.daily_pnl,
            total_exposure: status.total_exposure,
            consecutive_failed_trades: status.consecutive_failed_trades,
            circuit_breaker_active: status.circuit_breaker_active,
            can_trade: status.can_trade,
        }
    }
}

/// One opportunity as shown to external viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityView {
    pub instrument: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub spread_pct: Decimal,
}

/// Rolling cycle counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCycles {
    pub completed: u64,
    pub failed: u64,
    pub opportunities_detected: u64,
    pub trades_executed: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Writer for the status file.
///
/// Thread-safe wrapper that manages atomic updates to the status file.
pub struct StatusWriter {
    path: PathBuf,
    status: Mutex<StatusFile>,
}

impl StatusWriter {
    #[must_use]
    pub fn new(path: PathBuf, config: StatusConfig) -> Self {
        let now = Utc::now();
        let status = StatusFile {
            version: STATUS_VERSION.to_string(),
            started_at: now,
            pid: std::process::id(),
            config,
            risk: None,
            cycles: StatusCycles::default(),
            opportunities: Vec::new(),
            updated_at: now,
        };

        Self {
            path,
            status: Mutex::new(status),
        }
    }

    /// Fold one finished cycle into the status.
    pub fn record_cycle(
        &self,
        risk: &RiskStatus,
        opportunities: &[crate::domain::Opportunity],
        traded: bool,
    ) {
        let mut status = self.status.lock();
        status.cycles.completed += 1;
        status.cycles.opportunities_detected += opportunities.len() as u64;
        if traded {
            status.cycles.trades_executed += 1;
        }
        status.cycles.last_cycle_at = Some(Utc::now());
        status.risk = Some(RiskStatusView::from(risk));
        status.opportunities = opportunities
            .iter()
            .map(|opp| OpportunityView {
                instrument: opp.instrument().as_str().to_string(),
                buy_venue: opp.buy_venue().as_str().to_string(),
                sell_venue: opp.sell_venue().as_str().to_string(),
                spread_pct: opp.spread_pct(),
            })
            .collect();
    }

    /// Count a failed cycle.
    pub fn record_cycle_failure(&self) {
        let mut status = self.status.lock();
        status.cycles.failed += 1;
    }

    /// Write the current status to the file atomically.
    ///
    /// Uses write-to-temp-then-rename so readers never observe a
    /// partially written file.
    pub fn write(&self) -> Result<()> {
        // Clone status while holding lock, release before I/O
        let json = {
            let mut status = self.status.lock();
            status.updated_at = Utc::now();
            serde_json::to_string_pretty(&*status)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        file.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
        file.sync_all().map_err(cleanup_and_err)?;
        fs::rename(&temp_path, &self.path).map_err(cleanup_and_err)?;

        Ok(())
    }
}
