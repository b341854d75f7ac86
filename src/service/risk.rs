//! Risk gate and circuit breaker.
//!
//! A small state machine over cumulative P&L, exposure, and failure
//! streaks. `Normal` allows trading; `Tripped` blocks it. Tripping is
//! one-way: conditions clearing on their own never re-arm the gate, only
//! an explicit [`RiskGate::reset_daily_stats`] does. That keeps a
//! breaker from silently re-arming mid-trip.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RiskConfig;
use crate::domain::{TradeRecord, TradeStatus};

/// Why the breaker tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripReason {
    DailyLossLimit,
    MaxExposure,
    FailureStreak,
}

impl std::fmt::Display for TripReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DailyLossLimit => "daily loss limit reached",
            Self::MaxExposure => "max exposure exceeded",
            Self::FailureStreak => "too many consecutive failed trades",
        };
        f.write_str(s)
    }
}

/// One entry in the in-process trade log.
#[derive(Debug, Clone, Serialize)]
pub struct TradeLogEntry {
    pub recorded_at: DateTime<Utc>,
    pub trade_id: Uuid,
    pub status: String,
    pub pnl: Decimal,
}

/// Read-only view of the gate for status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct RiskStatus {
    pub daily_pnl: Decimal,
    pub total_exposure: Decimal,
    pub consecutive_failed_trades: u32,
    pub circuit_breaker_active: bool,
    pub trip_reason: Option<TripReason>,
    pub trades_recorded: usize,
    pub can_trade: bool,
}

struct RiskState {
    daily_pnl: Decimal,
    // Read by the trip condition; exposure accounting is not yet
    // specified, so nothing writes this.
    total_exposure: Decimal,
    consecutive_failed_trades: u32,
    tripped: Option<TripReason>,
    trade_log: Vec<TradeLogEntry>,
}

impl RiskState {
    fn new() -> Self {
        Self {
            daily_pnl: Decimal::ZERO,
            total_exposure: Decimal::ZERO,
            consecutive_failed_trades: 0,
            tripped: None,
            trade_log: Vec::new(),
        }
    }
}

/// The gate deciding whether new trades may be initiated.
///
/// Exclusively owns its state; all mutation is serialized through an
/// internal mutex so parallel executions can never interleave updates.
pub struct RiskGate {
    limits: RiskConfig,
    state: Mutex<RiskState>,
}

impl RiskGate {
    pub fn new(limits: RiskConfig) -> Self {
        Self {
            limits,
            state: Mutex::new(RiskState::new()),
        }
    }

    /// Fold a terminal trade into the risk state and re-evaluate the
    /// breaker. Returns whether trading remains allowed.
    ///
    /// Completed trades contribute their realized P&L and clear the
    /// failure streak; failed and partial trades contribute zero P&L
    /// and extend it.
    pub fn record_trade(&self, record: &TradeRecord) -> bool {
        let mut state = self.state.lock();

        let pnl = record.realized_pnl();
        state.daily_pnl += pnl;
        state.trade_log.push(TradeLogEntry {
            recorded_at: Utc::now(),
            trade_id: record.id(),
            status: record.status().to_string(),
            pnl,
        });

        if record.is_failure() {
            state.consecutive_failed_trades += 1;
        } else if record.status() == TradeStatus::Completed {
            state.consecutive_failed_trades = 0;
        }

        info!(
            trade_id = %record.id(),
            status = %record.status(),
            pnl = %pnl,
            daily_pnl = %state.daily_pnl,
            failures = state.consecutive_failed_trades,
            "Trade recorded"
        );

        self.evaluate(&mut state);
        state.tripped.is_none()
    }

    /// Trip the breaker if any limit is breached. Never un-trips.
    fn evaluate(&self, state: &mut RiskState) {
        if state.tripped.is_some() {
            return;
        }

        let reason = if state.daily_pnl <= self.limits.daily_loss_limit {
            Some(TripReason::DailyLossLimit)
        } else if state.total_exposure > self.limits.max_exposure {
            Some(TripReason::MaxExposure)
        } else if state.consecutive_failed_trades > self.limits.max_consecutive_failures {
            Some(TripReason::FailureStreak)
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!(
                reason = %reason,
                daily_pnl = %state.daily_pnl,
                failures = state.consecutive_failed_trades,
                "Circuit breaker tripped"
            );
            state.tripped = Some(reason);
        }
    }

    /// Pure read: true iff the gate is in its normal state.
    pub fn can_trade(&self) -> bool {
        self.state.lock().tripped.is_none()
    }

    /// Zero the daily statistics, clear the trade log, and force the
    /// gate back to normal. Scheduling this once per trading day is an
    /// external concern.
    pub fn reset_daily_stats(&self) {
        let mut state = self.state.lock();
        state.daily_pnl = Decimal::ZERO;
        state.consecutive_failed_trades = 0;
        state.trade_log.clear();
        state.tripped = None;
        info!("Daily risk stats reset");
    }

    pub fn status(&self) -> RiskStatus {
        let state = self.state.lock();
        RiskStatus {
            daily_pnl: state.daily_pnl,
            total_exposure: state.total_exposure,
            consecutive_failed_trades: state.consecutive_failed_trades,
            circuit_breaker_active: state.tripped.is_some(),
            trip_reason: state.tripped,
            trades_recorded: state.trade_log.len(),
            can_trade: state.tripped.is_none(),
        }
    }

    /// The most recent `limit` trade log entries, newest last.
    pub fn trade_log(&self, limit: usize) -> Vec<TradeLogEntry> {
        let state = self.state.lock();
        let start = state.trade_log.len().saturating_sub(limit);
        state.trade_log[start..].to_vec()
    }
}
