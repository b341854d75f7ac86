//! Notification events and sinks.
//!
//! Notifiers are best-effort: a failing sink must never affect trade or
//! risk outcomes, so delivery is fire-and-forget from the caller's
//! perspective.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Instrument, VenueId};

/// Events the core surfaces to the outside world.
#[derive(Debug, Clone)]
pub enum Event {
    OpportunityDetected {
        instrument: Instrument,
        buy_venue: VenueId,
        sell_venue: VenueId,
        spread_pct: Decimal,
    },
    TradeExecuted {
        trade_id: Uuid,
        instrument: Instrument,
        status: String,
        pnl: Decimal,
    },
    /// A sell leg failed after its buy filled; inventory is unhedged
    /// until someone reconciles it.
    UnhedgedExposure {
        trade_id: Uuid,
        instrument: Instrument,
        venue: VenueId,
        quantity: Decimal,
    },
    CircuitBreakerTripped {
        reason: String,
    },
    DailyStatsReset,
}

/// A notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event);
}

/// Registry of notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for tests or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that emits events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{info, warn};
        match event {
            Event::OpportunityDetected {
                instrument,
                buy_venue,
                sell_venue,
                spread_pct,
            } => {
                info!(
                    instrument = %instrument,
                    buy = %buy_venue,
                    sell = %sell_venue,
                    spread_pct = %spread_pct,
                    "Opportunity detected"
                );
            }
            Event::TradeExecuted {
                trade_id,
                instrument,
                status,
                pnl,
            } => {
                info!(
                    trade_id = %trade_id,
                    instrument = %instrument,
                    status = %status,
                    pnl = %pnl,
                    "Trade executed"
                );
            }
            Event::UnhedgedExposure {
                trade_id,
                instrument,
                venue,
                quantity,
            } => {
                warn!(
                    trade_id = %trade_id,
                    instrument = %instrument,
                    venue = %venue,
                    quantity = %quantity,
                    "Unhedged exposure requires manual reconciliation"
                );
            }
            Event::CircuitBreakerTripped { reason } => {
                warn!(reason = %reason, "Circuit breaker tripped");
            }
            Event::DailyStatsReset => {
                info!("Daily stats reset");
            }
        }
    }
}
