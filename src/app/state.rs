//! Shared application state.
//!
//! The cached snapshot and the auto-trading switch are the only state
//! shared between the trading loop and its read-side views. The
//! orchestrator is the sole writer; everyone else reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::{Opportunity, PriceSnapshot};

pub struct AppState {
    /// Last published snapshot. Swapped whole, never mutated in place,
    /// so readers see either the old or the new snapshot in full.
    snapshot: RwLock<Option<Arc<PriceSnapshot>>>,
    /// Opportunities from the most recent cycle.
    opportunities: RwLock<Vec<Opportunity>>,
    /// When false, detected opportunities are reported but not traded.
    auto_trading: AtomicBool,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            opportunities: RwLock::new(Vec::new()),
            auto_trading: AtomicBool::new(false),
        }
    }

    /// Atomically replace the cached snapshot.
    pub fn publish_snapshot(&self, snapshot: Arc<PriceSnapshot>) {
        *self.snapshot.write() = Some(snapshot);
    }

    /// The last known snapshot, if any poll has completed.
    pub fn snapshot(&self) -> Option<Arc<PriceSnapshot>> {
        self.snapshot.read().clone()
    }

    pub fn set_opportunities(&self, opportunities: Vec<Opportunity>) {
        *self.opportunities.write() = opportunities;
    }

    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.opportunities.read().clone()
    }

    pub fn auto_trading(&self) -> bool {
        self.auto_trading.load(Ordering::SeqCst)
    }

    pub fn set_auto_trading(&self, enabled: bool) {
        self.auto_trading.store(enabled, Ordering::SeqCst);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
