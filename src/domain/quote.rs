//! Point-in-time price views: per-venue quotes and the immutable
//! cross-venue snapshot built from them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::ids::{Instrument, VenueId};
use super::money::Price;

/// A single venue's quoted prices for one instrument.
///
/// Produced fresh on each poll and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub venue: VenueId,
    pub instrument: Instrument,
    pub bid: Price,
    pub ask: Price,
    pub last: Price,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// A quote is actionable only when both sides of the book are quoted.
    pub fn is_actionable(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO
    }
}

/// An immutable point-in-time view of quotes across all venues.
///
/// A new poll produces a new snapshot; an existing snapshot is never
/// updated in place. A venue appears under an instrument only if its
/// quote had `bid > 0` and `ask > 0` at fetch time.
#[derive(Debug, Serialize)]
pub struct PriceSnapshot {
    taken_at: DateTime<Utc>,
    quotes: BTreeMap<Instrument, BTreeMap<VenueId, Quote>>,
}

impl PriceSnapshot {
    /// Create an empty snapshot stamped with the given poll time.
    pub fn new(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            quotes: BTreeMap::new(),
        }
    }

    /// Insert a quote, enforcing the actionability invariant.
    ///
    /// Non-actionable quotes (zero or negative bid/ask) are dropped so
    /// that downstream consumers never observe them.
    pub fn insert(&mut self, quote: Quote) {
        if !quote.is_actionable() {
            return;
        }
        self.quotes
            .entry(quote.instrument.clone())
            .or_default()
            .insert(quote.venue.clone(), quote);
    }

    /// When the poll that produced this snapshot started.
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// All venue quotes for one instrument, ordered by venue id.
    pub fn venues_for(&self, instrument: &Instrument) -> Option<&BTreeMap<VenueId, Quote>> {
        self.quotes.get(instrument)
    }

    /// A specific venue's quote for an instrument, if present.
    pub fn get(&self, instrument: &Instrument, venue: &VenueId) -> Option<&Quote> {
        self.quotes.get(instrument)?.get(venue)
    }

    /// Instruments present in this snapshot, in id order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.quotes.keys()
    }

    /// Total number of quotes across all instruments.
    pub fn quote_count(&self) -> usize {
        self.quotes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
