//! Opportunity detection over price snapshots.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::trace;

use crate::domain::{net_spread_pct, Opportunity, PriceSnapshot, VenueId};

/// Upper bound on reported opportunities per cycle.
const MAX_OPPORTUNITIES: usize = 10;

/// Computes net spreads for every ordered venue pair in a snapshot.
///
/// Detection is pure and deterministic: the same snapshot and threshold
/// always produce the same ordered output. Venue pairs are visited in
/// venue-id order, and ties in spread keep that discovery order.
pub struct OpportunityDetector {
    /// Taker fee fraction per venue.
    fees: BTreeMap<VenueId, Decimal>,
}

impl OpportunityDetector {
    pub fn new(fees: BTreeMap<VenueId, Decimal>) -> Self {
        Self { fees }
    }

    fn fee(&self, venue: &VenueId) -> Decimal {
        self.fees.get(venue).copied().unwrap_or(Decimal::ZERO)
    }

    /// Rank profitable cross-venue discrepancies, best spread first,
    /// bounded to the top ten.
    pub fn detect(&self, snapshot: &PriceSnapshot, min_spread_pct: Decimal) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        for instrument in snapshot.instruments() {
            let Some(venues) = snapshot.venues_for(instrument) else {
                continue;
            };

            for (buy_venue, buy_quote) in venues {
                for (sell_venue, sell_quote) in venues {
                    if buy_venue == sell_venue {
                        continue;
                    }

                    // Snapshot construction already drops non-positive
                    // books, so the spread math cannot reject here; an
                    // Err is treated as no opportunity.
                    let Ok(spread) = net_spread_pct(
                        buy_quote.ask,
                        sell_quote.bid,
                        self.fee(buy_venue),
                        self.fee(sell_venue),
                    ) else {
                        continue;
                    };

                    if spread < min_spread_pct {
                        trace!(
                            instrument = %instrument,
                            buy = %buy_venue,
                            sell = %sell_venue,
                            spread = %spread,
                            "Below spread threshold"
                        );
                        continue;
                    }

                    opportunities.push(Opportunity::new(
                        instrument.clone(),
                        buy_venue.clone(),
                        sell_venue.clone(),
                        buy_quote.ask,
                        sell_quote.bid,
                        spread,
                    ));
                }
            }
        }

        // Stable sort keeps discovery order between equal spreads
        opportunities.sort_by(|a, b| b.spread_pct().cmp(&a.spread_pct()));
        opportunities.truncate(MAX_OPPORTUNITIES);
        opportunities
    }
}
