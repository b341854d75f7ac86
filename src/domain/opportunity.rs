//! A detected cross-venue arbitrage opportunity.

use rust_decimal::Decimal;
use serde::Serialize;

use super::ids::{Instrument, VenueId};
use super::money::Price;

/// A profitable cross-venue price discrepancy, net of both legs' fees.
///
/// Derived from a single [`super::PriceSnapshot`] and never outlives the
/// cycle that produced it. `buy_venue` and `sell_venue` are always
/// distinct.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    instrument: Instrument,
    buy_venue: VenueId,
    sell_venue: VenueId,
    buy_price: Price,
    sell_price: Price,
    spread_pct: Decimal,
}

impl Opportunity {
    pub fn new(
        instrument: Instrument,
        buy_venue: VenueId,
        sell_venue: VenueId,
        buy_price: Price,
        sell_price: Price,
        spread_pct: Decimal,
    ) -> Self {
        debug_assert_ne!(buy_venue, sell_venue);
        Self {
            instrument,
            buy_venue,
            sell_venue,
            buy_price,
            sell_price,
            spread_pct,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Venue to buy on (priced at its ask).
    pub fn buy_venue(&self) -> &VenueId {
        &self.buy_venue
    }

    /// Venue to sell on (priced at its bid).
    pub fn sell_venue(&self) -> &VenueId {
        &self.sell_venue
    }

    pub fn buy_price(&self) -> Price {
        self.buy_price
    }

    pub fn sell_price(&self) -> Price {
        self.sell_price
    }

    /// Net spread percentage after both legs' fees.
    pub fn spread_pct(&self) -> Decimal {
        self.spread_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accessors_return_constructor_values() {
        let opp = Opportunity::new(
            Instrument::from("BTC/USDT"),
            VenueId::from("binance"),
            VenueId::from("kucoin"),
            dec!(100),
            dec!(101),
            dec!(0.8),
        );

        assert_eq!(opp.instrument().as_str(), "BTC/USDT");
        assert_eq!(opp.buy_venue().as_str(), "binance");
        assert_eq!(opp.sell_venue().as_str(), "kucoin");
        assert_eq!(opp.buy_price(), dec!(100));
        assert_eq!(opp.sell_price(), dec!(101));
        assert_eq!(opp.spread_pct(), dec!(0.8));
    }
}
