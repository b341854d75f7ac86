//! Two-leg trade execution.
//!
//! Legs run strictly in sequence: the sell is only ever attempted after
//! the buy has filled. A failed buy terminates the trade immediately —
//! no sell order may follow it — and a failed sell after a successful
//! buy produces a `partial` record marking the unhedged inventory.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::domain::{LegFill, Opportunity, Quantity, TradeRecord};
use crate::error::ExecutionError;
use crate::gateway::{GatewayRegistry, OrderResult, OrderSide};

pub struct TradeExecutor {
    gateways: Arc<GatewayRegistry>,
}

impl TradeExecutor {
    pub fn new(gateways: Arc<GatewayRegistry>) -> Self {
        Self { gateways }
    }

    /// Execute both legs of an opportunity and return the terminal
    /// trade record. Never returns a pending record.
    ///
    /// The record carries everything the risk gate needs; this
    /// component itself never reads risk state.
    pub async fn execute(&self, opportunity: &Opportunity, quantity: Quantity) -> TradeRecord {
        let mut record = TradeRecord::pending(opportunity, quantity);

        info!(
            trade_id = %record.id(),
            instrument = %opportunity.instrument(),
            buy_venue = %opportunity.buy_venue(),
            sell_venue = %opportunity.sell_venue(),
            spread_pct = %opportunity.spread_pct(),
            quantity = %quantity,
            "Executing opportunity"
        );

        if quantity <= Decimal::ZERO {
            record.fail(ExecutionError::InvalidQuantity(quantity));
            return record;
        }

        let Some(buy_gateway) = self.gateways.get(opportunity.buy_venue()) else {
            record.fail(ExecutionError::UnknownVenue(opportunity.buy_venue().clone()));
            return record;
        };
        let Some(sell_gateway) = self.gateways.get(opportunity.sell_venue()) else {
            record.fail(ExecutionError::UnknownVenue(
                opportunity.sell_venue().clone(),
            ));
            return record;
        };

        // Leg 1: buy. On failure the trade is over; the sell leg must
        // never fire after a failed buy.
        let buy_fill = match buy_gateway
            .place_market_order(opportunity.instrument(), OrderSide::Buy, quantity)
            .await
        {
            Ok(result) => result,
            Err(source) => {
                error!(
                    trade_id = %record.id(),
                    venue = %opportunity.buy_venue(),
                    error = %source,
                    "Buy leg failed"
                );
                record.fail(ExecutionError::BuyLeg {
                    venue: opportunity.buy_venue().clone(),
                    source,
                });
                return record;
            }
        };
        record.record_buy_fill(leg_fill(opportunity.buy_venue(), &buy_fill));

        // Leg 2: sell.
        match sell_gateway
            .place_market_order(opportunity.instrument(), OrderSide::Sell, quantity)
            .await
        {
            Ok(sell_result) => {
                record.complete(leg_fill(opportunity.sell_venue(), &sell_result));
                info!(
                    trade_id = %record.id(),
                    pnl = %record.realized_pnl(),
                    "Trade completed"
                );
            }
            Err(source) => {
                warn!(
                    trade_id = %record.id(),
                    venue = %opportunity.sell_venue(),
                    error = %source,
                    quantity = %quantity,
                    "Sell leg failed after buy fill - unhedged inventory"
                );
                record.mark_partial(ExecutionError::SellLeg {
                    venue: opportunity.sell_venue().clone(),
                    source,
                });
            }
        }

        record
    }
}

fn leg_fill(venue: &crate::domain::VenueId, result: &OrderResult) -> LegFill {
    LegFill {
        venue: venue.clone(),
        order_id: result.order_id.clone(),
        average_price: result.average_price,
        filled_quantity: result.filled_quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Instrument, TradeStatus, VenueId};
    use crate::gateway::{ExchangeGateway, PaperBook, PaperGateway};
    use rust_decimal_macros::dec;

    fn paper(venue: &str, mark: Decimal) -> Arc<PaperGateway> {
        let mut book = PaperBook::default();
        book.half_spread = Decimal::ZERO;
        book.marks.insert(Instrument::from("BTC/USDT"), mark);
        Arc::new(PaperGateway::new(VenueId::from(venue), dec!(0.001), book))
    }

    fn setup(buy_mark: Decimal, sell_mark: Decimal) -> (Arc<PaperGateway>, Arc<PaperGateway>, TradeExecutor) {
        let buy = paper("a", buy_mark);
        let sell = paper("b", sell_mark);
        let mut registry = GatewayRegistry::new();
        registry.insert(Arc::clone(&buy) as Arc<dyn crate::gateway::ExchangeGateway>);
        registry.insert(Arc::clone(&sell) as Arc<dyn crate::gateway::ExchangeGateway>);
        let executor = TradeExecutor::new(Arc::new(registry));
        (buy, sell, executor)
    }

    fn opportunity() -> Opportunity {
        Opportunity::new(
            Instrument::from("BTC/USDT"),
            VenueId::from("a"),
            VenueId::from("b"),
            dec!(100),
            dec!(101),
            dec!(0.8),
        )
    }

    #[tokio::test]
    async fn both_legs_fill_completes_with_pnl() {
        let (_, _, executor) = setup(dec!(100), dec!(101));
        let record = executor.execute(&opportunity(), dec!(2)).await;

        assert_eq!(record.status(), TradeStatus::Completed);
        assert_eq!(record.realized_pnl(), dec!(2));
        assert!(record.buy_leg().is_some());
        assert!(record.sell_leg().is_some());
    }

    #[tokio::test]
    async fn failed_buy_never_attempts_sell() {
        let (buy, sell, executor) = setup(dec!(100), dec!(101));
        buy.fail_next_order("insufficient balance");

        let record = executor.execute(&opportunity(), dec!(1)).await;

        assert_eq!(record.status(), TradeStatus::Failed);
        assert!(record.sell_leg().is_none());
        // the scripted failure on the sell venue must still be queued:
        // nothing consumed it
        sell.fail_next_order("sentinel");
        let later = sell
            .place_market_order(&Instrument::from("BTC/USDT"), OrderSide::Sell, dec!(1))
            .await;
        assert!(later.is_err());
    }

    #[tokio::test]
    async fn failed_sell_after_buy_is_partial() {
        let (_, sell, executor) = setup(dec!(100), dec!(101));
        sell.fail_next_order("market closed");

        let record = executor.execute(&opportunity(), dec!(1)).await;

        assert_eq!(record.status(), TradeStatus::Partial);
        assert!(record.buy_leg().is_some());
        assert!(record.sell_leg().is_none());
        assert_eq!(record.realized_pnl(), Decimal::ZERO);
        assert!(matches!(
            record.error(),
            Some(ExecutionError::SellLeg { .. })
        ));
    }

    #[tokio::test]
    async fn non_positive_quantity_fails_before_any_order() {
        let (buy, _, executor) = setup(dec!(100), dec!(101));
        buy.fail_next_order("sentinel");

        let record = executor.execute(&opportunity(), dec!(0)).await;

        assert_eq!(record.status(), TradeStatus::Failed);
        assert!(matches!(
            record.error(),
            Some(ExecutionError::InvalidQuantity(_))
        ));
        // sentinel still queued: no order reached the venue
        let later = buy
            .place_market_order(&Instrument::from("BTC/USDT"), OrderSide::Buy, dec!(1))
            .await;
        assert!(later.is_err());
    }

    #[tokio::test]
    async fn unknown_venue_fails_cleanly() {
        let (_, _, executor) = setup(dec!(100), dec!(101));
        let opp = Opportunity::new(
            Instrument::from("BTC/USDT"),
            VenueId::from("missing"),
            VenueId::from("b"),
            dec!(100),
            dec!(101),
            dec!(0.8),
        );

        let record = executor.execute(&opp, dec!(1)).await;
        assert_eq!(record.status(), TradeStatus::Failed);
        assert!(matches!(
            record.error(),
            Some(ExecutionError::UnknownVenue(_))
        ));
    }
}
