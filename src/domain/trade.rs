//! Trade records for two-legged arbitrage executions.
//!
//! A [`TradeRecord`] is created `Pending` and moves exactly once to one
//! of three terminal states:
//!
//! - **Completed**: both legs filled, realized P&L is known.
//! - **Partial**: the buy leg filled but the sell leg did not; unhedged
//!   inventory now exists on the buy venue and is not resolved here.
//! - **Failed**: the buy leg did not fill; no position was opened.
//!
//! Transitions are one-way. A terminal record is never reopened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ExecutionError;

use super::ids::{Instrument, VenueId};
use super::money::{Price, Quantity};
use super::opportunity::Opportunity;

/// Terminal and in-flight states of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Pending,
    Completed,
    Partial,
    Failed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully executed leg with the venue's reported fill.
#[derive(Debug, Clone)]
pub struct LegFill {
    pub venue: VenueId,
    pub order_id: String,
    pub average_price: Price,
    pub filled_quantity: Quantity,
}

/// Outcome of executing one two-legged arbitrage trade.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    instrument: Instrument,
    quantity: Quantity,
    buy_venue: VenueId,
    sell_venue: VenueId,
    buy_leg: Option<LegFill>,
    sell_leg: Option<LegFill>,
    status: TradeStatus,
    error: Option<ExecutionError>,
}

impl TradeRecord {
    /// Open a pending record for an opportunity about to be executed.
    pub fn pending(opportunity: &Opportunity, quantity: Quantity) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            instrument: opportunity.instrument().clone(),
            quantity,
            buy_venue: opportunity.buy_venue().clone(),
            sell_venue: opportunity.sell_venue().clone(),
            buy_leg: None,
            sell_leg: None,
            status: TradeStatus::Pending,
            error: None,
        }
    }

    /// Record the buy fill. Valid only while pending.
    pub fn record_buy_fill(&mut self, fill: LegFill) {
        debug_assert_eq!(self.status, TradeStatus::Pending);
        self.buy_leg = Some(fill);
    }

    /// Terminal: both legs filled.
    pub fn complete(&mut self, sell_fill: LegFill) {
        debug_assert_eq!(self.status, TradeStatus::Pending);
        debug_assert!(self.buy_leg.is_some());
        self.sell_leg = Some(sell_fill);
        self.status = TradeStatus::Completed;
    }

    /// Terminal: buy filled, sell did not. Leaves unhedged inventory.
    pub fn mark_partial(&mut self, error: ExecutionError) {
        debug_assert_eq!(self.status, TradeStatus::Pending);
        debug_assert!(self.buy_leg.is_some());
        self.status = TradeStatus::Partial;
        self.error = Some(error);
    }

    /// Terminal: the buy leg never filled.
    pub fn fail(&mut self, error: ExecutionError) {
        debug_assert_eq!(self.status, TradeStatus::Pending);
        self.status = TradeStatus::Failed;
        self.error = Some(error);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn buy_venue(&self) -> &VenueId {
        &self.buy_venue
    }

    pub fn sell_venue(&self) -> &VenueId {
        &self.sell_venue
    }

    pub fn buy_leg(&self) -> Option<&LegFill> {
        self.buy_leg.as_ref()
    }

    pub fn sell_leg(&self) -> Option<&LegFill> {
        self.sell_leg.as_ref()
    }

    pub fn status(&self) -> TradeStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    /// Realized P&L from the venues' reported average fill prices.
    ///
    /// Zero for anything but a completed trade: a partial fill is
    /// unrealized exposure, not a loss.
    pub fn realized_pnl(&self) -> Decimal {
        match (&self.status, &self.buy_leg, &self.sell_leg) {
            (TradeStatus::Completed, Some(buy), Some(sell)) => {
                sell.average_price * self.quantity - buy.average_price * self.quantity
            }
            _ => Decimal::ZERO,
        }
    }

    /// True for outcomes that count toward the failure streak.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, TradeStatus::Partial | TradeStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use rust_decimal_macros::dec;

    fn opportunity() -> Opportunity {
        Opportunity::new(
            Instrument::from("BTC/USDT"),
            VenueId::from("binance"),
            VenueId::from("kucoin"),
            dec!(100),
            dec!(101),
            dec!(0.8),
        )
    }

    fn fill(venue: &str, price: Decimal) -> LegFill {
        LegFill {
            venue: VenueId::from(venue),
            order_id: "order-1".to_string(),
            average_price: price,
            filled_quantity: dec!(1),
        }
    }

    #[test]
    fn pending_record_has_no_legs() {
        let record = TradeRecord::pending(&opportunity(), dec!(1));
        assert_eq!(record.status(), TradeStatus::Pending);
        assert!(record.buy_leg().is_none());
        assert!(record.sell_leg().is_none());
        assert!(!record.status().is_terminal());
    }

    #[test]
    fn completed_trade_realizes_pnl() {
        let mut record = TradeRecord::pending(&opportunity(), dec!(2));
        record.record_buy_fill(fill("binance", dec!(100)));
        record.complete(fill("kucoin", dec!(101)));

        assert_eq!(record.status(), TradeStatus::Completed);
        assert_eq!(record.realized_pnl(), dec!(2));
        assert!(!record.is_failure());
    }

    #[test]
    fn partial_trade_has_zero_pnl() {
        let mut record = TradeRecord::pending(&opportunity(), dec!(1));
        record.record_buy_fill(fill("binance", dec!(100)));
        record.mark_partial(ExecutionError::SellLeg {
            venue: VenueId::from("kucoin"),
            source: GatewayError::OrderRejected("insufficient balance".into()),
        });

        assert_eq!(record.status(), TradeStatus::Partial);
        assert_eq!(record.realized_pnl(), Decimal::ZERO);
        assert!(record.is_failure());
        assert!(record.buy_leg().is_some());
        assert!(record.sell_leg().is_none());
    }

    #[test]
    fn failed_trade_has_no_legs_and_zero_pnl() {
        let mut record = TradeRecord::pending(&opportunity(), dec!(1));
        record.fail(ExecutionError::BuyLeg {
            venue: VenueId::from("binance"),
            source: GatewayError::Request("connection refused".into()),
        });

        assert_eq!(record.status(), TradeStatus::Failed);
        assert_eq!(record.realized_pnl(), Decimal::ZERO);
        assert!(record.is_failure());
        assert!(record.error().is_some());
    }

    #[test]
    fn status_display() {
        assert_eq!(TradeStatus::Partial.to_string(), "partial");
        assert_eq!(TradeStatus::Completed.to_string(), "completed");
    }
}
