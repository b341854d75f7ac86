//! Contract tests for two-leg execution against a mock gateway.

mod support;

use std::sync::Arc;

use arbhound::domain::{Instrument, Opportunity, TradeStatus, VenueId};
use arbhound::error::ExecutionError;
use arbhound::service::TradeExecutor;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::{registry_of, MockGateway};

fn opportunity(buy: &str, sell: &str) -> Opportunity {
    Opportunity::new(
        Instrument::from("BTC/USDT"),
        VenueId::from(buy),
        VenueId::from(sell),
        dec!(100),
        dec!(101),
        dec!(0.8),
    )
}

#[tokio::test]
async fn failing_buy_leg_invokes_zero_sell_orders() {
    let buy_venue = Arc::new(MockGateway::new("a"));
    let sell_venue = Arc::new(MockGateway::new("b"));
    buy_venue.next_order_fails("insufficient balance");

    let executor = TradeExecutor::new(registry_of(&[
        Arc::clone(&buy_venue),
        Arc::clone(&sell_venue),
    ]));

    let record = executor.execute(&opportunity("a", "b"), dec!(1)).await;

    assert_eq!(record.status(), TradeStatus::Failed);
    assert!(record.sell_leg().is_none());
    assert!(matches!(record.error(), Some(ExecutionError::BuyLeg { .. })));

    // The core correctness invariant: the sell venue saw no order at all.
    assert_eq!(buy_venue.buy_call_count(), 1);
    assert_eq!(sell_venue.sell_call_count(), 0);
    assert_eq!(sell_venue.buy_call_count(), 0);
}

#[tokio::test]
async fn completed_trade_places_exactly_one_order_per_leg() {
    let buy_venue = Arc::new(MockGateway::new("a"));
    let sell_venue = Arc::new(MockGateway::new("b"));
    buy_venue.next_order_fills(dec!(100.02), dec!(1));
    sell_venue.next_order_fills(dec!(100.97), dec!(1));

    let executor = TradeExecutor::new(registry_of(&[
        Arc::clone(&buy_venue),
        Arc::clone(&sell_venue),
    ]));

    let record = executor.execute(&opportunity("a", "b"), dec!(1)).await;

    assert_eq!(record.status(), TradeStatus::Completed);
    assert_eq!(buy_venue.buy_call_count(), 1);
    assert_eq!(sell_venue.sell_call_count(), 1);
    // fill prices come from the gateway-reported averages
    assert_eq!(record.buy_leg().unwrap().average_price, dec!(100.02));
    assert_eq!(record.sell_leg().unwrap().average_price, dec!(100.97));
    assert_eq!(record.realized_pnl(), dec!(0.95));
}

#[tokio::test]
async fn sell_failure_after_buy_produces_partial_with_buy_fill_kept() {
    let buy_venue = Arc::new(MockGateway::new("a"));
    let sell_venue = Arc::new(MockGateway::new("b"));
    buy_venue.next_order_fills(dec!(100), dec!(1));
    sell_venue.next_order_fails("venue maintenance");

    let executor = TradeExecutor::new(registry_of(&[
        Arc::clone(&buy_venue),
        Arc::clone(&sell_venue),
    ]));

    let record = executor.execute(&opportunity("a", "b"), dec!(1)).await;

    assert_eq!(record.status(), TradeStatus::Partial);
    assert_eq!(record.buy_leg().unwrap().average_price, dec!(100));
    assert!(record.sell_leg().is_none());
    assert_eq!(record.realized_pnl(), Decimal::ZERO);
    assert_eq!(sell_venue.sell_call_count(), 1);
    assert!(matches!(
        record.error(),
        Some(ExecutionError::SellLeg { .. })
    ));
}

#[tokio::test]
async fn invalid_quantity_is_rejected_before_any_gateway_call() {
    let buy_venue = Arc::new(MockGateway::new("a"));
    let sell_venue = Arc::new(MockGateway::new("b"));

    let executor = TradeExecutor::new(registry_of(&[
        Arc::clone(&buy_venue),
        Arc::clone(&sell_venue),
    ]));

    let record = executor.execute(&opportunity("a", "b"), dec!(-1)).await;

    assert_eq!(record.status(), TradeStatus::Failed);
    assert_eq!(buy_venue.buy_call_count(), 0);
    assert_eq!(sell_venue.sell_call_count(), 0);
}
