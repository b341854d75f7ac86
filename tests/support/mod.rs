//! Shared test support: a scriptable, call-counting mock gateway.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use arbhound::domain::{Instrument, Price, Quantity, Quote, VenueId};
use arbhound::error::GatewayError;
use arbhound::gateway::{
    AssetBalance, ExchangeGateway, GatewayRegistry, OrderResult, OrderSide, OrderStatus,
};

/// Mock gateway whose quotes and order outcomes are scripted per test,
/// with call counters for contract assertions.
pub struct MockGateway {
    venue: VenueId,
    taker_fee: Decimal,
    quotes: Mutex<HashMap<Instrument, Result<Quote, GatewayError>>>,
    order_results: Mutex<VecDeque<Result<OrderResult, GatewayError>>>,
    pub buy_calls: AtomicUsize,
    pub sell_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(venue: &str) -> Self {
        Self {
            venue: VenueId::from(venue),
            taker_fee: Decimal::new(1, 3), // 0.1%
            quotes: Mutex::new(HashMap::new()),
            order_results: Mutex::new(VecDeque::new()),
            buy_calls: AtomicUsize::new(0),
            sell_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_taker_fee(mut self, fee: Decimal) -> Self {
        self.taker_fee = fee;
        self
    }

    /// Script a quote for an instrument.
    pub fn quote_ok(&self, instrument: &str, bid: Price, ask: Price) {
        let instrument = Instrument::from(instrument);
        let quote = Quote {
            venue: self.venue.clone(),
            instrument: instrument.clone(),
            bid,
            ask,
            last: (bid + ask) / Decimal::TWO,
            timestamp: Utc::now(),
        };
        self.quotes.lock().insert(instrument, Ok(quote));
    }

    /// Script a quote failure for an instrument.
    pub fn quote_err(&self, instrument: &str, message: &str) {
        self.quotes.lock().insert(
            Instrument::from(instrument),
            Err(GatewayError::Request(message.to_string())),
        );
    }

    /// Script the next order placement to fill at `price`.
    pub fn next_order_fills(&self, price: Price, quantity: Quantity) {
        self.order_results.lock().push_back(Ok(OrderResult {
            order_id: format!("mock-{}", self.venue),
            average_price: price,
            filled_quantity: quantity,
        }));
    }

    /// Script the next order placement to be rejected.
    pub fn next_order_fails(&self, message: &str) {
        self.order_results
            .lock()
            .push_back(Err(GatewayError::OrderRejected(message.to_string())));
    }

    pub fn buy_call_count(&self) -> usize {
        self.buy_calls.load(Ordering::SeqCst)
    }

    pub fn sell_call_count(&self) -> usize {
        self.sell_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    fn venue(&self) -> &VenueId {
        &self.venue
    }

    fn taker_fee(&self) -> Decimal {
        self.taker_fee
    }

    async fn quote(&self, instrument: &Instrument) -> Result<Quote, GatewayError> {
        self.quotes
            .lock()
            .get(instrument)
            .cloned()
            .unwrap_or_else(|| Err(GatewayError::Request("no scripted quote".to_string())))
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, GatewayError> {
        Ok(HashMap::new())
    }

    async fn place_market_order(
        &self,
        _instrument: &Instrument,
        side: OrderSide,
        quantity: Quantity,
    ) -> Result<OrderResult, GatewayError> {
        match side {
            OrderSide::Buy => self.buy_calls.fetch_add(1, Ordering::SeqCst),
            OrderSide::Sell => self.sell_calls.fetch_add(1, Ordering::SeqCst),
        };

        self.order_results.lock().pop_front().unwrap_or_else(|| {
            Ok(OrderResult {
                order_id: format!("mock-{}", self.venue),
                average_price: Decimal::ONE_HUNDRED,
                filled_quantity: quantity,
            })
        })
    }

    async fn order_status(
        &self,
        _order_id: &str,
        _instrument: &Instrument,
    ) -> Result<OrderStatus, GatewayError> {
        Ok(OrderStatus::Filled)
    }

    async fn cancel_order(
        &self,
        _order_id: &str,
        _instrument: &Instrument,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Build a registry from mock gateways.
pub fn registry_of(gateways: &[Arc<MockGateway>]) -> Arc<GatewayRegistry> {
    let mut registry = GatewayRegistry::new();
    for gateway in gateways {
        registry.insert(Arc::clone(gateway) as Arc<dyn ExchangeGateway>);
    }
    Arc::new(registry)
}

/// Taker fees keyed by venue, as the detector consumes them.
pub fn fees_of(gateways: &[Arc<MockGateway>]) -> BTreeMap<VenueId, Decimal> {
    gateways
        .iter()
        .map(|g| (g.venue().clone(), g.taker_fee()))
        .collect()
}
