//! Simulated venue for dry runs and tests.
//!
//! Fills market orders instantly against a configurable mark price with
//! a fixed half-spread. Order failures can be scripted to exercise the
//! partial-trade paths without a real venue.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Instrument, Price, Quantity, Quote, VenueId};
use crate::error::GatewayError;

use super::traits::{AssetBalance, ExchangeGateway, OrderResult, OrderSide, OrderStatus};

/// Mark prices and behavior knobs for one paper venue.
#[derive(Debug, Clone)]
pub struct PaperBook {
    /// Mid price per instrument.
    pub marks: BTreeMap<Instrument, Price>,
    /// Half-spread as a fraction of the mark (0.0005 = 5 bps each side).
    pub half_spread: Decimal,
    /// Initial balances per asset.
    pub balances: BTreeMap<String, Decimal>,
}

impl Default for PaperBook {
    fn default() -> Self {
        Self {
            marks: BTreeMap::new(),
            half_spread: Decimal::new(5, 4), // 5 bps
            balances: BTreeMap::new(),
        }
    }
}

struct PaperState {
    book: PaperBook,
    /// Scripted failures consumed by subsequent order placements.
    failures: VecDeque<String>,
    /// Orders placed so far, by id.
    orders: HashMap<String, OrderStatus>,
}

pub struct PaperGateway {
    venue: VenueId,
    taker_fee: Decimal,
    state: Mutex<PaperState>,
    order_seq: AtomicU64,
}

impl PaperGateway {
    pub fn new(venue: VenueId, taker_fee: Decimal, book: PaperBook) -> Self {
        Self {
            venue,
            taker_fee,
            state: Mutex::new(PaperState {
                book,
                failures: VecDeque::new(),
                orders: HashMap::new(),
            }),
            order_seq: AtomicU64::new(1),
        }
    }

    /// Move the mark price for an instrument.
    pub fn set_mark(&self, instrument: Instrument, price: Price) {
        self.state.lock().book.marks.insert(instrument, price);
    }

    /// Queue a rejection for the next order placement.
    pub fn fail_next_order(&self, reason: impl Into<String>) {
        self.state.lock().failures.push_back(reason.into());
    }

    /// Credit an asset balance.
    pub fn deposit(&self, asset: impl Into<String>, amount: Decimal) {
        *self
            .state
            .lock()
            .book
            .balances
            .entry(asset.into())
            .or_insert(Decimal::ZERO) += amount;
    }

    fn bid_ask(book: &PaperBook, mark: Price) -> (Price, Price) {
        let half = mark * book.half_spread;
        (mark - half, mark + half)
    }
}

#[async_trait]
impl ExchangeGateway for PaperGateway {
    fn venue(&self) -> &VenueId {
        &self.venue
    }

    fn taker_fee(&self) -> Decimal {
        self.taker_fee
    }

    async fn quote(&self, instrument: &Instrument) -> Result<Quote, GatewayError> {
        let state = self.state.lock();
        let mark = *state
            .book
            .marks
            .get(instrument)
            .ok_or_else(|| GatewayError::Request(format!("no mark for {instrument}")))?;
        let (bid, ask) = Self::bid_ask(&state.book, mark);

        Ok(Quote {
            venue: self.venue.clone(),
            instrument: instrument.clone(),
            bid,
            ask,
            last: mark,
            timestamp: Utc::now(),
        })
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, GatewayError> {
        let state = self.state.lock();
        Ok(state
            .book
            .balances
            .iter()
            .map(|(asset, &total)| {
                (
                    asset.clone(),
                    AssetBalance {
                        free: total,
                        locked: Decimal::ZERO,
                        total,
                    },
                )
            })
            .collect())
    }

    async fn place_market_order(
        &self,
        instrument: &Instrument,
        side: OrderSide,
        quantity: Quantity,
    ) -> Result<OrderResult, GatewayError> {
        let mut state = self.state.lock();

        if let Some(reason) = state.failures.pop_front() {
            return Err(GatewayError::OrderRejected(reason));
        }

        let mark = *state
            .book
            .marks
            .get(instrument)
            .ok_or_else(|| GatewayError::Request(format!("no mark for {instrument}")))?;
        let (bid, ask) = Self::bid_ask(&state.book, mark);
        let price = match side {
            OrderSide::Buy => ask,
            OrderSide::Sell => bid,
        };

        let order_id = format!(
            "paper-{}-{}",
            self.venue,
            self.order_seq.fetch_add(1, Ordering::Relaxed)
        );
        state.orders.insert(order_id.clone(), OrderStatus::Filled);

        Ok(OrderResult {
            order_id,
            average_price: price,
            filled_quantity: quantity,
        })
    }

    async fn order_status(
        &self,
        order_id: &str,
        _instrument: &Instrument,
    ) -> Result<OrderStatus, GatewayError> {
        self.state
            .lock()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownOrder(order_id.to_string()))
    }

    async fn cancel_order(
        &self,
        order_id: &str,
        _instrument: &Instrument,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        match state.orders.get_mut(order_id) {
            Some(status) => {
                *status = OrderStatus::Canceled;
                Ok(())
            }
            None => Err(GatewayError::UnknownOrder(order_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gateway() -> PaperGateway {
        let mut book = PaperBook::default();
        book.marks.insert(Instrument::from("BTC/USDT"), dec!(43000));
        PaperGateway::new(VenueId::from("paper-a"), dec!(0.001), book)
    }

    #[tokio::test]
    async fn quote_straddles_the_mark() {
        let gw = gateway();
        let quote = gw.quote(&Instrument::from("BTC/USDT")).await.unwrap();

        assert_eq!(quote.last, dec!(43000));
        assert_eq!(quote.bid, dec!(42978.5000));
        assert_eq!(quote.ask, dec!(43021.5000));
        assert!(quote.is_actionable());
    }

    #[tokio::test]
    async fn unknown_instrument_errors() {
        let gw = gateway();
        assert!(gw.quote(&Instrument::from("ETH/USDT")).await.is_err());
    }

    #[tokio::test]
    async fn buy_fills_at_ask_and_sell_at_bid() {
        let gw = gateway();
        let inst = Instrument::from("BTC/USDT");

        let buy = gw
            .place_market_order(&inst, OrderSide::Buy, dec!(0.5))
            .await
            .unwrap();
        assert_eq!(buy.average_price, dec!(43021.5000));
        assert_eq!(buy.filled_quantity, dec!(0.5));

        let sell = gw
            .place_market_order(&inst, OrderSide::Sell, dec!(0.5))
            .await
            .unwrap();
        assert_eq!(sell.average_price, dec!(42978.5000));
    }

    #[tokio::test]
    async fn scripted_failure_rejects_one_order() {
        let gw = gateway();
        let inst = Instrument::from("BTC/USDT");
        gw.fail_next_order("insufficient balance");

        let first = gw.place_market_order(&inst, OrderSide::Buy, dec!(1)).await;
        assert!(matches!(first, Err(GatewayError::OrderRejected(_))));

        let second = gw.place_market_order(&inst, OrderSide::Buy, dec!(1)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn orders_can_be_inspected_and_canceled() {
        let gw = gateway();
        let inst = Instrument::from("BTC/USDT");
        let fill = gw
            .place_market_order(&inst, OrderSide::Buy, dec!(1))
            .await
            .unwrap();

        assert_eq!(
            gw.order_status(&fill.order_id, &inst).await.unwrap(),
            OrderStatus::Filled
        );
        gw.cancel_order(&fill.order_id, &inst).await.unwrap();
        assert_eq!(
            gw.order_status(&fill.order_id, &inst).await.unwrap(),
            OrderStatus::Canceled
        );
        assert!(gw.order_status("missing", &inst).await.is_err());
    }

    #[tokio::test]
    async fn deposits_show_in_balances() {
        let gw = gateway();
        gw.deposit("USDT", dec!(1000));
        gw.deposit("USDT", dec!(500));

        let balances = gw.balances().await.unwrap();
        assert_eq!(balances["USDT"].total, dec!(1500));
        assert_eq!(balances["USDT"].free, dec!(1500));
    }
}
