//! Exchange Gateway trait definitions.
//!
//! Every venue is consumed through the same capability interface;
//! adapters differ only in transport and authentication shape.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Instrument, Price, Quantity, Quote, VenueId};
use crate::error::GatewayError;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filled market order as reported by the venue.
#[derive(Debug, Clone)]
pub struct OrderResult {
    pub order_id: String,
    pub average_price: Price,
    pub filled_quantity: Quantity,
}

/// Venue-reported lifecycle state of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
    Rejected,
}

/// Per-asset balance on one venue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetBalance {
    pub free: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
}

/// API credentials for a venue. Some venues additionally require a
/// passphrase established when the API key was created.
#[derive(Clone)]
pub struct VenueCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for VenueCredentials {
    // Never leak secrets through Debug formatting
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueCredentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Uniform capability interface to one trading venue.
///
/// Errors are data: callers absorb them into absent quotes or failed
/// legs rather than propagating them upward.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// The venue this gateway talks to.
    fn venue(&self) -> &VenueId;

    /// Taker fee as a fraction (0.001 = 0.1%).
    fn taker_fee(&self) -> Decimal;

    /// Fetch the current top-of-book quote for an instrument.
    async fn quote(&self, instrument: &Instrument) -> Result<Quote, GatewayError>;

    /// Fetch all non-zero asset balances.
    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, GatewayError>;

    /// Place a market order and return the venue-reported fill.
    async fn place_market_order(
        &self,
        instrument: &Instrument,
        side: OrderSide,
        quantity: Quantity,
    ) -> Result<OrderResult, GatewayError>;

    /// Look up the status of a previously placed order.
    async fn order_status(
        &self,
        order_id: &str,
        instrument: &Instrument,
    ) -> Result<OrderStatus, GatewayError>;

    /// Cancel an open order.
    async fn cancel_order(
        &self,
        order_id: &str,
        instrument: &Instrument,
    ) -> Result<(), GatewayError>;
}
