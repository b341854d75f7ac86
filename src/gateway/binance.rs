//! Binance spot REST adapter.
//!
//! Quotes come from the public 24hr ticker endpoint; signed endpoints
//! (orders, balances) use the query-string HMAC-SHA256 scheme with the
//! `X-MBX-APIKEY` header. Without credentials the adapter still serves
//! quotes and reports a missing credential on any signed call.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Instrument, Quantity, Quote, VenueId};
use crate::error::GatewayError;

use super::signing::sign_hex;
use super::traits::{
    AssetBalance, ExchangeGateway, OrderResult, OrderSide, OrderStatus, VenueCredentials,
};

pub const DEFAULT_API_URL: &str = "https://api.binance.com";

const RECV_WINDOW_MS: u32 = 5_000;

pub struct BinanceGateway {
    venue: VenueId,
    client: Client,
    api_url: String,
    taker_fee: Decimal,
    credentials: Option<VenueCredentials>,
}

impl BinanceGateway {
    pub fn new(
        venue: VenueId,
        client: Client,
        api_url: impl Into<String>,
        taker_fee: Decimal,
        credentials: Option<VenueCredentials>,
    ) -> Self {
        Self {
            venue,
            client,
            api_url: api_url.into(),
            taker_fee,
            credentials,
        }
    }

    /// `BTC/USDT` -> `BTCUSDT`
    fn symbol(instrument: &Instrument) -> String {
        instrument.as_str().replace('/', "")
    }

    fn credentials(&self) -> Result<&VenueCredentials, GatewayError> {
        self.credentials.as_ref().ok_or_else(|| {
            GatewayError::MissingCredential(format!("{}_api_key", self.venue))
        })
    }

    /// Append timestamp and signature to a query string and return the
    /// full signed query.
    fn sign_query(&self, query: &str) -> Result<String, GatewayError> {
        let creds = self.credentials()?;
        let timestamp = Utc::now().timestamp_millis();
        let query = if query.is_empty() {
            format!("recvWindow={RECV_WINDOW_MS}&timestamp={timestamp}")
        } else {
            format!("{query}&recvWindow={RECV_WINDOW_MS}&timestamp={timestamp}")
        };
        let signature = sign_hex(&creds.api_secret, &query);
        Ok(format!("{query}&signature={signature}"))
    }

    async fn check_error(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(err) = serde_json::from_str::<ApiError>(&body) {
            return Err(GatewayError::OrderRejected(format!(
                "{} ({})",
                err.msg, err.code
            )));
        }
        Err(GatewayError::Request(format!("HTTP {status}: {body}")))
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24hr {
    bid_price: Decimal,
    ask_price: Decimal,
    last_price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: u64,
    executed_qty: Decimal,
    cummulative_quote_qty: Decimal,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    balances: Vec<BalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    asset: String,
    free: Decimal,
    locked: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderStatusResponse {
    status: String,
}

fn parse_order_status(status: &str) -> OrderStatus {
    match status {
        "NEW" | "PARTIALLY_FILLED" => OrderStatus::Open,
        "FILLED" => OrderStatus::Filled,
        "CANCELED" | "EXPIRED" => OrderStatus::Canceled,
        _ => OrderStatus::Rejected,
    }
}

fn fill_from_order(venue: &VenueId, order: OrderResponse) -> Result<OrderResult, GatewayError> {
    if order.executed_qty <= Decimal::ZERO {
        return Err(GatewayError::MalformedResponse(format!(
            "order {} on {} reported no fill (status {})",
            order.order_id, venue, order.status
        )));
    }
    Ok(OrderResult {
        order_id: order.order_id.to_string(),
        average_price: order.cummulative_quote_qty / order.executed_qty,
        filled_quantity: order.executed_qty,
    })
}

#[async_trait]
impl ExchangeGateway for BinanceGateway {
    fn venue(&self) -> &VenueId {
        &self.venue
    }

    fn taker_fee(&self) -> Decimal {
        self.taker_fee
    }

    async fn quote(&self, instrument: &Instrument) -> Result<Quote, GatewayError> {
        let url = format!(
            "{}/api/v3/ticker/24hr?symbol={}",
            self.api_url,
            Self::symbol(instrument)
        );
        let response = Self::check_error(self.client.get(&url).send().await?).await?;
        let ticker: Ticker24hr = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        debug!(venue = %self.venue, instrument = %instrument, bid = %ticker.bid_price, ask = %ticker.ask_price, "Fetched quote");

        Ok(Quote {
            venue: self.venue.clone(),
            instrument: instrument.clone(),
            bid: ticker.bid_price,
            ask: ticker.ask_price,
            last: ticker.last_price,
            timestamp: Utc::now(),
        })
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, GatewayError> {
        let creds = self.credentials()?;
        let query = self.sign_query("")?;
        let url = format!("{}/api/v3/account?{query}", self.api_url);
        let response = Self::check_error(
            self.client
                .get(&url)
                .header("X-MBX-APIKEY", &creds.api_key)
                .send()
                .await?,
        )
        .await?;
        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(account
            .balances
            .into_iter()
            .filter(|b| b.free > Decimal::ZERO || b.locked > Decimal::ZERO)
            .map(|b| {
                (
                    b.asset,
                    AssetBalance {
                        free: b.free,
                        locked: b.locked,
                        total: b.free + b.locked,
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
        let creds = self.credentials()?;
        let side_str = match side {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        };
        let query = self.sign_query(&format!(
            "symbol={}&side={side_str}&type=MARKET&quantity={quantity}&newOrderRespType=FULL",
            Self::symbol(instrument)
        ))?;
        let url = format!("{}/api/v3/order?{query}", self.api_url);
        let response = Self::check_error(
            self.client
                .post(&url)
                .header("X-MBX-APIKEY", &creds.api_key)
                .send()
                .await?,
        )
        .await?;
        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        fill_from_order(&self.venue, order)
    }

    async fn order_status(
        &self,
        order_id: &str,
        instrument: &Instrument,
    ) -> Result<OrderStatus, GatewayError> {
        let creds = self.credentials()?;
        let query = self.sign_query(&format!(
            "symbol={}&orderId={order_id}",
            Self::symbol(instrument)
        ))?;
        let url = format!("{}/api/v3/order?{query}", self.api_url);
        let response = Self::check_error(
            self.client
                .get(&url)
                .header("X-MBX-APIKEY", &creds.api_key)
                .send()
                .await?,
        )
        .await?;
        let status: OrderStatusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(parse_order_status(&status.status))
    }

    async fn cancel_order(
        &self,
        order_id: &str,
        instrument: &Instrument,
    ) -> Result<(), GatewayError> {
        let creds = self.credentials()?;
        let query = self.sign_query(&format!(
            "symbol={}&orderId={order_id}",
            Self::symbol(instrument)
        ))?;
        let url = format!("{}/api/v3/order?{query}", self.api_url);
        Self::check_error(
            self.client
                .delete(&url)
                .header("X-MBX-APIKEY", &creds.api_key)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}
