//! KuCoin spot REST adapter.
//!
//! Same capability surface as the Binance adapter with KuCoin's
//! authentication shape: base64 HMAC-SHA256 over
//! `timestamp + method + path + body`, an API-key version header, and
//! the extra signed passphrase some venues require.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Instrument, Quantity, Quote, VenueId};
use crate::error::GatewayError;

use super::signing::sign_base64;
use super::traits::{
    AssetBalance, ExchangeGateway, OrderResult, OrderSide, OrderStatus, VenueCredentials,
};

pub const DEFAULT_API_URL: &str = "https://api.kucoin.com";

pub struct KucoinGateway {
    venue: VenueId,
    client: Client,
    api_url: String,
    taker_fee: Decimal,
    credentials: Option<VenueCredentials>,
}

impl KucoinGateway {
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

    /// `BTC/USDT` -> `BTC-USDT`
    fn symbol(instrument: &Instrument) -> String {
        instrument.as_str().replace('/', "-")
    }

    fn credentials(&self) -> Result<&VenueCredentials, GatewayError> {
        self.credentials.as_ref().ok_or_else(|| {
            GatewayError::MissingCredential(format!("{}_api_key", self.venue))
        })
    }

    /// Build a signed request for a private endpoint.
    ///
    /// `path` must include the query string, exactly as sent, because
    /// it is part of the signed payload.
    fn signed_request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<String>,
    ) -> Result<reqwest::RequestBuilder, GatewayError> {
        let creds = self.credentials()?;
        let passphrase = creds.passphrase.as_ref().ok_or_else(|| {
            GatewayError::MissingCredential(format!("{}_passphrase", self.venue))
        })?;

        let timestamp = Utc::now().timestamp_millis().to_string();
        let body_str = body.as_deref().unwrap_or("");
        let payload = format!("{timestamp}{method}{path}{body_str}");

        let mut request = self
            .client
            .request(method, format!("{}{path}", self.api_url))
            .header("KC-API-KEY", &creds.api_key)
            .header("KC-API-SIGN", sign_base64(&creds.api_secret, &payload))
            .header("KC-API-TIMESTAMP", timestamp)
            // API key v2 signs the passphrase itself
            .header("KC-API-PASSPHRASE", sign_base64(&creds.api_secret, passphrase))
            .header("KC-API-KEY-VERSION", "2");

        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        Ok(request)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|_| {
            GatewayError::Request(format!("HTTP {status}: {body}"))
        })?;
        if envelope.code != "200000" {
            return Err(GatewayError::OrderRejected(format!(
                "{} ({})",
                envelope.msg.unwrap_or_default(),
                envelope.code
            )));
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::MalformedResponse("missing data field".to_string()))
    }

    async fn fetch_order(&self, order_id: &str) -> Result<OrderDetail, GatewayError> {
        let path = format!("/api/v1/orders/{order_id}");
        let request = self.signed_request(reqwest::Method::GET, &path, None)?;
        Self::unwrap_envelope(request.send().await?).await
    }
}

/// KuCoin wraps every payload in `{code, msg, data}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Level1Ticker {
    best_bid: Decimal,
    best_ask: Decimal,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacedOrder {
    order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetail {
    id: String,
    deal_size: Decimal,
    deal_funds: Decimal,
    is_active: bool,
    cancel_exist: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountEntry {
    currency: String,
    #[serde(rename = "type")]
    kind: String,
    balance: Decimal,
    available: Decimal,
    holds: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanceledOrders {
    #[allow(dead_code)]
    cancelled_order_ids: Vec<String>,
}

fn fill_from_detail(venue: &VenueId, detail: OrderDetail) -> Result<OrderResult, GatewayError> {
    if detail.deal_size <= Decimal::ZERO {
        return Err(GatewayError::MalformedResponse(format!(
            "order {} on {} reported no fill",
            detail.id, venue
        )));
    }
    Ok(OrderResult {
        average_price: detail.deal_funds / detail.deal_size,
        filled_quantity: detail.deal_size,
        order_id: detail.id,
    })
}

#[async_trait]
impl ExchangeGateway for KucoinGateway {
    fn venue(&self) -> &VenueId {
        &self.venue
    }

    fn taker_fee(&self) -> Decimal {
        self.taker_fee
    }

    async fn quote(&self, instrument: &Instrument) -> Result<Quote, GatewayError> {
        let url = format!(
            "{}/api/v1/market/orderbook/level1?symbol={}",
            self.api_url,
            Self::symbol(instrument)
        );
        let ticker: Level1Ticker =
            Self::unwrap_envelope(self.client.get(&url).send().await?).await?;

        debug!(venue = %self.venue, instrument = %instrument, bid = %ticker.best_bid, ask = %ticker.best_ask, "Fetched quote");

        Ok(Quote {
            venue: self.venue.clone(),
            instrument: instrument.clone(),
            bid: ticker.best_bid,
            ask: ticker.best_ask,
            last: ticker.price,
            timestamp: Utc::now(),
        })
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, GatewayError> {
        let request = self.signed_request(reqwest::Method::GET, "/api/v1/accounts", None)?;
        let accounts: Vec<AccountEntry> =
            Self::unwrap_envelope(request.send().await?).await?;

        Ok(accounts
            .into_iter()
            .filter(|a| a.kind == "trade" && a.balance > Decimal::ZERO)
            .map(|a| {
                (
                    a.currency,
                    AssetBalance {
                        free: a.available,
                        locked: a.holds,
                        total: a.balance,
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
        let body = json!({
            "clientOid": Uuid::new_v4().to_string(),
            "symbol": Self::symbol(instrument),
            "side": side.as_str(),
            "type": "market",
            "size": quantity.to_string(),
        })
        .to_string();

        let request =
            self.signed_request(reqwest::Method::POST, "/api/v1/orders", Some(body))?;
        let placed: PlacedOrder = Self::unwrap_envelope(request.send().await?).await?;

        // The placement response carries no fill information; fetch the
        // order once for the deal price.
        let detail = self.fetch_order(&placed.order_id).await?;
        fill_from_detail(&self.venue, detail)
    }

    async fn order_status(
        &self,
        order_id: &str,
        _instrument: &Instrument,
    ) -> Result<OrderStatus, GatewayError> {
        let detail = self.fetch_order(order_id).await?;
        Ok(if detail.is_active {
            OrderStatus::Open
        } else if detail.cancel_exist {
            OrderStatus::Canceled
        } else {
            OrderStatus::Filled
        })
    }

    async fn cancel_order(
        &self,
        order_id: &str,
        _instrument: &Instrument,
    ) -> Result<(), GatewayError> {
        let path = format!("/api/v1/orders/{order_id}");
        let request = self.signed_request(reqwest::Method::DELETE, &path, None)?;
        let _: CanceledOrders = Self::unwrap_envelope(request.send().await?).await?;
        Ok(())
    }
}
