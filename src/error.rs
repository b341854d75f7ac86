use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::VenueId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown gateway kind '{kind}' for venue '{venue}'")]
    UnknownGatewayKind { venue: String, kind: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Invalid numeric input to profit/spread computation, rejected before
/// any side effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),
}

/// A venue call failed. Non-fatal: the affected venue is excluded from
/// the current snapshot or the affected leg is marked failed.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("venue rejected order: {0}")]
    OrderRejected(String),

    #[error("unknown order '{0}'")]
    UnknownOrder(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Request(err.to_string())
    }
}

/// A trade leg failed. `BuyLeg` means no position was opened; `SellLeg`
/// means the buy filled and unhedged inventory now exists.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("invalid trade quantity: {0}")]
    InvalidQuantity(Decimal),

    #[error("no gateway configured for venue '{0}'")]
    UnknownVenue(VenueId),

    #[error("buy leg failed on {venue}: {source}")]
    BuyLeg {
        venue: VenueId,
        #[source]
        source: GatewayError,
    },

    #[error("sell leg failed on {venue} after buy fill: {source}")]
    SellLeg {
        venue: VenueId,
        #[source]
        source: GatewayError,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, Error>;
