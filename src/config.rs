//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Credentials never live in
//! the config file; they come from the credential store (environment).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

/// Supported gateway kinds. `mexc`, `okx`, `gateio` and `bybit` map
/// onto the same two auth shapes and get adapters as they are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    Binance,
    Kucoin,
    Paper,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Instruments to monitor, in `BASE/QUOTE` form.
    #[serde(default = "default_instruments")]
    pub instruments: Vec<String>,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds between balance snapshots.
    #[serde(default = "default_balance_interval")]
    pub balance_interval_secs: u64,

    /// Backoff after a failed cycle.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    /// Per-request HTTP timeout for venue calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Minimum net spread percentage to report an opportunity.
    #[serde(default = "default_min_spread_pct")]
    pub min_spread_pct: Decimal,

    /// Base-asset quantity per trade.
    #[serde(default = "default_trade_quantity")]
    pub trade_quantity: Decimal,

    /// Execute the top opportunity automatically. Off by default:
    /// detection-only until explicitly enabled.
    #[serde(default)]
    pub auto_trading: bool,

    /// Detect and log but never place orders.
    #[serde(default)]
    pub dry_run: bool,

    /// SQLite database path for the audit journal.
    #[serde(default = "default_database")]
    pub database: String,

    /// Path to the status file for external monitoring.
    #[serde(default = "default_status_file")]
    pub status_file: Option<PathBuf>,

    /// Configured venues, keyed by venue id.
    #[serde(default = "default_venues")]
    pub venues: BTreeMap<String, VenueConfig>,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub telegram: TelegramAppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub kind: VenueKind,

    /// Override the venue's REST base URL (testnets, proxies).
    #[serde(default)]
    pub api_url: Option<String>,

    /// Taker fee as a fraction (0.001 = 0.1%).
    #[serde(default = "default_taker_fee")]
    pub taker_fee: Decimal,

    /// Simulation parameters, paper venues only.
    #[serde(default)]
    pub paper: Option<PaperVenueConfig>,
}

/// Mark prices and knobs for a paper venue.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperVenueConfig {
    /// Mid price per instrument.
    #[serde(default)]
    pub marks: BTreeMap<String, Decimal>,

    /// Half-spread fraction applied either side of the mark.
    #[serde(default = "default_half_spread")]
    pub half_spread: Decimal,

    /// Starting balances per asset.
    #[serde(default)]
    pub balances: BTreeMap<String, Decimal>,
}

/// Risk limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Daily loss limit in quote currency; negative.
    #[serde(default = "default_daily_loss_limit")]
    pub daily_loss_limit: Decimal,

    /// Maximum total exposure in base-asset units.
    #[serde(default = "default_max_exposure")]
    pub max_exposure: Decimal,

    /// Consecutive failed trades beyond which the breaker trips.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Telegram notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    /// Enable telegram notifications.
    #[serde(default)]
    pub enabled: bool,
    /// Send opportunity alerts (can be noisy).
    #[serde(default)]
    pub notify_opportunities: bool,
    /// Send trade execution alerts.
    #[serde(default = "default_true")]
    pub notify_trades: bool,
    /// Send circuit breaker alerts.
    #[serde(default = "default_true")]
    pub notify_circuit_breaker: bool,
}

fn default_instruments() -> Vec<String> {
    vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()]
}

fn default_poll_interval() -> u64 {
    2
}

fn default_balance_interval() -> u64 {
    30
}

fn default_error_backoff() -> u64 {
    5
}

fn default_http_timeout() -> u64 {
    10
}

fn default_min_spread_pct() -> Decimal {
    Decimal::new(3, 1) // 0.3%
}

fn default_trade_quantity() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_database() -> String {
    "arbhound.db".to_string()
}

fn default_status_file() -> Option<PathBuf> {
    Some(PathBuf::from("arbhound-status.json"))
}

fn default_taker_fee() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

fn default_half_spread() -> Decimal {
    Decimal::new(5, 4) // 5 bps
}

fn default_daily_loss_limit() -> Decimal {
    Decimal::from(-100)
}

fn default_max_exposure() -> Decimal {
    Decimal::TEN
}

fn default_max_consecutive_failures() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_venues() -> BTreeMap<String, VenueConfig> {
    let mut venues = BTreeMap::new();
    venues.insert(
        "binance".to_string(),
        VenueConfig {
            kind: VenueKind::Binance,
            api_url: None,
            taker_fee: default_taker_fee(),
            paper: None,
        },
    );
    venues.insert(
        "kucoin".to_string(),
        VenueConfig {
            kind: VenueKind::Kucoin,
            api_url: None,
            taker_fee: default_taker_fee(),
            paper: None,
        },
    );
    venues
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            daily_loss_limit: default_daily_loss_limit(),
            max_exposure: default_max_exposure(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_opportunities: false,
            notify_trades: true,
            notify_circuit_breaker: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            poll_interval_secs: default_poll_interval(),
            balance_interval_secs: default_balance_interval(),
            error_backoff_secs: default_error_backoff(),
            http_timeout_secs: default_http_timeout(),
            min_spread_pct: default_min_spread_pct(),
            trade_quantity: default_trade_quantity(),
            auto_trading: false,
            dry_run: false,
            database: default_database(),
            status_file: default_status_file(),
            venues: default_venues(),
            risk: RiskConfig::default(),
            logging: LoggingConfig::default(),
            telegram: TelegramAppConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(ConfigError::MissingField {
                field: "instruments",
            }
            .into());
        }
        for instrument in &self.instruments {
            if !instrument.contains('/') {
                return Err(ConfigError::InvalidValue {
                    field: "instruments",
                    reason: format!("'{instrument}' is not in BASE/QUOTE form"),
                }
                .into());
            }
        }
        if self.venues.len() < 2 {
            return Err(ConfigError::InvalidValue {
                field: "venues",
                reason: "at least 2 venues are required".to_string(),
            }
            .into());
        }
        for (name, venue) in &self.venues {
            if let Some(api_url) = &venue.api_url {
                url::Url::parse(api_url).map_err(|e| ConfigError::InvalidValue {
                    field: "venues.api_url",
                    reason: format!("{name}: {e}"),
                })?;
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.trade_quantity <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "trade_quantity",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        if self.risk.daily_loss_limit >= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "risk.daily_loss_limit",
                reason: "must be negative".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}
