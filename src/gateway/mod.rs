//! Exchange Gateway layer.
//!
//! One [`ExchangeGateway`] implementation per venue kind, all exposing
//! the identical capability surface the core consumes. The registry is
//! built once at startup from configuration; venues without credentials
//! still serve quotes (detection-only).

mod binance;
mod kucoin;
mod paper;
mod signing;
mod traits;

pub use binance::BinanceGateway;
pub use kucoin::KucoinGateway;
pub use paper::{PaperBook, PaperGateway};
pub use traits::{
    AssetBalance, ExchangeGateway, OrderResult, OrderSide, OrderStatus, VenueCredentials,
};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::{Config, VenueKind};
use crate::domain::{Instrument, VenueId};
use crate::error::{ConfigError, Result};
use crate::secrets::CredentialStore;

/// Venue id -> gateway, iterated in deterministic order.
pub struct GatewayRegistry {
    gateways: BTreeMap<VenueId, Arc<dyn ExchangeGateway>>,
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRegistry")
            .field("venues", &self.gateways.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self {
            gateways: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, gateway: Arc<dyn ExchangeGateway>) {
        self.gateways.insert(gateway.venue().clone(), gateway);
    }

    pub fn get(&self, venue: &VenueId) -> Option<Arc<dyn ExchangeGateway>> {
        self.gateways.get(venue).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VenueId, &Arc<dyn ExchangeGateway>)> {
        self.gateways.iter()
    }

    pub fn venues(&self) -> impl Iterator<Item = &VenueId> {
        self.gateways.keys()
    }

    /// Taker fee per venue, for spread math.
    pub fn taker_fees(&self) -> BTreeMap<VenueId, Decimal> {
        self.gateways
            .iter()
            .map(|(venue, gw)| (venue.clone(), gw.taker_fee()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

impl Default for GatewayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the gateway registry from configuration.
///
/// Credentials are looked up as `{venue}_api_key` / `{venue}_api_secret`
/// (plus `{venue}_passphrase` where the venue requires one). A venue
/// with no credentials is registered for quotes only.
pub fn build_registry(
    config: &Config,
    credentials: &dyn CredentialStore,
) -> Result<GatewayRegistry> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let mut registry = GatewayRegistry::new();

    for (name, venue_cfg) in &config.venues {
        let venue = VenueId::from(name.as_str());
        let creds = load_credentials(name, credentials);

        let gateway: Arc<dyn ExchangeGateway> = match venue_cfg.kind {
            VenueKind::Binance => Arc::new(BinanceGateway::new(
                venue.clone(),
                client.clone(),
                venue_cfg
                    .api_url
                    .clone()
                    .unwrap_or_else(|| binance::DEFAULT_API_URL.to_string()),
                venue_cfg.taker_fee,
                creds.clone(),
            )),
            VenueKind::Kucoin => Arc::new(KucoinGateway::new(
                venue.clone(),
                client.clone(),
                venue_cfg
                    .api_url
                    .clone()
                    .unwrap_or_else(|| kucoin::DEFAULT_API_URL.to_string()),
                venue_cfg.taker_fee,
                creds.clone(),
            )),
            VenueKind::Paper => {
                let mut book = PaperBook::default();
                if let Some(paper) = &venue_cfg.paper {
                    book.half_spread = paper.half_spread;
                    for (instrument, mark) in &paper.marks {
                        book.marks.insert(Instrument::from(instrument.as_str()), *mark);
                    }
                    for (asset, amount) in &paper.balances {
                        book.balances.insert(asset.clone(), *amount);
                    }
                }
                Arc::new(PaperGateway::new(venue.clone(), venue_cfg.taker_fee, book))
            }
        };

        match venue_cfg.kind {
            VenueKind::Paper => {
                info!(venue = %venue, "Initialized paper venue");
            }
            _ if creds.is_some() => {
                info!(venue = %venue, "Initialized venue - trading enabled");
            }
            _ => {
                warn!(venue = %venue, "No API credentials found - quotes only");
            }
        }

        registry.insert(gateway);
    }

    if registry.len() < 2 {
        return Err(ConfigError::InvalidValue {
            field: "venues",
            reason: format!(
                "cross-venue arbitrage needs at least 2 venues, got {}",
                registry.len()
            ),
        }
        .into());
    }

    Ok(registry)
}

fn load_credentials(venue: &str, store: &dyn CredentialStore) -> Option<VenueCredentials> {
    let api_key = store.get(&format!("{venue}_api_key"))?;
    let api_secret = store.get(&format!("{venue}_api_secret"))?;
    let passphrase = store.get(&format!("{venue}_passphrase"));
    Some(VenueCredentials {
        api_key,
        api_secret,
        passphrase,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticCredentials;
    use rust_decimal_macros::dec;

    #[test]
    fn registry_iterates_in_venue_order() {
        let mut registry = GatewayRegistry::new();
        registry.insert(Arc::new(PaperGateway::new(
            VenueId::from("zeta"),
            dec!(0.001),
            PaperBook::default(),
        )));
        registry.insert(Arc::new(PaperGateway::new(
            VenueId::from("alpha"),
            dec!(0.002),
            PaperBook::default(),
        )));

        let venues: Vec<_> = registry.venues().map(VenueId::as_str).collect();
        assert_eq!(venues, vec!["alpha", "zeta"]);

        let fees = registry.taker_fees();
        assert_eq!(fees[&VenueId::from("alpha")], dec!(0.002));
    }

    #[test]
    fn load_credentials_requires_key_and_secret() {
        let store = StaticCredentials::new().with("binance_api_key", "k");
        assert!(load_credentials("binance", &store).is_none());

        let store = StaticCredentials::new()
            .with("kucoin_api_key", "k")
            .with("kucoin_api_secret", "s")
            .with("kucoin_passphrase", "p");
        let creds = load_credentials("kucoin", &store).unwrap();
        assert_eq!(creds.passphrase.as_deref(), Some("p"));
    }

    #[test]
    fn build_registry_rejects_single_venue() {
        let mut config = Config::default();
        config.venues.retain(|name, _| name == "binance");

        let err = build_registry(&config, &StaticCredentials::new()).unwrap_err();
        assert!(err.to_string().contains("at least 2 venues"));
    }

    #[test]
    fn build_registry_from_default_config() {
        let registry = build_registry(&Config::default(), &StaticCredentials::new()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&VenueId::from("binance")).is_some());
        assert!(registry.get(&VenueId::from("kucoin")).is_some());
    }
}
