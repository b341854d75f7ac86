//! Inventory drift analysis across venues.
//!
//! Arbitrage slowly migrates inventory toward the venues it sells on.
//! This monitor compares per-venue balances against an equal-allocation
//! ideal and suggests rebalancing transfers. Suggestions are advisory
//! only; nothing here places orders.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::domain::{Instrument, PriceSnapshot, VenueId};
use crate::gateway::{AssetBalance, GatewayRegistry, OrderSide};

/// Balances per venue, per asset.
pub type VenueBalances = BTreeMap<VenueId, BTreeMap<String, AssetBalance>>;

/// Drift beyond which a venue counts as excess/deficit.
const DRIFT_BAND_PCT: Decimal = Decimal::TEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    Excess,
    Deficit,
    Balanced,
}

/// How one venue's holding of an asset compares to the ideal.
#[derive(Debug, Clone, Serialize)]
pub struct DriftEntry {
    pub actual: Decimal,
    pub ideal: Decimal,
    pub drift_pct: Decimal,
    pub status: DriftStatus,
}

/// An advisory transfer to move inventory back toward balance.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceSuggestion {
    pub action: String,
    pub venue: VenueId,
    pub asset: String,
    pub amount: Decimal,
    pub reason: &'static str,
}

pub struct InventoryMonitor {
    gateways: Arc<GatewayRegistry>,
}

impl InventoryMonitor {
    pub fn new(gateways: Arc<GatewayRegistry>) -> Self {
        Self { gateways }
    }

    /// Fetch balances from every venue concurrently. A failing venue
    /// yields an empty entry rather than an error.
    pub async fn fetch_all_balances(&self) -> VenueBalances {
        let fetches = self.gateways.iter().map(|(venue, gateway)| {
            let venue = venue.clone();
            let gateway = Arc::clone(gateway);
            async move { (venue, gateway.balances().await) }
        });

        let mut balances = VenueBalances::new();
        for (venue, result) in join_all(fetches).await {
            match result {
                Ok(assets) => {
                    balances.insert(venue, assets.into_iter().collect());
                }
                Err(error) => {
                    warn!(venue = %venue, error = %error, "Balance fetch failed");
                    balances.insert(venue, BTreeMap::new());
                }
            }
        }
        balances
    }

    /// Per-venue drift of one asset's free balance against an equal
    /// split across all venues.
    pub fn calculate_drift(
        balances: &VenueBalances,
        asset: &str,
    ) -> BTreeMap<VenueId, DriftEntry> {
        let venue_count = Decimal::from(balances.len() as u64);
        if venue_count.is_zero() {
            return BTreeMap::new();
        }

        let total: Decimal = balances
            .values()
            .filter_map(|assets| assets.get(asset))
            .map(|b| b.free)
            .sum();
        let ideal = total / venue_count;

        balances
            .iter()
            .filter(|(_, assets)| assets.contains_key(asset))
            .map(|(venue, assets)| {
                let actual = assets[asset].free;
                let drift_pct = if ideal > Decimal::ZERO {
                    (actual - ideal) / ideal * Decimal::ONE_HUNDRED
                } else {
                    Decimal::ZERO
                };
                let status = if drift_pct > DRIFT_BAND_PCT {
                    DriftStatus::Excess
                } else if drift_pct < -DRIFT_BAND_PCT {
                    DriftStatus::Deficit
                } else {
                    DriftStatus::Balanced
                };
                (
                    venue.clone(),
                    DriftEntry {
                        actual,
                        ideal,
                        drift_pct,
                        status,
                    },
                )
            })
            .collect()
    }

    /// Advisory rebalancing transfers for the given assets.
    pub fn suggest_rebalancing(
        balances: &VenueBalances,
        assets: &[String],
    ) -> Vec<RebalanceSuggestion> {
        let mut suggestions = Vec::new();

        for asset in assets {
            for (venue, entry) in Self::calculate_drift(balances, asset) {
                match entry.status {
                    DriftStatus::Excess => suggestions.push(RebalanceSuggestion {
                        action: OrderSide::Sell.as_str().to_string(),
                        venue,
                        asset: asset.clone(),
                        amount: entry.actual - entry.ideal,
                        reason: "excess inventory",
                    }),
                    DriftStatus::Deficit => suggestions.push(RebalanceSuggestion {
                        action: OrderSide::Buy.as_str().to_string(),
                        venue,
                        asset: asset.clone(),
                        amount: entry.ideal - entry.actual,
                        reason: "insufficient inventory",
                    }),
                    DriftStatus::Balanced => {}
                }
            }
        }

        suggestions
    }

    /// Total portfolio value in quote currency, priced from each
    /// venue's last trade in the snapshot.
    pub fn portfolio_value(balances: &VenueBalances, snapshot: &PriceSnapshot) -> Decimal {
        let mut total = Decimal::ZERO;

        for (venue, assets) in balances {
            for (asset, balance) in assets {
                if balance.free <= Decimal::ZERO {
                    continue;
                }
                if asset == "USDT" {
                    total += balance.free;
                    continue;
                }
                let instrument = Instrument::from(format!("{asset}/USDT"));
                if let Some(quote) = snapshot.get(&instrument, venue) {
                    total += balance.free * quote.last;
                }
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn balance(free: Decimal) -> AssetBalance {
        AssetBalance {
            free,
            locked: Decimal::ZERO,
            total: free,
        }
    }

    fn balances(entries: &[(&str, &str, Decimal)]) -> VenueBalances {
        let mut balances = VenueBalances::new();
        for (venue, asset, amount) in entries {
            balances
                .entry(VenueId::from(*venue))
                .or_default()
                .insert((*asset).to_string(), balance(*amount));
        }
        balances
    }

    #[test]
    fn equal_holdings_are_balanced() {
        let balances = balances(&[("a", "BTC", dec!(1)), ("b", "BTC", dec!(1))]);
        let drift = InventoryMonitor::calculate_drift(&balances, "BTC");

        assert_eq!(drift[&VenueId::from("a")].status, DriftStatus::Balanced);
        assert_eq!(drift[&VenueId::from("b")].status, DriftStatus::Balanced);
    }

    #[test]
    fn skewed_holdings_show_excess_and_deficit() {
        let balances = balances(&[("a", "BTC", dec!(3)), ("b", "BTC", dec!(1))]);
        let drift = InventoryMonitor::calculate_drift(&balances, "BTC");

        let a = &drift[&VenueId::from("a")];
        assert_eq!(a.status, DriftStatus::Excess);
        assert_eq!(a.ideal, dec!(2));
        assert_eq!(a.drift_pct, dec!(50));

        let b = &drift[&VenueId::from("b")];
        assert_eq!(b.status, DriftStatus::Deficit);
        assert_eq!(b.drift_pct, dec!(-50));
    }

    #[test]
    fn suggestions_move_inventory_toward_ideal() {
        let balances = balances(&[("a", "BTC", dec!(3)), ("b", "BTC", dec!(1))]);
        let suggestions =
            InventoryMonitor::suggest_rebalancing(&balances, &["BTC".to_string()]);

        assert_eq!(suggestions.len(), 2);
        let sell = suggestions
            .iter()
            .find(|s| s.venue == VenueId::from("a"))
            .unwrap();
        assert_eq!(sell.action, "sell");
        assert_eq!(sell.amount, dec!(1));

        let buy = suggestions
            .iter()
            .find(|s| s.venue == VenueId::from("b"))
            .unwrap();
        assert_eq!(buy.action, "buy");
        assert_eq!(buy.amount, dec!(1));
    }

    #[test]
    fn portfolio_value_prices_assets_from_snapshot() {
        let balances = balances(&[
            ("a", "BTC", dec!(2)),
            ("a", "USDT", dec!(500)),
            ("b", "DOGE", dec!(1000)), // no quote available
        ]);

        let mut snapshot = PriceSnapshot::new(Utc::now());
        snapshot.insert(crate::domain::Quote {
            venue: VenueId::from("a"),
            instrument: Instrument::from("BTC/USDT"),
            bid: dec!(42990),
            ask: dec!(43010),
            last: dec!(43000),
            timestamp: Utc::now(),
        });

        let value = InventoryMonitor::portfolio_value(&balances, &snapshot);
        assert_eq!(value, dec!(86500)); // 2 * 43000 + 500
    }

    #[test]
    fn drift_of_unknown_asset_is_empty() {
        let balances = balances(&[("a", "BTC", dec!(1))]);
        let drift = InventoryMonitor::calculate_drift(&balances, "ETH");
        assert!(drift.is_empty());
    }
}
