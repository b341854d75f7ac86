//! Price aggregation across venues.
//!
//! Each poll fans out one quote request per (venue, instrument) pair,
//! bounds every request with a timeout, and assembles whatever came
//! back into a fresh immutable snapshot. A slow or failing venue costs
//! only its own entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::domain::{Instrument, PriceSnapshot};
use crate::gateway::GatewayRegistry;

pub struct PriceAggregator {
    gateways: Arc<GatewayRegistry>,
    state: Arc<AppState>,
    timeout: Duration,
}

impl PriceAggregator {
    /// `timeout` bounds each individual venue call; it should not
    /// exceed the polling interval.
    pub fn new(gateways: Arc<GatewayRegistry>, state: Arc<AppState>, timeout: Duration) -> Self {
        Self {
            gateways,
            state,
            timeout,
        }
    }

    /// Poll every venue for every instrument and publish the resulting
    /// snapshot atomically.
    ///
    /// Per-venue failures and timeouts are absorbed: the venue is
    /// simply absent from the affected instrument's sub-map.
    pub async fn poll(&self, instruments: &[Instrument]) -> Arc<PriceSnapshot> {
        let mut fetches = Vec::new();
        for instrument in instruments {
            for (venue, gateway) in self.gateways.iter() {
                let gateway = Arc::clone(gateway);
                let venue = venue.clone();
                let instrument = instrument.clone();
                let timeout = self.timeout;
                fetches.push(async move {
                    let result =
                        tokio::time::timeout(timeout, gateway.quote(&instrument)).await;
                    (venue, instrument, result)
                });
            }
        }

        let mut snapshot = PriceSnapshot::new(Utc::now());
        for (venue, instrument, result) in join_all(fetches).await {
            match result {
                Ok(Ok(quote)) => snapshot.insert(quote),
                Ok(Err(error)) => {
                    warn!(venue = %venue, instrument = %instrument, error = %error, "Quote fetch failed");
                }
                Err(_) => {
                    warn!(venue = %venue, instrument = %instrument, timeout_ms = self.timeout.as_millis() as u64, "Quote fetch timed out");
                }
            }
        }

        debug!(quotes = snapshot.quote_count(), "Snapshot assembled");

        let snapshot = Arc::new(snapshot);
        self.state.publish_snapshot(Arc::clone(&snapshot));
        snapshot
    }
}
