//! The main control loop.
//!
//! One iteration is one full cycle: poll quotes, detect opportunities,
//! gate through risk, execute at most one trade, record it, then sleep.
//! A cycle that errors is logged and followed by a bounded backoff; the
//! loop only ever stops on an explicit shutdown signal, checked at
//! cycle boundaries so an in-flight trade always reaches a terminal
//! status first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::domain::{Instrument, Opportunity, PriceSnapshot, TradeStatus};
use crate::error::Result;
use crate::gateway::{self, GatewayRegistry};
use crate::secrets::CredentialStore;
use crate::service::{
    Event, InventoryMonitor, LogNotifier, NotifierRegistry, OpportunityDetector, PriceAggregator,
    RiskGate, TradeExecutor,
};
use crate::store::{self, Journal, SqliteJournal};

use super::state::AppState;
use super::status::{StatusConfig, StatusWriter};

#[cfg(feature = "telegram")]
use crate::service::{TelegramConfig, TelegramNotifier};

pub struct Orchestrator {
    config: Config,
    instruments: Vec<Instrument>,
    gateways: Arc<GatewayRegistry>,
    state: Arc<AppState>,
    risk: Arc<RiskGate>,
    aggregator: PriceAggregator,
    detector: OpportunityDetector,
    executor: TradeExecutor,
    inventory: InventoryMonitor,
    journal: Arc<dyn Journal>,
    notifiers: Arc<NotifierRegistry>,
    status: Option<StatusWriter>,
    last_balance_poll: Option<Instant>,
}

impl Orchestrator {
    /// Wire up every component from configuration. Startup is the only
    /// place where errors abort instead of being absorbed.
    pub fn new(config: Config, credentials: &dyn CredentialStore) -> Result<Self> {
        config.validate()?;

        let gateways = Arc::new(gateway::build_registry(&config, credentials)?);

        let state = Arc::new(AppState::new());
        state.set_auto_trading(config.auto_trading);

        // Each venue call is bounded by the polling interval so one
        // slow venue cannot stall a whole cycle.
        let quote_timeout = Duration::from_secs(config.poll_interval_secs);
        let aggregator =
            PriceAggregator::new(Arc::clone(&gateways), Arc::clone(&state), quote_timeout);

        let detector = OpportunityDetector::new(gateways.taker_fees());
        let risk = Arc::new(RiskGate::new(config.risk.clone()));
        let executor = TradeExecutor::new(Arc::clone(&gateways));
        let inventory = InventoryMonitor::new(Arc::clone(&gateways));

        let pool = store::create_pool(&config.database)?;
        store::run_migrations(&pool)?;
        let journal: Arc<dyn Journal> = Arc::new(SqliteJournal::new(pool));

        let notifiers = Arc::new(build_notifier_registry(&config, credentials));
        info!(notifiers = notifiers.len(), "Notifiers initialized");

        let status = config.status_file.clone().map(|path| {
            StatusWriter::new(
                path,
                StatusConfig {
                    instruments: config.instruments.clone(),
                    venues: gateways.venues().map(ToString::to_string).collect(),
                    min_spread_pct: config.min_spread_pct,
                    auto_trading: config.auto_trading,
                    dry_run: config.dry_run,
                },
            )
        });

        let instruments = config
            .instruments
            .iter()
            .map(|i| Instrument::from(i.as_str()))
            .collect();

        Ok(Self {
            config,
            instruments,
            gateways,
            state,
            risk,
            aggregator,
            detector,
            executor,
            inventory,
            journal,
            notifiers,
            status,
            last_balance_poll: None,
        })
    }

    /// Shared state handle for read-side views.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Risk gate handle. External schedulers call
    /// `reset_daily_stats` through this.
    pub fn risk(&self) -> Arc<RiskGate> {
        Arc::clone(&self.risk)
    }

    /// Run until the process is killed.
    pub async fn run(self) -> Result<()> {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.run_with_shutdown(shutdown_rx).await
    }

    /// Run until `shutdown` flips to true.
    pub async fn run_with_shutdown(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!(
            venues = self.gateways.len(),
            instruments = self.instruments.len(),
            auto_trading = self.config.auto_trading,
            dry_run = self.config.dry_run,
            poll_interval_secs = self.config.poll_interval_secs,
            "Starting trading loop"
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let backoff = Duration::from_secs(self.config.error_backoff_secs);

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, stopping loop");
                break;
            }

            let sleep_for = match self.cycle().await {
                Ok(()) => poll_interval,
                Err(e) => {
                    error!(error = %e, backoff_secs = backoff.as_secs(), "Cycle failed");
                    if let Some(status) = &self.status {
                        status.record_cycle_failure();
                    }
                    backoff
                }
            };

            // Cancellation is observed only between cycles; an in-flight
            // two-leg trade always completes before shutdown takes effect.
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.changed() => {}
            }
        }

        Ok(())
    }

    async fn cycle(&mut self) -> Result<()> {
        let snapshot = self.aggregator.poll(&self.instruments).await;
        let opportunities = self
            .detector
            .detect(&snapshot, self.config.min_spread_pct);

        info!(
            quotes = snapshot.quote_count(),
            opportunities = opportunities.len(),
            "Cycle complete"
        );

        self.state.set_opportunities(opportunities.clone());

        let mut traded = false;
        if let Some(top) = opportunities.first() {
            self.notifiers
                .notify_all(Event::OpportunityDetected {
                    instrument: top.instrument().clone(),
                    buy_venue: top.buy_venue().clone(),
                    sell_venue: top.sell_venue().clone(),
                    spread_pct: top.spread_pct(),
                });

            // At most one trade per cycle, and only when allowed.
            if self.state.auto_trading() && !self.config.dry_run && self.risk.can_trade() {
                self.execute_top(top).await;
                traded = true;
            }
        }

        if self.balance_poll_due() {
            self.snapshot_balances(&snapshot).await;
        }

        if let Some(status) = &self.status {
            status.record_cycle(&self.risk.status(), &opportunities, traded);
            status.write()?;
        }

        Ok(())
    }

    async fn execute_top(&self, opportunity: &Opportunity) {
        let record = self
            .executor
            .execute(opportunity, self.config.trade_quantity)
            .await;

        // Every terminal record goes to the risk gate exactly once.
        let still_allowed = self.risk.record_trade(&record);
        self.journal.append_trade(&record);

        self.notifiers.notify_all(Event::TradeExecuted {
            trade_id: record.id(),
            instrument: record.instrument().clone(),
            status: record.status().to_string(),
            pnl: record.realized_pnl(),
        });

        if record.status() == TradeStatus::Partial {
            self.notifiers.notify_all(Event::UnhedgedExposure {
                trade_id: record.id(),
                instrument: record.instrument().clone(),
                venue: record.buy_venue().clone(),
                quantity: record.quantity(),
            });
        }

        if !still_allowed {
            let reason = self
                .risk
                .status()
                .trip_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            self.notifiers
                .notify_all(Event::CircuitBreakerTripped { reason });
        }
    }

    fn balance_poll_due(&self) -> bool {
        match self.last_balance_poll {
            None => true,
            Some(at) => {
                at.elapsed() >= Duration::from_secs(self.config.balance_interval_secs)
            }
        }
    }

    async fn snapshot_balances(&mut self, snapshot: &PriceSnapshot) {
        self.last_balance_poll = Some(Instant::now());

        let balances = self.inventory.fetch_all_balances().await;
        for (venue, assets) in &balances {
            for (asset, balance) in assets {
                self.journal
                    .append_balance_snapshot(venue.as_str(), asset, balance);
            }
        }

        let portfolio = InventoryMonitor::portfolio_value(&balances, snapshot);
        debug!(portfolio_value = %portfolio, "Balances refreshed");

        let mut assets: Vec<String> = self
            .instruments
            .iter()
            .filter_map(|i| i.base().map(ToString::to_string))
            .collect();
        assets.sort();
        assets.dedup();

        for suggestion in InventoryMonitor::suggest_rebalancing(&balances, &assets) {
            info!(
                venue = %suggestion.venue,
                asset = %suggestion.asset,
                action = %suggestion.action,
                amount = %suggestion.amount,
                reason = suggestion.reason,
                "Rebalancing suggestion"
            );
        }
    }
}

/// Build notifier registry from configuration.
fn build_notifier_registry(
    config: &Config,
    credentials: &dyn CredentialStore,
) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();

    // Always log events
    registry.register(Box::new(LogNotifier));

    #[cfg(feature = "telegram")]
    if config.telegram.enabled {
        match TelegramConfig::resolve(credentials, &config.telegram) {
            Some(tg_config) => {
                registry.register(Box::new(TelegramNotifier::new(tg_config)));
                info!("Telegram notifier enabled");
            }
            None => {
                tracing::warn!(
                    "Telegram enabled but telegram_bot_token or telegram_chat_id not set"
                );
            }
        }
    }

    #[cfg(not(feature = "telegram"))]
    let _ = (config, credentials);

    registry
}
