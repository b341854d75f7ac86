//! Arbhound - cross-venue arbitrage detection and execution.
//!
//! Continuously polls quotes for a set of instruments across multiple
//! trading venues, detects price discrepancies that stay profitable
//! after both legs' fees, gates execution behind a risk circuit
//! breaker, and executes two-legged trades (buy on one venue, sell on
//! another) with explicit partial-failure semantics.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Venue-agnostic types: quotes, snapshots, opportunities,
//!   trade records, profit math
//! - [`error`] - Error types for the crate
//! - [`gateway`] - Exchange Gateway trait and per-venue adapters
//! - [`service`] - Aggregation, detection, risk gating, execution,
//!   inventory monitoring, notifications
//! - [`store`] - Fire-and-forget audit persistence (SQLite)
//! - [`secrets`] - Credential-store capability
//! - [`app`] - Orchestrator loop, shared state, status file
//! - [`cli`] - Command-line interface
//!
//! # Features
//!
//! - `telegram` - Telegram notifications (enabled by default)
//!
//! # Example
//!
//! ```no_run
//! use arbhound::app::Orchestrator;
//! use arbhound::config::Config;
//! use arbhound::secrets::EnvCredentials;
//!
//! # async fn run() -> arbhound::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let orchestrator = Orchestrator::new(config, &EnvCredentials)?;
//! orchestrator.run().await
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod secrets;
pub mod service;
pub mod store;
