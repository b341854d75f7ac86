//! Telegram notification implementation.
//!
//! Requires the `telegram` feature. Message sending happens on a
//! background task fed through an unbounded channel, so a slow or
//! failing Telegram API never blocks the trading loop.

use rust_decimal::Decimal;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::TelegramAppConfig;
use crate::secrets::CredentialStore;

use super::notifier::{Event, Notifier};

/// Configuration for the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Chat ID to send notifications to.
    pub chat_id: i64,
    /// Whether to send opportunity alerts (can be noisy).
    pub notify_opportunities: bool,
    /// Whether to send trade execution alerts.
    pub notify_trades: bool,
    /// Whether to send circuit breaker alerts.
    pub notify_circuit_breaker: bool,
}

impl TelegramConfig {
    /// Resolve bot credentials from the credential store and merge the
    /// notification flags from app config.
    pub fn resolve(store: &dyn CredentialStore, app: &TelegramAppConfig) -> Option<Self> {
        let bot_token = store.get("telegram_bot_token")?;
        let chat_id = store.get("telegram_chat_id")?.parse().ok()?;

        Some(Self {
            bot_token,
            chat_id,
            notify_opportunities: app.notify_opportunities,
            notify_trades: app.notify_trades,
            notify_circuit_breaker: app.notify_circuit_breaker,
        })
    }
}

/// Telegram notifier that sends messages to a chat.
pub struct TelegramNotifier {
    sender: mpsc::UnboundedSender<Event>,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier and spawn the background task.
    pub fn new(config: TelegramConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(telegram_worker(config, receiver));
        Self { sender }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, event: Event) {
        if self.sender.send(event).is_err() {
            warn!("Telegram notifier channel closed");
        }
    }
}

/// Background worker that sends Telegram messages.
async fn telegram_worker(config: TelegramConfig, mut receiver: mpsc::UnboundedReceiver<Event>) {
    let bot = Bot::new(&config.bot_token);
    let chat_id = ChatId(config.chat_id);

    info!(chat_id = config.chat_id, "Telegram notifier started");

    while let Some(event) = receiver.recv().await {
        let message = format_event(&config, &event);

        if let Some(text) = message {
            if let Err(e) = bot
                .send_message(chat_id, &text)
                .parse_mode(ParseMode::MarkdownV2)
                .await
            {
                error!(error = %e, "Failed to send Telegram message");
            }
        }
    }

    warn!("Telegram worker shutting down");
}

fn format_event(config: &TelegramConfig, event: &Event) -> Option<String> {
    match event {
        Event::OpportunityDetected {
            instrument,
            buy_venue,
            sell_venue,
            spread_pct,
        } if config.notify_opportunities => Some(format!(
            "🎯 *Opportunity*\n\n\
             Instrument: `{}`\n\
             Buy: {} → Sell: {}\n\
             Net spread: {}%",
            escape_markdown(instrument.as_str()),
            escape_markdown(buy_venue.as_str()),
            escape_markdown(sell_venue.as_str()),
            escape_markdown(&round(*spread_pct).to_string()),
        )),
        Event::TradeExecuted {
            trade_id,
            instrument,
            status,
            pnl,
        } if config.notify_trades => {
            let emoji = if status == "completed" { "✅" } else { "❌" };
            Some(format!(
                "{} *Trade {}*\n\n\
                 Instrument: `{}`\n\
                 Id: `{}`\n\
                 P&L: ${}",
                emoji,
                escape_markdown(status),
                escape_markdown(instrument.as_str()),
                trade_id,
                escape_markdown(&round(*pnl).to_string()),
            ))
        }
        Event::UnhedgedExposure {
            trade_id,
            instrument,
            venue,
            quantity,
        } if config.notify_trades => Some(format!(
            "⚠️ *Unhedged exposure*\n\n\
             Instrument: `{}`\n\
             Venue: {}\n\
             Quantity: {}\n\
             Trade: `{}`\n\n\
             Manual reconciliation required\\.",
            escape_markdown(instrument.as_str()),
            escape_markdown(venue.as_str()),
            escape_markdown(&quantity.to_string()),
            trade_id,
        )),
        Event::CircuitBreakerTripped { reason } if config.notify_circuit_breaker => {
            Some(format!(
                "🚨 *CIRCUIT BREAKER TRIPPED*\n\n\
                 Reason: {}\n\n\
                 New trades are blocked until a daily reset\\.",
                escape_markdown(reason)
            ))
        }
        Event::DailyStatsReset if config.notify_circuit_breaker => {
            Some("✅ *Daily stats reset*\n\nTrading may resume\\.".to_string())
        }
        _ => None,
    }
}

fn round(value: Decimal) -> Decimal {
    value.round_dp(4)
}

/// Escape special characters for Telegram MarkdownV2.
fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}
