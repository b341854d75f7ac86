//! Database row types for the audit journal.

use diesel::prelude::*;

use super::schema::{balance_snapshots, trades};

/// Insertable trade audit row.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = trades)]
pub struct NewTradeRow {
    pub trade_id: String,
    pub created_at: String,
    pub instrument: String,
    pub quantity: f64,
    pub buy_venue: String,
    pub sell_venue: String,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub pnl: f64,
    pub status: String,
    pub error: Option<String>,
}

/// Queryable trade audit row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRow {
    pub id: Option<i32>,
    pub trade_id: String,
    pub created_at: String,
    pub instrument: String,
    pub quantity: f64,
    pub buy_venue: String,
    pub sell_venue: String,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub pnl: f64,
    pub status: String,
    pub error: Option<String>,
}

/// Insertable balance snapshot row.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = balance_snapshots)]
pub struct NewBalanceRow {
    pub recorded_at: String,
    pub venue: String,
    pub asset: String,
    pub free: f64,
    pub locked: f64,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_row_is_insertable() {
        // Type check - if this compiles, the Insertable derive works
        let _row = NewTradeRow {
            trade_id: "t".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            instrument: "BTC/USDT".to_string(),
            quantity: 0.01,
            buy_venue: "binance".to_string(),
            sell_venue: "kucoin".to_string(),
            buy_price: Some(43000.0),
            sell_price: None,
            pnl: 0.0,
            status: "partial".to_string(),
            error: Some("sell leg failed".to_string()),
        };
    }

    #[test]
    fn balance_row_is_insertable() {
        let _row = NewBalanceRow {
            recorded_at: "2026-01-01T00:00:00Z".to_string(),
            venue: "binance".to_string(),
            asset: "BTC".to_string(),
            free: 1.0,
            locked: 0.0,
            total: 1.0,
        };
    }
}
