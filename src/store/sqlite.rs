//! SQLite-backed journal implementation.

use chrono::{SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::TradeRecord;
use crate::gateway::AssetBalance;

use super::model::{NewBalanceRow, NewTradeRow, TradeRow};
use super::schema::{balance_snapshots, trades};
use super::DbPool;

/// Fire-and-forget audit sink. Implementations log and swallow their
/// own failures: an audit write must never affect a trade outcome.
pub trait Journal: Send + Sync {
    fn append_trade(&self, record: &TradeRecord);

    fn append_balance_snapshot(&self, venue: &str, asset: &str, balance: &AssetBalance);
}

/// Journal that drops everything; used in tests and dry runs.
pub struct NullJournal;

impl Journal for NullJournal {
    fn append_trade(&self, _record: &TradeRecord) {}

    fn append_balance_snapshot(&self, _venue: &str, _asset: &str, _balance: &AssetBalance) {}
}

/// Journal writing to the SQLite audit database.
pub struct SqliteJournal {
    pool: DbPool,
}

impl SqliteJournal {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Most recent trades, newest first. CLI view only; the trading
    /// loop never calls this.
    pub fn recent_trades(&self, limit: i64) -> Vec<TradeRow> {
        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Journal connection unavailable");
                return Vec::new();
            }
        };

        trades::table
            .order(trades::created_at.desc())
            .limit(limit)
            .select(TradeRow::as_select())
            .load(&mut conn)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load trade history");
                Vec::new()
            })
    }
}

fn lossy(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

impl Journal for SqliteJournal {
    fn append_trade(&self, record: &TradeRecord) {
        let row = NewTradeRow {
            trade_id: record.id().to_string(),
            created_at: record
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            instrument: record.instrument().as_str().to_string(),
            quantity: lossy(record.quantity()),
            buy_venue: record.buy_venue().as_str().to_string(),
            sell_venue: record.sell_venue().as_str().to_string(),
            buy_price: record.buy_leg().map(|leg| lossy(leg.average_price)),
            sell_price: record.sell_leg().map(|leg| lossy(leg.average_price)),
            pnl: lossy(record.realized_pnl()),
            status: record.status().to_string(),
            error: record.error().map(ToString::to_string),
        };

        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Journal connection unavailable, trade not persisted");
                return;
            }
        };

        if let Err(e) = diesel::insert_into(trades::table).values(&row).execute(&mut conn) {
            warn!(error = %e, trade_id = %record.id(), "Failed to persist trade");
        }
    }

    fn append_balance_snapshot(&self, venue: &str, asset: &str, balance: &AssetBalance) {
        let row = NewBalanceRow {
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            venue: venue.to_string(),
            asset: asset.to_string(),
            free: lossy(balance.free),
            locked: lossy(balance.locked),
            total: lossy(balance.total),
        };

        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Journal connection unavailable, balance not persisted");
                return;
            }
        };

        if let Err(e) = diesel::insert_into(balance_snapshots::table)
            .values(&row)
            .execute(&mut conn)
        {
            warn!(error = %e, venue = venue, "Failed to persist balance snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Instrument, LegFill, Opportunity, VenueId};
    use crate::store::{create_pool, run_migrations};
    use rust_decimal_macros::dec;

    fn journal() -> (tempfile::TempDir, SqliteJournal) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        (dir, SqliteJournal::new(pool))
    }

    fn completed_record() -> TradeRecord {
        let opp = Opportunity::new(
            Instrument::from("BTC/USDT"),
            VenueId::from("a"),
            VenueId::from("b"),
            dec!(100),
            dec!(101),
            dec!(0.8),
        );
        let mut record = TradeRecord::pending(&opp, dec!(1));
        record.record_buy_fill(LegFill {
            venue: VenueId::from("a"),
            order_id: "o1".to_string(),
            average_price: dec!(100),
            filled_quantity: dec!(1),
        });
        record.complete(LegFill {
            venue: VenueId::from("b"),
            order_id: "o2".to_string(),
            average_price: dec!(101),
            filled_quantity: dec!(1),
        });
        record
    }

    #[test]
    fn append_and_read_back_trade() {
        let (_dir, journal) = journal();
        let record = completed_record();
        journal.append_trade(&record);

        let rows = journal.recent_trades(10);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.trade_id, record.id().to_string());
        assert_eq!(row.status, "completed");
        assert_eq!(row.buy_price, Some(100.0));
        assert_eq!(row.sell_price, Some(101.0));
        assert_eq!(row.pnl, 1.0);
    }

    #[test]
    fn recent_trades_respects_limit_and_order() {
        let (_dir, journal) = journal();
        for _ in 0..5 {
            journal.append_trade(&completed_record());
        }

        assert_eq!(journal.recent_trades(3).len(), 3);
        assert_eq!(journal.recent_trades(10).len(), 5);
    }

    #[test]
    fn append_balance_snapshot_does_not_panic() {
        let (_dir, journal) = journal();
        journal.append_balance_snapshot(
            "binance",
            "BTC",
            &AssetBalance {
                free: dec!(1),
                locked: dec!(0),
                total: dec!(1),
            },
        );
    }
}
