//! Audit persistence using Diesel ORM.
//!
//! The journal is a fire-and-forget sink: the trading loop writes
//! trades and balance snapshots into it and never reads them back.
//! Reads exist only for the CLI's trade-history view.

pub mod model;
pub mod schema;
mod sqlite;

pub use sqlite::{Journal, NullJournal, SqliteJournal};

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Database connection pool type alias.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Create a connection pool for the given database path.
pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_path);
    Pool::builder()
        .max_size(5)
        .build(manager)
        .map_err(|e| Error::Database(e.to_string()))
}

/// Run any pending migrations.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}
