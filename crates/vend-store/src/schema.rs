use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    // Checkpoint every ~400KB instead of the default ~4MB — keeps WAL files small
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Force-checkpoint any stale WAL data into the main DB on startup.
    // Uses TRUNCATE mode to also remove the WAL file afterward.
    // Errors are non-fatal — in-memory DBs and fresh files legitimately fail this.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sale (
            id                 INTEGER PRIMARY KEY CHECK (id = 1),
            purchase_asset     TEXT NOT NULL,
            period_secs        INTEGER NOT NULL,
            window             INTEGER NOT NULL,
            target_per_period  TEXT NOT NULL,
            max_per_period     TEXT NOT NULL,
            starting_price     TEXT NOT NULL,
            sale_decimals      INTEGER NOT NULL,
            purchase_decimals  INTEGER NOT NULL,
            created_at         INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS period_state (
            id                INTEGER PRIMARY KEY CHECK (id = 1),
            period_index      INTEGER NOT NULL,
            period_start      INTEGER NOT NULL,
            ema               TEXT NOT NULL,
            sold_this_period  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS purchases (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            buyer         TEXT NOT NULL,
            period_index  INTEGER NOT NULL,
            quantity      TEXT NOT NULL,
            unit_price    TEXT NOT NULL,
            cost          TEXT NOT NULL,
            refund        TEXT NOT NULL,
            created_at    INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            id                TEXT PRIMARY KEY,
            purchase_balance  TEXT NOT NULL DEFAULT '0',
            sale_balance      TEXT NOT NULL DEFAULT '0'
        );

        CREATE INDEX IF NOT EXISTS idx_purchases_buyer ON purchases(buyer);
        CREATE INDEX IF NOT EXISTS idx_purchases_period ON purchases(period_index);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
