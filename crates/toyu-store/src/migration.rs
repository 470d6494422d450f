//! Ordered schema migrations
//!
//! The schema version lives in `PRAGMA user_version`. Each step brings the
//! database to exactly its `version`, runs in its own immediate transaction
//! and only changes what is missing, so replaying a step never destroys rows.

use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use tracing::info;

use crate::sqlite_error::open_error;
use toyu_types::{Error, Result};

/// One schema step, keyed by the version it produces
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    apply: fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish()
    }
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "delivery records with date index",
        apply: create_records,
    },
    Migration {
        version: 2,
        description: "customer and tank masters, metadata",
        apply: create_masters,
    },
    Migration {
        version: 3,
        description: "export flag and export timestamp on records",
        apply: add_export_columns,
    },
    Migration {
        version: 4,
        description: "tank capacity becomes optional",
        apply: relax_tank_capacity,
    },
];

fn create_records(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cust_code TEXT NOT NULL,
            cust_name TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            tank_id TEXT NOT NULL,
            tank_name TEXT NOT NULL,
            qty REAL NOT NULL,
            unit_price REAL NOT NULL,
            amount REAL NOT NULL,
            tax REAL NOT NULL,
            total REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_date ON records(date);
        ",
    )
}

fn create_masters(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS customers (
            customer_code TEXT PRIMARY KEY,
            official_name TEXT NOT NULL,
            official_kana TEXT NOT NULL DEFAULT '',
            unit_price REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS tanks (
            tank_id TEXT PRIMARY KEY,
            customer_code TEXT NOT NULL,
            tank_name TEXT NOT NULL DEFAULT '',
            tank_capacity REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_customers_official_name ON customers(official_name);
        CREATE INDEX IF NOT EXISTS idx_tanks_customer_code ON tanks(customer_code);
        ",
    )
}

/// Existing rows keep NULL in `exported`, which reads as "not exported"
fn add_export_columns(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    if !column_exists(tx, "records", "exported")? {
        tx.execute_batch("ALTER TABLE records ADD COLUMN exported INTEGER")?;
    }
    if !column_exists(tx, "records", "exported_date")? {
        tx.execute_batch("ALTER TABLE records ADD COLUMN exported_date TEXT")?;
    }
    tx.execute_batch("CREATE INDEX IF NOT EXISTS idx_records_exported ON records(exported);")
}

/// SQLite cannot drop NOT NULL in place, so the table is rebuilt with its rows
fn relax_tank_capacity(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    if !column_not_null(tx, "tanks", "tank_capacity")? {
        return Ok(());
    }
    tx.execute_batch(
        "
        CREATE TABLE tanks_rebuild (
            tank_id TEXT PRIMARY KEY,
            customer_code TEXT NOT NULL,
            tank_name TEXT NOT NULL DEFAULT '',
            tank_capacity REAL
        );

        INSERT INTO tanks_rebuild (tank_id, customer_code, tank_name, tank_capacity)
            SELECT tank_id, customer_code, tank_name, tank_capacity FROM tanks;

        DROP TABLE tanks;
        ALTER TABLE tanks_rebuild RENAME TO tanks;
        CREATE INDEX IF NOT EXISTS idx_tanks_customer_code ON tanks(customer_code);
        ",
    )
}

fn column_not_null(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let flagged: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2 AND \"notnull\" = 1",
        params![table, column],
        |row| row.get(0),
    )?;
    Ok(flagged > 0)
}

pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Apply a single step and stamp its version
pub fn apply_step(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    (migration.apply)(&tx)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()
}

/// Bring the database from its current version up to `target`.
///
/// Returns the version the database ends at.
pub fn migrate(conn: &mut Connection, location: &str, target: u32) -> Result<u32> {
    let current = user_version(conn).map_err(|e| open_error(location, e))?;
    if current > target {
        return Err(Error::DatabaseUnavailable {
            path: location.to_string(),
            reason: format!(
                "schema version {} is newer than this program supports ({}); update the program",
                current, target
            ),
        });
    }

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current && m.version <= target)
    {
        apply_step(conn, migration).map_err(|e| open_error(location, e))?;
        info!(
            version = migration.version,
            description = migration.description,
            "applied schema migration"
        );
    }

    user_version(conn).map_err(|e| open_error(location, e))
}

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
