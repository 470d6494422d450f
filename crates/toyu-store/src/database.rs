//! Connection handle for the ledger database

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::migration::{self, latest_version};
use crate::sqlite_error::{open_error, read_error, write_error};
use toyu_types::{Error, Result};

/// Current schema version
pub const SCHEMA_VERSION: u32 = 4;

/// Default database file name inside the data directory
pub const DATABASE_FILE: &str = "ledger.db";

/// Shared handle to the SQLite database.
///
/// Cloning is cheap; all clones use the same connection, and every access
/// goes through [`Database::lock`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    location: Arc<str>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and upgrade it to `version`
    pub fn open(path: &Path, version: u32, busy_timeout: Duration) -> Result<Self> {
        let location = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::DatabaseUnavailable {
                path: location.clone(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| open_error(&location, e))?;
        conn.busy_timeout(busy_timeout)
            .map_err(|e| open_error(&location, e))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(|e| open_error(&location, e))?;

        Self::initialize(conn, location, version)
    }

    /// Fresh in-memory database at the current schema version
    pub fn open_in_memory() -> Result<Self> {
        let location = ":memory:".to_string();
        let conn = Connection::open_in_memory().map_err(|e| open_error(&location, e))?;
        Self::initialize(conn, location, SCHEMA_VERSION)
    }

    fn initialize(mut conn: Connection, location: String, version: u32) -> Result<Self> {
        let latest = latest_version();
        if version > latest {
            return Err(Error::DatabaseUnavailable {
                path: location,
                reason: format!(
                    "requested schema version {} is unknown; this program knows up to {}",
                    version, latest
                ),
            });
        }
        let reached = migration::migrate(&mut conn, &location, version)?;
        info!(location = %location, schema_version = reached, "database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: location.into(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Exclusive access to the connection for one unit of work
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::PersistenceFailure {
            operation: "access the database".to_string(),
            reason: "a previous operation panicked while holding the connection".to_string(),
        })
    }

    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.lock()?;
        migration::user_version(&conn).map_err(|e| self.read_error("read the schema version", e))
    }

    /// Run `work` inside one immediate transaction.
    ///
    /// Any error drops the transaction, which rolls it back.
    pub fn write<T>(
        &self,
        operation: &str,
        work: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| self.write_error(operation, e))?;
        let value = work(&tx).map_err(|e| self.write_error(operation, e))?;
        tx.commit().map_err(|e| self.write_error(operation, e))?;
        Ok(value)
    }

    pub fn read<T>(
        &self,
        operation: &str,
        work: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.lock()?;
        work(&conn).map_err(|e| self.read_error(operation, e))
    }

    /// Map a failed write; the surrounding transaction was rolled back
    pub fn write_error(&self, operation: &str, err: rusqlite::Error) -> Error {
        debug!(operation, error = %err, "write failed");
        write_error(&self.location, operation, err)
    }

    /// Map a failed read
    pub fn read_error(&self, operation: &str, err: rusqlite::Error) -> Error {
        debug!(operation, error = %err, "read failed");
        read_error(&self.location, operation, err)
    }
}
