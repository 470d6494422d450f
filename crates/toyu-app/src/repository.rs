//! Repository adapters for persistence layer

use std::path::Path;
use std::time::Duration;

use toyu_infra::{SqliteMasterRepository, SqliteRecordLedger};
use toyu_store::{Database, SCHEMA_VERSION};
use toyu_types::Result;

use crate::config::Config;

/// Open the configured database, upgrading its schema if needed
pub fn open_database(config: &Config) -> Result<Database> {
    open_database_at(&config.database_path()?, config.busy_timeout())
}

/// Open a database at a custom path
pub fn open_database_at(path: &Path, busy_timeout: Duration) -> Result<Database> {
    Database::open(path, SCHEMA_VERSION, busy_timeout)
}

/// Master and ledger repositories sharing one database
pub fn open_repositories(db: &Database) -> (SqliteMasterRepository, SqliteRecordLedger) {
    (
        SqliteMasterRepository::new(db.clone()),
        SqliteRecordLedger::new(db.clone()),
    )
}
