//! SQLite implementation of MasterRepository

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use toyu_domain::repository::MasterRepository;
use toyu_store::rows::{
    customer_from_row, insert_customer, insert_tank, last_import, set_meta, tank_from_row,
    CUSTOMER_COLUMNS, META_LAST_IMPORT, TANK_COLUMNS,
};
use toyu_store::Database;
use toyu_types::{Customer, Error, MasterSnapshot, Result, Tank};

/// Customer and tank masters with a read-through snapshot cache.
///
/// The cache is only replaced after an import transaction commits, so
/// readers see either the old masters or the new ones, never a mix.
pub struct SqliteMasterRepository {
    db: Database,
    cache: Mutex<Option<Arc<MasterSnapshot>>>,
}

impl SqliteMasterRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<Arc<MasterSnapshot>> {
        match self.cache.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn publish(&self, snapshot: Arc<MasterSnapshot>) {
        match self.cache.lock() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    /// Clear `table`, insert `rows` and stamp the import, all in one transaction
    fn replace<T>(
        &self,
        operation: &str,
        table: &str,
        rows: &[T],
        insert: fn(&Connection, &T) -> rusqlite::Result<()>,
        imported_at: DateTime<Utc>,
    ) -> Result<usize> {
        let (stored, snapshot) = self.db.write(operation, |tx| {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
            for row in rows {
                insert(tx, row)?;
            }
            set_meta(tx, META_LAST_IMPORT, &imported_at.to_rfc3339())?;
            let stored: i64 =
                tx.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok((stored as usize, read_snapshot(tx)?))
        })?;

        info!(table, rows = rows.len(), stored, "master store replaced");
        self.publish(Arc::new(snapshot));
        Ok(stored)
    }
}

fn read_snapshot(conn: &Connection) -> rusqlite::Result<MasterSnapshot> {
    let customers = conn
        .prepare(&format!(
            "SELECT {} FROM customers ORDER BY customer_code",
            CUSTOMER_COLUMNS
        ))?
        .query_map([], customer_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let tanks = conn
        .prepare(&format!(
            "SELECT {} FROM tanks ORDER BY customer_code, tank_id",
            TANK_COLUMNS
        ))?
        .query_map([], tank_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(MasterSnapshot {
        customers,
        tanks,
        last_import: last_import(conn)?,
    })
}

fn validate_all<T>(
    label: &str,
    rows: &[T],
    validate: impl Fn(&T) -> std::result::Result<(), String>,
) -> Result<()> {
    for (idx, row) in rows.iter().enumerate() {
        validate(row).map_err(|reason| {
            Error::malformed_import(label, format!("row {}: {}", idx + 1, reason))
        })?;
    }
    Ok(())
}

impl MasterRepository for SqliteMasterRepository {
    fn import_customers(
        &self,
        customers: &[Customer],
        imported_at: DateTime<Utc>,
    ) -> Result<usize> {
        validate_all("customer master", customers, Customer::validate)?;
        self.replace(
            "replace the customer master",
            "customers",
            customers,
            insert_customer,
            imported_at,
        )
    }

    fn import_tanks(&self, tanks: &[Tank], imported_at: DateTime<Utc>) -> Result<usize> {
        validate_all("tank master", tanks, Tank::validate)?;
        self.replace(
            "replace the tank master",
            "tanks",
            tanks,
            insert_tank,
            imported_at,
        )
    }

    fn load_all(&self) -> Result<Arc<MasterSnapshot>> {
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }
        let snapshot = Arc::new(self.db.read("load the masters", read_snapshot)?);
        self.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
