//! Session start-up
//!
//! Opening a session runs the fixed start-up sequence once:
//! 1. Open (and upgrade) the database
//! 2. Load the masters, or note that none were imported yet
//! 3. Run the retention sweep

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use toyu_domain::collaborator::Clock;
use toyu_domain::repository::MasterRepository;
use toyu_domain::service::{sweep, SweepReport};
use toyu_infra::{SqliteMasterRepository, SqliteRecordLedger};
use toyu_store::Database;
use toyu_types::Result;

use crate::repository::open_repositories;

/// What happened while the session started
#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub database: String,
    pub schema_version: u32,
    pub customers: usize,
    pub tanks: usize,
    pub last_import: Option<DateTime<Utc>>,
    pub sweep: Option<SweepReport>,
    /// Set when the sweep stopped on a storage error; the session still works
    pub sweep_error: Option<String>,
}

impl StartupReport {
    /// No master data has been imported yet
    pub fn masters_empty(&self) -> bool {
        self.customers == 0 && self.tanks == 0
    }
}

/// An open ledger: repositories over one database plus the clock
pub struct Session {
    db: Database,
    masters: SqliteMasterRepository,
    ledger: SqliteRecordLedger,
    clock: Box<dyn Clock>,
}

impl Session {
    /// Start a session on an opened database
    pub fn start(
        db: Database,
        clock: Box<dyn Clock>,
        retention_days: u32,
    ) -> Result<(Self, StartupReport)> {
        let (masters, ledger) = open_repositories(&db);
        let schema_version = db.schema_version()?;
        let snapshot = masters.load_all()?;

        let (sweep_report, sweep_error) = match sweep(&ledger, clock.today(), retention_days) {
            Ok(report) => {
                info!(cutoff = %report.cutoff, deleted = report.deleted, "retention sweep finished");
                (Some(report), None)
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "retention sweep stopped");
                (None, Some(e.to_string()))
            }
        };

        let report = StartupReport {
            database: db.location().to_string(),
            schema_version,
            customers: snapshot.customers.len(),
            tanks: snapshot.tanks.len(),
            last_import: snapshot.last_import,
            sweep: sweep_report,
            sweep_error,
        };
        if report.masters_empty() {
            info!("no master data imported yet");
        }

        Ok((
            Self {
                db,
                masters,
                ledger,
                clock,
            },
            report,
        ))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn masters(&self) -> &SqliteMasterRepository {
        &self.masters
    }

    pub fn ledger(&self) -> &SqliteRecordLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
