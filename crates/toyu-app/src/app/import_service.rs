//! Master import (マスタ取込)
//!
//! Each file is read, classified and imported on its own; a bad file is
//! reported and the remaining files are still imported.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use toyu_domain::repository::MasterRepository;
use toyu_domain::service::{parse_master_file, MasterBatch, MasterKind};
use toyu_infra::master_file::{decode_master_rows, read_master_rows};
use toyu_types::{MasterSnapshot, Result};

use super::session::Session;

/// Result of importing one file
#[derive(Debug, Clone, Serialize)]
pub struct FileImport {
    pub file: String,
    pub kind: Option<MasterKind>,
    pub imported: usize,
    pub error: Option<String>,
}

impl FileImport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Number of tanks registered per customer after the import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankCount {
    pub customer_code: String,
    pub customer_name: String,
    pub tanks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub files: Vec<FileImport>,
    pub tank_counts: Vec<TankCount>,
    /// Tanks whose customer code matches no customer
    pub orphan_tanks: usize,
}

impl ImportReport {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| !f.succeeded()).count()
    }
}

/// Import every file in `paths`
pub fn import_files(session: &Session, paths: &[PathBuf]) -> Result<ImportReport> {
    let files = paths
        .iter()
        .map(|path| {
            let name = display_name(path);
            let outcome =
                read_master_rows(path).and_then(|rows| import_rows(session, &name, &rows));
            file_result(name, outcome)
        })
        .collect();
    finish(session, files)
}

/// Import files whose contents are already in memory, as `(file name, bytes)`
pub fn import_contents(session: &Session, contents: &[(String, Vec<u8>)]) -> Result<ImportReport> {
    let files = contents
        .iter()
        .map(|(name, bytes)| {
            let outcome =
                decode_master_rows(name, bytes).and_then(|rows| import_rows(session, name, &rows));
            file_result(name.clone(), outcome)
        })
        .collect();
    finish(session, files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn import_rows(
    session: &Session,
    file: &str,
    rows: &[serde_json::Value],
) -> Result<(MasterKind, usize)> {
    let batch = parse_master_file(file, rows)?;
    let now = session.clock().now_utc();
    let imported = match &batch {
        MasterBatch::Customers(customers) => session.masters().import_customers(customers, now)?,
        MasterBatch::Tanks(tanks) => session.masters().import_tanks(tanks, now)?,
    };
    info!(file, kind = batch.kind().label(), imported, "master file imported");
    Ok((batch.kind(), imported))
}

fn file_result(file: String, outcome: Result<(MasterKind, usize)>) -> FileImport {
    match outcome {
        Ok((kind, imported)) => FileImport {
            file,
            kind: Some(kind),
            imported,
            error: None,
        },
        Err(e) => {
            warn!(file = %file, error = %e, "master file rejected");
            FileImport {
                file,
                kind: None,
                imported: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

fn finish(session: &Session, files: Vec<FileImport>) -> Result<ImportReport> {
    let snapshot = session.masters().load_all()?;
    Ok(ImportReport {
        files,
        tank_counts: tank_counts(&snapshot),
        orphan_tanks: orphan_tanks(&snapshot),
    })
}

pub fn tank_counts(snapshot: &MasterSnapshot) -> Vec<TankCount> {
    snapshot
        .customers
        .iter()
        .map(|c| TankCount {
            customer_code: c.customer_code.clone(),
            customer_name: c.official_name.clone(),
            tanks: snapshot.tanks_for(&c.customer_code).len(),
        })
        .collect()
}

fn orphan_tanks(snapshot: &MasterSnapshot) -> usize {
    snapshot
        .tanks
        .iter()
        .filter(|t| snapshot.customer(&t.customer_code).is_none())
        .count()
}
