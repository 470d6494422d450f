//! Backup and restore (バックアップ・復元)

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use toyu_domain::collaborator::ArtifactSink;
use toyu_domain::repository::RecordLedger;
use toyu_domain::RecordFilter;
use toyu_infra::backup::{backup_file_name, decode_backup, encode_backup};
use toyu_types::{DeliveryRecord, Result};

use super::command::Prepared;
use super::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub records: usize,
}

/// Write every record to a backup file.
///
/// Returns `None` without writing anything when the ledger is empty.
pub fn backup(session: &Session, sink: &mut dyn ArtifactSink) -> Result<Option<BackupOutcome>> {
    let records = session.ledger().scan(&RecordFilter::all())?;
    if records.is_empty() {
        info!("ledger is empty, no backup written");
        return Ok(None);
    }

    let bytes = encode_backup(&records)?;
    let path = sink.save(&backup_file_name(session.clock().now_local()), &bytes)?;
    info!(path = %path.display(), records = records.len(), "backup written");
    Ok(Some(BackupOutcome {
        path,
        records: records.len(),
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct RestorePreview {
    pub incoming: usize,
    /// Records currently in the ledger; all of them are replaced
    pub existing: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub restored: usize,
}

/// Restore waiting for confirmation
pub struct PreparedRestore<'a> {
    session: &'a Session,
    records: Vec<DeliveryRecord>,
    preview: RestorePreview,
}

/// Parse a backup and show what restoring it would do. Nothing is written yet.
pub fn prepare_restore<'a>(session: &'a Session, bytes: &[u8]) -> Result<PreparedRestore<'a>> {
    let records = decode_backup(bytes)?;
    let existing = session.ledger().count(&RecordFilter::all())?;

    let first_date = records.iter().map(|r| r.date.clone()).min();
    let last_date = records.iter().map(|r| r.date.clone()).max();
    let preview = RestorePreview {
        incoming: records.len(),
        existing,
        first_date,
        last_date,
    };

    Ok(PreparedRestore {
        session,
        records,
        preview,
    })
}

impl Prepared for PreparedRestore<'_> {
    type Preview = RestorePreview;
    type Outcome = RestoreOutcome;

    fn preview(&self) -> &RestorePreview {
        &self.preview
    }

    /// Clear and re-insert in one transaction; a failure keeps the old ledger
    fn confirm(self) -> Result<RestoreOutcome> {
        let restored = self.session.ledger().replace_all(&self.records)?;
        info!(restored, "backup restored");
        Ok(RestoreOutcome { restored })
    }
}
