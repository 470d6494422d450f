//! Sales export (売上データ出力)
//!
//! Two-phase: `prepare_export` selects the unexported records and builds
//! the preview; `confirm` writes the CSV through the sink and only then
//! flags the records. If the sink fails, nothing is flagged and the same
//! records are offered again next time.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use toyu_domain::collaborator::ArtifactSink;
use toyu_domain::repository::RecordLedger;
use toyu_domain::service::{export_file_name, select_for_export, LedgerTotals};
use toyu_domain::RecordFilter;
use toyu_infra::sales_csv::encode_sales_csv;
use toyu_types::{DeliveryRecord, ExportEncoding, Result};

use super::command::Prepared;
use super::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct ExportPreview {
    pub file_name: String,
    pub records: usize,
    pub total_qty: f64,
    pub total: f64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub encoding: ExportEncoding,
}

impl ExportPreview {
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    /// `None` when there was nothing to export and no file was written
    pub path: Option<PathBuf>,
    pub exported: usize,
}

/// Export waiting for confirmation
pub struct PreparedExport<'a> {
    session: &'a Session,
    sink: &'a mut dyn ArtifactSink,
    records: Vec<DeliveryRecord>,
    preview: ExportPreview,
}

pub fn prepare_export<'a>(
    session: &'a Session,
    sink: &'a mut dyn ArtifactSink,
    encoding: ExportEncoding,
) -> Result<PreparedExport<'a>> {
    let records = select_for_export(session.ledger().scan(&RecordFilter::unexported())?);
    let totals = LedgerTotals::of(&records);

    let preview = ExportPreview {
        file_name: export_file_name(session.clock().now_local()),
        records: records.len(),
        total_qty: totals.qty,
        total: totals.total,
        first_date: records.first().map(|r| r.date.clone()),
        last_date: records.last().map(|r| r.date.clone()),
        encoding,
    };

    Ok(PreparedExport {
        session,
        sink,
        records,
        preview,
    })
}

impl Prepared for PreparedExport<'_> {
    type Preview = ExportPreview;
    type Outcome = ExportOutcome;

    fn preview(&self) -> &ExportPreview {
        &self.preview
    }

    fn confirm(self) -> Result<ExportOutcome> {
        if self.records.is_empty() {
            return Ok(ExportOutcome {
                path: None,
                exported: 0,
            });
        }

        let bytes = encode_sales_csv(&self.records, self.preview.encoding)?;
        let sink = self.sink;
        let path = sink.save(&self.preview.file_name, &bytes)?;

        let ids: BTreeSet<i64> = self.records.iter().map(|r| r.id).collect();
        let exported = self
            .session
            .ledger()
            .mark_exported(&ids, self.session.clock().now_utc())?;

        info!(path = %path.display(), exported, "sales export committed");
        Ok(ExportOutcome {
            path: Some(path),
            exported,
        })
    }
}
