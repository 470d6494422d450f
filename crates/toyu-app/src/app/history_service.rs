//! History queries (過去データ・本日の集計)

use serde::Serialize;

use toyu_domain::repository::RecordLedger;
use toyu_domain::service::{summarize_by_day, DaySummary, LedgerTotals};
use toyu_domain::{ExportState, RecordFilter};
use toyu_types::{DeliveryRecord, Result};

use super::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub days: Vec<DaySummary>,
    pub totals: LedgerTotals,
}

/// Records matching the state and customer-name filter, grouped by day
pub fn history(
    session: &Session,
    state: ExportState,
    customer_name: Option<&str>,
) -> Result<HistoryView> {
    let mut filter = RecordFilter::all().with_state(state);
    if let Some(name) = customer_name {
        filter = filter.with_customer_name(name);
    }
    let records = session.ledger().scan(&filter)?;
    let totals = LedgerTotals::of(&records);
    Ok(HistoryView {
        days: summarize_by_day(records),
        totals,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    pub date: String,
    pub totals: LedgerTotals,
    pub records: Vec<DeliveryRecord>,
    /// Unexported records across all days, waiting for the next export
    pub pending_export: usize,
}

pub fn today(session: &Session) -> Result<TodaySummary> {
    let date = session.clock().date_string();
    let ledger = session.ledger();
    let records = ledger.scan(&RecordFilter::on_date(date.clone()))?;
    Ok(TodaySummary {
        date,
        totals: LedgerTotals::of(&records),
        records,
        pending_export: ledger.count(&RecordFilter::unexported())?,
    })
}
