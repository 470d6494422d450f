//! Daily summaries for the history view (過去データ)

use std::collections::BTreeMap;

use serde::Serialize;
use toyu_types::DeliveryRecord;

/// Records of one delivery date with their totals
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub records: Vec<DeliveryRecord>,
    pub total_qty: f64,
    pub total_amount: f64,
    pub unexported: usize,
    pub exported: usize,
}

/// Group records by date, newest date first; records within a day by time
pub fn summarize_by_day(records: Vec<DeliveryRecord>) -> Vec<DaySummary> {
    let mut by_date: BTreeMap<String, Vec<DeliveryRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date.clone()).or_default().push(record);
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, mut records)| {
            records.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
            let totals = LedgerTotals::of(&records);
            DaySummary {
                date,
                total_qty: totals.qty,
                total_amount: totals.total,
                unexported: totals.unexported,
                exported: totals.count - totals.unexported,
                records,
            }
        })
        .collect()
}

/// Aggregate over a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LedgerTotals {
    pub count: usize,
    pub qty: f64,
    pub total: f64,
    pub unexported: usize,
}

impl LedgerTotals {
    pub fn of(records: &[DeliveryRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, r| Self {
            count: acc.count + 1,
            qty: acc.qty + r.qty,
            total: acc.total + r.total,
            unexported: acc.unexported + usize::from(!r.exported),
        })
    }
}
