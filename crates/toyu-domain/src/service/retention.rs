//! Retention sweep: purge exported records older than the retention window

use chrono::{Days, NaiveDate};
use serde::Serialize;
use toyu_types::{Result, DATE_FORMAT};

use crate::filter::RecordFilter;
use crate::repository::RecordLedger;

/// Outcome of one sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub cutoff: String,
    pub deleted: usize,
}

/// First date that is still retained, formatted like record dates
pub fn cutoff_date(today: NaiveDate, retention_days: u32) -> String {
    today
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN)
        .format(DATE_FORMAT)
        .to_string()
}

/// Delete every exported record dated before `today - retention_days`.
///
/// Unexported records are never touched, whatever their age. Date strings are
/// zero-padded, so the comparison is a plain string comparison.
pub fn sweep<L: RecordLedger + ?Sized>(
    ledger: &L,
    today: NaiveDate,
    retention_days: u32,
) -> Result<SweepReport> {
    let cutoff = cutoff_date(today, retention_days);
    let deleted = ledger.bulk_delete(&RecordFilter::expired_before(cutoff.clone()))?;
    Ok(SweepReport { cutoff, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    use chrono::{DateTime, Utc};
    use toyu_types::{DeliveryRecord, NewDelivery};

    /// Ledger kept in a Vec, enough to drive the sweep
    #[derive(Default)]
    struct VecLedger {
        records: RefCell<Vec<DeliveryRecord>>,
    }

    impl VecLedger {
        fn with(records: Vec<DeliveryRecord>) -> Self {
            Self {
                records: RefCell::new(records),
            }
        }
    }

    impl RecordLedger for VecLedger {
        fn append(&self, _input: NewDelivery) -> Result<DeliveryRecord> {
            unimplemented!()
        }

        fn append_all(&self, _inputs: Vec<NewDelivery>) -> Result<Vec<DeliveryRecord>> {
            unimplemented!()
        }

        fn visit(
            &self,
            filter: &RecordFilter,
            visitor: &mut dyn FnMut(DeliveryRecord) -> Result<()>,
        ) -> Result<usize> {
            let matching: Vec<_> = self
                .records
                .borrow()
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            let n = matching.len();
            for record in matching {
                visitor(record)?;
            }
            Ok(n)
        }

        fn count(&self, filter: &RecordFilter) -> Result<usize> {
            Ok(self.records.borrow().iter().filter(|r| filter.matches(r)).count())
        }

        fn mark_exported(&self, _ids: &BTreeSet<i64>, _at: DateTime<Utc>) -> Result<usize> {
            unimplemented!()
        }

        fn bulk_delete(&self, filter: &RecordFilter) -> Result<usize> {
            let mut records = self.records.borrow_mut();
            let before = records.len();
            records.retain(|r| !filter.matches(r));
            Ok(before - records.len())
        }

        fn clear_all(&self) -> Result<usize> {
            unimplemented!()
        }

        fn replace_all(&self, _records: &[DeliveryRecord]) -> Result<usize> {
            unimplemented!()
        }
    }

    fn record(id: i64, date: &str, exported: bool) -> DeliveryRecord {
        DeliveryRecord {
            id,
            cust_code: "C1".to_string(),
            cust_name: "Acme".to_string(),
            date: date.to_string(),
            time: "09:00".to_string(),
            tank_id: "T1".to_string(),
            tank_name: "Tank A".to_string(),
            qty: 50.0,
            unit_price: 100.0,
            amount: 5000.0,
            tax: 500.0,
            total: 5500.0,
            exported,
            exported_date: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cutoff_date() {
        assert_eq!(cutoff_date(day(2024, 3, 2), 30), "2024/02/01");
        assert_eq!(cutoff_date(day(2024, 1, 10), 0), "2024/01/10");
        assert_eq!(cutoff_date(day(2024, 1, 10), 10), "2023/12/31");
    }

    #[test]
    fn test_sweep_deletes_only_january() {
        let ledger = VecLedger::with(vec![
            record(1, "2024/01/01", true),
            record(2, "2024/02/01", true),
        ]);
        let report = sweep(&ledger, day(2024, 3, 2), 30).unwrap();
        assert_eq!(report.cutoff, "2024/02/01");
        assert_eq!(report.deleted, 1);
        let left = ledger.scan(&RecordFilter::all()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].date, "2024/02/01");
    }

    #[test]
    fn test_sweep_never_deletes_unexported() {
        let ledger = VecLedger::with(vec![
            record(1, "2000/01/01", false),
            record(2, "2020/06/15", false),
            record(3, "2020/06/15", true),
        ]);
        for retention_days in [0, 1, 30, 365] {
            sweep(&ledger, day(2030, 1, 1), retention_days).unwrap();
            assert_eq!(ledger.count(&RecordFilter::unexported()).unwrap(), 2);
        }
        assert_eq!(ledger.count(&RecordFilter::exported()).unwrap(), 0);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let ledger = VecLedger::with(vec![
            record(1, "2024/01/01", true),
            record(2, "2024/02/20", true),
            record(3, "2023/12/01", false),
        ]);
        let first = sweep(&ledger, day(2024, 3, 2), 30).unwrap();
        let after_first = ledger.scan(&RecordFilter::all()).unwrap();
        let second = sweep(&ledger, day(2024, 3, 2), 30).unwrap();
        assert_eq!(first.deleted, 1);
        assert_eq!(second.deleted, 0);
        assert_eq!(ledger.scan(&RecordFilter::all()).unwrap(), after_first);
    }
}
