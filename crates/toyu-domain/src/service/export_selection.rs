//! Selection and ordering of records for the accounting export

use chrono::NaiveDateTime;
use toyu_types::DeliveryRecord;

/// Keep unexported records and order them by delivery date and time.
///
/// Ties keep id order so repeated exports of the same set are byte-identical.
pub fn select_for_export(records: Vec<DeliveryRecord>) -> Vec<DeliveryRecord> {
    let mut selected: Vec<_> = records.into_iter().filter(|r| !r.exported).collect();
    selected.sort_by(|a, b| a.chrono_key().cmp(&b.chrono_key()).then(a.id.cmp(&b.id)));
    selected
}

/// `delivery_<YYMMDDHHMMSS>.csv`
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("delivery_{}.csv", now.format("%y%m%d%H%M%S"))
}
