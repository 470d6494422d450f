//! Backup file codec
//!
//! A backup is an indented JSON array of every delivery record, ids
//! included. Restoring accepts the same shape; ids are dropped and
//! reassigned by the store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use toyu_types::{normalize_exported, DeliveryRecord, Error, Result, DATE_FORMAT, TIME_FORMAT};

/// `backup_<YYMMDDHHMMSS>.json`
pub fn backup_file_name(now: NaiveDateTime) -> String {
    format!("backup_{}.json", now.format("%y%m%d%H%M%S"))
}

pub fn encode_backup(records: &[DeliveryRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// Backup rows, as written by this and older versions of the ledger
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupRow {
    #[serde(default)]
    id: Option<i64>,
    cust_code: String,
    cust_name: String,
    date: String,
    time: String,
    tank_id: String,
    #[serde(default)]
    tank_name: String,
    qty: f64,
    unit_price: f64,
    amount: f64,
    tax: f64,
    total: f64,
    #[serde(default)]
    exported: Option<bool>,
    #[serde(default)]
    exported_date: Option<DateTime<Utc>>,
}

/// Parse a backup file. Non-arrays and empty arrays are refused.
///
/// Dates such as `2024/1/5` are rewritten to the zero-padded form the
/// ledger sorts by.
pub fn decode_backup(bytes: &[u8]) -> Result<Vec<DeliveryRecord>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::MalformedBackup(format!("not valid JSON: {}", e)))?;
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(Error::MalformedBackup(
                "expected a JSON array of delivery records".to_string(),
            ))
        }
    };
    if items.is_empty() {
        return Err(Error::MalformedBackup("the file contains no records".to_string()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let row: BackupRow = serde_json::from_value(item)
                .map_err(|e| Error::MalformedBackup(format!("record {}: {}", idx + 1, e)))?;
            restore_row(idx, row)
        })
        .collect()
}

fn restore_row(idx: usize, row: BackupRow) -> Result<DeliveryRecord> {
    let date = NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT)
        .map_err(|_| Error::MalformedBackup(format!("record {}: bad date {}", idx + 1, row.date)))?;
    let time = NaiveTime::parse_from_str(row.time.trim(), TIME_FORMAT)
        .map_err(|_| Error::MalformedBackup(format!("record {}: bad time {}", idx + 1, row.time)))?;

    Ok(DeliveryRecord {
        id: row.id.unwrap_or_default(),
        cust_code: row.cust_code,
        cust_name: row.cust_name,
        date: date.format(DATE_FORMAT).to_string(),
        time: time.format(TIME_FORMAT).to_string(),
        tank_id: row.tank_id,
        tank_name: row.tank_name,
        qty: row.qty,
        unit_price: row.unit_price,
        amount: row.amount,
        tax: row.tax,
        total: row.total,
        exported: normalize_exported(row.exported),
        exported_date: row.exported_date,
    })
}
