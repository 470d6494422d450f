//! Record lifecycle against an on-disk database

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tempfile::tempdir;

use toyu_domain::repository::{MasterRepository, RecordLedger};
use toyu_domain::service::{select_for_export, sweep};
use toyu_domain::RecordFilter;
use toyu_infra::backup::{decode_backup, encode_backup};
use toyu_infra::{SqliteMasterRepository, SqliteRecordLedger};
use toyu_store::{Database, DATABASE_FILE, SCHEMA_VERSION};
use toyu_types::{Customer, DeliveryRecord, NewDelivery, Tank};

fn open(dir: &std::path::Path) -> Database {
    Database::open(
        &dir.join(DATABASE_FILE),
        SCHEMA_VERSION,
        Duration::from_millis(500),
    )
    .unwrap()
}

fn delivery(date: &str, time: &str, qty: f64) -> NewDelivery {
    NewDelivery {
        cust_code: "C1".to_string(),
        cust_name: "Acme".to_string(),
        date: date.to_string(),
        time: time.to_string(),
        tank_id: "T1".to_string(),
        tank_name: "Tank A".to_string(),
        qty,
        unit_price: 100.0,
    }
}

fn ids(records: &[DeliveryRecord]) -> BTreeSet<i64> {
    records.iter().map(|r| r.id).collect()
}

#[test]
fn save_against_imported_masters() {
    let dir = tempdir().unwrap();
    let db = open(dir.path());
    let masters = SqliteMasterRepository::new(db.clone());
    let ledger = SqliteRecordLedger::new(db);

    masters
        .import_customers(
            &[Customer {
                customer_code: "C1".to_string(),
                official_name: "Acme".to_string(),
                official_kana: String::new(),
                unit_price: 100.0,
            }],
            Utc::now(),
        )
        .unwrap();
    masters
        .import_tanks(
            &[Tank {
                tank_id: "T1".to_string(),
                customer_code: "C1".to_string(),
                tank_name: "Tank A".to_string(),
                tank_capacity: Some(1000.0),
            }],
            Utc::now(),
        )
        .unwrap();

    let snapshot = masters.load_all().unwrap();
    let customer = snapshot.customer("C1").unwrap();
    let tank = snapshot.tanks_for("C1")[0];

    let record = ledger
        .append(NewDelivery {
            cust_code: customer.customer_code.clone(),
            cust_name: customer.official_name.clone(),
            date: "2024/03/02".to_string(),
            time: "10:00".to_string(),
            tank_id: tank.tank_id.clone(),
            tank_name: tank.tank_name.clone(),
            qty: 50.0,
            unit_price: customer.unit_price,
        })
        .unwrap();

    assert_eq!(record.amount, 5000.0);
    assert_eq!(record.tax, 500.0);
    assert_eq!(record.total, 5500.0);
    assert!(!record.exported);
}

#[test]
fn sweep_removes_only_expired_exported_records() {
    let dir = tempdir().unwrap();
    let ledger = SqliteRecordLedger::new(open(dir.path()));

    let saved = ledger
        .append_all(vec![
            delivery("2024/01/01", "09:00", 1.0),
            delivery("2024/02/01", "09:00", 1.0),
            delivery("2023/12/01", "09:00", 1.0),
        ])
        .unwrap();
    ledger.mark_exported(&ids(&saved[..2]), Utc::now()).unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    let report = sweep(&ledger, today, 30).unwrap();
    assert_eq!(report.cutoff, "2024/02/01");
    assert_eq!(report.deleted, 1);

    let again = sweep(&ledger, today, 30).unwrap();
    assert_eq!(again.deleted, 0);

    let left: Vec<String> = ledger
        .scan(&RecordFilter::all())
        .unwrap()
        .into_iter()
        .map(|r| r.date)
        .collect();
    // The old but unexported December record stays
    assert_eq!(left, vec!["2023/12/01", "2024/02/01"]);
}

#[test]
fn export_scan_returns_unexported_in_order() {
    let dir = tempdir().unwrap();
    let ledger = SqliteRecordLedger::new(open(dir.path()));

    let saved = ledger
        .append_all(vec![
            delivery("2024/01/02", "08:00", 1.0),
            delivery("2024/01/01", "17:00", 2.0),
            delivery("2024/01/01", "09:00", 3.0),
        ])
        .unwrap();
    ledger.mark_exported(&ids(&saved[..1]), Utc::now()).unwrap();

    let selected = select_for_export(ledger.scan(&RecordFilter::unexported()).unwrap());
    let keys: Vec<_> = selected
        .iter()
        .map(|r| (r.date.as_str(), r.time.as_str()))
        .collect();
    assert_eq!(keys, vec![("2024/01/01", "09:00"), ("2024/01/01", "17:00")]);
}

#[test]
fn backup_then_restore_reproduces_records() {
    let dir = tempdir().unwrap();
    let source = SqliteRecordLedger::new(open(dir.path()));
    let saved = source
        .append_all(vec![
            delivery("2024/01/01", "09:00", 10.0),
            delivery("2024/01/02", "09:30", 12.5),
        ])
        .unwrap();
    source.mark_exported(&ids(&saved[..1]), Utc::now()).unwrap();
    let original = source.scan(&RecordFilter::all()).unwrap();
    let bytes = encode_backup(&original).unwrap();

    let other_dir = tempdir().unwrap();
    let target = SqliteRecordLedger::new(open(other_dir.path()));
    target.replace_all(&decode_backup(&bytes).unwrap()).unwrap();

    let strip = |records: Vec<DeliveryRecord>| -> Vec<DeliveryRecord> {
        records
            .into_iter()
            .map(|r| DeliveryRecord { id: 0, ..r })
            .collect()
    };
    assert_eq!(
        strip(target.scan(&RecordFilter::all()).unwrap()),
        strip(original)
    );
}

#[test]
fn data_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let ledger = SqliteRecordLedger::new(open(dir.path()));
        ledger.append(delivery("2024/01/01", "09:00", 1.0)).unwrap();
    }
    let ledger = SqliteRecordLedger::new(open(dir.path()));
    assert_eq!(ledger.count(&RecordFilter::all()).unwrap(), 1);
}
