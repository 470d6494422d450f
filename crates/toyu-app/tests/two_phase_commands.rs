//! Session-level behaviour: delivery entry and the two-phase commands

use std::path::PathBuf;

use toyu_app::app::{
    backup, history, import_contents, prepare_clear, prepare_export, prepare_restore, quote,
    save_deliveries, today, DeliveryRequest, Prepared, Session,
};
use toyu_domain::collaborator::{ArtifactSink, FixedClock, MemorySink};
use toyu_domain::repository::RecordLedger;
use toyu_domain::{ExportState, RecordFilter};
use toyu_store::Database;
use toyu_types::{Error, ExportEncoding, Result};

const CUSTOMERS: &str = r#"[
    {"customerCode": "C1", "officialName": "Acme", "officialKana": "アクメ", "unitPrice": 100},
    {"customerCode": "C2", "officialName": "Beta Farm", "unitPrice": "95"}
]"#;

const TANKS: &str = r#"[
    {"tankId": "T1", "customerCode": "C1", "tankName": "Tank A", "tankCapacity": 1000},
    {"tankId": "T2", "customerCode": "C1", "tankName": "Tank B", "tankCapacity": 200},
    {"tankId": "T3", "customerCode": "C2", "tankName": "Main", "tankCapacity": 500}
]"#;

/// Sink that always fails, like a cancelled save dialog
struct FailingSink;

impl ArtifactSink for FailingSink {
    fn save(&mut self, _file_name: &str, _bytes: &[u8]) -> Result<PathBuf> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "save cancelled",
        )))
    }
}

fn session_at(db: Database, now: &str) -> Session {
    let clock = FixedClock::parse(now).unwrap();
    Session::start(db, Box::new(clock), 30).unwrap().0
}

fn seeded_session(now: &str) -> Session {
    let session = session_at(Database::open_in_memory().unwrap(), now);
    let report = import_contents(
        &session,
        &[
            ("customers.json".to_string(), CUSTOMERS.as_bytes().to_vec()),
            ("tanks.json".to_string(), TANKS.as_bytes().to_vec()),
        ],
    )
    .unwrap();
    assert_eq!(report.failed(), 0);
    session
}

fn request(customer: &str, quantities: &[(&str, f64)]) -> DeliveryRequest {
    DeliveryRequest {
        customer_code: customer.to_string(),
        quantities: quantities
            .iter()
            .map(|(id, qty)| (id.to_string(), *qty))
            .collect(),
    }
}

#[test]
fn import_reports_each_file_and_tank_counts() {
    let session = session_at(Database::open_in_memory().unwrap(), "2024-03-02 09:00:00");
    let report = import_contents(
        &session,
        &[
            ("customers.json".to_string(), CUSTOMERS.as_bytes().to_vec()),
            ("notes.json".to_string(), br#"[{"memo": "x"}]"#.to_vec()),
            ("tanks.json".to_string(), TANKS.as_bytes().to_vec()),
        ],
    )
    .unwrap();

    assert_eq!(report.failed(), 1);
    assert!(report.files[1].error.as_deref().unwrap().contains("notes.json"));
    assert_eq!(report.files[2].imported, 3);
    let counts: Vec<_> = report
        .tank_counts
        .iter()
        .map(|c| (c.customer_code.as_str(), c.tanks))
        .collect();
    assert_eq!(counts, vec![("C1", 2), ("C2", 1)]);
    assert_eq!(report.orphan_tanks, 0);
}

#[test]
fn save_creates_one_record_per_filled_tank() {
    let session = seeded_session("2024-03-02 08:05:00");
    let saved = save_deliveries(&session, &request("C1", &[("T1", 50.0), ("T2", 0.0)])).unwrap();

    assert_eq!(saved.len(), 1);
    let record = &saved[0];
    assert_eq!(record.date, "2024/03/02");
    assert_eq!(record.time, "08:05");
    assert_eq!(record.cust_name, "Acme");
    assert_eq!((record.amount, record.tax, record.total), (5000.0, 500.0, 5500.0));
    assert!(!record.exported);
}

#[test]
fn save_rejects_bad_input_without_writing() {
    let session = seeded_session("2024-03-02 08:05:00");

    let over = save_deliveries(&session, &request("C1", &[("T1", 10.0), ("T2", 250.0)]));
    assert!(matches!(over, Err(Error::CapacityExceeded { .. })));

    let nothing = save_deliveries(&session, &request("C1", &[("T1", 0.0)]));
    assert!(matches!(nothing, Err(Error::InvalidQuantity { .. })));

    let foreign_tank = save_deliveries(&session, &request("C1", &[("T3", 10.0)]));
    assert!(matches!(foreign_tank, Err(Error::TankNotFound(_))));

    let unknown = save_deliveries(&session, &request("C9", &[("T1", 10.0)]));
    assert!(matches!(unknown, Err(Error::CustomerNotFound(_))));

    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 0);
}

#[test]
fn tank_listed_twice_is_rejected_without_writing() {
    let session = seeded_session("2024-03-02 08:05:00");

    let twice = save_deliveries(&session, &request("C1", &[("T1", 600.0), ("T1", 600.0)]));
    match twice {
        Err(Error::DuplicateTank(tank_id)) => assert_eq!(tank_id, "T1"),
        other => panic!("unexpected: {:?}", other),
    }

    let with_zero = save_deliveries(&session, &request("C1", &[("T2", 0.0), ("T2", 5.0)]));
    assert!(matches!(with_zero, Err(Error::DuplicateTank(_))));

    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 0);
}

#[test]
fn tanks_without_capacity_import_and_accept_any_quantity() {
    let session = session_at(Database::open_in_memory().unwrap(), "2024-03-02 08:05:00");
    let report = import_contents(
        &session,
        &[
            ("customers.json".to_string(), CUSTOMERS.as_bytes().to_vec()),
            (
                "tanks.json".to_string(),
                br#"[
                    {"tankId": "T1", "customerCode": "C1", "tankCapacity": ""},
                    {"tankId": "T2", "customerCode": "C1"}
                ]"#
                .to_vec(),
            ),
        ],
    )
    .unwrap();
    assert_eq!(report.failed(), 0);
    assert_eq!(report.files[1].imported, 2);

    let saved = save_deliveries(&session, &request("C1", &[("T1", 5000.0), ("T2", 12.5)])).unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].qty, 5000.0);
}

#[test]
fn quote_uses_customer_price() {
    let session = seeded_session("2024-03-02 08:05:00");
    let quote = quote(&session, "C2", 10.0).unwrap();
    assert_eq!(quote.unit_price, 95.0);
    assert_eq!(quote.price.amount, 950.0);
    assert_eq!(quote.price.tax, 95.0);
    assert_eq!(quote.price.total, 1045.0);
}

#[test]
fn failed_sink_leaves_records_unexported() {
    let session = seeded_session("2024-03-02 08:05:00");
    save_deliveries(&session, &request("C1", &[("T1", 50.0)])).unwrap();

    let mut sink = FailingSink;
    let prepared = prepare_export(&session, &mut sink, ExportEncoding::Utf8).unwrap();
    assert_eq!(prepared.preview().records, 1);
    assert!(prepared.confirm().is_err());

    assert_eq!(session.ledger().count(&RecordFilter::unexported()).unwrap(), 1);
}

#[test]
fn cancelled_export_changes_nothing() {
    let session = seeded_session("2024-03-02 08:05:00");
    save_deliveries(&session, &request("C1", &[("T1", 50.0)])).unwrap();

    let mut sink = MemorySink::default();
    let prepared = prepare_export(&session, &mut sink, ExportEncoding::Utf8).unwrap();
    drop(prepared);

    assert!(sink.saved.is_empty());
    assert_eq!(session.ledger().count(&RecordFilter::unexported()).unwrap(), 1);
}

#[test]
fn confirmed_export_writes_csv_then_flags() {
    let session = seeded_session("2024-03-02 14:05:09");
    save_deliveries(&session, &request("C1", &[("T1", 50.0), ("T2", 20.0)])).unwrap();

    let mut sink = MemorySink::default();
    let outcome = prepare_export(&session, &mut sink, ExportEncoding::Utf8)
        .unwrap()
        .confirm()
        .unwrap();
    assert_eq!(outcome.exported, 2);

    let (name, bytes) = &sink.saved[0];
    assert_eq!(name, "delivery_240302140509.csv");
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(1).unwrap().contains("on-account"));

    assert_eq!(session.ledger().count(&RecordFilter::unexported()).unwrap(), 0);
    let mut again = MemorySink::default();
    let second = prepare_export(&session, &mut again, ExportEncoding::Utf8).unwrap();
    assert!(second.preview().is_empty());
}

#[test]
fn backup_of_empty_ledger_writes_nothing() {
    let session = seeded_session("2024-03-02 08:05:00");
    let mut sink = MemorySink::default();
    assert!(backup(&session, &mut sink).unwrap().is_none());
    assert!(sink.saved.is_empty());
}

#[test]
fn restore_replaces_ledger_after_confirmation() {
    let session = seeded_session("2024-03-02 08:05:00");
    save_deliveries(&session, &request("C1", &[("T1", 50.0)])).unwrap();
    save_deliveries(&session, &request("C2", &[("T3", 10.0)])).unwrap();

    let mut sink = MemorySink::default();
    let outcome = backup(&session, &mut sink).unwrap().unwrap();
    assert_eq!(outcome.records, 2);
    let (name, bytes) = sink.saved[0].clone();
    assert_eq!(name, "backup_240302080500.json");

    save_deliveries(&session, &request("C1", &[("T2", 5.0)])).unwrap();

    let prepared = prepare_restore(&session, &bytes).unwrap();
    assert_eq!(prepared.preview().incoming, 2);
    assert_eq!(prepared.preview().existing, 3);
    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 3);

    assert_eq!(prepared.confirm().unwrap().restored, 2);
    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 2);
}

#[test]
fn malformed_backup_is_refused_before_anything_changes() {
    let session = seeded_session("2024-03-02 08:05:00");
    save_deliveries(&session, &request("C1", &[("T1", 50.0)])).unwrap();

    assert!(matches!(
        prepare_restore(&session, b"[]"),
        Err(Error::MalformedBackup(_))
    ));
    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 1);
}

#[test]
fn clear_runs_only_on_confirm() {
    let session = seeded_session("2024-03-02 08:05:00");
    save_deliveries(&session, &request("C1", &[("T1", 50.0)])).unwrap();

    let prepared = prepare_clear(&session).unwrap();
    assert_eq!(prepared.preview().records, 1);
    assert_eq!(prepared.preview().unexported, 1);
    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 1);

    assert_eq!(prepared.confirm().unwrap().deleted, 1);
    assert_eq!(session.ledger().count(&RecordFilter::all()).unwrap(), 0);
}

#[test]
fn history_and_today_views() {
    let session = seeded_session("2024-03-02 08:05:00");
    save_deliveries(&session, &request("C1", &[("T1", 50.0), ("T2", 10.0)])).unwrap();
    save_deliveries(&session, &request("C2", &[("T3", 10.0)])).unwrap();

    let view = history(&session, ExportState::Any, Some("beta")).unwrap();
    assert_eq!(view.totals.count, 1);
    assert_eq!(view.days[0].date, "2024/03/02");

    let unexported = history(&session, ExportState::Unexported, None).unwrap();
    assert_eq!(unexported.totals.count, 3);

    let summary = today(&session).unwrap();
    assert_eq!(summary.date, "2024/03/02");
    assert_eq!(summary.totals.count, 3);
    assert_eq!(summary.pending_export, 3);
}
