//! SQLite implementation of RecordLedger

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};
use tracing::{debug, info};

use toyu_domain::repository::RecordLedger;
use toyu_domain::service::price_delivery;
use toyu_domain::{ExportState, RecordFilter};
use toyu_store::rows::{insert_new_record, insert_restored_record, record_from_row, RECORD_COLUMNS};
use toyu_store::Database;
use toyu_types::{DeliveryRecord, Error, NewDelivery, PriceBreakdown, Result};

const SCAN: &str = "scan the delivery records";

/// Delivery records stored in the `records` table
pub struct SqliteRecordLedger {
    db: Database,
}

impl SqliteRecordLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Translate a filter into a `WHERE` clause and its positional arguments
fn where_clause(filter: &RecordFilter) -> (String, Vec<String>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    // NULL is a row from before the flag existed
    match filter.state {
        ExportState::Any => {}
        ExportState::Unexported => conditions.push("COALESCE(exported, 0) = 0".to_string()),
        ExportState::Exported => conditions.push("COALESCE(exported, 0) <> 0".to_string()),
    }
    if let Some(date) = &filter.date {
        args.push(date.clone());
        conditions.push(format!("date = ?{}", args.len()));
    }
    if let Some(cutoff) = &filter.dated_before {
        args.push(cutoff.clone());
        conditions.push(format!("date < ?{}", args.len()));
    }
    if let Some(name) = &filter.customer_name {
        args.push(name.clone());
        conditions.push(format!("instr(lower(cust_name), lower(?{})) > 0", args.len()));
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

fn stored_record(id: i64, input: NewDelivery, price: PriceBreakdown) -> DeliveryRecord {
    DeliveryRecord {
        id,
        cust_code: input.cust_code,
        cust_name: input.cust_name,
        date: input.date,
        time: input.time,
        tank_id: input.tank_id,
        tank_name: input.tank_name,
        qty: input.qty,
        unit_price: input.unit_price,
        amount: price.amount,
        tax: price.tax,
        total: price.total,
        exported: false,
        exported_date: None,
    }
}

impl RecordLedger for SqliteRecordLedger {
    fn append(&self, input: NewDelivery) -> Result<DeliveryRecord> {
        self.append_all(vec![input])?
            .pop()
            .ok_or_else(|| Error::PersistenceFailure {
                operation: "save the delivery".to_string(),
                reason: "the store returned no record".to_string(),
            })
    }

    fn append_all(&self, inputs: Vec<NewDelivery>) -> Result<Vec<DeliveryRecord>> {
        // Price everything before touching the store so a bad row writes nothing
        let priced = inputs
            .into_iter()
            .map(|input| price_delivery(&input).map(|price| (input, price)))
            .collect::<Result<Vec<_>>>()?;

        let ids = self.db.write("save the deliveries", |tx| {
            priced
                .iter()
                .map(|(input, price)| insert_new_record(tx, input, price))
                .collect::<rusqlite::Result<Vec<i64>>>()
        })?;

        let saved: Vec<DeliveryRecord> = ids
            .into_iter()
            .zip(priced)
            .map(|(id, (input, price))| stored_record(id, input, price))
            .collect();
        info!(count = saved.len(), "deliveries saved");
        Ok(saved)
    }

    /// The ledger stays locked while `visitor` runs; it must not call back
    /// into the ledger.
    fn visit(
        &self,
        filter: &RecordFilter,
        visitor: &mut dyn FnMut(DeliveryRecord) -> Result<()>,
    ) -> Result<usize> {
        let (clause, args) = where_clause(filter);
        let sql = format!(
            "SELECT {} FROM records{} ORDER BY date, time, id",
            RECORD_COLUMNS, clause
        );

        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| self.db.read_error(SCAN, e))?;
        let mut rows = stmt
            .query(params_from_iter(args.iter()))
            .map_err(|e| self.db.read_error(SCAN, e))?;

        let mut visited = 0;
        while let Some(row) = rows.next().map_err(|e| self.db.read_error(SCAN, e))? {
            let record = record_from_row(row).map_err(|e| self.db.read_error(SCAN, e))?;
            visitor(record)?;
            visited += 1;
        }
        debug!(visited, "record scan finished");
        Ok(visited)
    }

    fn count(&self, filter: &RecordFilter) -> Result<usize> {
        let (clause, args) = where_clause(filter);
        let count: i64 = self.db.read("count the delivery records", |conn| {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM records{}", clause),
                params_from_iter(args.iter()),
                |row| row.get(0),
            )
        })?;
        Ok(count as usize)
    }

    fn mark_exported(&self, ids: &BTreeSet<i64>, exported_at: DateTime<Utc>) -> Result<usize> {
        let stamp = exported_at.to_rfc3339();
        let marked = self.db.write("flag the exported records", |tx| {
            let mut stmt = tx.prepare(
                "UPDATE records
                 SET exported = 1, exported_date = COALESCE(exported_date, ?2)
                 WHERE id = ?1",
            )?;
            let mut marked = 0;
            for id in ids {
                marked += stmt.execute(params![id, stamp])?;
            }
            Ok(marked)
        })?;
        info!(requested = ids.len(), marked, "records flagged as exported");
        Ok(marked)
    }

    fn bulk_delete(&self, filter: &RecordFilter) -> Result<usize> {
        let (clause, args) = where_clause(filter);
        self.db.write("delete the delivery records", |tx| {
            tx.execute(
                &format!("DELETE FROM records{}", clause),
                params_from_iter(args.iter()),
            )
        })
    }

    fn clear_all(&self) -> Result<usize> {
        let deleted = self.db.write("clear the delivery records", |tx| {
            tx.execute("DELETE FROM records", [])
        })?;
        info!(deleted, "ledger cleared");
        Ok(deleted)
    }

    fn replace_all(&self, records: &[DeliveryRecord]) -> Result<usize> {
        let (removed, inserted) = self.db.write("restore the delivery records", |tx| {
            let removed = tx.execute("DELETE FROM records", [])?;
            for record in records {
                insert_restored_record(tx, record)?;
            }
            Ok((removed, records.len()))
        })?;
        info!(removed, inserted, "ledger replaced");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(date: &str, time: &str, name: &str, qty: f64) -> NewDelivery {
        NewDelivery {
            cust_code: "C1".to_string(),
            cust_name: name.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            tank_id: "T1".to_string(),
            tank_name: "Tank A".to_string(),
            qty,
            unit_price: 100.0,
        }
    }

    fn ledger() -> SqliteRecordLedger {
        SqliteRecordLedger::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_append_prices_and_assigns_ids() {
        let ledger = ledger();
        let first = ledger.append(delivery("2024/01/01", "09:00", "Acme", 50.0)).unwrap();
        let second = ledger.append(delivery("2024/01/01", "09:10", "Acme", 1.0)).unwrap();

        assert_eq!((first.amount, first.tax, first.total), (5000.0, 500.0, 5500.0));
        assert!(!first.exported);
        assert!(first.exported_date.is_none());
        assert!(second.id > first.id);
    }

    #[test]
    fn test_invalid_quantity_writes_nothing() {
        let ledger = ledger();
        let result = ledger.append_all(vec![
            delivery("2024/01/01", "09:00", "Acme", 10.0),
            delivery("2024/01/01", "09:00", "Acme", 0.0),
        ]);
        assert!(matches!(result, Err(Error::InvalidQuantity { .. })));
        assert_eq!(ledger.count(&RecordFilter::all()).unwrap(), 0);
    }

    #[test]
    fn test_ids_are_not_reused_after_clear() {
        let ledger = ledger();
        let before = ledger.append(delivery("2024/01/01", "09:00", "Acme", 1.0)).unwrap();
        ledger.clear_all().unwrap();
        let after = ledger.append(delivery("2024/01/01", "09:00", "Acme", 1.0)).unwrap();
        assert!(after.id > before.id);
    }

    #[test]
    fn test_mark_exported_skips_missing_and_keeps_first_stamp() {
        let ledger = ledger();
        let record = ledger.append(delivery("2024/01/01", "09:00", "Acme", 1.0)).unwrap();
        let first = DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-02-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let ids: BTreeSet<i64> = [record.id, 9999].into_iter().collect();
        assert_eq!(ledger.mark_exported(&ids, first).unwrap(), 1);
        ledger.mark_exported(&ids, later).unwrap();

        let stored = ledger.scan(&RecordFilter::exported()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].exported_date, Some(first));
    }

    #[test]
    fn test_filters_combine() {
        let ledger = ledger();
        ledger.append(delivery("2024/01/01", "09:00", "Acme Oil", 1.0)).unwrap();
        ledger.append(delivery("2024/01/02", "09:00", "Beta Farm", 1.0)).unwrap();
        let third = ledger.append(delivery("2024/01/02", "10:00", "ACME Store", 1.0)).unwrap();
        ledger
            .mark_exported(&[third.id].into_iter().collect(), Utc::now())
            .unwrap();

        let by_name = RecordFilter::all().with_customer_name("acme");
        assert_eq!(ledger.count(&by_name).unwrap(), 2);
        assert_eq!(ledger.count(&RecordFilter::on_date("2024/01/02")).unwrap(), 2);
        assert_eq!(ledger.count(&RecordFilter::unexported()).unwrap(), 2);
        assert_eq!(
            ledger
                .count(&by_name.with_state(ExportState::Unexported))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_name_filter_agrees_with_in_memory_predicate() {
        let ledger = ledger();
        for name in ["Les écoles", "ÉCOLE", "Acme Oil"] {
            ledger.append(delivery("2024/01/01", "09:00", name, 1.0)).unwrap();
        }

        for needle in ["école", "ACME", "oil"] {
            let filter = RecordFilter::all().with_customer_name(needle);
            let in_memory = ledger
                .scan(&RecordFilter::all())
                .unwrap()
                .iter()
                .filter(|r| filter.matches(r))
                .count();
            assert_eq!(ledger.count(&filter).unwrap(), in_memory, "{}", needle);
        }
    }

    #[test]
    fn test_legacy_rows_count_as_unexported() {
        let db = Database::open_in_memory().unwrap();
        db.write("seed", |tx| {
            tx.execute(
                "INSERT INTO records (cust_code, cust_name, date, time, tank_id, tank_name, qty, unit_price, amount, tax, total)
                 VALUES ('C1', 'Acme', '2023/12/01', '09:00', 'T1', 'Tank A', 1, 100, 100, 10, 110)",
                [],
            )
        })
        .unwrap();
        let ledger = SqliteRecordLedger::new(db);
        assert_eq!(ledger.count(&RecordFilter::unexported()).unwrap(), 1);
        assert_eq!(ledger.count(&RecordFilter::exported()).unwrap(), 0);
    }

    #[test]
    fn test_visitor_error_stops_scan() {
        let ledger = ledger();
        for time in ["09:00", "10:00", "11:00"] {
            ledger.append(delivery("2024/01/01", time, "Acme", 1.0)).unwrap();
        }
        let mut seen = 0;
        let result = ledger.visit(&RecordFilter::all(), &mut |_| {
            seen += 1;
            if seen == 2 {
                Err(Error::Csv("disk full".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_replace_all_reassigns_ids() {
        let ledger = ledger();
        let old = ledger.append(delivery("2024/01/01", "09:00", "Old", 1.0)).unwrap();
        let mut restored = old.clone();
        restored.id = 1;
        restored.cust_name = "Restored".to_string();
        restored.exported = true;

        assert_eq!(ledger.replace_all(&[restored]).unwrap(), 1);
        let records = ledger.scan(&RecordFilter::all()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cust_name, "Restored");
        assert!(records[0].exported);
        assert!(records[0].id > old.id);
    }
}
