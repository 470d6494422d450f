//! Row codecs between SQLite tables and ledger types

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use toyu_types::{normalize_exported, Customer, DeliveryRecord, NewDelivery, PriceBreakdown, Tank};

/// Metadata key of the last master import stamp
pub const META_LAST_IMPORT: &str = "lastImport";

pub const RECORD_COLUMNS: &str = "id, cust_code, cust_name, date, time, tank_id, tank_name, \
     qty, unit_price, amount, tax, total, exported, exported_date";

pub const CUSTOMER_COLUMNS: &str = "customer_code, official_name, official_kana, unit_price";

pub const TANK_COLUMNS: &str = "tank_id, customer_code, tank_name, tank_capacity";

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a row selected with [`RECORD_COLUMNS`]
pub fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DeliveryRecord> {
    let exported: Option<i64> = row.get(12)?;
    let exported_date = row
        .get::<_, Option<String>>(13)?
        .map(|text| parse_timestamp(13, &text))
        .transpose()?;

    Ok(DeliveryRecord {
        id: row.get(0)?,
        cust_code: row.get(1)?,
        cust_name: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        tank_id: row.get(5)?,
        tank_name: row.get(6)?,
        qty: row.get(7)?,
        unit_price: row.get(8)?,
        amount: row.get(9)?,
        tax: row.get(10)?,
        total: row.get(11)?,
        exported: normalize_exported(exported.map(|v| v != 0)),
        exported_date,
    })
}

pub fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        customer_code: row.get(0)?,
        official_name: row.get(1)?,
        official_kana: row.get(2)?,
        unit_price: row.get(3)?,
    })
}

pub fn tank_from_row(row: &Row<'_>) -> rusqlite::Result<Tank> {
    Ok(Tank {
        tank_id: row.get(0)?,
        customer_code: row.get(1)?,
        tank_name: row.get(2)?,
        tank_capacity: row.get(3)?,
    })
}

/// Insert a new, unexported record and return its id
pub fn insert_new_record(
    conn: &Connection,
    input: &NewDelivery,
    price: &PriceBreakdown,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO records (cust_code, cust_name, date, time, tank_id, tank_name,
            qty, unit_price, amount, tax, total, exported, exported_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, NULL)",
        params![
            input.cust_code,
            input.cust_name,
            input.date,
            input.time,
            input.tank_id,
            input.tank_name,
            input.qty,
            input.unit_price,
            price.amount,
            price.tax,
            price.total,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a record with all its content except the id, which is reassigned
pub fn insert_restored_record(conn: &Connection, record: &DeliveryRecord) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO records (cust_code, cust_name, date, time, tank_id, tank_name,
            qty, unit_price, amount, tax, total, exported, exported_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.cust_code,
            record.cust_name,
            record.date,
            record.time,
            record.tank_id,
            record.tank_name,
            record.qty,
            record.unit_price,
            record.amount,
            record.tax,
            record.total,
            record.exported,
            record.exported_date.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_customer(conn: &Connection, customer: &Customer) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO customers (customer_code, official_name, official_kana, unit_price)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            customer.customer_code,
            customer.official_name,
            customer.official_kana,
            customer.unit_price,
        ],
    )?;
    Ok(())
}

pub fn insert_tank(conn: &Connection, tank: &Tank) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO tanks (tank_id, customer_code, tank_name, tank_capacity)
         VALUES (?1, ?2, ?3, ?4)",
        params![tank.tank_id, tank.customer_code, tank.tank_name, tank.tank_capacity],
    )?;
    Ok(())
}

pub fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
        row.get(0)
    })
    .optional()
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// Read the last import stamp; an unparsable value counts as absent
pub fn last_import(conn: &Connection) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(get_meta(conn, META_LAST_IMPORT)?.and_then(|text| parse_timestamp(0, &text).ok()))
}
