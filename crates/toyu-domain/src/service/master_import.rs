//! Classification and validation of master import files
//!
//! A file is a customer file if its first element has `customerCode` and
//! `officialName`, a tank file if it has `tankId` and `customerCode`.
//! Anything else is rejected with the offending file named.

use serde::Serialize;
use serde_json::{Map, Value};
use toyu_types::{Customer, Error, Result, Tank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MasterKind {
    Customers,
    Tanks,
}

impl MasterKind {
    pub fn label(&self) -> &'static str {
        match self {
            MasterKind::Customers => "顧客マスタ",
            MasterKind::Tanks => "タンクマスタ",
        }
    }
}

/// Validated content of one master file
#[derive(Debug, Clone, PartialEq)]
pub enum MasterBatch {
    Customers(Vec<Customer>),
    Tanks(Vec<Tank>),
}

impl MasterBatch {
    pub fn kind(&self) -> MasterKind {
        match self {
            MasterBatch::Customers(_) => MasterKind::Customers,
            MasterBatch::Tanks(_) => MasterKind::Tanks,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MasterBatch::Customers(rows) => rows.len(),
            MasterBatch::Tanks(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decide which master a file holds by looking at its first element
pub fn classify(file: &str, rows: &[Value]) -> Result<MasterKind> {
    let first = rows
        .first()
        .ok_or_else(|| Error::malformed_import(file, "file contains no rows"))?;
    let object = first
        .as_object()
        .ok_or_else(|| Error::malformed_import(file, "rows must be objects"))?;

    let has = |key: &str| object.contains_key(key);
    if has("customerCode") && has("officialName") {
        Ok(MasterKind::Customers)
    } else if has("tankId") && has("customerCode") {
        Ok(MasterKind::Tanks)
    } else {
        Err(Error::malformed_import(
            file,
            "neither a customer file (customerCode, officialName) nor a tank file (tankId, customerCode)",
        ))
    }
}

/// Classify and validate a whole file
pub fn parse_master_file(file: &str, rows: &[Value]) -> Result<MasterBatch> {
    match classify(file, rows)? {
        MasterKind::Customers => parse_customers(file, rows).map(MasterBatch::Customers),
        MasterKind::Tanks => parse_tanks(file, rows).map(MasterBatch::Tanks),
    }
}

pub fn parse_customers(file: &str, rows: &[Value]) -> Result<Vec<Customer>> {
    rows.iter()
        .enumerate()
        .map(|(idx, value)| {
            let row = row_object(file, idx, value)?;
            let customer = Customer {
                customer_code: text_field(row, "customerCode"),
                official_name: text_field(row, "officialName"),
                official_kana: text_field(row, "officialKana"),
                unit_price: number_field(file, idx, row, "unitPrice")?.unwrap_or(0.0),
            };
            customer
                .validate()
                .map_err(|reason| row_error(file, idx, &reason))?;
            Ok(customer)
        })
        .collect()
}

pub fn parse_tanks(file: &str, rows: &[Value]) -> Result<Vec<Tank>> {
    rows.iter()
        .enumerate()
        .map(|(idx, value)| {
            let row = row_object(file, idx, value)?;
            let tank = Tank {
                tank_id: text_field(row, "tankId"),
                customer_code: text_field(row, "customerCode"),
                tank_name: text_field(row, "tankName"),
                tank_capacity: number_field(file, idx, row, "tankCapacity")?,
            };
            tank.validate()
                .map_err(|reason| row_error(file, idx, &reason))?;
            Ok(tank)
        })
        .collect()
}

fn row_object<'a>(file: &str, idx: usize, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| row_error(file, idx, "row is not an object"))
}

fn row_error(file: &str, idx: usize, reason: &str) -> Error {
    Error::malformed_import(file, format!("row {}: {}", idx + 1, reason))
}

/// String field; numeric codes such as `101` are accepted as text
fn text_field(row: &Map<String, Value>, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Numeric field; converter output carries numbers as strings (`"1,000"`)
fn number_field(
    file: &str,
    idx: usize,
    row: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>> {
    match row.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map(Some)
                .map_err(|_| row_error(file, idx, &format!("{} is not a number: {}", key, s)))
        }
        Some(other) => Err(row_error(
            file,
            idx,
            &format!("{} is not a number: {}", key, other),
        )),
    }
}
