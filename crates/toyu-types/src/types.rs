//! Entity types shared by the store, the repositories and the front end

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery date format. Zero-padded, so string order is chronological order.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Delivery time format (24h, zero-padded)
pub const TIME_FORMAT: &str = "%H:%M";

/// Customer master entry (顧客マスタ)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// 顧客コード
    pub customer_code: String,
    /// 正式名称
    pub official_name: String,
    /// 正式名称カナ
    #[serde(default)]
    pub official_kana: String,
    /// 単価 (円/L)
    #[serde(default)]
    pub unit_price: f64,
}

impl Customer {
    /// Check the invariants a stored customer must satisfy
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.customer_code.trim().is_empty() {
            return Err("customerCode is empty".to_string());
        }
        if self.official_name.trim().is_empty() {
            return Err(format!(
                "officialName is empty for customer {}",
                self.customer_code
            ));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(format!(
                "unitPrice {} is negative for customer {}",
                self.unit_price, self.customer_code
            ));
        }
        Ok(())
    }
}

/// Tank master entry (タンクマスタ)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    pub tank_id: String,
    /// Not enforced against the customer master
    pub customer_code: String,
    #[serde(default)]
    pub tank_name: String,
    /// 容量 (L), upper bound for a single delivery; `None` means no limit
    #[serde(default)]
    pub tank_capacity: Option<f64>,
}

impl Tank {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tank_id.trim().is_empty() {
            return Err("tankId is empty".to_string());
        }
        if self.customer_code.trim().is_empty() {
            return Err(format!("customerCode is empty for tank {}", self.tank_id));
        }
        match self.tank_capacity {
            Some(capacity) if !capacity.is_finite() || capacity <= 0.0 => Err(format!(
                "tankCapacity {} is not positive for tank {}",
                capacity, self.tank_id
            )),
            _ => Ok(()),
        }
    }
}

/// Read-only projection of both master stores
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSnapshot {
    pub customers: Vec<Customer>,
    pub tanks: Vec<Tank>,
    pub last_import: Option<DateTime<Utc>>,
}

impl MasterSnapshot {
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty() && self.tanks.is_empty()
    }

    pub fn customer(&self, code: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.customer_code == code)
    }

    pub fn tank(&self, tank_id: &str) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.tank_id == tank_id)
    }

    /// Tanks registered for a customer; a dangling code simply yields nothing
    pub fn tanks_for(&self, customer_code: &str) -> Vec<&Tank> {
        self.tanks
            .iter()
            .filter(|t| t.customer_code == customer_code)
            .collect()
    }
}

/// Amount, consumption tax and total for one delivery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub amount: f64,
    pub tax: f64,
    pub total: f64,
}

/// A delivery about to be appended to the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct NewDelivery {
    pub cust_code: String,
    pub cust_name: String,
    pub date: String,
    pub time: String,
    pub tank_id: String,
    pub tank_name: String,
    pub qty: f64,
    pub unit_price: f64,
}

/// One fill-up, as stored in the ledger and written to backups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub id: i64,
    pub cust_code: String,
    /// Customer name at save time; later master edits do not touch it
    pub cust_name: String,
    pub date: String,
    pub time: String,
    pub tank_id: String,
    pub tank_name: String,
    pub qty: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub tax: f64,
    pub total: f64,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub exported_date: Option<DateTime<Utc>>,
}

impl DeliveryRecord {
    /// Sort key used for export ordering
    pub fn chrono_key(&self) -> (&str, &str) {
        (self.date.as_str(), self.time.as_str())
    }
}

/// Normalize the stored export flag.
///
/// Rows written before the flag existed carry no value at all; they are
/// unexported.
pub fn normalize_exported(flag: Option<bool>) -> bool {
    flag.unwrap_or(false)
}
