//! Record predicates shared by the ledger scan, bulk delete and history view

use toyu_types::DeliveryRecord;

/// Export lifecycle state to filter on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportState {
    #[default]
    Any,
    Unexported,
    Exported,
}

/// Conjunction of optional conditions over delivery records.
///
/// The default value matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub state: ExportState,
    /// Exact delivery date (`YYYY/MM/DD`)
    pub date: Option<String>,
    /// Delivery date strictly before this date
    pub dated_before: Option<String>,
    /// Substring of the customer name; case is folded for ASCII letters only
    pub customer_name: Option<String>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn unexported() -> Self {
        Self {
            state: ExportState::Unexported,
            ..Self::default()
        }
    }

    pub fn exported() -> Self {
        Self {
            state: ExportState::Exported,
            ..Self::default()
        }
    }

    pub fn on_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// Exported records dated before `cutoff`; the retention sweep target
    pub fn expired_before(cutoff: impl Into<String>) -> Self {
        Self {
            state: ExportState::Exported,
            dated_before: Some(cutoff.into()),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: ExportState) -> Self {
        self.state = state;
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.customer_name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// In-memory form of the SQL condition built by the SQLite ledger's
    /// `where_clause`; both fold case like SQLite `lower()`, ASCII only.
    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        let state_ok = match self.state {
            ExportState::Any => true,
            ExportState::Unexported => !record.exported,
            ExportState::Exported => record.exported,
        };
        if !state_ok {
            return false;
        }
        if let Some(ref date) = self.date {
            if &record.date != date {
                return false;
            }
        }
        if let Some(ref cutoff) = self.dated_before {
            if record.date.as_str() >= cutoff.as_str() {
                return false;
            }
        }
        if let Some(ref name) = self.customer_name {
            if !record
                .cust_name
                .to_ascii_lowercase()
                .contains(&name.to_ascii_lowercase())
            {
                return false;
            }
        }
        true
    }
}
