//! Repository trait definitions for data persistence

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::filter::RecordFilter;
use toyu_types::{Customer, DeliveryRecord, MasterSnapshot, NewDelivery, Result, Tank};

/// Repository for customer and tank master data (顧客・タンクマスタ)
///
/// Both stores are replaced wholesale on import; there is no per-row update.
pub trait MasterRepository {
    /// Replace every customer with `customers` in one transaction
    fn import_customers(&self, customers: &[Customer], imported_at: DateTime<Utc>)
        -> Result<usize>;

    /// Replace every tank with `tanks` in one transaction
    fn import_tanks(&self, tanks: &[Tank], imported_at: DateTime<Utc>) -> Result<usize>;

    /// Current snapshot of both masters, served from the cache when warm
    fn load_all(&self) -> Result<Arc<MasterSnapshot>>;
}

/// Ledger of delivery records (配送記録)
pub trait RecordLedger {
    /// Append one delivery, pricing it and assigning a fresh id
    fn append(&self, input: NewDelivery) -> Result<DeliveryRecord>;

    /// Append several deliveries atomically
    fn append_all(&self, inputs: Vec<NewDelivery>) -> Result<Vec<DeliveryRecord>>;

    /// Stream matching records to `visitor` without collecting them.
    ///
    /// Stops at the first storage or visitor error. Returns the number visited.
    fn visit(
        &self,
        filter: &RecordFilter,
        visitor: &mut dyn FnMut(DeliveryRecord) -> Result<()>,
    ) -> Result<usize>;

    /// Collect matching records
    fn scan(&self, filter: &RecordFilter) -> Result<Vec<DeliveryRecord>> {
        let mut records = Vec::new();
        self.visit(filter, &mut |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    fn count(&self, filter: &RecordFilter) -> Result<usize>;

    /// Flag the given records as exported. Unknown ids are skipped.
    fn mark_exported(&self, ids: &BTreeSet<i64>, exported_at: DateTime<Utc>) -> Result<usize>;

    fn bulk_delete(&self, filter: &RecordFilter) -> Result<usize>;

    fn clear_all(&self) -> Result<usize>;

    /// Clear the ledger and insert `records` with fresh ids, atomically
    fn replace_all(&self, records: &[DeliveryRecord]) -> Result<usize>;
}
