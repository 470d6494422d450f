//! Domain services

pub mod export_selection;
pub mod master_import;
pub mod pricing;
pub mod retention;
pub mod summary;

pub use export_selection::{export_file_name, select_for_export};
pub use master_import::{classify, parse_master_file, MasterBatch, MasterKind};
pub use pricing::{price, price_delivery, NegativeQuantity};
pub use retention::{cutoff_date, sweep, SweepReport};
pub use summary::{summarize_by_day, DaySummary, LedgerTotals};
