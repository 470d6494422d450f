//! Application Layer
//!
//! This module provides the application layer that orchestrates between
//! the CLI and the domain/infrastructure layers.
//!
//! The app layer contains:
//! - `session`: start-up sequence and access to the repositories
//! - `delivery_service`: delivery entry and price quotes
//! - `import_service`: master file import
//! - `export_service`: two-phase sales export
//! - `backup_service`: backup and two-phase restore
//! - `maintenance_service`: two-phase clear
//! - `history_service`: history and today's summary

pub mod backup_service;
pub mod command;
pub mod delivery_service;
pub mod export_service;
pub mod history_service;
pub mod import_service;
pub mod maintenance_service;
pub mod session;

pub use backup_service::{backup, prepare_restore, BackupOutcome, RestoreOutcome, RestorePreview};
pub use command::Prepared;
pub use delivery_service::{quote, save_deliveries, DeliveryRequest, Quote};
pub use export_service::{prepare_export, ExportOutcome, ExportPreview};
pub use history_service::{history, today, HistoryView, TodaySummary};
pub use import_service::{import_contents, import_files, tank_counts, ImportReport, TankCount};
pub use maintenance_service::{prepare_clear, ClearOutcome, ClearPreview};
pub use session::{Session, StartupReport};
