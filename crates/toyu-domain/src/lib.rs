//! Domain layer - pricing, retention, export selection and repository traits

pub mod collaborator;
pub mod filter;
pub mod repository;
pub mod service;

pub use filter::{ExportState, RecordFilter};
