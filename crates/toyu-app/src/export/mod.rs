//! Export functionality

pub mod excel;

pub use excel::{history_file_name, history_workbook};
