//! Error types for toyu-ledger

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory could not be determined")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Database unavailable ({path}): {reason}. Check free disk space and file permissions, then restart"
    )]
    DatabaseUnavailable { path: String, reason: String },

    #[error(
        "Database is in use by another session ({path}): {reason}. Close other ledger sessions and retry"
    )]
    DatabaseBlocked { path: String, reason: String },

    #[error("Malformed import file {file}: {reason}")]
    MalformedImport { file: String, reason: String },

    #[error("Failed to {operation}: {reason}. Previous data was kept unchanged")]
    PersistenceFailure { operation: String, reason: String },

    #[error("Stopped while trying to {operation}: {reason}. No partial result was applied")]
    ScanAborted { operation: String, reason: String },

    #[error("Invalid quantity {qty} for tank {tank_id}: enter a quantity greater than zero")]
    InvalidQuantity { tank_id: String, qty: f64 },

    #[error("Quantity {qty} L exceeds the capacity of tank {tank_id} ({capacity} L)")]
    CapacityExceeded {
        tank_id: String,
        capacity: f64,
        qty: f64,
    },

    #[error("Customer not found: {0}. Import the customer master first")]
    CustomerNotFound(String),

    #[error("Tank not found: {0}. Import the tank master first")]
    TankNotFound(String),

    #[error("Tank {0} was entered more than once: enter one quantity per tank")]
    DuplicateTank(String),

    #[error("Malformed backup file: {0}")]
    MalformedBackup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Excel export error: {0}")]
    Excel(String),
}

impl Error {
    /// Build a `MalformedImport` for the named file
    pub fn malformed_import(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedImport {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Whether the session cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::DatabaseUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
