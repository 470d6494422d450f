//! Mapping of SQLite failures onto the ledger error taxonomy

use rusqlite::ErrorCode;
use toyu_types::Error;

fn code(err: &rusqlite::Error) -> Option<ErrorCode> {
    err.sqlite_error_code()
}

/// Another connection holds a lock we need
pub(crate) fn is_blocked(err: &rusqlite::Error) -> bool {
    matches!(
        code(err),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

/// The storage itself cannot be used (missing, unreadable, full, corrupt)
pub(crate) fn is_unavailable(err: &rusqlite::Error) -> bool {
    matches!(
        code(err),
        Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::NotADatabase)
            | Some(ErrorCode::DatabaseCorrupt)
            | Some(ErrorCode::DiskFull)
            | Some(ErrorCode::ReadOnly)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::SystemIoFailure)
    )
}

pub(crate) fn blocked(location: &str, err: &rusqlite::Error) -> Error {
    Error::DatabaseBlocked {
        path: location.to_string(),
        reason: err.to_string(),
    }
}

/// Failure while opening or upgrading the database
pub(crate) fn open_error(location: &str, err: rusqlite::Error) -> Error {
    if is_blocked(&err) {
        blocked(location, &err)
    } else if is_unavailable(&err) {
        Error::DatabaseUnavailable {
            path: location.to_string(),
            reason: err.to_string(),
        }
    } else {
        Error::PersistenceFailure {
            operation: "upgrade the database schema".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Failure inside a write transaction; the transaction has been rolled back
pub(crate) fn write_error(location: &str, operation: &str, err: rusqlite::Error) -> Error {
    if is_blocked(&err) {
        blocked(location, &err)
    } else {
        Error::PersistenceFailure {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Failure while reading; scans stop here instead of skipping rows
pub(crate) fn read_error(location: &str, operation: &str, err: rusqlite::Error) -> Error {
    if is_blocked(&err) {
        blocked(location, &err)
    } else {
        Error::ScanAborted {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}
