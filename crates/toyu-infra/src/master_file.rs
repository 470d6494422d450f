//! Readers for master import files
//!
//! Master files arrive either as JSON arrays or as CSV produced by the
//! customer-list converter. CSV is usually CP932 (Shift-JIS), as exported
//! by Japanese spreadsheet software. Both are read into the same row shape
//! so classification does not care where the rows came from.

use std::path::Path;

use encoding_rs::SHIFT_JIS;
use serde_json::{Map, Value};
use tracing::warn;

use toyu_types::{Error, Result};

/// Read a master file into raw JSON rows, choosing the format by extension
pub fn read_master_rows(path: &Path) -> Result<Vec<Value>> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path)
        .map_err(|e| Error::malformed_import(&file, format!("cannot read file: {}", e)))?;
    decode_master_rows(&file, &bytes)
}

/// Decode file contents already in memory; `file` names the source
pub fn decode_master_rows(file: &str, bytes: &[u8]) -> Result<Vec<Value>> {
    if file.to_ascii_lowercase().ends_with(".csv") {
        csv_rows(file, bytes)
    } else {
        json_rows(file, bytes)
    }
}

fn json_rows(file: &str, bytes: &[u8]) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_slice(strip_bom(bytes))
        .map_err(|e| Error::malformed_import(file, format!("invalid JSON: {}", e)))?;
    match value {
        Value::Array(rows) => Ok(rows),
        _ => Err(Error::malformed_import(file, "expected a JSON array of rows")),
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// UTF-8 when the bytes are valid UTF-8, CP932 otherwise
fn decode_text(file: &str, bytes: &[u8]) -> String {
    match std::str::from_utf8(strip_bom(bytes)) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = SHIFT_JIS.decode(bytes);
            if had_errors {
                warn!(file, "some characters could not be decoded from CP932");
            }
            decoded.into_owned()
        }
    }
}

fn csv_rows(file: &str, bytes: &[u8]) -> Result<Vec<Value>> {
    let text = decode_text(file, bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::malformed_import(file, format!("unreadable header: {}", e)))?
        .clone();

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            // +2: 0-based index plus the header line
            Error::malformed_import(file, format!("line {}: {}", row_idx + 2, e))
        })?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(key, field)| (key.to_string(), Value::String(field.to_string())))
            .collect();
        rows.push(Value::Object(row));
    }
    Ok(rows)
}
