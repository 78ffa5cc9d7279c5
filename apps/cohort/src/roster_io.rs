//! # Roster Ingestion
//!
//! Reads preference rosters from disk or from upload payloads.
//!
//! ## Formats
//!
//! - JSON: `[{"person": 1, "choices": [2, 3, 4]}, ...]`
//! - Spreadsheet (xlsx, xlsm, xls, ods): first sheet, a header row, then four
//!   integer columns: person, first, second and third choice. Rows with a
//!   missing or non-integer cell are dropped.
//! - Upload: the same spreadsheet as a base64 data URL
//!   (`data:application/...;base64,UEsDB...`).

use crate::error::AppError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use calamine::{Data, DataType, Range, Reader, Xlsx, open_workbook_auto};
use cohort_core::{PersonId, PreferenceRecord, Roster};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Maximum roster file size (10 MB).
pub const MAX_ROSTER_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported roster encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Json,
    Spreadsheet,
}

impl RosterFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Self::Spreadsheet),
            other => Err(AppError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{other}")
            })),
        }
    }
}

// =============================================================================
// FILES
// =============================================================================

/// Resolve `path` and make sure it is a regular file within the size limit.
fn checked_input_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| AppError::io(path, e))?;
    let metadata = std::fs::metadata(&canonical).map_err(|e| AppError::io(path, e))?;

    if !metadata.is_file() {
        return Err(AppError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    if metadata.len() > MAX_ROSTER_FILE_SIZE {
        return Err(AppError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: MAX_ROSTER_FILE_SIZE,
        });
    }
    Ok(canonical)
}

/// Load a roster from a JSON or spreadsheet file.
pub fn load_roster(path: &Path) -> Result<Roster, AppError> {
    let format = RosterFormat::from_path(path)?;
    let canonical = checked_input_path(path)?;

    let roster = match format {
        RosterFormat::Json => {
            let text =
                std::fs::read_to_string(&canonical).map_err(|e| AppError::io(path, e))?;
            roster_from_json(&text)?
        }
        RosterFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto(&canonical)
                .map_err(|e| AppError::Spreadsheet(e.to_string()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or_else(|| AppError::Spreadsheet("workbook has no sheets".to_string()))?
                .map_err(|e| AppError::Spreadsheet(e.to_string()))?;
            roster_from_range(&range)
        }
    };

    tracing::debug!(path = %path.display(), records = roster.len(), "roster loaded");
    Ok(roster)
}

/// Write a roster as pretty-printed JSON.
pub fn save_roster_json(path: &Path, roster: &Roster) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(roster)?;
    std::fs::write(path, text).map_err(|e| AppError::io(path, e))
}

// =============================================================================
// PAYLOADS
// =============================================================================

pub fn roster_from_json(text: &str) -> Result<Roster, AppError> {
    Ok(serde_json::from_str(text)?)
}

/// Read the first sheet of an in-memory xlsx workbook.
pub fn roster_from_xlsx_bytes(bytes: &[u8]) -> Result<Roster, AppError> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| AppError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| AppError::Spreadsheet(e.to_string()))?;
    Ok(roster_from_range(&range))
}

/// Decode a base64 payload, with or without a `data:...;base64,` prefix.
pub fn decode_data_url(contents: &str) -> Result<Vec<u8>, AppError> {
    let encoded = match contents.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => {
            if !header.ends_with(";base64") {
                return Err(AppError::Upload("data URL is not base64-encoded".to_string()));
            }
            body
        }
        Some(_) => return Err(AppError::Upload("unexpected ',' in payload".to_string())),
        None => contents,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Upload(e.to_string()))
}

// =============================================================================
// ROWS
// =============================================================================

fn cell_id(cell: &Data) -> Option<PersonId> {
    cell.as_i64()
        .and_then(|value| u64::try_from(value).ok())
        .map(PersonId)
}

/// Skip the header row; keep rows whose first four cells are all ids.
fn roster_from_range(range: &Range<Data>) -> Roster {
    range
        .rows()
        .skip(1)
        .filter_map(|row| match row {
            [person, first, second, third, ..] => Some(PreferenceRecord {
                person: cell_id(person)?,
                choices: [cell_id(first)?, cell_id(second)?, cell_id(third)?],
            }),
            _ => None,
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
