//! Workbook discovery and loading for the SocialPulse report engine.
//!
//! Reads `.xlsx` / `.xls` report exports via `calamine` and converts every
//! sheet into an untyped [`RawSheet`] grid for downstream layout detection
//! and record extraction.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use pulse_core::error::{ReportError, Result};
use pulse_core::models::CellValue;
use tracing::{debug, warn};

// ── RawSheet ──────────────────────────────────────────────────────────────────

/// An ordered grid of untyped cells, one per workbook sheet.
///
/// Transient: produced here, consumed once by the extraction pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// The sheet's display name, used for period derivation.
    pub name: String,
    /// Rows of cells as they appear in the sheet.
    pub rows: Vec<Vec<CellValue>>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all workbook files (`.xlsx` / `.xls`) recursively under
/// `report_dir`, sorted by path.
pub fn find_workbook_files(report_dir: &Path) -> Vec<PathBuf> {
    if !report_dir.exists() {
        warn!("Report path does not exist: {}", report_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(report_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| {
                        ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls")
                    })
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every sheet of the workbook at `path` into a [`RawSheet`] grid.
///
/// Fails fast with [`ReportError::WorkbookRead`] when the file cannot be
/// opened or decoded; no partial dataset is returned.
pub fn load_workbook_path(path: &Path) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReportError::WorkbookRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(collect_sheets(&mut workbook))
}

/// Load every sheet of a workbook supplied as an in-memory byte buffer.
pub fn load_workbook_bytes(bytes: &[u8]) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ReportError::WorkbookData(e.to_string()))?;
    Ok(collect_sheets(&mut workbook))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Convert one calamine cell into the engine's [`CellValue`].
fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        // Excel serial date; downstream normalization treats it numerically.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("{e:?}")),
    }
}

/// Drain all sheets from an open workbook.
///
/// A sheet whose range cannot be read is logged and skipped; the remaining
/// sheets still load.
fn collect_sheets<RS>(workbook: &mut Sheets<RS>) -> Vec<RawSheet>
where
    RS: std::io::Read + std::io::Seek,
{
    let mut sheets = Vec::new();

    let names: Vec<String> = workbook
        .sheet_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for name in names {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                warn!("Failed to read sheet {}: {}", name, e);
                continue;
            }
        };

        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        debug!("Sheet {}: {} rows", name, rows.len());
        sheets.push(RawSheet { name, rows });
    }

    sheets
}

// ── Tests ─────────────────────────────────────────────────────────────────────
