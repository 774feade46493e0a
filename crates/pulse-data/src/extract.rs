//! Row-to-record extraction and the workbook parse pipeline.
//!
//! Turns raw sheet grids into [`PageRecord`]s: the header row is detected,
//! column roles are classified, and every data row below the header is
//! normalized into at most one record. Summary/subtotal rows and rows
//! without a page name are dropped.

use std::path::Path;

use pulse_core::error::{ReportError, Result};
use pulse_core::models::{normalize_platform, CellValue, PageRecord, ReportPeriod};
use pulse_core::period::parse_sheet_period;
use pulse_core::values::NumberNormalizer;
use tracing::debug;

use crate::layout::{detect_header_row, ColumnMap};
use crate::reader::{load_workbook_bytes, load_workbook_path, RawSheet};

// ── Positional fallbacks ──────────────────────────────────────────────────────

/// Fixed column offsets used when keyword classification finds no column
/// for a role. They encode the canonical layout of the recurring report.
mod fallback {
    pub const PLATFORM: usize = 0;
    pub const CATEGORY: usize = 1;
    pub const PAGE_NAME: usize = 2;
    pub const FOLLOWERS: usize = 3;
    pub const FOLLOWER_GROWTH: usize = 4;
    pub const FOLLOWER_GROWTH_PCT: usize = 5;
    pub const REACH: usize = 6;
    pub const REACH_GROWTH: usize = 7;
    pub const REACH_GROWTH_PCT: usize = 8;
    pub const URL: usize = 12;
    pub const OWNER: usize = 13;
    pub const VIEW_COLUMNS: [usize; 3] = [10, 11, 12];
}

/// Placeholder for rows whose page name could not be resolved; such rows
/// never become records.
const UNSET_PAGE_NAME: &str = "Unknown Page";

/// CJK fragments marking a summary/subtotal row.
const SUMMARY_MARKERS: [&str; 2] = ["总计", "合计"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a workbook supplied as an in-memory byte buffer into records.
///
/// Fails with [`ReportError::NoValidData`] when the workbook is readable
/// but no sheet yields a usable row, a distinct condition from a decode
/// failure.
pub fn parse_workbook_bytes(bytes: &[u8]) -> Result<Vec<PageRecord>> {
    let sheets = load_workbook_bytes(bytes)?;
    records_or_no_data(&sheets)
}

/// Parse the workbook at `path` into records.
pub fn parse_workbook_path(path: &Path) -> Result<Vec<PageRecord>> {
    let sheets = load_workbook_path(path)?;
    records_or_no_data(&sheets)
}

/// Extract records from every sheet of an already-loaded workbook.
pub fn records_from_sheets(sheets: &[RawSheet]) -> Vec<PageRecord> {
    sheets.iter().flat_map(sheet_records).collect()
}

/// Extract records from one sheet.
///
/// A sheet without rows is skipped entirely. Every record is attached to
/// the period derived from the sheet name; an unparseable period keeps the
/// records with the sentinel order 0.
pub fn sheet_records(sheet: &RawSheet) -> Vec<PageRecord> {
    if sheet.rows.is_empty() {
        debug!("Sheet {}: empty, skipped", sheet.name);
        return Vec::new();
    }

    let period = parse_sheet_period(&sheet.name);
    let header_idx = detect_header_row(&sheet.rows);
    let columns = ColumnMap::classify(&sheet.rows[header_idx]);

    let records: Vec<PageRecord> = sheet.rows[header_idx + 1..]
        .iter()
        .filter_map(|row| map_row(row, &columns, &period))
        .collect();

    debug!(
        "Sheet {}: header at row {}, {} records",
        sheet.name,
        header_idx,
        records.len()
    );

    records
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn records_or_no_data(sheets: &[RawSheet]) -> Result<Vec<PageRecord>> {
    let records = records_from_sheets(sheets);
    if records.is_empty() {
        return Err(ReportError::NoValidData);
    }
    Ok(records)
}

/// The cell backing a role: the classified column when it holds a value,
/// otherwise the positional fallback column when that one does.
fn resolved<'a>(
    row: &'a [CellValue],
    idx: Option<usize>,
    fallback_col: usize,
) -> Option<&'a CellValue> {
    idx.and_then(|i| row.get(i))
        .filter(|cell| !cell.is_empty())
        .or_else(|| row.get(fallback_col).filter(|cell| !cell.is_empty()))
}

fn text_or(row: &[CellValue], idx: Option<usize>, fallback_col: usize, default: &str) -> String {
    resolved(row, idx, fallback_col)
        .map(|cell| cell.text())
        .unwrap_or_else(|| default.to_string())
}

fn number_at(row: &[CellValue], idx: Option<usize>, fallback_col: usize) -> f64 {
    resolved(row, idx, fallback_col)
        .map(NumberNormalizer::parse)
        .unwrap_or(0.0)
}

fn column_sum(row: &[CellValue], columns: &[usize]) -> f64 {
    columns
        .iter()
        .map(|&i| row.get(i).map(NumberNormalizer::parse).unwrap_or(0.0))
        .sum()
}

/// Map one data row to at most one record.
///
/// Rows are dropped when the page name is unresolvable or marks a
/// summary/subtotal line (`total`, `总计`, `合计`).
fn map_row(row: &[CellValue], columns: &ColumnMap, period: &ReportPeriod) -> Option<PageRecord> {
    if row.is_empty() {
        return None;
    }

    let page_name = resolved(row, columns.page_name, fallback::PAGE_NAME)
        .map(|cell| cell.text().trim().to_string())
        .unwrap_or_else(|| UNSET_PAGE_NAME.to_string());

    if page_name == UNSET_PAGE_NAME {
        return None;
    }
    if page_name.to_lowercase().contains("total")
        || SUMMARY_MARKERS.iter().any(|m| page_name.contains(m))
    {
        return None;
    }

    let video_views = if columns.view_columns.is_empty() {
        column_sum(row, &fallback::VIEW_COLUMNS)
    } else {
        column_sum(row, &columns.view_columns)
    };

    let owner = text_or(row, columns.owner, fallback::OWNER, "Unknown");
    let owner = if owner.trim().is_empty() {
        "Unknown".to_string()
    } else {
        owner
    };

    Some(PageRecord {
        platform: normalize_platform(&text_or(row, columns.platform, fallback::PLATFORM, "")),
        category: text_or(row, columns.category, fallback::CATEGORY, "Uncategorized"),
        page_name,
        followers: number_at(row, columns.followers, fallback::FOLLOWERS),
        follower_growth: number_at(row, columns.follower_growth, fallback::FOLLOWER_GROWTH),
        follower_growth_pct: number_at(
            row,
            columns.follower_growth_pct,
            fallback::FOLLOWER_GROWTH_PCT,
        ),
        reach: number_at(row, columns.reach, fallback::REACH),
        reach_growth: number_at(row, columns.reach_growth, fallback::REACH_GROWTH),
        reach_growth_pct: number_at(row, columns.reach_growth_pct, fallback::REACH_GROWTH_PCT),
        video_views,
        url: text_or(row, columns.url, fallback::URL, "#"),
        owner,
        period: period.label.clone(),
        period_order: period.order,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn cells(values: &[&str]) -> Vec<CellValue> {
        values
            .iter()
            .map(|s| {
                if s.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text((*s).to_string())
                }
            })
            .collect()
    }

    fn make_sheet(name: &str, rows: &[&[&str]]) -> RawSheet {
        RawSheet {
            name: name.to_string(),
            rows: rows.iter().map(|r| cells(r)).collect(),
        }
    }

    fn standard_sheet(name: &str, data_rows: &[&[&str]]) -> RawSheet {
        let mut rows: Vec<&[&str]> = vec![&[
            "Platform",
            "Category",
            "Page Name",
            "Followers",
            "Follower Growth",
            "Growth %",
            "Reach",
            "Reach Growth",
            "Reach Growth %",
            "Video Views",
            "Live Views",
            "Link",
            "Owner",
        ]];
        rows.extend_from_slice(data_rows);
        make_sheet(name, &rows)
    }

    // ── sheet_records ─────────────────────────────────────────────────────────

    #[test]
    fn test_sheet_records_basic_row() {
        let sheet = standard_sheet(
            "Oct 2023",
            &[&[
                "FB",
                "News",
                "Page A",
                "1,200",
                "+50",
                "4.3%",
                "10,000",
                "500",
                "5%",
                "2,000",
                "300",
                "https://fb.example/a",
                "Alice",
            ]],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.platform, "Facebook");
        assert_eq!(record.category, "News");
        assert_eq!(record.page_name, "Page A");
        assert_eq!(record.followers, 1_200.0);
        assert_eq!(record.follower_growth, 50.0);
        assert!((record.follower_growth_pct - 0.043).abs() < 1e-9);
        assert_eq!(record.reach, 10_000.0);
        assert_eq!(record.reach_growth, 500.0);
        assert_eq!(record.reach_growth_pct, 0.05);
        assert_eq!(record.video_views, 2_300.0);
        assert_eq!(record.url, "https://fb.example/a");
        assert_eq!(record.owner, "Alice");
        assert_eq!(record.period, "Oct 2023");
        assert_eq!(record.period_order, 202_310);
    }

    #[test]
    fn test_sheet_records_empty_sheet_yields_nothing() {
        let sheet = make_sheet("Oct 2023", &[]);
        assert!(sheet_records(&sheet).is_empty());
    }

    #[test]
    fn test_sheet_records_header_only_yields_nothing() {
        let sheet = standard_sheet("Oct 2023", &[]);
        assert!(sheet_records(&sheet).is_empty());
    }

    #[test]
    fn test_sheet_records_drops_summary_rows() {
        let sheet = standard_sheet(
            "Oct 2023",
            &[
                &["FB", "News", "Page A", "100", "1", "", "10", "1", "", "", "", "", "Alice"],
                &["", "", "Total", "999", "", "", "", "", "", "", "", "", ""],
                &["", "", "总计", "999", "", "", "", "", "", "", "", "", ""],
                &["", "", "合计行", "999", "", "", "", "", "", "", "", "", ""],
            ],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].page_name, "Page A");
    }

    #[test]
    fn test_sheet_records_drops_rows_without_page_name() {
        let sheet = standard_sheet(
            "Oct 2023",
            &[
                &["FB", "News", "", "100", "", "", "", "", "", "", "", "", ""],
                &["FB", "News", "Page B", "100", "", "", "", "", "", "", "", "", ""],
            ],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].page_name, "Page B");
    }

    #[test]
    fn test_sheet_records_retained_names_never_contain_summary_markers() {
        let sheet = standard_sheet(
            "Oct 2023",
            &[
                &["FB", "", "Grand Total", "1", "", "", "", "", "", "", "", "", ""],
                &["FB", "", "Page ok", "1", "", "", "", "", "", "", "", "", ""],
                &["IG", "", "月度合计", "1", "", "", "", "", "", "", "", "", ""],
            ],
        );
        for record in sheet_records(&sheet) {
            let lowered = record.page_name.to_lowercase();
            assert!(!lowered.contains("total"));
            assert!(!record.page_name.contains("总计"));
            assert!(!record.page_name.contains("合计"));
            assert_ne!(record.page_name, "Unknown Page");
        }
    }

    #[test]
    fn test_sheet_records_owner_defaults_to_unknown() {
        let sheet = standard_sheet(
            "Oct 2023",
            &[&["FB", "News", "Page A", "100", "", "", "", "", "", "", "", "", ""]],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records[0].owner, "Unknown");
    }

    #[test]
    fn test_sheet_records_url_defaults_to_hash() {
        let sheet = make_sheet(
            "Oct 2023",
            &[
                &["Platform", "Page Name", "Followers", "Owner"],
                &["FB", "Page A", "100", "Alice"],
            ],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records[0].url, "#");
    }

    #[test]
    fn test_sheet_records_views_summed_from_classified_columns() {
        let sheet = make_sheet(
            "Oct 2023",
            &[
                &["Platform", "Page Name", "Video Views", "Live Views", "Views Growth"],
                &["FB", "Page A", "1,000", "200", "9,999"],
            ],
        );
        let records = sheet_records(&sheet);
        // "Views Growth" is excluded from the views set.
        assert_eq!(records[0].video_views, 1_200.0);
    }

    #[test]
    fn test_sheet_records_views_positional_fallback() {
        // No view-like headers at all: columns 10..=12 are summed.
        let sheet = make_sheet(
            "Oct 2023",
            &[
                &["Platform", "Page Name", "Followers", "Owner"],
                &["FB", "Page A", "100", "", "", "", "", "", "", "", "5", "6", "7"],
            ],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records[0].video_views, 18.0);
    }

    #[test]
    fn test_sheet_records_positional_fallback_layout() {
        // Neither row carries a recognizable keyword: the header falls back
        // to row 0 and classification degrades to the positional layout.
        let sheet = make_sheet(
            "10月",
            &[
                &["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9", "c10", "c11", "c12", "c13"],
                &[
                    "ig",
                    "Beauty",
                    "Acct X",
                    "5,000",
                    "120",
                    "2.4%",
                    "80,000",
                    "4,000",
                    "5%",
                    "x",
                    "100",
                    "200",
                    "300",
                    "Bob",
                ],
            ],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.platform, "Instagram");
        assert_eq!(record.category, "Beauty");
        assert_eq!(record.page_name, "Acct X");
        assert_eq!(record.followers, 5_000.0);
        assert_eq!(record.follower_growth, 120.0);
        assert_eq!(record.reach, 80_000.0);
        assert_eq!(record.video_views, 600.0);
        assert_eq!(record.url, "300");
        assert_eq!(record.owner, "Bob");
    }

    #[test]
    fn test_sheet_records_empty_classified_cell_falls_back_to_position() {
        // The classified owner column is blank; the row falls back to the
        // positional owner column (13).
        let sheet = make_sheet(
            "Oct 2023",
            &[
                &["Platform", "Page Name", "Owner", "", "", "", "", "", "", "", "", "", "", ""],
                &["FB", "Page A", "", "", "", "", "", "", "", "", "", "", "", "Carol"],
            ],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records[0].owner, "Carol");
    }

    #[test]
    fn test_sheet_records_unparseable_period_keeps_records() {
        let sheet = standard_sheet(
            "Overview",
            &[&["FB", "News", "Page A", "100", "", "", "", "", "", "", "", "", "Alice"]],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period_order, 0);
        assert_eq!(records[0].period, "Overview");
    }

    #[test]
    fn test_sheet_records_page_name_is_trimmed() {
        let sheet = standard_sheet(
            "Oct 2023",
            &[&["FB", "News", "  Page A  ", "100", "", "", "", "", "", "", "", "", ""]],
        );
        let records = sheet_records(&sheet);
        assert_eq!(records[0].page_name, "Page A");
    }

    // ── records_from_sheets ───────────────────────────────────────────────────

    #[test]
    fn test_records_from_sheets_concatenates_periods() {
        let september = standard_sheet(
            "Sep 2023",
            &[&["FB", "", "Page A", "100", "10", "", "", "", "", "", "", "", ""]],
        );
        let october = standard_sheet(
            "Oct 2023",
            &[&["FB", "", "Page A", "150", "20", "", "", "", "", "", "", "", ""]],
        );
        let records = records_from_sheets(&[september, october]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period_order, 202_309);
        assert_eq!(records[1].period_order, 202_310);
    }

    #[test]
    fn test_records_or_no_data_empty_is_distinct_error() {
        let sheets = vec![make_sheet("Overview", &[&["nothing", "here"]])];
        let err = records_or_no_data(&sheets).unwrap_err();
        assert!(matches!(err, ReportError::NoValidData));
    }
}
