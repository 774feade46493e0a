//! Header-row detection and column-role classification.
//!
//! Report exports arrive with inconsistent layouts and bilingual headers;
//! the column meanings are recovered by keyword-fragment search over a
//! detected header row. The keyword tables and the resolution order are
//! load-bearing: changing either changes which column wins on ambiguous
//! sheets.

use pulse_core::models::CellValue;

// ── Keyword tables ────────────────────────────────────────────────────────────

pub const PLATFORM_KEYWORDS: &[&str] = &["platform", "平台", "渠道", "channel"];
pub const CATEGORY_KEYWORDS: &[&str] = &["category", "分类", "垂类", "type"];
pub const PAGE_NAME_KEYWORDS: &[&str] = &[
    "page name",
    "page",
    "account",
    "账号名称",
    "名称",
    "name",
    "account name",
];
pub const FOLLOWERS_KEYWORDS: &[&str] = &[
    "followers",
    "fans",
    "total followers",
    "粉丝数",
    "粉丝量",
    "关注",
];
pub const FOLLOWER_GROWTH_KEYWORDS: &[&str] = &[
    "follower growth",
    "growth",
    "net growth",
    "涨粉数",
    "净增",
    "增量",
];
pub const REACH_KEYWORDS: &[&str] = &[
    "reach",
    "total reach",
    "coverage",
    "阅读量",
    "覆盖",
    "曝光",
    "impressions",
];
pub const REACH_GROWTH_KEYWORDS: &[&str] = &["reach growth", "覆盖增长", "阅读增长"];
pub const VIEWS_KEYWORDS: &[&str] = &["view", "play", "播放量", "视频播放", "vv"];
pub const URL_KEYWORDS: &[&str] = &["link", "url", "链接", "主页"];
pub const OWNER_KEYWORDS: &[&str] = &["owner", "pic", "负责人", "运营", "contact", "leader"];

/// Fragments marking a rate / percentage column.
pub const PERCENT_MARKERS: &[&str] = &["%", "rate", "率", "比"];

/// Fragments excluding a column from the views set.
const VIEW_EXCLUDE_MARKERS: &[&str] = &["growth", "增", "rate", "比"];

/// Rows beyond this index are never considered header candidates.
const HEADER_SCAN_LIMIT: usize = 10;

// ── Column search ─────────────────────────────────────────────────────────────

/// Lowercased header text, `None` for blank cells.
fn header_text(cell: &CellValue) -> Option<String> {
    let text = cell.text();
    if text.is_empty() {
        None
    } else {
        Some(text.to_lowercase())
    }
}

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn is_percent_header(text: &str) -> bool {
    matches_any(text, PERCENT_MARKERS)
}

/// Position of the first column whose header contains any keyword fragment.
pub fn find_column(row: &[CellValue], keywords: &[&str]) -> Option<usize> {
    row.iter().position(|cell| {
        header_text(cell)
            .map(|text| matches_any(&text, keywords))
            .unwrap_or(false)
    })
}

/// Position of the first value-bearing column: matches a base keyword and
/// none of the percentage markers (so `"Growth"` wins over `"Growth %"`).
pub fn find_value_column(row: &[CellValue], keywords: &[&str]) -> Option<usize> {
    row.iter().position(|cell| {
        header_text(cell)
            .map(|text| matches_any(&text, keywords) && !is_percent_header(&text))
            .unwrap_or(false)
    })
}

/// Position of the first percentage column: matches a base keyword AND a
/// percentage marker.
pub fn find_percent_column(row: &[CellValue], keywords: &[&str]) -> Option<usize> {
    row.iter().position(|cell| {
        header_text(cell)
            .map(|text| matches_any(&text, keywords) && is_percent_header(&text))
            .unwrap_or(false)
    })
}

// ── Header-row detection ──────────────────────────────────────────────────────

/// Index of the row most likely to be the header.
///
/// Each of the first [`HEADER_SCAN_LIMIT`] rows is scored by how many of
/// the four required roles (platform, page name, followers, owner) have a
/// keyword match; the highest score wins and ties keep the earliest row.
/// When nothing scores, row 0 is the fallback and classification degrades
/// to the positional defaults.
pub fn detect_header_row(rows: &[Vec<CellValue>]) -> usize {
    let mut best_row = 0;
    let mut best_matches = 0;

    for (i, row) in rows.iter().take(HEADER_SCAN_LIMIT).enumerate() {
        let matches = [
            PLATFORM_KEYWORDS,
            PAGE_NAME_KEYWORDS,
            FOLLOWERS_KEYWORDS,
            OWNER_KEYWORDS,
        ]
        .iter()
        .filter(|keywords| find_column(row, keywords).is_some())
        .count();

        if matches > best_matches {
            best_matches = matches;
            best_row = i;
        }
    }

    best_row
}

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Resolved column positions for one sheet's header row.
///
/// Built once per sheet, never mutated. `None` means keyword search failed
/// and the extraction step falls back to the fixed positional offset for
/// that role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    pub platform: Option<usize>,
    pub category: Option<usize>,
    pub page_name: Option<usize>,
    pub followers: Option<usize>,
    pub follower_growth: Option<usize>,
    pub follower_growth_pct: Option<usize>,
    pub reach: Option<usize>,
    pub reach_growth: Option<usize>,
    pub reach_growth_pct: Option<usize>,
    pub url: Option<usize>,
    pub owner: Option<usize>,
    /// ALL columns that look like view counts ("Video Views", "Live
    /// Views", ...) and are not growth/rate columns; their values are
    /// summed per row.
    pub view_columns: Vec<usize>,
}

impl ColumnMap {
    /// Classify every role against the detected header row.
    pub fn classify(header: &[CellValue]) -> Self {
        let view_columns = header
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                let text = header_text(cell)?;
                let is_view = matches_any(&text, VIEWS_KEYWORDS);
                let excluded = matches_any(&text, VIEW_EXCLUDE_MARKERS);
                (is_view && !excluded).then_some(i)
            })
            .collect();

        ColumnMap {
            platform: find_column(header, PLATFORM_KEYWORDS),
            category: find_column(header, CATEGORY_KEYWORDS),
            page_name: find_column(header, PAGE_NAME_KEYWORDS),
            followers: find_value_column(header, FOLLOWERS_KEYWORDS),
            follower_growth: find_value_column(header, FOLLOWER_GROWTH_KEYWORDS),
            follower_growth_pct: find_percent_column(header, FOLLOWER_GROWTH_KEYWORDS),
            reach: find_value_column(header, REACH_KEYWORDS),
            reach_growth: find_value_column(header, REACH_GROWTH_KEYWORDS),
            reach_growth_pct: find_percent_column(header, REACH_GROWTH_KEYWORDS),
            url: find_column(header, URL_KEYWORDS),
            owner: find_column(header, OWNER_KEYWORDS),
            view_columns,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
