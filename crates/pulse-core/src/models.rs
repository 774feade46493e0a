use serde::{Deserialize, Serialize};

/// The filter wildcard accepted for every [`FilterSpec`] field.
pub const ALL: &str = "All";

/// An untyped spreadsheet cell, as handed over by the workbook reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// `true` for cells the spreadsheet left blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render the cell as display text. Blank cells render as `""`,
    /// numbers without a trailing `.0`.
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// One page's metrics for one reporting period, produced by the ingestion
/// engine from a single spreadsheet row.
///
/// The identity key `(platform, page_name)` is NOT unique across the whole
/// dataset: a page recurs once per period it appears in. `period_order` is
/// comparable across all records regardless of source sheet; 0 is the
/// sentinel for sheet names no period could be derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical platform label (see [`normalize_platform`]).
    pub platform: String,
    /// Content category / vertical, `"Uncategorized"` when absent.
    pub category: String,
    /// Display name of the page or account.
    pub page_name: String,
    /// Point-in-time follower count (snapshot metric).
    pub followers: f64,
    /// Net follower change within the period (flow metric).
    pub follower_growth: f64,
    /// Follower growth as a fraction (0.05 = 5%).
    pub follower_growth_pct: f64,
    /// Reach / impressions within the period (flow metric).
    pub reach: f64,
    /// Reach change within the period.
    pub reach_growth: f64,
    /// Reach growth as a fraction.
    pub reach_growth_pct: f64,
    /// Video views within the period, summed across all view columns.
    pub video_views: f64,
    /// Page URL, `"#"` when absent.
    pub url: String,
    /// Responsible person, `"Unknown"` when absent.
    pub owner: String,
    /// Display label of the reporting period (the trimmed sheet name).
    pub period: String,
    /// Monotonic period encoding (`year * 100 + month`), 0 when unknown.
    pub period_order: i64,
}

impl PageRecord {
    /// Identity key used to deduplicate a page across periods.
    pub fn page_key(&self) -> String {
        format!("{}-{}", self.platform, self.page_name)
    }
}

/// A distinct reporting period as offered to range filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// Display label, the trimmed original sheet name.
    pub label: String,
    /// Monotonic encoding used for range comparisons, 0 when unknown.
    pub order: i64,
}

/// Filter selection applied by the aggregation engine. Every field accepts
/// the [`ALL`] wildcard; period bounds are sheet labels resolved to their
/// order values at aggregation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub platform: String,
    pub owner: String,
    pub period_start: String,
    pub period_end: String,
}

impl Default for FilterSpec {
    fn default() -> Self {
        FilterSpec {
            platform: ALL.to_string(),
            owner: ALL.to_string(),
            period_start: ALL.to_string(),
            period_end: ALL.to_string(),
        }
    }
}

impl FilterSpec {
    /// `true` when `value` is the wildcard selection.
    pub fn is_all(value: &str) -> bool {
        value == ALL
    }
}

// ── Metric definitions ────────────────────────────────────────────────────────

/// How a metric combines across multiple periods of the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Cumulative state at a point in time (e.g. total followers).
    /// Deduplicated to the latest period per page, never summed.
    Snapshot,
    /// Activity within a period (e.g. growth, reach). Summed across
    /// all selected periods.
    Flow,
}

/// One aggregatable metric: its name, combination rule and accessor.
///
/// The aggregation engine derives its behavior entirely from `kind`; there
/// are no per-metric branches downstream.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub kind: MetricKind,
    pub value: fn(&PageRecord) -> f64,
}

fn followers_value(record: &PageRecord) -> f64 {
    record.followers
}

fn reach_value(record: &PageRecord) -> f64 {
    record.reach
}

fn follower_growth_value(record: &PageRecord) -> f64 {
    record.follower_growth
}

pub const FOLLOWERS: MetricDef = MetricDef {
    name: "followers",
    kind: MetricKind::Snapshot,
    value: followers_value,
};

pub const REACH: MetricDef = MetricDef {
    name: "reach",
    kind: MetricKind::Flow,
    value: reach_value,
};

pub const FOLLOWER_GROWTH: MetricDef = MetricDef {
    name: "follower_growth",
    kind: MetricKind::Flow,
    value: follower_growth_value,
};

// ── Platform normalization ────────────────────────────────────────────────────

/// Normalise a raw platform cell into a canonical display label.
///
/// The input is uppercased and trimmed, then matched against the alias
/// table in rule order. Names outside the table are title-cased as a
/// best-effort label; blank input yields `"Unknown"`.
///
/// # Examples
///
/// ```
/// use pulse_core::models::normalize_platform;
///
/// assert_eq!(normalize_platform("fb"), "Facebook");
/// assert_eq!(normalize_platform("douyin"), "TikTok");
/// assert_eq!(normalize_platform("  xhs "), "Xiaohongshu");
/// assert_eq!(normalize_platform("myspace"), "Myspace");
/// assert_eq!(normalize_platform(""), "Unknown");
/// ```
pub fn normalize_platform(raw: &str) -> String {
    let p = raw.to_uppercase().trim().to_string();
    if p.is_empty() {
        return "Unknown".to_string();
    }

    if p == "FB" || p.contains("FACEBOOK") {
        return "Facebook".to_string();
    }
    if p == "IG" || p.contains("INSTAGRAM") {
        return "Instagram".to_string();
    }
    if p == "TT" || p.contains("TIKTOK") || p.contains("DOUYIN") {
        return "TikTok".to_string();
    }
    if p == "YT" || p.contains("YOUTUBE") {
        return "YouTube".to_string();
    }
    if p == "X" || p.contains("TWITTER") {
        return "X (Twitter)".to_string();
    }
    if p.contains("RED") || p.contains("XIAOHONGSHU") || p == "XHS" {
        return "Xiaohongshu".to_string();
    }

    // Unknown platform – title-case the uppercased input.
    let mut chars = p.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first, chars.as_str().to_lowercase()),
        None => "Unknown".to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
