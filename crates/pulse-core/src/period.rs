use chrono::{Datelike, Local};
use regex::Regex;

use crate::models::ReportPeriod;

/// English month abbreviations probed in calendar order; the first one found
/// as a substring wins.
const MONTH_ABBREVS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Derive a reporting period from a free-text sheet name.
///
/// A 4-digit year token (`20xx`) is searched first, defaulting to the
/// current calendar year when absent. The month comes from a CJK pattern
/// (`10月`) or, failing that, an English month abbreviation. When no month
/// form is found the order is 0, a sentinel that sorts before all real
/// periods.
///
/// The display label is the trimmed original sheet name, never reformatted:
/// two sheets describing the same month with different text produce
/// distinct labels but an identical order. Range filtering groups records
/// by order; only dropdown deduplication keys on the label.
///
/// # Examples
///
/// ```
/// use pulse_core::period::parse_sheet_period_with_year;
///
/// assert_eq!(parse_sheet_period_with_year("Oct 2023", 2025).order, 202310);
/// assert_eq!(parse_sheet_period_with_year("10月", 2025).order, 202510);
/// assert_eq!(parse_sheet_period_with_year("Overview", 2025).order, 0);
/// ```
pub fn parse_sheet_period(sheet_name: &str) -> ReportPeriod {
    parse_sheet_period_with_year(sheet_name, Local::now().year())
}

/// Same as [`parse_sheet_period`] but with an explicit default year,
/// enabling deterministic tests.
pub fn parse_sheet_period_with_year(sheet_name: &str, default_year: i32) -> ReportPeriod {
    let year_re = Regex::new(r"20\d{2}").expect("regex is valid");
    let year = year_re
        .find(sheet_name)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(default_year);

    let cn_month_re = Regex::new(r"(\d{1,2})\s*月").expect("regex is valid");
    let month: u32 = if let Some(caps) = cn_month_re.captures(sheet_name) {
        caps[1].parse().unwrap_or(0)
    } else {
        let lower = sheet_name.to_lowercase();
        MONTH_ABBREVS
            .iter()
            .position(|abbrev| lower.contains(abbrev))
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    };

    let order = if month > 0 {
        i64::from(year) * 100 + i64::from(month)
    } else {
        0
    };

    ReportPeriod {
        label: sheet_name.trim().to_string(),
        order,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── CJK month names ───────────────────────────────────────────────────────

    #[test]
    fn test_cjk_month_with_default_year() {
        let period = parse_sheet_period_with_year("10月", 2024);
        assert_eq!(period.order, 202_410);
        assert_eq!(period.label, "10月");
    }

    #[test]
    fn test_cjk_month_with_year_token() {
        let period = parse_sheet_period_with_year("2023年10月", 2025);
        assert_eq!(period.order, 202_310);
    }

    #[test]
    fn test_cjk_month_with_space() {
        let period = parse_sheet_period_with_year("3 月", 2024);
        assert_eq!(period.order, 202_403);
    }

    #[test]
    fn test_cjk_single_digit_month() {
        let period = parse_sheet_period_with_year("7月报表", 2024);
        assert_eq!(period.order, 202_407);
    }

    // ── English month names ───────────────────────────────────────────────────

    #[test]
    fn test_english_month_with_year() {
        let period = parse_sheet_period_with_year("Oct 2023", 2025);
        assert_eq!(period.order, 202_310);
        assert_eq!(period.label, "Oct 2023");
    }

    #[test]
    fn test_english_month_full_name() {
        let period = parse_sheet_period_with_year("January Report", 2024);
        assert_eq!(period.order, 202_401);
    }

    #[test]
    fn test_english_month_case_insensitive() {
        let period = parse_sheet_period_with_year("SEPT", 2024);
        assert_eq!(period.order, 202_409);
    }

    #[test]
    fn test_english_month_defaults_to_given_year() {
        let period = parse_sheet_period_with_year("Sept", 2026);
        assert_eq!(period.order, 202_609);
    }

    // ── Sentinel cases ────────────────────────────────────────────────────────

    #[test]
    fn test_no_month_token_yields_sentinel_order() {
        let period = parse_sheet_period_with_year("Overview", 2024);
        assert_eq!(period.order, 0);
    }

    #[test]
    fn test_year_without_month_yields_sentinel_order() {
        let period = parse_sheet_period_with_year("2024 totals", 2025);
        assert_eq!(period.order, 0);
    }

    #[test]
    fn test_label_is_trimmed() {
        let period = parse_sheet_period_with_year("  Oct 2023  ", 2024);
        assert_eq!(period.label, "Oct 2023");
        assert_eq!(period.order, 202_310);
    }

    // ── Current-year default ──────────────────────────────────────────────────

    #[test]
    fn test_parse_sheet_period_uses_current_year() {
        let current_year = i64::from(Local::now().year());
        let period = parse_sheet_period("10月");
        assert_eq!(period.order, current_year * 100 + 10);
    }

    #[test]
    fn test_same_period_different_labels_share_order() {
        let a = parse_sheet_period_with_year("Oct 2023", 2024);
        let b = parse_sheet_period_with_year("2023-10 report (october)", 2024);
        assert_eq!(a.order, b.order);
        assert_ne!(a.label, b.label);
    }
}
