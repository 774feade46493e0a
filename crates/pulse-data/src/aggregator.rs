//! Aggregation over the normalized record set.
//!
//! A pure function of (records, filter): recomputed in full on every call,
//! no incremental state. Snapshot metrics (followers) are deduplicated to
//! the latest period per page before summing; flow metrics (reach, growth)
//! sum across every filtered record. The combination rule comes entirely
//! from each metric's [`MetricKind`] tag.

use std::collections::{BTreeSet, HashMap};

use pulse_core::models::{
    FilterSpec, MetricDef, MetricKind, PageRecord, ReportPeriod, FOLLOWERS, FOLLOWER_GROWTH,
    REACH,
};
use serde::{Deserialize, Serialize};

// ── Result types ──────────────────────────────────────────────────────────────

/// Per-platform slice of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub platform: String,
    /// Latest-period follower snapshots summed over this platform's pages.
    pub followers: f64,
    /// Reach summed over all of this platform's filtered records.
    pub reach: f64,
    /// Follower growth summed over all of this platform's filtered records.
    pub growth: f64,
}

/// Summary statistics for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Sum of each distinct page's latest-period follower snapshot. Never a
    /// naive sum across periods, which would double count pages observed in
    /// several periods.
    pub total_followers: f64,
    /// Reach summed across ALL filtered records.
    pub total_reach: f64,
    /// Follower growth summed across ALL filtered records.
    pub total_growth: f64,
    /// One entry per platform present in the filtered set, in order of
    /// first appearance.
    pub platform_breakdown: Vec<PlatformStats>,
    /// The latest-period record of each distinct page, ordered by that
    /// record's `follower_growth` descending.
    ///
    /// Deliberately NOT the range-summed growth that `total_growth` uses:
    /// the leaderboard ranks pages by their latest single period.
    pub ranked_pages: Vec<PageRecord>,
}

// ── Dropdown data ─────────────────────────────────────────────────────────────

/// Distinct platform labels, sorted, blanks excluded.
pub fn platform_options(records: &[PageRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records
        .iter()
        .map(|r| r.platform.as_str())
        .filter(|p| !p.is_empty())
        .collect();
    set.into_iter().map(String::from).collect()
}

/// Distinct owner labels, sorted, blanks excluded.
pub fn owner_options(records: &[PageRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records
        .iter()
        .map(|r| r.owner.as_str())
        .filter(|o| !o.is_empty())
        .collect();
    set.into_iter().map(String::from).collect()
}

/// Distinct periods, sorted ascending by order.
///
/// Deduplication keys on the display label (the first order seen for a
/// label wins), while range filtering keys on order. Two sheets that wrote
/// the same month differently therefore appear as two options with equal
/// order. A known limitation of label-keyed dedup, kept as-is.
pub fn period_options(records: &[PageRecord]) -> Vec<ReportPeriod> {
    let mut periods: Vec<ReportPeriod> = Vec::new();
    for record in records {
        if !periods.iter().any(|p| p.label == record.period) {
            periods.push(ReportPeriod {
                label: record.period.clone(),
                order: record.period_order,
            });
        }
    }
    periods.sort_by_key(|p| p.order);
    periods
}

// ── Filtering ─────────────────────────────────────────────────────────────────

/// Records passing the filter selection.
///
/// Platform and owner must equal the selection unless `"All"`. Period
/// bounds are sheet labels resolved against [`period_options`]; an
/// unresolvable label leaves that side of the range open. When both bounds
/// are set and start sorts after end, every record is excluded; the range
/// is never silently swapped.
pub fn filter_records<'a>(records: &'a [PageRecord], filter: &FilterSpec) -> Vec<&'a PageRecord> {
    let periods = period_options(records);

    let start_set = !FilterSpec::is_all(&filter.period_start);
    let end_set = !FilterSpec::is_all(&filter.period_end);
    let start_order = periods
        .iter()
        .find(|p| p.label == filter.period_start)
        .map(|p| p.order)
        .unwrap_or(i64::MIN);
    let end_order = periods
        .iter()
        .find(|p| p.label == filter.period_end)
        .map(|p| p.order)
        .unwrap_or(i64::MAX);

    if start_set && end_set && start_order > end_order {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| {
            let platform_ok =
                FilterSpec::is_all(&filter.platform) || r.platform == filter.platform;
            let owner_ok = FilterSpec::is_all(&filter.owner) || r.owner == filter.owner;
            let period_ok = (!start_set || r.period_order >= start_order)
                && (!end_set || r.period_order <= end_order);
            platform_ok && owner_ok && period_ok
        })
        .collect()
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Aggregate the filtered record set.
///
/// Returns `None` when nothing passes the filter: "no data for the
/// current selection", not an error. Calling this twice with the same
/// inputs yields identical results; there is no hidden state.
pub fn aggregate(records: &[PageRecord], filter: &FilterSpec) -> Option<AggregationResult> {
    let filtered = filter_records(records, filter);
    if filtered.is_empty() {
        return None;
    }

    let latest = latest_snapshots(&filtered);

    let total_followers = metric_total(&FOLLOWERS, &filtered, &latest);
    let total_reach = metric_total(&REACH, &filtered, &latest);
    let total_growth = metric_total(&FOLLOWER_GROWTH, &filtered, &latest);

    // Platforms in first-appearance order within the filtered set.
    let mut platforms: Vec<&str> = Vec::new();
    for record in &filtered {
        if !platforms.contains(&record.platform.as_str()) {
            platforms.push(&record.platform);
        }
    }

    let platform_breakdown = platforms
        .into_iter()
        .map(|platform| {
            let platform_filtered: Vec<&PageRecord> = filtered
                .iter()
                .copied()
                .filter(|r| r.platform == platform)
                .collect();
            let platform_latest: Vec<&PageRecord> = latest
                .iter()
                .copied()
                .filter(|r| r.platform == platform)
                .collect();
            PlatformStats {
                platform: platform.to_string(),
                followers: metric_total(&FOLLOWERS, &platform_filtered, &platform_latest),
                reach: metric_total(&REACH, &platform_filtered, &platform_latest),
                growth: metric_total(&FOLLOWER_GROWTH, &platform_filtered, &platform_latest),
            }
        })
        .collect();

    let mut ranked_pages: Vec<PageRecord> = latest.iter().map(|r| (*r).clone()).collect();
    ranked_pages.sort_by(|a, b| b.follower_growth.total_cmp(&a.follower_growth));

    Some(AggregationResult {
        total_followers,
        total_reach,
        total_growth,
        platform_breakdown,
        ranked_pages,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Combine one metric over the filtered set according to its kind tag.
fn metric_total(metric: &MetricDef, filtered: &[&PageRecord], latest: &[&PageRecord]) -> f64 {
    let pool = match metric.kind {
        MetricKind::Snapshot => latest,
        MetricKind::Flow => filtered,
    };
    pool.iter().map(|record| (metric.value)(record)).sum()
}

/// One record per `(platform, page_name)` key: the one with the maximum
/// period order among the filtered records. Ties keep whichever record was
/// encountered first; output preserves first-encounter key order.
fn latest_snapshots<'a>(filtered: &[&'a PageRecord]) -> Vec<&'a PageRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<&'a PageRecord> = Vec::new();

    for &record in filtered {
        match index.get(&record.page_key()) {
            Some(&slot) => {
                if record.period_order > latest[slot].period_order {
                    latest[slot] = record;
                }
            }
            None => {
                index.insert(record.page_key(), latest.len());
                latest.push(record);
            }
        }
    }

    latest
}

// ── Tests ─────────────────────────────────────────────────────────────────────
