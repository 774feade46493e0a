mod bootstrap;

use std::path::Path;

use anyhow::Result;
use pulse_core::error::ReportError;
use pulse_core::formatting::{format_delta, format_number};
use pulse_core::models::{FilterSpec, PageRecord};
use pulse_core::settings::Settings;
use pulse_data::aggregator::{aggregate, filter_records, period_options, AggregationResult};
use pulse_data::extract::parse_workbook_path;
use pulse_data::reader::find_workbook_files;
use pulse_insights::InsightsClient;

/// Leaderboard entries shown in the table output.
const TOP_PAGES_SHOWN: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("SocialPulse v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(report) = settings.report.clone() else {
        anyhow::bail!("no report given; pass a .xlsx/.xls workbook or a directory of workbooks");
    };

    let records = load_records(&report)?;
    tracing::info!(
        "Loaded {} records across {} periods",
        records.len(),
        period_options(&records).len()
    );

    let filter = settings.filter_spec();
    let result = aggregate(&records, &filter);

    match settings.output.as_str() {
        "json" => {
            // `null` when nothing matches the filter.
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            render_table(&records, &filter, result.as_ref());

            // The numeric output above is complete before the narrative
            // summary is even requested; a summary failure only ever
            // degrades to fallback text.
            if settings.insights {
                if let Some(result) = result.as_ref() {
                    let client = InsightsClient::from_env();
                    let text = client.generate_insights(result).await;
                    println!();
                    println!("Insights");
                    println!("--------");
                    println!("{}", text);
                }
            }
        }
    }

    Ok(())
}

/// Load records from a single workbook or from every workbook under a
/// directory.
///
/// Directory loads concatenate records across files; a file that parses but
/// yields no usable rows is logged and skipped, while decode failures abort
/// the whole load.
fn load_records(report: &Path) -> std::result::Result<Vec<PageRecord>, ReportError> {
    if report.is_dir() {
        let files = find_workbook_files(report);
        if files.is_empty() {
            return Err(ReportError::NoWorkbookFiles(report.to_path_buf()));
        }

        let mut records = Vec::new();
        for file in &files {
            match parse_workbook_path(file) {
                Ok(batch) => records.extend(batch),
                Err(ReportError::NoValidData) => {
                    tracing::warn!("No usable rows in {}", file.display());
                }
                Err(e) => return Err(e),
            }
        }

        if records.is_empty() {
            return Err(ReportError::NoValidData);
        }
        Ok(records)
    } else if report.exists() {
        parse_workbook_path(report)
    } else {
        Err(ReportError::ReportPathNotFound(report.to_path_buf()))
    }
}

/// Render the aggregate as plain text.
fn render_table(records: &[PageRecord], filter: &FilterSpec, result: Option<&AggregationResult>) {
    let matched = filter_records(records, filter).len();
    println!(
        "{} of {} records match (platform={}, owner={}, from={}, to={})",
        matched,
        records.len(),
        filter.platform,
        filter.owner,
        filter.period_start,
        filter.period_end
    );

    let Some(result) = result else {
        println!("No data for the current filter selection.");
        return;
    };

    println!();
    println!(
        "Total Followers  {:>14}",
        format_number(result.total_followers, 0)
    );
    println!(
        "Total Reach      {:>14}",
        format_number(result.total_reach, 0)
    );
    println!("Net Growth       {:>14}", format_delta(result.total_growth));

    println!();
    println!(
        "{:<16} {:>12} {:>14} {:>10}",
        "Platform", "Followers", "Reach", "Growth"
    );
    for stats in &result.platform_breakdown {
        println!(
            "{:<16} {:>12} {:>14} {:>10}",
            stats.platform,
            format_number(stats.followers, 0),
            format_number(stats.reach, 0),
            format_delta(stats.growth)
        );
    }

    println!();
    println!("Top pages by latest-period growth:");
    for (i, page) in result.ranked_pages.iter().take(TOP_PAGES_SHOWN).enumerate() {
        println!(
            "{:>3}. {} ({}) {}",
            i + 1,
            page.page_name,
            page.platform,
            format_delta(page.follower_growth)
        );
    }
}
