//! Prompt construction for the narrative summary.

use pulse_core::formatting::{format_delta, format_number};
use pulse_data::aggregator::AggregationResult;

/// How many leaderboard entries are quoted in the prompt.
const TOP_PAGES: usize = 5;

/// Build the fixed-shape analyst prompt from an aggregation result.
///
/// The prompt quotes the three scalar totals, one line per platform and
/// the top [`TOP_PAGES`] ranked pages, keeping the request small enough
/// for a single generation call.
pub fn build_insights_prompt(result: &AggregationResult) -> String {
    let platform_lines: Vec<String> = result
        .platform_breakdown
        .iter()
        .map(|p| {
            format!(
                "- {}: {} followers, {} reach",
                p.platform,
                format_number(p.followers, 0),
                format_number(p.reach, 0)
            )
        })
        .collect();

    let page_lines: Vec<String> = result
        .ranked_pages
        .iter()
        .take(TOP_PAGES)
        .map(|p| {
            format!(
                "- {} ({}): {} growth",
                p.page_name,
                p.platform,
                format_delta(p.follower_growth)
            )
        })
        .collect();

    format!(
        "Act as a senior social media analyst. Analyze the following summary data for a monthly report.\n\
         \n\
         Total Followers: {}\n\
         Total Reach: {}\n\
         Net Follower Growth: {}\n\
         \n\
         Platform Breakdown:\n\
         {}\n\
         \n\
         Top {} Performing Pages:\n\
         {}\n\
         \n\
         Provide a concise 3-bullet point executive summary highlighting:\n\
         1. Overall health and main growth driver.\n\
         2. Which platform is dominating in Reach vs Followers.\n\
         3. A brief strategic recommendation for the underperforming platform.\n\
         \n\
         Keep it professional, encouraging, and under 150 words.",
        format_number(result.total_followers, 0),
        format_number(result.total_reach, 0),
        format_number(result.total_growth, 0),
        platform_lines.join("\n"),
        TOP_PAGES,
        page_lines.join("\n"),
    )
}

/// Strip the markdown markers the generation service tends to emit.
pub fn clean_response(text: &str) -> String {
    text.replace("**", "").replace("###", "")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::models::PageRecord;
    use pulse_data::aggregator::PlatformStats;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_page(name: &str, platform: &str, growth: f64) -> PageRecord {
        PageRecord {
            platform: platform.to_string(),
            category: "Uncategorized".to_string(),
            page_name: name.to_string(),
            followers: 0.0,
            follower_growth: growth,
            follower_growth_pct: 0.0,
            reach: 0.0,
            reach_growth: 0.0,
            reach_growth_pct: 0.0,
            video_views: 0.0,
            url: "#".to_string(),
            owner: "Unknown".to_string(),
            period: "Oct 2023".to_string(),
            period_order: 202_310,
        }
    }

    fn sample_result() -> AggregationResult {
        AggregationResult {
            total_followers: 12_500.0,
            total_reach: 340_000.0,
            total_growth: 1_250.0,
            platform_breakdown: vec![
                PlatformStats {
                    platform: "Facebook".to_string(),
                    followers: 8_000.0,
                    reach: 200_000.0,
                    growth: 800.0,
                },
                PlatformStats {
                    platform: "Instagram".to_string(),
                    followers: 4_500.0,
                    reach: 140_000.0,
                    growth: 450.0,
                },
            ],
            ranked_pages: vec![
                make_page("Page A", "Facebook", 500.0),
                make_page("Page B", "Instagram", 300.0),
            ],
        }
    }

    // ── build_insights_prompt ─────────────────────────────────────────────────

    #[test]
    fn test_prompt_quotes_scalar_totals() {
        let prompt = build_insights_prompt(&sample_result());
        assert!(prompt.contains("Total Followers: 12,500"));
        assert!(prompt.contains("Total Reach: 340,000"));
        assert!(prompt.contains("Net Follower Growth: 1,250"));
    }

    #[test]
    fn test_prompt_lists_platform_breakdown() {
        let prompt = build_insights_prompt(&sample_result());
        assert!(prompt.contains("- Facebook: 8,000 followers, 200,000 reach"));
        assert!(prompt.contains("- Instagram: 4,500 followers, 140,000 reach"));
    }

    #[test]
    fn test_prompt_lists_ranked_pages_with_signed_growth() {
        let prompt = build_insights_prompt(&sample_result());
        assert!(prompt.contains("- Page A (Facebook): +500 growth"));
        assert!(prompt.contains("- Page B (Instagram): +300 growth"));
    }

    #[test]
    fn test_prompt_truncates_to_top_five_pages() {
        let mut result = sample_result();
        result.ranked_pages = (0..8)
            .map(|i| make_page(&format!("Page {i}"), "Facebook", 100.0 - i as f64))
            .collect();
        let prompt = build_insights_prompt(&result);
        assert!(prompt.contains("Page 4"));
        assert!(!prompt.contains("Page 5"));
        assert!(!prompt.contains("Page 7"));
    }

    #[test]
    fn test_prompt_asks_for_three_bullets() {
        let prompt = build_insights_prompt(&sample_result());
        assert!(prompt.contains("3-bullet point executive summary"));
        assert!(prompt.contains("under 150 words"));
    }

    // ── clean_response ────────────────────────────────────────────────────────

    #[test]
    fn test_clean_response_strips_markdown_markers() {
        let cleaned = clean_response("### Summary\n**Bold** statement");
        assert_eq!(cleaned, " Summary\nBold statement");
    }

    #[test]
    fn test_clean_response_plain_text_unchanged() {
        let text = "Growth is healthy across platforms.";
        assert_eq!(clean_response(text), text);
    }
}
