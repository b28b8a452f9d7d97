use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{AnalysisReport, CommunityAnalysis, StageMetrics, Strategy};

pub fn build_markdown(report: &AnalysisReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Video Engagement Report");
    let _ = writeln!(
        output,
        "Generated {} across {} communities",
        report.analysis_date,
        report.communities.len()
    );

    if report.communities.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No tracking records found.");
    }

    for (name, analysis) in &report.communities {
        let strategies = report
            .strategies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        write_community(&mut output, name, analysis, strategies);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Trends");
    write_trends(&mut output, &report.monthly_trends);

    output
}

pub fn write_community(
    output: &mut String,
    name: &str,
    analysis: &CommunityAnalysis,
    strategies: &[Strategy],
) {
    let metrics = &analysis.metrics;

    let _ = writeln!(output);
    let _ = writeln!(output, "## {name}");
    let _ = writeln!(
        output,
        "- Invites: {:.0}, clicks: {:.0}, plays: {:.0}, play time: {:.1} min",
        metrics.total_invites,
        metrics.total_clicks,
        metrics.total_plays,
        metrics.total_play_time_minutes
    );
    let _ = writeln!(
        output,
        "- Click rate {:.1}%, play rate {:.1}%, avg play time {:.1} min",
        metrics.click_rate, metrics.play_rate, metrics.avg_play_time
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "### Stage Breakdown");
    for (stage, stage_metrics) in metrics.stage_breakdown.iter() {
        let _ = writeln!(output, "- {}", stage_line(stage, stage_metrics));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Insights");
    for insight in &analysis.insights {
        let _ = writeln!(output, "- {insight}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Strategies");
    if strategies.is_empty() {
        let _ = writeln!(output, "No follow-up needed.");
    }
    for strategy in strategies {
        let _ = writeln!(output, "- **{}**", strategy.focus);
        for action in &strategy.actions {
            let _ = writeln!(output, "  - {action}");
        }
    }
}

pub fn write_trends(output: &mut String, trends: &BTreeMap<String, StageMetrics>) {
    if trends.is_empty() {
        let _ = writeln!(output, "No tracking records found.");
        return;
    }

    for (month, metrics) in trends {
        let _ = writeln!(output, "- {}", stage_line(month, metrics));
    }
}

fn stage_line(label: &str, metrics: &StageMetrics) -> String {
    format!(
        "{}: {} records, {:.0} invites, {:.0} clicks, {:.0} plays (avg {:.1} min)",
        label,
        metrics.record_count,
        metrics.invites,
        metrics.clicks,
        metrics.plays,
        metrics.avg_play_time
    )
}

pub fn build_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::VideoEngagementAnalyzer;
    use crate::clock::FixedClock;
    use crate::ingest;
    use chrono::NaiveDate;

    const CSV: &str = "Tracking Date Formatted,Invites,Clicks,Plays,Play Time (Min),Automation Stage,Community\n\
                       2024-01-15,100,60,40,200,Welcome,Alumni\n\
                       2024-02-03,50,10,2,3,Reminder,Alumni\n\
                       2024-02-10,80,20,18,30,Welcome,Donors\n";

    fn sample_report() -> AnalysisReport {
        let records = ingest::parse_str(CSV).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        VideoEngagementAnalyzer::with_clock(records, FixedClock(today)).analyze()
    }

    #[test]
    fn markdown_lists_every_section() {
        let markdown = build_markdown(&sample_report());

        assert!(markdown.starts_with("# Video Engagement Report\nGenerated 2024-03-01 across 2 communities"));
        assert!(markdown.contains("## Alumni"));
        assert!(markdown.contains("## Donors"));
        assert!(markdown.contains("- Welcome: 1 records, 100 invites, 60 clicks, 40 plays (avg 5.0 min)"));
        assert!(markdown.contains("- Strongest performance in Welcome stage"));
        assert!(markdown.contains("- **Extend Watch Time**"));
        assert!(markdown.contains("- 2024-02: 2 records, 130 invites, 30 clicks, 20 plays"));
    }

    #[test]
    fn empty_report_says_so() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = VideoEngagementAnalyzer::with_clock(Vec::new(), FixedClock(today)).analyze();
        let markdown = build_markdown(&report);

        assert_eq!(markdown.matches("No tracking records found.").count(), 2);
    }

    #[test]
    fn undated_rows_still_show_in_trends() {
        let csv = "Tracking Date Formatted,Invites,Clicks,Plays,Play Time (Min),Automation Stage,Community\n\
                   not a date,10,5,2,4,Welcome,Alumni\n";
        let records = ingest::parse_str(csv).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = VideoEngagementAnalyzer::with_clock(records, FixedClock(today)).analyze();

        let mut output = String::new();
        write_trends(&mut output, &report.monthly_trends);
        assert_eq!(output, "- unknown: 1 records, 10 invites, 5 clicks, 2 plays (avg 2.0 min)\n");
    }

    #[test]
    fn json_uses_camel_case_and_iso_date() {
        let report = sample_report();
        let json = build_json(&report).unwrap();

        assert!(json.contains("\"analysisDate\": \"2024-03-01\""));
        assert!(json.contains("\"totalPlayTimeMinutes\""));
        assert!(json.contains("\"monthlyTrends\""));

        let restored: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.analysis_date, report.analysis_date);
        assert_eq!(restored.strategies, report.strategies);
        let stages: Vec<&str> = restored.communities["Alumni"]
            .metrics
            .stage_breakdown
            .iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(stages, vec!["Welcome", "Reminder"]);
    }
}
