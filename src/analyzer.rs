use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::models::{
    ratio, AnalysisReport, CommunityAnalysis, CommunityMetrics, ProcessedRecord, RawRecord,
    StageBreakdown, StageMetrics,
};
use crate::rules;

/// Monthly trend bucket for rows whose tracking date could not be parsed.
pub const UNKNOWN_MONTH: &str = "unknown";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct VideoEngagementAnalyzer<C = SystemClock> {
    raw: Vec<RawRecord>,
    records: Vec<ProcessedRecord>,
    clock: C,
}

impl VideoEngagementAnalyzer<SystemClock> {
    pub fn new(raw: Vec<RawRecord>) -> Self {
        Self::with_clock(raw, SystemClock)
    }
}

impl<C: Clock> VideoEngagementAnalyzer<C> {
    pub fn with_clock(raw: Vec<RawRecord>, clock: C) -> Self {
        let records = raw.iter().map(process_record).collect();
        Self {
            raw,
            records,
            clock,
        }
    }

    pub fn raw_records(&self) -> &[RawRecord] {
        &self.raw
    }

    pub fn records(&self) -> &[ProcessedRecord] {
        &self.records
    }

    /// Distinct community names in first-seen order.
    pub fn communities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for record in &self.records {
            if !names.contains(&record.community.as_str()) {
                names.push(&record.community);
            }
        }
        names
    }

    pub fn community_records(&self, community: &str) -> Vec<&ProcessedRecord> {
        self.records
            .iter()
            .filter(|record| record.community == community)
            .collect()
    }

    pub fn calculate_community_metrics(&self, rows: &[&ProcessedRecord]) -> CommunityMetrics {
        let mut metrics = CommunityMetrics::default();

        for row in rows {
            metrics.total_invites += row.invites;
            metrics.total_clicks += row.clicks;
            metrics.total_plays += row.plays;
            metrics.total_play_time_minutes += row.play_time_minutes;
            metrics.record_count += 1;
        }

        metrics.click_rate = ratio(metrics.total_clicks, metrics.total_invites) * 100.0;
        metrics.play_rate = ratio(metrics.total_plays, metrics.total_clicks) * 100.0;
        metrics.avg_play_time = ratio(metrics.total_play_time_minutes, metrics.total_plays);
        metrics.stage_breakdown = self.calculate_stage_breakdown(rows);
        metrics
    }

    pub fn calculate_stage_breakdown(&self, rows: &[&ProcessedRecord]) -> StageBreakdown {
        let mut breakdown = StageBreakdown::new();
        for row in rows {
            breakdown.entry(&row.automation_stage).record(row);
        }
        breakdown
    }

    pub fn calculate_monthly_trends(&self) -> BTreeMap<String, StageMetrics> {
        let mut trends: BTreeMap<String, StageMetrics> = BTreeMap::new();
        for record in &self.records {
            trends
                .entry(month_key(record.tracking_date))
                .or_default()
                .record(record);
        }
        trends
    }

    pub fn analyze(&self) -> AnalysisReport {
        let mut communities = BTreeMap::new();
        let mut strategies = BTreeMap::new();

        for community in self.communities() {
            let rows = self.community_records(community);
            let metrics = self.calculate_community_metrics(&rows);
            let insights = rules::generate_insights(&metrics);
            debug!(
                community,
                rows = rows.len(),
                click_rate = metrics.click_rate,
                "analyzed community"
            );

            strategies.insert(community.to_string(), rules::generate_strategies(&metrics));
            communities.insert(community.to_string(), CommunityAnalysis { metrics, insights });
        }

        let monthly_trends = self.calculate_monthly_trends();
        info!(
            communities = communities.len(),
            months = monthly_trends.len(),
            "analysis complete"
        );

        AnalysisReport {
            communities,
            strategies,
            monthly_trends,
            analysis_date: self.clock.today(),
        }
    }
}

fn process_record(raw: &RawRecord) -> ProcessedRecord {
    let tracking_date = parse_tracking_date(&raw.tracking_date);
    if tracking_date.is_none() {
        warn!(
            date = %raw.tracking_date,
            community = %raw.community,
            "unparsable tracking date"
        );
    }

    ProcessedRecord {
        tracking_date,
        invites: raw.invites.as_count(),
        clicks: raw.clicks.as_count(),
        plays: raw.plays.as_count(),
        play_time_minutes: raw.play_time_minutes.as_count(),
        automation_stage: raw.automation_stage.clone(),
        community: raw.community.clone(),
    }
}

pub fn parse_tracking_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

pub fn month_key(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%Y-%m").to_string(),
        None => UNKNOWN_MONTH.to_string(),
    }
}
