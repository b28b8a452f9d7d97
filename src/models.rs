use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single cell as it came out of the CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Classifies a trimmed cell: numeric only when the whole cell parses as a finite number.
    pub fn from_cell(cell: &str) -> Self {
        match cell.parse::<f64>() {
            Ok(value) if value.is_finite() => FieldValue::Number(value),
            _ => FieldValue::Text(cell.to_string()),
        }
    }

    /// Numeric value with zero substituted for anything unusable.
    pub fn as_count(&self) -> f64 {
        let value = match self {
            FieldValue::Number(value) => *value,
            FieldValue::Text(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        };

        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub tracking_date: String,
    pub invites: FieldValue,
    pub clicks: FieldValue,
    pub plays: FieldValue,
    pub play_time_minutes: FieldValue,
    pub automation_stage: String,
    pub community: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    /// `None` when the source date could not be parsed.
    pub tracking_date: Option<NaiveDate>,
    pub invites: f64,
    pub clicks: f64,
    pub plays: f64,
    pub play_time_minutes: f64,
    pub automation_stage: String,
    pub community: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetrics {
    pub invites: f64,
    pub clicks: f64,
    pub plays: f64,
    pub play_time_minutes: f64,
    pub record_count: usize,
    pub avg_play_time: f64,
}

impl StageMetrics {
    pub fn record(&mut self, record: &ProcessedRecord) {
        self.invites += record.invites;
        self.clicks += record.clicks;
        self.plays += record.plays;
        self.play_time_minutes += record.play_time_minutes;
        self.record_count += 1;
        self.avg_play_time = ratio(self.play_time_minutes, self.plays);
    }
}

/// Per-stage metrics keyed by stage name, kept in first-seen order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageBreakdown {
    entries: Vec<(String, StageMetrics)>,
}

impl StageBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, stage: &str) -> &mut StageMetrics {
        let index = match self.entries.iter().position(|(name, _)| name == stage) {
            Some(index) => index,
            None => {
                self.entries.push((stage.to_string(), StageMetrics::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn get(&self, stage: &str) -> Option<&StageMetrics> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, metrics)| metrics)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageMetrics)> {
        self.entries
            .iter()
            .map(|(name, metrics)| (name.as_str(), metrics))
    }
}

impl Serialize for StageBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (stage, metrics) in &self.entries {
            map.serialize_entry(stage, metrics)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StageBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = StageBreakdown;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of stage name to stage metrics")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut breakdown = StageBreakdown::new();
                while let Some((stage, metrics)) = access.next_entry::<String, StageMetrics>()? {
                    *breakdown.entry(&stage) = metrics;
                }
                Ok(breakdown)
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMetrics {
    pub total_invites: f64,
    pub total_clicks: f64,
    pub total_plays: f64,
    pub total_play_time_minutes: f64,
    pub record_count: usize,
    pub click_rate: f64,
    pub play_rate: f64,
    pub avg_play_time: f64,
    pub stage_breakdown: StageBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub focus: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityAnalysis {
    pub metrics: CommunityMetrics,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub communities: BTreeMap<String, CommunityAnalysis>,
    pub strategies: BTreeMap<String, Vec<Strategy>>,
    pub monthly_trends: BTreeMap<String, StageMetrics>,
    pub analysis_date: NaiveDate,
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
