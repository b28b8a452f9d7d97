use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::models::{FieldValue, RawRecord};

pub const TRACKING_DATE: &str = "Tracking Date Formatted";
pub const INVITES: &str = "Invites";
pub const CLICKS: &str = "Clicks";
pub const PLAYS: &str = "Plays";
pub const PLAY_TIME: &str = "Play Time (Min)";
pub const AUTOMATION_STAGE: &str = "Automation Stage";
pub const COMMUNITY: &str = "Community";

const REQUIRED_COLUMNS: [&str; 7] = [
    TRACKING_DATE,
    INVITES,
    CLICKS,
    PLAYS,
    PLAY_TIME,
    AUTOMATION_STAGE,
    COMMUNITY,
];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read tracking data: {0}")]
    Io(#[from] std::io::Error),
}

/// Header positions of the required columns.
struct ColumnIndex {
    tracking_date: usize,
    invites: usize,
    clicks: usize,
    plays: usize,
    play_time: usize,
    automation_stage: usize,
    community: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, IngestError> {
        let names: Vec<&str> = headers.iter().map(clean_cell).collect();
        let find = |column: &str| names.iter().position(|name| *name == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| find(**column).is_none())
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing));
        }

        let position = |column: &str| find(column).unwrap_or_default();
        Ok(Self {
            tracking_date: position(TRACKING_DATE),
            invites: position(INVITES),
            clicks: position(CLICKS),
            plays: position(PLAYS),
            play_time: position(PLAY_TIME),
            automation_stage: position(AUTOMATION_STAGE),
            community: position(COMMUNITY),
        })
    }

    fn build(&self, row: &StringRecord) -> RawRecord {
        let text = |index: usize| row.get(index).map(clean_cell).unwrap_or_default().to_string();
        let value = |index: usize| {
            row.get(index)
                .map(|cell| FieldValue::from_cell(clean_cell(cell)))
                .unwrap_or_default()
        };

        RawRecord {
            tracking_date: text(self.tracking_date),
            invites: value(self.invites),
            clicks: value(self.clicks),
            plays: value(self.plays),
            play_time_minutes: value(self.play_time),
            automation_stage: text(self.automation_stage),
            community: text(self.community),
        }
    }
}

fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_matches('"').trim()
}

pub fn parse_reader<R: Read>(input: R) -> Result<Vec<RawRecord>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let columns = ColumnIndex::from_headers(reader.headers()?)?;
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        if row.iter().all(|cell| clean_cell(cell).is_empty()) {
            continue;
        }
        records.push(columns.build(&row));
    }

    debug!(rows = records.len(), "parsed tracking data");
    Ok(records)
}

pub fn parse_str(text: &str) -> Result<Vec<RawRecord>, IngestError> {
    parse_reader(text.as_bytes())
}

pub fn read_path(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let file = File::open(path)?;
    parse_reader(file)
}
