//! Video engagement analysis for community outreach tracking exports.
//!
//! Tracking rows are read from CSV by [`ingest`], aggregated per community and
//! automation stage by [`analyzer::VideoEngagementAnalyzer`], and rendered by [`report`].

pub mod analyzer;
pub mod clock;
pub mod ingest;
pub mod models;
pub mod report;
pub mod rules;
