//! The weekly summary handed to callers and sinks.
//!
//! Every map is a `BTreeMap` and nothing here carries wall-clock time, so the
//! same input always serializes to the same bytes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::{RiskInputs, RiskLevel, RiskWeights};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// Category label → post count; only labels that occurred.
    pub category_distribution: BTreeMap<String, u64>,
    pub engagement_stats: BTreeMap<String, f64>,
    /// (author, posts), most active first.
    pub top_authors: Vec<(String, u64)>,
    /// In [0,1]. Heuristic; see `risk.disclaimer`.
    pub misinformation_risk_indicator: f64,
    pub run_metadata: RunMetadata,
    pub risk: RiskAssessment,
    pub tone: ToneSummary,
    /// `week_NN` → post count.
    pub time_buckets: BTreeMap<String, u64>,
    /// (author, total engagement), highest first.
    pub top_influential_authors: Vec<(String, i64)>,
    pub author_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Posts that survived cleaning.
    pub post_count: usize,
    pub dropped_count: usize,
    pub dropped_by_reason: BTreeMap<String, usize>,
    pub time_range: Option<TimeRange>,
    /// SHA-256 over the kept posts (id, author, timestamp, text), hex.
    pub input_fingerprint: String,
    /// Analyzer names in execution order.
    pub analyzers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub indicator: f64,
    pub level: RiskLevel,
    pub components: RiskInputs,
    pub weights: RiskWeights,
    pub risk_categories: Vec<String>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneSummary {
    pub mean: f64,
    /// Population standard deviation of per-post polarity.
    pub dispersion: f64,
    /// Cue set name → posts it fired on.
    pub cue_counts: BTreeMap<String, u64>,
}

impl WeeklySummary {
    /// Pretty JSON with stable key order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn category_count(&self, label: &str) -> u64 {
        self.category_distribution.get(label).copied().unwrap_or(0)
    }
}
