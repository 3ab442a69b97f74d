use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label for posts that match no configured keyword.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Which `AnalysisResult` variant an analyzer declares it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Category,
    Stats,
    Frequency,
}

/// One shape per analyzer kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    Category(CategoryResult),
    Stats(StatsResult),
    Frequency(FrequencyResult),
}

impl AnalysisResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            AnalysisResult::Category(_) => ResultKind::Category,
            AnalysisResult::Stats(_) => ResultKind::Stats,
            AnalysisResult::Frequency(_) => ResultKind::Frequency,
        }
    }

    pub fn as_category(&self) -> Option<&CategoryResult> {
        match self {
            AnalysisResult::Category(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_stats(&self) -> Option<&StatsResult> {
        match self {
            AnalysisResult::Stats(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub label: String,
    /// In [0,1]; 0 for `uncategorized`.
    pub confidence: f64,
    /// Tone polarity in [-1,1].
    pub tone: f64,
    /// Names of the tone cue sets that fired (sorted).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<String>,
    /// Distinct keywords of the winning category found in the post.
    pub keyword_hits: u32,
}

impl CategoryResult {
    pub fn uncategorized(tone: f64, cues: Vec<String>) -> Self {
        Self {
            label: UNCATEGORIZED.to_string(),
            confidence: 0.0,
            tone,
            cues,
            keyword_hits: 0,
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.label == UNCATEGORIZED
    }
}

/// Named numeric metrics. Sorted map so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub metrics: BTreeMap<String, f64>,
}

impl StatsResult {
    /// Metric value, 0.0 when absent.
    pub fn get(&self, key: &str) -> f64 {
        self.metrics.get(key).copied().unwrap_or(0.0)
    }

    pub(crate) fn set(&mut self, key: impl Into<String>, value: f64) {
        self.metrics.insert(key.into(), value);
    }
}

/// Author → post count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResult {
    pub counts: BTreeMap<String, u64>,
}
