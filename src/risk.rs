//! Heuristic misinformation-risk indicator.
//!
//! `RiskInputs` are three normalized signals in [0,1]:
//! - `category_share`       : share of posts in risk-flagged categories
//! - `tone_dispersion`      : spread (population std-dev) of tone polarity
//! - `author_concentration` : Herfindahl index of posting shares
//!
//! Indicator = (w_share*share + w_tone*tone + w_conc*conc) / (sum of weights),
//! clamped to [0,1]. This is a heuristic signal, never a truth label.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub const RISK_DISCLAIMER: &str = "Heuristic indicator derived from keyword categories, tone \
spread and author concentration. It is not a verified misinformation classification.";

/// Normalized inputs in [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub category_share: f64,
    pub tone_dispersion: f64,
    pub author_concentration: f64,
}

impl RiskInputs {
    /// Safe constructor with clamping.
    pub fn new(category_share: f64, tone_dispersion: f64, author_concentration: f64) -> Self {
        fn c(x: f64) -> f64 {
            if x.is_nan() {
                0.0
            } else {
                x.clamp(0.0, 1.0)
            }
        }
        Self {
            category_share: c(category_share),
            tone_dispersion: c(tone_dispersion),
            author_concentration: c(author_concentration),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskWeights {
    pub category_share: f64,
    pub tone_dispersion: f64,
    pub author_concentration: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            category_share: 0.5,
            tone_dispersion: 0.2,
            author_concentration: 0.3,
        }
    }
}

impl RiskWeights {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let ws = [
            self.category_share,
            self.tone_dispersion,
            self.author_concentration,
        ];
        if ws.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::config("risk weights must be finite and >= 0"));
        }
        if ws.iter().sum::<f64>() <= 0.0 {
            return Err(AnalysisError::config("risk weights must not all be zero"));
        }
        Ok(())
    }
}

/// Coarse band for readers of the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn from_indicator(x: f64) -> Self {
        if x < 0.25 {
            RiskLevel::Low
        } else if x < 0.5 {
            RiskLevel::Moderate
        } else if x < 0.75 {
            RiskLevel::Elevated
        } else {
            RiskLevel::High
        }
    }
}

/// Weighted risk indicator in [0,1].
pub fn risk_indicator(inputs: &RiskInputs, w: &RiskWeights) -> f64 {
    let raw = inputs.category_share * w.category_share
        + inputs.tone_dispersion * w.tone_dispersion
        + inputs.author_concentration * w.author_concentration;

    let denom = (w.category_share + w.tone_dispersion + w.author_concentration).max(1e-9);
    (raw / denom).clamp(0.0, 1.0)
}

/// Herfindahl index of shares given raw counts: 1.0 for one author, 1/n for
/// n equal authors, 0.0 for no posts.
pub fn herfindahl(counts: impl IntoIterator<Item = u64>) -> f64 {
    let counts: Vec<u64> = counts.into_iter().collect();
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            p * p
        })
        .sum()
}

/// Population standard deviation; 0.0 for fewer than two values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}
