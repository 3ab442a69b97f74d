// src/config/analysis.rs
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyze::UNCATEGORIZED;
use crate::error::AnalysisError;
use crate::post::tokenize;
use crate::risk::RiskWeights;

/// Everything the analysis engine needs, supplied by the caller.
///
/// Category order matters: it is the tie-break priority of the categorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// How many authors `top_authors` reports.
    pub top_n: usize,
    /// First day of the semester; week buckets count from here.
    pub semester_start: NaiveDate,
    pub categories: Vec<CategoryRule>,
    pub tone: ToneLexicon,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    pub label: String,
    pub keywords: Vec<String>,
    /// Optional tone this category leans to; a matching post tone adds
    /// `scoring.tone_affinity_bonus` to the category score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneAffinity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneAffinity {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToneLexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    #[serde(default)]
    pub neutral: Vec<String>,
    /// Named cue sets (e.g. `anger`, `sarcasm`); reported, not scored.
    #[serde(default)]
    pub cues: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub tone_affinity_bonus: f32,
    /// Keyword hits at which confidence stops growing.
    pub saturation_hits: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tone_affinity_bonus: 0.5,
            saturation_hits: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskConfig {
    /// Category labels treated as potential-misinformation signals.
    pub categories: Vec<String>,
    pub weights: RiskWeights,
}

impl AnalysisConfig {
    /// Reject configurations the engine cannot run with. Called by every
    /// constructor that takes a config, before any post is seen.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.top_n == 0 {
            return Err(AnalysisError::config("top_n must be at least 1"));
        }
        if self.categories.is_empty() {
            return Err(AnalysisError::config("no categories configured"));
        }

        let mut labels = BTreeSet::new();
        for rule in &self.categories {
            let label = rule.label.trim();
            if label.is_empty() {
                return Err(AnalysisError::config("category with empty label"));
            }
            if label.eq_ignore_ascii_case(UNCATEGORIZED) {
                return Err(AnalysisError::config(format!(
                    "`{UNCATEGORIZED}` is reserved and cannot be configured"
                )));
            }
            if !labels.insert(label.to_string()) {
                return Err(AnalysisError::config(format!("duplicate category `{label}`")));
            }
            if rule.keywords.is_empty() {
                return Err(AnalysisError::config(format!("category `{label}` has no keywords")));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(AnalysisError::config(format!(
                    "category `{label}` has a blank keyword"
                )));
            }
        }

        if self.tone.positive.is_empty() || self.tone.negative.is_empty() {
            return Err(AnalysisError::config(
                "tone lexicon needs both positive and negative words",
            ));
        }
        for (side, words) in [
            ("positive", &self.tone.positive),
            ("negative", &self.tone.negative),
            ("neutral", &self.tone.neutral),
        ] {
            // Polarity is looked up per token; phrases belong in cue sets.
            if let Some(w) = words.iter().find(|w| !is_single_token(w)) {
                return Err(AnalysisError::config(format!(
                    "{side} tone word `{w}` must be a single token"
                )));
            }
        }
        for (name, cues) in &self.tone.cues {
            if name.trim().is_empty() || cues.is_empty() || cues.iter().any(|c| c.is_empty()) {
                return Err(AnalysisError::config(format!("tone cue set `{name}` is invalid")));
            }
        }

        let bonus = self.scoring.tone_affinity_bonus;
        if !bonus.is_finite() || bonus < 0.0 {
            return Err(AnalysisError::config("tone_affinity_bonus must be >= 0"));
        }
        if self.scoring.saturation_hits == 0 {
            return Err(AnalysisError::config("saturation_hits must be at least 1"));
        }

        for label in &self.risk.categories {
            if !labels.contains(label.trim()) {
                return Err(AnalysisError::config(format!(
                    "risk category `{label}` is not a configured category"
                )));
            }
        }
        self.risk.weights.validate()
    }

    /// Built-in vocabulary for a university subreddit. Only used when a
    /// caller asks for it; loaders never fall back to it.
    pub fn seed() -> Self {
        fn words(ws: &[&str]) -> Vec<String> {
            ws.iter().map(|w| w.to_string()).collect()
        }
        let rule = |label: &str, kws: &[&str], tone: Option<ToneAffinity>| CategoryRule {
            label: label.to_string(),
            keywords: words(kws),
            tone,
        };

        let mut cues = BTreeMap::new();
        cues.insert(
            "anger".to_string(),
            words(&["!", "angry", "hate", "worst", "terrible"]),
        );
        cues.insert("sarcasm".to_string(), words(&["yeah right", "sure", "totally"]));
        cues.insert("humor".to_string(), words(&["lol", "funny", "haha"]));
        cues.insert(
            "uncertainty".to_string(),
            words(&["maybe", "not sure", "idk", "perhaps"]),
        );

        Self {
            top_n: 5,
            semester_start: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap_or_default(),
            categories: vec![
                rule(
                    "news",
                    &["alert", "news", "update", "announcement", "diamondback", "report"],
                    None,
                ),
                rule(
                    "academics",
                    &[
                        "class", "classes", "exam", "professor", "grade", "gpa", "study",
                        "midterm", "final", "project", "homework",
                    ],
                    None,
                ),
                rule(
                    "advice",
                    &["recommend", "tips", "help", "should i", "question", "advice"],
                    None,
                ),
                rule(
                    "social",
                    &["party", "hangout", "movie", "homecoming", "game", "event"],
                    Some(ToneAffinity::Positive),
                ),
                rule(
                    "humor",
                    &["lol", "lmao", "haha", "joke", "funny"],
                    Some(ToneAffinity::Positive),
                ),
                rule(
                    "rumor",
                    &[
                        "rumor", "unconfirmed", "heard", "confirmed??", "sources say",
                        "reportedly", "breaking", "shocking", "can't believe", "conspiracy",
                        "fake news", "scam", "hoax", "allegedly",
                    ],
                    Some(ToneAffinity::Negative),
                ),
                rule("random", &["idk", "random", "whatever"], None),
            ],
            tone: ToneLexicon {
                positive: words(&[
                    "good", "great", "love", "awesome", "thanks", "helpful", "best", "happy",
                    "excited", "fun", "nice", "amazing", "glad", "congrats",
                ]),
                negative: words(&[
                    "bad", "hate", "worst", "terrible", "angry", "awful", "sucks", "annoying",
                    "unfair", "scam", "hoax", "fake", "scary", "ridiculous",
                ]),
                neutral: words(&["okay", "average", "normal", "usual"]),
                cues,
            },
            scoring: ScoringConfig::default(),
            risk: RiskConfig {
                categories: words(&["rumor"]),
                weights: RiskWeights::default(),
            },
        }
    }
}

fn is_single_token(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    let mut tokens = tokenize(&lower);
    tokens.next() == Some(lower.as_str()) && tokens.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_valid() {
        AnalysisConfig::seed().validate().unwrap();
    }

    #[test]
    fn reserved_label_is_rejected() {
        let mut cfg = AnalysisConfig::seed();
        cfg.categories[0].label = "Uncategorized".into();
        assert!(matches!(
            cfg.validate(),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_risk_category_is_rejected() {
        let mut cfg = AnalysisConfig::seed();
        cfg.risk.categories.push("gossip".into());
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("gossip"));
    }

    #[test]
    fn empty_tone_side_is_rejected() {
        let mut cfg = AnalysisConfig::seed();
        cfg.tone.negative.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn duplicate_and_empty_keywords_are_rejected() {
        let mut cfg = AnalysisConfig::seed();
        cfg.categories[1].label = cfg.categories[0].label.clone();
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::seed();
        cfg.categories[2].keywords.push("  ".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multi_word_tone_entries_are_rejected() {
        let mut cfg = AnalysisConfig::seed();
        cfg.tone.negative.push("not bad".into());
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("not bad"), "{err}");

        let mut cfg = AnalysisConfig::seed();
        cfg.tone.positive.push("great!".into());
        assert!(cfg.validate().is_err());

        // Case and surrounding space are normalized away, as the scorer does.
        let mut cfg = AnalysisConfig::seed();
        cfg.tone.neutral.push(" Fine ".into());
        cfg.validate().unwrap();
    }
}
