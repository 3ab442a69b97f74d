//! Tone scoring over a configured lexicon.
//!
//! Polarity = (positive - negative) / (positive + negative + neutral) hits,
//! in [-1,1]. A negator in the previous 1..=3 tokens flips a polar word.

use std::collections::HashSet;

use serde::Serialize;

use super::phrase::Phrase;
use crate::config::{ToneAffinity, ToneLexicon};
use crate::post::tokenize;

/// |polarity| below this counts as neutral.
pub const NEUTRAL_BAND: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToneScore {
    pub polarity: f64,
    pub positive_hits: u32,
    pub negative_hits: u32,
    pub neutral_hits: u32,
    /// Cue set names that fired, sorted.
    pub cues: Vec<String>,
}

impl ToneScore {
    pub fn affinity(&self) -> ToneAffinity {
        if self.polarity >= NEUTRAL_BAND {
            ToneAffinity::Positive
        } else if self.polarity <= -NEUTRAL_BAND {
            ToneAffinity::Negative
        } else {
            ToneAffinity::Neutral
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToneScorer {
    positive: HashSet<String>,
    negative: HashSet<String>,
    neutral: HashSet<String>,
    /// BTreeMap order from config, so cue output is already sorted.
    cues: Vec<(String, Vec<Phrase>)>,
}

impl ToneScorer {
    pub fn new(lexicon: &ToneLexicon) -> Self {
        let set = |ws: &[String]| -> HashSet<String> {
            ws.iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            positive: set(&lexicon.positive),
            negative: set(&lexicon.negative),
            neutral: set(&lexicon.neutral),
            cues: lexicon
                .cues
                .iter()
                .map(|(name, phrases)| {
                    (name.clone(), phrases.iter().map(|p| Phrase::parse(p)).collect())
                })
                .collect(),
        }
    }

    /// Score normalized text. `text` must already be lowercased.
    pub fn score(&self, text: &str) -> ToneScore {
        let tokens: Vec<&str> = tokenize(text).collect();
        self.score_tokens(text, &tokens)
    }

    pub(crate) fn score_tokens(&self, text: &str, tokens: &[&str]) -> ToneScore {
        let mut pos = 0u32;
        let mut neg = 0u32;
        let mut neu = 0u32;

        for (i, &w) in tokens.iter().enumerate() {
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k]));
            if self.positive.contains(w) {
                if negated {
                    neg += 1;
                } else {
                    pos += 1;
                }
            } else if self.negative.contains(w) {
                if negated {
                    pos += 1;
                } else {
                    neg += 1;
                }
            } else if self.neutral.contains(w) {
                neu += 1;
            }
        }

        let total = pos + neg + neu;
        let polarity = if total == 0 {
            0.0
        } else {
            (f64::from(pos) - f64::from(neg)) / f64::from(total)
        };

        let cues = self
            .cues
            .iter()
            .filter(|(_, phrases)| phrases.iter().any(|p| p.matches(text, tokens)))
            .map(|(name, _)| name.clone())
            .collect();

        ToneScore {
            polarity,
            positive_hits: pos,
            negative_hits: neg,
            neutral_hits: neu,
            cues,
        }
    }
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "without"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scorer() -> ToneScorer {
        let mut cues = BTreeMap::new();
        cues.insert("anger".to_string(), vec!["!".to_string(), "hate".to_string()]);
        cues.insert("uncertainty".to_string(), vec!["not sure".to_string()]);
        ToneScorer::new(&ToneLexicon {
            positive: vec!["good".into(), "Great".into()],
            negative: vec!["bad".into(), "hate".into()],
            neutral: vec!["okay".into()],
            cues,
        })
    }

    #[test]
    fn polarity_signs() {
        let s = scorer();
        assert_eq!(s.score("this is great").polarity, 1.0);
        assert_eq!(s.score("this is bad").polarity, -1.0);
        assert_eq!(s.score("nothing to see").polarity, 0.0);
        assert_eq!(s.score("good but bad").polarity, 0.0);
        let diluted = s.score("good and okay");
        assert!((diluted.polarity - 0.5).abs() < 1e-12);
        assert_eq!(diluted.affinity(), ToneAffinity::Positive);
    }

    #[test]
    fn negation_flips_within_three_tokens() {
        let s = scorer();
        assert_eq!(s.score("not good").polarity, -1.0);
        assert_eq!(s.score("not really that good").polarity, -1.0);
        assert_eq!(s.score("not one two three good").polarity, 1.0);
        assert_eq!(s.score("don't hate it").polarity, 1.0);
    }

    #[test]
    fn cues_are_reported_sorted() {
        let s = scorer();
        let t = s.score("i hate this, not sure why!");
        assert_eq!(t.cues, vec!["anger".to_string(), "uncertainty".to_string()]);
        assert_eq!(t.affinity(), ToneAffinity::Negative);
        assert!(s.score("calm day").cues.is_empty());
    }
}
