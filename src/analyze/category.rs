// src/analyze/category.rs
//! Keyword + tone content categorizer.
//!
//! Each configured category scores its distinct keyword hits, plus the
//! tone-affinity bonus when the post's tone leans the same way. Highest score
//! wins; ties go to the category declared first.

use tracing::trace;

use super::phrase::Phrase;
use super::tone::ToneScorer;
use super::{AnalysisHistory, AnalysisResult, Analyzer, CategoryResult, EvalCtx, ResultKind};
use crate::config::{AnalysisConfig, ToneAffinity};
use crate::error::AnalysisError;

#[derive(Debug, Clone)]
struct CompiledCategory {
    label: String,
    keywords: Vec<Phrase>,
    tone: Option<ToneAffinity>,
}

#[derive(Debug)]
pub struct ContentCategorizer {
    categories: Vec<CompiledCategory>,
    tone: ToneScorer,
    tone_affinity_bonus: f64,
    saturation_hits: u32,
    history: AnalysisHistory,
}

impl ContentCategorizer {
    pub const NAME: &'static str = "content_categorizer";

    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        let categories = config
            .categories
            .iter()
            .map(|rule| {
                let mut keywords: Vec<Phrase> = Vec::with_capacity(rule.keywords.len());
                for kw in &rule.keywords {
                    let p = Phrase::parse(kw);
                    // "Exam" and "exam" are one keyword, not two hits.
                    if !keywords.contains(&p) {
                        keywords.push(p);
                    }
                }
                CompiledCategory {
                    label: rule.label.trim().to_string(),
                    keywords,
                    tone: rule.tone,
                }
            })
            .collect();

        Ok(Self {
            categories,
            tone: ToneScorer::new(&config.tone),
            tone_affinity_bonus: f64::from(config.scoring.tone_affinity_bonus),
            saturation_hits: config.scoring.saturation_hits,
            history: AnalysisHistory::new(),
        })
    }

    /// Labels in priority order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.label.as_str())
    }

    /// Classify normalized text without recording anything.
    pub fn categorize(&self, text: &str, tokens: &[&str]) -> CategoryResult {
        let tone = self.tone.score_tokens(text, tokens);
        let affinity = tone.affinity();

        let mut total = 0.0_f64;
        // (index, score, hits); strict `>` keeps the earliest on ties.
        let mut best: Option<(usize, f64, u32)> = None;

        for (i, cat) in self.categories.iter().enumerate() {
            let hits = cat
                .keywords
                .iter()
                .filter(|k| k.matches(text, tokens))
                .count() as u32;
            if hits == 0 {
                continue;
            }
            let mut score = f64::from(hits);
            if cat.tone == Some(affinity) {
                score += self.tone_affinity_bonus;
            }
            total += score;
            if best.map_or(true, |(_, s, _)| score > s) {
                best = Some((i, score, hits));
            }
        }

        let Some((idx, score, hits)) = best else {
            return CategoryResult::uncategorized(tone.polarity, tone.cues);
        };

        let share = if total > 0.0 { score / total } else { 0.0 };
        let saturation = (f64::from(hits) / f64::from(self.saturation_hits)).min(1.0);
        CategoryResult {
            label: self.categories[idx].label.clone(),
            confidence: (share * saturation).clamp(0.0, 1.0),
            tone: tone.polarity,
            cues: tone.cues,
            keyword_hits: hits,
        }
    }
}

impl Analyzer for ContentCategorizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Category
    }

    fn history(&self) -> &AnalysisHistory {
        &self.history
    }

    fn evaluate(&self, ctx: &EvalCtx<'_>) -> AnalysisResult {
        let post = ctx.post();
        let tokens = post.tokens();
        let result = self.categorize(post.text(), &tokens);
        trace!(
            target: "pipeline",
            post_id = %post.id(),
            label = %result.label,
            confidence = result.confidence,
            "categorized"
        );
        AnalysisResult::Category(result)
    }
}
