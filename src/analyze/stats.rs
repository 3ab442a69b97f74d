//! Engagement/statistics analyzer.
//!
//! Emits the per-post numbers plus running aggregates over everything this
//! instance has seen. Run-level figures come from [`StatsAnalyzer::aggregate`],
//! which only looks at per-post keys, so they do not depend on earlier runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::{AnalysisHistory, AnalysisResult, Analyzer, EvalCtx, ResultKind, StatsResult};

pub const SCORE: &str = "score";
pub const NUM_COMMENTS: &str = "num_comments";
pub const ENGAGEMENT: &str = "engagement";
pub const LENGTH_TOKENS: &str = "length_tokens";
pub const MISSING_COUNTERS: &str = "missing_counters";

#[derive(Debug, Default)]
struct Running {
    count: u64,
    score_sum: f64,
    score_max: Option<f64>,
    comments_sum: f64,
    comments_max: f64,
    engagement_sum: f64,
    weeks: BTreeMap<i64, u64>,
}

#[derive(Debug, Default)]
pub struct StatsAnalyzer {
    running: Mutex<Running>,
    history: AnalysisHistory,
}

impl StatsAnalyzer {
    pub const NAME: &'static str = "engagement_stats";

    pub fn new() -> Self {
        Self::default()
    }

    /// Run-level engagement statistics over per-post results.
    ///
    /// Keys: `count`, `mean_score`, `median_score`, `min_score`, `max_score`,
    /// `mean_comments`, `max_comments`, `total_engagement`, `mean_engagement`,
    /// `mean_length_tokens`, `missing_counters`. All zero for no input.
    pub fn aggregate(results: &[StatsResult]) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        let n = results.len();
        out.insert("count".to_string(), n as f64);

        let mut scores: Vec<f64> = results.iter().map(|r| r.get(SCORE)).collect();
        scores.sort_by(f64::total_cmp);
        let comments: Vec<f64> = results.iter().map(|r| r.get(NUM_COMMENTS)).collect();
        let engagement: f64 = results.iter().map(|r| r.get(ENGAGEMENT)).sum();
        let length: f64 = results.iter().map(|r| r.get(LENGTH_TOKENS)).sum();
        let missing: f64 = results.iter().map(|r| r.get(MISSING_COUNTERS)).sum();

        out.insert("mean_score".to_string(), mean(scores.iter().sum(), n));
        out.insert("median_score".to_string(), median(&scores));
        out.insert("min_score".to_string(), scores.first().copied().unwrap_or(0.0));
        out.insert("max_score".to_string(), scores.last().copied().unwrap_or(0.0));
        out.insert("mean_comments".to_string(), mean(comments.iter().sum(), n));
        out.insert(
            "max_comments".to_string(),
            comments.iter().copied().fold(0.0, f64::max),
        );
        out.insert("total_engagement".to_string(), engagement);
        out.insert("mean_engagement".to_string(), mean(engagement, n));
        out.insert("mean_length_tokens".to_string(), mean(length, n));
        out.insert("missing_counters".to_string(), missing);
        out
    }
}

impl Analyzer for StatsAnalyzer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Stats
    }

    fn history(&self) -> &AnalysisHistory {
        &self.history
    }

    fn evaluate(&self, ctx: &EvalCtx<'_>) -> AnalysisResult {
        let meta = ctx.meta();
        let p = ctx.post().post();
        let score = p.score.unwrap_or(0) as f64;
        let comments = p.num_comments.unwrap_or(0) as f64;
        let missing = p.score.is_none() || p.num_comments.is_none();

        let mut r = StatsResult::default();
        r.set(SCORE, score);
        r.set(NUM_COMMENTS, comments);
        r.set(ENGAGEMENT, meta.engagement as f64);
        r.set(LENGTH_TOKENS, meta.token_count as f64);
        r.set(MISSING_COUNTERS, if missing { 1.0 } else { 0.0 });

        let mut run = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        run.count += 1;
        run.score_sum += score;
        run.score_max = Some(run.score_max.map_or(score, |m| m.max(score)));
        run.comments_sum += comments;
        run.comments_max = run.comments_max.max(comments);
        run.engagement_sum += meta.engagement as f64;
        let week = run.weeks.entry(meta.bucket.week_of_semester).or_insert(0);
        *week += 1;
        let week_count = *week;

        let n = run.count as f64;
        r.set("running_count", n);
        r.set("running_mean_score", run.score_sum / n);
        r.set("running_max_score", run.score_max.unwrap_or(0.0));
        r.set("running_mean_comments", run.comments_sum / n);
        r.set("running_max_comments", run.comments_max);
        r.set("running_mean_engagement", run.engagement_sum / n);
        r.set(meta.bucket.week_key(), week_count as f64);

        AnalysisResult::Stats(r)
    }
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// `sorted` must be ascending.
fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::AnalyzerExt;
    use crate::clean::{CleanOutcome, DataCleaner};
    use crate::metadata::MetadataExtractor;
    use crate::post::RawPost;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn run(analyzer: &StatsAnalyzer, raws: Vec<RawPost>) -> Vec<StatsResult> {
        let ex = MetadataExtractor::new(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap());
        let mut cleaner = DataCleaner::new();
        raws.iter()
            .map(|raw| {
                let post = match cleaner.clean(raw) {
                    CleanOutcome::Kept(p) => p,
                    other => panic!("unexpected {other:?}"),
                };
                let meta = ex.extract(&post);
                analyzer
                    .analyze(&post, &meta)
                    .unwrap()
                    .as_stats()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn raw(id: &str, day: u32) -> RawPost {
        let ts = Utc.with_ymd_and_hms(2025, 9, day, 12, 0, 0).unwrap();
        RawPost::new(id, "terp", "some words here", ts)
    }

    #[test]
    fn missing_counters_count_as_zero() {
        let a = StatsAnalyzer::new();
        let out = run(&a, vec![raw("p1", 1)]);
        assert_eq!(out[0].get(SCORE), 0.0);
        assert_eq!(out[0].get(NUM_COMMENTS), 0.0);
        assert_eq!(out[0].get(MISSING_COUNTERS), 1.0);
        assert_eq!(out[0].get(LENGTH_TOKENS), 3.0);
    }

    #[test]
    fn running_aggregates_and_week_buckets() {
        let a = StatsAnalyzer::new();
        let out = run(
            &a,
            vec![
                raw("p1", 1).with_engagement(10, 2),
                raw("p2", 2).with_engagement(4, 6),
                raw("p3", 9).with_engagement(1, 0),
            ],
        );
        assert_eq!(out[1].get("running_count"), 2.0);
        assert_eq!(out[1].get("running_mean_score"), 7.0);
        assert_eq!(out[1].get("running_max_comments"), 6.0);
        assert_eq!(out[1].get("week_01"), 2.0);
        assert_eq!(out[2].get("week_02"), 1.0);
        assert_eq!(out[2].get("running_max_score"), 10.0);
        assert_eq!(a.history().len(), 3);
    }

    #[test]
    fn aggregate_run_level() {
        let a = StatsAnalyzer::new();
        let out = run(
            &a,
            vec![
                raw("p1", 1).with_engagement(10, 2),
                raw("p2", 2).with_engagement(4, 6),
                raw("p3", 3),
                raw("p4", 4).with_engagement(-2, 0),
            ],
        );
        let agg = StatsAnalyzer::aggregate(&out);
        assert_eq!(agg["count"], 4.0);
        assert_eq!(agg["mean_score"], 3.0);
        assert_eq!(agg["median_score"], 2.0);
        assert_eq!(agg["min_score"], -2.0);
        assert_eq!(agg["max_score"], 10.0);
        assert_eq!(agg["max_comments"], 6.0);
        assert_eq!(agg["total_engagement"], 20.0);
        assert_eq!(agg["missing_counters"], 1.0);
    }

    #[test]
    fn aggregate_of_nothing_is_zeroes() {
        let agg = StatsAnalyzer::aggregate(&[]);
        assert_eq!(agg["count"], 0.0);
        assert!(agg.values().all(|v| *v == 0.0));
    }

    #[test]
    fn running_count_tracks_history_under_concurrent_callers() {
        let a = std::sync::Arc::new(StatsAnalyzer::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let a = std::sync::Arc::clone(&a);
                std::thread::spawn(move || {
                    run(&a, (0..25).map(|i| raw(&format!("{t}-{i}"), 3)).collect());
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let entries = a.history().snapshot();
        assert_eq!(entries.len(), 100);
        for e in &entries {
            let stats = e.result.as_stats().unwrap();
            assert_eq!(stats.get("running_count"), (e.seq + 1) as f64);
            assert_eq!(stats.get("week_01"), (e.seq + 1) as f64);
        }
    }
}
