//! # Report Summarizer
//! Orchestrates one weekly run: clean → extract → analyze → fold into a
//! [`WeeklySummary`].
//!
//! The fold reads each analyzer's history slice for this run, not a side
//! channel, and checks it grew by exactly one entry per analyzed post in
//! post order. A fresh frequency tracker is built from the first category
//! analyzer's slice. Nothing time- or run-dependent reaches the summary, so
//! rerunning the same input gives byte-identical JSON.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use tracing::{debug, info, warn};

use crate::analyze::{
    Analyzer, AnalyzerExt, CategoryResult, ContentCategorizer, ResultKind, StatsAnalyzer,
    StatsResult,
};
use crate::clean::DataCleaner;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::export::SummarySink;
use crate::frequency::UserFrequencyTracker;
use crate::ingest::{PostSource, RawBatch};
use crate::logging::{anon_hash, fingerprint};
use crate::metadata::{MetadataExtractor, PostMetadata};
use crate::metrics::{LAST_RISK_INDICATOR, POSTS_DROPPED_TOTAL, POSTS_KEPT_TOTAL, RUNS_TOTAL, RUN_MS};
use crate::post::{CleanedPost, RawPost};
use crate::report::{RiskAssessment, RunMetadata, TimeRange, ToneSummary, WeeklySummary};
use crate::risk::{
    population_std_dev, risk_indicator, RiskInputs, RiskLevel, RISK_DISCLAIMER,
};

/// Cleaned posts and their metadata, index-aligned.
#[derive(Debug)]
struct Prepared {
    posts: Vec<CleanedPost>,
    metas: Vec<PostMetadata>,
    dropped_by_reason: BTreeMap<String, usize>,
}

impl Prepared {
    fn dropped_count(&self) -> usize {
        self.dropped_by_reason.values().sum()
    }
}

/// Runs take `&mut self`: the history offsets read before analysis must not
/// move under another run on the same analyzers before the fold.
pub struct ReportSummarizer {
    config: AnalysisConfig,
    extractor: MetadataExtractor,
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl std::fmt::Debug for ReportSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSummarizer")
            .field("analyzers", &self.analyzer_names())
            .field("semester_start", &self.extractor.semester_start())
            .finish()
    }
}

impl ReportSummarizer {
    /// Default analyzer set: content categorizer, then engagement stats.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let categorizer = ContentCategorizer::new(&config)?;
        Self::with_analyzers(
            config,
            vec![Arc::new(categorizer), Arc::new(StatsAnalyzer::new())],
        )
    }

    /// Any analyzer set with at least one `Category` analyzer; the first one
    /// drives the distribution and author tracking.
    pub fn with_analyzers(
        config: AnalysisConfig,
        analyzers: Vec<Arc<dyn Analyzer>>,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        if !analyzers.iter().any(|a| a.kind() == ResultKind::Category) {
            return Err(AnalysisError::config(
                "at least one category analyzer is required",
            ));
        }
        for (i, a) in analyzers.iter().enumerate() {
            if analyzers[..i].iter().any(|b| Arc::ptr_eq(a, b)) {
                return Err(AnalysisError::config(format!(
                    "analyzer `{}` registered twice",
                    a.name()
                )));
            }
        }
        Ok(Self {
            extractor: MetadataExtractor::new(config.semester_start),
            config,
            analyzers,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    pub fn analyzer_names(&self) -> Vec<String> {
        self.analyzers.iter().map(|a| a.name().to_string()).collect()
    }

    /// Sequential run over one week's records.
    pub fn run(&mut self, raws: &[RawPost]) -> Result<WeeklySummary, AnalysisError> {
        self.run_sequential(raws, 0)
    }

    /// Like [`run`](Self::run); undecodable records of the batch count as dropped.
    pub fn run_batch(&mut self, batch: &RawBatch) -> Result<WeeklySummary, AnalysisError> {
        self.run_sequential(&batch.posts, batch.malformed)
    }

    /// One blocking task per analyzer, all joined before folding. Produces
    /// the same summary as [`run`](Self::run).
    pub async fn run_concurrent(
        &mut self,
        raws: &[RawPost],
    ) -> Result<WeeklySummary, AnalysisError> {
        self.run_parallel(raws, 0).await
    }

    pub async fn run_concurrent_batch(
        &mut self,
        batch: &RawBatch,
    ) -> Result<WeeklySummary, AnalysisError> {
        self.run_parallel(&batch.posts, batch.malformed).await
    }

    fn run_sequential(
        &mut self,
        raws: &[RawPost],
        undecodable: usize,
    ) -> Result<WeeklySummary, AnalysisError> {
        let started = Instant::now();
        let prepared = self.prepare(raws, undecodable)?;
        let offsets = self.history_offsets();

        for a in &self.analyzers {
            analyze_all(a.as_ref(), &prepared.posts, &prepared.metas)?;
        }

        self.finish(&prepared, &offsets, started)
    }

    async fn run_parallel(
        &mut self,
        raws: &[RawPost],
        undecodable: usize,
    ) -> Result<WeeklySummary, AnalysisError> {
        let started = Instant::now();
        let prepared = Arc::new(self.prepare(raws, undecodable)?);
        let offsets = self.history_offsets();

        let handles: Vec<_> = self
            .analyzers
            .iter()
            .map(|a| {
                let a = Arc::clone(a);
                let data = Arc::clone(&prepared);
                tokio::task::spawn_blocking(move || {
                    analyze_all(a.as_ref(), &data.posts, &data.metas)
                })
            })
            .collect();

        // Barrier: every task finishes before anything is read back.
        let mut outcomes = Vec::with_capacity(handles.len());
        for h in handles {
            outcomes.push(h.await);
        }
        for (a, outcome) in self.analyzers.iter().zip(outcomes) {
            match outcome {
                Ok(res) => res?,
                Err(e) => {
                    return Err(AnalysisError::contract(
                        a.name(),
                        format!("analyzer task did not complete: {e}"),
                    ))
                }
            }
        }

        self.finish(&prepared, &offsets, started)
    }

    fn prepare(&self, raws: &[RawPost], undecodable: usize) -> Result<Prepared, AnalysisError> {
        let report = DataCleaner::new().clean_batch(raws);
        let mut dropped_by_reason = report.dropped;
        if undecodable > 0 {
            *dropped_by_reason.entry("undecodable".to_string()).or_insert(0) += undecodable;
        }

        if report.kept.is_empty() {
            let dropped: usize = dropped_by_reason.values().sum();
            warn!(target: "pipeline", dropped, "no posts survived cleaning");
            counter!(POSTS_DROPPED_TOTAL).increment(dropped as u64);
            return Err(AnalysisError::EmptyBatch { dropped });
        }

        let metas = report.kept.iter().map(|p| self.extractor.extract(p)).collect();
        Ok(Prepared {
            posts: report.kept,
            metas,
            dropped_by_reason,
        })
    }

    fn history_offsets(&self) -> Vec<usize> {
        self.analyzers.iter().map(|a| a.history().len()).collect()
    }

    fn finish(
        &self,
        prepared: &Prepared,
        offsets: &[usize],
        started: Instant,
    ) -> Result<WeeklySummary, AnalysisError> {
        let summary = self.fold(prepared, offsets)?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!(POSTS_KEPT_TOTAL).increment(summary.run_metadata.post_count as u64);
        counter!(POSTS_DROPPED_TOTAL).increment(summary.run_metadata.dropped_count as u64);
        counter!(RUNS_TOTAL).increment(1);
        gauge!(LAST_RISK_INDICATOR).set(summary.misinformation_risk_indicator);
        histogram!(RUN_MS).record(elapsed_ms);

        info!(
            target: "pipeline",
            posts = summary.run_metadata.post_count,
            dropped = summary.run_metadata.dropped_count,
            authors = summary.author_count,
            top_author = %summary
                .top_authors
                .first()
                .map(|(a, _)| anon_hash(a))
                .unwrap_or_default(),
            risk = summary.misinformation_risk_indicator,
            level = ?summary.risk.level,
            elapsed_ms,
            "weekly summary ready"
        );
        Ok(summary)
    }

    fn fold(&self, prepared: &Prepared, offsets: &[usize]) -> Result<WeeklySummary, AnalysisError> {
        let posts = &prepared.posts;
        let metas = &prepared.metas;
        let n = posts.len();

        let mut categories: Option<Vec<CategoryResult>> = None;
        let mut stats: Option<Vec<StatsResult>> = None;

        for (a, &offset) in self.analyzers.iter().zip(offsets) {
            let entries = a.history().entries_from(offset);
            if entries.len() != n {
                return Err(AnalysisError::contract(
                    a.name(),
                    format!("history grew by {} entries for {n} posts", entries.len()),
                ));
            }
            if let Some((e, p)) = entries
                .iter()
                .zip(posts)
                .find(|(e, p)| e.post_id != p.id())
            {
                return Err(AnalysisError::contract(
                    a.name(),
                    format!(
                        "history entry {} is for post {}, expected {}",
                        e.seq,
                        e.post_id,
                        p.id()
                    ),
                ));
            }
            debug!(target: "pipeline", analyzer = a.name(), entries = n, "history slice verified");

            match a.kind() {
                ResultKind::Category if categories.is_none() => {
                    categories = Some(
                        entries
                            .into_iter()
                            .filter_map(|e| e.result.as_category().cloned())
                            .collect(),
                    );
                }
                ResultKind::Stats if stats.is_none() => {
                    stats = Some(
                        entries
                            .into_iter()
                            .filter_map(|e| e.result.as_stats().cloned())
                            .collect(),
                    );
                }
                _ => {}
            }
        }

        // with_analyzers guarantees a category analyzer.
        let categories = categories.unwrap_or_default();

        let mut tracker = UserFrequencyTracker::new();
        let mut category_distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut cue_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut time_buckets: BTreeMap<String, u64> = BTreeMap::new();
        for ((post, meta), cat) in posts.iter().zip(metas).zip(&categories) {
            tracker.ingest(post.author(), cat, meta);
            *category_distribution.entry(cat.label.clone()).or_insert(0) += 1;
            for cue in &cat.cues {
                *cue_counts.entry(cue.clone()).or_insert(0) += 1;
            }
            *time_buckets.entry(meta.bucket.week_key()).or_insert(0) += 1;
        }

        let engagement_stats = stats
            .map(|s| StatsAnalyzer::aggregate(&s))
            .unwrap_or_default();

        let tones: Vec<f64> = categories.iter().map(|c| c.tone).collect();
        let tone = ToneSummary {
            mean: if tones.is_empty() {
                0.0
            } else {
                tones.iter().sum::<f64>() / tones.len() as f64
            },
            dispersion: population_std_dev(&tones).clamp(0.0, 1.0),
            cue_counts,
        };

        let risk_labels = &self.config.risk.categories;
        let flagged = categories
            .iter()
            .filter(|c| risk_labels.iter().any(|l| l.trim() == c.label))
            .count();
        let components = RiskInputs::new(
            flagged as f64 / n as f64,
            tone.dispersion,
            tracker.author_concentration(),
        );
        let weights = self.config.risk.weights;
        let indicator = risk_indicator(&components, &weights);

        let time_range = match (
            metas.iter().map(|m| m.created_at).min(),
            metas.iter().map(|m| m.created_at).max(),
        ) {
            (Some(start), Some(end)) => Some(TimeRange { start, end }),
            _ => None,
        };

        let fp_parts: Vec<String> = posts
            .iter()
            .flat_map(|p| {
                [
                    p.id().to_string(),
                    p.author().to_string(),
                    p.created_at().to_rfc3339(),
                    p.text().to_string(),
                ]
            })
            .collect();

        Ok(WeeklySummary {
            category_distribution,
            engagement_stats,
            top_authors: tracker.top_frequent_authors(self.config.top_n),
            misinformation_risk_indicator: indicator,
            run_metadata: RunMetadata {
                post_count: n,
                dropped_count: prepared.dropped_count(),
                dropped_by_reason: prepared.dropped_by_reason.clone(),
                time_range,
                input_fingerprint: fingerprint(fp_parts.iter().map(String::as_str)),
                analyzers: self.analyzer_names(),
            },
            risk: RiskAssessment {
                indicator,
                level: RiskLevel::from_indicator(indicator),
                components,
                weights,
                risk_categories: risk_labels.clone(),
                disclaimer: RISK_DISCLAIMER.to_string(),
            },
            tone,
            time_buckets,
            top_influential_authors: tracker.top_influential_authors(self.config.top_n),
            author_count: tracker.author_count(),
        })
    }
}

fn analyze_all(
    analyzer: &dyn Analyzer,
    posts: &[CleanedPost],
    metas: &[PostMetadata],
) -> Result<(), AnalysisError> {
    for (post, meta) in posts.iter().zip(metas) {
        analyzer.analyze(post, meta)?;
    }
    Ok(())
}

/// Fetch from `source`, run concurrently, publish to `sink`.
pub async fn run_weekly(
    summarizer: &mut ReportSummarizer,
    source: &dyn PostSource,
    sink: &dyn SummarySink,
) -> anyhow::Result<WeeklySummary> {
    use anyhow::Context;

    let batch = source
        .fetch_posts()
        .await
        .with_context(|| format!("fetching posts from `{}`", source.name()))?;
    debug!(
        target: "pipeline",
        source = source.name(),
        records = batch.posts.len(),
        undecodable = batch.malformed,
        "batch fetched"
    );
    let summary = summarizer.run_concurrent_batch(&batch).await?;
    sink.publish(&summary)
        .await
        .context("publishing weekly summary")?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{AnalysisHistory, AnalysisResult, EvalCtx};
    use chrono::{TimeZone, Utc};

    fn post(id: &str, author: &str, text: &str, day: u32) -> RawPost {
        let ts = Utc.with_ymd_and_hms(2025, 9, day, 15, 0, 0).unwrap();
        RawPost::new(id, author, text, ts)
    }

    /// Records a second entry into its own history on every evaluation, so the
    /// run's slice is twice as long as the post count.
    struct Forgetful {
        history: AnalysisHistory,
    }

    impl Analyzer for Forgetful {
        fn name(&self) -> &str {
            "forgetful"
        }
        fn kind(&self) -> ResultKind {
            ResultKind::Category
        }
        fn history(&self) -> &AnalysisHistory {
            &self.history
        }
        fn evaluate(&self, _ctx: &EvalCtx<'_>) -> AnalysisResult {
            let r = AnalysisResult::Category(CategoryResult::uncategorized(0.0, Vec::new()));
            self.history.record("phantom", r.clone());
            r
        }
    }

    #[test]
    fn requires_a_category_analyzer() {
        let err = ReportSummarizer::with_analyzers(
            AnalysisConfig::seed(),
            vec![Arc::new(StatsAnalyzer::new())],
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn same_instance_twice_is_rejected() {
        let a: Arc<dyn Analyzer> =
            Arc::new(ContentCategorizer::new(&AnalysisConfig::seed()).unwrap());
        let err = ReportSummarizer::with_analyzers(AnalysisConfig::seed(), vec![a.clone(), a])
            .unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn extra_history_entries_abort_the_run() {
        let mut s = ReportSummarizer::with_analyzers(
            AnalysisConfig::seed(),
            vec![Arc::new(Forgetful {
                history: AnalysisHistory::new(),
            })],
        )
        .unwrap();
        let err = s.run(&[post("p1", "a", "hello exam", 1)]).unwrap_err();
        match err {
            AnalysisError::ContractViolation { analyzer, .. } => assert_eq!(analyzer, "forgetful"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_batch_reports_drops() {
        let mut s = ReportSummarizer::new(AnalysisConfig::seed()).unwrap();
        let batch = RawBatch {
            posts: vec![post("p1", "a", "   ", 1), post("p2", "b", "[deleted]", 1)],
            malformed: 1,
        };
        assert_eq!(
            s.run_batch(&batch).unwrap_err(),
            AnalysisError::EmptyBatch { dropped: 3 }
        );
    }

    #[test]
    fn undecodable_records_are_counted_as_dropped() {
        let mut s = ReportSummarizer::new(AnalysisConfig::seed()).unwrap();
        let batch = RawBatch {
            posts: vec![post("p1", "a", "midterm tips?", 1)],
            malformed: 2,
        };
        let summary = s.run_batch(&batch).unwrap();
        assert_eq!(summary.run_metadata.dropped_count, 2);
        assert_eq!(summary.run_metadata.dropped_by_reason["undecodable"], 2);
    }

    #[test]
    fn histories_accumulate_across_runs_but_summaries_do_not() {
        let mut s = ReportSummarizer::new(AnalysisConfig::seed()).unwrap();
        let week = [
            post("p1", "a", "exam tomorrow", 1),
            post("p2", "b", "party tonight", 2),
        ];
        let first = s.run(&week).unwrap();
        let second = s.run(&week).unwrap();
        assert_eq!(first, second);
        for a in s.analyzers() {
            assert_eq!(a.history().len(), 4);
        }
    }
}
