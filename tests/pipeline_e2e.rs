// tests/pipeline_e2e.rs
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use subreddit_pulse::analyze::{
    AnalysisHistory, AnalysisResult, Analyzer, CategoryResult, EvalCtx, ResultKind,
};
use subreddit_pulse::sample::SampleGenerator;
use subreddit_pulse::{
    run_weekly, AnalysisConfig, AnalysisError, MemorySink, RawPost, ReportSummarizer, RiskLevel,
    StaticSource,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0).unwrap()
}

fn post(id: &str, author: &str, text: &str, day: u32) -> RawPost {
    RawPost::new(id, author, text, at(day, 14)).with_engagement(3, 1)
}

/// alice posts three rumors, bob two academic questions.
fn five_posts() -> Vec<RawPost> {
    vec![
        post("p1", "alice", "Heard a rumor the dining hall is closing", 8),
        post("p2", "bob", "The professor moved the midterm", 8),
        post("p3", "alice", "Unconfirmed: tuition going up next year", 9),
        post("p4", "alice", "Allegedly the library closes early now", 10),
        post("p5", "bob", "Anyone know if the exam is curved", 11),
    ]
}

fn summarizer() -> ReportSummarizer {
    ReportSummarizer::new(AnalysisConfig::seed()).expect("seed config is valid")
}

#[test]
fn five_post_week_end_to_end() {
    let summary = summarizer().run(&five_posts()).unwrap();

    assert_eq!(summary.category_distribution.len(), 2);
    assert_eq!(summary.category_count("rumor"), 3);
    assert_eq!(summary.category_count("academics"), 2);
    assert_eq!(
        summary.top_authors,
        vec![("alice".to_string(), 3), ("bob".to_string(), 2)]
    );
    assert_eq!(summary.run_metadata.post_count, 5);
    assert_eq!(summary.run_metadata.dropped_count, 0);
    assert_eq!(summary.author_count, 2);
    assert_eq!(summary.time_buckets["week_02"], 5);
    assert_eq!(summary.engagement_stats["count"], 5.0);
    assert_eq!(summary.engagement_stats["total_engagement"], 20.0);

    // 0.5 * 3/5 + 0.2 * 0 + 0.3 * (0.6² + 0.4²)
    let expected = 0.5 * 0.6 + 0.3 * 0.52;
    assert!(
        (summary.misinformation_risk_indicator - expected).abs() < 1e-9,
        "got {}",
        summary.misinformation_risk_indicator
    );
    assert_eq!(summary.risk.level, RiskLevel::Moderate);
    assert!(!summary.risk.disclaimer.is_empty());
    assert!((0.0..=1.0).contains(&summary.misinformation_risk_indicator));
}

#[test]
fn empty_post_is_dropped_and_counted() {
    let posts = vec![
        post("p1", "alice", "Best study spot on campus?", 8),
        post("p2", "bob", "   \n\t ", 8),
        post("p3", "carol", "Homecoming party this weekend", 9),
    ];
    let summary = summarizer().run(&posts).unwrap();
    assert_eq!(summary.run_metadata.post_count, 2);
    assert_eq!(summary.run_metadata.dropped_count, 1);
    assert_eq!(summary.run_metadata.dropped_by_reason["empty"], 1);
    assert_eq!(summary.category_distribution.values().sum::<u64>(), 2);
}

#[test]
fn all_dropped_is_an_empty_batch() {
    let posts = vec![post("p1", "alice", "", 8), post("p2", "bob", "https://x.test", 8)];
    let err = summarizer().run(&posts).unwrap_err();
    assert_eq!(err, AnalysisError::EmptyBatch { dropped: 2 });
}

#[test]
fn reruns_are_byte_identical() {
    let posts = SampleGenerator::new(11).weekly_posts(at(14, 20));

    let mut same = summarizer();
    let first = same.run(&posts).unwrap().to_json().unwrap();
    let again = same.run(&posts).unwrap().to_json().unwrap();
    let fresh = summarizer().run(&posts).unwrap().to_json().unwrap();

    assert_eq!(first, again);
    assert_eq!(first, fresh);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_run_matches_sequential() {
    let posts = SampleGenerator::new(5).weekly_posts(at(21, 20));

    let sequential = summarizer().run(&posts).unwrap();
    let mut s = summarizer();
    let concurrent = s.run_concurrent(&posts).await.unwrap();

    assert_eq!(sequential.to_json().unwrap(), concurrent.to_json().unwrap());
    for a in s.analyzers() {
        assert_eq!(a.history().len(), concurrent.run_metadata.post_count);
    }
}

#[test]
fn risk_grows_with_rumor_share() {
    let mut last = -1.0;
    for rumors in 0..=4 {
        let posts: Vec<RawPost> = (0..4)
            .map(|i| {
                let text = if i < rumors {
                    "heard a rumor about parking"
                } else {
                    "exam review session tonight"
                };
                post(&format!("p{i}"), &format!("user{i}"), text, 8)
            })
            .collect();
        let summary = summarizer().run(&posts).unwrap();
        assert_eq!(summary.category_count("rumor"), rumors as u64);
        assert!(summary.misinformation_risk_indicator >= last);
        last = summary.misinformation_risk_indicator;
    }
}

#[tokio::test]
async fn run_weekly_publishes_to_the_sink() {
    let source = StaticSource::new(five_posts());
    let sink = MemorySink::new();
    let mut s = summarizer();

    let summary = run_weekly(&mut s, &source, &sink).await.unwrap();

    let published = sink.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0], summary);
}

/// Category analyzer whose history is handed in from outside.
struct SharedHistory {
    name: &'static str,
    history: Arc<AnalysisHistory>,
}

impl Analyzer for SharedHistory {
    fn name(&self) -> &str {
        self.name
    }
    fn kind(&self) -> ResultKind {
        ResultKind::Category
    }
    fn history(&self) -> &AnalysisHistory {
        &self.history
    }
    fn evaluate(&self, _ctx: &EvalCtx<'_>) -> AnalysisResult {
        AnalysisResult::Category(CategoryResult::uncategorized(0.0, Vec::new()))
    }
}

#[test]
fn analyzers_sharing_a_history_violate_the_contract() {
    let shared = Arc::new(AnalysisHistory::new());
    let analyzers: Vec<Arc<dyn Analyzer>> = vec![
        Arc::new(SharedHistory {
            name: "left",
            history: Arc::clone(&shared),
        }),
        Arc::new(SharedHistory {
            name: "right",
            history: Arc::clone(&shared),
        }),
    ];
    let mut s = ReportSummarizer::with_analyzers(AnalysisConfig::seed(), analyzers).unwrap();

    let err = s.run(&five_posts()).unwrap_err();
    assert!(
        matches!(err, AnalysisError::ContractViolation { ref analyzer, .. } if analyzer == "left"),
        "got {err:?}"
    );
}

#[test]
fn custom_category_analyzer_drives_the_distribution() {
    let analyzers: Vec<Arc<dyn Analyzer>> = vec![Arc::new(SharedHistory {
        name: "everything_uncategorized",
        history: Arc::new(AnalysisHistory::new()),
    })];
    let mut s = ReportSummarizer::with_analyzers(AnalysisConfig::seed(), analyzers).unwrap();
    let summary = s.run(&five_posts()).unwrap();
    assert_eq!(summary.category_count("uncategorized"), 5);
    assert!(summary.engagement_stats.is_empty());
    assert_eq!(summary.run_metadata.analyzers, vec!["everything_uncategorized"]);
}
