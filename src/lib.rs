// src/lib.rs
// Public library surface for the demo binary and integration tests.

pub mod clean;
pub mod config;
pub mod error;
pub mod metadata;
pub mod post;
pub mod risk;

// Analyzer contract and the built-in analyzers
pub mod analyze;

pub mod frequency;
pub mod report;
pub mod summarizer;

// Boundaries, observability, sample data
pub mod export;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod sample;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    AnalysisHistory, AnalysisResult, Analyzer, AnalyzerExt, CategoryResult, ContentCategorizer,
    EvalCtx, FrequencyResult, HistoryEntry, ResultKind, StatsAnalyzer, StatsResult,
};
pub use crate::clean::{CleanOutcome, CleanReport, DataCleaner, DropReason};
pub use crate::config::{load_config_default, load_config_from, AnalysisConfig};
pub use crate::error::AnalysisError;
pub use crate::export::{JsonFileSink, MemorySink, SummarySink};
pub use crate::frequency::UserFrequencyTracker;
pub use crate::ingest::{decode_records, JsonFileSource, PostSource, RawBatch, StaticSource};
pub use crate::metadata::{MetadataExtractor, PostMetadata, TimeBucket};
pub use crate::post::{CleanedPost, Post, RawPost};
pub use crate::report::WeeklySummary;
pub use crate::risk::{RiskLevel, RiskWeights};
pub use crate::summarizer::{run_weekly, ReportSummarizer};
