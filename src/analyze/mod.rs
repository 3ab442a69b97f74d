// src/analyze/mod.rs
//! Analyzer contract shared by every analysis variant.
//!
//! Implementors provide `evaluate` plus access to their own history.
//! Callers go through [`AnalyzerExt::analyze`], which is blanket-implemented
//! and therefore cannot be overridden: every successful call records exactly
//! one history entry, and a result of the wrong kind is rejected before
//! anything is recorded. `evaluate` takes an [`EvalCtx`], which only
//! `analyze` can build, so a result never leaves an analyzer unrecorded.

pub mod category;
pub mod history;
pub(crate) mod phrase;
pub mod result;
pub mod stats;
pub mod tone;

use crate::error::AnalysisError;
use crate::metadata::PostMetadata;
use crate::post::CleanedPost;

// Re-export convenient types.
pub use crate::analyze::category::ContentCategorizer;
pub use crate::analyze::history::{AnalysisHistory, HistoryEntry};
pub use crate::analyze::result::{
    AnalysisResult, CategoryResult, FrequencyResult, ResultKind, StatsResult, UNCATEGORIZED,
};
pub use crate::analyze::stats::StatsAnalyzer;
pub use crate::analyze::tone::{ToneScore, ToneScorer};

/// One post's inputs, handed to [`Analyzer::evaluate`].
pub struct EvalCtx<'a> {
    post: &'a CleanedPost,
    meta: &'a PostMetadata,
}

impl<'a> EvalCtx<'a> {
    pub fn post(&self) -> &'a CleanedPost {
        self.post
    }

    pub fn meta(&self) -> &'a PostMetadata {
        self.meta
    }
}

pub trait Analyzer: Send + Sync {
    /// Stable name used in logs and contract errors.
    fn name(&self) -> &str;

    /// The result variant this analyzer produces.
    fn kind(&self) -> ResultKind;

    /// This instance's history. Must be the same object on every call.
    fn history(&self) -> &AnalysisHistory;

    /// Compute the result for one post. Does not record; runs with this
    /// analyzer's turn held, so state updated here stays in step with history.
    fn evaluate(&self, ctx: &EvalCtx<'_>) -> AnalysisResult;
}

pub trait AnalyzerExt: Analyzer {
    /// Evaluate, check the declared kind, record, return.
    fn analyze(
        &self,
        post: &CleanedPost,
        meta: &PostMetadata,
    ) -> Result<AnalysisResult, AnalysisError> {
        let _turn = self.history().begin();
        let result = self.evaluate(&EvalCtx { post, meta });
        if result.kind() != self.kind() {
            return Err(AnalysisError::contract(
                self.name(),
                format!(
                    "declared {:?} results but produced {:?} for post {}",
                    self.kind(),
                    result.kind(),
                    post.id()
                ),
            ));
        }
        self.history().record(post.id(), result.clone());
        Ok(result)
    }
}

impl<T: Analyzer + ?Sized> AnalyzerExt for T {}
