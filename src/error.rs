use thiserror::Error;

/// Failures the analysis engine can report.
///
/// Per-post problems (`MalformedInput`) never abort a run: the cleaner turns
/// them into drops. The remaining variants are per-run and fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("malformed input record: {reason}")]
    MalformedInput { reason: String },

    #[error("no posts survived cleaning ({dropped} dropped)")]
    EmptyBatch { dropped: usize },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("analyzer contract violation in `{analyzer}`: {detail}")]
    ContractViolation { analyzer: String, detail: String },
}

impl AnalysisError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn contract(analyzer: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ContractViolation {
            analyzer: analyzer.into(),
            detail: detail.into(),
        }
    }
}
