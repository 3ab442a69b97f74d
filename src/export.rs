// src/export.rs
//! Output boundary: where finished summaries go.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

use crate::report::WeeklySummary;

#[async_trait::async_trait]
pub trait SummarySink: Send + Sync {
    async fn publish(&self, summary: &WeeklySummary) -> Result<()>;
}

/// Keeps every published summary; for tests and the demo.
#[derive(Debug, Default)]
pub struct MemorySink {
    published: Mutex<Vec<WeeklySummary>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<WeeklySummary> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl SummarySink for MemorySink {
    async fn publish(&self, summary: &WeeklySummary) -> Result<()> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(summary.clone());
        Ok(())
    }
}

/// Writes the summary as pretty JSON to a fixed path, replacing it.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SummarySink for JsonFileSink {
    async fn publish(&self, summary: &WeeklySummary) -> Result<()> {
        let body = summary.to_json().context("serializing weekly summary")?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing summary to {}", self.path.display()))
    }
}
