// src/ingest/types.rs
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::{decode_records, RawBatch};
use crate::post::RawPost;

/// Where a week's raw posts come from (forum API client, fixture, archive).
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self) -> Result<RawBatch>;
    fn name(&self) -> &'static str;
}

/// Fixed in-memory batch; used by the demo and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    batch: RawBatch,
}

impl StaticSource {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            batch: RawBatch { posts, malformed: 0 },
        }
    }
}

#[async_trait::async_trait]
impl PostSource for StaticSource {
    async fn fetch_posts(&self) -> Result<RawBatch> {
        Ok(self.batch.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// A JSON dump on disk (array, `{"posts": [...]}` or a listing).
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl PostSource for JsonFileSource {
    async fn fetch_posts(&self) -> Result<RawBatch> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading posts from {}", self.path.display()))?;
        decode_records(&body).with_context(|| format!("decoding {}", self.path.display()))
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}
