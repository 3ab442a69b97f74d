// src/ingest/mod.rs
//! Input boundary: decoding raw post dumps and the `PostSource` seam.
//!
//! Fetching from the forum itself lives outside this crate. What arrives here
//! is JSON; one bad element is counted and skipped, never fatal.

pub mod types;

pub use types::{JsonFileSource, PostSource, StaticSource};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::post::RawPost;

/// Decoded records plus the number of array elements that could not be read
/// as a post at all. `malformed` ends up in the run's `dropped_count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub posts: Vec<RawPost>,
    pub malformed: usize,
}

/// Accepts a bare array, `{"posts": [...]}`, or a listing
/// (`{"data": {"children": [{"data": {...}}]}}`). Anything else is an error.
pub fn decode_records(json: &str) -> Result<RawBatch> {
    let root: Value = serde_json::from_str(json).context("input is not JSON")?;
    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            if let Some(Value::Array(items)) = obj.remove("posts") {
                items
            } else if let Some(children) = obj
                .get_mut("data")
                .and_then(|d| d.get_mut("children"))
                .and_then(Value::as_array_mut)
            {
                std::mem::take(children)
                    .into_iter()
                    .map(|c| match c {
                        Value::Object(mut child) => child.remove("data").unwrap_or(Value::Null),
                        other => other,
                    })
                    .collect()
            } else {
                bail!("expected an array of posts, a `posts` array or a listing");
            }
        }
        _ => bail!("expected an array of posts, a `posts` array or a listing"),
    };

    let mut batch = RawBatch::default();
    for (i, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::debug!(target: "pipeline", index = i, "skipping non-object record");
            batch.malformed += 1;
            continue;
        }
        match serde_json::from_value::<RawPost>(item) {
            Ok(p) => batch.posts.push(p),
            Err(e) => {
                tracing::debug!(target: "pipeline", index = i, error = %e, "undecodable record");
                batch.malformed += 1;
            }
        }
    }
    Ok(batch)
}
