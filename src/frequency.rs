//! Per-author activity, built from categorizer output.
//!
//! Not an `Analyzer`: it composes over results that were already recorded,
//! and a fresh tracker is used for every run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyze::{CategoryResult, FrequencyResult};
use crate::metadata::PostMetadata;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorActivity {
    pub post_count: u64,
    pub categories: BTreeMap<String, u64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub total_engagement: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFrequencyTracker {
    authors: BTreeMap<String, AuthorActivity>,
}

impl UserFrequencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, author: &str, category: &CategoryResult, meta: &PostMetadata) {
        let a = self.authors.entry(author.to_string()).or_default();
        a.post_count += 1;
        *a.categories.entry(category.label.clone()).or_insert(0) += 1;
        a.last_seen = Some(a.last_seen.map_or(meta.created_at, |t| t.max(meta.created_at)));
        a.total_engagement = a.total_engagement.saturating_add(meta.engagement);
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn total_posts(&self) -> u64 {
        self.authors.values().map(|a| a.post_count).sum()
    }

    pub fn activity(&self, author: &str) -> Option<&AuthorActivity> {
        self.authors.get(author)
    }

    /// At most `n` authors, most posts first, ties by author ascending.
    pub fn top_frequent_authors(&self, n: usize) -> Vec<(String, u64)> {
        let mut v: Vec<(String, u64)> = self
            .authors
            .iter()
            .map(|(k, a)| (k.clone(), a.post_count))
            .collect();
        // BTreeMap iteration is already by author; a stable sort keeps that on ties.
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v.truncate(n);
        v
    }

    /// Like [`top_frequent_authors`](Self::top_frequent_authors), by total engagement.
    pub fn top_influential_authors(&self, n: usize) -> Vec<(String, i64)> {
        let mut v: Vec<(String, i64)> = self
            .authors
            .iter()
            .map(|(k, a)| (k.clone(), a.total_engagement))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v.truncate(n);
        v
    }

    /// Herfindahl index of per-author post shares: 1.0 for a single author,
    /// 1/k for k equally active authors, 0.0 when empty.
    pub fn author_concentration(&self) -> f64 {
        crate::risk::herfindahl(self.authors.values().map(|a| a.post_count))
    }

    /// Fraction of `author`'s posts that landed in one of `risk_labels`.
    pub fn risk_share(&self, author: &str, risk_labels: &[String]) -> f64 {
        match self.authors.get(author) {
            Some(a) if a.post_count > 0 => {
                let risky: u64 = risk_labels
                    .iter()
                    .filter_map(|l| a.categories.get(l))
                    .sum();
                risky as f64 / a.post_count as f64
            }
            _ => 0.0,
        }
    }

    /// Fold another partition into this one.
    pub fn merge(&mut self, other: UserFrequencyTracker) {
        for (author, theirs) in other.authors {
            let mine = self.authors.entry(author).or_default();
            mine.post_count += theirs.post_count;
            for (label, n) in theirs.categories {
                *mine.categories.entry(label).or_insert(0) += n;
            }
            mine.last_seen = match (mine.last_seen, theirs.last_seen) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            mine.total_engagement = mine.total_engagement.saturating_add(theirs.total_engagement);
        }
    }

    pub fn to_result(&self) -> FrequencyResult {
        FrequencyResult {
            counts: self
                .authors
                .iter()
                .map(|(k, a)| (k.clone(), a.post_count))
                .collect(),
        }
    }
}
