// src/clean.rs
//! Data cleaner: raw records in, `CleanedPost` or a counted drop out.
//!
//! Nothing in here returns an error. A record that cannot become a post is a
//! drop with a reason, so one bad record never aborts a batch.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;

use crate::post::{CleanedPost, Post, RawPost};

/// Why a record did not make it past cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Could not be shaped into a `Post` (the text is the error message).
    Malformed(String),
    /// Nothing left after stripping.
    Empty,
    /// Only links, punctuation, digits or emoji left.
    NonLinguistic,
    /// Moderation placeholders such as `[deleted]`.
    Removed,
    /// Same id already kept earlier in this run.
    DuplicateId,
}

impl DropReason {
    pub fn key(&self) -> &'static str {
        match self {
            DropReason::Malformed(_) => "malformed",
            DropReason::Empty => "empty",
            DropReason::NonLinguistic => "non_linguistic",
            DropReason::Removed => "removed",
            DropReason::DuplicateId => "duplicate_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanOutcome {
    Kept(CleanedPost),
    Dropped(DropReason),
}

/// Kept posts in input order plus drop counts keyed by [`DropReason::key`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    #[serde(skip)]
    pub kept: Vec<CleanedPost>,
    pub dropped: BTreeMap<String, usize>,
}

impl CleanReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// One cleaner per run: it remembers ids to keep them unique.
#[derive(Debug, Default)]
pub struct DataCleaner {
    seen_ids: HashSet<String>,
}

impl DataCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clean(&mut self, raw: &RawPost) -> CleanOutcome {
        let post = match Post::from_raw(raw) {
            Ok(p) => p,
            Err(e) => return CleanOutcome::Dropped(DropReason::Malformed(e.to_string())),
        };

        let trimmed = post.text.trim();
        if trimmed.is_empty() {
            return CleanOutcome::Dropped(DropReason::Empty);
        }
        if matches!(trimmed, "[deleted]" | "[removed]") {
            return CleanOutcome::Dropped(DropReason::Removed);
        }

        let normalized = normalize_text(&post.text);
        if normalized.is_empty() {
            return CleanOutcome::Dropped(DropReason::Empty);
        }
        if !normalized.chars().any(char::is_alphabetic) {
            return CleanOutcome::Dropped(DropReason::NonLinguistic);
        }

        if !self.seen_ids.insert(post.id.clone()) {
            return CleanOutcome::Dropped(DropReason::DuplicateId);
        }

        CleanOutcome::Kept(CleanedPost::new(post, normalized))
    }

    pub fn clean_batch<'a, I>(&mut self, raws: I) -> CleanReport
    where
        I: IntoIterator<Item = &'a RawPost>,
    {
        let mut report = CleanReport::default();
        for raw in raws {
            match self.clean(raw) {
                CleanOutcome::Kept(p) => report.kept.push(p),
                CleanOutcome::Dropped(reason) => {
                    tracing::debug!(
                        target: "pipeline",
                        id = raw.id.as_deref().unwrap_or("?"),
                        reason = reason.key(),
                        "record dropped"
                    );
                    *report.dropped.entry(reason.key().to_string()).or_insert(0) += 1;
                }
            }
        }
        report
    }
}

fn regex(cell: &'static OnceCell<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static cleaner regex"))
}

/// Normalize post text: decode entities, strip HTML and markdown, drop URLs
/// and control characters, lowercase, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_MD_LINK: OnceCell<Regex> = OnceCell::new();
    static RE_URL: OnceCell<Regex> = OnceCell::new();
    static RE_LINE_MARKERS: OnceCell<Regex> = OnceCell::new();
    static RE_EMPHASIS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    // 1) HTML entity decode (twice: reddit bodies arrive double-escaped)
    let once = html_escape::decode_html_entities(s).to_string();
    let mut out = html_escape::decode_html_entities(&once).to_string();

    // 2) Strip HTML tags
    out = regex(&RE_TAGS, r"(?is)</?[a-z!][^>]*>")
        .replace_all(&out, " ")
        .to_string();

    // 3) Markdown links keep their label; images and bare URLs go away
    out = regex(&RE_MD_LINK, r"!?\[([^\]]*)\]\([^)]*\)")
        .replace_all(&out, "$1")
        .to_string();
    out = regex(&RE_URL, r"(?i)\b(?:https?://|www\.)\S+")
        .replace_all(&out, " ")
        .to_string();

    // 4) Line-leading markers: headings, quotes, list bullets
    out = regex(&RE_LINE_MARKERS, r"(?m)^\s*(?:#{1,6}|>+|[-*+])\s+")
        .replace_all(&out, "")
        .to_string();

    // 5) Emphasis / code / strikethrough / spoiler markers
    out = regex(&RE_EMPHASIS, r"(\*{1,3}|_{2,3}|~~|`+|>!|!<)")
        .replace_all(&out, "")
        .to_string();

    // 6) Normalize curly quotes, drop control chars, lowercase
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    out = out
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .to_lowercase();

    // 7) Collapse whitespace
    out = regex(&RE_WS, r"\s+").replace_all(&out, " ").to_string();
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::RawTimestamp;

    fn raw(id: &str, text: &str) -> RawPost {
        RawPost {
            id: Some(id.into()),
            author: Some("terp".into()),
            text: Some(text.into()),
            created_at: Some(RawTimestamp::Text("2025-09-01".into())),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_strips_markup_and_collapses() {
        let s = "<p>Hello&nbsp;<b>World</b></p>\n\n**Bold** and [a link](https://x.test)   \t`code`";
        assert_eq!(normalize_text(s), "hello world bold and a link code");
    }

    #[test]
    fn normalize_handles_double_escaped_entities() {
        assert_eq!(normalize_text("&amp;gt; quoted"), "quoted");
        assert_eq!(normalize_text("Fish &amp;amp; chips"), "fish & chips");
    }

    #[test]
    fn normalize_strips_control_chars() {
        assert_eq!(normalize_text("a\u{0007}b\u{0000}C"), "a b c");
    }

    #[test]
    fn url_only_post_is_dropped() {
        let mut c = DataCleaner::new();
        assert_eq!(
            c.clean(&raw("p1", "https://example.com/thing")),
            CleanOutcome::Dropped(DropReason::Empty)
        );
        assert_eq!(
            c.clean(&raw("p2", "!!! 123 :) https://example.com")),
            CleanOutcome::Dropped(DropReason::NonLinguistic)
        );
    }

    #[test]
    fn whitespace_and_placeholders_are_dropped() {
        let mut c = DataCleaner::new();
        assert_eq!(
            c.clean(&raw("p1", "   \n\t ")),
            CleanOutcome::Dropped(DropReason::Empty)
        );
        assert_eq!(
            c.clean(&raw("p2", "[removed]")),
            CleanOutcome::Dropped(DropReason::Removed)
        );
    }

    #[test]
    fn duplicate_ids_are_dropped_after_first() {
        let mut c = DataCleaner::new();
        let batch = vec![raw("p1", "first"), raw("p1", "second"), raw("p2", "third")];
        let report = c.clean_batch(&batch);
        assert_eq!(report.kept.len(), 2);
        assert_eq!(report.kept[0].text(), "first");
        assert_eq!(report.dropped.get("duplicate_id"), Some(&1));
        assert_eq!(report.dropped_count(), 1);
    }

    #[test]
    fn malformed_records_are_counted_not_errors() {
        let mut c = DataCleaner::new();
        let mut bad = raw("p1", "text");
        bad.created_at = None;
        let report = c.clean_batch([&bad, &raw("p2", "fine")]);
        assert_eq!(report.kept.len(), 1);
        assert_eq!(report.dropped.get("malformed"), Some(&1));
    }
}
