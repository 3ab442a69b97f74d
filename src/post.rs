//! Post shapes at the input boundary and after cleaning.
//!
//! `RawPost` is the lenient record handed over by the ingestion collaborator.
//! `Post` is the validated shape; `CleanedPost` adds the normalized text and
//! cannot be mutated once built.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Raw record as fetched from the forum API (or a fixture).
///
/// Every field is optional here; validation happens in [`Post::from_raw`].
/// Field names cover both the API shape (`author`, `score`, `num_comments`,
/// `created_utc`, `selftext`) and the sample-data shape (`username`,
/// `upvotes`, `comments`, `timestamp`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub id: Option<String>,
    #[serde(alias = "username")]
    pub author: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub selftext: Option<String>,
    pub created_at: Option<RawTimestamp>,
    pub created_utc: Option<RawTimestamp>,
    pub timestamp: Option<RawTimestamp>,
    #[serde(alias = "upvotes")]
    pub score: Option<i64>,
    #[serde(alias = "comments")]
    pub num_comments: Option<i64>,
    pub url: Option<String>,
}

impl RawPost {
    /// Minimal constructor used by fixtures and the sample generator.
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            author: Some(author.into()),
            text: Some(text.into()),
            created_at: Some(RawTimestamp::Text(created_at.to_rfc3339())),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_engagement(mut self, score: i64, num_comments: i64) -> Self {
        self.score = Some(score);
        self.num_comments = Some(num_comments);
        self
    }

    fn raw_timestamp(&self) -> Option<&RawTimestamp> {
        self.created_at
            .as_ref()
            .or(self.created_utc.as_ref())
            .or(self.timestamp.as_ref())
    }
}

/// Creation time as it appears on the wire: unix seconds or an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Seconds(f64),
    Text(String),
}

impl RawTimestamp {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Seconds(s) => {
                if !s.is_finite() {
                    return None;
                }
                let secs = s.floor();
                let nanos = ((s - secs) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
                DateTime::<Utc>::from_timestamp(secs as i64, nanos)
            }
            RawTimestamp::Text(t) => parse_timestamp_str(t),
        }
    }
}

/// Parse RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) or a bare date.
pub fn parse_timestamp_str(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(n.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// True when `s` is a date or datetime this crate can read.
pub fn is_valid_date_string(s: &str) -> bool {
    parse_timestamp_str(s).is_some()
}

/// Counters must be non-negative; the name ends up in the drop reason.
pub fn validate_non_negative(value: i64, name: &str) -> Result<u64, AnalysisError> {
    u64::try_from(value)
        .map_err(|_| AnalysisError::malformed(format!("{name} must be non-negative, got {value}")))
}

/// Validated post. Engagement counters stay optional: missing is not zero
/// until an analyzer decides so.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub score: Option<i64>,
    pub num_comments: Option<u64>,
}

impl Post {
    /// Validate a raw record. Empty text is allowed here; the cleaner decides
    /// whether anything linguistic is left.
    pub fn from_raw(raw: &RawPost) -> Result<Self, AnalysisError> {
        let id = non_blank(raw.id.as_deref())
            .ok_or_else(|| AnalysisError::malformed("missing post id"))?;
        let author = non_blank(raw.author.as_deref())
            .ok_or_else(|| AnalysisError::malformed(format!("post {id}: missing author")))?;
        let created_at = match raw.raw_timestamp() {
            Some(ts) => ts.to_utc().ok_or_else(|| {
                AnalysisError::malformed(format!("post {id}: unreadable timestamp {ts:?}"))
            })?,
            None => return Err(AnalysisError::malformed(format!("post {id}: missing timestamp"))),
        };
        let num_comments = raw
            .num_comments
            .map(|c| validate_non_negative(c, "num_comments"))
            .transpose()?;

        let body = raw.text.as_deref().or(raw.selftext.as_deref()).unwrap_or("");
        let text = match raw.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) if !body.trim().is_empty() => format!("{title}\n{body}"),
            Some(title) => title.to_string(),
            None => body.to_string(),
        };

        Ok(Self {
            id: id.to_string(),
            author: author.to_string(),
            text,
            created_at,
            score: raw.score,
            num_comments,
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// A post whose text went through normalization. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPost {
    post: Post,
    normalized: String,
}

impl CleanedPost {
    pub(crate) fn new(post: Post, normalized: String) -> Self {
        debug_assert!(!normalized.is_empty());
        Self { post, normalized }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn id(&self) -> &str {
        &self.post.id
    }

    pub fn author(&self) -> &str {
        &self.post.author
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.post.created_at
    }

    /// Lowercased, markup-free, whitespace-collapsed text.
    pub fn text(&self) -> &str {
        &self.normalized
    }

    pub fn tokens(&self) -> Vec<&str> {
        tokenize(&self.normalized).collect()
    }
}

/// Word tokens: alphanumeric runs, apostrophes kept inside words (`can't`).
pub fn tokenize(s: &str) -> impl Iterator<Item = &str> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
}
