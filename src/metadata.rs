//! Metadata extractor: pure, deterministic per-post facts.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::post::CleanedPost;

/// Where a post falls in time, relative to the semester start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBucket {
    /// Whole weeks since the semester start; negative before it.
    pub week_of_semester: i64,
    pub day_of_week: Weekday,
    pub hour: u32,
}

impl TimeBucket {
    /// Stable key used in maps and metric names (`week_03`, `week_-1`).
    pub fn week_key(&self) -> String {
        format!("week_{:02}", self.week_of_semester)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub post_id: String,
    /// Back-reference to the author by id; the post owns nothing here.
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub token_count: usize,
    pub char_count: usize,
    pub bucket: TimeBucket,
    pub question_marks: usize,
    pub exclamations: usize,
    /// Links in the raw text (the cleaned text no longer has them).
    pub url_count: usize,
    /// Score plus comments, missing counters as zero.
    pub engagement: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataExtractor {
    semester_start: NaiveDate,
}

impl MetadataExtractor {
    pub fn new(semester_start: NaiveDate) -> Self {
        Self { semester_start }
    }

    pub fn semester_start(&self) -> NaiveDate {
        self.semester_start
    }

    pub fn bucket_for(&self, ts: DateTime<Utc>) -> TimeBucket {
        let days = (ts.date_naive() - self.semester_start).num_days();
        TimeBucket {
            week_of_semester: days.div_euclid(7),
            day_of_week: ts.weekday(),
            hour: ts.hour(),
        }
    }

    pub fn extract(&self, post: &CleanedPost) -> PostMetadata {
        let raw = &post.post().text;
        let text = post.text();
        let score = post.post().score.unwrap_or(0);
        let comments = post.post().num_comments.unwrap_or(0);

        PostMetadata {
            post_id: post.id().to_string(),
            author: post.author().to_string(),
            created_at: post.created_at(),
            token_count: post.tokens().len(),
            char_count: text.chars().count(),
            bucket: self.bucket_for(post.created_at()),
            question_marks: text.matches('?').count(),
            exclamations: text.matches('!').count(),
            url_count: count_urls(raw),
            engagement: score.saturating_add(i64::try_from(comments).unwrap_or(i64::MAX)),
        }
    }
}

fn count_urls(raw: &str) -> usize {
    raw.split_whitespace()
        .filter(|w| {
            let w = w.trim_start_matches(['(', '[', '<', '"']);
            w.starts_with("http://") || w.starts_with("https://") || w.starts_with("www.")
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{CleanOutcome, DataCleaner};
    use crate::post::RawPost;
    use chrono::TimeZone;

    fn cleaned(text: &str, ts: DateTime<Utc>) -> CleanedPost {
        let raw = RawPost::new("p1", "terp", text, ts).with_engagement(10, 4);
        match DataCleaner::new().clean(&raw) {
            CleanOutcome::Kept(p) => p,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 25).unwrap()
    }

    #[test]
    fn weeks_are_counted_from_semester_start() {
        let ex = MetadataExtractor::new(start());
        let monday = Utc.with_ymd_and_hms(2025, 8, 25, 9, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2025, 8, 31, 23, 0, 0).unwrap();
        let week3 = Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 8, 24, 12, 0, 0).unwrap();
        assert_eq!(ex.bucket_for(monday).week_of_semester, 0);
        assert_eq!(ex.bucket_for(sunday).week_of_semester, 0);
        assert_eq!(ex.bucket_for(week3).week_of_semester, 3);
        assert_eq!(ex.bucket_for(before).week_of_semester, -1);
        assert_eq!(ex.bucket_for(week3).week_key(), "week_03");
        assert_eq!(ex.bucket_for(monday).day_of_week, Weekday::Mon);
    }

    #[test]
    fn counts_and_engagement() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 2, 14, 30, 0).unwrap();
        let p = cleaned("Is the exam curved?? see https://umd.edu/x wow!", ts);
        let m = MetadataExtractor::new(start()).extract(&p);
        assert_eq!(m.token_count, 6);
        assert_eq!(m.question_marks, 2);
        assert_eq!(m.exclamations, 1);
        assert_eq!(m.url_count, 1);
        assert_eq!(m.engagement, 14);
        assert_eq!(m.bucket.hour, 14);
    }

    #[test]
    fn extraction_is_deterministic() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 2, 14, 30, 0).unwrap();
        let p = cleaned("same input, same output", ts);
        let ex = MetadataExtractor::new(start());
        assert_eq!(ex.extract(&p), ex.extract(&p));
    }
}
