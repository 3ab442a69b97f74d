//! Seeded sample data for the demo binary and tests.
//!
//! Same seed and anchor, same posts. Nothing here reads the clock.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::post::RawPost;

pub const USERNAMES: &[&str] = &[
    "terp_student",
    "umd_alum",
    "testudo_fan",
    "study_buddy",
    "campus_explorer",
    "dining_critic",
    "game_watcher",
    "library_regular",
    "class_helper",
    "advice_seeker",
    "news_poster",
    "event_organizer",
];

pub const TOPICS: &[&str] = &[
    "dining hall",
    "testudo",
    "mckeldin",
    "stamp",
    "parking",
    "dorm",
    "schedule",
    "registration",
    "tuition",
    "football",
    "basketball",
    "housing",
    "library",
    "gym",
    "campus",
];

/// One keyword per seed category, used to make mixed posts land somewhere.
const CATEGORY_HOOKS: &[&str] = &[
    "lol", "idk", "announcement", "exam", "tips", "party", "midterm", "homecoming",
];

const MISINFORMATION_HOOKS: &[&str] = &[
    "rumor",
    "unconfirmed",
    "heard",
    "confirmed??",
    "sources say",
    "reportedly",
    "breaking",
    "shocking",
    "can't believe",
    "conspiracy",
    "fake news",
    "scam",
    "hoax",
    "allegedly",
];

pub struct SampleGenerator {
    rng: StdRng,
    next_id: u64,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_id: 1,
        }
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.rng.random_range(0..items.len())]
    }

    fn build(&mut self, author: &str, title: &str, text: &str, at: DateTime<Utc>) -> RawPost {
        let id = format!("t3_{:06}", self.next_id);
        self.next_id += 1;
        let score = self.rng.random_range(0..=100);
        let comments = self.rng.random_range(0..=50);
        let mut post = RawPost::new(id, author, text, at)
            .with_title(title)
            .with_engagement(score, comments);
        post.url = Some(format!(
            "https://reddit.com/r/UMD/post_{}",
            self.rng.random_range(1000..10000)
        ));
        post
    }

    /// Generic campus post by a random author.
    pub fn sample_post(&mut self, at: DateTime<Utc>) -> RawPost {
        let author = self.pick(USERNAMES);
        let title = format!("Sample post about {}", self.pick(TOPICS));
        let text = format!(
            "This is a sample post discussing {}. What do you all think?",
            self.pick(TOPICS)
        );
        self.build(author, &title, &text, at)
    }

    /// Post that mentions one category keyword and one campus topic.
    pub fn mixed_post(&mut self, at: DateTime<Utc>) -> RawPost {
        let author = self.pick(USERNAMES);
        let hook = self.pick(CATEGORY_HOOKS);
        let topic = self.pick(TOPICS);
        self.build(author, "Quick one", &format!("Post about {hook} and {topic}"), at)
    }

    pub fn academic_post(&mut self, at: DateTime<Utc>) -> RawPost {
        let title = self.pick(&[
            "CMSC351 exam tips?",
            "Best study spot on campus?",
            "Professor recommendations for INST326?",
            "Finals week schedule help",
        ]);
        let text = self.pick(&[
            "Anyone have advice for the upcoming midterm?",
            "Looking for a quiet place to study this week",
            "Which professor would you recommend?",
            "How are you all managing your finals schedule?",
        ]);
        let author = self.pick(USERNAMES);
        self.build(author, title, text, at)
    }

    pub fn humor_post(&mut self, at: DateTime<Utc>) -> RawPost {
        let title = self.pick(&[
            "Dining hall food hits different at 2am lol",
            "When you see Testudo on the way to your exam haha",
            "Me trying to find parking be like...",
            "POV: You forgot about your project due at midnight",
        ]);
        let author = self.pick(USERNAMES);
        self.build(author, title, "lol this is so funny", at)
    }

    pub fn misinformation_post(&mut self, at: DateTime<Utc>) -> RawPost {
        let title = self.pick(&[
            "BREAKING: Unconfirmed reports about campus",
            "Rumor: Huge announcement coming soon",
            "I heard from sources that...",
            "Allegedly something shocking happened",
        ]);
        let text = format!("{} about campus news", self.pick(MISINFORMATION_HOOKS));
        let author = self.pick(USERNAMES);
        self.build(author, title, &text, at)
    }

    /// Several posts by one author, one day apart going back from `end`.
    pub fn user_posts(&mut self, author: &str, count: usize, end: DateTime<Utc>) -> Vec<RawPost> {
        (0..count)
            .map(|i| {
                let at = end - Duration::days(i as i64);
                let title = format!("Sample post about {}", self.pick(TOPICS));
                let text = format!("Thoughts on {}?", self.pick(TOPICS));
                self.build(author, &title, &text, at)
            })
            .collect()
    }

    /// Seven days ending at `end`, 2..=5 posts a day, a mix of every kind.
    pub fn weekly_posts(&mut self, end: DateTime<Utc>) -> Vec<RawPost> {
        let mut out = Vec::new();
        for day in 0..7 {
            let date = end - Duration::days(day);
            for _ in 0..self.rng.random_range(2..=5) {
                let at = date - Duration::hours(self.rng.random_range(0..12));
                let post = match self.rng.random_range(0..10) {
                    0..=2 => self.mixed_post(at),
                    3..=4 => self.academic_post(at),
                    5 => self.humor_post(at),
                    6 => self.misinformation_post(at),
                    _ => self.sample_post(at),
                };
                out.push(post);
            }
        }
        out
    }

    /// Fifteen weeks starting at `start`, 10..=30 posts a week.
    pub fn semester_posts(&mut self, start: DateTime<Utc>) -> Vec<RawPost> {
        let mut out = Vec::new();
        for week in 0..15 {
            let week_start = start + Duration::weeks(week);
            for _ in 0..self.rng.random_range(10..=30) {
                let at = week_start + Duration::days(self.rng.random_range(0..7));
                out.push(self.mixed_post(at));
            }
        }
        out
    }
}
