use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::temporal;

/// One of the selectable moods, with the 1..=5 score stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodOption {
    pub name: &'static str,
    pub legacy_name: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    pub score: i32,
}

pub const MOOD_OPTIONS: [MoodOption; 5] = [
    MoodOption { name: "Happy", legacy_name: "Radosny", emoji: "😊", color: "mood-happy", score: 5 },
    MoodOption { name: "Calm", legacy_name: "Spokojny", emoji: "😌", color: "mood-calm", score: 4 },
    MoodOption { name: "Neutral", legacy_name: "Neutralny", emoji: "😐", color: "mood-neutral", score: 3 },
    MoodOption { name: "Sad", legacy_name: "Smutny", emoji: "😔", color: "mood-sad", score: 2 },
    MoodOption { name: "Stressed", legacy_name: "Zestresowany", emoji: "😰", color: "mood-stressed", score: 1 },
];

const NEUTRAL_SCORE: i32 = 3;

pub fn find_option(name: &str) -> Option<&'static MoodOption> {
    MOOD_OPTIONS.iter().find(|m| {
        m.name.eq_ignore_ascii_case(name) || m.legacy_name.eq_ignore_ascii_case(name)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: String,
    pub mood: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, with = "temporal::opt_day")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub timestamp: i64,
}

impl MoodEntry {
    pub fn new(option: &MoodOption, note: Option<String>) -> Self {
        Self {
            id: super::new_id(),
            mood: option.name.to_string(),
            emoji: option.emoji.to_string(),
            color: option.color.to_string(),
            note: note.filter(|n| !n.trim().is_empty()),
            date: Some(temporal::today()),
            timestamp: temporal::now_millis(),
        }
    }

    /// Unknown moods count as neutral.
    pub fn score(&self) -> i32 {
        find_option(&self.mood).map_or(NEUTRAL_SCORE, |m| m.score)
    }

    /// Calendar day of the entry, falling back to the timestamp for records
    /// whose date string could not be read.
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.or_else(|| {
            chrono::DateTime::from_timestamp_millis(self.timestamp)
                .map(|dt| dt.with_timezone(&chrono::Local).date_naive())
        })
    }
}

/// Summary of the entries recorded in the last seven days.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyMood {
    pub average: f64,
    /// Newest score minus oldest score; zero with fewer than two entries.
    pub trend: i32,
    pub count: usize,
}

/// `entries` are newest first, as persisted.
pub fn weekly_stats(entries: &[MoodEntry], now_millis: i64) -> Option<WeeklyMood> {
    const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;
    let scores: Vec<i32> = entries
        .iter()
        .filter(|e| e.timestamp > now_millis - WEEK_MS)
        .map(MoodEntry::score)
        .collect();
    if scores.is_empty() {
        return None;
    }
    let average = scores.iter().sum::<i32>() as f64 / scores.len() as f64;
    let trend = if scores.len() >= 2 {
        scores[0] - scores[scores.len() - 1]
    } else {
        0
    };
    Some(WeeklyMood { average, trend, count: scores.len() })
}
