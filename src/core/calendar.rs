use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::temporal::{self, TimeOfDay};

/// A plan entry pinned to a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "temporal::day")]
    pub date: NaiveDate,
    #[serde(default = "default_time_of_day")]
    pub time_of_day: TimeOfDay,
}

fn default_time_of_day() -> TimeOfDay {
    TimeOfDay::Morning
}

impl CalendarEntry {
    pub fn new(text: impl Into<String>, date: NaiveDate, time_of_day: TimeOfDay) -> Self {
        Self {
            id: super::new_id(),
            text: text.into(),
            completed: false,
            date,
            time_of_day,
        }
    }
}

pub fn entries_for_day(entries: &[CalendarEntry], day: NaiveDate) -> Vec<&CalendarEntry> {
    let mut found: Vec<&CalendarEntry> = entries.iter().filter(|e| e.date == day).collect();
    found.sort_by_key(|e| e.time_of_day);
    found
}
