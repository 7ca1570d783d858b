use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::temporal;

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitToggle {
    Completed,
    Uncompleted,
}

/// State before the first toggle of a day. A second toggle on the same day
/// restores it verbatim, so a toggle pair is always a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SameDayUndo {
    #[serde(with = "temporal::day")]
    pub day: NaiveDate,
    pub completed: bool,
    pub streak: u32,
    #[serde(default, with = "temporal::opt_day")]
    pub last_completed: Option<NaiveDate>,
    #[serde(default, with = "temporal::day_list")]
    pub completion_history: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "non_negative")]
    pub streak: u32,
    #[serde(default, with = "temporal::opt_day", skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<NaiveDate>,
    #[serde(default, with = "temporal::day_list")]
    pub completion_history: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_day_undo: Option<SameDayUndo>,
}

/// Older builds could store a negative or fractional streak.
fn non_negative<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let raw = Option::<f64>::deserialize(d)?.unwrap_or(0.0);
    Ok(raw.clamp(0.0, u32::MAX as f64) as u32)
}

impl Habit {
    pub fn new(name: impl Into<String>, icon_name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            icon_name: icon_name.into(),
            color: color.into(),
            completed: false,
            streak: 0,
            last_completed: None,
            completion_history: Vec::new(),
            same_day_undo: None,
        }
    }

    /// Starter set written on first run.
    pub fn defaults() -> Vec<Self> {
        [
            ("Drink water", "Droplets", "secondary"),
            ("Reading", "Book", "accent"),
            ("Exercise", "Dumbbell", "primary"),
            ("Coffee", "Coffee", "mood-neutral"),
            ("Meditation", "Moon", "mood-calm"),
        ]
        .into_iter()
        .map(|(name, icon, color)| Self::new(name, icon, color))
        .collect()
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.last_completed == Some(day)
    }

    /// Toggle today's completion.
    ///
    /// Completing appends `today` to the history (never twice), continues
    /// the streak when the previous completion was yesterday or the streak
    /// is zero, and otherwise restarts it at 1. Un-completing removes
    /// `today` and decrements the streak, floored at zero.
    pub fn toggle(&mut self, today: NaiveDate) -> HabitToggle {
        if let Some(undo) = self.same_day_undo.take_if(|u| u.day == today) {
            self.completed = undo.completed;
            self.streak = undo.streak;
            self.last_completed = undo.last_completed;
            self.completion_history = undo.completion_history;
            return if self.is_completed_on(today) {
                HabitToggle::Completed
            } else {
                HabitToggle::Uncompleted
            };
        }

        self.dedup_history();
        self.same_day_undo = Some(SameDayUndo {
            day: today,
            completed: self.completed,
            streak: self.streak,
            last_completed: self.last_completed,
            completion_history: self.completion_history.clone(),
        });

        self.completion_history.retain(|d| *d != today);

        if self.is_completed_on(today) {
            self.streak = self.streak.saturating_sub(1);
            self.completed = false;
            // Fall back to the latest earlier completion so tomorrow's
            // continuation check does not read today.
            self.last_completed = self
                .completion_history
                .iter()
                .filter(|d| **d < today)
                .max()
                .copied();
            HabitToggle::Uncompleted
        } else {
            self.completion_history.push(today);
            let yesterday = today.pred_opt();
            if self.streak == 0 || (yesterday.is_some() && self.last_completed == yesterday) {
                self.streak = self.streak.saturating_add(1);
            } else {
                self.streak = 1;
            }
            self.last_completed = Some(today);
            self.completed = true;
            HabitToggle::Completed
        }
    }

    /// Day-boundary sweep: the display flag follows `last_completed`.
    /// Streak and history are left alone.
    pub fn daily_reset(&mut self, today: NaiveDate) {
        self.completed = self.is_completed_on(today);
        if self.same_day_undo.as_ref().is_some_and(|u| u.day != today) {
            self.same_day_undo = None;
        }
    }

    fn dedup_history(&mut self) {
        let mut seen = BTreeSet::new();
        self.completion_history.retain(|d| seen.insert(*d));
    }

    fn distinct_days(&self) -> BTreeSet<NaiveDate> {
        self.completion_history.iter().copied().collect()
    }

    /// Percentage of the trailing seven days (today included) with a
    /// completion.
    pub fn weekly_completion(&self, today: NaiveDate) -> u32 {
        let start = today - chrono::Duration::days(6);
        let count = self
            .distinct_days()
            .iter()
            .filter(|d| **d >= start && **d <= today)
            .count();
        percentage(count, 7)
    }

    /// Percentage of the days of `month` with a completion.
    pub fn monthly_completion(&self, year: i32, month: u32) -> u32 {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return 0;
        };
        let days_in_month = first
            .checked_add_months(chrono::Months::new(1))
            .map(|next| (next - first).num_days() as usize)
            .unwrap_or(31);
        let count = self
            .distinct_days()
            .iter()
            .filter(|d| d.year() == year && d.month() == month)
            .count();
        percentage(count, days_in_month)
    }

    /// Longest run of consecutive days in the history.
    pub fn best_streak(&self) -> u32 {
        let dates: Vec<NaiveDate> = self.distinct_days().into_iter().collect();
        if dates.is_empty() {
            return 0;
        }
        let mut best = 0u32;
        let mut current = 1u32;
        for window in dates.windows(2) {
            let diff = (window[1] - window[0]).num_days();
            if diff == 1 {
                current += 1;
            } else {
                best = best.max(current);
                current = 1;
            }
        }
        best.max(current)
    }
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}
