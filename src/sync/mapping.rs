//! Local records to remote rows. Every row carries the owner's `user_id`.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::activity::Activity;
use crate::core::brain_dump::BrainDumpEntry;
use crate::core::calendar::CalendarEntry;
use crate::core::day_plan::{DayPlanRecord, PlanItem};
use crate::core::habit::Habit;
use crate::core::mood::MoodEntry;
use crate::core::note::Note;
use crate::core::shopping::{ShoppingItem, ShoppingList};
use crate::core::task::Task;
use crate::core::temporal::{self, TimeOfDay};
use crate::store::Collection;
use crate::store::repository::parse_record;

pub const DEFAULT_NOTE_COLOR: &str = "yellow";
pub const DEFAULT_HABIT_COLOR: &str = "blue";
pub const DEFAULT_LIST_NAME: &str = "Shopping list";

/// Remote tables written by the migration, in insert order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Notes,
    Tasks,
    Habits,
    HabitCompletions,
    MoodEntries,
    Activities,
    ShoppingLists,
    DailyPlans,
    BrainDumps,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Tasks => "tasks",
            Self::Habits => "habits",
            Self::HabitCompletions => "habit_completions",
            Self::MoodEntries => "mood_entries",
            Self::Activities => "activities",
            Self::ShoppingLists => "shopping_lists",
            Self::DailyPlans => "daily_plans",
            Self::BrainDumps => "brain_dumps",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn typed<'a, T: serde::de::DeserializeOwned>(
    collection: Collection,
    records: &'a [Value],
) -> impl Iterator<Item = (&'a Value, T)> + 'a {
    records
        .iter()
        .filter_map(move |raw| parse_record(collection, raw.clone()).map(|t| (raw, t)))
}

fn raw_str<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRow {
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub color: String,
    pub date: Option<String>,
    pub ai_expanded: Option<String>,
}

pub fn note_rows(records: &[Value], user_id: &str) -> Vec<NoteRow> {
    typed::<Note>(Collection::Notes, records)
        .map(|(raw, note)| NoteRow {
            user_id: user_id.to_string(),
            title: note.title,
            content: note.content,
            tags: note.tags,
            color: raw_str(raw, "color").unwrap_or(DEFAULT_NOTE_COLOR).to_string(),
            date: note.date.map(temporal::format_day),
            ai_expanded: note.ai_expanded,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub user_id: String,
    pub text: String,
    pub completed: bool,
    pub priority: String,
    pub due_date: Option<String>,
    pub category: String,
}

pub fn task_rows(records: &[Value], user_id: &str) -> Vec<TaskRow> {
    typed::<Task>(Collection::Tasks, records)
        .map(|(_, task)| TaskRow {
            user_id: user_id.to_string(),
            text: task.title,
            completed: task.completed,
            priority: task.priority.as_str().to_string(),
            due_date: task.deadline.map(temporal::format_day),
            category: task.category.as_str().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitRow {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub target_frequency: u32,
    pub frequency_type: String,
}

/// Habit rows paired with the local habit each one came from, in the
/// order they will be sent.
pub fn habit_rows(records: &[Value], user_id: &str) -> Vec<(Habit, HabitRow)> {
    typed::<Habit>(Collection::Habits, records)
        .map(|(_, habit)| {
            let row = HabitRow {
                user_id: user_id.to_string(),
                name: habit.name.clone(),
                description: None,
                color: if habit.color.is_empty() {
                    DEFAULT_HABIT_COLOR.to_string()
                } else {
                    habit.color.clone()
                },
                target_frequency: 1,
                frequency_type: "daily".to_string(),
            };
            (habit, row)
        })
        .collect()
}

/// `habit-completions` record written by older builds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCompletion {
    #[serde(alias = "habit_id")]
    habit_id: String,
    #[serde(default, alias = "completedDate", with = "temporal::opt_day")]
    date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HabitCompletionRow {
    pub user_id: String,
    pub habit_id: String,
    pub completed_date: String,
}

/// Completions from every habit's history plus the legacy records,
/// re-keyed to remote habit ids. Completions whose habit has no remote id
/// are dropped.
pub fn habit_completion_rows(
    habits: &[Habit],
    legacy: &[Value],
    remote_ids: &HashMap<String, String>,
    user_id: &str,
) -> Vec<HabitCompletionRow> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut push = |local_id: &str, day: NaiveDate| {
        let Some(remote_id) = remote_ids.get(local_id) else {
            log::debug!("Dropping completion of unmigrated habit {}", local_id);
            return;
        };
        let row = HabitCompletionRow {
            user_id: user_id.to_string(),
            habit_id: remote_id.clone(),
            completed_date: temporal::format_day(day),
        };
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    };

    for habit in habits {
        for day in &habit.completion_history {
            push(&habit.id, *day);
        }
    }
    for raw in legacy {
        match serde_json::from_value::<LegacyCompletion>(raw.clone()) {
            Ok(LegacyCompletion { habit_id, date: Some(day) }) => push(&habit_id, day),
            Ok(_) => log::warn!("Skipping habit completion without a date"),
            Err(e) => log::warn!("Skipping unreadable habit completion: {}", e),
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodRow {
    pub user_id: String,
    pub mood: i32,
    pub note: Option<String>,
    pub date: Option<String>,
}

pub fn mood_rows(records: &[Value], user_id: &str) -> Vec<MoodRow> {
    typed::<MoodEntry>(Collection::Mood, records)
        .map(|(_, entry)| MoodRow {
            user_id: user_id.to_string(),
            mood: entry.score(),
            date: entry.day().map(temporal::format_day),
            note: entry.note,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRow {
    pub user_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
}

pub fn activity_rows(records: &[Value], user_id: &str) -> Vec<ActivityRow> {
    typed::<Activity>(Collection::Activities, records)
        .map(|(_, a)| ActivityRow {
            user_id: user_id.to_string(),
            text: a.text,
            kind: a.kind.as_str().to_string(),
            timestamp: a.timestamp.to_rfc3339(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListRow {
    pub user_id: String,
    pub name: String,
    pub items: Vec<ShoppingItem>,
}

pub fn shopping_rows(records: &[Value], user_id: &str) -> Vec<ShoppingListRow> {
    typed::<ShoppingList>(Collection::Shopping, records)
        .map(|(_, list)| ShoppingListRow {
            user_id: user_id.to_string(),
            name: if list.name.trim().is_empty() {
                DEFAULT_LIST_NAME.to_string()
            } else {
                list.name
            },
            items: list.items,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyPlanRow {
    pub user_id: String,
    pub date: String,
    pub morning_routine: Option<String>,
    pub main_tasks: Option<String>,
    pub evening_routine: Option<String>,
    pub goals: Option<String>,
    pub notes: Option<String>,
}

fn append_line(field: &mut Option<String>, line: &str) {
    match field {
        Some(existing) if !existing.is_empty() => {
            existing.push('\n');
            existing.push_str(line);
        }
        _ => *field = Some(line.to_string()),
    }
}

fn bucket_field(row: &mut DailyPlanRow, time: Option<TimeOfDay>) -> &mut Option<String> {
    match time {
        Some(TimeOfDay::Morning) => &mut row.morning_routine,
        Some(TimeOfDay::Evening) => &mut row.evening_routine,
        Some(TimeOfDay::Afternoon) | None => &mut row.main_tasks,
    }
}

fn row_for<'a>(by_day: &'a mut BTreeMap<NaiveDate, DailyPlanRow>, day: NaiveDate, user_id: &str) -> &'a mut DailyPlanRow {
    by_day.entry(day).or_insert_with(|| DailyPlanRow {
        user_id: user_id.to_string(),
        date: temporal::format_day(day),
        ..Default::default()
    })
}

/// One row per date from the legacy per-date object, today's manual plan
/// items and the calendar entries, in that order.
pub fn daily_plan_rows(
    legacy: Option<&serde_json::Map<String, Value>>,
    plan_items: &[Value],
    calendar: &[Value],
    today: NaiveDate,
    user_id: &str,
) -> Vec<DailyPlanRow> {
    let mut by_day: BTreeMap<NaiveDate, DailyPlanRow> = BTreeMap::new();

    for (key, value) in legacy.into_iter().flatten() {
        let Some(day) = temporal::parse_day(key) else {
            log::warn!("Skipping daily plan with unreadable date {:?}", key);
            continue;
        };
        let record: DayPlanRecord = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable daily plan for {}: {}", key, e);
                continue;
            }
        };
        let row = row_for(&mut by_day, day, user_id);
        row.morning_routine = record.morning_routine;
        row.main_tasks = record.main_tasks;
        row.evening_routine = record.evening_routine;
        row.goals = record.goals;
        row.notes = record.notes;
    }

    for (_, item) in typed::<PlanItem>(Collection::DailyPlan, plan_items) {
        if item.source.is_derived() {
            continue;
        }
        append_line(bucket_field(row_for(&mut by_day, today, user_id), item.time), &item.text);
    }

    for (_, entry) in typed::<CalendarEntry>(Collection::Calendar, calendar) {
        append_line(bucket_field(row_for(&mut by_day, entry.date, user_id), Some(entry.time_of_day)), &entry.text);
    }

    by_day.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrainDumpRow {
    pub user_id: String,
    pub content: String,
}

pub fn brain_dump_rows(records: &[Value], user_id: &str) -> Vec<BrainDumpRow> {
    typed::<BrainDumpEntry>(Collection::BrainDump, records)
        .map(|(_, d)| BrainDumpRow {
            user_id: user_id.to_string(),
            content: d.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn note_and_task_defaults() {
        let notes = note_rows(&[json!({"id": "1", "title": "t", "content": "c"})], "u");
        assert_eq!(notes[0].color, DEFAULT_NOTE_COLOR);
        assert!(notes[0].tags.is_empty());

        let tasks = task_rows(&[json!({"id": "1", "text": "legacy", "dueDate": "2026-10-20"})], "u");
        assert_eq!(tasks[0].text, "legacy");
        assert_eq!(tasks[0].priority, "medium");
        assert_eq!(tasks[0].due_date.as_deref(), Some("2026-10-20"));
    }

    #[test]
    fn mood_becomes_score() {
        let rows = mood_rows(
            &[json!({"id": "1", "mood": "Spokojny", "date": "19.10.2026", "timestamp": 0})],
            "u",
        );
        assert_eq!(rows[0].mood, 4);
        assert_eq!(rows[0].date.as_deref(), Some("2026-10-19"));
    }

    #[test]
    fn completions_rekeyed_and_deduplicated() {
        let mut habit = Habit::new("Read", "Book", "");
        habit.id = "local-1".into();
        habit.completion_history = vec![day(2026, 10, 18), day(2026, 10, 19)];
        let legacy = vec![
            json!({"habitId": "local-1", "date": "2026-10-19"}),
            json!({"habitId": "local-1", "completedDate": "2026-10-10"}),
            json!({"habitId": "unknown", "date": "2026-10-10"}),
        ];
        let remote: HashMap<String, String> = [("local-1".to_string(), "r-1".to_string())].into();

        let rows = habit_completion_rows(&[habit], &legacy, &remote, "u");
        let dates: Vec<&str> = rows.iter().map(|r| r.completed_date.as_str()).collect();
        assert_eq!(dates, vec!["2026-10-18", "2026-10-19", "2026-10-10"]);
        assert!(rows.iter().all(|r| r.habit_id == "r-1"));
    }

    #[test]
    fn daily_plans_group_by_date_and_bucket() {
        let legacy = json!({"2026-10-01": {"morningRoutine": "Run", "goals": "Ship"}});
        let items = vec![
            json!({"id": "a", "text": "Coffee", "time": "morning"}),
            json!({"id": "b", "text": "Write", "time": "popołudnie"}),
            json!({"id": "c", "text": "Anytime"}),
        ];
        let calendar = vec![json!({"id": "x", "text": "Dentist", "date": "2026-10-01", "timeOfDay": "evening"})];
        let rows = daily_plan_rows(legacy.as_object(), &items, &calendar, day(2026, 10, 19), "u");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2026-10-01");
        assert_eq!(rows[0].morning_routine.as_deref(), Some("Run"));
        assert_eq!(rows[0].evening_routine.as_deref(), Some("Dentist"));
        assert_eq!(rows[0].goals.as_deref(), Some("Ship"));
        assert_eq!(rows[1].morning_routine.as_deref(), Some("Coffee"));
        assert_eq!(rows[1].main_tasks.as_deref(), Some("Write\nAnytime"));
    }

    #[test]
    fn blank_list_name_gets_default() {
        let rows = shopping_rows(&[json!({"id": "1", "name": "", "items": []})], "u");
        assert_eq!(rows[0].name, DEFAULT_LIST_NAME);
    }
}
