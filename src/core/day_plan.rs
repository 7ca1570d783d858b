use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::calendar::CalendarEntry;
use super::habit::Habit;
use super::task::Task;
use super::temporal::TimeOfDay;

/// Where a plan item comes from. Derived sources point back at the record
/// they project; the record may have been deleted since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
#[serde(remote = "Self")]
pub enum PlanSource {
    #[default]
    Manual,
    Task { task_id: String },
    Habit { habit_id: String },
    Calendar { entry_id: String },
}

impl Serialize for PlanSource {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        PlanSource::serialize(self, s)
    }
}

/// Older builds stored the source as a bare kind string with no back
/// reference. Those items are kept as manual ones.
impl<'de> Deserialize<'de> for PlanSource {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Kind(String),
            #[serde(with = "PlanSource")]
            Tagged(PlanSource),
        }

        match Stored::deserialize(d)? {
            Stored::Tagged(source) => Ok(source),
            Stored::Kind(kind) => match kind.as_str() {
                "manual" | "task" | "habit" | "calendar" => Ok(PlanSource::Manual),
                other => Err(serde::de::Error::unknown_variant(
                    other,
                    &["manual", "task", "habit", "calendar"],
                )),
            },
        }
    }
}

impl PlanSource {
    pub fn is_derived(&self) -> bool {
        !matches!(self, Self::Manual)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Task { .. } => "task",
            Self::Habit { .. } => "habit",
            Self::Calendar { .. } => "calendar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeOfDay>,
    #[serde(default)]
    pub source: PlanSource,
}

impl PlanItem {
    pub fn manual(text: impl Into<String>, time: Option<TimeOfDay>) -> Self {
        Self {
            id: super::new_id(),
            text: text.into(),
            completed: false,
            time,
            source: PlanSource::Manual,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            id: format!("task-{}", task.id),
            text: task.title.clone(),
            completed: task.completed,
            time: None,
            source: PlanSource::Task { task_id: task.id.clone() },
        }
    }

    pub fn from_habit(habit: &Habit, today: NaiveDate) -> Self {
        Self {
            id: format!("habit-{}", habit.id),
            text: habit.name.clone(),
            completed: habit.is_completed_on(today),
            time: None,
            source: PlanSource::Habit { habit_id: habit.id.clone() },
        }
    }

    pub fn from_calendar(entry: &CalendarEntry) -> Self {
        Self {
            id: format!("calendar-{}", entry.id),
            text: entry.text.clone(),
            completed: entry.completed,
            time: Some(entry.time_of_day),
            source: PlanSource::Calendar { entry_id: entry.id.clone() },
        }
    }

    pub fn starter_items() -> Vec<Self> {
        vec![
            Self::manual("Slow start with coffee", Some(TimeOfDay::Morning)),
            Self::manual("Time for creativity", Some(TimeOfDay::Afternoon)),
            Self::manual("Relax and reflect", Some(TimeOfDay::Evening)),
        ]
    }
}

/// Today's plan: the stored manual items plus projections of calendar
/// entries, tasks and habits for `today`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub items: Vec<PlanItem>,
}

impl DayPlan {
    pub fn build(
        today: NaiveDate,
        manual: &[PlanItem],
        calendar: &[CalendarEntry],
        tasks: &[Task],
        habits: &[Habit],
    ) -> Self {
        let mut items: Vec<PlanItem> = manual
            .iter()
            .filter(|i| !i.source.is_derived())
            .cloned()
            .collect();
        items.extend(
            calendar
                .iter()
                .filter(|e| e.date == today)
                .map(PlanItem::from_calendar),
        );
        items.extend(
            tasks
                .iter()
                .filter(|t| t.is_for_today(today))
                .map(PlanItem::from_task),
        );
        items.extend(habits.iter().map(|h| PlanItem::from_habit(h, today)));
        Self { date: today, items }
    }

    pub fn find(&self, id: &str) -> Option<&PlanItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// (completed, total)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.items.iter().filter(|i| i.completed).count();
        (done, self.items.len())
    }

    pub fn by_time(&self, time: Option<TimeOfDay>) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(move |i| i.time == time)
    }
}

/// Per-day record from the older `daily-plans` object, keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlanRecord {
    #[serde(default)]
    pub morning_routine: Option<String>,
    #[serde(default)]
    pub main_tasks: Option<String>,
    #[serde(default)]
    pub evening_routine: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Category;

    #[test]
    fn legacy_item_is_manual() {
        let json = r#"{"id":"1","text":"Spokojny start z kawą","completed":false,"time":"rano"}"#;
        let item: PlanItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.source, PlanSource::Manual);
        assert_eq!(item.time, Some(TimeOfDay::Morning));
    }

    #[test]
    fn bare_kind_source_reads_as_manual() {
        let json = r#"{"id":"2","text":"Stretch","source":"manual"}"#;
        let item: PlanItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.source, PlanSource::Manual);
        let json = r#"{"id":"3","text":"Read","source":"habit"}"#;
        assert_eq!(serde_json::from_str::<PlanItem>(json).unwrap().source, PlanSource::Manual);
        assert!(serde_json::from_str::<PlanItem>(r#"{"id":"4","text":"x","source":"radio"}"#).is_err());
    }

    #[test]
    fn source_round_trips_as_tagged_object() {
        let task = Task::new("Pay rent");
        let item = PlanItem::from_task(&task);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["source"]["kind"], "task");
        assert_eq!(json["source"]["taskId"], task.id.as_str());
    }

    #[test]
    fn build_collects_todays_items() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let manual = vec![PlanItem::manual("Walk", None)];
        let mut later = Task::new("Someday");
        later.category = Category::Later;
        let mut done = Task::new("Email");
        done.completed = true;
        let tasks = vec![later, done];
        let mut habit = Habit::new("Read", "Book", "accent");
        habit.last_completed = Some(today);
        let calendar = vec![
            CalendarEntry::new("Dentist", today, TimeOfDay::Afternoon),
            CalendarEntry::new("Tomorrow thing", today.succ_opt().unwrap(), TimeOfDay::Morning),
        ];

        let plan = DayPlan::build(today, &manual, &calendar, &tasks, &[habit]);
        let labels: Vec<&str> = plan.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(labels, vec!["Walk", "Dentist", "Email", "Read"]);
        assert_eq!(plan.progress(), (2, 4));
        assert_eq!(plan.by_time(Some(TimeOfDay::Afternoon)).count(), 1);
    }
}
