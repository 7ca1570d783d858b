//! Today's plan and routing of plan toggles to the records they project.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::core::calendar::CalendarEntry;
use crate::core::day_plan::{DayPlan, PlanItem, PlanSource};
use crate::core::habit::Habit;
use crate::core::task::Task;
use crate::core::temporal::TimeOfDay;
use crate::error::{AppError, AppResult};
use crate::store::{Entity, KeyValueStore, Repository};

pub struct Planner<S> {
    repo: Arc<Repository<S>>,
}

impl<S> Clone for Planner<S> {
    fn clone(&self) -> Self {
        Self { repo: Arc::clone(&self.repo) }
    }
}

impl<S: KeyValueStore> Planner<S> {
    pub fn new(repo: Arc<Repository<S>>) -> Self {
        Self { repo }
    }

    pub fn today_plan(&self, today: NaiveDate) -> DayPlan {
        let manual: Vec<PlanItem> = self.repo.load();
        let calendar: Vec<CalendarEntry> = self.repo.load();
        let tasks: Vec<Task> = self.repo.load();
        let habits: Vec<Habit> = self.repo.load();
        DayPlan::build(today, &manual, &calendar, &tasks, &habits)
    }

    pub fn add_item(&self, text: &str, time: Option<TimeOfDay>) -> AppResult<PlanItem> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput("plan item text is empty".into()));
        }
        let item = PlanItem::manual(text, time);
        self.repo.update::<PlanItem, _>(|items| items.push(item.clone()))?;
        Ok(item)
    }

    pub fn remove_item(&self, id: &str) -> AppResult<PlanItem> {
        let mut items: Vec<PlanItem> = self.repo.load();
        let pos = items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| AppError::not_found("plan item", id))?;
        let removed = items.remove(pos);
        self.repo.save(&items)?;
        Ok(removed)
    }

    /// Toggle a plan item by the id shown in today's plan. Derived items
    /// toggle the record they came from. Returns the item's new state.
    pub fn toggle(&self, item_id: &str, today: NaiveDate) -> AppResult<(PlanItem, bool)> {
        let plan = self.today_plan(today);
        let item = plan
            .find(item_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("plan item", item_id))?;
        let completed = self.toggle_source(&item.source, &item.id, today)?;
        Ok((item, completed))
    }

    pub fn toggle_source(&self, source: &PlanSource, item_id: &str, today: NaiveDate) -> AppResult<bool> {
        match source {
            PlanSource::Manual => self.mutate::<PlanItem, _>(item_id, "plan item", |i| {
                i.completed = !i.completed;
                i.completed
            }),
            PlanSource::Task { task_id } => self.mutate::<Task, _>(task_id, "task", Task::toggle),
            PlanSource::Habit { habit_id } => self.mutate::<Habit, _>(habit_id, "habit", |h| {
                h.toggle(today);
                h.completed
            }),
            PlanSource::Calendar { entry_id } => {
                self.mutate::<CalendarEntry, _>(entry_id, "calendar entry", |e| {
                    e.completed = !e.completed;
                    e.completed
                })
            }
        }
    }

    /// Apply `f` to one record and persist. A missing id leaves the store
    /// untouched.
    fn mutate<T: Entity, R>(&self, id: &str, kind: &'static str, f: impl FnOnce(&mut T) -> R) -> AppResult<R> {
        let mut items: Vec<T> = self.repo.load();
        let item = items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| AppError::not_found(kind, id))?;
        let result = f(item);
        self.repo.save(&items)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn planner() -> (Arc<Repository<MemoryStore>>, Planner<MemoryStore>) {
        let repo = Arc::new(Repository::new(MemoryStore::new()));
        (Arc::clone(&repo), Planner::new(repo))
    }

    #[test]
    fn derived_toggle_updates_source_record() {
        let (repo, planner) = planner();
        let task = Task::new("Call the bank");
        repo.save(&[task.clone()]).unwrap();

        let (_, done) = planner.toggle(&format!("task-{}", task.id), day()).unwrap();
        assert!(done);
        let stored: Task = repo.find(&task.id).unwrap();
        assert!(stored.completed);
    }

    #[test]
    fn habit_item_follows_streak_rules() {
        let (repo, planner) = planner();
        let habit = Habit::new("Stretch", "Dumbbell", "primary");
        repo.save(&[habit.clone()]).unwrap();
        let id = format!("habit-{}", habit.id);

        planner.toggle(&id, day()).unwrap();
        let stored: Habit = repo.find(&habit.id).unwrap();
        assert_eq!(stored.streak, 1);
        assert!(planner.today_plan(day()).find(&id).unwrap().completed);
    }

    #[test]
    fn dangling_reference_is_not_found() {
        let (repo, planner) = planner();
        let source = PlanSource::Task { task_id: "gone".into() };
        let err = planner.toggle_source(&source, "task-gone", day()).unwrap_err();
        assert!(matches!(err, AppError::NotFound { kind: "task", .. }));
        assert!(repo.load::<Task>().is_empty());
        assert!(!repo.exists(crate::store::Collection::Tasks));
    }

    #[test]
    fn manual_items_add_toggle_remove() {
        let (_, planner) = planner();
        let item = planner.add_item("Water plants", Some(TimeOfDay::Evening)).unwrap();
        let (_, done) = planner.toggle(&item.id, day()).unwrap();
        assert!(done);
        planner.remove_item(&item.id).unwrap();
        assert!(planner.today_plan(day()).items.is_empty());
        assert!(planner.add_item("  ", None).is_err());
    }
}
