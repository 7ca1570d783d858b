//! User actions: mutate a collection, persist it, log the activity.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::activity_log::ActivityLogger;
use crate::core::activity::{Activity, ActivityKind};
use crate::core::brain_dump::{BrainDumpEntry, DumpStatus};
use crate::core::calendar::{self, CalendarEntry};
use crate::core::day_plan::{DayPlan, PlanItem, PlanSource};
use crate::core::habit::{Habit, HabitToggle};
use crate::core::mood::{self, MoodEntry, WeeklyMood};
use crate::core::note::{Note, NoteColor};
use crate::core::settings::UserSettings;
use crate::core::shopping::{ListType, ShoppingItem, ShoppingList};
use crate::core::task::{Category, Priority, Task};
use crate::core::temporal::{self, TimeOfDay};
use crate::error::{AppError, AppResult};
use crate::planner::Planner;
use crate::store::{API_KEY_KEY, Entity, KeyValueStore, Repository, SETTINGS_KEY, StoreEvent};

/// Fields for a new task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Category,
    pub tags: Vec<String>,
    pub deadline: Option<NaiveDate>,
}

pub struct App<S> {
    repo: Arc<Repository<S>>,
    activity: ActivityLogger<S>,
    planner: Planner<S>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(repo: Arc<Repository<S>>) -> Self {
        Self {
            activity: ActivityLogger::new(Arc::clone(&repo)),
            planner: Planner::new(Arc::clone(&repo)),
            repo,
        }
    }

    pub fn open(store: S) -> Self {
        Self::new(Arc::new(Repository::new(store)))
    }

    pub fn repo(&self) -> &Arc<Repository<S>> {
        &self.repo
    }

    pub fn planner(&self) -> &Planner<S> {
        &self.planner
    }

    /// Seed first-run defaults and bring habit flags up to date.
    pub fn init(&self, today: NaiveDate) -> AppResult<()> {
        self.repo.load_or_seed(Habit::defaults)?;
        self.repo.load_or_seed(ShoppingList::defaults)?;
        self.repo.load_or_seed(PlanItem::starter_items)?;
        self.reset_habits(today)?;
        Ok(())
    }

    /// The action itself is already persisted, so a failed activity write
    /// is only logged.
    fn log(&self, text: String, kind: ActivityKind) {
        if let Err(e) = self.activity.record(text, kind) {
            log::error!("Failed to record activity: {}", e);
        }
    }

    /// Remove the record with `id` from its collection.
    fn remove<T: Entity>(&self, id: &str, kind: &'static str) -> AppResult<T> {
        let mut items: Vec<T> = self.repo.load();
        let pos = items
            .iter()
            .position(|i| i.id() == id)
            .ok_or_else(|| AppError::not_found(kind, id))?;
        let removed = items.remove(pos);
        self.repo.save(&items)?;
        Ok(removed)
    }

    /// Apply `f` to the record with `id` and persist. Returns the updated
    /// record.
    fn modify<T: Entity + Clone>(&self, id: &str, kind: &'static str, f: impl FnOnce(&mut T)) -> AppResult<T> {
        let mut items: Vec<T> = self.repo.load();
        let item = items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| AppError::not_found(kind, id))?;
        f(item);
        let updated = item.clone();
        self.repo.save(&items)?;
        Ok(updated)
    }

    // Notes

    pub fn notes(&self) -> Vec<Note> {
        self.repo.load()
    }

    pub fn add_note(&self, title: &str, content: &str, tags: &[String], color: NoteColor) -> AppResult<Note> {
        if title.trim().is_empty() && content.trim().is_empty() {
            return Err(AppError::InvalidInput("note needs a title or content".into()));
        }
        let mut note = Note::new(title.trim(), content.trim());
        note.color = color;
        for tag in tags {
            note.add_tag(tag);
        }
        self.repo.update::<Note, _>(|notes| notes.insert(0, note.clone()))?;
        self.log(format!("Added note: {}", note.title), ActivityKind::Note);
        Ok(note)
    }

    pub fn edit_note(&self, id: &str, title: Option<&str>, content: Option<&str>) -> AppResult<Note> {
        self.modify::<Note>(id, "note", |n| {
            if let Some(t) = title {
                n.title = t.trim().to_string();
            }
            if let Some(c) = content {
                n.content = c.trim().to_string();
            }
        })
    }

    pub fn delete_note(&self, id: &str) -> AppResult<Note> {
        self.remove(id, "note")
    }

    pub fn search_notes(&self, query: &str, tag: Option<&str>) -> Vec<Note> {
        self.notes()
            .into_iter()
            .filter(|n| query.is_empty() || n.matches(query))
            .filter(|n| tag.is_none_or(|t| n.has_tag(t)))
            .collect()
    }

    pub fn save_note_expansion(&self, id: &str, expansion: &str) -> AppResult<Note> {
        self.modify::<Note>(id, "note", |n| n.ai_expanded = Some(expansion.to_string()))
    }

    // Tasks

    pub fn tasks(&self) -> Vec<Task> {
        self.repo.load()
    }

    pub fn add_task(&self, new: NewTask) -> AppResult<Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("task title is empty".into()));
        }
        let mut task = Task::new(title);
        task.description = new.description.filter(|d| !d.trim().is_empty());
        task.priority = new.priority;
        task.category = new.category;
        task.tags = new.tags;
        task.deadline = new.deadline;
        self.repo.update::<Task, _>(|tasks| tasks.insert(0, task.clone()))?;
        self.log(format!("Added task: {}", task.title), ActivityKind::Task);
        Ok(task)
    }

    pub fn toggle_task(&self, id: &str) -> AppResult<Task> {
        let task = self.modify::<Task>(id, "task", |t| {
            t.toggle();
        })?;
        if task.completed {
            self.log(format!("Completed task: {}", task.title), ActivityKind::Task);
        }
        Ok(task)
    }

    pub fn delete_task(&self, id: &str) -> AppResult<Task> {
        self.remove(id, "task")
    }

    // Habits

    pub fn habits(&self) -> Vec<Habit> {
        self.repo.load()
    }

    pub fn add_habit(&self, name: &str, icon: &str, color: &str) -> AppResult<Habit> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("habit name is empty".into()));
        }
        let habit = Habit::new(name.trim(), icon, color);
        self.repo.update::<Habit, _>(|habits| habits.push(habit.clone()))?;
        Ok(habit)
    }

    pub fn toggle_habit(&self, id: &str, today: NaiveDate) -> AppResult<Habit> {
        let mut outcome = HabitToggle::Uncompleted;
        let habit = self.modify::<Habit>(id, "habit", |h| outcome = h.toggle(today))?;
        if outcome == HabitToggle::Completed {
            self.log(
                format!("Completed habit: {} ({} day streak)", habit.name, habit.streak),
                ActivityKind::Habit,
            );
        }
        Ok(habit)
    }

    pub fn delete_habit(&self, id: &str) -> AppResult<Habit> {
        self.remove(id, "habit")
    }

    /// Day-boundary sweep. Returns how many habits changed.
    pub fn reset_habits(&self, today: NaiveDate) -> AppResult<usize> {
        let mut habits: Vec<Habit> = self.repo.load();
        let mut changed = 0;
        for habit in &mut habits {
            let before = habit.clone();
            habit.daily_reset(today);
            if *habit != before {
                changed += 1;
            }
        }
        if changed > 0 {
            self.repo.save(&habits)?;
            log::info!("Habit reset for {}: {} updated", today, changed);
        }
        Ok(changed)
    }

    // Mood

    pub fn mood_entries(&self) -> Vec<MoodEntry> {
        self.repo.load()
    }

    pub fn record_mood(&self, mood_name: &str, note: Option<String>) -> AppResult<MoodEntry> {
        let option = mood::find_option(mood_name)
            .ok_or_else(|| AppError::InvalidInput(format!("unknown mood '{mood_name}'")))?;
        let entry = MoodEntry::new(option, note);
        self.repo.update::<MoodEntry, _>(|entries| entries.insert(0, entry.clone()))?;
        self.log(format!("Mood: {} {}", entry.emoji, entry.mood), ActivityKind::Mood);
        Ok(entry)
    }

    pub fn weekly_mood(&self) -> Option<WeeklyMood> {
        mood::weekly_stats(&self.mood_entries(), temporal::now_millis())
    }

    // Shopping

    pub fn shopping_lists(&self) -> Vec<ShoppingList> {
        self.repo.load()
    }

    pub fn add_shopping_list(&self, name: &str, list_type: ListType, category: &str) -> AppResult<ShoppingList> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("list name is empty".into()));
        }
        let list = ShoppingList::new(name.trim(), list_type, category);
        self.repo.update::<ShoppingList, _>(|lists| lists.push(list.clone()))?;
        Ok(list)
    }

    pub fn delete_shopping_list(&self, id: &str) -> AppResult<ShoppingList> {
        self.remove(id, "shopping list")
    }

    pub fn add_shopping_item(&self, list_id: &str, name: &str, price: Option<f64>) -> AppResult<ShoppingItem> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("item name is empty".into()));
        }
        let mut added = None;
        self.modify::<ShoppingList>(list_id, "shopping list", |list| {
            added = Some(list.add_item(name.trim(), price).clone());
        })?;
        added.ok_or_else(|| AppError::not_found("shopping list", list_id))
    }

    pub fn toggle_shopping_item(&self, list_id: &str, item_id: &str) -> AppResult<bool> {
        let mut state = None;
        self.modify::<ShoppingList>(list_id, "shopping list", |list| state = list.toggle_item(item_id))?;
        state.ok_or_else(|| AppError::not_found("shopping item", item_id))
    }

    pub fn remove_shopping_item(&self, list_id: &str, item_id: &str) -> AppResult<()> {
        let mut removed = false;
        self.modify::<ShoppingList>(list_id, "shopping list", |list| removed = list.remove_item(item_id))?;
        if removed {
            Ok(())
        } else {
            Err(AppError::not_found("shopping item", item_id))
        }
    }

    // Daily plan

    pub fn today_plan(&self, today: NaiveDate) -> DayPlan {
        self.planner.today_plan(today)
    }

    pub fn add_plan_item(&self, text: &str, time: Option<TimeOfDay>) -> AppResult<PlanItem> {
        let item = self.planner.add_item(text, time)?;
        self.log(format!("Planned: {}", item.text), ActivityKind::Plan);
        Ok(item)
    }

    pub fn toggle_plan_item(&self, id: &str, today: NaiveDate) -> AppResult<bool> {
        let (item, completed) = self.planner.toggle(id, today)?;
        if completed {
            let kind = match item.source {
                PlanSource::Task { .. } => ActivityKind::Task,
                PlanSource::Habit { .. } => ActivityKind::Habit,
                PlanSource::Manual | PlanSource::Calendar { .. } => ActivityKind::Plan,
            };
            self.log(format!("Done: {}", item.text), kind);
        }
        Ok(completed)
    }

    pub fn remove_plan_item(&self, id: &str) -> AppResult<PlanItem> {
        self.planner.remove_item(id)
    }

    // Brain dump

    pub fn brain_dump(&self) -> Vec<BrainDumpEntry> {
        self.repo.load()
    }

    pub fn add_thought(&self, content: &str) -> AppResult<BrainDumpEntry> {
        if content.trim().is_empty() {
            return Err(AppError::InvalidInput("thought is empty".into()));
        }
        let entry = BrainDumpEntry::new(content.trim());
        self.repo.update::<BrainDumpEntry, _>(|entries| entries.insert(0, entry.clone()))?;
        self.log("Added a thought to the brain dump".to_string(), ActivityKind::BrainDump);
        Ok(entry)
    }

    pub fn mark_sorted(&self, id: &str) -> AppResult<BrainDumpEntry> {
        self.modify::<BrainDumpEntry>(id, "thought", |e| e.status = DumpStatus::Sorted)
    }

    pub fn delete_thought(&self, id: &str) -> AppResult<BrainDumpEntry> {
        self.remove(id, "thought")
    }

    // Calendar

    pub fn calendar_entries(&self, day: NaiveDate) -> Vec<CalendarEntry> {
        let all: Vec<CalendarEntry> = self.repo.load();
        calendar::entries_for_day(&all, day).into_iter().cloned().collect()
    }

    pub fn add_calendar_entry(&self, text: &str, date: NaiveDate, time: TimeOfDay) -> AppResult<CalendarEntry> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("entry text is empty".into()));
        }
        let entry = CalendarEntry::new(text.trim(), date, time);
        self.repo.update::<CalendarEntry, _>(|entries| entries.push(entry.clone()))?;
        Ok(entry)
    }

    pub fn toggle_calendar_entry(&self, id: &str) -> AppResult<CalendarEntry> {
        self.modify::<CalendarEntry>(id, "calendar entry", |e| e.completed = !e.completed)
    }

    pub fn delete_calendar_entry(&self, id: &str) -> AppResult<CalendarEntry> {
        self.remove(id, "calendar entry")
    }

    // Activity, settings

    pub fn recent_activity(&self) -> Vec<Activity> {
        self.activity.recent()
    }

    pub fn settings(&self) -> UserSettings {
        self.repo.load_object(SETTINGS_KEY)
    }

    pub fn update_setting(&self, field: &str, value: &str) -> AppResult<UserSettings> {
        let mut settings = self.settings();
        if !settings.set(field, value) {
            return Err(AppError::InvalidInput(format!("cannot set {field} to '{value}'")));
        }
        self.repo.save_object(SETTINGS_KEY, &settings)?;
        self.repo.emit(StoreEvent::SettingsChanged);
        Ok(settings)
    }

    pub fn reset_settings(&self) -> AppResult<UserSettings> {
        let settings = UserSettings::default();
        self.repo.save_object(SETTINGS_KEY, &settings)?;
        self.repo.emit(StoreEvent::SettingsChanged);
        Ok(settings)
    }

    /// API key saved in the store by the settings screen. Older builds
    /// wrote it as bare text rather than a JSON string.
    pub fn stored_api_key(&self) -> Option<String> {
        let raw = match self.repo.store().get_raw(API_KEY_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Failed to read API key: {}", e);
                return None;
            }
        };
        let key = serde_json::from_str::<String>(&raw).unwrap_or(raw);
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    pub fn set_stored_api_key(&self, key: Option<&str>) -> AppResult<()> {
        match key {
            Some(k) => self.repo.save_object(API_KEY_KEY, &k.trim())?,
            None => self.repo.remove_key(API_KEY_KEY)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn app() -> App<MemoryStore> {
        App::open(MemoryStore::new())
    }

    #[test]
    fn init_seeds_once() {
        let app = app();
        app.init(day(19)).unwrap();
        assert_eq!(app.habits().len(), 5);
        assert_eq!(app.shopping_lists().len(), 2);
        assert_eq!(app.today_plan(day(19)).items.iter().filter(|i| !i.source.is_derived()).count(), 3);

        let first = app.habits()[0].id.clone();
        app.delete_habit(&first).unwrap();
        app.init(day(20)).unwrap();
        assert_eq!(app.habits().len(), 4);
    }

    #[test]
    fn actions_log_activity() {
        let app = app();
        let task = app.add_task(NewTask { title: "Pay bills".into(), ..Default::default() }).unwrap();
        app.toggle_task(&task.id).unwrap();
        app.record_mood("Calm", None).unwrap();

        let log: Vec<String> = app.recent_activity().into_iter().map(|a| a.text).collect();
        assert_eq!(log.len(), 3);
        assert!(log[0].starts_with("Mood:"));
        assert_eq!(log[1], "Completed task: Pay bills");
    }

    #[test]
    fn toggling_habit_twice_is_a_no_op() {
        let app = app();
        let habit = app.add_habit("Read", "Book", "accent").unwrap();
        app.toggle_habit(&habit.id, day(19)).unwrap();
        let back = app.toggle_habit(&habit.id, day(19)).unwrap();
        assert_eq!(back.streak, habit.streak);
        assert_eq!(back.completed, habit.completed);
        assert_eq!(back.completion_history, habit.completion_history);
        assert_eq!(app.recent_activity().len(), 1);
    }

    #[test]
    fn reset_sweep_clears_stale_flags() {
        let app = app();
        let habit = app.add_habit("Walk", "Dumbbell", "primary").unwrap();
        app.toggle_habit(&habit.id, day(18)).unwrap();
        assert_eq!(app.reset_habits(day(19)).unwrap(), 1);
        let h = &app.habits()[0];
        assert!(!h.completed);
        assert_eq!(h.streak, 1);
        assert_eq!(app.reset_habits(day(19)).unwrap(), 0);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let app = app();
        assert!(matches!(app.toggle_task("nope"), Err(AppError::NotFound { .. })));
        let list = app.add_shopping_list("Hardware", ListType::Daily, "home").unwrap();
        assert!(matches!(app.toggle_shopping_item(&list.id, "nope"), Err(AppError::NotFound { kind: "shopping item", .. })));
        assert!(matches!(app.record_mood("ecstatic", None), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn shopping_items_persist() {
        let app = app();
        let list = app.add_shopping_list("Hardware", ListType::Daily, "home").unwrap();
        let item = app.add_shopping_item(&list.id, "screws", Some(3.0)).unwrap();
        assert!(app.toggle_shopping_item(&list.id, &item.id).unwrap());
        assert_eq!(app.shopping_lists()[0].remaining(), 0);
        app.remove_shopping_item(&list.id, &item.id).unwrap();
        assert!(app.shopping_lists()[0].items.is_empty());
    }

    #[test]
    fn note_search_and_expansion() {
        let app = app();
        let note = app.add_note("Garden", "grow tomatoes", &["home".into()], NoteColor::Accent).unwrap();
        app.add_note("Work", "quarterly report", &[], NoteColor::Primary).unwrap();
        assert_eq!(app.search_notes("TOMATO", None).len(), 1);
        assert_eq!(app.search_notes("", Some("home")).len(), 1);
        let saved = app.save_note_expansion(&note.id, "expanded").unwrap();
        assert_eq!(saved.ai_expanded.as_deref(), Some("expanded"));
    }

    #[test]
    fn settings_and_api_key() {
        let app = app();
        app.update_setting("language", "en").unwrap();
        assert!(app.update_setting("language", "de").is_err());
        assert_eq!(app.settings().language, crate::core::settings::Language::En);

        assert!(app.stored_api_key().is_none());
        app.set_stored_api_key(Some(" sk-test ")).unwrap();
        assert_eq!(app.stored_api_key().as_deref(), Some("sk-test"));
        app.repo().store().set_raw(API_KEY_KEY, "sk-bare").unwrap();
        assert_eq!(app.stored_api_key().as_deref(), Some("sk-bare"));
    }
}
