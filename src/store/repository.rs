use std::collections::HashSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{Collection, KeyValueStore, StoreError};
use crate::core::activity::Activity;
use crate::core::brain_dump::BrainDumpEntry;
use crate::core::calendar::CalendarEntry;
use crate::core::day_plan::PlanItem;
use crate::core::habit::Habit;
use crate::core::mood::MoodEntry;
use crate::core::note::Note;
use crate::core::shopping::ShoppingList;
use crate::core::task::Task;

/// Change notifications for anything that caches repository state.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Changed(Collection),
    ActivityAdded(Activity),
    SettingsChanged,
    Cleared,
}

/// A record type persisted as one element of a collection.
pub trait Entity: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

macro_rules! entity {
    ($ty:ty, $collection:expr) => {
        impl Entity for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

entity!(Note, Collection::Notes);
entity!(Task, Collection::Tasks);
entity!(Habit, Collection::Habits);
entity!(MoodEntry, Collection::Mood);
entity!(Activity, Collection::Activities);
entity!(ShoppingList, Collection::Shopping);
entity!(PlanItem, Collection::DailyPlan);
entity!(BrainDumpEntry, Collection::BrainDump);
entity!(CalendarEntry, Collection::Calendar);

const EVENT_CAPACITY: usize = 64;

/// Typed access to the local store plus a change channel.
pub struct Repository<S> {
    store: S,
    events: broadcast::Sender<StoreEvent>,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Broadcast to current subscribers. Having none is fine.
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    /// Raw records of `collection` across every key it has lived under.
    /// Arrays are concatenated, canonical key first; the first record with a
    /// given id wins. Non-array values are skipped.
    pub fn merged_records(&self, collection: Collection) -> Vec<Value> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in collection.keys() {
            let Some(Value::Array(items)) = self.store.get(key) else {
                continue;
            };
            for item in items {
                match record_id(&item) {
                    Some(id) if !seen.insert(id.clone()) => {
                        log::debug!("Skipping duplicate {} record {} from {}", collection, id, key);
                    }
                    _ => out.push(item),
                }
            }
        }
        out
    }

    /// Whether any key of `collection` holds a value.
    pub fn exists(&self, collection: Collection) -> bool {
        collection
            .keys()
            .any(|key| matches!(self.store.get_raw(key), Ok(Some(_))))
    }

    /// Raw records backing `collection`. The canonical key is authoritative
    /// once written; before that, records are gathered from the legacy keys.
    fn stored_records(&self, collection: Collection) -> Vec<Value> {
        match self.store.get(collection.key()) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                log::warn!("Expected an array under {}", collection.key());
                Vec::new()
            }
            None => self.merged_records(collection),
        }
    }

    /// Load a collection. Records that do not parse are left out.
    pub fn load<T: Entity>(&self) -> Vec<T> {
        let collection = T::COLLECTION;
        parse_records(collection, self.stored_records(collection))
    }

    /// Persist `items` as the whole collection. Stored records this build
    /// cannot read never reach `items`, so they are carried over unchanged.
    pub fn save<T: Entity>(&self, items: &[T]) -> Result<(), StoreError> {
        let collection = T::COLLECTION;
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            records.push(serde_json::to_value(item)?);
        }
        let unreadable: Vec<Value> = self
            .stored_records(collection)
            .into_iter()
            .filter(|record| !is_readable::<T>(record))
            .collect();
        if !unreadable.is_empty() {
            log::warn!("Keeping {} unreadable {} record(s) as stored", unreadable.len(), collection);
            records.extend(unreadable);
        }
        self.store.set(collection.key(), &Value::Array(records))?;
        log::debug!("Saved {} {} record(s)", items.len(), collection);
        self.emit(StoreEvent::Changed(collection));
        Ok(())
    }

    /// Load, mutate and save a collection in one step.
    pub fn update<T: Entity, R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R, StoreError> {
        let mut items = self.load::<T>();
        let result = f(&mut items);
        self.save(&items)?;
        Ok(result)
    }

    /// Load a collection, writing `seed` first when nothing was ever stored.
    pub fn load_or_seed<T: Entity>(&self, seed: impl FnOnce() -> Vec<T>) -> Result<Vec<T>, StoreError> {
        if self.exists(T::COLLECTION) {
            return Ok(self.load());
        }
        let items = seed();
        log::info!("Seeding {} with {} default record(s)", T::COLLECTION, items.len());
        self.save(&items)?;
        Ok(items)
    }

    pub fn find<T: Entity>(&self, id: &str) -> Option<T> {
        self.load::<T>().into_iter().find(|item| item.id() == id)
    }

    /// Single-object entries such as user settings. A missing value gives
    /// the default; an unreadable one keeps every field that still parses.
    pub fn load_object<T: Serialize + DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(value) = self.store.get(key) else {
            return T::default();
        };
        match serde_json::from_value(value.clone()) {
            Ok(object) => object,
            Err(e) => {
                log::warn!("Recovering readable fields of {}: {}", key, e);
                recover_fields(value)
            }
        }
    }

    /// Write a single-object entry. Stored keys the type does not know are
    /// kept.
    pub fn save_object<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let mut out = serde_json::to_value(value)?;
        if let (Value::Object(fields), Some(Value::Object(stored))) = (&mut out, self.store.get(key)) {
            for (name, raw) in stored {
                fields.entry(name).or_insert(raw);
            }
        }
        self.store.set(key, &out)
    }

    pub fn remove_key(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(key)
    }
}

/// Older builds used numeric ids in places.
fn record_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize each record on its own so one bad record does not hide the
/// rest of the collection.
pub fn parse_records<T: DeserializeOwned>(collection: Collection, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| parse_record(collection, record))
        .collect()
}

pub fn parse_record<T: DeserializeOwned>(collection: Collection, record: Value) -> Option<T> {
    match serde_json::from_value(with_string_id(record)) {
        Ok(item) => Some(item),
        Err(e) => {
            log::warn!("Skipping unreadable {} record: {}", collection, e);
            None
        }
    }
}

fn with_string_id(mut record: Value) -> Value {
    if let Some(id) = record_id(&record) {
        if let Some(obj) = record.as_object_mut() {
            obj.insert("id".into(), Value::String(id));
        }
    }
    record
}

fn is_readable<T: DeserializeOwned>(record: &Value) -> bool {
    serde_json::from_value::<T>(with_string_id(record.clone())).is_ok()
}

/// Defaults overlaid with each stored field that parses on its own.
fn recover_fields<T: Serialize + DeserializeOwned + Default>(stored: Value) -> T {
    let (Value::Object(fields), Ok(Value::Object(mut merged))) = (stored, serde_json::to_value(T::default())) else {
        return T::default();
    };
    for (name, value) in fields {
        let previous = merged.insert(name.clone(), value);
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            log::warn!("Ignoring unreadable field {}", name);
            match previous {
                Some(p) => merged.insert(name, p),
                None => merged.remove(&name),
            };
        }
    }
    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn legacy_keys_merge_until_canonical_written() {
        let store = MemoryStore::new()
            .with("notes", json!([
                {"id": "1", "title": "old", "content": ""},
                {"id": 2, "title": "numeric id", "content": ""},
                {"title": "no id"}
            ]));
        let repo = Repository::new(store);

        let notes: Vec<Note> = repo.load();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].id, "2");

        repo.save(&notes[..1]).unwrap();
        let notes: Vec<Note> = repo.load();
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn merged_records_first_id_wins() {
        let store = MemoryStore::new()
            .with("zapiszto-tasks", json!([{"id": "a", "title": "canonical"}]))
            .with("tasks", json!([{"id": "a", "text": "legacy"}, {"id": "b", "text": "only legacy"}]));
        let repo = Repository::new(store);
        let records = repo.merged_records(Collection::Tasks);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "canonical");
    }

    #[test]
    fn bad_record_is_skipped() {
        let store = MemoryStore::new().with(
            "habits",
            json!([{"id": "1", "name": "Read"}, {"id": "2", "completionHistory": "nope"}]),
        );
        let repo = Repository::new(store);
        let habits: Vec<Habit> = repo.load();
        assert_eq!(habits.len(), 1);
    }

    #[test]
    fn save_broadcasts_change() {
        let repo = Repository::new(MemoryStore::new());
        let mut rx = repo.subscribe();
        repo.update::<Task, _>(|tasks| tasks.push(Task::new("x"))).unwrap();
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Changed(Collection::Tasks));
    }

    #[test]
    fn seed_only_once() {
        let repo = Repository::new(MemoryStore::new());
        let seeded = repo.load_or_seed(Habit::defaults).unwrap();
        assert!(!seeded.is_empty());
        repo.save::<Habit>(&[]).unwrap();
        let again = repo.load_or_seed(Habit::defaults).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn unreadable_records_survive_a_save() {
        let store = MemoryStore::new().with(
            "zapiszto-notes",
            json!([
                {"id": "1", "title": "fine"},
                {"id": "2", "title": "odd color", "color": "ultraviolet"}
            ]),
        );
        let repo = Repository::new(store);
        repo.update::<Note, _>(|notes| notes.push(Note::new("new", ""))).unwrap();

        let stored = repo.store().get("zapiszto-notes").unwrap();
        let titles: Vec<&str> = stored.as_array().unwrap().iter().filter_map(|n| n["title"].as_str()).collect();
        assert_eq!(titles, vec!["fine", "new", "odd color"]);
        assert_eq!(stored[2]["color"], "ultraviolet");
        assert_eq!(repo.load::<Note>().len(), 2);
    }

    #[test]
    fn deleting_a_readable_record_keeps_unreadable_ones() {
        let store = MemoryStore::new().with(
            "habits",
            json!([{"id": "1", "name": "Read"}, {"id": "2", "name": "Run", "streak": "lots"}]),
        );
        let repo = Repository::new(store);
        repo.update::<Habit, _>(|habits| habits.retain(|h| h.id != "1")).unwrap();
        let stored = repo.store().get("habits").unwrap();
        assert_eq!(stored, json!([{"id": "2", "name": "Run", "streak": "lots"}]));
    }

    #[test]
    fn object_keeps_readable_fields() {
        use crate::core::settings::{Language, Theme, UserSettings};

        let store = MemoryStore::new().with(
            "user-settings",
            json!({"name": "Ola", "theme": "sepia", "language": "en", "extra": 1}),
        );
        let repo = Repository::new(store);
        let settings: UserSettings = repo.load_object("user-settings");
        assert_eq!(settings.name, "Ola");
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.theme, Theme::Light);

        repo.save_object("user-settings", &settings).unwrap();
        let stored = repo.store().get("user-settings").unwrap();
        assert_eq!(stored["name"], "Ola");
        assert_eq!(stored["extra"], 1);
    }
}
