use serde_json::{Value, json};

use zapiszto::application::{App, NewTask};
use zapiszto::store::{KeyValueStore, MemoryStore, StoreError};

/// Memory store whose writes to one key always fail.
struct FailingKey {
    inner: MemoryStore,
    key: &'static str,
}

impl KeyValueStore for FailingKey {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.key {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.inner.set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

fn texts(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["text"].as_str())
        .collect()
}

#[test]
fn adding_a_plan_item_keeps_every_stored_item() {
    let store = MemoryStore::new().with(
        "daily-plan",
        json!([
            { "id": "1", "text": "Kept" },
            { "id": "2", "text": "Bare source", "source": "manual" },
            { "id": "3", "text": "Unknown source", "source": { "kind": "radio" } }
        ]),
    );
    let app = App::open(store);

    app.add_plan_item("New", None).unwrap();

    let stored = app.repo().store().get("daily-plan").unwrap();
    assert_eq!(texts(&stored), vec!["Kept", "Bare source", "New", "Unknown source"]);
    assert_eq!(stored[3]["source"]["kind"], "radio");
}

#[test]
fn editing_one_note_keeps_an_unreadable_neighbour() {
    let store = MemoryStore::new().with(
        "zapiszto-notes",
        json!([
            { "id": "a", "title": "Groceries", "content": "milk" },
            { "id": "b", "title": "Odd", "content": "", "color": "ultraviolet" }
        ]),
    );
    let app = App::open(store);

    app.edit_note("a", Some("Shopping"), None).unwrap();
    app.delete_note("a").unwrap();

    let stored = app.repo().store().get("zapiszto-notes").unwrap();
    assert_eq!(stored, json!([{ "id": "b", "title": "Odd", "content": "", "color": "ultraviolet" }]));
}

#[test]
fn setting_change_keeps_other_stored_settings() {
    let store = MemoryStore::new().with(
        "user-settings",
        json!({ "name": "Ola", "theme": "sepia", "language": "en" }),
    );
    let app = App::open(store);

    let settings = app.update_setting("notifications", "on").unwrap();
    assert_eq!(settings.name, "Ola");
    assert!(settings.enable_notifications);

    let stored = app.repo().store().get("user-settings").unwrap();
    assert_eq!(stored["name"], "Ola");
    assert_eq!(stored["language"], "en");
}

#[test]
fn failed_activity_write_does_not_fail_the_action() {
    let app = App::open(FailingKey { inner: MemoryStore::new(), key: "recent-activities" });

    let task = app
        .add_task(NewTask { title: "Call the bank".into(), ..Default::default() })
        .unwrap();
    let toggled = app.toggle_task(&task.id).unwrap();
    assert!(toggled.completed);
    app.add_note("Garden", "tomatoes", &[], Default::default()).unwrap();

    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.notes().len(), 1);
    assert!(app.recent_activity().is_empty());
}
