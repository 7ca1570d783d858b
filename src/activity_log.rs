use std::sync::Arc;

use crate::core::activity::{Activity, ActivityKind};
use crate::store::{KeyValueStore, Repository, StoreError, StoreEvent};

/// Entries kept in the log.
pub const MAX_ACTIVITIES: usize = 20;

/// Newest-first feed of recent user actions.
pub struct ActivityLogger<S> {
    repo: Arc<Repository<S>>,
}

impl<S> Clone for ActivityLogger<S> {
    fn clone(&self) -> Self {
        Self { repo: Arc::clone(&self.repo) }
    }
}

impl<S: KeyValueStore> ActivityLogger<S> {
    pub fn new(repo: Arc<Repository<S>>) -> Self {
        Self { repo }
    }

    /// Prepend an entry, drop anything past the cap, persist, then notify
    /// subscribers.
    pub fn record(&self, text: impl Into<String>, kind: ActivityKind) -> Result<Activity, StoreError> {
        let activity = Activity::new(text, kind);
        self.repo.update::<Activity, _>(|log| {
            log.insert(0, activity.clone());
            log.truncate(MAX_ACTIVITIES);
        })?;
        log::debug!("Activity [{}]: {}", kind.as_str(), activity.text);
        self.repo.emit(StoreEvent::ActivityAdded(activity.clone()));
        Ok(activity)
    }

    pub fn recent(&self) -> Vec<Activity> {
        self.repo.load()
    }
}
