//! One-way migration of local collections to the remote backend.

pub mod anthropic;
pub mod auth;
pub mod keyring;
pub mod mapping;
pub mod supabase;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::core::temporal;
use crate::store::{Collection, KeyValueStore, Repository, StoreError, StoreEvent};
use auth::{AuthGate, IdentityProvider, Session};
use mapping::Table;
use supabase::{RemoteError, RemoteStore};

/// Legacy per-date plan object.
const LEGACY_PLANS_KEY: &str = "daily-plans";

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("sign in before migrating")]
    Unauthenticated,

    #[error("migrating {table} failed after {} table(s): {source}", .report.inserted.len())]
    Insert {
        table: Table,
        report: MigrationReport,
        #[source]
        source: RemoteError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything found in the local store, merged across namespaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalSnapshot {
    records: BTreeMap<Collection, Vec<Value>>,
    legacy_plans: Option<serde_json::Map<String, Value>>,
}

impl LocalSnapshot {
    pub fn records(&self, collection: Collection) -> &[Value] {
        self.records.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn legacy_plans(&self) -> Option<&serde_json::Map<String, Value>> {
        self.legacy_plans.as_ref()
    }

    pub fn has(&self, collection: Collection) -> bool {
        self.count(collection) > 0
    }

    /// Array length, plus one for the legacy plan object.
    pub fn count(&self, collection: Collection) -> usize {
        let mut n = self.records(collection).len();
        if collection == Collection::DailyPlan && self.legacy_plans.is_some() {
            n += 1;
        }
        n
    }

    /// Collections with data, in declaration order.
    pub fn collections(&self) -> Vec<Collection> {
        Collection::ALL.into_iter().filter(|c| self.has(*c)).collect()
    }

    pub fn total_items(&self) -> usize {
        Collection::ALL.iter().map(|c| self.count(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Delete rows already inserted when a later insert fails.
    pub rollback_on_failure: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Tables written, in order, with the number of rows each received.
    pub inserted: Vec<(Table, usize)>,
    pub total_items: usize,
    pub rolled_back: bool,
}

impl MigrationReport {
    pub fn rows_inserted(&self) -> usize {
        self.inserted.iter().map(|(_, n)| *n).sum()
    }
}

pub struct Migrator<S, R, P> {
    repo: Arc<Repository<S>>,
    remote: R,
    auth: Arc<AuthGate<P>>,
    options: MigrationOptions,
}

/// Remote ids of rows inserted so far, for rollback.
type Inserted = Vec<(Table, Vec<String>)>;

impl<S, R, P> Migrator<S, R, P>
where
    S: KeyValueStore,
    R: RemoteStore,
    P: IdentityProvider,
{
    pub fn new(repo: Arc<Repository<S>>, remote: R, auth: Arc<AuthGate<P>>) -> Self {
        Self { repo, remote, auth, options: MigrationOptions::default() }
    }

    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Read every collection namespace. Nothing is written.
    pub fn detect(&self) -> LocalSnapshot {
        detect(&self.repo)
    }

    /// Copy every local collection to the remote store for the signed-in
    /// user. Not idempotent; a second run inserts duplicates.
    pub async fn migrate(&self) -> Result<MigrationReport, MigrationError> {
        self.migrate_on(temporal::today()).await
    }

    pub async fn migrate_on(&self, today: NaiveDate) -> Result<MigrationReport, MigrationError> {
        let session = self.auth.current_session().ok_or(MigrationError::Unauthenticated)?;
        let snapshot = self.detect();
        let mut report = MigrationReport { total_items: snapshot.total_items(), ..Default::default() };
        if snapshot.is_empty() {
            log::info!("No local data to migrate");
            return Ok(report);
        }

        log::info!("Migrating {} local item(s) for user {}", report.total_items, session.user.id);
        let mut inserted: Inserted = Vec::new();
        let result = self.run(&session, &snapshot, today, &mut report, &mut inserted).await;

        match result {
            Ok(()) => {
                log::info!("Migration finished: {} row(s) in {} table(s)", report.rows_inserted(), report.inserted.len());
                Ok(report)
            }
            Err((table, source)) => {
                log::error!("Migration of {} failed: {}", table, source);
                if self.options.rollback_on_failure {
                    self.rollback(&session, inserted).await;
                    report.rolled_back = true;
                }
                Err(MigrationError::Insert { table, report, source })
            }
        }
    }

    async fn run(
        &self,
        session: &Session,
        snapshot: &LocalSnapshot,
        today: NaiveDate,
        report: &mut MigrationReport,
        inserted: &mut Inserted,
    ) -> Result<(), (Table, RemoteError)> {
        let user = session.user.id.as_str();

        let notes = mapping::note_rows(snapshot.records(Collection::Notes), user);
        self.insert(session, Table::Notes, &notes, report, inserted).await?;

        let tasks = mapping::task_rows(snapshot.records(Collection::Tasks), user);
        self.insert(session, Table::Tasks, &tasks, report, inserted).await?;

        let (habits, habit_rows): (Vec<_>, Vec<_>) =
            mapping::habit_rows(snapshot.records(Collection::Habits), user).into_iter().unzip();
        let stored = self.insert(session, Table::Habits, &habit_rows, report, inserted).await?;
        // Rows come back in the order sent.
        let remote_ids: HashMap<String, String> = habits
            .iter()
            .zip(&stored)
            .filter_map(|(habit, row)| remote_id(row).map(|id| (habit.id.clone(), id)))
            .collect();
        let completions = mapping::habit_completion_rows(
            &habits,
            snapshot.records(Collection::HabitCompletions),
            &remote_ids,
            user,
        );
        self.insert(session, Table::HabitCompletions, &completions, report, inserted).await?;

        let moods = mapping::mood_rows(snapshot.records(Collection::Mood), user);
        self.insert(session, Table::MoodEntries, &moods, report, inserted).await?;

        let activities = mapping::activity_rows(snapshot.records(Collection::Activities), user);
        self.insert(session, Table::Activities, &activities, report, inserted).await?;

        let lists = mapping::shopping_rows(snapshot.records(Collection::Shopping), user);
        self.insert(session, Table::ShoppingLists, &lists, report, inserted).await?;

        let plans = mapping::daily_plan_rows(
            snapshot.legacy_plans(),
            snapshot.records(Collection::DailyPlan),
            snapshot.records(Collection::Calendar),
            today,
            user,
        );
        self.insert(session, Table::DailyPlans, &plans, report, inserted).await?;

        let dumps = mapping::brain_dump_rows(snapshot.records(Collection::BrainDump), user);
        self.insert(session, Table::BrainDumps, &dumps, report, inserted).await?;

        Ok(())
    }

    async fn insert<T: Serialize + Sync>(
        &self,
        session: &Session,
        table: Table,
        rows: &[T],
        report: &mut MigrationReport,
        inserted: &mut Inserted,
    ) -> Result<Vec<Value>, (Table, RemoteError)> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self
            .remote
            .insert(session, table.name(), rows)
            .await
            .map_err(|e| (table, e))?;
        log::info!("Migrated {} row(s) to {}", rows.len(), table);
        report.inserted.push((table, rows.len()));
        inserted.push((table, stored.iter().filter_map(remote_id).collect()));
        Ok(stored)
    }

    /// Best effort: failures are logged and the remaining tables are still
    /// attempted.
    async fn rollback(&self, session: &Session, inserted: Inserted) {
        for (table, ids) in inserted.into_iter().rev() {
            if ids.is_empty() {
                continue;
            }
            match self.remote.delete(session, table.name(), &ids).await {
                Ok(()) => log::info!("Rolled back {} row(s) from {}", ids.len(), table),
                Err(e) => log::error!("Rollback of {} failed: {}", table, e),
            }
        }
    }

    pub fn clear(&self) -> Result<(), MigrationError> {
        clear_local(&self.repo)?;
        Ok(())
    }
}

/// Snapshot of everything stored locally, across old and new key names.
pub fn detect<S: KeyValueStore>(repo: &Repository<S>) -> LocalSnapshot {
    let mut snapshot = LocalSnapshot::default();
    for collection in Collection::ALL {
        let records = repo.merged_records(collection);
        if !records.is_empty() {
            snapshot.records.insert(collection, records);
        }
    }
    match repo.store().get(LEGACY_PLANS_KEY) {
        Some(Value::Object(plans)) => snapshot.legacy_plans = Some(plans),
        Some(Value::Array(_)) | None => {}
        Some(other) => log::warn!("Ignoring unexpected {} value: {}", LEGACY_PLANS_KEY, other),
    }
    log::debug!("Local snapshot: {} item(s) in {:?}", snapshot.total_items(), snapshot.collections());
    snapshot
}

/// Remove every collection key in every namespace. Settings and the API
/// key are kept.
pub fn clear_local<S: KeyValueStore>(repo: &Repository<S>) -> Result<(), StoreError> {
    for collection in Collection::ALL {
        for key in collection.keys() {
            repo.remove_key(key)?;
        }
    }
    log::info!("Cleared local collections");
    repo.emit(StoreEvent::Cleared);
    Ok(())
}

fn remote_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
