use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tokio::sync::watch;

use crate::application::{App, NewTask};
use crate::config::{AppConfig, ConfigError};
use crate::core::mood::MOOD_OPTIONS;
use crate::core::note::NoteColor;
use crate::core::shopping::ListType;
use crate::core::task::{Category, Priority};
use crate::core::temporal::{self, TimeOfDay};
use crate::error::AppError;
use crate::store::{FileStore, StoreError};
use crate::sync::anthropic::AiClient;
use crate::sync::auth::{AuthError, AuthGate, Credentials, SignUpOutcome};
use crate::sync::supabase::{RemoteError, SupabaseClient};
use crate::sync::{self, keyring, MigrationError, MigrationOptions, Migrator};
use crate::timers::{self, TimerEvent};

#[derive(Parser)]
#[command(name = "zapiszto")]
#[command(about = "Notes, tasks, habits and mood - local first, with optional cloud migration")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log at debug level for this run
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Habits and streaks
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Mood journal
    #[command(subcommand)]
    Mood(MoodCommand),
    /// Shopping lists
    #[command(subcommand)]
    Shop(ShopCommand),
    /// Today's plan
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Brain dump
    #[command(subcommand)]
    Dump(DumpCommand),
    /// Calendar plan entries
    #[command(subcommand)]
    Calendar(CalendarCommand),
    /// Recent activity
    Activity,
    /// User settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Cloud account
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Move local data to the cloud
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Expand a note with AI
    Expand {
        /// Note id
        id: String,
        /// Save the expansion onto the note
        #[arg(long)]
        save: bool,
    },
    /// Keep running: refresh the plan every minute, reset habits at midnight
    Watch,
}

impl Commands {
    /// Migration sees only what the user stored, never seeded defaults.
    pub fn seeds_defaults(&self) -> bool {
        !matches!(self, Commands::Migrate(_))
    }
}

#[derive(Subcommand)]
pub enum NoteCommand {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// primary, secondary, accent or muted
        #[arg(long)]
        color: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// high, medium or low
        #[arg(long)]
        priority: Option<String>,
        /// today, later or ideas
        #[arg(long)]
        category: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Toggle completion
    Done { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum HabitCommand {
    Add {
        name: String,
        #[arg(long, default_value = "Droplets")]
        icon: String,
        #[arg(long, default_value = "primary")]
        color: String,
    },
    List,
    /// Toggle today's completion
    Toggle { id: String },
    /// Weekly and monthly completion, best streak
    Stats {
        id: String,
        /// Month (YYYY-MM), defaults to the current one
        #[arg(long)]
        month: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum MoodCommand {
    /// Record a mood (Happy, Calm, Neutral, Sad, Stressed)
    Add {
        mood: String,
        #[arg(long)]
        note: Option<String>,
    },
    List,
    /// Last seven days
    Week,
}

#[derive(Subcommand)]
pub enum ShopCommand {
    List,
    New {
        name: String,
        #[arg(long)]
        wishlist: bool,
        #[arg(long, default_value = "other")]
        category: String,
    },
    Add {
        list: String,
        item: String,
        #[arg(long)]
        price: Option<f64>,
    },
    Toggle { list: String, item: String },
    Remove { list: String, item: String },
    Delete { list: String },
}

#[derive(Subcommand)]
pub enum PlanCommand {
    Show,
    Add {
        text: String,
        /// morning, afternoon or evening
        #[arg(long)]
        time: Option<String>,
    },
    Toggle { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
pub enum DumpCommand {
    Add { text: String },
    List,
    Sort { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum CalendarCommand {
    Add {
        text: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "morning")]
        time: String,
    },
    List {
        #[arg(long)]
        date: Option<String>,
    },
    Toggle { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,
    Set { field: String, value: String },
    Reset,
    /// Store or clear the AI API key
    ApiKey {
        key: Option<String>,
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args)]
pub struct CredentialArgs {
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Subcommand)]
pub enum AuthCommand {
    Login(CredentialArgs),
    Signup {
        #[command(flatten)]
        credentials: CredentialArgs,
        #[arg(long)]
        confirm: String,
    },
    Logout,
    Status,
}

#[derive(Subcommand)]
pub enum MigrateCommand {
    /// Show what would be migrated
    Detect,
    Run {
        /// Delete already inserted rows if a later table fails
        #[arg(long)]
        rollback: bool,
    },
    /// Delete local collections (settings are kept)
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    InvalidArgument(String),
}

type Result<T> = std::result::Result<T, CliError>;

fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    temporal::parse_day(s).ok_or_else(|| CliError::InvalidArgument(format!("Invalid date '{}'", s)))
}

fn parse_time_arg(s: &str) -> Result<TimeOfDay> {
    TimeOfDay::parse(s).ok_or_else(|| CliError::InvalidArgument(format!("Invalid time of day '{}'", s)))
}

fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn check(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

type LocalApp = App<FileStore>;

pub fn handle_note(app: &LocalApp, cmd: NoteCommand) -> Result<()> {
    match cmd {
        NoteCommand::Add { title, content, tags, color } => {
            let color = match color {
                Some(c) => NoteColor::parse(&c)
                    .ok_or_else(|| CliError::InvalidArgument(format!("Invalid color '{}'", c)))?,
                None => NoteColor::default(),
            };
            let note = app.add_note(&title, &content, &split_tags(tags), color)?;
            println!("Note created (ID: {})", note.id);
        }
        NoteCommand::List { search, tag } => {
            for note in app.search_notes(search.as_deref().unwrap_or(""), tag.as_deref()) {
                let tags = if note.tags.is_empty() { String::new() } else { format!(" #{}", note.tags.join(" #")) };
                println!("{}  {}{}", note.id, note.title, tags);
                if !note.content.is_empty() {
                    println!("    {}", note.content);
                }
            }
        }
        NoteCommand::Edit { id, title, content } => {
            let note = app.edit_note(&id, title.as_deref(), content.as_deref())?;
            println!("Note updated: {}", note.title);
        }
        NoteCommand::Delete { id } => {
            let note = app.delete_note(&id)?;
            println!("Deleted note: {}", note.title);
        }
    }
    Ok(())
}

pub fn handle_task(app: &LocalApp, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::Add { title, description, priority, category, due, tags } => {
            let priority = match priority {
                Some(p) => Priority::parse(&p)
                    .ok_or_else(|| CliError::InvalidArgument(format!("Invalid priority '{}'", p)))?,
                None => Priority::default(),
            };
            let category = match category {
                Some(c) => Category::parse(&c)
                    .ok_or_else(|| CliError::InvalidArgument(format!("Invalid category '{}'", c)))?,
                None => Category::default(),
            };
            let deadline = due.as_deref().map(parse_date_arg).transpose()?;
            let task = app.add_task(NewTask {
                title,
                description,
                priority,
                category,
                tags: split_tags(tags),
                deadline,
            })?;
            println!("Task created (ID: {})", task.id);
        }
        TaskCommand::List { category } => {
            let filter = category.as_deref().map(|c| {
                Category::parse(c).ok_or_else(|| CliError::InvalidArgument(format!("Invalid category '{}'", c)))
            });
            let filter = filter.transpose()?;
            let today = temporal::today();
            for task in app.tasks().into_iter().filter(|t| filter.is_none_or(|c| t.category == c)) {
                let due = match task.deadline {
                    Some(d) if task.is_overdue(today) => format!(" (overdue {})", temporal::format_day(d)),
                    Some(d) => format!(" (due {})", temporal::format_day(d)),
                    None => String::new(),
                };
                println!(
                    "{} {}  {} [{}/{}]{}",
                    check(task.completed),
                    task.id,
                    task.title,
                    task.category.as_str(),
                    task.priority.as_str(),
                    due
                );
            }
        }
        TaskCommand::Done { id } => {
            let task = app.toggle_task(&id)?;
            println!("{} {}", check(task.completed), task.title);
        }
        TaskCommand::Delete { id } => {
            let task = app.delete_task(&id)?;
            println!("Deleted task: {}", task.title);
        }
    }
    Ok(())
}

pub fn handle_habit(app: &LocalApp, cmd: HabitCommand) -> Result<()> {
    let today = temporal::today();
    match cmd {
        HabitCommand::Add { name, icon, color } => {
            let habit = app.add_habit(&name, &icon, &color)?;
            println!("Habit created (ID: {})", habit.id);
        }
        HabitCommand::List => {
            for habit in app.habits() {
                println!(
                    "{} {}  {}  streak {}  week {}%",
                    check(habit.completed),
                    habit.id,
                    habit.name,
                    habit.streak,
                    habit.weekly_completion(today)
                );
            }
        }
        HabitCommand::Toggle { id } => {
            let habit = app.toggle_habit(&id, today)?;
            println!("{} {}  streak {}", check(habit.completed), habit.name, habit.streak);
        }
        HabitCommand::Stats { id, month } => {
            let habit = app
                .habits()
                .into_iter()
                .find(|h| h.id == id)
                .ok_or_else(|| AppError::not_found("habit", id.as_str()))?;
            let (year, month) = match month {
                Some(m) => {
                    let first = parse_date_arg(&format!("{}-01", m))?;
                    (first.year(), first.month())
                }
                None => (today.year(), today.month()),
            };
            println!("{}", habit.name);
            println!("  current streak: {}", habit.streak);
            println!("  best streak:    {}", habit.best_streak());
            println!("  this week:      {}%", habit.weekly_completion(today));
            println!("  {}-{:02}:        {}%", year, month, habit.monthly_completion(year, month));
        }
        HabitCommand::Delete { id } => {
            let habit = app.delete_habit(&id)?;
            println!("Deleted habit: {}", habit.name);
        }
    }
    Ok(())
}

pub fn handle_mood(app: &LocalApp, cmd: MoodCommand) -> Result<()> {
    match cmd {
        MoodCommand::Add { mood, note } => {
            let entry = app.record_mood(&mood, note).map_err(|e| match e {
                AppError::InvalidInput(msg) => {
                    let names: Vec<&str> = MOOD_OPTIONS.iter().map(|m| m.name).collect();
                    CliError::InvalidArgument(format!("{} (choose from {})", msg, names.join(", ")))
                }
                other => other.into(),
            })?;
            println!("{} {} recorded", entry.emoji, entry.mood);
        }
        MoodCommand::List => {
            for entry in app.mood_entries() {
                let day = entry.day().map(temporal::format_day).unwrap_or_default();
                let note = entry.note.as_deref().map(|n| format!("  {}", n)).unwrap_or_default();
                println!("{}  {} {}{}", day, entry.emoji, entry.mood, note);
            }
        }
        MoodCommand::Week => match app.weekly_mood() {
            Some(week) => {
                let trend = match week.trend {
                    t if t > 0 => "improving",
                    t if t < 0 => "declining",
                    _ => "steady",
                };
                println!("{} entries, average {:.1}/5, {}", week.count, week.average, trend);
            }
            None => println!("No mood entries in the last seven days"),
        },
    }
    Ok(())
}

pub fn handle_shop(app: &LocalApp, cmd: ShopCommand) -> Result<()> {
    match cmd {
        ShopCommand::List => {
            for list in app.shopping_lists() {
                println!("{}  {} ({} left, {:.2} open)", list.id, list.name, list.remaining(), list.open_total());
                for item in &list.items {
                    let price = item.price.map(|p| format!(" {:.2}", p)).unwrap_or_default();
                    println!("    {} {}  {}{}", check(item.completed), item.id, item.name, price);
                }
            }
        }
        ShopCommand::New { name, wishlist, category } => {
            let list_type = if wishlist { ListType::Wishlist } else { ListType::Daily };
            let list = app.add_shopping_list(&name, list_type, &category)?;
            println!("List created (ID: {})", list.id);
        }
        ShopCommand::Add { list, item, price } => {
            let item = app.add_shopping_item(&list, &item, price)?;
            println!("Item added (ID: {})", item.id);
        }
        ShopCommand::Toggle { list, item } => {
            let done = app.toggle_shopping_item(&list, &item)?;
            println!("{}", check(done));
        }
        ShopCommand::Remove { list, item } => {
            app.remove_shopping_item(&list, &item)?;
            println!("Item removed");
        }
        ShopCommand::Delete { list } => {
            let list = app.delete_shopping_list(&list)?;
            println!("Deleted list: {}", list.name);
        }
    }
    Ok(())
}

fn print_plan(greeting: &str, plan: &crate::core::day_plan::DayPlan) {
    let (done, total) = plan.progress();
    println!("{} - {} ({}/{} done)", greeting, temporal::format_day(plan.date), done, total);
    let buckets = [
        (Some(TimeOfDay::Morning), "Morning"),
        (Some(TimeOfDay::Afternoon), "Afternoon"),
        (Some(TimeOfDay::Evening), "Evening"),
        (None, "Anytime"),
    ];
    for (time, label) in buckets {
        let items: Vec<_> = plan.by_time(time).collect();
        if items.is_empty() {
            continue;
        }
        println!("  {}", label);
        for item in items {
            println!("    {} {}  {} ({})", check(item.completed), item.id, item.text, item.source.label());
        }
    }
}

pub fn handle_plan(app: &LocalApp, cmd: PlanCommand) -> Result<()> {
    let today = temporal::today();
    match cmd {
        PlanCommand::Show => print_plan(TimeOfDay::current().greeting(), &app.today_plan(today)),
        PlanCommand::Add { text, time } => {
            let time = time.as_deref().map(parse_time_arg).transpose()?;
            let item = app.add_plan_item(&text, time)?;
            println!("Planned (ID: {})", item.id);
        }
        PlanCommand::Toggle { id } => {
            let done = app.toggle_plan_item(&id, today)?;
            println!("{}", check(done));
        }
        PlanCommand::Remove { id } => {
            let item = app.remove_plan_item(&id)?;
            println!("Removed: {}", item.text);
        }
    }
    Ok(())
}

pub fn handle_dump(app: &LocalApp, cmd: DumpCommand) -> Result<()> {
    match cmd {
        DumpCommand::Add { text } => {
            let entry = app.add_thought(&text)?;
            println!("Thought saved (ID: {})", entry.id);
        }
        DumpCommand::List => {
            let (sorted, unsorted): (Vec<_>, Vec<_>) = app.brain_dump().into_iter().partition(|e| e.is_sorted());
            for (label, entries) in [("Unsorted", unsorted), ("Sorted", sorted)] {
                if entries.is_empty() {
                    continue;
                }
                println!("{}", label);
                for e in entries {
                    println!("  {}  {}", e.id, e.content);
                }
            }
        }
        DumpCommand::Sort { id } => {
            app.mark_sorted(&id)?;
            println!("Marked as sorted");
        }
        DumpCommand::Delete { id } => {
            app.delete_thought(&id)?;
            println!("Deleted");
        }
    }
    Ok(())
}

pub fn handle_calendar(app: &LocalApp, cmd: CalendarCommand) -> Result<()> {
    match cmd {
        CalendarCommand::Add { text, date, time } => {
            let entry = app.add_calendar_entry(&text, parse_date_arg(&date)?, parse_time_arg(&time)?)?;
            println!("Entry added (ID: {})", entry.id);
        }
        CalendarCommand::List { date } => {
            let day = match date {
                Some(d) => parse_date_arg(&d)?,
                None => temporal::today(),
            };
            for e in app.calendar_entries(day) {
                println!("{} {}  {} ({})", check(e.completed), e.id, e.text, e.time_of_day.label());
            }
        }
        CalendarCommand::Toggle { id } => {
            let e = app.toggle_calendar_entry(&id)?;
            println!("{} {}", check(e.completed), e.text);
        }
        CalendarCommand::Delete { id } => {
            let e = app.delete_calendar_entry(&id)?;
            println!("Deleted: {}", e.text);
        }
    }
    Ok(())
}

pub fn handle_activity(app: &LocalApp) -> Result<()> {
    for a in app.recent_activity() {
        let local = a.timestamp.with_timezone(&chrono::Local);
        println!("{}  [{}] {}", local.format("%Y-%m-%d %H:%M"), a.kind.as_str(), a.text);
    }
    Ok(())
}

pub fn handle_settings(app: &LocalApp, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            let json = serde_json::to_string_pretty(&app.settings()).map_err(StoreError::from)?;
            println!("{}", json);
        }
        SettingsCommand::Set { field, value } => {
            app.update_setting(&field, &value)?;
            println!("Saved");
        }
        SettingsCommand::Reset => {
            app.reset_settings()?;
            println!("Settings reset");
        }
        SettingsCommand::ApiKey { key, clear } => {
            if clear {
                app.set_stored_api_key(None)?;
                println!("API key removed");
            } else if let Some(key) = key {
                app.set_stored_api_key(Some(&key))?;
                println!("API key saved");
            } else {
                let state = if app.stored_api_key().is_some() { "set" } else { "not set" };
                println!("API key {}", state);
            }
        }
    }
    Ok(())
}

/// Remote client plus an auth gate primed from the keyring.
async fn connect(config: &AppConfig) -> Result<(SupabaseClient, AuthGate<SupabaseClient>)> {
    let client = SupabaseClient::new(&config.supabase_url, &config.supabase_anon_key, config.request_timeout())?;
    let gate = AuthGate::new(client.clone());
    match keyring::load_session(client.base_url()).await {
        Ok(Some(session)) => {
            if session.is_expired(chrono::Utc::now().timestamp()) {
                log::info!("Stored session has expired");
            } else {
                gate.restore(session);
            }
        }
        Ok(None) => {}
        Err(e) => log::warn!("Could not read stored session: {}", e),
    }
    Ok((client, gate))
}

pub async fn handle_auth(config: &AppConfig, cmd: AuthCommand) -> Result<()> {
    let (client, gate) = connect(config).await?;
    let server = client.base_url();
    match cmd {
        AuthCommand::Login(args) => {
            let session = gate.sign_in(&Credentials::new(args.email, args.password)).await?;
            keyring::store_session(server, &session).await?;
            println!("Signed in as {}", session.user.email.as_deref().unwrap_or(&session.user.id));
        }
        AuthCommand::Signup { credentials, confirm } => {
            let creds = Credentials::new(credentials.email, credentials.password);
            match gate.sign_up(&creds, &confirm).await? {
                SignUpOutcome::SignedIn(session) => {
                    keyring::store_session(server, &session).await?;
                    println!("Account created, signed in");
                }
                SignUpOutcome::ConfirmationRequired(_) => {
                    println!("Account created, check your email to confirm it");
                }
            }
        }
        AuthCommand::Logout => {
            let result = gate.sign_out().await;
            keyring::delete_session(server).await?;
            result?;
            println!("Signed out");
        }
        AuthCommand::Status => match gate.current_user() {
            Some(user) => println!("Signed in as {}", user.email.as_deref().unwrap_or(&user.id)),
            None => println!("Not signed in"),
        },
    }
    Ok(())
}

fn print_snapshot(snapshot: &sync::LocalSnapshot) {
    if snapshot.is_empty() {
        println!("No local data");
        return;
    }
    for collection in snapshot.collections() {
        println!("  {:<18} {}", collection.name(), snapshot.count(collection));
    }
    println!("  {:<18} {}", "total", snapshot.total_items());
}

pub async fn handle_migrate(config: &AppConfig, app: &LocalApp, cmd: MigrateCommand) -> Result<()> {
    match cmd {
        MigrateCommand::Detect => print_snapshot(&sync::detect(app.repo())),
        MigrateCommand::Run { rollback } => {
            let (client, gate) = connect(config).await?;
            let migrator = Migrator::new(Arc::clone(app.repo()), client, Arc::new(gate))
                .with_options(MigrationOptions { rollback_on_failure: rollback });
            let report = migrator.migrate().await?;
            if report.inserted.is_empty() {
                println!("Nothing to migrate");
            } else {
                for (table, rows) in &report.inserted {
                    println!("  {:<18} {}", table.name(), rows);
                }
                println!(
                    "Migrated {} row(s) from {} local item(s) to the cloud",
                    report.rows_inserted(),
                    report.total_items
                );
            }
        }
        MigrateCommand::Clear { yes } => {
            if !yes {
                return Err(CliError::InvalidArgument(
                    "This deletes all local data. Re-run with --yes to confirm.".into(),
                ));
            }
            sync::clear_local(app.repo())?;
            println!("Local data cleared");
        }
    }
    Ok(())
}

pub async fn handle_expand(config: &AppConfig, app: &LocalApp, id: &str, save: bool) -> Result<()> {
    let note = app
        .notes()
        .into_iter()
        .find(|n| n.id == id)
        .ok_or_else(|| AppError::not_found("note", id))?;
    let key = config.anthropic_api_key.clone().or_else(|| app.stored_api_key());
    let client = AiClient::new(key, &config.ai_model, config.request_timeout())
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let expansion = client.expand_note(&note.title, &note.content).await;
    if let Some(warning) = &expansion.warning {
        eprintln!("warning: {}", warning);
    }
    println!("{}", expansion.content);
    if save {
        app.save_note_expansion(&note.id, &expansion.content)?;
        println!("\nSaved to note");
    }
    Ok(())
}

pub async fn handle_watch(app: &LocalApp) -> Result<()> {
    let (tx, rx) = watch::channel(false);
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
        }
        let _ = tx.send(true);
    };
    let timers = timers::run(app, rx, |event| match event {
        TimerEvent::PlanRefreshed { greeting, plan } => print_plan(greeting, &plan),
        TimerEvent::HabitsReset { changed } => println!("New day: {} habit(s) reset", changed),
    });
    tokio::join!(timers, ctrl_c);
    Ok(())
}
