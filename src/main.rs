use std::path::PathBuf;

use clap::Parser;

use zapiszto::application::App;
use zapiszto::cli::{self, Cli, Commands};
use zapiszto::config::AppConfig;
use zapiszto::core::temporal;
use zapiszto::store::FileStore;

/// Logs to the systemd user journal (`journalctl --user -t zapiszto -f`).
/// This crate logs at info/debug (per config), everything else at warn.
struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

impl log::Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.target().starts_with("zapiszto") {
            let max = if zapiszto::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            metadata.level() <= max
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }
    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }
    fn flush(&self) {
        self.inner.flush();
    }
}

fn init_logging(debug: bool) {
    zapiszto::set_debug_logging(debug);
    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("zapiszto".to_string()),
        Err(e) => {
            eprintln!("journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so our debug logs can pass through when enabled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let config_path = args.config.as_ref().map(PathBuf::from).unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load_or_create(&config_path)?;
    init_logging(args.debug || config.debug_logging);

    let app = App::open(FileStore::open(config.store_dir())?);
    if args.command.seeds_defaults() {
        app.init(temporal::today())?;
    }

    match args.command {
        Commands::Note(cmd) => cli::handle_note(&app, cmd)?,
        Commands::Task(cmd) => cli::handle_task(&app, cmd)?,
        Commands::Habit(cmd) => cli::handle_habit(&app, cmd)?,
        Commands::Mood(cmd) => cli::handle_mood(&app, cmd)?,
        Commands::Shop(cmd) => cli::handle_shop(&app, cmd)?,
        Commands::Plan(cmd) => cli::handle_plan(&app, cmd)?,
        Commands::Dump(cmd) => cli::handle_dump(&app, cmd)?,
        Commands::Calendar(cmd) => cli::handle_calendar(&app, cmd)?,
        Commands::Activity => cli::handle_activity(&app)?,
        Commands::Settings(cmd) => cli::handle_settings(&app, cmd)?,
        Commands::Auth(cmd) => cli::handle_auth(&config, cmd).await?,
        Commands::Migrate(cmd) => cli::handle_migrate(&config, &app, cmd).await?,
        Commands::Expand { id, save } => cli::handle_expand(&config, &app, &id, save).await?,
        Commands::Watch => cli::handle_watch(&app).await?,
    }

    Ok(())
}
