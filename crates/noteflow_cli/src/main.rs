//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one scripted autosave session against SQLite.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `noteflow_cli [DB_PATH] [--config JSON] [--log-dir ABS_DIR] [--log-level LEVEL]`
//! Without `DB_PATH` an in-memory database is used.

use clap::Parser;
use log::info;
use noteflow_core::{
    core_version, init_logging, AutosaveConfig, AutosaveEngine, ContentDoc, EditorBuffer,
    LogLevel, ManualClock, MemoryEditor, SqliteNoteStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

/// Scripted autosave session against a SQLite note store.
#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(version, about)]
struct Args {
    /// Database file; an in-memory database is used when omitted.
    db_path: Option<PathBuf>,

    /// JSON file with autosave overrides.
    #[arg(long = "config")]
    config_path: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(long, value_parser = LogLevel::from_str)]
    log_level: Option<LogLevel>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.unwrap_or_else(LogLevel::default_for_build);
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let config = match load_config(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    let store = match &args.db_path {
        Some(path) => SqliteNoteStore::open(path),
        None => SqliteNoteStore::open_in_memory(),
    };
    let store = match store {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("noteflow_core version={}", core_version());
    run_session(store, config);
    info!(
        "event=cli_run module=cli status=ok db={}",
        args.db_path
            .as_deref()
            .map_or_else(|| ":memory:".to_string(), |path| path.display().to_string())
    );
    ExitCode::SUCCESS
}

fn load_config(path: Option<&Path>) -> Result<AutosaveConfig, String> {
    let Some(path) = path else {
        return Ok(AutosaveConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
    AutosaveConfig::from_json_str(&raw).map_err(|err| err.to_string())
}

fn run_session(store: SqliteNoteStore, config: AutosaveConfig) {
    let clock = ManualClock::new(0);
    let mut engine = AutosaveEngine::with_clock(
        store,
        MemoryEditor::default(),
        config,
        Box::new(clock.clone()),
    );
    engine.start();
    clock.advance(500);

    engine.create_draft();
    clock.advance(500);
    println!("state={:?} active={}", engine.state(), engine.active_ref());

    engine.on_title_changed("Shopping");
    let content = ContentDoc::from_plain_text("milk\neggs");
    engine.editor_mut().type_content(content.clone());
    engine.on_content_changed(content);
    println!("state={:?} intent={:?}", engine.state(), engine.save_intent());

    clock.advance(i64::try_from(engine.config().content_debounce_ms).unwrap_or(i64::MAX));
    if let Some(outcome) = engine.tick() {
        println!("tick outcome={outcome:?} active={}", engine.active_ref());
    }

    let content = ContentDoc::from_plain_text("milk\neggs\nbread");
    engine.editor_mut().type_content(content);
    clock.advance(300);
    println!("blur outcome={:?}", engine.on_blur());
    println!(
        "editor text={:?}",
        engine.editor().get_content().plain_text()
    );

    for item in engine.list_view() {
        println!(
            "note id={} title={:?} preview={:?} active={}",
            item.id,
            item.title,
            item.preview.unwrap_or_default(),
            item.is_active
        );
    }
    for notification in engine.take_notifications() {
        println!(
            "notification level={:?} message={:?}",
            notification.level(),
            notification.message
        );
    }
}
