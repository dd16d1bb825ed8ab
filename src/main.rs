mod companion;
mod config;
mod error;
mod journal;
mod journal_entry;
mod logging;
mod record_store;
mod sentiment;
mod stats;
mod ui;
mod wellness;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use companion::{CannedCompanion, Companion, RemoteCompanion};
use config::{CompanionMode, Config};
use journal::Journal;
use record_store::JsonStore;
use sentiment::LexiconScorer;
use std::path::PathBuf;
use tracing::{error, info, warn};
use ui::{Action, ExerciseChoice, ExportKind, UI};

const RECENT_ON_HOME: usize = 5;

/// Personal journal with mood tracking and a supportive chat companion.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the directory holding users, entries and chat history
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

fn build_companion(config: &Config) -> Companion {
    match config.companion.mode {
        CompanionMode::Canned => Companion::Canned(CannedCompanion),
        CompanionMode::Remote => {
            let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
                warn!("OPENAI_API_KEY not set, using canned replies");
                return Companion::Canned(CannedCompanion);
            };
            match RemoteCompanion::new(&config.companion, Some(api_key)) {
                Ok(remote) => Companion::Remote(remote),
                Err(e) => {
                    warn!(error = %e, "remote companion unavailable, using canned replies");
                    Companion::Canned(CannedCompanion)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(Config::default_path)
        .ok_or_else(|| eyre!("no config directory available, pass --config"))?;
    let mut config = Config::load(&config_path)?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    let _guard = logging::init(&config.logging, &config.log_dir())?;

    let store = JsonStore::open(&config.storage.data_dir)?;
    info!(data_dir = %store.dir().display(), "starting mood journal");

    let journal = Journal::new(
        store,
        Box::new(LexiconScorer),
        build_companion(&config),
        config.export.directory.clone(),
    );

    let mut current_user: Option<String> = None;
    let mut status = String::new();
    let mut ui = UI::new()?;

    loop {
        let recent = match &current_user {
            Some(user) => {
                let mut entries = journal.entries_for(user);
                entries.truncate(RECENT_ON_HOME);
                entries
            }
            None => Vec::new(),
        };
        ui.display(current_user.as_deref(), &recent, &status)?;

        let Some(action) = ui.handle_input(current_user.is_some())? else {
            continue;
        };
        if matches!(action, Action::Quit) {
            break;
        }

        let user = match (&action, &current_user) {
            (Action::Login | Action::Register, _) => None,
            (_, Some(user)) => Some(user.clone()),
            (_, None) => {
                status = "Please log in first".to_string();
                continue;
            }
        };

        status = match (action, user) {
            (Action::Login, _) => match ui.prompt_credentials("Log in", false)? {
                Some(creds) => match journal.login(&creds.username, &creds.password) {
                    Ok(name) => {
                        let greeting = format!("Welcome back, {name}!");
                        current_user = Some(name);
                        greeting
                    }
                    Err(e) => e.to_string(),
                },
                None => String::new(),
            },
            (Action::Register, _) => match ui.prompt_credentials("Create account", true)? {
                Some(creds) => {
                    match journal.register(&creds.username, &creds.password, &creds.confirm) {
                        Ok(name) => {
                            let greeting = format!("Account created. Welcome, {name}!");
                            current_user = Some(name);
                            greeting
                        }
                        Err(e) => e.to_string(),
                    }
                }
                None => String::new(),
            },
            (Action::Logout, _) => {
                current_user = None;
                "Logged out".to_string()
            }
            (Action::Write, Some(user)) => match ui.get_new_entry()? {
                Some(new) => match journal.add_entry(&user, new) {
                    Ok(_) => "Entry saved".to_string(),
                    Err(e) => {
                        error!(error = %e, "failed to save entry");
                        e.to_string()
                    }
                },
                None => "Entry discarded".to_string(),
            },
            (Action::View, Some(user)) => {
                ui.view_entries("Your Entries", &journal.entries_for(&user))?;
                String::new()
            }
            (Action::Search, Some(user)) => match ui.get_search_query()? {
                Some(query) => {
                    let results = journal.search_entries(&user, &query);
                    ui.view_entries(&format!("Results for \"{query}\""), &results)?;
                    format!("{} matching entries", results.len())
                }
                None => String::new(),
            },
            (Action::Stats, Some(user)) => {
                let now = chrono::Local::now();
                let stats = journal.weekly_stats(&user, now);
                let achievements = journal.achievements(&user, now.date_naive());
                let mut rng = rand::thread_rng();
                ui.show_stats(
                    &stats,
                    &achievements,
                    wellness::random_affirmation(&mut rng),
                    wellness::wellness_tip(&mut rng),
                )?;
                String::new()
            }
            (Action::Exercises, Some(user)) => match ui.choose_exercise()? {
                Some(ExerciseChoice::Guided(exercise)) => {
                    let today = chrono::Local::now().date_naive();
                    if ui.show_exercise(exercise, today)? {
                        match journal.record_exercise(&user, exercise) {
                            Ok(_) => format!("Saved: {}", exercise.title()),
                            Err(e) => e.to_string(),
                        }
                    } else {
                        String::new()
                    }
                }
                Some(ExerciseChoice::QuickWorkout) => {
                    ui.show_quick_workout()?;
                    String::new()
                }
                None => String::new(),
            },
            (Action::Chat, Some(user)) => {
                let mut transcript = journal.transcript(&user);
                while let Some(message) = ui.read_chat_message(&transcript)? {
                    journal.chat(&user, &message).await;
                    transcript = journal.transcript(&user);
                }
                String::new()
            }
            (Action::Export, Some(user)) => {
                let today = chrono::Local::now().date_naive();
                let written = match ui.choose_export()? {
                    Some(ExportKind::Json) => Some(journal.export_json(&user, today)),
                    Some(ExportKind::Report) => Some(journal.export_report(&user, today)),
                    None => None,
                };
                match written {
                    Some(Ok(Some(path))) => format!("Exported to {}", path.display()),
                    Some(Ok(None)) => "No entries to export".to_string(),
                    Some(Err(e)) => {
                        error!(error = %e, "export failed");
                        e.to_string()
                    }
                    None => String::new(),
                }
            }
            (Action::Delete, Some(user)) => {
                if ui.confirm_delete()? {
                    match journal.delete_account(&user) {
                        Ok(()) => {
                            current_user = None;
                            "Account deleted".to_string()
                        }
                        Err(e) => e.to_string(),
                    }
                } else {
                    "Deletion cancelled".to_string()
                }
            }
            (_, _) => String::new(),
        };
    }

    info!("shutting down");
    Ok(())
}
