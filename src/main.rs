// Main entry point
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mtrans::application::completion::Completion;
use mtrans::domain::language::{DetectedLanguage, LanguageCode, KNOWN_LANGUAGES};
use mtrans::domain::model::{Generation, TranslationItem};
use mtrans::domain::traits::KeyValueStore;
use mtrans::infrastructure;
use mtrans::infrastructure::config::load_config;
use mtrans::infrastructure::storage::db::{init_database, SqliteStore};
use mtrans::infrastructure::storage::memory::MemoryStore;
use mtrans::interfaces::cli::Cli;
use mtrans::presentation::render::{format_errors, format_history, format_translation, TranslationView};
use mtrans::presentation::theme::Theme;
use mtrans::state::AppState;
use mtrans::OrchestratorEvent;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};

/// One finished request, as printed with `--json`.
#[derive(Serialize)]
struct JsonResult<'a> {
    text: &'a str,
    detected_language: String,
    target_language: String,
    translations: &'a [TranslationItem],
    timed_out: Vec<String>,
}

struct Finished {
    detected: DetectedLanguage,
    target: LanguageCode,
    completion: Completion,
    results: Vec<TranslationItem>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config()?;

    if let Some(target) = &cli.target {
        if LanguageCode::known(target).is_none() {
            let known: Vec<&str> = KNOWN_LANGUAGES.iter().map(|(code, _)| *code).collect();
            eprintln!(
                "{}",
                format!("Unsupported language '{}' (known: {})", target, known.join(", ")).red()
            );
            std::process::exit(1);
        }
        config.target_language = target.clone();
    }

    // Initialize logging
    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    if cli.generate_config {
        infrastructure::config::generate_config_sample()?;
        return Ok(());
    }
    if cli.edit_config {
        if let Some(config_path) = infrastructure::config::get_config_path() {
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let config_path_clone = config_path.clone();
            // Run editor in blocking task
            tokio::task::spawn_blocking(move || {
                std::process::Command::new(editor)
                    .arg(&config_path_clone)
                    .status()
            })
            .await??;
        } else {
            eprintln!("{}", "Config file not found".red());
        }
        return Ok(());
    }

    // Persistent store unless running ephemeral
    let (store, sqlite): (Arc<dyn KeyValueStore>, Option<SqliteStore>) = if cli.ephemeral {
        (Arc::new(MemoryStore::new()), None)
    } else {
        let db_path = infrastructure::config::get_database_path();
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let sqlite = SqliteStore::new(init_database(&db_path).await?);
        (Arc::new(sqlite.clone()), Some(sqlite))
    };

    let theme_name = cli.theme.clone().unwrap_or_else(|| config.theme.clone());
    let theme = Theme::from_name(&theme_name);
    let state = AppState::new(store, config)?;

    if cli.status {
        print_status(&state, sqlite.as_ref()).await?;
        return Ok(());
    }

    // History and error log management
    let mut managed = false;
    if cli.clear_history {
        state.history.clear().await?;
        println!("Translation history cleared");
        managed = true;
    }
    if cli.clear_errors {
        state.errors.clear().await?;
        println!("Error log cleared");
        managed = true;
    }
    if cli.history {
        let entries = state.history.get_all().await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            print!("{}", format_history(&entries, &theme));
        }
        managed = true;
    }
    if cli.errors {
        let entries = state.errors.get_all().await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            print!("{}", format_errors(&entries, &theme));
        }
        managed = true;
    }
    if managed {
        return Ok(());
    }

    if cli.query.is_empty() {
        return interactive(&state, &theme, cli.json).await;
    }

    let query = cli.query.join(" ");
    translate_once(&state, &query, &theme, cli.json).await
}

/// Translate a single query and wait for completion.
async fn translate_once(
    state: &AppState,
    query: &str,
    theme: &Theme,
    json: bool,
) -> anyhow::Result<()> {
    let mut events = state.orchestrator.subscribe();
    let Some(generation) = state.orchestrator.submit(query) else {
        eprintln!("{}", "Please provide text to translate".red());
        std::process::exit(1);
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Translating...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let finished = tokio::select! {
        finished = wait_for_completion(&mut events, generation, Some(&spinner)) => finished,
        _ = tokio::signal::ctrl_c() => {
            spinner.finish_and_clear();
            eprintln!("\nInterrupted");
            return Ok(());
        }
    };
    spinner.finish_and_clear();

    if let Some(finished) = finished {
        print_finished(query, &finished, theme, json)?;
    }
    Ok(())
}

/// Each stdin line is a new request and replaces the one in flight.
async fn interactive(state: &AppState, theme: &Theme, json: bool) -> anyhow::Result<()> {
    let orchestrator = &state.orchestrator;
    let mut events = orchestrator.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<(Generation, String)> = None;

    eprintln!(
        "{}",
        "Enter text to translate (:swap, :auto, :q)".bright_black()
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: let the last request finish
                    if let Some((generation, text)) = last.take() {
                        if orchestrator.snapshot().loading {
                            if let Some(finished) = wait_for_completion(&mut events, generation, None).await {
                                print_finished(&text, &finished, theme, json)?;
                            }
                        }
                    }
                    break;
                };
                match line.trim() {
                    ":q" | ":quit" => break,
                    ":swap" => match orchestrator.swap_languages() {
                        Some(target) => {
                            eprintln!("{}", format!("target → {}", target).bright_black());
                            let view = orchestrator.snapshot();
                            last = Some((view.generation, view.original_text));
                        }
                        None => eprintln!("{}", "Nothing to swap yet".yellow()),
                    },
                    ":auto" => {
                        orchestrator.clear_override();
                        eprintln!("{}", "target → auto".bright_black());
                    }
                    text => {
                        if let Some(generation) = orchestrator.submit(text) {
                            last = Some((generation, text.to_string()));
                        }
                    }
                }
            }
            event = events.recv() => match event {
                Ok(OrchestratorEvent::Completed { generation, detected, target, completion, results }) => {
                    if let Some((current, text)) = &last {
                        if *current == generation {
                            let finished = Finished { detected, target, completion, results };
                            print_finished(text, &finished, theme, json)?;
                            last = None;
                        }
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nInterrupted, exiting");
                break;
            }
        }
    }

    Ok(())
}

async fn wait_for_completion(
    events: &mut broadcast::Receiver<OrchestratorEvent>,
    generation: Generation,
    spinner: Option<&ProgressBar>,
) -> Option<Finished> {
    loop {
        match events.recv().await {
            Ok(OrchestratorEvent::Completed {
                generation: g,
                detected,
                target,
                completion,
                results,
            }) if g == generation => {
                return Some(Finished {
                    detected,
                    target,
                    completion,
                    results,
                });
            }
            Ok(OrchestratorEvent::ResultsUpdated {
                generation: g,
                results,
            }) if g == generation => {
                if let Some(spinner) = spinner {
                    spinner.set_message(format!("Translating... ({} ready)", results.len()));
                }
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return None,
        }
    }
}

fn print_finished(text: &str, finished: &Finished, theme: &Theme, json: bool) -> anyhow::Result<()> {
    if json {
        let timed_out = match &finished.completion {
            Completion::ForcedCompleted { abandoned } => {
                abandoned.iter().map(|p| p.to_string()).collect()
            }
            Completion::Completed => Vec::new(),
        };
        let output = JsonResult {
            text,
            detected_language: finished.detected.to_string(),
            target_language: finished.target.to_string(),
            translations: &finished.results,
            timed_out,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let detected = finished.detected.to_string();
        let target = finished.target.to_string();
        print!(
            "{}",
            format_translation(
                &TranslationView {
                    text,
                    detected: &detected,
                    target: &target,
                    results: &finished.results,
                    completion: Some(&finished.completion),
                },
                theme,
            )
        );
    }
    Ok(())
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &infrastructure::config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match logging.level.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            // Log to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    // Log to stderr (default)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn print_status(state: &AppState, sqlite: Option<&SqliteStore>) -> anyhow::Result<()> {
    println!("{}", "mtrans Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match sqlite {
        Some(db) => {
            let db_path = infrastructure::config::get_database_path();
            println!("Database: {} ({} keys)", db_path.display(), db.count().await?);
        }
        None => println!("Database: in memory (ephemeral)"),
    }

    println!("History: {} entries", state.history.get_all().await?.len());
    println!("Error log: {} entries", state.errors.get_all().await?.len());

    println!(
        "Config: {}",
        infrastructure::config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );

    let config = state.config.read().await;
    let settings = config.settings();
    println!(
        "Default target: {} ({})",
        settings.default_target_language,
        settings.default_target_language.display_name()
    );
    println!("Timeout: {} ms", config.timeout_ms);
    if settings.gemini_key().is_some() {
        println!("Gemini API: Configured (model: {})", settings.gemini_model);
    } else {
        println!("Gemini API: Not configured");
    }

    Ok(())
}
