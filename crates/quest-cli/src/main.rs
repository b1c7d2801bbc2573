//! Quest CLI
//!
//! Main entry point for working through guided coding lessons against a
//! remote execution service.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quest_executor::ExecutionClient;
use quest_orchestrator::{
    Config, LessonCatalog, LessonProgressTracker, Orchestrator, ProgressEvent, RunOutcome,
};
use tracing_subscriber::EnvFilter;

/// Quest - Guided Coding Lessons
///
/// Submits your source code to a remote execution service and walks you
/// through a sequence of lessons that check the program's output.
#[derive(Parser, Debug)]
#[command(name = "quest")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: quest.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Override the execution service base URL from the config
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Override the request timeout in seconds from the config
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a source file once and evaluate it against the current step
    Run {
        /// Path to the source file to execute
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Language id; inferred from the file extension when omitted
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Standard input supplied to the program
        #[arg(long, value_name = "TEXT")]
        stdin: Option<String>,
    },

    /// List every level and lesson in the catalog
    Lessons,

    /// Work through the lessons interactively
    Study {
        /// Language id used for every submission
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run_quest(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Dispatches the selected subcommand.
async fn run_quest(args: Args) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let config = apply_overrides(config, args.base_url, args.timeout_secs)?;

    match args.command {
        Command::Run {
            file,
            language,
            stdin,
        } => {
            let language = language
                .map_or_else(|| language_from_extension(&file), Ok)?;
            let mut orchestrator = build_orchestrator(&config)?;
            let source = std::fs::read_to_string(&file)
                .map_err(|e| anyhow::anyhow!("failed to read '{}': {e}", file.display()))?;

            let outcome = orchestrator
                .run_with_stdin(&language, &source, stdin.as_deref().unwrap_or_default())
                .await;
            print_outcome(&outcome, orchestrator.tracker());
            Ok(if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Lessons => {
            print_catalog(&load_catalog(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Study { language } => {
            let language = language.unwrap_or_else(|| config.default_language.clone());
            let mut orchestrator = build_orchestrator(&config)?;
            study_loop(&mut orchestrator, &language).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads configuration from an explicit path or the current directory.
fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(Path::new(path))?,
        None => Config::load()?,
    };
    tracing::debug!(base_url = %config.base_url, "configuration loaded");
    Ok(config)
}

/// Applies command-line overrides to the loaded configuration.
///
/// Overridden values pass through the same validation as file values, so
/// `--timeout-secs 0` is rejected just like `"timeoutSecs": 0` would be.
fn apply_overrides(
    mut config: Config,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<Config> {
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    config.validate()?;
    Ok(config)
}

/// Loads the lesson catalog named by the config, or the built-in one.
fn load_catalog(config: &Config) -> anyhow::Result<LessonCatalog> {
    Ok(match &config.catalog {
        Some(path) => LessonCatalog::load(path)?,
        None => LessonCatalog::builtin(),
    })
}

/// Builds a production orchestrator from the configuration.
fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator<ExecutionClient>> {
    let client = ExecutionClient::with_options(
        &config.base_url,
        config.language_versions.clone(),
        config.timeout(),
    )?;
    let tracker = LessonProgressTracker::new(Arc::new(load_catalog(config)?));
    Ok(Orchestrator::new(client, tracker))
}

/// Maps a source file extension to a language id.
fn language_from_extension(file: &Path) -> anyhow::Result<String> {
    let ext = file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    match ext {
        "py" => Ok("python".to_string()),
        "js" => Ok("javascript".to_string()),
        "java" => Ok("java".to_string()),
        _ => anyhow::bail!(
            "cannot infer language from '{}'; pass --language",
            file.display()
        ),
    }
}

/// Prints a run outcome and the learner's next instruction.
fn print_outcome(outcome: &RunOutcome, tracker: &LessonProgressTracker) {
    if let Some(message) = &outcome.error_message {
        println!("Run failed: {message}");
        return;
    }

    if outcome.output_lines.is_empty() {
        println!("(no output)");
    } else {
        for line in &outcome.output_lines {
            println!("{line}");
        }
    }

    if let Some(event) = outcome.progress_event {
        let lines = celebration_lines(event);
        if !lines.is_empty() {
            println!();
        }
        for line in lines {
            println!("{line}");
        }
    }

    let state = tracker.state();
    println!();
    println!(
        "Current lesson: {} ({:.0}%)",
        tracker.current_lesson().title,
        state.progress_percent
    );
    println!("Next up: {}", tracker.current_step().instruction);
}

/// Lines announcing a progress event; empty when there is nothing to say.
///
/// Completing the last lesson of a level celebrates twice: the finished
/// lesson first, then the level change.
fn celebration_lines(event: ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::StepAdvanced => {
            vec!["Step completed! Moving to the next step.".to_string()]
        }
        ProgressEvent::LessonCompleted { lesson_id } => {
            vec![format!("Lesson {lesson_id} completed! Great job!")]
        }
        ProgressEvent::LevelAdvanced {
            completed_lesson_id,
            level,
        } => vec![
            format!("Lesson {completed_lesson_id} completed! Great job!"),
            format!("Level up! Welcome to {level}."),
        ],
        ProgressEvent::ManualAdvanceRequired => vec![
            "This step has no output to check; advance it with 'next' in study mode.".to_string(),
        ],
        ProgressEvent::NoMatch => Vec::new(),
    }
}

/// Prints the whole catalog grouped by level.
fn print_catalog(catalog: &LessonCatalog) {
    for level in catalog.levels_in_order() {
        println!("{level}");
        for (index, lesson) in catalog.lessons(level).iter().enumerate() {
            println!(
                "  {index}. [{}] {} ({} steps)",
                lesson.id,
                lesson.title,
                lesson.steps.len()
            );
        }
    }
}

/// Interactive study session: show the step, read a command, repeat.
async fn study_loop(
    orchestrator: &mut Orchestrator<ExecutionClient>,
    language: &str,
) -> anyhow::Result<()> {
    println!("Quest study session ({language})");
    println!("Commands: <file> to run it, 'hint', 'suggest', 'next', 'quit'");

    let stdin = std::io::stdin();
    loop {
        let tracker = orchestrator.tracker();
        println!();
        println!(
            "[{} / {}] {}",
            tracker.state().level,
            tracker.current_lesson().title,
            tracker.current_step().instruction
        );
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        match input {
            "" => {}
            "quit" => break,
            "hint" => println!("Hint: {}", orchestrator.tracker().current_step().hint),
            "suggest" => println!("{}", orchestrator.tracker().suggested_code()),
            "next" => {
                let event = orchestrator.tracker_mut().advance_step();
                if event.is_celebratory() {
                    println!("Nice work!");
                }
            }
            file => {
                let source = match std::fs::read_to_string(file) {
                    Ok(source) => source,
                    Err(e) => {
                        println!("Cannot read '{file}': {e}");
                        continue;
                    }
                };
                let outcome = orchestrator.run(language, &source).await;
                print_outcome(&outcome, orchestrator.tracker());
            }
        }
    }

    println!("Session over. See you next time!");
    Ok(())
}
