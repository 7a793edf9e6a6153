use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use sobranie::{
    load_document, parse_document, run_scheduled, run_with_history_file, write_records,
    HistoryStore, HumanTranscript, JsonHistoryStore, ParserConfig, PipelineConfig,
    WeeklySchedule,
};

#[derive(Parser)]
#[command(name = "sobranie")]
#[command(author, version, about = "Parliamentary stenographic transcript parser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every new document in the inbox, then repeat weekly
    Run {
        /// Run a single batch and exit
        #[arg(long)]
        once: bool,

        /// Day of the weekly run
        #[arg(long, default_value = "friday")]
        schedule_day: String,

        /// Local time of the weekly run (HH:MM)
        #[arg(long, default_value = "18:00")]
        schedule_time: String,

        /// Directory of extracted documents
        #[arg(long)]
        inbox: Option<PathBuf>,

        /// Directory for JSON Lines output
        #[arg(long)]
        output: Option<PathBuf>,

        /// History file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Also write human-readable transcripts
        #[arg(long)]
        human_readable: bool,

        /// Append log output to this file as well
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse a single document without touching the history
    Parse {
        /// Extracted document (`.json` pages or form-feed separated `.txt`)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for records (JSON Lines)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for human-readable transcript (text)
        #[arg(long)]
        human_readable: Option<PathBuf>,

        /// Append log output to this file as well
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show processing history statistics
    History {
        /// History file
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            once,
            schedule_day,
            schedule_time,
            inbox,
            output,
            history,
            human_readable,
            log_file,
            verbose,
        } => {
            setup_logging(verbose, log_file.as_deref())?;
            let schedule = WeeklySchedule::parse(&schedule_day, &schedule_time)?;
            let mut config = PipelineConfig::from_env();
            if let Some(inbox) = inbox {
                config.inbox_dir = inbox;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(history) = history {
                config.history_file = history;
            }
            config.human_readable = human_readable;
            run(config, schedule, once).await
        }
        Commands::Parse {
            input,
            output,
            human_readable,
            log_file,
            verbose,
        } => {
            setup_logging(verbose, log_file.as_deref())?;
            parse_single(input, output, human_readable)
        }
        Commands::History { history } => {
            setup_logging(false, None)?;
            let path = history.unwrap_or_else(|| PipelineConfig::from_env().history_file);
            show_history(path)
        }
    }
}

fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(level)
        .try_init()
        .ok();
    Ok(())
}

async fn run(config: PipelineConfig, schedule: WeeklySchedule, once: bool) -> Result<ExitCode> {
    if once {
        let stats = run_with_history_file(&config)?;
        return Ok(if stats.has_failures() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    loop {
        run_scheduled(&config);

        let now = Local::now().naive_local();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next run at {} ({}s)", next, wait.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}

fn parse_single(input: PathBuf, output: PathBuf, human_readable: Option<PathBuf>) -> Result<ExitCode> {
    info!("Loading document from {:?}", input);
    let document = load_document(&input).context("Failed to load input document")?;
    info!(
        "Loaded {} ({} pages)",
        document.document_id,
        document.page_count()
    );

    let parsed = match parse_document(&document, &ParserConfig::default()) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let stats = parsed.stats;
    info!(
        "Classified {} fragments: {} headers, {} body, {} procedural, {} noise ({} uncertain)",
        stats.fragments, stats.headers, stats.body, stats.procedural, stats.noise, stats.low_confidence
    );

    let records = write_records(&output, &parsed.utterances)?;
    info!("Output written to {:?} ({} records)", output, records);

    if let Some(path) = human_readable {
        HumanTranscript::new(&parsed.utterances).write_file(&path)?;
        info!("Human-readable output written to {:?}", path);
    }

    Ok(ExitCode::SUCCESS)
}

fn show_history(path: PathBuf) -> Result<ExitCode> {
    let history = JsonHistoryStore::open(&path).context("Failed to open history")?;
    let stats = history.stats();

    println!("History: {:?}", history.path());
    println!("==================");
    println!("Documents: {}", stats.documents);
    println!("Successful: {}", stats.successes);
    println!("Failed attempts: {}", stats.failures);

    if let Some(last) = history.entries().last() {
        println!();
        println!(
            "Last entry: {} ({:?}) at {}",
            last.document_id,
            last.outcome,
            last.processed_timestamp.to_rfc3339()
        );
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sobranie.log");

        setup_logging(false, Some(&path)).unwrap();
        info!("Парсирана седница {}", 75);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Парсирана седница 75"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    fn test_cli_accepts_log_file() {
        let cli = Cli::try_parse_from(["sobranie", "run", "--once", "--log-file", "run.log"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run { once: true, log_file: Some(path), .. } if path == Path::new("run.log")
        ));
    }
}
