//! Priceload - price document ingestion tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use priceload_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use priceload_ingest::config::{Config, DatabaseConfig};
use priceload_ingest::display::{render_journal, render_prices};
use priceload_ingest::store::postgres;
use priceload_ingest::{IngestStatus, Pipeline, Stage};
use sqlx::{Connection, PgConnection};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "priceload")]
#[command(author, version, about = "Load price-change documents into PostgreSQL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest one .json price document
    Ingest {
        /// Document to ingest
        file: PathBuf,
    },

    /// Show the current price table
    Show,

    /// Show the process journal
    Journal,

    /// Apply pending schema migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("priceload")
        .build();

    // Environment variables take precedence over the flags
    let log_config = log_config.merge_env().unwrap_or_else(|e| {
        eprintln!("Ignoring invalid logging environment: {e}");
        LogConfig::builder().level(log_level).build()
    });

    let guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        },
    };

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            1
        },
    };

    // Flush file logs before exiting
    drop(guard);
    process::exit(code);
}

/// Execute a command and return the process exit code
async fn run(command: Commands) -> Result<i32> {
    let config = Config::load().context("Failed to load configuration")?;

    match command {
        Commands::Ingest { file } => ingest(&config.database, file).await,
        Commands::Show => {
            let mut conn = open(&config.database).await?;
            let rows = postgres::select_prices(&mut conn).await;
            conn.close().await.ok();

            let rows = rows.context("Failed to read the price table")?;
            if rows.is_empty() {
                println!("No prices loaded yet.");
            } else {
                print!("{}", render_prices(&rows));
            }
            Ok(0)
        },
        Commands::Journal => {
            let mut conn = open(&config.database).await?;
            let entries = postgres::select_journal(&mut conn).await;
            conn.close().await.ok();

            let entries = entries.context("Failed to read the process journal")?;
            if entries.is_empty() {
                println!("No runs journaled yet.");
            } else {
                print!("{}", render_journal(&entries));
            }
            Ok(0)
        },
        Commands::Migrate => {
            let mut conn = open(&config.database).await?;
            let result = postgres::migrate(&mut conn).await;
            conn.close().await.ok();

            result.context("Failed to apply migrations")?;
            println!("{}", "Schema is up to date".green());
            Ok(0)
        },
    }
}

async fn ingest(database: &DatabaseConfig, file: PathBuf) -> Result<i32> {
    info!(database = %database.display_target(), file = %file.display(), "Starting ingestion");
    let pipeline = Pipeline::new(database)?;

    let spinner = spinner()?;
    let mut sink = |stage: Stage| spinner.set_message(stage.label());
    let report = pipeline.ingest(&file, &mut sink).await;
    spinner.finish_and_clear();

    match report.status {
        IngestStatus::Success => {
            if let Some(journal) = &report.journal {
                println!(
                    "{} {} from {} ({}s)",
                    "Success:".green().bold(),
                    journal.process_id,
                    journal.file_name,
                    journal.window().duration().num_seconds()
                );
            }
            if let Some(rows) = &report.rows {
                print!("{}", render_prices(rows));
            }
            Ok(0)
        },
        IngestStatus::AlreadyProcessed | IngestStatus::Failed => {
            let label = format!("{}:", report.status);
            eprint!("{} ", label.yellow().bold());
            match (report.notice(), &report.error) {
                (Some(notice), _) => eprintln!("{notice}"),
                (None, Some(err)) => eprintln!("{err}"),
                (None, None) => eprintln!(),
            }
            Ok(1)
        },
    }
}

async fn open(database: &DatabaseConfig) -> Result<PgConnection> {
    let options = database.connect_options()?;
    postgres::connect(&options)
        .await
        .with_context(|| format!("Failed to connect to {}", database.display_target()))
}

fn spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(Stage::Parsing.label());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
