//! Ingestion pipeline
//!
//! One call ingests one file:
//!
//! 1. Reject anything that is not a `.json` path
//! 2. Parse the document (no database contact yet)
//! 3. Open one connection and one transaction
//! 4. Duplicate guard on the process id
//! 5. Flatten and bulk-write the price rows
//! 6. Fetch the full price table
//! 7. Journal the run
//! 8. Commit
//!
//! Steps 4 to 7 share the transaction, so a run either lands completely
//! (prices and journal) or not at all. Progress is reported as `Stage`
//! events through a `StatusSink`.

pub mod guard;
pub mod journal;
pub mod reader;
pub mod writer;

use priceload_common::{JournalEntry, PriceRow};
use serde::Serialize;
use sqlx::postgres::PgConnectOptions;
use sqlx::Connection;
use std::path::Path;
use tracing::{error, info, instrument, warn};

use crate::config::DatabaseConfig;
use crate::document::{self, IngestionDocument};
use crate::error::{IngestError, IngestResult};
use crate::flatten::flatten;
use crate::status::{Stage, StatusSink};
use crate::store::{postgres, PgStore, PriceStore};

/// Notice shown when a file is rejected by extension.
pub const UNSUPPORTED_FORMAT_NOTICE: &str = "Only .json files can be accepted for parsing";

/// Notice shown when the process id was ingested before.
pub const DUPLICATE_PROCESS_NOTICE: &str =
    "This process id already exists in: process_journal.process_id";

/// Terminal status of one run, as a shell presents it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Success,
    AlreadyProcessed,
    Failed,
}

impl std::fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestStatus::Success => write!(f, "Success"),
            IngestStatus::AlreadyProcessed => write!(f, "Already processed"),
            IngestStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// What a committed run produced
#[derive(Debug, Clone)]
pub struct IngestOutput {
    /// The journal row written for this run
    pub journal: JournalEntry,

    /// Price rows inserted by this run
    pub inserted: usize,

    /// The whole price table after the write
    pub rows: Vec<PriceRow>,
}

/// Outcome handed back to the presentation shell
#[derive(Debug)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub rows: Option<Vec<PriceRow>>,
    pub journal: Option<JournalEntry>,
    pub error: Option<IngestError>,
}

impl IngestReport {
    pub fn from_result(result: IngestResult<IngestOutput>) -> Self {
        match result {
            Ok(output) => Self {
                status: IngestStatus::Success,
                rows: Some(output.rows),
                journal: Some(output.journal),
                error: None,
            },
            Err(err) => {
                let status = match &err {
                    IngestError::DuplicateProcess { .. } => IngestStatus::AlreadyProcessed,
                    _ => IngestStatus::Failed,
                };
                Self {
                    status,
                    rows: None,
                    journal: None,
                    error: Some(err),
                }
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == IngestStatus::Success
    }

    /// User-facing notice for outcomes that deserve a dialog of their own
    pub fn notice(&self) -> Option<&'static str> {
        match self.error {
            Some(IngestError::UnsupportedFormat { .. }) => Some(UNSUPPORTED_FORMAT_NOTICE),
            Some(IngestError::DuplicateProcess { .. }) => Some(DUPLICATE_PROCESS_NOTICE),
            _ => None,
        }
    }
}

/// Postgres-backed pipeline; one connection per run
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PgConnectOptions,
}

impl Pipeline {
    pub fn new(config: &DatabaseConfig) -> priceload_common::Result<Self> {
        Ok(Self::with_options(config.connect_options()?))
    }

    pub fn with_options(options: PgConnectOptions) -> Self {
        Self { options }
    }

    /// Ingest one file and fold the outcome into a report
    pub async fn ingest(&self, path: impl AsRef<Path>, sink: &mut dyn StatusSink) -> IngestReport {
        IngestReport::from_result(self.run(path.as_ref(), sink).await)
    }

    /// Ingest one file
    ///
    /// The connection is closed before returning, whatever the outcome.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn run(&self, path: &Path, sink: &mut dyn StatusSink) -> IngestResult<IngestOutput> {
        let (document, file_name) = match load_input(path, sink) {
            Ok(input) => input,
            Err(err) => {
                warn!(error = %err, "Input rejected");
                sink.emit(Stage::Failed);
                return Err(err);
            },
        };

        let mut conn = match postgres::connect(&self.options).await {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = %err, "Could not connect to the database");
                sink.emit(Stage::Failed);
                return Err(IngestError::Connect(err));
            },
        };

        let result = match PgStore::begin(&mut conn).await {
            Ok(store) => execute(store, &document, &file_name, sink).await,
            Err(err) => {
                error!(error = %err, "Could not begin a transaction");
                sink.emit(Stage::Failed);
                Err(IngestError::Connect(err))
            },
        };

        if let Err(err) = conn.close().await {
            warn!(error = %err, "Failed to close database connection");
        }

        result
    }
}

fn load_input(path: &Path, sink: &mut dyn StatusSink) -> IngestResult<(IngestionDocument, String)> {
    document::ensure_supported(path)?;
    sink.emit(Stage::Parsing);
    let document = document::load(path)?;
    Ok((document, document::file_name(path)))
}

/// Run the database stages of one ingestion against `store`
///
/// Commits on success and rolls back on any failure. Emits every stage from
/// `DuplicateCheck` through `Done` or `Failed`.
#[instrument(skip_all, fields(process_id = %document.process_id, file_name = %file_name))]
pub async fn execute<S: PriceStore>(
    mut store: S,
    document: &IngestionDocument,
    file_name: &str,
    sink: &mut dyn StatusSink,
) -> IngestResult<IngestOutput> {
    match run_stages(&mut store, document, file_name, sink).await {
        Ok(output) => match store.commit().await {
            Ok(()) => {
                info!(
                    inserted = output.inserted,
                    table_rows = output.rows.len(),
                    "Ingestion committed"
                );
                sink.emit(Stage::Done);
                Ok(output)
            },
            Err(err) => {
                error!(error = %err, "Commit failed");
                sink.emit(Stage::Failed);
                Err(IngestError::Write(err))
            },
        },
        Err(err) => {
            if let Err(rollback_err) = store.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            match &err {
                IngestError::DuplicateProcess { .. } => info!("Ingestion skipped: {}", err),
                _ => error!(error = %err, retryable = err.is_retryable(), "Ingestion failed"),
            }
            sink.emit(Stage::Failed);
            Err(err)
        },
    }
}

async fn run_stages<S: PriceStore>(
    store: &mut S,
    document: &IngestionDocument,
    file_name: &str,
    sink: &mut dyn StatusSink,
) -> IngestResult<IngestOutput> {
    sink.emit(Stage::DuplicateCheck);
    guard::ensure_not_processed(store, &document.process_id).await?;

    let rows = flatten(document);

    sink.emit(Stage::Writing);
    let window = writer::bulk_write(store, &rows)
        .await
        .map_err(IngestError::Write)?;

    sink.emit(Stage::Fetching);
    let table = reader::fetch_all(store)
        .await
        .map_err(IngestError::Fetch)?;

    sink.emit(Stage::Journaling);
    let journal = journal::record(store, &document.process_id, file_name, window).await?;

    Ok(IngestOutput {
        journal,
        inserted: rows.len(),
        rows: table,
    })
}
