//! Priceload Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads price-change documents into PostgreSQL and journals every run.
//!
//! A document names a `process_id` and a list of entities, each with its own
//! price history. Ingesting it flattens that history into `(id, price,
//! eff_from)` rows, appends them to the price table, and records the run in
//! the process journal. A process id is ingested at most once.
//!
//! # Example
//!
//! ```no_run
//! use priceload_ingest::{config::Config, status::Silent, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::new(&config.database)?;
//!
//!     let report = pipeline.ingest("./data/prices.json", &mut Silent).await;
//!     println!("{}", report.status);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod display;
pub mod document;
pub mod error;
pub mod flatten;
pub mod pipeline;
pub mod status;
pub mod store;

pub use document::IngestionDocument;
pub use error::{IngestError, IngestResult, StoreError, StoreResult};
pub use pipeline::{execute, IngestOutput, IngestReport, IngestStatus, Pipeline};
pub use status::{Stage, StatusSink};
pub use store::{PgStore, PriceStore};
