//! Priceload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the priceload workspace.
//!
//! # Overview
//!
//! - **Types**: persisted price rows, journal entries, and write windows
//! - **Error Handling**: the workspace-wide error type and result alias
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use priceload_common::logging::{init_logging, LogConfig};
//! use priceload_common::types::{parse_eff_from, PriceRow};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let eff_from = parse_eff_from("2024-01-01").ok_or_else(|| anyhow::anyhow!("bad date"))?;
//!     let row = PriceRow::new("A1", 10.5, eff_from);
//!     tracing::info!(id = %row.id, price = row.price, "Loaded row");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{PriceloadError, Result};
pub use types::{parse_eff_from, JournalEntry, PriceRow, WriteWindow};
