//! Data store seam
//!
//! A `PriceStore` is one run's unit of work: everything it does between
//! creation and `commit` lands atomically, and `rollback` discards all of it.
//! The pipeline components only talk to this trait; `postgres::PgStore` is the
//! production implementation.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use priceload_common::{JournalEntry, PriceRow};

use crate::error::StoreResult;

pub use postgres::PgStore;

/// Transactional access to the price and journal tables
#[async_trait]
pub trait PriceStore: Send {
    /// Whether the journal already holds an entry for `process_id`
    async fn journal_contains(&mut self, process_id: &str) -> StoreResult<bool>;

    /// Current server wall-clock time, truncated to whole seconds
    async fn server_time(&mut self) -> StoreResult<DateTime<Utc>>;

    /// Append price rows; returns how many were inserted
    async fn insert_prices(&mut self, rows: &[PriceRow]) -> StoreResult<u64>;

    /// Every price row, in whatever order the store returns them
    async fn fetch_prices(&mut self) -> StoreResult<Vec<PriceRow>>;

    /// Append one journal entry
    async fn insert_journal(&mut self, entry: &JournalEntry) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>
    where
        Self: Sized;

    async fn rollback(self) -> StoreResult<()>
    where
        Self: Sized;
}
