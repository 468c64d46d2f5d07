//! Shared test helpers
//!
//! `MemoryDb` stands in for PostgreSQL: committed tables behind a mutex, and
//! a `MemoryStore` per run that stages its writes until `commit`. Faults can
//! be injected at any store call.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use priceload_common::{JournalEntry, PriceRow};
use priceload_ingest::error::{ConstraintKind, StoreError, StoreResult};
use priceload_ingest::{IngestionDocument, PriceStore};
use std::sync::{Arc, Mutex};

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,priceload_ingest=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// The scenario document: one entity with two price changes
pub const P1_DOCUMENT: &str = r#"{
    "process_id": "P1",
    "data": [
        {
            "id": "A1",
            "price_change": [
                {"price": 10.5, "eff_from": "2024-01-01"},
                {"price": 11.0, "eff_from": "2024-02-01"}
            ]
        }
    ]
}"#;

pub fn p1_document() -> IngestionDocument {
    priceload_ingest::document::parse(P1_DOCUMENT.as_bytes()).unwrap()
}

/// Build a document from flat rows; consecutive rows with the same id form
/// one entity
pub fn document(process_id: &str, rows: &[(&str, f64, &str)]) -> IngestionDocument {
    let mut data: Vec<serde_json::Value> = Vec::new();
    let mut current: Option<&str> = None;

    for (id, price, eff_from) in rows {
        let change = serde_json::json!({"price": price, "eff_from": eff_from});
        if current == Some(*id) {
            data.last_mut().unwrap()["price_change"]
                .as_array_mut()
                .unwrap()
                .push(change);
        } else {
            data.push(serde_json::json!({"id": id, "price_change": [change]}));
            current = Some(*id);
        }
    }

    serde_json::from_value(serde_json::json!({"process_id": process_id, "data": data})).unwrap()
}

/// Store call that fails when injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    JournalLookup,
    InsertPrices,
    FetchPrices,
    InsertJournal,
    /// Another run journaled the same process id after the duplicate check
    JournalRace,
    Commit,
}

#[derive(Debug, Default)]
struct Tables {
    prices: Vec<PriceRow>,
    journal: Vec<JournalEntry>,
}

/// Committed state shared by every store opened on it
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> MemoryStore {
        MemoryStore {
            db: self.clone(),
            prices: Vec::new(),
            journal: Vec::new(),
            fault: None,
        }
    }

    pub fn begin_with_fault(&self, fault: Fault) -> MemoryStore {
        MemoryStore {
            fault: Some(fault),
            ..self.begin()
        }
    }

    pub fn prices(&self) -> Vec<PriceRow> {
        self.tables.lock().unwrap().prices.clone()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.tables.lock().unwrap().journal.clone()
    }
}

/// One run's unit of work over a `MemoryDb`
#[derive(Debug)]
pub struct MemoryStore {
    db: MemoryDb,
    prices: Vec<PriceRow>,
    journal: Vec<JournalEntry>,
    fault: Option<Fault>,
}

impl MemoryStore {
    fn check(&self, at: Fault) -> StoreResult<()> {
        if self.fault == Some(at) {
            return Err(StoreError::Connectivity(format!("injected fault at {at:?}")));
        }
        Ok(())
    }

    fn journaled(&self, process_id: &str) -> bool {
        let tables = self.db.tables.lock().unwrap();
        tables
            .journal
            .iter()
            .chain(self.journal.iter())
            .any(|entry| entry.process_id == process_id)
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn journal_contains(&mut self, process_id: &str) -> StoreResult<bool> {
        self.check(Fault::JournalLookup)?;
        Ok(self.journaled(process_id))
    }

    async fn server_time(&mut self) -> StoreResult<DateTime<Utc>> {
        Ok(Utc::now().trunc_subsecs(0))
    }

    async fn insert_prices(&mut self, rows: &[PriceRow]) -> StoreResult<u64> {
        self.check(Fault::InsertPrices)?;
        self.prices.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn fetch_prices(&mut self) -> StoreResult<Vec<PriceRow>> {
        self.check(Fault::FetchPrices)?;
        let tables = self.db.tables.lock().unwrap();
        Ok(tables.prices.iter().chain(self.prices.iter()).cloned().collect())
    }

    async fn insert_journal(&mut self, entry: &JournalEntry) -> StoreResult<()> {
        self.check(Fault::InsertJournal)?;

        if self.fault == Some(Fault::JournalRace) || self.journaled(&entry.process_id) {
            return Err(StoreError::Constraint {
                kind: ConstraintKind::Unique,
                message: format!(
                    "duplicate key value violates unique constraint \"process_journal_pkey\" ({})",
                    entry.process_id
                ),
            });
        }

        self.journal.push(entry.clone());
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.check(Fault::Commit)?;
        let mut tables = self.db.tables.lock().unwrap();
        tables.prices.extend(self.prices);
        tables.journal.extend(self.journal);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}
