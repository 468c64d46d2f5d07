//! Domain types persisted by the ingestion pipeline

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price value effective from one date for one entity
///
/// Rows are append-only. Several rows may share an `id`, and nothing prevents
/// two rows with the same `(id, eff_from)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub id: String,
    pub price: f64,
    pub eff_from: NaiveDateTime,
}

impl PriceRow {
    pub fn new(id: impl Into<String>, price: f64, eff_from: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            price,
            eff_from,
        }
    }
}

impl From<(String, f64, NaiveDateTime)> for PriceRow {
    fn from((id, price, eff_from): (String, f64, NaiveDateTime)) -> Self {
        Self { id, price, eff_from }
    }
}

/// Parse an effective-from value
///
/// Accepts a plain date (`2024-01-01`, read as midnight), a date and time
/// separated by a space or `T` with optional fractional seconds, or a
/// timestamp with a UTC offset (RFC 3339 or `2024-01-01 10:00:00+02`), which
/// is converted to UTC.
pub fn parse_eff_from(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .ok()
        .map(|ts| ts.naive_utc())
}

/// Server-side wall-clock window of one bulk write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WriteWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Elapsed time between start and end, zero if the clock went backwards
    pub fn duration(&self) -> chrono::Duration {
        (self.end - self.start).max(chrono::Duration::zero())
    }
}

/// Audit record of one completed ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Caller-supplied token; unique across the journal
    pub process_id: String,

    /// Base name of the ingested file, without directories
    pub file_name: String,

    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        process_id: impl Into<String>,
        file_name: impl Into<String>,
        window: WriteWindow,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            file_name: file_name.into(),
            start_ts: window.start,
            end_ts: window.end,
        }
    }

    pub fn window(&self) -> WriteWindow {
        WriteWindow::new(self.start_ts, self.end_ts)
    }
}
