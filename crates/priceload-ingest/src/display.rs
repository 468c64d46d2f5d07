//! Table rendering for the shell
//!
//! The price table is shown with a derived `eff_to` column: the next
//! `eff_from` recorded for the same id, or blank for the latest price.

use chrono::{NaiveDateTime, NaiveTime};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use priceload_common::{JournalEntry, PriceRow};
use std::collections::HashMap;

/// A price row with the time its successor takes over
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow<'a> {
    pub row: &'a PriceRow,
    pub eff_to: Option<NaiveDateTime>,
}

/// Pair each row with its `eff_to`, keeping the input order
pub fn with_effective_to(rows: &[PriceRow]) -> Vec<DisplayRow<'_>> {
    let mut dates: HashMap<&str, Vec<NaiveDateTime>> = HashMap::new();
    for row in rows {
        dates.entry(row.id.as_str()).or_default().push(row.eff_from);
    }
    for history in dates.values_mut() {
        history.sort_unstable();
        history.dedup();
    }

    rows.iter()
        .map(|row| {
            let eff_to = dates.get(row.id.as_str()).and_then(|history| {
                let next = history.partition_point(|d| *d <= row.eff_from);
                history.get(next).copied()
            });
            DisplayRow { row, eff_to }
        })
        .collect()
}

/// Dates at midnight print as a bare date
pub fn format_eff(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.date().to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn render_prices(rows: &[PriceRow]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["id", "price", "eff_from", "eff_to"]);

    for display in with_effective_to(rows) {
        table.add_row(vec![
            display.row.id.clone(),
            display.row.price.to_string(),
            format_eff(display.row.eff_from),
            display.eff_to.map(format_eff).unwrap_or_default(),
        ]);
    }

    format!("{}\n", table)
}

pub fn render_journal(entries: &[JournalEntry]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["process_id", "file_name", "start_ts", "end_ts"]);

    for entry in entries {
        table.add_row(vec![
            entry.process_id.clone(),
            entry.file_name.clone(),
            entry.start_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.end_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    format!("{}\n", table)
}
