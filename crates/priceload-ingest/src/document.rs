//! Ingestion document model and loader
//!
//! Input files look like:
//!
//! ```json
//! {
//!   "process_id": "P1",
//!   "data": [
//!     {"id": "A1", "price_change": [{"price": 10.5, "eff_from": "2024-01-01"}]}
//!   ]
//! }
//! ```
//!
//! Every key shown is required. Identifiers may be JSON strings or integers
//! and are kept as text. `eff_from` is a date or a timestamp, see
//! `priceload_common::parse_eff_from`. Unknown keys are ignored.

use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer};
use std::path::Path;
use tracing::debug;

use crate::error::{IngestError, IngestResult};

/// Suffix a path must end with to be accepted
pub const ACCEPTED_SUFFIX: &str = ".json";

/// Parsed input file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestionDocument {
    #[serde(deserialize_with = "opaque_token")]
    pub process_id: String,
    pub data: Vec<PriceEntity>,
}

/// One priced entity and its change history, in file order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceEntity {
    #[serde(deserialize_with = "opaque_token")]
    pub id: String,
    pub price_change: Vec<PriceChange>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceChange {
    pub price: f64,
    #[serde(deserialize_with = "effective_from")]
    pub eff_from: NaiveDateTime,
}

impl IngestionDocument {
    /// Number of rows flattening will produce
    pub fn event_count(&self) -> usize {
        self.data.iter().map(|e| e.price_change.len()).sum()
    }
}

/// Accept a JSON string or integer and keep it as text
fn opaque_token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Token::deserialize(deserializer)? {
        Token::Text(s) => s,
        Token::Signed(n) => n.to_string(),
        Token::Unsigned(n) => n.to_string(),
    })
}

fn effective_from<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    priceload_common::parse_eff_from(&raw).ok_or_else(|| {
        de::Error::custom(format!("invalid eff_from '{raw}', expected a date or timestamp"))
    })
}

/// Reject any path not ending in `.json` (case-sensitive), before opening it
pub fn ensure_supported(path: &Path) -> IngestResult<()> {
    let supported = path
        .to_str()
        .is_some_and(|p| p.ends_with(ACCEPTED_SUFFIX));

    if supported {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

/// Read and parse an ingestion document
pub fn load(path: &Path) -> IngestResult<IngestionDocument> {
    let raw = std::fs::read(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let document = parse(&raw).map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        process_id = %document.process_id,
        entities = document.data.len(),
        events = document.event_count(),
        "Parsed ingestion document"
    );

    Ok(document)
}

/// Parse an ingestion document from bytes
pub fn parse(raw: &[u8]) -> Result<IngestionDocument, serde_json::Error> {
    serde_json::from_slice(raw)
}

/// Base name recorded in the journal, directories stripped
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
        "process_id": "P1",
        "data": [
            {"id": "A1", "price_change": [
                {"price": 10.5, "eff_from": "2024-01-01"},
                {"price": 11.0, "eff_from": "2024-02-01"}
            ]}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.process_id, "P1");
        assert_eq!(doc.data.len(), 1);
        assert_eq!(doc.data[0].id, "A1");
        assert_eq!(doc.event_count(), 2);
        assert_eq!(
            doc.data[0].price_change[1].eff_from,
            chrono::NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_numeric_identifiers_become_text() {
        let doc = parse(
            br#"{"process_id": 42, "data": [{"id": 7, "price_change": [{"price": 1, "eff_from": "2024-03-01"}]}]}"#,
        )
        .unwrap();
        assert_eq!(doc.process_id, "42");
        assert_eq!(doc.data[0].id, "7");
        assert_eq!(doc.data[0].price_change[0].price, 1.0);
    }

    #[test]
    fn test_missing_keys_are_fatal() {
        assert!(parse(br#"{"data": []}"#).is_err());
        assert!(parse(br#"{"process_id": "P1"}"#).is_err());
        assert!(parse(br#"{"process_id": "P1", "data": [{"price_change": []}]}"#).is_err());
        assert!(parse(br#"{"process_id": "P1", "data": [{"id": "A1"}]}"#).is_err());
        assert!(parse(
            br#"{"process_id": "P1", "data": [{"id": "A1", "price_change": [{"price": 1.0}]}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_wrong_types_are_fatal() {
        assert!(parse(
            br#"{"process_id": "P1", "data": [{"id": "A1", "price_change": [{"price": "ten", "eff_from": "2024-01-01"}]}]}"#
        )
        .is_err());
        assert!(parse(
            br#"{"process_id": "P1", "data": [{"id": "A1", "price_change": [{"price": 1.0, "eff_from": "01/02/2024"}]}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let doc = parse(br#"{"process_id": "P1", "source": "erp", "data": []}"#).unwrap();
        assert_eq!(doc.event_count(), 0);
    }

    fn eff_from_of(value: &str) -> Result<NaiveDateTime, serde_json::Error> {
        let raw = format!(
            r#"{{"process_id": "P1", "data": [{{"id": "A1", "price_change": [{{"price": 1.0, "eff_from": "{value}"}}]}}]}}"#
        );
        parse(raw.as_bytes()).map(|doc| doc.data[0].price_change[0].eff_from)
    }

    #[test]
    fn test_eff_from_accepts_dates_and_timestamps() {
        let midnight = eff_from_of("2024-01-01").unwrap();
        assert_eq!(midnight.to_string(), "2024-01-01 00:00:00");

        assert_eq!(eff_from_of("2024-01-01 10:00:00").unwrap().to_string(), "2024-01-01 10:00:00");
        assert_eq!(eff_from_of("2024-01-01T10:00:00").unwrap().to_string(), "2024-01-01 10:00:00");
        assert_eq!(eff_from_of("2024-01-01T00:00:00Z").unwrap(), midnight);
        assert_eq!(eff_from_of("2024-01-01T12:00:00+02:00").unwrap().to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_eff_from_rejects_malformed() {
        let err = eff_from_of("2024-02-30").unwrap_err();
        assert!(err.to_string().contains("invalid eff_from '2024-02-30'"));
        assert!(eff_from_of("not a date").is_err());
    }

    #[test]
    fn test_ensure_supported() {
        assert!(ensure_supported(Path::new("/tmp/prices.json")).is_ok());
        assert!(ensure_supported(Path::new("/tmp/.json")).is_ok());
        assert!(ensure_supported(Path::new("prices.JSON")).is_err());
        assert!(ensure_supported(Path::new("prices.Json")).is_err());
        assert!(matches!(
            ensure_supported(Path::new("prices.csv")),
            Err(IngestError::UnsupportedFormat { .. })
        ));
        assert!(ensure_supported(Path::new("prices")).is_err());
        assert!(ensure_supported(Path::new("prices.json.bak")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let doc = load(file.path()).unwrap();
        assert_eq!(doc.process_id, "P1");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(IngestError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = load(file.path());
        assert!(matches!(result, Err(IngestError::Parse { .. })));
    }

    #[test]
    fn test_file_name_strips_directories() {
        assert_eq!(file_name(&PathBuf::from("/data/in/prices_2024.json")), "prices_2024.json");
        assert_eq!(file_name(Path::new("prices.json")), "prices.json");
    }
}
