//! Journal recorder

use priceload_common::{JournalEntry, WriteWindow};
use tracing::{info, instrument};

use crate::error::{IngestError, IngestResult};
use crate::store::PriceStore;

/// Append the journal row for a run
///
/// A unique violation means another run journaled the same process id after
/// our duplicate check; it is reported as a duplicate, not a failure.
#[instrument(skip(store, window))]
pub async fn record<S: PriceStore>(
    store: &mut S,
    process_id: &str,
    file_name: &str,
    window: WriteWindow,
) -> IngestResult<JournalEntry> {
    let entry = JournalEntry::new(process_id, file_name, window);

    store.insert_journal(&entry).await.map_err(|e| {
        if e.is_unique_violation() {
            IngestError::DuplicateProcess {
                process_id: process_id.to_string(),
            }
        } else {
            IngestError::Journal(e)
        }
    })?;

    info!(start_ts = %entry.start_ts, end_ts = %entry.end_ts, "Journal entry recorded");
    Ok(entry)
}
