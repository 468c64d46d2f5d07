//! Duplicate guard
//!
//! Fast-path check that a process id has not been journaled yet. The unique
//! key on `process_journal.process_id` is what actually enforces it; see
//! `journal::record`.

use tracing::{debug, instrument, warn};

use crate::error::{IngestError, IngestResult};
use crate::store::PriceStore;

#[instrument(skip(store))]
pub async fn ensure_not_processed<S: PriceStore>(
    store: &mut S,
    process_id: &str,
) -> IngestResult<()> {
    let seen = store
        .journal_contains(process_id)
        .await
        .map_err(IngestError::DuplicateCheck)?;

    if seen {
        warn!("Process id already journaled, refusing to ingest");
        return Err(IngestError::DuplicateProcess {
            process_id: process_id.to_string(),
        });
    }

    debug!("Process id not journaled yet");
    Ok(())
}
