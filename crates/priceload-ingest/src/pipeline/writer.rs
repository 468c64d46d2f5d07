//! Bulk writer
//!
//! Inserts every flattened row and brackets the insert with server-side
//! timestamps. The end timestamp is only taken once the insert succeeded.

use priceload_common::{PriceRow, WriteWindow};
use tracing::{info, instrument};

use crate::error::StoreResult;
use crate::store::PriceStore;

#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn bulk_write<S: PriceStore>(store: &mut S, rows: &[PriceRow]) -> StoreResult<WriteWindow> {
    let start = store.server_time().await?;
    let inserted = store.insert_prices(rows).await?;
    let end = store.server_time().await?;

    let window = WriteWindow::new(start, end);
    info!(
        inserted,
        elapsed_secs = window.duration().num_seconds(),
        "Price rows written"
    );

    Ok(window)
}
