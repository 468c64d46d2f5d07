//! Result reader

use priceload_common::PriceRow;
use tracing::{debug, instrument};

use crate::error::StoreResult;
use crate::store::PriceStore;

/// Full price table, unordered, for display
#[instrument(skip_all)]
pub async fn fetch_all<S: PriceStore>(store: &mut S) -> StoreResult<Vec<PriceRow>> {
    let rows = store.fetch_prices().await?;
    debug!(rows = rows.len(), "Fetched price table");
    Ok(rows)
}
