//! Record flattener
//!
//! Turns the nested entity → price-change structure into flat rows ready for
//! a bulk insert. Order follows the file: entities in sequence, and each
//! entity's changes in sequence. Nothing is filtered or deduplicated.

use priceload_common::PriceRow;

use crate::document::IngestionDocument;

pub fn flatten(document: &IngestionDocument) -> Vec<PriceRow> {
    let mut rows = Vec::with_capacity(document.event_count());

    for entity in &document.data {
        for change in &entity.price_change {
            rows.push(PriceRow::new(entity.id.clone(), change.price, change.eff_from));
        }
    }

    rows
}
