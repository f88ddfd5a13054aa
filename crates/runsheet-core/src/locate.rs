//! Positional lookups by cell text.
//!
//! Everything positional in this engine is built on "find the cell whose
//! entire display text equals X": run headers bound runs, footer text bounds
//! groups, date headers name columns. The underlying scan walks the whole
//! sheet, so column hits are cached (date columns are queried repeatedly);
//! row hits are not cached here because callers cache the composite results
//! they derive from them.

use crate::error::EngineError;
use runsheet_common::string_to_id;
use runsheet_store::{DocumentCache, RangeStore};
use tracing::debug;

pub struct RangeLocator<'a> {
    store: &'a dyn RangeStore,
    cache: &'a DocumentCache,
}

impl<'a> RangeLocator<'a> {
    pub fn new(store: &'a dyn RangeStore, cache: &'a DocumentCache) -> Self {
        Self { store, cache }
    }

    /// Row index of the first cell whose display text equals `text`.
    /// A miss is data, not an error; callers decide whether it is fatal.
    pub fn locate_row(&self, sheet: &str, text: &str) -> Result<Option<u32>, EngineError> {
        Ok(self
            .store
            .find_cell_by_exact_text(sheet, text)?
            .map(|cell| cell.row))
    }

    /// Column index of the first cell whose display text equals `text`.
    /// Hits are cached under `column-index-<sheet>-<text>`.
    pub fn locate_column(&self, sheet: &str, text: &str) -> Result<Option<u32>, EngineError> {
        let key = format!(
            "column-index-{}-{}",
            string_to_id(sheet),
            string_to_id(text)
        );

        if let Some(col) = self.cache.get_item::<u32>(&key, false) {
            return Ok(Some(col));
        }

        debug!(sheet, text, "full-sheet column scan");
        let hit = self
            .store
            .find_cell_by_exact_text(sheet, text)?
            .map(|cell| cell.col);

        if let Some(col) = hit {
            self.cache.set_item(&key, &col, false)?;
        }

        Ok(hit)
    }
}
