//! Deterministic in-memory backends.
//!
//! `MemorySheetStore` models just enough of a spreadsheet document for the
//! engine: sparse cells, per-column visibility, named ranges resolved against
//! live cell content, and per-cell validation rules. `SheetFixture` is the
//! builder the integration tests (and embedders writing their own tests)
//! construct documents with.

use crate::error::StoreError;
use crate::rule::ValidationRule;
use crate::traits::{CellRef, KeyValueStore, NamedRange, RangeRef, RangeStore};
use parking_lot::RwLock;
use runsheet_common::CellValue;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory [`KeyValueStore`].
#[derive(Default)]
pub struct MemoryPropertyStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl KeyValueStore for MemoryPropertyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[derive(Default)]
struct Sheet {
    // BTreeMap keeps text search deterministic: first match in row-major order.
    cells: BTreeMap<(u32, u32), CellValue>,
    hidden_columns: BTreeSet<u32>,
    rules: FxHashMap<(u32, u32), ValidationRule>,
}

impl Sheet {
    fn last_column(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, v)| !v.is_blank())
            .map(|((_, col), _)| *col)
            .max()
            .unwrap_or(0)
    }
}

struct StoredNamedRange {
    sheet: String,
    range: RangeRef,
}

#[derive(Default)]
struct Inner {
    sheets: BTreeMap<String, Sheet>,
    named_ranges: BTreeMap<String, StoredNamedRange>,
}

/// In-memory [`RangeStore`].
#[derive(Default)]
pub struct MemorySheetStore {
    inner: RwLock<Inner>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&self, name: &str) {
        self.inner
            .write()
            .sheets
            .entry(name.to_string())
            .or_default();
    }

    pub fn set_cell(&self, sheet: &str, row: u32, col: u32, value: CellValue) {
        let mut inner = self.inner.write();
        let sheet = inner.sheets.entry(sheet.to_string()).or_default();
        if value.is_blank() {
            sheet.cells.remove(&(row, col));
        } else {
            sheet.cells.insert((row, col), value);
        }
    }

    pub fn hide_column(&self, sheet: &str, col: u32) {
        let mut inner = self.inner.write();
        inner
            .sheets
            .entry(sheet.to_string())
            .or_default()
            .hidden_columns
            .insert(col);
    }

    pub fn remove_named_range(&self, name: &str) {
        self.inner.write().named_ranges.remove(name);
    }

    pub fn define_named_range(&self, name: &str, range: RangeRef) {
        let mut inner = self.inner.write();
        inner.sheets.entry(range.sheet.clone()).or_default();
        inner.named_ranges.insert(
            name.to_string(),
            StoredNamedRange {
                sheet: range.sheet.clone(),
                range,
            },
        );
    }

    fn with_sheet<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Sheet) -> T,
    ) -> Result<T, StoreError> {
        let inner = self.inner.read();
        inner
            .sheets
            .get(name)
            .map(f)
            .ok_or_else(|| StoreError::MissingSheet(name.to_string()))
    }
}

impl RangeStore for MemorySheetStore {
    fn read_cells(
        &self,
        sheet: &str,
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    ) -> Result<Vec<Vec<CellValue>>, StoreError> {
        self.with_sheet(sheet, |s| {
            (0..rows)
                .map(|r| {
                    (0..cols)
                        .map(|c| {
                            s.cells
                                .get(&(row + r, col + c))
                                .cloned()
                                .unwrap_or(CellValue::Empty)
                        })
                        .collect()
                })
                .collect()
        })
    }

    fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let s = inner
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::MissingSheet(sheet.to_string()))?;
        if value.is_blank() {
            s.cells.remove(&(row, col));
        } else {
            s.cells.insert((row, col), value);
        }
        Ok(())
    }

    fn find_cell_by_exact_text(
        &self,
        sheet: &str,
        text: &str,
    ) -> Result<Option<CellRef>, StoreError> {
        self.with_sheet(sheet, |s| {
            s.cells
                .iter()
                .find(|(_, v)| v.display() == text)
                .map(|((row, col), _)| CellRef::new(*row, *col))
        })
    }

    fn is_column_hidden(&self, sheet: &str, col: u32) -> Result<bool, StoreError> {
        self.with_sheet(sheet, |s| s.hidden_columns.contains(&col))
    }

    fn last_column(&self, sheet: &str) -> Result<u32, StoreError> {
        self.with_sheet(sheet, |s| s.last_column())
    }

    fn named_range(&self, name: &str) -> Result<Option<NamedRange>, StoreError> {
        let inner = self.inner.read();
        let stored = match inner.named_ranges.get(name) {
            Some(stored) => stored,
            None => return Ok(None),
        };
        let sheet = inner
            .sheets
            .get(&stored.sheet)
            .ok_or_else(|| StoreError::MissingSheet(stored.sheet.clone()))?;

        let r = &stored.range;
        let values = (0..r.rows)
            .map(|row| {
                (0..r.cols)
                    .map(|col| {
                        sheet
                            .cells
                            .get(&(r.row + row, r.col + col))
                            .cloned()
                            .unwrap_or(CellValue::Empty)
                    })
                    .collect()
            })
            .collect();

        Ok(Some(NamedRange {
            name: name.to_string(),
            sheet: stored.sheet.clone(),
            anchor: CellRef::new(r.row, r.col),
            values,
        }))
    }

    fn set_validation_rule(
        &self,
        range: &RangeRef,
        rule: ValidationRule,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let s = inner
            .sheets
            .get_mut(&range.sheet)
            .ok_or_else(|| StoreError::MissingSheet(range.sheet.clone()))?;
        for row in range.row..=range.end_row() {
            for col in range.col..=range.end_col() {
                s.rules.insert((row, col), rule.clone());
            }
        }
        Ok(())
    }

    fn clear_validation_rules(&self, range: &RangeRef) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let s = inner
            .sheets
            .get_mut(&range.sheet)
            .ok_or_else(|| StoreError::MissingSheet(range.sheet.clone()))?;
        for row in range.row..=range.end_row() {
            for col in range.col..=range.end_col() {
                s.rules.remove(&(row, col));
            }
        }
        Ok(())
    }

    fn validation_rules(
        &self,
        range: &RangeRef,
    ) -> Result<Vec<Vec<Option<ValidationRule>>>, StoreError> {
        self.with_sheet(&range.sheet, |s| {
            (0..range.rows)
                .map(|r| {
                    (0..range.cols)
                        .map(|c| s.rules.get(&(range.row + r, range.col + c)).cloned())
                        .collect()
                })
                .collect()
        })
    }
}

/// Chainable document builder for tests.
pub struct SheetFixture {
    store: MemorySheetStore,
}

impl SheetFixture {
    pub fn new() -> Self {
        Self {
            store: MemorySheetStore::new(),
        }
    }

    pub fn sheet(self, name: &str) -> Self {
        self.store.add_sheet(name);
        self
    }

    pub fn cell(self, sheet: &str, row: u32, col: u32, value: impl Into<CellValue>) -> Self {
        self.store.set_cell(sheet, row, col, value.into());
        self
    }

    /// Fill one row left-to-right starting at `start_col`.
    pub fn row(self, sheet: &str, row: u32, start_col: u32, values: &[CellValue]) -> Self {
        for (i, value) in values.iter().enumerate() {
            self.store.set_cell(sheet, row, start_col + i as u32, value.clone());
        }
        self
    }

    pub fn hidden_column(self, sheet: &str, col: u32) -> Self {
        self.store.hide_column(sheet, col);
        self
    }

    pub fn named_range(self, name: &str, range: RangeRef) -> Self {
        self.store.define_named_range(name, range);
        self
    }

    pub fn build(self) -> MemorySheetStore {
        self.store
    }
}

impl Default for SheetFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_overshoot_into_blank_cells() {
        let store = SheetFixture::new()
            .cell("S", 1, 1, "only")
            .build();
        let block = store.read_cells("S", 1, 1, 2, 2).unwrap();
        assert_eq!(block[0][0], CellValue::Text("only".into()));
        assert_eq!(block[0][1], CellValue::Empty);
        assert_eq!(block[1][0], CellValue::Empty);
    }

    #[test]
    fn text_search_matches_entire_cell_only() {
        let store = SheetFixture::new()
            .cell("S", 3, 2, "MT VIC RUN EXTENDED")
            .cell("S", 5, 1, "MT VIC RUN")
            .build();
        let hit = store.find_cell_by_exact_text("S", "MT VIC RUN").unwrap();
        assert_eq!(hit, Some(CellRef::new(5, 1)));
        assert_eq!(store.find_cell_by_exact_text("S", "MT VIC").unwrap(), None);
    }

    #[test]
    fn named_ranges_read_live_cell_content() {
        let store = SheetFixture::new()
            .cell("S", 1, 1, "Bucket")
            .named_range("ContainerTypes", RangeRef::new("S", 1, 1, 2, 1))
            .build();

        let nr = store.named_range("ContainerTypes").unwrap().unwrap();
        assert_eq!(nr.flat_values(), vec![CellValue::Text("Bucket".into())]);

        store.set_cell("S", 2, 1, CellValue::Text("Crate".into()));
        let nr = store.named_range("ContainerTypes").unwrap().unwrap();
        assert_eq!(nr.flat_values().len(), 2);
    }

    #[test]
    fn unknown_sheet_is_an_error_but_unknown_name_is_not() {
        let store = MemorySheetStore::new();
        assert!(matches!(
            store.read_cells("nope", 1, 1, 1, 1),
            Err(StoreError::MissingSheet(_))
        ));
        assert!(store.named_range("nope").unwrap().is_none());
    }
}
