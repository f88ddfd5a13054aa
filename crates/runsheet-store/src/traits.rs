use crate::error::StoreError;
use crate::rule::ValidationRule;
use runsheet_common::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A single cell position. Rows and columns are 1-based, matching the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// A rectangular cell range within one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRef {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
    pub rows: u32,
    pub cols: u32,
}

impl RangeRef {
    pub fn new(sheet: impl Into<String>, row: u32, col: u32, rows: u32, cols: u32) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
            rows,
            cols,
        }
    }

    /// Single-cell range.
    pub fn cell(sheet: impl Into<String>, row: u32, col: u32) -> Self {
        Self::new(sheet, row, col, 1, 1)
    }

    pub fn end_row(&self) -> u32 {
        self.row + self.rows.saturating_sub(1)
    }

    pub fn end_col(&self) -> u32 {
        self.col + self.cols.saturating_sub(1)
    }
}

impl Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = CellRef::new(self.row, self.col);
        if self.rows <= 1 && self.cols <= 1 {
            write!(f, "{}!{}", self.sheet, start)
        } else {
            let end = CellRef::new(self.end_row(), self.end_col());
            write!(f, "{}!{}:{}", self.sheet, start, end)
        }
    }
}

/// Spreadsheet column letters for a 1-based column index (1 → A, 27 → AA).
pub fn column_letters(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A named range resolved to its anchor position and current values.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    pub name: String,
    pub sheet: String,
    pub anchor: CellRef,
    /// Row-major cell values, one inner vec per row.
    pub values: Vec<Vec<CellValue>>,
}

impl NamedRange {
    /// The range's values flattened row-major with blanks removed, the shape
    /// most configuration ranges (capacities, types, flags) are consumed in.
    pub fn flat_values(&self) -> Vec<CellValue> {
        self.values
            .iter()
            .flatten()
            .filter(|v| !v.is_blank())
            .cloned()
            .collect()
    }

    /// First non-blank value, for single-cell ranges.
    pub fn first_value(&self) -> Option<CellValue> {
        self.flat_values().into_iter().next()
    }

    pub fn range(&self) -> RangeRef {
        let rows = self.values.len() as u32;
        let cols = self.values.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        RangeRef::new(
            self.sheet.clone(),
            self.anchor.row,
            self.anchor.col,
            rows.max(1),
            cols.max(1),
        )
    }
}

/// The host grid, reduced to the operations the engine needs.
///
/// Implementations take `&self` and are expected to provide interior
/// mutability; the engine holds a store behind `Arc<dyn RangeStore>`.
pub trait RangeStore: Send + Sync {
    /// Read a rectangular block of cell values. Cells beyond the sheet's
    /// populated extent read as [`CellValue::Empty`] rather than erroring;
    /// run bounds routinely overshoot into blank rows.
    fn read_cells(
        &self,
        sheet: &str,
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    ) -> Result<Vec<Vec<CellValue>>, StoreError>;

    fn write_cell(&self, sheet: &str, row: u32, col: u32, value: CellValue)
    -> Result<(), StoreError>;

    /// Full-sheet search for a cell whose entire display value equals `text`.
    /// This is the expensive scan every locator caches around.
    fn find_cell_by_exact_text(
        &self,
        sheet: &str,
        text: &str,
    ) -> Result<Option<CellRef>, StoreError>;

    /// Whether the user has hidden the given column.
    fn is_column_hidden(&self, sheet: &str, col: u32) -> Result<bool, StoreError>;

    /// Index of the last column with content.
    fn last_column(&self, sheet: &str) -> Result<u32, StoreError>;

    /// Resolve a named range, or `None` if the document does not define it.
    fn named_range(&self, name: &str) -> Result<Option<NamedRange>, StoreError>;

    /// Apply one validation rule to every cell in the range.
    fn set_validation_rule(&self, range: &RangeRef, rule: ValidationRule)
    -> Result<(), StoreError>;

    fn clear_validation_rules(&self, range: &RangeRef) -> Result<(), StoreError>;

    /// The validation rules currently attached to the range, row-major,
    /// `None` where a cell has no rule.
    fn validation_rules(
        &self,
        range: &RangeRef,
    ) -> Result<Vec<Vec<Option<ValidationRule>>>, StoreError>;
}

/// A flat string key-value store with host-imposed size ceilings.
///
/// Values are opaque strings; the [`DocumentCache`](crate::DocumentCache)
/// layers JSON buckets and the size ceiling on top.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn delete(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}
