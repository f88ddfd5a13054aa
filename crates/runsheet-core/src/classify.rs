//! Row classification for the collection deriver.
//!
//! The sheet is human-edited: a run's nominal bounds routinely contain rows
//! that are not stops. Classification is a pure function over a row's cell
//! snapshot so the contract can be tested without a store.

use runsheet_common::CellValue;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    /// First (customer) cell is blank: this row and everything below it is
    /// past the run's real content. Stop iterating.
    Terminal,
    /// The row has been repurposed (a sub-header, a note): skip it and keep
    /// walking.
    Hijacked,
    /// A real stop.
    Stop,
}

/// Classify one row of a run.
///
/// `cells` is the row's logical-column snapshot with the customer cell
/// first. A non-terminal row counts as a stop only when at least 2 distinct
/// non-blank values remain after deduplication. That threshold is a
/// deliberate, documented contract tuned to how these sheets are actually
/// repurposed; a legitimate stop with only a customer name filled in will be
/// misread as hijacked.
pub fn classify_row(cells: &[CellValue]) -> RowClass {
    let first = match cells.first() {
        Some(first) => first,
        None => return RowClass::Terminal,
    };
    if first.is_blank() {
        return RowClass::Terminal;
    }

    let distinct: BTreeSet<String> = cells
        .iter()
        .filter(|v| !v.is_blank())
        .map(|v| v.display())
        .collect();

    if distinct.len() < 2 {
        RowClass::Hijacked
    } else {
        RowClass::Stop
    }
}
