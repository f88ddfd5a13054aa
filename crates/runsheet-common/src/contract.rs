//! Runtime type contracts for values crossing the store boundary.
//!
//! The grid is edited by people, so a cell that should hold a customer name
//! can hold anything. Derived structures check their inputs at the point of
//! assignment and fail with the offending value, the expected kind set, and
//! the field identifier, rather than letting a bad value propagate.

use crate::value::CellValue;
use std::fmt::{self, Display};
use thiserror::Error;

/// The kinds a contract can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Empty,
    Bool,
    Number,
    Text,
    /// Text with at least one non-whitespace character.
    NonEmptyText,
}

impl ValueKind {
    pub fn of(value: &CellValue) -> ValueKind {
        match value {
            CellValue::Empty => ValueKind::Empty,
            CellValue::Bool(_) => ValueKind::Bool,
            CellValue::Int(_) | CellValue::Number(_) => ValueKind::Number,
            CellValue::Text(s) if s.trim().is_empty() => ValueKind::Text,
            CellValue::Text(_) => ValueKind::NonEmptyText,
        }
    }

    fn matches(&self, value: &CellValue) -> bool {
        match self {
            ValueKind::Empty => matches!(value, CellValue::Empty),
            ValueKind::Bool => matches!(value, CellValue::Bool(_)),
            ValueKind::Number => value.as_number().is_some(),
            ValueKind::Text => matches!(value, CellValue::Text(_)),
            ValueKind::NonEmptyText => {
                matches!(value, CellValue::Text(s) if !s.trim().is_empty())
            }
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Empty => "an empty cell",
            ValueKind::Bool => "a boolean",
            ValueKind::Number => "a number",
            ValueKind::Text => "a string",
            ValueKind::NonEmptyText => "a non-empty string",
        })
    }
}

/// A value failed its type contract. Fatal at the point of assignment.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{field} must be {}, not {actual} ({value:?})", expected_list(.expected))]
pub struct ContractError {
    pub field: String,
    pub expected: Vec<ValueKind>,
    pub actual: ValueKind,
    pub value: CellValue,
}

fn expected_list(expected: &[ValueKind]) -> String {
    expected
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", or ")
}

/// Check `value` against one or more acceptable kinds, returning the value on
/// success. Kinds are tried in order; any match satisfies the contract.
pub fn expect<'v>(
    value: &'v CellValue,
    kinds: &[ValueKind],
    field: &str,
) -> Result<&'v CellValue, ContractError> {
    if kinds.iter().any(|k| k.matches(value)) {
        Ok(value)
    } else {
        Err(ContractError {
            field: field.to_string(),
            expected: kinds.to_vec(),
            actual: ValueKind::of(value),
            value: value.clone(),
        })
    }
}

/// Contract: text, possibly empty. Blank cells coerce to "".
pub fn expect_text(value: &CellValue, field: &str) -> Result<String, ContractError> {
    expect(value, &[ValueKind::Text, ValueKind::Empty], field)?;
    Ok(value.display())
}

/// Contract: text with content.
pub fn expect_nonempty_text(value: &CellValue, field: &str) -> Result<String, ContractError> {
    expect(value, &[ValueKind::NonEmptyText], field)?;
    Ok(value.display())
}

/// Contract: a number.
pub fn expect_number(value: &CellValue, field: &str) -> Result<f64, ContractError> {
    expect(value, &[ValueKind::Number], field)?;
    Ok(value.as_number().unwrap_or_default())
}
