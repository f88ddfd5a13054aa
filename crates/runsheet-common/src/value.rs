use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A spreadsheet cell value as surfaced by the range store.
///
/// The host grid is untyped from our point of view: a date column may hold a
/// number (liters), a status string, or a checkbox boolean, and human-edited
/// cells are frequently blank. `Empty` and blank text are distinct values but
/// both count as blank for row classification (see [`CellValue::is_blank`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Blank means empty, or text that is whitespace-only once trimmed.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The value as the grid would display it. `Empty` renders as "".
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Container count for one stop.
///
/// Checklist-type stops carry no container at all; the sheet records an empty
/// cell where a count would be, and that sentinel survives into the model as
/// `NotApplicable` rather than zero (zero is a legitimate count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    NotApplicable,
    Count(u32),
}

impl Quantity {
    /// The loop bound for volume generation: `NotApplicable` contributes no
    /// container slots.
    pub fn count(&self) -> u32 {
        match self {
            Quantity::NotApplicable => 0,
            Quantity::Count(n) => *n,
        }
    }

    /// Lenient conversion from a sheet cell, mirroring how the grid is
    /// actually filled in: numbers count, blanks and non-numeric text do not.
    pub fn from_cell(value: &CellValue) -> Quantity {
        match value {
            CellValue::Int(i) if *i >= 0 => Quantity::Count(*i as u32),
            CellValue::Number(n) if *n >= 0.0 => Quantity::Count(*n as u32),
            CellValue::Text(s) => match s.trim().parse::<u32>() {
                Ok(n) => Quantity::Count(n),
                Err(_) => Quantity::NotApplicable,
            },
            _ => Quantity::NotApplicable,
        }
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::NotApplicable => Ok(()),
            Quantity::Count(n) => write!(f, "{n}"),
        }
    }
}
