//! The external grid's data-validation rule vocabulary.
//!
//! Rules are plain data here; building them from derived option sets and
//! evaluating cell values against them is the criteria engine's job in
//! `runsheet-core`. The enum is serde-tagged so rules survive the document
//! cache without reflective dispatch.

use crate::traits::RangeRef;
use runsheet_common::CellValue;
use serde::{Deserialize, Serialize};

/// One validation criterion, as the host grid models them.
///
/// `Unsupported` captures host rule kinds the engine does not understand
/// (date comparisons, custom formulas); they evaluate as always-valid so a
/// rule we cannot model never blocks a legitimate edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criteria {
    Checkbox,
    NumberBetween { min: f64, max: f64 },
    NumberEqualTo { value: f64 },
    NumberGreaterThan { value: f64 },
    NumberGreaterThanOrEqualTo { value: f64 },
    NumberLessThan { value: f64 },
    NumberLessThanOrEqualTo { value: f64 },
    NumberNotEqualTo { value: f64 },
    TextContains { needle: String },
    TextDoesNotContain { needle: String },
    TextEqualTo { value: String },
    TextIsValidEmail,
    TextIsValidUrl,
    ValueInList { values: Vec<CellValue> },
    ValueInRange { range: RangeRef },
    Unsupported {
        #[serde(rename = "name")]
        kind: String,
    },
}

impl Criteria {
    /// The host-style identifier used in validation messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Criteria::Checkbox => "CHECKBOX",
            Criteria::NumberBetween { .. } => "NUMBER_BETWEEN",
            Criteria::NumberEqualTo { .. } => "NUMBER_EQUAL_TO",
            Criteria::NumberGreaterThan { .. } => "NUMBER_GREATER_THAN",
            Criteria::NumberGreaterThanOrEqualTo { .. } => "NUMBER_GREATER_THAN_OR_EQUAL_TO",
            Criteria::NumberLessThan { .. } => "NUMBER_LESS_THAN",
            Criteria::NumberLessThanOrEqualTo { .. } => "NUMBER_LESS_THAN_OR_EQUAL_TO",
            Criteria::NumberNotEqualTo { .. } => "NUMBER_NOT_EQUAL_TO",
            Criteria::TextContains { .. } => "TEXT_CONTAINS",
            Criteria::TextDoesNotContain { .. } => "TEXT_DOES_NOT_CONTAIN",
            Criteria::TextEqualTo { .. } => "TEXT_EQUAL_TO",
            Criteria::TextIsValidEmail => "TEXT_IS_VALID_EMAIL",
            Criteria::TextIsValidUrl => "TEXT_IS_VALID_URL",
            Criteria::ValueInList { .. } => "VALUE_IN_LIST",
            Criteria::ValueInRange { .. } => "VALUE_IN_RANGE",
            Criteria::Unsupported { kind } => kind.as_str(),
        }
    }
}

/// A criterion plus the host's allow-invalid flag (warn vs reject on entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub criteria: Criteria,
    pub allow_invalid: bool,
}

impl ValidationRule {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            allow_invalid: true,
        }
    }

    pub fn rejecting(criteria: Criteria) -> Self {
        Self {
            criteria,
            allow_invalid: false,
        }
    }
}
