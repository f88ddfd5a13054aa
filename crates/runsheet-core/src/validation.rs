//! Data-validation criteria: evaluation, range health-checks, and the
//! date-cell validation refresh.
//!
//! Evaluation mirrors the host grid's own semantics: a blank cell satisfies
//! almost every criterion (clearing a cell is always a legitimate edit), and
//! rule kinds the engine does not model evaluate as valid with an
//! "unsupported" explanation so they never block a write.

use crate::collection::{OptionListFormat, VolumesAndDateFlags, volumes_and_date_flags};
use crate::config::AppConfig;
use crate::container::ContainerCatalog;
use crate::error::{ConfigError, EngineError};
use crate::group::RunGroup;
use crate::run::RunLocator;
use once_cell::sync::Lazy;
use regex::Regex;
use runsheet_common::{CellValue, Quantity};
use runsheet_store::{Criteria, DocumentCache, RangeRef, RangeStore, ValidationRule};
use tracing::debug;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(https?://)?((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|((\d{1,3}\.){3}\d{1,3}))(:\d+)?(/[-a-z\d%_.~+]*)*(\?[;&a-z\d%_.~+=-]*)?(\#[-a-z\d_]*)?$",
    )
    .unwrap()
});

/// Result of evaluating one cell value against one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub valid: bool,
    pub explanation: String,
}

impl Verdict {
    fn new(valid: bool, explanation: impl Into<String>) -> Self {
        Self {
            valid,
            explanation: explanation.into(),
        }
    }
}

/// The human-readable health-check message for one cell.
pub fn verdict_message(cell: &str, value: &CellValue, verdict: &Verdict) -> String {
    format!(
        "\"{}\" is {}a valid value for cell {} ({})",
        value.display(),
        if verdict.valid { "" } else { "not " },
        cell,
        verdict.explanation
    )
}

/// Evaluate a criterion that needs no sheet access. `ValueInRange` cannot be
/// resolved here and evaluates as unsupported; use [`evaluate`] for it.
pub fn evaluate_value(criteria: &Criteria, value: &CellValue) -> Verdict {
    let kind = criteria.kind_name();
    let blank = value.is_blank();
    let number = value.as_number();
    let text = value.display();

    match criteria {
        Criteria::Checkbox => {
            let valid = blank
                || value.as_bool().is_some()
                || text == "true"
                || text == "false";
            Verdict::new(valid, format!("{kind} is true or false/empty"))
        }
        Criteria::NumberBetween { min, max } => Verdict::new(
            blank || number.map(|n| n >= *min && n <= *max).unwrap_or(false),
            format!("{kind} {min} and {max}"),
        ),
        Criteria::NumberEqualTo { value: expected } => Verdict::new(
            blank || number.map(|n| n == *expected).unwrap_or(false),
            format!("{kind} {expected}"),
        ),
        Criteria::NumberGreaterThan { value: expected } => Verdict::new(
            blank || number.map(|n| n > *expected).unwrap_or(false),
            format!("{kind} {expected}"),
        ),
        Criteria::NumberGreaterThanOrEqualTo { value: expected } => Verdict::new(
            blank || number.map(|n| n >= *expected).unwrap_or(false),
            format!("{kind} {expected}"),
        ),
        Criteria::NumberLessThan { value: expected } => Verdict::new(
            blank || number.map(|n| n < *expected).unwrap_or(false),
            format!("{kind} {expected}"),
        ),
        Criteria::NumberLessThanOrEqualTo { value: expected } => Verdict::new(
            blank || number.map(|n| n <= *expected).unwrap_or(false),
            format!("{kind} {expected}"),
        ),
        Criteria::NumberNotEqualTo { value: expected } => Verdict::new(
            blank || number.map(|n| n != *expected).unwrap_or(false),
            format!("{kind} {expected}"),
        ),
        Criteria::TextContains { needle } => Verdict::new(
            blank || text.contains(needle.as_str()),
            format!("{kind} {needle}"),
        ),
        Criteria::TextDoesNotContain { needle } => Verdict::new(
            blank || !text.contains(needle.as_str()),
            format!("{kind} {needle}"),
        ),
        Criteria::TextEqualTo { value: expected } => Verdict::new(
            blank || text == *expected,
            format!("{kind} {expected}"),
        ),
        Criteria::TextIsValidEmail => Verdict::new(blank || EMAIL.is_match(&text), kind),
        // Unlike the other text kinds, a blank cell is not a valid URL.
        Criteria::TextIsValidUrl => Verdict::new(URL.is_match(&text), kind),
        Criteria::ValueInList { values } => {
            let valid = blank || values.iter().any(|v| v.display() == text);
            let listed: Vec<String> = values.iter().map(|v| v.display()).collect();
            Verdict::new(valid, format!("{kind} {}", listed.join(",")))
        }
        Criteria::ValueInRange { range } => Verdict::new(
            true,
            format!("{kind} {range} not resolvable without the sheet"),
        ),
        Criteria::Unsupported { .. } => {
            Verdict::new(true, format!("{kind} unsupported by the criteria engine"))
        }
    }
}

/// Evaluate a criterion, resolving `ValueInRange` against the live sheet.
pub fn evaluate(
    criteria: &Criteria,
    value: &CellValue,
    store: &dyn RangeStore,
) -> Result<Verdict, EngineError> {
    if let Criteria::ValueInRange { range } = criteria {
        let values: Vec<CellValue> = store
            .read_cells(&range.sheet, range.row, range.col, range.rows, range.cols)?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_blank())
            .collect();
        let resolved = Criteria::ValueInList { values };
        let inner = evaluate_value(&resolved, value);
        return Ok(Verdict::new(
            inner.valid,
            inner
                .explanation
                .replacen("VALUE_IN_LIST", &format!("VALUE_IN_RANGE {range}"), 1),
        ));
    }
    Ok(evaluate_value(criteria, value))
}

/// All messages from replaying a range's validation rules against its values
/// (or against `replacement_values`, to pre-check a write).
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

pub fn validate_range(
    store: &dyn RangeStore,
    range: &RangeRef,
    replacement_values: Option<&[Vec<CellValue>]>,
) -> Result<ValidationReport, EngineError> {
    let rules = store.validation_rules(range)?;
    let current;
    let values: &[Vec<CellValue>] = match replacement_values {
        Some(values) => values,
        None => {
            current = store.read_cells(&range.sheet, range.row, range.col, range.rows, range.cols)?;
            &current
        }
    };

    let mut report = ValidationReport::default();
    for (r, rule_row) in rules.iter().enumerate() {
        for (c, rule) in rule_row.iter().enumerate() {
            let value = values
                .get(r)
                .and_then(|row| row.get(c))
                .cloned()
                .unwrap_or(CellValue::Empty);
            let verdict = match rule {
                Some(rule) => evaluate(&rule.criteria, &value, store)?,
                None => Verdict::new(true, "no validation rule"),
            };
            let cell = RangeRef::cell(range.sheet.clone(), range.row + r as u32, range.col + c as u32);
            let message = verdict_message(&cell.to_string(), &value, &verdict);
            if verdict.valid {
                report.valid.push(message);
            } else {
                report.invalid.push(message);
            }
        }
    }
    Ok(report)
}

/// Regenerates the grid's own dropdowns/checkboxes for date cells, from the
/// same derived option sets the form uses.
pub struct ValidationRefresher<'a> {
    store: &'a dyn RangeStore,
    cache: &'a DocumentCache,
    config: &'a AppConfig,
    containers: &'a ContainerCatalog,
    date_flags: &'a [String],
}

impl<'a> ValidationRefresher<'a> {
    pub fn new(
        store: &'a dyn RangeStore,
        cache: &'a DocumentCache,
        config: &'a AppConfig,
        containers: &'a ContainerCatalog,
        date_flags: &'a [String],
    ) -> Self {
        Self {
            store,
            cache,
            config,
            containers,
            date_flags,
        }
    }

    /// Refresh the date-cell rules of a single row, after a container or
    /// quantity edit. Rows without both a container and a positive quantity
    /// are left alone.
    pub fn refresh_row(&self, group: &RunGroup, row_index: u32) -> Result<String, EngineError> {
        let sheet = &group.sheet_name;
        let read_cell = |logical: &str| -> Result<CellValue, EngineError> {
            let col = group
                .column_index(logical)
                .ok_or_else(|| ConfigError::MissingColumn {
                    sheet: sheet.clone(),
                    column: logical.to_string(),
                })?;
            Ok(self.store.read_cells(sheet, row_index, col, 1, 1)?[0][0].clone())
        };

        let type_code = read_cell("type")?;
        let container_cell = read_cell("container")?;
        let quantity = Quantity::from_cell(&read_cell("quantity")?);

        if container_cell.is_blank() || quantity.count() == 0 {
            return Ok(format!(
                "Missing fields - data validation rules NOT applied to date cells in row {row_index}"
            ));
        }

        let container = self
            .containers
            .container(self.cache, &container_cell.display(), quantity)?;
        self.apply_row_criteria(group, row_index, &type_code.display(), &container)?;

        Ok(format!(
            "Data validation rules applied to all visible date cells in row {row_index}"
        ))
    }

    /// Refresh the date-cell rules of every run row in every group: clear the
    /// existing rules per date column, then rebuild them row by row.
    pub fn refresh_all(&self, groups: &[RunGroup]) -> Result<String, EngineError> {
        let run_locator = RunLocator::new(self.store, self.cache, self.config);

        for group in groups {
            let mut run_names = vec![group.pre_run_extras_name.clone()];
            run_names.extend(group.ordered_run_names.iter().cloned());
            run_names.push(group.post_run_extras_name.clone());

            for run_name in run_names {
                let run = run_locator.run(group, &run_name)?;
                if run.bounds.row_count == 0 {
                    continue;
                }

                let span = group.date_header_span;
                for i in 0..span.col_count {
                    let column = RangeRef::new(
                        group.sheet_name.clone(),
                        run.bounds.start_row_index,
                        span.start_col + i,
                        run.bounds.row_count,
                        1,
                    );
                    self.store.clear_validation_rules(&column)?;
                }

                let read_column = |logical: &str| -> Result<Vec<CellValue>, EngineError> {
                    let col = group.column_index(logical).ok_or_else(|| {
                        ConfigError::MissingColumn {
                            sheet: group.sheet_name.clone(),
                            column: logical.to_string(),
                        }
                    })?;
                    Ok(self
                        .store
                        .read_cells(
                            &group.sheet_name,
                            run.bounds.start_row_index,
                            col,
                            run.bounds.row_count,
                            1,
                        )?
                        .into_iter()
                        .map(|mut r| r.remove(0))
                        .collect())
                };

                let types = read_column("type")?;
                let containers = read_column("container")?;
                let quantities = read_column("quantity")?;

                for i in 0..run.bounds.row_count as usize {
                    let quantity = Quantity::from_cell(&quantities[i]);
                    if containers[i].is_blank() || quantity.count() == 0 {
                        continue;
                    }
                    let container = self.containers.container(
                        self.cache,
                        &containers[i].display(),
                        quantity,
                    )?;
                    self.apply_row_criteria(
                        group,
                        run.bounds.start_row_index + i as u32,
                        &types[i].display(),
                        &container,
                    )?;
                }

                debug!(run = %run_name, "date validation rebuilt");
            }
        }

        Ok("Data validation rules applied to all visible date cells in all rows".to_string())
    }

    fn apply_row_criteria(
        &self,
        group: &RunGroup,
        row_index: u32,
        type_code: &str,
        container: &crate::container::Container,
    ) -> Result<(), EngineError> {
        let span = group.date_header_span;

        // Checklist stops get a checkbox; everything else gets the combined
        // volume/date-flag list. Both reject invalid entry outright.
        let rule = if type_code == "X" {
            ValidationRule::rejecting(Criteria::Checkbox)
        } else {
            let list = volumes_and_date_flags(
                self.cache,
                container,
                self.date_flags,
                OptionListFormat::CriteriaList,
            )?;
            let values = match list {
                VolumesAndDateFlags::CriteriaList { list } => list
                    .split(',')
                    .map(|part| CellValue::Text(part.to_string()))
                    .collect(),
                VolumesAndDateFlags::Grouped { .. } => Vec::new(),
            };
            ValidationRule::rejecting(Criteria::ValueInList { values })
        };

        for i in 0..span.col_count {
            let cell = RangeRef::cell(group.sheet_name.clone(), row_index, span.start_col + i);
            self.store.set_validation_rule(&cell, rule.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn blank_satisfies_most_criteria() {
        let blank = CellValue::Empty;
        assert!(evaluate_value(&Criteria::Checkbox, &blank).valid);
        assert!(
            evaluate_value(&Criteria::NumberGreaterThan { value: 0.0 }, &blank).valid
        );
        assert!(
            evaluate_value(
                &Criteria::TextEqualTo {
                    value: "x".into()
                },
                &blank
            )
            .valid
        );
        assert!(
            evaluate_value(
                &Criteria::ValueInList {
                    values: vec![text("5")]
                },
                &blank
            )
            .valid
        );
        // URL is the deliberate exception
        assert!(!evaluate_value(&Criteria::TextIsValidUrl, &blank).valid);
    }

    #[test]
    fn number_comparisons_require_numbers() {
        let criteria = Criteria::NumberGreaterThan { value: 0.0 };
        assert!(evaluate_value(&criteria, &CellValue::Int(20)).valid);
        assert!(!evaluate_value(&criteria, &CellValue::Int(0)).valid);
        assert!(!evaluate_value(&criteria, &text("twenty")).valid);

        let between = Criteria::NumberBetween { min: 1.0, max: 5.0 };
        assert!(evaluate_value(&between, &CellValue::Number(5.0)).valid);
        assert!(!evaluate_value(&between, &CellValue::Number(5.5)).valid);
        assert_eq!(
            evaluate_value(&between, &CellValue::Number(5.5)).explanation,
            "NUMBER_BETWEEN 1 and 5"
        );
    }

    #[test]
    fn checkbox_accepts_booleans_and_form_strings() {
        assert!(evaluate_value(&Criteria::Checkbox, &CellValue::Bool(true)).valid);
        assert!(evaluate_value(&Criteria::Checkbox, &text("false")).valid);
        assert!(!evaluate_value(&Criteria::Checkbox, &text("yes")).valid);
    }

    #[test]
    fn value_in_list_compares_display_strings() {
        let criteria = Criteria::ValueInList {
            values: vec![text("5"), text("10"), text("Skip")],
        };
        assert!(evaluate_value(&criteria, &text("Skip")).valid);
        assert!(evaluate_value(&criteria, &CellValue::Int(5)).valid);
        assert!(!evaluate_value(&criteria, &text("11")).valid);
    }

    #[test]
    fn email_and_url_patterns() {
        assert!(evaluate_value(&Criteria::TextIsValidEmail, &text("kai@example.org")).valid);
        assert!(!evaluate_value(&Criteria::TextIsValidEmail, &text("not-an-email")).valid);
        assert!(evaluate_value(&Criteria::TextIsValidUrl, &text("https://example.org/a?b=1")).valid);
        assert!(!evaluate_value(&Criteria::TextIsValidUrl, &text("::nope::")).valid);
    }

    #[test]
    fn unsupported_kinds_never_block() {
        let criteria = Criteria::Unsupported {
            kind: "DATE_AFTER".into(),
        };
        let verdict = evaluate_value(&criteria, &text("anything"));
        assert!(verdict.valid);
        assert_eq!(
            verdict.explanation,
            "DATE_AFTER unsupported by the criteria engine"
        );
    }

    #[test]
    fn messages_carry_cell_and_explanation() {
        let verdict = evaluate_value(&Criteria::NumberGreaterThan { value: 0.0 }, &text("x"));
        assert_eq!(
            verdict_message("Suburbs!C5", &text("x"), &verdict),
            "\"x\" is not a valid value for cell Suburbs!C5 (NUMBER_GREATER_THAN 0)"
        );
    }
}
