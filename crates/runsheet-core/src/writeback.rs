//! Write-back of submitted form values.
//!
//! A submission covers up to four runs (pre-extras, run A, run B,
//! post-extras) for one date. Field names are `<ordinal>-<suffix>` where the
//! suffix is `notes` or `volume`; sorting the names aligns them with the
//! sheet rows, and each run consumes its own slice in display order. Only
//! changed values are written; each changed value is checked against the
//! cell's existing validation rule first, and every violation is collected
//! so one submission reports all of them at once. The caller decides whether
//! a dirty report blocks anything; the valid remainder is already written
//! (last-write-wins, no optimistic concurrency).

use crate::config::AppConfig;
use crate::error::{ConfigError, EngineError};
use crate::group::RunGroupCatalog;
use crate::locate::RangeLocator;
use crate::run::RunLocator;
use crate::validation::{Verdict, evaluate, verdict_message};
use runsheet_common::CellValue;
use runsheet_store::{DocumentCache, RangeRef, RangeStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// `<ordinal>-<suffix>`, e.g. "003-volume".
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFormSubmission {
    /// Formatted date header the volume values belong to, e.g. "Aug 10".
    pub run_date: String,
    pub pre_run_extras: Option<String>,
    pub run_a: Option<String>,
    pub run_b: Option<String>,
    pub post_run_extras: Option<String>,
    pub fields: Vec<FormField>,
}

impl RunFormSubmission {
    /// Runs in the order their rows appear in the form.
    fn run_order(&self) -> Vec<&str> {
        [
            self.pre_run_extras.as_deref(),
            self.run_a.as_deref(),
            self.run_b.as_deref(),
            self.post_run_extras.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|name| !name.is_empty())
        .collect()
    }
}

#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: usize,
    /// Data-quality warnings: one message per rejected cell value.
    pub warnings: Vec<String>,
}

impl WriteReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Form values are strings; the grid expects booleans for checkbox cells.
fn coerce_form_value(raw: &str) -> CellValue {
    match raw.to_lowercase().as_str() {
        "true" => CellValue::Bool(true),
        "false" => CellValue::Bool(false),
        _ => CellValue::from(raw),
    }
}

pub struct FormWriter<'a> {
    store: &'a dyn RangeStore,
    cache: &'a DocumentCache,
    config: &'a AppConfig,
}

impl<'a> FormWriter<'a> {
    pub fn new(store: &'a dyn RangeStore, cache: &'a DocumentCache, config: &'a AppConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn write(
        &self,
        catalog: &RunGroupCatalog,
        submission: &RunFormSubmission,
    ) -> Result<WriteReport, EngineError> {
        let mut sorted_fields: Vec<&FormField> = submission.fields.iter().collect();
        sorted_fields.sort_by(|a, b| a.name.cmp(&b.name));

        let run_locator = RunLocator::new(self.store, self.cache, self.config);
        let range_locator = RangeLocator::new(self.store, self.cache);

        let mut report = WriteReport::default();
        let mut previous_row_count = 0usize;

        for run_name in submission.run_order() {
            let group = catalog.group_for_run(run_name)?;
            let run = run_locator.run(&group, run_name)?;
            let row_count = run.bounds.row_count as usize;
            let start_row = run.bounds.start_row_index;
            let sheet = group.sheet_name.clone();

            let notes_col =
                group
                    .column_index("notes")
                    .ok_or_else(|| ConfigError::MissingColumn {
                        sheet: sheet.clone(),
                        column: "notes".to_string(),
                    })?;
            let volume_col = match group.date_column(&submission.run_date) {
                Some(col) => col,
                None => range_locator
                    .locate_column(&sheet, &submission.run_date)?
                    .ok_or_else(|| ConfigError::UnknownDateHeader {
                        sheet: sheet.clone(),
                        header: submission.run_date.clone(),
                    })?,
            };

            for (suffix, col) in [("notes", notes_col), ("volume", volume_col)] {
                let inputs: Vec<&FormField> = sorted_fields
                    .iter()
                    .copied()
                    .filter(|f| f.name.split('-').nth(1) == Some(suffix))
                    .collect();

                let slice_end = previous_row_count + row_count;
                if inputs.len() < slice_end {
                    return Err(EngineError::FormMismatch(format!(
                        "run \"{run_name}\" expects {row_count} \"{suffix}\" values but the \
                         submission provides {}",
                        inputs.len().saturating_sub(previous_row_count)
                    )));
                }
                let slice = &inputs[previous_row_count..slice_end];

                let old_values =
                    self.store
                        .read_cells(&sheet, start_row, col, row_count as u32, 1)?;

                for (i, field) in slice.iter().enumerate() {
                    let old_display = old_values[i][0].display();
                    if field.value == old_display {
                        continue;
                    }

                    let new_value = coerce_form_value(&field.value);
                    let cell = RangeRef::cell(sheet.clone(), start_row + i as u32, col);
                    let rule = self.store.validation_rules(&cell)?[0][0].clone();
                    let verdict = match &rule {
                        Some(rule) => evaluate(&rule.criteria, &new_value, self.store)?,
                        None => Verdict {
                            valid: true,
                            explanation: "no validation rule".to_string(),
                        },
                    };

                    if verdict.valid {
                        debug!(%cell, old = %old_display, new = %field.value, "writing form value");
                        self.store
                            .write_cell(&sheet, cell.row, cell.col, new_value)?;
                        report.written += 1;
                    } else {
                        report
                            .warnings
                            .push(verdict_message(&cell.to_string(), &new_value, &verdict));
                    }
                }
            }

            previous_row_count += row_count;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_strings_coerce_to_grid_values() {
        assert_eq!(coerce_form_value("true"), CellValue::Bool(true));
        assert_eq!(coerce_form_value("FALSE"), CellValue::Bool(false));
        assert_eq!(coerce_form_value("15"), CellValue::Text("15".into()));
        assert_eq!(coerce_form_value(""), CellValue::Empty);
    }

    #[test]
    fn run_order_skips_absent_runs() {
        let submission = RunFormSubmission {
            run_date: "Aug 10".into(),
            pre_run_extras: Some("PICK-UP".into()),
            run_a: Some("MT VIC RUN".into()),
            run_b: None,
            post_run_extras: Some(String::new()),
            fields: vec![],
        };
        assert_eq!(submission.run_order(), ["PICK-UP", "MT VIC RUN"]);
    }
}
