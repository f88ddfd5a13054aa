//! Run bounds: the contiguous row range one named run occupies.
//!
//! Bounds are computed once from header/footer positions and cached; they
//! deliberately INCLUDE any trailing blank or repurposed rows up to the next
//! boundary. Filtering those out is the deriver's job, so bounds stay valid
//! across every date while stop classification can change with any cell edit.

use crate::config::AppConfig;
use crate::error::{ConfigError, EngineError};
use crate::group::RunGroup;
use crate::locate::RangeLocator;
use runsheet_common::string_to_id;
use runsheet_store::{DocumentCache, RangeStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunBounds {
    /// First row after the run's header row.
    pub start_row_index: u32,
    /// Number of rows up to the next boundary, blank/hijacked rows included.
    pub row_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub name: String,
    /// `None` means last run in the group: the footer is the lower bound.
    pub next_run_name: Option<String>,
    pub bounds: RunBounds,
}

impl Run {
    pub fn cache_key(name: &str) -> String {
        format!("run-{}", string_to_id(name))
    }
}

/// Computes and caches [`Run`]s against their owning group's geometry.
pub struct RunLocator<'a> {
    store: &'a dyn RangeStore,
    cache: &'a DocumentCache,
    config: &'a AppConfig,
}

impl<'a> RunLocator<'a> {
    pub fn new(store: &'a dyn RangeStore, cache: &'a DocumentCache, config: &'a AppConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// The run, from cache if present, else computed from the sheet and
    /// cached under `run-<slug>`.
    pub fn run(&self, group: &RunGroup, run_name: &str) -> Result<Run, EngineError> {
        let key = Run::cache_key(run_name);
        if let Some(run) = self.cache.get_item::<Run>(&key, false) {
            return Ok(run);
        }

        let next_run_name = group.next_run_name(run_name);
        let bounds = self.bounds(group, run_name, next_run_name.as_deref())?;
        let run = Run {
            name: run_name.to_string(),
            next_run_name,
            bounds,
        };
        self.cache.set_item(&key, &run, false)?;
        Ok(run)
    }

    /// Bounds algorithm. The run starts on the row after its header row. Its
    /// row count reaches down to the next run's header (minus the configured
    /// blank rows) or, for the last run, to the row above the group footer
    /// (again minus the blank rows).
    pub fn bounds(
        &self,
        group: &RunGroup,
        run_name: &str,
        next_run_name: Option<&str>,
    ) -> Result<RunBounds, EngineError> {
        let locator = RangeLocator::new(self.store, self.cache);
        let sheet = &group.sheet_name;
        let blank_rows_after = self.config.run_blank_rows_after as i64;

        let header_row = locator.locate_row(sheet, run_name)?.ok_or_else(|| {
            ConfigError::MissingRunHeader {
                sheet: sheet.clone(),
                name: run_name.to_string(),
            }
        })?;
        let start_row_index = header_row + 1;

        let row_count = match next_run_name {
            Some(next) => {
                let next_row = locator.locate_row(sheet, next)?.ok_or_else(|| {
                    ConfigError::MissingRunHeader {
                        sheet: sheet.clone(),
                        name: next.to_string(),
                    }
                })?;
                (next_row as i64 - blank_rows_after) - start_row_index as i64
            }
            None => {
                let footer_row =
                    locator
                        .locate_row(sheet, &group.footer_text)?
                        .ok_or_else(|| ConfigError::MissingFooter {
                            sheet: sheet.clone(),
                            footer: group.footer_text.clone(),
                        })?;
                let last_row_index = footer_row as i64 - 1 - blank_rows_after;
                last_row_index - start_row_index as i64 + 1
            }
        };

        if row_count < 0 {
            warn!(
                run = run_name,
                row_count, "run bounds collapsed below zero, clamping"
            );
        }

        Ok(RunBounds {
            start_row_index,
            row_count: row_count.max(0) as u32,
        })
    }
}
