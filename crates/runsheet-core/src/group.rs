//! Run-group metadata: one physical sheet holding several runs.
//!
//! A group is described entirely by named ranges the sheet author maintains
//! (`RunGroup{g}ColumnHeaders`, `RunGroup{g}RunHeader{r}`, footer and
//! pre/post extras headers). Everything else (column indices, the visible
//! date-header span, formatted date labels) is derived here and cached as a
//! single snapshot so that repeated UI interactions never re-scan the sheet.

use crate::config::AppConfig;
use crate::error::{ConfigError, EngineError};
use crate::validation::{evaluate, verdict_message};
use chrono::{Datelike, NaiveDate};
use runsheet_common::{CellValue, contract, string_to_id};
use runsheet_store::{DocumentCache, NamedRange, RangeRef, RangeStore, ValidationRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Named ranges with fixed, well-known names.
pub const RANGE_CONTAINER_CAPACITIES: &str = "ContainerCapacities";
pub const RANGE_CONTAINER_TYPES: &str = "ContainerTypes";
pub const RANGE_DATE_FLAGS: &str = "DateFlags";
pub const RANGE_NON_VOLUMES: &str = "NonVolumes";

/// Cache key of the whole-catalog snapshot.
pub const SNAPSHOT_CACHE_KEY: &str = "named-range-values";

/// A contiguous span of columns: the visible date headers of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub start_col: u32,
    pub col_count: u32,
}

/// One date header, raw and display-formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDate {
    pub formatted: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunGroup {
    pub sheet_name: String,
    /// Lower-cased logical column name → 1-based column index.
    pub column_header_indices: BTreeMap<String, u32>,
    pub column_header_row_index: u32,
    pub footer_text: String,
    pub pre_run_extras_name: String,
    pub post_run_extras_name: String,
    /// Run names in sheet order. Order is significant: a run's lower bound is
    /// the next run's header row.
    pub ordered_run_names: Vec<String>,
    pub date_header_span: ColumnSpan,
    pub date_headers: Vec<CellValue>,
    pub date_headers_formatted: Vec<String>,
}

impl RunGroup {
    pub fn id(&self) -> String {
        string_to_id(&self.sheet_name)
    }

    pub fn cache_key(sheet_name: &str) -> String {
        format!("run-group-{}", string_to_id(sheet_name))
    }

    /// Membership test: ordinary runs plus the two extras pseudo-runs.
    pub fn contains_run(&self, run_name: &str) -> bool {
        self.pre_run_extras_name == run_name
            || self.post_run_extras_name == run_name
            || self.ordered_run_names.iter().any(|n| n == run_name)
    }

    /// Name of the run physically below `run_name` on the sheet, or `None`
    /// for the last run (whose lower bound is the group footer). The extras
    /// blocks sit above the ordinary runs: pre-extras, then post-extras,
    /// then the first run.
    pub fn next_run_name(&self, run_name: &str) -> Option<String> {
        if self.pre_run_extras_name == run_name {
            return Some(self.post_run_extras_name.clone());
        }
        if self.post_run_extras_name == run_name {
            return self.ordered_run_names.first().cloned();
        }
        let idx = self.ordered_run_names.iter().position(|n| n == run_name)?;
        self.ordered_run_names.get(idx + 1).cloned()
    }

    pub fn column_index(&self, logical_name: &str) -> Option<u32> {
        self.column_header_indices
            .get(&logical_name.to_lowercase())
            .copied()
    }

    /// Column of a date header, by its formatted label. Resolved as an
    /// offset into the date-header span, with no sheet scan. Assumes no blank
    /// header columns between dates, like the span itself.
    pub fn date_column(&self, formatted_header: &str) -> Option<u32> {
        self.date_headers_formatted
            .iter()
            .position(|h| h == formatted_header)
            .map(|i| self.date_header_span.start_col + i as u32)
    }

    /// Rightmost logical column; the date headers start one past it.
    pub fn last_logical_column(&self) -> u32 {
        self.column_header_indices
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Parsed run dates, latest first. Headers from before the current year
    /// are dropped (old seasons are left on the sheet, hidden or not).
    pub fn run_dates(&self, date_format: &str, today: NaiveDate) -> Vec<RunDate> {
        let mut dates: Vec<RunDate> = self
            .date_headers
            .iter()
            .filter_map(parse_date_header)
            .filter(|d| d.year() >= today.year())
            .map(|date| RunDate {
                formatted: format_date(date, date_format),
                date,
            })
            .collect();
        dates.reverse();
        dates
    }

    /// The next run date: today if today is a run date, else the nearest
    /// future date. Date-only comparison.
    pub fn next_run_date(&self, date_format: &str, today: NaiveDate) -> Option<String> {
        let mut dates = self.run_dates(date_format, today);
        dates.reverse(); // oldest first
        dates
            .into_iter()
            .find(|rd| rd.date >= today)
            .map(|rd| rd.formatted)
    }
}

/// Parse a raw date-header cell. Headers are stored as ISO dates.
pub(crate) fn parse_date_header(value: &CellValue) -> Option<NaiveDate> {
    let text = value.as_text()?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub(crate) fn format_date(date: NaiveDate, date_format: &str) -> String {
    date.format(date_format).to_string()
}

/// Everything read out of the configured named ranges, plus the derived run
/// groups, cached as one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub named_range_values: BTreeMap<String, Vec<CellValue>>,
    pub run_groups: Vec<RunGroup>,
}

impl CatalogSnapshot {
    /// Freshness check: the cached entry is only trusted when its key count
    /// matches the configured named-range item count and every computed
    /// entry is present. Adding a range to the configuration silently
    /// invalidates older snapshots.
    pub fn is_fresh(&self, config: &AppConfig) -> bool {
        let computed_present = if self.run_groups.is_empty() {
            0
        } else {
            config.computed_named_range_names.len()
        };
        self.named_range_values.len() + computed_present
            == config.named_range_items.len() + config.computed_named_range_names.len()
    }

    pub fn values(&self, name: &str) -> Option<&[CellValue]> {
        self.named_range_values.get(name).map(|v| v.as_slice())
    }

    pub fn string_values(&self, name: &str) -> Vec<String> {
        self.values(name)
            .map(|vs| vs.iter().map(|v| v.display()).collect())
            .unwrap_or_default()
    }

    pub fn number_values(&self, name: &str) -> Result<Vec<f64>, EngineError> {
        let values = self.values(name).unwrap_or_default();
        values
            .iter()
            .map(|v| contract::expect_number(v, name).map_err(EngineError::from))
            .collect()
    }
}

/// Builds and caches the per-document catalog of run groups.
pub struct RunGroupCatalog<'a> {
    store: &'a dyn RangeStore,
    cache: &'a DocumentCache,
    config: &'a AppConfig,
}

impl<'a> RunGroupCatalog<'a> {
    pub fn new(store: &'a dyn RangeStore, cache: &'a DocumentCache, config: &'a AppConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// The cached snapshot, rebuilt when stale or absent.
    pub fn snapshot(&self) -> Result<CatalogSnapshot, EngineError> {
        if let Some(snapshot) = self
            .cache
            .get_item::<CatalogSnapshot>(SNAPSHOT_CACHE_KEY, false)
        {
            if snapshot.is_fresh(self.config) {
                return Ok(snapshot);
            }
            debug!("catalog snapshot is stale, rebuilding");
        }

        let (snapshot, violations) = self.build()?;
        self.cache.set_item(SNAPSHOT_CACHE_KEY, &snapshot, false)?;
        for group in &snapshot.run_groups {
            self.cache
                .set_item(&RunGroup::cache_key(&group.sheet_name), group, false)?;
        }

        // All violations for one build are reported together.
        if !violations.is_empty() {
            return Err(ConfigError::InvalidNamedRangeValues(violations).into());
        }

        Ok(snapshot)
    }

    pub fn build_all(&self) -> Result<Vec<RunGroup>, EngineError> {
        Ok(self.snapshot()?.run_groups)
    }

    /// Each run belongs to exactly one group; find it by membership.
    pub fn group_for_run(&self, run_name: &str) -> Result<RunGroup, EngineError> {
        let snapshot = self.snapshot()?;
        snapshot
            .run_groups
            .into_iter()
            .find(|g| g.contains_run(run_name))
            .ok_or_else(|| ConfigError::UnknownRunName(run_name.to_string()).into())
    }

    fn require_named_range(&self, name: &str) -> Result<NamedRange, EngineError> {
        self.store
            .named_range(name)?
            .ok_or_else(|| ConfigError::MissingNamedRange(name.to_string()).into())
    }

    fn build(&self) -> Result<(CatalogSnapshot, Vec<String>), EngineError> {
        let mut named_range_values = BTreeMap::new();
        let mut violations = Vec::new();

        for item in &self.config.named_range_items {
            let named_range = self.require_named_range(&item.name)?;

            if let Some(criteria) = &item.validation {
                let rule = ValidationRule::new(criteria.clone());
                self.store.set_validation_rule(&named_range.range(), rule)?;
                violations.extend(self.check_range_values(&named_range, criteria)?);
            }

            named_range_values.insert(item.name.clone(), named_range.flat_values());
        }

        let run_groups = (1..=self.config.run_group_count)
            .map(|g| self.build_group(g))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((
            CatalogSnapshot {
                named_range_values,
                run_groups,
            },
            violations,
        ))
    }

    fn check_range_values(
        &self,
        named_range: &NamedRange,
        criteria: &runsheet_store::Criteria,
    ) -> Result<Vec<String>, EngineError> {
        let mut invalid = Vec::new();
        for (r, row) in named_range.values.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let verdict = evaluate(criteria, value, self.store)?;
                if !verdict.valid {
                    let cell = RangeRef::cell(
                        named_range.sheet.clone(),
                        named_range.anchor.row + r as u32,
                        named_range.anchor.col + c as u32,
                    );
                    invalid.push(verdict_message(&cell.to_string(), value, &verdict));
                }
            }
        }
        Ok(invalid)
    }

    fn build_group(&self, g: u32) -> Result<RunGroup, EngineError> {
        let headers_name = format!("RunGroup{g}ColumnHeaders");
        let headers = self.require_named_range(&headers_name)?;
        let sheet_name = headers.sheet.clone();
        let column_header_row_index = headers.anchor.row;

        let mut column_header_indices = BTreeMap::new();
        if let Some(row) = headers.values.first() {
            for (i, value) in row.iter().enumerate() {
                if !value.is_blank() {
                    column_header_indices.insert(
                        value.display().trim().to_lowercase(),
                        headers.anchor.col + i as u32,
                    );
                }
            }
        }
        if column_header_indices.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "named range \"{headers_name}\" holds no column headers"
            ))
            .into());
        }

        let mut ordered_run_names = Vec::new();
        for r in 1..=self.config.run_group_run_count {
            let slot_name = format!("RunGroup{g}RunHeader{r}");
            let slot = self.require_named_range(&slot_name)?;
            match slot.first_value() {
                Some(value) => ordered_run_names.push(value.display()),
                None => debug!(slot = %slot_name, "blank run-header slot skipped"),
            }
        }
        if ordered_run_names.is_empty() {
            return Err(
                ConfigError::Invalid(format!("run group {g} defines no runs")).into(),
            );
        }

        let footer_text = self.single_value(&format!("RunGroup{g}Footer"))?;
        let pre_run_extras_name = self.single_value(&format!("RunGroup{g}PreRunHeader"))?;
        let post_run_extras_name = self.single_value(&format!("RunGroup{g}PostRunHeader"))?;

        let mut group = RunGroup {
            sheet_name,
            column_header_indices,
            column_header_row_index,
            footer_text,
            pre_run_extras_name,
            post_run_extras_name,
            ordered_run_names,
            date_header_span: ColumnSpan {
                start_col: 0,
                col_count: 0,
            },
            date_headers: Vec::new(),
            date_headers_formatted: Vec::new(),
        };

        let (span, date_headers) = self.date_header_span(&group)?;
        group.date_header_span = span;
        group.date_headers_formatted = date_headers
            .iter()
            .map(|v| match parse_date_header(v) {
                Some(date) => format_date(date, &self.config.date_format),
                None => v.display(),
            })
            .collect();
        group.date_headers = date_headers;

        Ok(group)
    }

    fn single_value(&self, name: &str) -> Result<String, EngineError> {
        let named_range = self.require_named_range(name)?;
        let value = named_range.first_value().unwrap_or(CellValue::Empty);
        Ok(contract::expect_nonempty_text(&value, name)?)
    }

    /// Compute the visible date-header span.
    ///
    /// Scan rightward from the column after the last logical column. Columns
    /// the user has hidden, and visible columns whose header cell is blank,
    /// push the start onward; the first visible non-blank header stops the
    /// scan. From there the span takes all remaining columns and trims
    /// trailing blanks (the sheet is assumed to have no blank headers between
    /// dates).
    fn date_header_span(
        &self,
        group: &RunGroup,
    ) -> Result<(ColumnSpan, Vec<CellValue>), EngineError> {
        let sheet = &group.sheet_name;
        let header_row = group.column_header_row_index;
        let last_logical = group.last_logical_column();
        let start_col = last_logical + 1;
        let column_count = self.store.last_column(sheet)?.saturating_sub(last_logical);

        if column_count == 0 {
            warn!(%sheet, "run group has no date-header columns");
            return Ok((
                ColumnSpan {
                    start_col,
                    col_count: 0,
                },
                Vec::new(),
            ));
        }

        let mut start_visible = start_col;
        for i in 0..column_count {
            let col = start_col + i;
            if self.store.is_column_hidden(sheet, col)? {
                start_visible = col + 1;
                continue;
            }
            let header = &self.store.read_cells(sheet, header_row, col, 1, 1)?[0][0];
            if header.is_blank() {
                start_visible = col + 1;
            } else {
                break;
            }
        }

        let row = self
            .store
            .read_cells(sheet, header_row, start_visible, 1, column_count)?;
        let headers: Vec<CellValue> = row[0]
            .iter()
            .filter(|v| !v.is_blank())
            .cloned()
            .collect();

        Ok((
            ColumnSpan {
                start_col: start_visible,
                col_count: headers.len() as u32,
            },
            headers,
        ))
    }
}
