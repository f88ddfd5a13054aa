//! Collection derivation: one record per real stop on a run for one date.
//!
//! Collections are ephemeral. They are rebuilt on every request and never
//! cached as entities (the date column changes too often), but every
//! sub-computation they depend on (bounds, group metadata, container
//! volumes) is cached, so repeated derivations are cheap.

use crate::classify::{RowClass, classify_row};
use crate::config::AppConfig;
use crate::container::{Container, ContainerCatalog, VolumeOption};
use crate::error::{ConfigError, EngineError};
use crate::group::RunGroup;
use crate::locate::RangeLocator;
use crate::run::Run;
use runsheet_common::{CellValue, Quantity};
use runsheet_store::{DocumentCache, RangeStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Date-cell statuses with derived meaning.
pub const STATUS_CANCELLED: &str = "Cancelled";
pub const STATUS_ON_HOLD: &str = "Skip";
pub const STATUS_PENDING: &str = "Pending";

/// One customer stop on a run, on a specific date.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub run_name: String,
    pub run_date: Option<String>,
    pub customer_name: String,
    pub address: String,
    pub notes: String,
    /// Short collection-type code as written in the sheet ("B", "R", "X").
    pub type_code: String,
    /// The code expanded via the configured abbreviation table, when known.
    pub type_definition: Option<String>,
    /// The date cell's current content: an amount, a status, or a checkbox.
    pub date_value: CellValue,
    /// The date cell's value when it matches the date-flag vocabulary
    /// exactly, else empty.
    pub date_flag: String,
    pub container: Arc<Container>,
    pub cancelled: bool,
    pub on_hold: bool,
    pub pending: bool,
    /// True when none of the other status booleans are.
    pub collect: bool,
}

/// Walks a bound run and emits one [`Collection`] per real stop.
pub struct CollectionDeriver<'a> {
    store: &'a dyn RangeStore,
    cache: &'a DocumentCache,
    config: &'a AppConfig,
    containers: &'a ContainerCatalog,
    date_flags: &'a [String],
}

impl<'a> CollectionDeriver<'a> {
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

    fn column(
        &self,
        group: &RunGroup,
        run: &Run,
        logical_name: &str,
    ) -> Result<Vec<CellValue>, EngineError> {
        let col = group
            .column_index(logical_name)
            .ok_or_else(|| ConfigError::MissingColumn {
                sheet: group.sheet_name.clone(),
                column: logical_name.to_string(),
            })?;
        let rows = self.store.read_cells(
            &group.sheet_name,
            run.bounds.start_row_index,
            col,
            run.bounds.row_count,
            1,
        )?;
        Ok(rows.into_iter().map(|mut r| r.remove(0)).collect())
    }

    /// Derive the collections for `run` on `run_date` (a formatted date
    /// header, e.g. "Aug 10"). With no date, the date cells are left empty;
    /// that mode serves callers that only need the stop list.
    pub fn collections(
        &self,
        group: &RunGroup,
        run: &Run,
        run_date: Option<&str>,
    ) -> Result<Vec<Collection>, EngineError> {
        if run.bounds.row_count == 0 {
            return Ok(Vec::new());
        }

        let customers = self.column(group, run, "customer")?;
        let types = self.column(group, run, "type")?;
        let quantities = self.column(group, run, "quantity")?;
        let containers = self.column(group, run, "container")?;
        let addresses = self.column(group, run, "address")?;
        let notes = self.column(group, run, "notes")?;

        let date_values = match run_date {
            None => None,
            Some(date_header) => {
                // Formatted headers resolve as a span offset; anything else
                // falls back to the (cached) full-sheet scan.
                let col = match group.date_column(date_header) {
                    Some(col) => Some(col),
                    None => RangeLocator::new(self.store, self.cache)
                        .locate_column(&group.sheet_name, date_header)?,
                };
                let col = col.ok_or_else(|| ConfigError::UnknownDateHeader {
                    sheet: group.sheet_name.clone(),
                    header: date_header.to_string(),
                })?;
                let rows = self.store.read_cells(
                    &group.sheet_name,
                    run.bounds.start_row_index,
                    col,
                    run.bounds.row_count,
                    1,
                )?;
                Some(
                    rows.into_iter()
                        .map(|mut r| r.remove(0))
                        .collect::<Vec<_>>(),
                )
            }
        };

        let mut collections = Vec::new();

        for i in 0..run.bounds.row_count as usize {
            let row_cells = [
                customers[i].clone(),
                types[i].clone(),
                quantities[i].clone(),
                containers[i].clone(),
                addresses[i].clone(),
                notes[i].clone(),
            ];

            match classify_row(&row_cells) {
                RowClass::Terminal => break,
                RowClass::Hijacked => {
                    debug!(
                        run = %run.name,
                        row = run.bounds.start_row_index + i as u32,
                        "skipping repurposed row"
                    );
                    continue;
                }
                RowClass::Stop => {}
            }

            let quantity = Quantity::from_cell(&quantities[i]);
            let container =
                self.containers
                    .container(self.cache, &containers[i].display(), quantity)?;

            let date_value = date_values
                .as_ref()
                .map(|values| values[i].clone())
                .unwrap_or(CellValue::Empty);
            let date_display = date_value.display();
            let date_flag = if self.date_flags.iter().any(|f| *f == date_display) {
                date_display.clone()
            } else {
                String::new()
            };

            let cancelled = date_display == STATUS_CANCELLED;
            let on_hold = date_display == STATUS_ON_HOLD;
            let pending = date_display == STATUS_PENDING;
            let type_code = types[i].display();

            collections.push(Collection {
                run_name: run.name.clone(),
                run_date: run_date.map(String::from),
                customer_name: customers[i].display(),
                address: addresses[i].display(),
                notes: notes[i].display(),
                type_definition: self
                    .config
                    .expand_abbreviation(&type_code)
                    .map(String::from),
                type_code,
                date_value,
                date_flag,
                container,
                cancelled,
                on_hold,
                pending,
                collect: !(cancelled || on_hold || pending),
            });
        }

        Ok(collections)
    }
}

/// Rendering of the combined volume/date-flag option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionListFormat {
    /// Grouped options for a form UI: amounts, then date flags.
    Grouped,
    /// Flat comma-joined value list for grid data-validation criteria.
    CriteriaList,
}

impl OptionListFormat {
    fn key_fragment(self) -> &'static str {
        match self {
            OptionListFormat::Grouped => "grouped",
            OptionListFormat::CriteriaList => "criteria",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub label: String,
    pub options: Vec<VolumeOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum VolumesAndDateFlags {
    Grouped { groups: Vec<OptionGroup> },
    CriteriaList { list: String },
}

/// The volume options and date flags for one container, in the requested
/// rendering. Not unique per collection, so cached per
/// `(type, quantity, format)`.
pub fn volumes_and_date_flags(
    cache: &DocumentCache,
    container: &Container,
    date_flags: &[String],
    format: OptionListFormat,
) -> Result<VolumesAndDateFlags, EngineError> {
    let key = format!(
        "collection-volumes-and-date-flags-{}-{}-{}",
        container.container_type,
        container.quantity,
        format.key_fragment()
    );

    if let Some(cached) = cache.get_item::<VolumesAndDateFlags>(&key, false) {
        let matches = matches!(
            (&cached, format),
            (VolumesAndDateFlags::Grouped { .. }, OptionListFormat::Grouped)
                | (
                    VolumesAndDateFlags::CriteriaList { .. },
                    OptionListFormat::CriteriaList
                )
        );
        if matches {
            return Ok(cached);
        }
    }

    let result = match format {
        OptionListFormat::Grouped => VolumesAndDateFlags::Grouped {
            groups: vec![
                OptionGroup {
                    label: "Amount".to_string(),
                    options: container.volumes.clone(),
                },
                OptionGroup {
                    label: "Date flags".to_string(),
                    options: date_flags
                        .iter()
                        .map(|f| VolumeOption {
                            label: f.clone(),
                            value: CellValue::Text(f.clone()),
                        })
                        .collect(),
                },
            ],
        },
        OptionListFormat::CriteriaList => {
            // Skip the "please select" sentinel; a divider separates amounts
            // from flags in the grid dropdown.
            let mut parts: Vec<String> = container
                .volumes
                .iter()
                .skip(1)
                .map(|o| o.value.display())
                .collect();
            parts.push("------".to_string());
            parts.extend(date_flags.iter().cloned());
            VolumesAndDateFlags::CriteriaList {
                list: parts.join(","),
            }
        }
    };

    cache.set_item(&key, &result, false)?;
    Ok(result)
}
