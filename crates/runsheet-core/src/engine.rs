//! The composition root.
//!
//! `Engine` owns the store handles, the document cache, and the
//! configuration, and wires the catalogs, deriver, criteria engine, and
//! form writer together by explicit dependency injection. One engine serves
//! one document; every public method is one external interaction
//! (request-per-invocation, no internal concurrency).

use crate::collection::{Collection, CollectionDeriver};
use crate::config::AppConfig;
use crate::container::ContainerCatalog;
use crate::error::{ConfigError, EngineError};
use crate::group::{
    RANGE_CONTAINER_CAPACITIES, RANGE_CONTAINER_TYPES, RANGE_DATE_FLAGS, RANGE_NON_VOLUMES,
    RunGroup, RunGroupCatalog,
};
use crate::locate::RangeLocator;
use crate::run::{Run, RunLocator};
use crate::validation::{ValidationReport, ValidationRefresher, validate_range};
use crate::writeback::{FormWriter, RunFormSubmission, WriteReport};
use once_cell::sync::OnceCell;
use runsheet_common::CellValue;
use runsheet_store::{DocumentCache, KeyValueStore, RangeRef, RangeStore};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub struct Engine {
    store: Arc<dyn RangeStore>,
    cache: DocumentCache,
    config: AppConfig,
    containers: OnceCell<ContainerCatalog>,
}

impl Engine {
    /// Build an engine with an explicit configuration. The configuration is
    /// cached (own bucket) so later sessions can start without it.
    pub fn new(
        store: Arc<dyn RangeStore>,
        properties: Arc<dyn KeyValueStore>,
        config: AppConfig,
    ) -> Result<Self, EngineError> {
        let cache = DocumentCache::new(properties);
        config.store_cached(&cache)?;
        Ok(Self {
            store,
            cache,
            config,
            containers: OnceCell::new(),
        })
    }

    /// Build an engine from the configuration a previous session cached.
    pub fn with_cached_config(
        store: Arc<dyn RangeStore>,
        properties: Arc<dyn KeyValueStore>,
    ) -> Result<Self, EngineError> {
        let cache = DocumentCache::new(properties);
        let config = AppConfig::load_cached(&cache).ok_or_else(|| {
            ConfigError::Invalid("no configuration was provided or cached".to_string())
        })?;
        Ok(Self {
            store,
            cache,
            config,
            containers: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    fn catalog(&self) -> RunGroupCatalog<'_> {
        RunGroupCatalog::new(self.store.as_ref(), &self.cache, &self.config)
    }

    fn containers(&self) -> Result<&ContainerCatalog, EngineError> {
        self.containers.get_or_try_init(|| {
            let snapshot = self.catalog().snapshot()?;
            Ok(ContainerCatalog::new(
                snapshot.number_values(RANGE_CONTAINER_CAPACITIES)?,
                snapshot.string_values(RANGE_CONTAINER_TYPES),
                snapshot.string_values(RANGE_NON_VOLUMES),
                self.config.container_volume_fractions.clone(),
            ))
        })
    }

    fn date_flags(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.catalog().snapshot()?.string_values(RANGE_DATE_FLAGS))
    }

    /// All run groups, from the cached snapshot when fresh.
    pub fn run_groups(&self) -> Result<Vec<RunGroup>, EngineError> {
        self.catalog().build_all()
    }

    /// The group a run belongs to, by membership.
    pub fn group_for_run(&self, run_name: &str) -> Result<RunGroup, EngineError> {
        self.catalog().group_for_run(run_name)
    }

    /// One run with its bounds, from cache or computed.
    pub fn run(&self, run_name: &str) -> Result<Run, EngineError> {
        let group = self.group_for_run(run_name)?;
        RunLocator::new(self.store.as_ref(), &self.cache, &self.config).run(&group, run_name)
    }

    /// The collections for one run on one date (a formatted date header).
    pub fn collections(
        &self,
        run_name: &str,
        run_date: Option<&str>,
    ) -> Result<Vec<Collection>, EngineError> {
        let group = self.group_for_run(run_name)?;
        let run =
            RunLocator::new(self.store.as_ref(), &self.cache, &self.config).run(&group, run_name)?;
        let date_flags = self.date_flags()?;
        let deriver = CollectionDeriver::new(
            self.store.as_ref(),
            &self.cache,
            &self.config,
            self.containers()?,
            &date_flags,
        );
        deriver.collections(&group, &run, run_date)
    }

    /// Current values of one run column, by logical column name or date
    /// header. Used to refresh form state after a save.
    pub fn column_values(
        &self,
        run_name: &str,
        column_header: &str,
    ) -> Result<Vec<CellValue>, EngineError> {
        let group = self.group_for_run(run_name)?;
        let run =
            RunLocator::new(self.store.as_ref(), &self.cache, &self.config).run(&group, run_name)?;

        let col = match group
            .column_index(column_header)
            .or_else(|| group.date_column(column_header))
        {
            Some(col) => col,
            None => RangeLocator::new(self.store.as_ref(), &self.cache)
                .locate_column(&group.sheet_name, column_header)?
                .ok_or_else(|| ConfigError::UnknownDateHeader {
                    sheet: group.sheet_name.clone(),
                    header: column_header.to_string(),
                })?,
        };

        let rows = self.store.read_cells(
            &group.sheet_name,
            run.bounds.start_row_index,
            col,
            run.bounds.row_count,
            1,
        )?;
        Ok(rows.into_iter().map(|mut r| r.remove(0)).collect())
    }

    /// Apply a submitted run form to the sheet. Violations are collected in
    /// the report; valid changed values are written regardless.
    pub fn write_run_form(&self, submission: &RunFormSubmission) -> Result<WriteReport, EngineError> {
        let report = FormWriter::new(self.store.as_ref(), &self.cache, &self.config)
            .write(&self.catalog(), submission)?;
        info!(
            written = report.written,
            warnings = report.warnings.len(),
            "run form applied"
        );
        Ok(report)
    }

    /// Health-check a range's values against its validation rules.
    pub fn validate_range(
        &self,
        range: &RangeRef,
        replacement_values: Option<&[Vec<CellValue>]>,
    ) -> Result<ValidationReport, EngineError> {
        validate_range(self.store.as_ref(), range, replacement_values)
    }

    /// Rebuild date-cell validation for every run row in every group. Drops
    /// the default cache bucket first so the rules are derived from the
    /// live sheet, not stale metadata.
    pub fn refresh_date_validation(&self) -> Result<String, EngineError> {
        self.cache.clear_default();
        let groups = self.run_groups()?;
        let date_flags = self.date_flags()?;
        let refresher = ValidationRefresher::new(
            self.store.as_ref(),
            &self.cache,
            &self.config,
            self.containers()?,
            &date_flags,
        );
        refresher.refresh_all(&groups)
    }

    /// Rebuild date-cell validation for one row of one sheet.
    pub fn refresh_date_validation_row(
        &self,
        sheet_name: &str,
        row_index: u32,
    ) -> Result<String, EngineError> {
        self.cache.clear_default();
        let groups = self.run_groups()?;
        let group = groups
            .iter()
            .find(|g| g.sheet_name == sheet_name)
            .ok_or_else(|| ConfigError::UnknownSheet(sheet_name.to_string()))?;
        let date_flags = self.date_flags()?;
        let refresher = ValidationRefresher::new(
            self.store.as_ref(),
            &self.cache,
            &self.config,
            self.containers()?,
            &date_flags,
        );
        refresher.refresh_row(group, row_index)
    }

    /// React to a cell edit: when a container or quantity cell of a run
    /// sheet changes, that row's date-cell dropdowns are stale and get
    /// rebuilt. Edits anywhere else are ignored (`None`).
    pub fn handle_edited_cell(
        &self,
        sheet_name: &str,
        row: u32,
        col: u32,
    ) -> Result<Option<String>, EngineError> {
        let groups = self.run_groups()?;
        let group = match groups.iter().find(|g| g.sheet_name == sheet_name) {
            Some(group) => group,
            None => return Ok(None),
        };
        if row <= group.column_header_row_index {
            return Ok(None);
        }

        let watched = [group.column_index("container"), group.column_index("quantity")];
        if !watched.contains(&Some(col)) {
            return Ok(None);
        }

        let date_flags = self.date_flags()?;
        let refresher = ValidationRefresher::new(
            self.store.as_ref(),
            &self.cache,
            &self.config,
            self.containers()?,
            &date_flags,
        );
        refresher.refresh_row(group, row).map(Some)
    }

    /// Drop the default cache bucket (derived data), keeping the cached
    /// configuration. Returns the deleted bucket names.
    pub fn clear_cache(&self) -> Vec<String> {
        self.cache.clear_default()
    }

    /// Drop every cache bucket, configuration included.
    pub fn clear_cache_all(&self) -> Vec<String> {
        self.cache.clear_all()
    }

    /// Sorted cache contents, for diagnostics.
    pub fn cache_dump(&self) -> BTreeMap<String, BTreeMap<String, JsonValue>> {
        self.cache.dump()
    }
}
