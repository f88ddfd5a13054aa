//! Umbrella crate: one dependency pulling in the whole Runsheet engine.
//!
//! ```no_run
//! use std::sync::Arc;
//! use runsheet::{AppConfig, Engine, MemoryPropertyStore, MemorySheetStore};
//!
//! # fn main() -> Result<(), runsheet::EngineError> {
//! let config = AppConfig::from_json_file("runsheet.json")?;
//! let engine = Engine::new(
//!     Arc::new(MemorySheetStore::new()),
//!     Arc::new(MemoryPropertyStore::default()),
//!     config,
//! )?;
//! let collections = engine.collections("MT VIC RUN", Some("Aug 10"))?;
//! # let _ = collections;
//! # Ok(())
//! # }
//! ```

pub use runsheet_common::{
    CellValue, ContractError, Quantity, ValueKind, fraction_to_value, parse_fraction, string_to_id,
};
pub use runsheet_core::{
    Abbreviation, AppConfig, CatalogSnapshot, Collection, CollectionDeriver, ColumnSpan,
    ConfigError, Container, ContainerCatalog, Engine, EngineError, FormField, FormWriter,
    NamedRangeItem, OptionGroup, OptionListFormat, RangeLocator, RowClass, Run, RunBounds,
    RunDate, RunFormSubmission, RunGroup, RunGroupCatalog, RunLocator, ValidationRefresher,
    ValidationReport, Verdict, VolumeOption, VolumesAndDateFlags, WriteReport, classify_row,
    evaluate, evaluate_value, validate_range, volumes_and_date_flags,
};
pub use runsheet_store::{
    CacheError, CellRef, Criteria, DocumentCache, KeyValueStore, MemoryPropertyStore,
    MemorySheetStore, NamedRange, RangeRef, RangeStore, SheetFixture, StoreError, ValidationRule,
};
