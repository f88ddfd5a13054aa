//! Run/collection derivation and caching engine.
//!
//! This crate turns a loosely structured, human-edited run sheet into typed
//! records: it locates run blocks by header/footer text, computes row
//! bounds, derives per-date collection stops with their container volume
//! options, and memoizes every expensive scan in the document cache. The
//! [`Engine`] is the composition root; the individual catalogs and
//! derivers are public for embedders that want finer-grained wiring.

pub mod classify;
pub mod collection;
pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod group;
pub mod locate;
pub mod run;
pub mod validation;
pub mod writeback;

pub use classify::{RowClass, classify_row};
pub use collection::{
    Collection, CollectionDeriver, OptionGroup, OptionListFormat, VolumesAndDateFlags,
    volumes_and_date_flags,
};
pub use config::{Abbreviation, AppConfig, CONFIG_CACHE_KEY, NamedRangeItem};
pub use container::{Container, ContainerCatalog, VolumeOption, normalize_type};
pub use engine::Engine;
pub use error::{ConfigError, EngineError};
pub use group::{
    CatalogSnapshot, ColumnSpan, RunDate, RunGroup, RunGroupCatalog, SNAPSHOT_CACHE_KEY,
};
pub use locate::RangeLocator;
pub use run::{Run, RunBounds, RunLocator};
pub use validation::{
    ValidationRefresher, ValidationReport, Verdict, evaluate, evaluate_value, validate_range,
    verdict_message,
};
pub use writeback::{FormField, FormWriter, RunFormSubmission, WriteReport};

// Re-export the leaf types embedders handle directly.
pub use runsheet_common::{CellValue, Quantity};
pub use runsheet_store::{
    Criteria, DocumentCache, KeyValueStore, RangeRef, RangeStore, ValidationRule,
};
