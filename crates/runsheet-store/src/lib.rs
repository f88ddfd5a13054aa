//! External-interface layer of the Runsheet engine.
//!
//! The host spreadsheet and its property store are collaborators, not part of
//! this codebase; they appear here as the [`RangeStore`] and
//! [`KeyValueStore`] traits. The [`DocumentCache`] builds the namespaced,
//! size-limited memoization layer on top of any `KeyValueStore`, and the
//! `memory` module provides deterministic in-memory backends for tests and
//! embedders.

pub mod cache;
pub mod error;
pub mod memory;
pub mod rule;
pub mod traits;

pub use cache::{DocumentCache, VALUE_CEILING_BYTES};
pub use error::{CacheError, StoreError};
pub use memory::{MemoryPropertyStore, MemorySheetStore, SheetFixture};
pub use rule::{Criteria, ValidationRule};
pub use traits::{CellRef, KeyValueStore, NamedRange, RangeRef, RangeStore};
