//! Container vocabulary and volume-option derivation.
//!
//! A container is a `(type, quantity)` pair; its dropdown options are pure
//! arithmetic over the configured capacities and fill fractions, so the
//! result is memoized per pair, in-process and in the document cache, and
//! shared by every collection on any run that uses the same pair.

use crate::error::{ConfigError, EngineError};
use parking_lot::RwLock;
use runsheet_common::{CellValue, Quantity, fraction};
use runsheet_store::DocumentCache;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One entry in the volume dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeOption {
    pub label: String,
    pub value: CellValue,
}

impl VolumeOption {
    fn new(label: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Normalized type: whitespace stripped, lower-cased.
    pub container_type: String,
    pub quantity: Quantity,
    /// Liters per container of this type. Zero for checklist stops.
    pub capacity: f64,
    pub volumes: Vec<VolumeOption>,
}

impl Container {
    pub fn cache_key(container_type: &str, quantity: Quantity) -> String {
        format!("container-{container_type}-{quantity}")
    }
}

/// Strip whitespace and lower-case, so "Wheelie Bin" and "wheeliebin" key the
/// same container.
pub fn normalize_type(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Derives and memoizes [`Container`]s from the sheet-level configuration
/// ranges (capacities, types, non-volume statuses) and the configured fill
/// fractions.
pub struct ContainerCatalog {
    capacities: Vec<f64>,
    types: Vec<String>,
    non_volumes: Vec<String>,
    volume_fractions: Vec<String>,
    memo: RwLock<FxHashMap<(String, Quantity), Arc<Container>>>,
}

impl ContainerCatalog {
    pub fn new(
        capacities: Vec<f64>,
        types: Vec<String>,
        non_volumes: Vec<String>,
        volume_fractions: Vec<String>,
    ) -> Self {
        Self {
            capacities,
            types,
            non_volumes,
            volume_fractions,
            memo: RwLock::new(FxHashMap::default()),
        }
    }

    /// Fetch or build the container for a raw type string and quantity.
    pub fn container(
        &self,
        cache: &DocumentCache,
        raw_type: &str,
        quantity: Quantity,
    ) -> Result<Arc<Container>, EngineError> {
        let container_type = normalize_type(raw_type);
        let memo_key = (container_type.clone(), quantity);

        if let Some(hit) = self.memo.read().get(&memo_key) {
            return Ok(Arc::clone(hit));
        }

        let cache_key = Container::cache_key(&container_type, quantity);
        if let Some(cached) = cache.get_item::<Container>(&cache_key, false) {
            let container = Arc::new(cached);
            self.memo.write().insert(memo_key, Arc::clone(&container));
            return Ok(container);
        }

        debug!(%container_type, %quantity, "deriving container volumes");
        let capacity = self.capacity_of(&container_type)?;
        let volumes = self.volumes(quantity, capacity)?;
        let container = Arc::new(Container {
            container_type,
            quantity,
            capacity,
            volumes,
        });

        cache.set_item(&cache_key, container.as_ref(), false)?;
        self.memo.write().insert(memo_key, Arc::clone(&container));
        Ok(container)
    }

    /// Capacity lookup, case-insensitive over the configured types. An empty
    /// type (checklist stops) has no capacity; an unknown non-empty type is a
    /// configuration defect.
    fn capacity_of(&self, normalized_type: &str) -> Result<f64, ConfigError> {
        if normalized_type.is_empty() {
            return Ok(0.0);
        }
        let index = self
            .types
            .iter()
            .position(|t| normalize_type(t) == normalized_type)
            .ok_or_else(|| ConfigError::UnknownContainerType(normalized_type.to_string()))?;
        self.capacities
            .get(index)
            .copied()
            .ok_or_else(|| ConfigError::MissingCapacity(normalized_type.to_string()))
    }

    /// The ordered dropdown options for `quantity` containers of `capacity`
    /// liters each.
    fn volumes(&self, quantity: Quantity, capacity: f64) -> Result<Vec<VolumeOption>, ConfigError> {
        let mut options = vec![
            VolumeOption::new("Select compost amount", CellValue::Empty),
            VolumeOption::new("Empty", 0i64),
            VolumeOption::new("Almost empty", 1i64),
        ];

        let count = quantity.count();
        for container_index in 0..count {
            for fraction_str in &self.volume_fractions {
                let fraction_number = fraction::parse_fraction(fraction_str)
                    .ok_or_else(|| ConfigError::InvalidVolumeFraction(fraction_str.clone()))?;
                let value = fraction::fraction_to_value(fraction_str, container_index, capacity)
                    .ok_or_else(|| ConfigError::InvalidVolumeFraction(fraction_str.clone()))?;

                if fraction_number <= 1.0 {
                    let label =
                        volume_label(count, container_index, fraction_str, fraction_number);
                    options.push(VolumeOption::new(
                        format!("{label} ({value}L)"),
                        CellValue::Text(value),
                    ));
                } else if container_index + 1 == count {
                    // The overfull sentinel fraction only applies to the last
                    // container slot: it flags that the customer needs one
                    // more container than they have.
                    options.push(VolumeOption::new("Overfull", CellValue::Text(value)));
                }
            }
        }

        for status in &self.non_volumes {
            options.push(VolumeOption::new(
                status.clone(),
                CellValue::Text(status.clone()),
            ));
        }

        Ok(options)
    }

    pub fn non_volumes(&self) -> &[String] {
        &self.non_volumes
    }
}

/// Human label for one fill level of one container slot.
fn volume_label(quantity: u32, container_index: u32, fraction: &str, fraction_number: f64) -> String {
    let is_whole = fraction_number.fract() == 0.0;
    if quantity == 1 {
        if is_whole {
            "Full".to_string()
        } else {
            format!("{fraction} full")
        }
    } else if container_index == 0 {
        if is_whole {
            format!("{} full", container_index + 1)
        } else {
            format!("{fraction} full")
        }
    } else if is_whole {
        format!("{} full", container_index + 1)
    } else {
        format!("{container_index} {fraction} full")
    }
}
