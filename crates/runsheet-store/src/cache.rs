//! Namespaced memoization layer over a [`KeyValueStore`].
//!
//! The property store behind the trait is tiny: roughly 9KB per value and
//! 500KB aggregate. Derived values are therefore grouped into JSON "buckets"
//! stored one property each: the default bucket `_cache` holds most keys,
//! and a key can opt into its own bucket `_cache_<key>` when its payload
//! risks crowding out everything else (the own-bucket pattern; configuration
//! uses it).
//!
//! Cache entries are derived and idempotent (recomputing yields the same
//! value), so a corrupt or stale entry is treated as a miss, never an error.

use crate::error::CacheError;
use crate::traits::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-property size ceiling imposed by the host property store.
pub const VALUE_CEILING_BYTES: usize = 9 * 1024;

const BUCKET_PREFIX: &str = "_cache";

/// Get/set/delete over namespaced JSON buckets in a key-value store.
#[derive(Clone)]
pub struct DocumentCache {
    store: Arc<dyn KeyValueStore>,
}

impl DocumentCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn bucket_name(key: &str, own_bucket: bool) -> String {
        if own_bucket {
            format!("{BUCKET_PREFIX}_{key}")
        } else {
            BUCKET_PREFIX.to_string()
        }
    }

    fn read_bucket(&self, bucket: &str) -> Map<String, Value> {
        match self.store.get(bucket) {
            None => Map::new(),
            Some(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => map,
                Err(err) => {
                    warn!(%bucket, %err, "cache bucket is malformed, treating as empty");
                    Map::new()
                }
            },
        }
    }

    /// Fetch a cached value. A missing key, a missing bucket, or an entry
    /// that no longer decodes into `T` all read as a miss.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str, own_bucket: bool) -> Option<T> {
        let bucket = Self::bucket_name(key, own_bucket);
        let map = self.read_bucket(&bucket);
        let raw = match map.get(key) {
            Some(raw) => raw,
            None => {
                debug!(%bucket, key, "cache miss");
                return None;
            }
        };

        match serde_json::from_value::<T>(raw.clone()) {
            Ok(value) => {
                debug!(%bucket, key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(%bucket, key, %err, "cache entry failed to decode, treating as miss");
                None
            }
        }
    }

    /// Store a value. Fails with [`CacheError::ValueTooLarge`] (leaving the
    /// bucket untouched) when the updated bucket would exceed the property
    /// ceiling; the caller should re-try with `own_bucket = true`.
    pub fn set_item<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        own_bucket: bool,
    ) -> Result<(), CacheError> {
        let bucket = Self::bucket_name(key, own_bucket);
        let mut map = self.read_bucket(&bucket);

        let encoded = serde_json::to_value(value).map_err(|source| CacheError::Serialize {
            key: key.to_string(),
            source,
        })?;
        map.insert(key.to_string(), encoded);

        let serialized = Value::Object(map).to_string();
        if serialized.len() > VALUE_CEILING_BYTES {
            return Err(CacheError::ValueTooLarge {
                bucket,
                size: serialized.len(),
                ceiling: VALUE_CEILING_BYTES,
            });
        }

        debug!(%bucket, key, bytes = serialized.len(), "cache store");
        self.store.set(&bucket, serialized);
        Ok(())
    }

    /// Delete one key from its bucket.
    pub fn delete_item(&self, key: &str, own_bucket: bool) {
        let bucket = Self::bucket_name(key, own_bucket);
        let mut map = self.read_bucket(&bucket);
        if map.remove(key).is_some() {
            self.store.set(&bucket, Value::Object(map).to_string());
        }
    }

    /// Drop the default bucket, leaving own buckets (such as the cached
    /// configuration) in place. Returns the deleted bucket names.
    pub fn clear_default(&self) -> Vec<String> {
        self.clear_matching(|name| name == BUCKET_PREFIX)
    }

    /// Drop one own bucket.
    pub fn clear_bucket(&self, key: &str) -> Vec<String> {
        let target = Self::bucket_name(key, true);
        self.clear_matching(|name| name == target)
    }

    /// Drop every cache bucket, own buckets included.
    pub fn clear_all(&self) -> Vec<String> {
        self.clear_matching(|name| name.starts_with(BUCKET_PREFIX))
    }

    fn clear_matching(&self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        let mut deleted: Vec<String> = self
            .store
            .keys()
            .into_iter()
            .filter(|name| keep(name))
            .collect();
        for name in &deleted {
            self.store.delete(name);
        }
        deleted.sort();
        debug!(?deleted, "cache clear");
        deleted
    }

    /// Sorted dump of every bucket and entry, for diagnostics.
    pub fn dump(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        for name in self.store.keys() {
            if !name.starts_with(BUCKET_PREFIX) {
                continue;
            }
            let entries: BTreeMap<String, Value> =
                self.read_bucket(&name).into_iter().collect();
            out.insert(name, entries);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPropertyStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Bounds {
        start: u32,
        count: u32,
    }

    fn cache() -> DocumentCache {
        DocumentCache::new(Arc::new(MemoryPropertyStore::default()))
    }

    #[test]
    fn round_trips_through_default_bucket() {
        let cache = cache();
        let bounds = Bounds {
            start: 24,
            count: 17,
        };
        cache.set_item("run-mt-vic-run", &bounds, false).unwrap();
        assert_eq!(
            cache.get_item::<Bounds>("run-mt-vic-run", false),
            Some(bounds)
        );
    }

    #[test]
    fn miss_on_absent_key_and_on_shape_mismatch() {
        let cache = cache();
        assert_eq!(cache.get_item::<Bounds>("absent", false), None);

        cache.set_item("key", &"just a string", false).unwrap();
        assert_eq!(cache.get_item::<Bounds>("key", false), None);
    }

    #[test]
    fn own_bucket_is_isolated_from_default_clear() {
        let cache = cache();
        cache.set_item("config", &1u32, true).unwrap();
        cache.set_item("other", &2u32, false).unwrap();

        let deleted = cache.clear_default();
        assert_eq!(deleted, vec!["_cache".to_string()]);
        assert_eq!(cache.get_item::<u32>("other", false), None);
        assert_eq!(cache.get_item::<u32>("config", true), Some(1));

        let deleted = cache.clear_all();
        assert_eq!(deleted, vec!["_cache_config".to_string()]);
        assert_eq!(cache.get_item::<u32>("config", true), None);
    }

    #[test]
    fn oversize_bucket_is_rejected_without_writing() {
        let cache = cache();
        cache.set_item("small", &1u32, false).unwrap();

        let big = "x".repeat(VALUE_CEILING_BYTES);
        let err = cache.set_item("big", &big, false).unwrap_err();
        assert!(matches!(err, CacheError::ValueTooLarge { .. }));

        // prior content survives the failed write
        assert_eq!(cache.get_item::<u32>("small", false), Some(1));
        assert_eq!(cache.get_item::<String>("big", false), None);
    }

    #[test]
    fn dump_is_sorted_by_bucket_then_key() {
        let cache = cache();
        cache.set_item("b", &2u32, false).unwrap();
        cache.set_item("a", &1u32, false).unwrap();
        cache.set_item("config", &3u32, true).unwrap();

        let dump = cache.dump();
        let buckets: Vec<&String> = dump.keys().collect();
        assert_eq!(buckets, ["_cache", "_cache_config"]);
        let entries: Vec<&String> = dump["_cache"].keys().collect();
        assert_eq!(entries, ["a", "b"]);
    }
}
