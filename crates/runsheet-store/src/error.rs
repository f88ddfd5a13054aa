use thiserror::Error;

/// Failures raised by a range store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sheet \"{0}\" does not exist")]
    MissingSheet(String),

    #[error("range {range} is out of bounds for sheet \"{sheet}\"")]
    OutOfBounds { sheet: String, range: String },

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Failures raised by the document cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Serialized bucket would exceed the per-value ceiling of the property
    /// store. Callers should move the key into its own bucket instead.
    #[error(
        "cache bucket \"{bucket}\" would grow to {size} bytes, above the {ceiling} byte ceiling"
    )]
    ValueTooLarge {
        bucket: String,
        size: usize,
        ceiling: usize,
    },

    #[error("cache entry \"{key}\" could not be serialized: {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}
