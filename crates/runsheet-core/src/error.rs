use runsheet_common::ContractError;
use runsheet_store::{CacheError, StoreError};
use thiserror::Error;

/// A setup defect: the document or configuration disagrees with what the
/// engine was told to expect. Fatal and never retried: the engine refuses to
/// run against a malformed sheet rather than guess.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("spreadsheet does not contain the named range \"{0}\"")]
    MissingNamedRange(String),

    #[error("no run group for run \"{0}\"")]
    UnknownRunName(String),

    #[error("sheet \"{0}\" does not hold a run group")]
    UnknownSheet(String),

    #[error("run header \"{name}\" was not found in sheet \"{sheet}\"")]
    MissingRunHeader { sheet: String, name: String },

    #[error("footer \"{footer}\" was not found in sheet \"{sheet}\"")]
    MissingFooter { sheet: String, footer: String },

    #[error("date header \"{header}\" was not found in sheet \"{sheet}\"")]
    UnknownDateHeader { sheet: String, header: String },

    #[error("run group \"{sheet}\" has no \"{column}\" column")]
    MissingColumn { sheet: String, column: String },

    #[error("container type \"{0}\" is not in the configured container types")]
    UnknownContainerType(String),

    #[error("no capacity is configured for container type \"{0}\"")]
    MissingCapacity(String),

    #[error("container volume fraction \"{0}\" is malformed")]
    InvalidVolumeFraction(String),

    #[error("named range values failed validation:\n{}", .0.join("\n"))]
    InvalidNamedRangeValues(Vec<String>),

    #[error("could not read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("form submission does not match the sheet: {0}")]
    FormMismatch(String),
}
