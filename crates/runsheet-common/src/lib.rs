//! Shared leaf types for the Runsheet engine: the cell value model, runtime
//! type contracts, and the small string/fraction helpers everything else
//! leans on. This crate performs no I/O.

pub mod contract;
pub mod fraction;
pub mod slug;
pub mod value;

pub use contract::{ContractError, ValueKind};
pub use fraction::{fraction_to_value, parse_fraction};
pub use slug::string_to_id;
pub use value::{CellValue, Quantity};
