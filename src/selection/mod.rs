//! Channel selection: range-list parsing and group resolution.

pub mod range;
pub mod resolver;

pub use range::{RangeSpec, parse_ranges};
pub use resolver::{Selection, SelectionRequest, resolve_selection};
