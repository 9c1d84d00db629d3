//! Table assembly and delimited text output.

pub mod builder;
pub mod writer;

pub use builder::build_table;
pub use writer::{TableWriter, format_sample};
