//! Export (§6): JSON and CSV serialization of a completed run.

pub mod csv;
pub mod json;

pub use csv::{CsvExporter, CsvFieldSet};
pub use json::JsonExporter;
