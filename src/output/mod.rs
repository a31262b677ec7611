//! Output writers for tree tables and metric reports.

pub mod json;

pub use json::{write_json, MetricReport, TreeReport};
