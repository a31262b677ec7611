//! cubetree
//!
//! Post-processing of CUBE profiling dumps: call-tree reconstruction from
//! the flattened, indentation-encoded `cube_dump -w` listing, tabular
//! reshaping across the three node-key representations (cnode id, short
//! callpath, full callpath), and aggregation of exclusive metrics into
//! inclusive metrics by summing over the tree.
//!
//! This crate provides the core implementation for the `cubetree` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! cubetree tree profile.cubex
//! cubetree inclusive profile.cubex -o inclusive.json
//! ```

pub mod aggregator;
pub mod calltree;
pub mod commands;
pub mod dump;
pub mod merge;
pub mod metrics;
pub mod output;
pub mod parser;
pub mod table;
pub mod utils;
