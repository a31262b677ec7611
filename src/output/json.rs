//! JSON report writer.
//!
//! Reports are versioned and timestamped so downstream tooling can check
//! compatibility and provenance.

use crate::calltree::TreeTable;
use crate::table::{MetricColumn, MetricRow, MetricTable};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Tree table export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Profile file the tree came from
    pub profile_file: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    pub tree: TreeTable,
}

impl TreeReport {
    pub fn new(profile_file: impl Into<String>, tree: TreeTable) -> Self {
        TreeReport {
            version: SCHEMA_VERSION.to_string(),
            profile_file: profile_file.into(),
            generated_at: Utc::now().to_rfc3339(),
            tree,
        }
    }
}

/// Metric table export, exclusive or aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    pub version: String,
    pub profile_file: String,
    pub generated_at: String,

    /// Whether the values were aggregated to inclusive by this tool
    pub aggregated: bool,

    pub columns: Vec<MetricColumn>,
    pub rows: Vec<MetricRow>,
}

impl MetricReport {
    pub fn new(profile_file: impl Into<String>, table: &MetricTable, aggregated: bool) -> Self {
        MetricReport {
            version: SCHEMA_VERSION.to_string(),
            profile_file: profile_file.into(),
            generated_at: Utc::now().to_rfc3339(),
            aggregated,
            columns: table.columns().to_vec(),
            rows: table.rows().to_vec(),
        }
    }
}

/// Write any serializable report to a JSON file, pretty-printed.
///
/// Parent directories are created as needed.
///
/// # Errors
/// * `OutputError::InvalidPath` - empty path or existing directory
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
pub fn write_json<T: Serialize>(value: &T, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("writing report to {}", output_path.display());
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value).map_err(OutputError::SerializationFailed)?;
    Ok(())
}

/// Validate that the output path is usable before touching the filesystem.
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }
    Ok(())
}
