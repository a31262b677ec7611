//! Tabular metric data and its index representations.
//!
//! A [`MetricTable`] holds per-(node, thread) numeric measurements with one
//! column per metric, optionally tagged with a run id when several profiling
//! runs are merged. All rows of one table share the same node-key
//! representation; translation between representations is in [`index`].

pub mod index;

pub use index::convert_index;

use crate::utils::config::{COL_CNODE_ID, COL_FULL_CALLPATH, COL_SHORT_CALLPATH};
use crate::utils::error::TableError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The three interchangeable node-key representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    CnodeId,
    ShortCallpath,
    FullCallpath,
}

impl KeyKind {
    /// All representations, in the order they are probed when identifying
    /// the key column of loaded data.
    pub const ALL: [KeyKind; 3] = [
        KeyKind::ShortCallpath,
        KeyKind::FullCallpath,
        KeyKind::CnodeId,
    ];

    /// The canonical column name of this representation.
    pub fn column_name(self) -> &'static str {
        match self {
            KeyKind::CnodeId => COL_CNODE_ID,
            KeyKind::ShortCallpath => COL_SHORT_CALLPATH,
            KeyKind::FullCallpath => COL_FULL_CALLPATH,
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.column_name() == name)
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A node key under one of the three representations. Numeric for cnode
/// ids, textual for callpaths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Id(u64),
    Path(String),
}

impl NodeKey {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            NodeKey::Id(id) => Some(*id),
            NodeKey::Path(_) => None,
        }
    }

    fn matches(&self, kind: KeyKind) -> bool {
        matches!(
            (self, kind),
            (NodeKey::Id(_), KeyKind::CnodeId)
                | (NodeKey::Path(_), KeyKind::ShortCallpath)
                | (NodeKey::Path(_), KeyKind::FullCallpath)
        )
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Id(id) => write!(f, "{id}"),
            NodeKey::Path(path) => f.write_str(path),
        }
    }
}

/// One metric column, optionally tagged with the run it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricColumn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<u32>,
    pub metric: String,
}

impl MetricColumn {
    pub fn plain(metric: impl Into<String>) -> Self {
        MetricColumn {
            run: None,
            metric: metric.into(),
        }
    }
}

/// One row of measurements for a (node, thread) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub key: NodeKey,
    pub thread: u32,
    pub values: Vec<f64>,
}

/// A tabular dataset of numeric measurements keyed by (node, thread).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    key: KeyKind,
    columns: Vec<MetricColumn>,
    rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Assemble a table, validating that every row key matches the declared
    /// representation and that every row is as wide as the column list.
    pub fn new(
        key: KeyKind,
        columns: Vec<MetricColumn>,
        rows: Vec<MetricRow>,
    ) -> Result<Self, TableError> {
        for (index, row) in rows.iter().enumerate() {
            if !row.key.matches(key) {
                return Err(TableError::KeyKindMismatch {
                    key: row.key.to_string(),
                    kind: key,
                });
            }
            if row.values.len() != columns.len() {
                return Err(TableError::RowWidth {
                    index,
                    got: row.values.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(MetricTable { key, columns, rows })
    }

    pub fn key(&self) -> KeyKind {
        self.key
    }

    pub fn columns(&self) -> &[MetricColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    /// The distinct metric names, in column order.
    pub fn metric_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .filter(|column| seen.insert(column.metric.as_str()))
            .map(|column| column.metric.as_str())
            .collect()
    }

    /// Position of a column, by run tag and metric name.
    pub fn column_position(&self, run: Option<u32>, metric: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.run == run && column.metric == metric)
    }

    /// Restrict the table to the metric columns present in `allowed`.
    ///
    /// Used to keep only inclusive-convertible metrics before aggregation;
    /// metrics in `allowed` but absent from the table are ignored.
    pub fn select_metrics(&self, allowed: &HashSet<String>) -> MetricTable {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| allowed.contains(&column.metric))
            .map(|(i, _)| i)
            .collect();
        MetricTable {
            key: self.key,
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| MetricRow {
                    key: row.key.clone(),
                    thread: row.thread,
                    values: keep.iter().map(|&i| row.values[i]).collect(),
                })
                .collect(),
        }
    }
}

/// Identify which of the three key representations a set of column names
/// carries.
///
/// Exactly one candidate must be present: zero means the data has no usable
/// key, more than one means the caller must disambiguate first.
pub fn identify_key_column(names: &[&str]) -> Result<(KeyKind, usize), TableError> {
    let hits: Vec<(KeyKind, usize)> = KeyKind::ALL
        .into_iter()
        .filter_map(|kind| {
            names
                .iter()
                .position(|&name| name == kind.column_name())
                .map(|position| (kind, position))
        })
        .collect();
    match hits.as_slice() {
        [single] => Ok(*single),
        [] => Err(TableError::MissingKey(
            names.iter().map(|s| s.to_string()).collect(),
        )),
        many => Err(TableError::AmbiguousKey(
            many.iter().map(|(kind, _)| kind.to_string()).collect(),
        )),
    }
}
