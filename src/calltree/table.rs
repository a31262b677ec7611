//! Tabular projection of a call tree.
//!
//! The tree table is the lookup that links the three node-key
//! representations: cnode id, short callpath and full callpath. Index
//! translation of metric tables goes through it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The short callpath of a node: short name and cnode id, comma-separated.
/// Human-readable but still unique, since the id is unique.
pub fn short_callpath(name: &str, cnode_id: u64) -> String {
    format!("{name},{cnode_id}")
}

/// One row of the tree table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRow {
    #[serde(rename = "Function Name")]
    pub function_name: String,

    #[serde(rename = "Cnode ID")]
    pub cnode_id: u64,

    /// `None` marks the root
    #[serde(rename = "Parent Cnode ID")]
    pub parent_cnode_id: Option<u64>,

    #[serde(rename = "Full Callpath", skip_serializing_if = "Option::is_none")]
    pub full_callpath: Option<String>,

    #[serde(rename = "Short Callpath", skip_serializing_if = "Option::is_none")]
    pub short_callpath: Option<String>,
}

/// Tabular representation of a call tree, one row per node in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeTable {
    pub rows: Vec<TreeRow>,
}

impl TreeTable {
    /// Whether the rows carry full callpaths.
    pub fn has_full_paths(&self) -> bool {
        self.rows.iter().all(|row| row.full_callpath.is_some())
    }

    /// Map each cnode id to its parent's id, `None` for the root.
    pub fn parent_map(&self) -> HashMap<u64, Option<u64>> {
        self.rows
            .iter()
            .map(|row| (row.cnode_id, row.parent_cnode_id))
            .collect()
    }

    /// Look up a row by cnode id.
    pub fn row_by_id(&self, cnode_id: u64) -> Option<&TreeRow> {
        self.rows.iter().find(|row| row.cnode_id == cnode_id)
    }
}
