//! Translation of a metric table's node key between representations.
//!
//! The translation is a pure relabeling join through the tree table: every
//! row present under the old key is present exactly once under the new key.
//! A source key the tree table does not cover, or two tree rows colliding on
//! the same source representation, would break that guarantee and is
//! rejected.

use super::{KeyKind, MetricRow, MetricTable, NodeKey};
use crate::calltree::{short_callpath, TreeRow, TreeTable};
use crate::utils::error::TableError;
use log::debug;
use std::collections::HashMap;

/// Convert the node key of `table` to the `target` representation.
///
/// Returns the input unchanged when the key is already in the target
/// representation; this short-circuit needs no tree table.
///
/// # Errors
/// * `TableError::LookupRequired` - a conversion is needed but no tree table
///   was supplied
/// * `TableError::MissingFullPaths` - full callpaths are involved but the
///   tree table was built without them
/// * `TableError::DuplicateKey` - two tree rows collide on one source value
/// * `TableError::MissingLookupEntry` - a row key the tree table lacks
pub fn convert_index(
    table: &MetricTable,
    tree: Option<&TreeTable>,
    target: KeyKind,
) -> Result<MetricTable, TableError> {
    let source = table.key();
    if source == target {
        return Ok(table.clone());
    }
    let tree = tree.ok_or(TableError::LookupRequired {
        from: source,
        to: target,
    })?;

    let mut mapping: HashMap<NodeKey, NodeKey> = HashMap::with_capacity(tree.rows.len());
    for row in &tree.rows {
        let from = representation(row, source)?;
        let to = representation(row, target)?;
        if mapping.insert(from.clone(), to).is_some() {
            return Err(TableError::DuplicateKey {
                kind: source,
                value: from.to_string(),
            });
        }
    }

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let key = mapping
                .get(&row.key)
                .cloned()
                .ok_or_else(|| TableError::MissingLookupEntry(row.key.to_string()))?;
            Ok(MetricRow {
                key,
                thread: row.thread,
                values: row.values.clone(),
            })
        })
        .collect::<Result<Vec<_>, TableError>>()?;

    debug!(
        "relabeled {} rows from {} to {}",
        rows.len(),
        source,
        target
    );
    MetricTable::new(target, table.columns().to_vec(), rows)
}

/// A tree row's key under one representation. The short callpath is derived
/// on demand; full callpaths must have been materialized at table build time.
fn representation(row: &TreeRow, kind: KeyKind) -> Result<NodeKey, TableError> {
    match kind {
        KeyKind::CnodeId => Ok(NodeKey::Id(row.cnode_id)),
        KeyKind::ShortCallpath => Ok(NodeKey::Path(
            row.short_callpath
                .clone()
                .unwrap_or_else(|| short_callpath(&row.function_name, row.cnode_id)),
        )),
        KeyKind::FullCallpath => row
            .full_callpath
            .clone()
            .map(NodeKey::Path)
            .ok_or(TableError::MissingFullPaths),
    }
}
