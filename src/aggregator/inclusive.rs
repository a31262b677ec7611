//! Exclusive-to-inclusive conversion by recursive descent over the call
//! tree.
//!
//! The results are only meaningful for metrics that are INCLUSIVE
//! convertible (see [`crate::metrics`]). The conversion is pure structural
//! summation: applied to a rate, a maximum or a thread count it will happily
//! produce nonsense, and it cannot detect that. Filtering by the
//! convertibility set is the caller's contract.

use crate::calltree::{CallTree, TreeTable};
use crate::table::{convert_index, KeyKind, MetricRow, MetricTable, NodeKey};
use crate::utils::error::TableError;
use log::debug;
use std::collections::HashMap;

/// Convert a per-cnode series of exclusive values to inclusive values.
///
/// For every node `n` of the tree, `out[n] = series[n] + Σ out[c]` over the
/// direct children `c` of `n`, equivalently the sum of the exclusive values
/// over the subtree rooted at `n`. Leaves are unchanged.
///
/// Every node is aggregated independently with no memoization across calls;
/// the repeated subtree walks are O(n²) worst case, acceptable for
/// profiling trees of a few thousand nodes.
///
/// # Errors
/// * `TableError::MissingCnode` - a tree node has no entry in the series
pub fn series_to_inclusive(
    series: &HashMap<u64, f64>,
    tree: &CallTree,
) -> Result<HashMap<u64, f64>, TableError> {
    fn aggregate(
        tree: &CallTree,
        index: usize,
        series: &HashMap<u64, f64>,
    ) -> Result<f64, TableError> {
        let node = tree.node(index);
        let mut value = *series
            .get(&node.cnode_id)
            .ok_or(TableError::MissingCnode(node.cnode_id))?;
        for &child in &node.children {
            value += aggregate(tree, child, series)?;
        }
        Ok(value)
    }

    (0..tree.len())
        .map(|index| {
            let cnode_id = tree.node(index).cnode_id;
            aggregate(tree, index, series).map(|value| (cnode_id, value))
        })
        .collect()
}

/// Convert a whole metric table from exclusive to inclusive values.
///
/// The same recursion as [`series_to_inclusive`], with elementwise row
/// addition across all (thread, metric[, run]) cells instead of scalar
/// addition. Summation order over children follows discovery order:
/// deterministic, but not claimed to minimize floating-point error.
///
/// Tables keyed by short or full callpath are converted to cnode ids first
/// and converted back afterwards, so the output carries the same key
/// representation as the input; `tree_table` is required in that case.
///
/// Output rows are ordered by tree pre-order, then thread id.
///
/// # Errors
/// * any [`convert_index`] error for non-cnode-id keys
/// * `TableError::MissingCnode` / `MissingThread` - a (node, thread) pair
///   the tree implies is absent from the data
/// * `TableError::DuplicateRow` - a (node, thread) pair appears twice
pub fn table_to_inclusive(
    table: &MetricTable,
    tree: &CallTree,
    tree_table: Option<&TreeTable>,
) -> Result<MetricTable, TableError> {
    let original_key = table.key();
    let by_id = convert_index(table, tree_table, KeyKind::CnodeId)?;

    let mut threads: Vec<u32> = by_id.rows().iter().map(|row| row.thread).collect();
    threads.sort_unstable();
    threads.dedup();
    let thread_slot: HashMap<u32, usize> = threads
        .iter()
        .enumerate()
        .map(|(slot, &thread)| (thread, slot))
        .collect();

    // Unstack threads: one wide vector per cnode covering every
    // (thread, column) cell, so child contributions add elementwise.
    let width = threads.len() * by_id.columns().len();
    let ncols = by_id.columns().len();
    let mut wide: HashMap<u64, Vec<Option<f64>>> = HashMap::new();
    for row in by_id.rows() {
        let cnode_id = row.key.as_id().expect("table was converted to cnode ids");
        let slot = thread_slot[&row.thread];
        let cells = wide
            .entry(cnode_id)
            .or_insert_with(|| vec![None; width]);
        for (column, &value) in row.values.iter().enumerate() {
            let cell = &mut cells[slot * ncols + column];
            if cell.is_some() {
                return Err(TableError::DuplicateRow {
                    cnode: cnode_id,
                    thread: row.thread,
                });
            }
            *cell = Some(value);
        }
    }

    fn aggregate(
        tree: &CallTree,
        index: usize,
        wide: &HashMap<u64, Vec<Option<f64>>>,
        threads: &[u32],
        ncols: usize,
    ) -> Result<Vec<f64>, TableError> {
        let node = tree.node(index);
        let cells = wide
            .get(&node.cnode_id)
            .ok_or(TableError::MissingCnode(node.cnode_id))?;
        let mut values: Vec<f64> = cells
            .iter()
            .enumerate()
            .map(|(position, cell)| {
                (*cell).ok_or(TableError::MissingThread {
                    cnode: node.cnode_id,
                    thread: threads[position / ncols],
                })
            })
            .collect::<Result<_, _>>()?;
        for &child in &node.children {
            let child_values = aggregate(tree, child, wide, threads, ncols)?;
            for (value, child_value) in values.iter_mut().zip(child_values) {
                *value += child_value;
            }
        }
        Ok(values)
    }

    let mut rows = Vec::with_capacity(tree.len() * threads.len());
    for index in 0..tree.len() {
        let cnode_id = tree.node(index).cnode_id;
        let values = aggregate(tree, index, &wide, &threads, ncols)?;
        for (slot, &thread) in threads.iter().enumerate() {
            rows.push(MetricRow {
                key: NodeKey::Id(cnode_id),
                thread,
                values: values[slot * ncols..(slot + 1) * ncols].to_vec(),
            });
        }
    }
    debug!(
        "aggregated {} nodes x {} threads x {} columns",
        tree.len(),
        threads.len(),
        ncols
    );

    let result = MetricTable::new(KeyKind::CnodeId, by_id.columns().to_vec(), rows)?;
    convert_index(&result, tree_table, original_key)
}
