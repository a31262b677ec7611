//! Merging of metric data from multiple profiling runs.
//!
//! Runs of the same program (e.g. a `scalasca -analyze` sweep) are assumed
//! to produce isomorphic call trees; the first run's tree is taken as
//! canonical. Metrics shared by every run are kept side by side under a
//! (run, metric) column pair, metrics specific to single runs are pooled
//! into a separate flat table.

use crate::calltree::{CallTree, TreeTable};
use crate::dump;
use crate::metrics;
use crate::table::{MetricColumn, MetricRow, MetricTable, NodeKey};
use crate::utils::error::MergeError;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Everything extracted from one profile file.
#[derive(Debug, Clone)]
pub struct ProfileData {
    pub tree: CallTree,
    pub tree_table: TreeTable,
    pub table: MetricTable,
    pub convertible: HashSet<String>,
}

/// The merged view over several profiling runs.
#[derive(Debug, Clone)]
pub struct MultiRunData {
    pub tree: CallTree,
    pub tree_table: TreeTable,
    /// Metrics common to all runs, one (run, metric) column per run
    pub common: MetricTable,
    /// Metrics specific to single runs, flat metric columns
    pub noncommon: MetricTable,
    /// Union of the runs' convertible-metric sets
    pub convertible: HashSet<String>,
}

/// Process a single profile file: call tree, tree table, metric data and
/// convertibility info.
pub fn process_profile(profile: &Path, exclusive: bool) -> Result<ProfileData, MergeError> {
    debug!("reading {}", profile.display());
    let text = dump::dump_text(profile)?;
    let tree = CallTree::from_dump_text(&text)?;
    let tree_table = tree.to_table(true);
    let table = dump::metric_table(profile, exclusive)?;
    let convertible = metrics::convertible_metrics_from_text(&text)?;
    Ok(ProfileData {
        tree,
        tree_table,
        table,
        convertible,
    })
}

/// Process several profile files and merge their metric data.
pub fn process_multi(profiles: &[impl AsRef<Path>], exclusive: bool) -> Result<MultiRunData, MergeError> {
    let runs = profiles
        .iter()
        .map(|profile| process_profile(profile.as_ref(), exclusive))
        .collect::<Result<Vec<_>, _>>()?;
    merge_runs(runs)
}

/// Merge already-processed runs.
///
/// Checked precondition: any two runs' non-common metric sets are disjoint,
/// i.e. any metric shared by two runs is shared by all of them. Rows are
/// inner-joined on (node key, thread id), in the first run's row order.
pub fn merge_runs(runs: Vec<ProfileData>) -> Result<MultiRunData, MergeError> {
    let first = runs.first().ok_or(MergeError::NoInputs)?;
    if runs.iter().any(|run| run.table.key() != first.table.key()) {
        return Err(MergeError::KeyMismatch);
    }

    let column_sets: Vec<HashSet<&str>> = runs
        .iter()
        .map(|run| run.table.metric_names().into_iter().collect())
        .collect();
    let common: HashSet<&str> = column_sets
        .iter()
        .skip(1)
        .fold(column_sets[0].clone(), |acc, set| {
            acc.intersection(set).copied().collect()
        });
    check_column_sets(&column_sets, &common)?;

    // Common metrics in the first run's column order, for determinism
    let common_order: Vec<String> = first
        .table
        .metric_names()
        .into_iter()
        .filter(|name| common.contains(name))
        .map(str::to_string)
        .collect();

    let lookups: Vec<HashMap<(NodeKey, u32), &MetricRow>> =
        runs.iter().map(|run| row_lookup(&run.table)).collect();

    // Inner join: (key, thread) pairs present in every run, in first-run order
    let row_keys: Vec<(NodeKey, u32)> = first
        .table
        .rows()
        .iter()
        .map(|row| (row.key.clone(), row.thread))
        .filter(|entry| lookups.iter().all(|lookup| lookup.contains_key(entry)))
        .collect();

    // Common table: per run, one column per common metric
    let mut common_columns = Vec::new();
    for (run_index, _) in runs.iter().enumerate() {
        for name in &common_order {
            common_columns.push(MetricColumn {
                run: Some(run_index as u32),
                metric: name.clone(),
            });
        }
    }
    let common_rows = row_keys
        .iter()
        .map(|(key, thread)| {
            let mut values = Vec::with_capacity(common_columns.len());
            for (run_index, run) in runs.iter().enumerate() {
                let row = lookups[run_index][&(key.clone(), *thread)];
                for name in &common_order {
                    let position = run
                        .table
                        .column_position(None, name)
                        .expect("common metric present in every run");
                    values.push(row.values[position]);
                }
            }
            MetricRow {
                key: key.clone(),
                thread: *thread,
                values,
            }
        })
        .collect();

    // Non-common table: pool the run-specific columns, flat
    let mut noncommon_columns = Vec::new();
    let mut noncommon_sources = Vec::new();
    for (run_index, run) in runs.iter().enumerate() {
        for (position, column) in run.table.columns().iter().enumerate() {
            if !common.contains(column.metric.as_str()) {
                noncommon_columns.push(MetricColumn::plain(column.metric.clone()));
                noncommon_sources.push((run_index, position));
            }
        }
    }
    let noncommon_rows = row_keys
        .iter()
        .map(|(key, thread)| MetricRow {
            key: key.clone(),
            thread: *thread,
            values: noncommon_sources
                .iter()
                .map(|&(run_index, position)| {
                    lookups[run_index][&(key.clone(), *thread)].values[position]
                })
                .collect(),
        })
        .collect();

    let convertible = runs
        .iter()
        .flat_map(|run| run.convertible.iter().cloned())
        .collect();

    debug!(
        "merged {} runs: {} common metrics, {} run-specific columns",
        runs.len(),
        common_order.len(),
        noncommon_columns.len()
    );

    let key = first.table.key();
    Ok(MultiRunData {
        tree: first.tree.clone(),
        tree_table: first.tree_table.clone(),
        common: MetricTable::new(key, common_columns, common_rows)?,
        noncommon: MetricTable::new(key, noncommon_columns, noncommon_rows)?,
        convertible,
    })
}

/// Checking that any pair of runs shares only the metrics common to all
/// runs.
fn check_column_sets(
    column_sets: &[HashSet<&str>],
    common: &HashSet<&str>,
) -> Result<(), MergeError> {
    let specific: Vec<HashSet<&str>> = column_sets
        .iter()
        .map(|set| set.difference(common).copied().collect())
        .collect();
    for (i, a) in specific.iter().enumerate() {
        for b in specific.iter().skip(i + 1) {
            let overlap: Vec<String> = a.intersection(b).map(|s| s.to_string()).collect();
            if !overlap.is_empty() {
                return Err(MergeError::OverlappingColumns(overlap));
            }
        }
    }
    Ok(())
}

fn row_lookup(table: &MetricTable) -> HashMap<(NodeKey, u32), &MetricRow> {
    table
        .rows()
        .iter()
        .map(|row| ((row.key.clone(), row.thread), row))
        .collect()
}
