//! CLI command implementations.
//!
//! Commands orchestrate the library components to perform user tasks; all
//! user-facing error context is added here with `anyhow`, the library
//! itself returns typed errors.

use crate::aggregator::table_to_inclusive;
use crate::calltree::CallTree;
use crate::dump;
use crate::merge;
use crate::output::{write_json, MetricReport, TreeReport};
use anyhow::{Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;

/// Arguments for the `tree` command
#[derive(Debug, Clone)]
pub struct TreeArgs {
    pub profile: PathBuf,
    pub max_depth: Option<usize>,
    /// Annotate nodes with this metric's thread-summed exclusive value
    pub metric: Option<String>,
}

/// Print a human-readable rendering of a profile's call tree.
pub fn execute_tree(args: TreeArgs) -> Result<()> {
    let text = dump::dump_text(&args.profile)
        .with_context(|| format!("dumping {}", args.profile.display()))?;
    let tree = CallTree::from_dump_text(&text).context("reconstructing the call tree")?;

    let payload = match &args.metric {
        None => None,
        Some(metric) => Some(metric_payload(&args.profile, metric)?),
    };
    print!("{}", tree.render(args.max_depth, payload.as_ref()));
    Ok(())
}

/// Per-cnode display values for one metric, summed over threads.
fn metric_payload(profile: &PathBuf, metric: &str) -> Result<HashMap<u64, String>> {
    let table = dump::metric_table(profile, true)
        .with_context(|| format!("loading metrics for {}", profile.display()))?;
    let position = table
        .column_position(None, metric)
        .with_context(|| format!("metric {metric:?} not present in the dump"))?;
    let mut sums: HashMap<u64, f64> = HashMap::new();
    for row in table.rows() {
        if let Some(id) = row.key.as_id() {
            *sums.entry(id).or_insert(0.0) += row.values[position];
        }
    }
    Ok(sums
        .into_iter()
        .map(|(id, value)| (id, format!("{value:.6}")))
        .collect())
}

/// Arguments for the `export` command
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub profile: PathBuf,
    pub output: PathBuf,
    pub full_paths: bool,
}

/// Export the tree table of a profile as JSON.
pub fn execute_export(args: ExportArgs) -> Result<()> {
    let text = dump::dump_text(&args.profile)
        .with_context(|| format!("dumping {}", args.profile.display()))?;
    let tree = CallTree::from_dump_text(&text).context("reconstructing the call tree")?;
    let report = TreeReport::new(
        args.profile.to_string_lossy(),
        tree.to_table(args.full_paths),
    );
    write_json(&report, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("exported {} nodes", report.tree.rows.len());
    Ok(())
}

/// Arguments for the `inclusive` command
#[derive(Debug, Clone)]
pub struct InclusiveArgs {
    pub profile: PathBuf,
    pub output: PathBuf,
}

/// Aggregate a profile's convertible metrics to inclusive values and write
/// them as JSON.
pub fn execute_inclusive(args: InclusiveArgs) -> Result<()> {
    let data = merge::process_profile(&args.profile, true)
        .with_context(|| format!("processing {}", args.profile.display()))?;

    let convertible = data.table.select_metrics(&data.convertible);
    info!(
        "aggregating {} of {} metrics",
        convertible.columns().len(),
        data.table.columns().len()
    );
    let inclusive = table_to_inclusive(&convertible, &data.tree, Some(&data.tree_table))
        .context("aggregating exclusive metrics")?;

    let report = MetricReport::new(args.profile.to_string_lossy(), &inclusive, true);
    write_json(&report, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

/// Arguments for the `merge` command
#[derive(Debug, Clone)]
pub struct MergeArgs {
    pub profiles: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Merge several runs and export the metrics common to all of them.
pub fn execute_merge(args: MergeArgs) -> Result<()> {
    let merged = merge::process_multi(&args.profiles, true).context("merging profiles")?;
    info!(
        "{} run-specific columns kept aside",
        merged.noncommon.columns().len()
    );
    let profiles = args
        .profiles
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ");
    let report = MetricReport::new(profiles, &merged.common, false);
    write_json(&report, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}
