//! cubetree CLI
//!
//! Post-processes CUBE profiling dumps: reconstructs the call tree from
//! `cube_dump -w` output, exports it in tabular form, and aggregates
//! exclusive metrics into inclusive metrics over the tree.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cubetree::commands::{
    execute_export, execute_inclusive, execute_merge, execute_tree, ExportArgs, InclusiveArgs,
    MergeArgs, TreeArgs,
};
use env_logger::Env;
use std::path::PathBuf;

/// cubetree - call-tree reconstruction and metric aggregation for CUBE dumps
#[derive(Parser, Debug)]
#[command(name = "cubetree")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the call tree of a profile
    Tree {
        /// The .cubex profile file
        profile: PathBuf,

        /// Limit the printed depth (0 = root only)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Annotate nodes with this metric instead of the cnode id
        #[arg(long)]
        metric: Option<String>,
    },

    /// Export the call tree in tabular form as JSON
    Export {
        /// The .cubex profile file
        profile: PathBuf,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "tree.json")]
        output: PathBuf,

        /// Include full and short callpath columns
        #[arg(long)]
        full_paths: bool,
    },

    /// Aggregate convertible metrics to inclusive values
    Inclusive {
        /// The .cubex profile file
        profile: PathBuf,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "inclusive.json")]
        output: PathBuf,
    },

    /// Merge the metric tables of several runs
    Merge {
        /// The .cubex profile files, one per run
        #[arg(required = true)]
        profiles: Vec<PathBuf>,

        /// Output path for the JSON report of the common metrics
        #[arg(short, long, default_value = "merged.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Tree {
            profile,
            max_depth,
            metric,
        } => execute_tree(TreeArgs {
            profile,
            max_depth,
            metric,
        }),
        Commands::Export {
            profile,
            output,
            full_paths,
        } => execute_export(ExportArgs {
            profile,
            output,
            full_paths,
        }),
        Commands::Inclusive { profile, output } => {
            execute_inclusive(InclusiveArgs { profile, output })
        }
        Commands::Merge { profiles, output } => execute_merge(MergeArgs { profiles, output }),
    }
}
