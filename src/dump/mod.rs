//! Invocation of the external `cube_dump` tool and ingestion of its output.
//!
//! Everything here is collaborator plumbing: the core algorithms only ever
//! see already-materialized text and tables, so tests can feed
//! [`parse_metric_csv`] and `CallTree::from_dump_text` directly without a
//! CUBE installation.

use crate::table::{identify_key_column, KeyKind, MetricColumn, MetricRow, MetricTable, NodeKey};
use crate::utils::config::{COL_THREAD_ID, CUBE_DUMP_BIN};
use crate::utils::error::{DumpError, TableError};
use log::{debug, info};
use std::path::Path;
use std::process::Command;

/// Run `cube_dump -w` on a profile file and capture the full text output.
///
/// # Errors
/// * `DumpError::Spawn` - the tool could not be started
/// * `DumpError::Tool` - non-zero exit status, stderr attached
pub fn dump_text(profile: &Path) -> Result<String, DumpError> {
    run_cube_dump(&["-w", &profile.to_string_lossy()])
}

/// Load the per-(cnode, thread) metric table for a profile file.
///
/// Asks `cube_dump` for all metrics over all threads in csv2 format,
/// exclusive or inclusive as requested. The inclusive variant is only used
/// to cross-validate the aggregator, never as its input.
pub fn metric_table(profile: &Path, exclusive: bool) -> Result<MetricTable, DumpError> {
    let selection = if exclusive { "excl" } else { "incl" };
    let text = run_cube_dump(&[
        "-m",
        "all",
        "-x",
        selection,
        "-z",
        selection,
        "-c",
        "all",
        "-s",
        "csv2",
        &profile.to_string_lossy(),
    ])?;
    parse_metric_csv(&text)
}

fn run_cube_dump(args: &[&str]) -> Result<String, DumpError> {
    let command = format!("{} {}", CUBE_DUMP_BIN, args.join(" "));
    info!("running {command}");
    let output = Command::new(CUBE_DUMP_BIN)
        .args(args)
        .output()
        .map_err(|source| DumpError::Spawn {
            command: command.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(DumpError::Tool {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8(output.stdout)?)
}

/// Parse `cube_dump ... -s csv2` output into a metric table.
///
/// The header row carries the key column (normally `Cnode ID`), the
/// `Thread ID` column, and one column per metric. Cells are
/// whitespace-padded, hence the trimming reader.
///
/// # Errors
/// * `DumpError::Csv` - malformed CSV
/// * `TableError::MissingKey` / `AmbiguousKey` - key column identification
/// * `TableError::MissingColumn` - no `Thread ID` column
/// * `DumpError::BadNumber` - a non-numeric cell
pub fn parse_metric_csv(text: &str) -> Result<MetricTable, DumpError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let names: Vec<&str> = headers.iter().collect();
    let (key_kind, key_position) = identify_key_column(&names)?;
    let thread_position = names
        .iter()
        .position(|&name| name == COL_THREAD_ID)
        .ok_or_else(|| TableError::MissingColumn(COL_THREAD_ID.to_string()))?;

    let columns: Vec<MetricColumn> = names
        .iter()
        .enumerate()
        .filter(|&(position, _)| position != key_position && position != thread_position)
        .map(|(_, name)| MetricColumn::plain(*name))
        .collect();
    let value_positions: Vec<usize> = (0..names.len())
        .filter(|&position| position != key_position && position != thread_position)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let key_cell = record.get(key_position).unwrap_or("");
        let key = match key_kind {
            KeyKind::CnodeId => NodeKey::Id(parse_number(names[key_position], key_cell)? as u64),
            _ => NodeKey::Path(key_cell.to_string()),
        };
        let thread_cell = record.get(thread_position).unwrap_or("");
        let thread = parse_number(names[thread_position], thread_cell)? as u32;
        let values = value_positions
            .iter()
            .map(|&position| parse_number(names[position], record.get(position).unwrap_or("")))
            .collect::<Result<Vec<f64>, DumpError>>()?;
        rows.push(MetricRow {
            key,
            thread,
            values,
        });
    }
    debug!("parsed {} metric rows, {} columns", rows.len(), columns.len());

    Ok(MetricTable::new(key_kind, columns, rows)?)
}

fn parse_number(column: &str, cell: &str) -> Result<f64, DumpError> {
    cell.trim().parse().map_err(|_| DumpError::BadNumber {
        column: column.to_string(),
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Cnode ID, Thread ID, time, visits
0, 0, 10.5, 1
0, 1, 9.5, 1
1, 0, 3.0, 2
1, 1, 2.5, 2
";

    #[test]
    fn test_parse_metric_csv() {
        let table = parse_metric_csv(CSV).unwrap();
        assert_eq!(table.key(), KeyKind::CnodeId);
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.rows().len(), 4);
        assert_eq!(table.rows()[0].key, NodeKey::Id(0));
        assert_eq!(table.rows()[0].thread, 0);
        assert_eq!(table.rows()[0].values, vec![10.5, 1.0]);
    }

    #[test]
    fn test_non_numeric_cell_is_an_error() {
        let text = "Cnode ID, Thread ID, time\n0, 0, oops\n";
        let err = parse_metric_csv(text).unwrap_err();
        assert!(matches!(err, DumpError::BadNumber { .. }));
    }

    #[test]
    fn test_header_without_key_column_is_an_error() {
        let text = "Thread ID, time\n0, 1.0\n";
        let err = parse_metric_csv(text).unwrap_err();
        assert!(matches!(err, DumpError::Table(TableError::MissingKey(_))));
    }
}
