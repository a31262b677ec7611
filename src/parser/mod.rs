//! Parsing of `cube_dump -w` text: section slicing, line classification and
//! generic hierarchy reconstruction.

pub mod hierarchy;
pub mod line;

pub use hierarchy::{collect_hierarchy, collect_nested, Hierarchy};
pub use line::{classify_line, line_level, read_call_tree_line, CallTreeLine, ParsedLine};

use crate::utils::error::ParseError;
use log::debug;

/// The non-blank lines of one dump section.
///
/// A section runs from the first line containing `start_hint` (exclusive) to
/// the next line containing `end_hint` (exclusive). Both hints are exact
/// substrings to search for, as supplied by the dump format.
///
/// # Errors
/// * `ParseError::SectionNotFound` - either marker is absent
pub fn section_lines<'a>(
    text: &'a str,
    start_hint: &str,
    end_hint: &str,
) -> Result<Vec<&'a str>, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|line| line.contains(start_hint))
        .ok_or_else(|| ParseError::SectionNotFound(start_hint.to_string()))?;
    let stop = lines[start + 1..]
        .iter()
        .position(|line| line.contains(end_hint))
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| ParseError::SectionNotFound(end_hint.to_string()))?;

    let section: Vec<&str> = lines[start + 1..stop]
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .collect();
    debug!(
        "section {:?}..{:?}: {} lines",
        start_hint,
        end_hint,
        section.len()
    );
    Ok(section)
}
