//! Metric metadata from the METRIC DIMENSION section of `cube_dump -w`.
//!
//! The only piece of metadata the rest of the crate needs is whether a
//! metric is safe to sum along the call tree. A metric line looks like
//!
//! ```text
//! PAPI_L1_ICM  ( id=11, PAPI_L1_ICM, #, UINT64, , Level 1 instruction cache misses., INCLUSIVE convertible, cacheable)
//! ```
//!
//! where the 2nd comma-separated field inside the parentheses is the short
//! name and the 7th is the convertibility tag.

use crate::parser::section_lines;
use crate::utils::config::{INCLUSIVE_CONVERTIBLE, METRIC_END, METRIC_START};
use crate::utils::error::ParseError;
use std::collections::HashSet;

/// Metadata for one metric as reported by the dump tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub short_name: String,
    pub convertibility: String,
}

impl Metric {
    /// Whether exclusive values of this metric may be summed along the call
    /// tree.
    pub fn is_inclusive_convertible(&self) -> bool {
        self.convertibility == INCLUSIVE_CONVERTIBLE
    }
}

/// Parse one metric line.
///
/// Splits the content of the first parenthesized group on commas.
/// TODO: a description field containing a comma shifts the convertibility
/// field; needs a real field grammar to be robust against that.
///
/// # Errors
/// * `ParseError::MalformedMetricLine` - no parenthesized group, or fewer
///   than 7 fields inside it
pub fn parse_metric_line(line: &str) -> Result<Metric, ParseError> {
    let malformed = || ParseError::MalformedMetricLine(line.to_string());
    let start = line.find('(').ok_or_else(malformed)?;
    let end = line.rfind(')').ok_or_else(malformed)?;
    if end <= start {
        return Err(malformed());
    }
    let fields: Vec<&str> = line[start + 1..end].split(',').collect();
    if fields.len() < 7 {
        return Err(malformed());
    }
    Ok(Metric {
        short_name: fields[1].trim().to_string(),
        convertibility: fields[6].trim().to_string(),
    })
}

/// Parse every metric line of the METRIC DIMENSION section.
pub fn metric_info(lines: &[&str]) -> Result<Vec<Metric>, ParseError> {
    lines.iter().map(|line| parse_metric_line(line)).collect()
}

/// The names of all metrics declared safe to sum along the call tree.
pub fn inclusive_convertible_set(metrics: &[Metric]) -> HashSet<String> {
    metrics
        .iter()
        .filter(|metric| metric.is_inclusive_convertible())
        .map(|metric| metric.short_name.clone())
        .collect()
}

/// Extract the convertible-metric set straight from `cube_dump -w` text.
pub fn convertible_metrics_from_text(dump_text: &str) -> Result<HashSet<String>, ParseError> {
    let lines = section_lines(dump_text, METRIC_START, METRIC_END)?;
    let metrics = metric_info(&lines)?;
    Ok(inclusive_convertible_set(&metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "PAPI_L1_ICM  ( id=11, PAPI_L1_ICM, #, UINT64, , Level 1 instruction cache misses., INCLUSIVE convertible, cacheable)";

    #[test]
    fn test_parse_metric_line() {
        let metric = parse_metric_line(LINE).unwrap();
        assert_eq!(metric.short_name, "PAPI_L1_ICM");
        assert_eq!(metric.convertibility, "INCLUSIVE convertible");
        assert!(metric.is_inclusive_convertible());
    }

    #[test]
    fn test_malformed_metric_line() {
        let err = parse_metric_line("time, sec, no parens here").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetricLine(_)));
    }

    #[test]
    fn test_convertible_set_keeps_only_the_tagged_metrics() {
        let metrics = vec![
            Metric {
                short_name: "time".into(),
                convertibility: INCLUSIVE_CONVERTIBLE.into(),
            },
            Metric {
                short_name: "imbalance".into(),
                convertibility: "NOT convertible".into(),
            },
        ];
        let set = inclusive_convertible_set(&metrics);
        assert!(set.contains("time"));
        assert!(!set.contains("imbalance"));
    }
}
