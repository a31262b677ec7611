//! Classification of single call-tree lines.
//!
//! A call-tree line from `cube_dump -w` looks like
//!
//! ```text
//!     |-MPI_Finalize  [ ( id=163,   mod=), -1, -1, paradigm=mpi, role=function, url=, descr=, mode=MPI]
//! ```
//!
//! The signature part before the bracketed attribute list is free-form text:
//! a plain function name, a full C++ signature, or a template instantiation
//! with a trailing `[with T = ...; U = ...]` clause. Identity extraction runs
//! an ordered list of strategies, each more permissive about the characters
//! allowed in the name, and accepts the first result that passes an explicit
//! validity check. No accepted strategy is a hard error: skipping a line
//! would silently break the correspondence between cnode ids and tree
//! positions.

use crate::utils::config::INDENT_PER_LEVEL;
use crate::utils::error::ParseError;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// Start of the bracketed attribute list, `[ ( id=`
static ATTR_BRACKET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\(\s*id=").unwrap());

/// Full attribute list: `[ ( id=<int>, mod=<str>), <int>, <int>, key=value, ...]`
static ATTR_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^\[\s*\(\s*
          id=(?P<id>\d+)\s*,\s*
          mod=(?P<mod>[^)]*)\)\s*,\s*
          (?P<beg>-?\d+)\s*,\s*
          (?P<end>-?\d+)\s*
          (?P<rest>.*?)\s*\]\s*$",
    )
    .unwrap()
});

/// Memory-address ranges like `[0x400a2f,0x400b51)` are a legitimate part of
/// some mangled names and must not count as stray parentheses.
static ADDR_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[0x[0-9a-fA-F]+,\s*0x[0-9a-fA-F]+\)").unwrap());

/// A single bare identifier, the simplest name format
static SIMPLE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());

/// Identity and attributes extracted from one call-tree line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Best-effort short identity, e.g. `SolverPetsc::~SolverPetsc`
    pub name: String,

    /// Verbatim signature text, e.g. `virtual SolverPetsc::~SolverPetsc()`
    pub full_signature: String,

    /// The mandatory `id=` field
    pub cnode_id: u64,

    /// Bindings from a `[with A = x; B = y]` clause, empty for
    /// non-template lines
    pub template_args: IndexMap<String, String>,

    /// Remaining `key=value` attributes (paradigm, role, url, descr, mode,
    /// ...), plus `mod` when non-empty
    pub attrs: IndexMap<String, String>,

    /// Source line span reported by the instrumenter, `-1` when unknown
    pub begin_line: i64,
    pub end_line: i64,
}

/// A classified line together with its nesting level, ready for tree
/// assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTreeLine {
    pub level: usize,
    pub record: ParsedLine,
}

/// Compute the nesting level of a line from its indentation.
///
/// The level is the number of spaces before the first word character,
/// divided by the per-level unit (2). Tree-drawing characters (`|`, `-`) do
/// not count.
///
/// # Errors
/// * `ParseError::OddIndent` - the space count is not a multiple of the unit
pub fn line_level(line: &str) -> Result<usize, ParseError> {
    let prefix_end = line
        .find(|c: char| c.is_alphanumeric() || c == '_')
        .unwrap_or(line.len());
    let spaces = line[..prefix_end].chars().filter(|&c| c == ' ').count();
    if spaces % INDENT_PER_LEVEL != 0 {
        return Err(ParseError::OddIndent {
            unit: INDENT_PER_LEVEL,
            line: line.to_string(),
        });
    }
    Ok(spaces / INDENT_PER_LEVEL)
}

/// Classify one call-tree line.
///
/// Locates the bracketed attribute list, then tries the name-extraction
/// strategies in increasing order of generality: bare identifier, C++
/// signature, template instantiation. The first strategy whose short name
/// survives the validity check wins.
///
/// # Errors
/// * `ParseError::MissingId` - no `id=` field in the bracketed section
/// * `ParseError::MalformedLine` - no strategy accepted the line
pub fn classify_line(line: &str) -> Result<ParsedLine, ParseError> {
    let bracket = match ATTR_BRACKET.find(line) {
        Some(m) => m,
        None => {
            // Distinguish "bracket without id" from "no bracket at all"
            if line.contains('[') && !line.contains("id=") {
                return Err(ParseError::MissingId(line.to_string()));
            }
            return Err(ParseError::MalformedLine(line.to_string()));
        }
    };

    let attrs_text = &line[bracket.start()..];
    let caps = ATTR_BODY
        .captures(attrs_text)
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;

    let malformed = || ParseError::MalformedLine(line.to_string());
    let cnode_id: u64 = caps["id"].parse().map_err(|_| malformed())?;
    let begin_line: i64 = caps["beg"].parse().map_err(|_| malformed())?;
    let end_line: i64 = caps["end"].parse().map_err(|_| malformed())?;

    let mut attrs = IndexMap::new();
    let module = caps["mod"].trim();
    if !module.is_empty() {
        attrs.insert("mod".to_string(), module.to_string());
    }
    for field in caps["rest"].split(',') {
        if let Some((key, value)) = field.split_once('=') {
            attrs.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    // Indentation and tree-drawing characters are not part of the signature
    let signature = line[..bracket.start()]
        .trim_start_matches([' ', '|', '-'])
        .trim_end();

    let strategies: [fn(&str) -> Option<Candidate>; 3] =
        [name_simple, name_signature, name_template];
    for strategy in strategies {
        if let Some(candidate) = strategy(signature) {
            if name_is_clean(&candidate.name) {
                return Ok(ParsedLine {
                    name: candidate.name,
                    full_signature: candidate.full_signature,
                    cnode_id,
                    template_args: candidate.template_args,
                    attrs,
                    begin_line,
                    end_line,
                });
            }
        }
    }
    Err(ParseError::MalformedLine(line.to_string()))
}

/// Classify a line and compute its level in one step.
pub fn read_call_tree_line(line: &str) -> Result<CallTreeLine, ParseError> {
    Ok(CallTreeLine {
        level: line_level(line)?,
        record: classify_line(line)?,
    })
}

/// Intermediate result of one name-extraction strategy
struct Candidate {
    name: String,
    full_signature: String,
    template_args: IndexMap<String, String>,
}

/// Strategy 1: a single contiguous token, e.g. `MPI_Finalize`.
fn name_simple(signature: &str) -> Option<Candidate> {
    let token = SIMPLE_NAME.find(signature)?.as_str();
    Some(Candidate {
        name: token.to_string(),
        full_signature: token.to_string(),
        template_args: IndexMap::new(),
    })
}

/// Strategy 2: a C++-style signature with return type, qualifiers and
/// argument list, e.g. `virtual SolverPetsc::~SolverPetsc()`. Also covers
/// otherwise unstructured names (mangled regions, address ranges), which the
/// validity check arbitrates.
fn name_signature(signature: &str) -> Option<Candidate> {
    if signature.contains("[with") {
        return None;
    }
    Some(Candidate {
        name: short_name_of(signature)?,
        full_signature: signature.to_string(),
        template_args: IndexMap::new(),
    })
}

/// Strategy 3: a template instantiation with a trailing
/// `[with A = x; B = y]` clause. The clause is stripped from the signature
/// and its bindings are captured separately.
fn name_template(signature: &str) -> Option<Candidate> {
    let clause_start = signature.find("[with")?;
    let clause = signature[clause_start..]
        .strip_prefix("[with")?
        .trim_end()
        .strip_suffix(']')?;

    let mut template_args = IndexMap::new();
    for binding in clause.split(';') {
        let (key, value) = binding.split_once('=')?;
        template_args.insert(key.trim().to_string(), value.trim().to_string());
    }

    let head = signature[..clause_start].trim_end();
    Some(Candidate {
        name: short_name_of(head)?,
        full_signature: head.to_string(),
        template_args,
    })
}

/// Derive the short identity from a signature: collapse `", "` inside
/// argument lists so they survive tokenization, cut at the first `(` to drop
/// the arguments, and keep the last whitespace-delimited token to drop the
/// return type and qualifiers.
fn short_name_of(text: &str) -> Option<String> {
    let collapsed = text.replace(", ", ",");
    let head = collapsed.split('(').next().unwrap_or(&collapsed);
    head.split_whitespace().last().map(str::to_string)
}

/// A short name is acceptable if it contains no parenthesis characters once
/// address-range substrings are masked out.
fn name_is_clean(name: &str) -> bool {
    let masked = ADDR_RANGE.replace_all(name, "");
    !masked.contains('(') && !masked.contains(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LINE_SIMPLE: &str = "    |-MPI_Finalize  [ ( id=163,   mod=), -1, -1, paradigm=mpi, role=function, url=, descr=, mode=MPI]";
    const LINE_CPP: &str = "    |-virtual SolverPetsc::~SolverPetsc()  [ ( id=163,   mod=), 13, 20, paradigm=compiler, role=function, url=, descr=, mode=/home/user/solver/src/SolverPetsc.cpp]";
    const LINE_TEMPLATE: &str = "    |-void Eigen::internal::call_dense_assignment_loop(const DstXprType&, const SrcXprType&, const Functor&) [with DstXprType = Eigen::Matrix<double, -1, -1, 1>; SrcXprType = Eigen::Matrix<double, -1, -1>; Functor = Eigen::internal::assign_op<double>]  [ ( id=163,   mod=), 632, 646, paradigm=compiler, role=function, url=, descr=, mode=/opt/eigen/Eigen/src/Core/AssignEvaluator.h]";
    const LINE_MAIN: &str = "int main(int, char**)  [ ( id=1,   mod=), 22, 89, paradigm=compiler, role=function, url=, descr=, mode=/home/user/solver/src/app.cpp]";

    #[test]
    fn test_cnode_id_extracted_from_every_format() {
        for line in [LINE_SIMPLE, LINE_CPP, LINE_TEMPLATE] {
            assert_eq!(classify_line(line).unwrap().cnode_id, 163);
        }
    }

    #[test]
    fn test_simple_line() {
        let node = classify_line(LINE_SIMPLE).unwrap();
        assert_eq!(node.name, "MPI_Finalize");
        assert_eq!(node.full_signature, "MPI_Finalize");
        assert_eq!(node.attrs.get("paradigm").unwrap(), "mpi");
        assert_eq!(node.attrs.get("mode").unwrap(), "MPI");
        assert!(node.template_args.is_empty());
    }

    #[test]
    fn test_cpp_signature_line() {
        let node = classify_line(LINE_CPP).unwrap();
        assert_eq!(node.name, "SolverPetsc::~SolverPetsc");
        assert_eq!(node.full_signature, "virtual SolverPetsc::~SolverPetsc()");
        assert_eq!(node.begin_line, 13);
        assert_eq!(node.end_line, 20);
    }

    #[test]
    fn test_main_signature_line() {
        let node = classify_line(LINE_MAIN).unwrap();
        assert_eq!(node.name, "main");
        assert_eq!(node.full_signature, "int main(int, char**)");
        assert_eq!(node.cnode_id, 1);
    }

    #[test]
    fn test_template_line() {
        let node = classify_line(LINE_TEMPLATE).unwrap();
        assert_eq!(node.name, "Eigen::internal::call_dense_assignment_loop");
        assert_eq!(
            node.full_signature,
            "void Eigen::internal::call_dense_assignment_loop(const DstXprType&, const SrcXprType&, const Functor&)"
        );
        assert_eq!(node.template_args.len(), 3);
        assert_eq!(
            node.template_args.get("DstXprType").unwrap(),
            "Eigen::Matrix<double, -1, -1, 1>"
        );
        assert_eq!(
            node.template_args.get("SrcXprType").unwrap(),
            "Eigen::Matrix<double, -1, -1>"
        );
        assert_eq!(
            node.template_args.get("Functor").unwrap(),
            "Eigen::internal::assign_op<double>"
        );
    }

    #[test]
    fn test_missing_id_is_an_explicit_error() {
        let line = "  |-broken  [ ( mod=), -1, -1, paradigm=mpi]";
        let err = classify_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingId(_)));
    }

    #[test]
    fn test_unparseable_line_is_an_error() {
        let err = classify_line("no bracket here at all").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine(_)));
    }

    #[test]
    fn test_address_range_does_not_count_as_stray_parens() {
        assert!(name_is_clean("UNKNOWN@[0x400a2f,0x400b51)"));
        assert!(!name_is_clean("broken(name"));
    }

    #[test]
    fn test_line_level() {
        assert_eq!(line_level(LINE_MAIN).unwrap(), 0);
        assert_eq!(line_level(LINE_SIMPLE).unwrap(), 2);
        assert_eq!(line_level("  |-setup  [ ( id=2, mod=), -1, -1]").unwrap(), 1);
    }

    #[test]
    fn test_odd_indent_is_an_error() {
        let err = line_level("   |-odd  [ ( id=9, mod=), -1, -1]").unwrap_err();
        assert!(matches!(err, ParseError::OddIndent { .. }));
    }
}
