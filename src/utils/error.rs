//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::table::KeyKind;
use thiserror::Error;

/// Errors that can occur while parsing `cube_dump -w` text
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("call-tree line matches no known format: {0:?}")]
    MalformedLine(String),

    #[error("no id= field in the bracketed section of line: {0:?}")]
    MissingId(String),

    #[error("indentation is not a multiple of {unit} spaces: {line:?}")]
    OddIndent { unit: usize, line: String },

    #[error("empty line sequence, no root to parse")]
    NoRoot,

    #[error("section marker {0:?} not found in dump text")]
    SectionNotFound(String),

    #[error("metric line has no parenthesized field list: {0:?}")]
    MalformedMetricLine(String),
}

/// Errors that can occur during table reshaping and index translation
#[derive(Error, Debug)]
pub enum TableError {
    #[error("no key column among {0:?}; expected one of \"Cnode ID\", \"Short Callpath\", \"Full Callpath\"")]
    MissingKey(Vec<String>),

    #[error("ambiguous key: {0:?} are all present")]
    AmbiguousKey(Vec<String>),

    #[error("missing column {0:?}")]
    MissingColumn(String),

    #[error("a tree table is needed to convert {from} to {to}")]
    LookupRequired { from: KeyKind, to: KeyKind },

    #[error("tree table lacks full callpaths; rebuild it with full paths enabled")]
    MissingFullPaths,

    #[error("key {0} is not covered by the tree table")]
    MissingLookupEntry(String),

    #[error("two tree rows share the same {kind} value {value:?}")]
    DuplicateKey { kind: KeyKind, value: String },

    #[error("cnode id {0} has no rows in the metric data")]
    MissingCnode(u64),

    #[error("cnode id {cnode} has no row for thread {thread}")]
    MissingThread { cnode: u64, thread: u32 },

    #[error("duplicate row for cnode id {cnode}, thread {thread}")]
    DuplicateRow { cnode: u64, thread: u32 },

    #[error("parent chain references unknown cnode id {0}")]
    UnknownParent(u64),

    #[error("row {index} has {got} values, expected {expected}")]
    RowWidth { index: usize, got: usize, expected: usize },

    #[error("row key {key} does not match the table's {kind} index")]
    KeyKindMismatch { key: String, kind: KeyKind },
}

/// Errors that can occur while invoking `cube_dump` or reading its output
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("failed to run {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command:?} exited with {status}: {stderr}")]
    Tool {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("dump output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("numeric value expected in column {column:?}, found {value:?}")]
    BadNumber { column: String, value: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors that can occur while merging multiple profiling runs
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("no profile files given")]
    NoInputs,

    #[error("run-specific metric sets overlap: {0:?}")]
    OverlappingColumns(Vec<String>),

    #[error("runs use different key representations")]
    KeyMismatch,

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
