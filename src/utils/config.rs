//! Configuration and constants for the dump format.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// External dump tool binary name
pub const CUBE_DUMP_BIN: &str = "cube_dump";

/// Spaces of indentation per call-tree level in `cube_dump -w` output.
/// cube_dump uses 2 spaces per level; this might change between versions.
pub const INDENT_PER_LEVEL: usize = 2;

// Section markers in `cube_dump -w` output. Each section runs from the line
// containing the start marker (exclusive) to the line containing the end
// marker (exclusive).
pub const CALL_TREE_START: &str = "CALL TREE";
pub const CALL_TREE_END: &str = "SYSTEM DIMENSION";
pub const METRIC_START: &str = "METRIC DIMENSION";
pub const METRIC_END: &str = "CALLTREE DIMENSION";

/// Convertibility tag marking a metric as safe to sum along the call tree
pub const INCLUSIVE_CONVERTIBLE: &str = "INCLUSIVE convertible";

// Canonical column names shared by the tree table and the metric tables
pub const COL_CNODE_ID: &str = "Cnode ID";
pub const COL_THREAD_ID: &str = "Thread ID";
pub const COL_FUNCTION_NAME: &str = "Function Name";
pub const COL_PARENT_CNODE_ID: &str = "Parent Cnode ID";
pub const COL_FULL_CALLPATH: &str = "Full Callpath";
pub const COL_SHORT_CALLPATH: &str = "Short Callpath";
