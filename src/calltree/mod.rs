//! The in-memory call-tree model.
//!
//! A call tree is reconstructed once from the CALL TREE section of a
//! `cube_dump -w` dump and never mutated afterwards: aggregation and index
//! translation produce new tabular outputs, not tree mutations.
//!
//! Nodes live in a flat arena owned by [`CallTree`], stored in discovery
//! (pre-)order. Parent and child links are arena indices, so ownership flows
//! strictly from the tree to its nodes and the upward link never participates
//! in destruction.

pub mod table;

pub use table::{short_callpath, TreeRow, TreeTable};

use crate::parser::hierarchy::collect_hierarchy;
use crate::parser::line::{read_call_tree_line, CallTreeLine, ParsedLine};
use crate::parser::section_lines;
use crate::utils::config::{CALL_TREE_END, CALL_TREE_START};
use crate::utils::error::{ParseError, TableError};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;

/// A node of the reconstructed call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTreeNode {
    /// Short function identity, e.g. `SolverPetsc::~SolverPetsc`
    pub name: String,

    /// Complete signature text, possibly decorated with return type and
    /// qualifiers
    pub full_signature: String,

    /// Unique id assigned by the profiling tool
    pub cnode_id: u64,

    /// Arena index of the parent, `None` for the root
    pub parent: Option<usize>,

    /// Arena indices of the children, in discovery order
    pub children: Vec<usize>,

    /// Distance from the root, root = 0
    pub depth: usize,

    /// Template parameter bindings for template instantiations
    pub template_args: IndexMap<String, String>,

    /// Auxiliary attributes from the source line (paradigm, role, url, ...)
    pub attrs: IndexMap<String, String>,
}

/// Intermediate owned tree produced by the hierarchy builder, flattened into
/// the arena immediately afterwards.
struct RawNode {
    record: ParsedLine,
    children: Vec<RawNode>,
}

/// A reconstructed call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTree {
    nodes: Vec<CallTreeNode>,
}

impl CallTree {
    /// Build a call tree from the full text of `cube_dump -w`.
    ///
    /// Only the slice of lines between the CALL TREE marker and the next
    /// section marker is parsed.
    pub fn from_dump_text(text: &str) -> Result<Self, ParseError> {
        let lines = section_lines(text, CALL_TREE_START, CALL_TREE_END)?;
        Self::from_lines(&lines)
    }

    /// Build a call tree from the raw lines of the CALL TREE section.
    ///
    /// Every line is classified up front: one malformed line invalidates the
    /// whole tree, since tree-walk correctness is global.
    ///
    /// # Errors
    /// * `ParseError::NoRoot` - empty input
    /// * any classification error, with the offending line attached
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, ParseError> {
        let classified: Vec<CallTreeLine> = lines
            .iter()
            .map(|line| read_call_tree_line(line.as_ref()))
            .collect::<Result<_, _>>()?;
        debug!("classified {} call-tree lines", classified.len());

        let raw = collect_hierarchy(
            &classified,
            &|line: &CallTreeLine| line.level,
            &|line: &CallTreeLine| Ok(line.record.clone()),
            &|record, children| RawNode { record, children },
        )?;

        let mut nodes = Vec::with_capacity(classified.len());
        flatten(raw, None, 0, &mut nodes);
        Ok(CallTree { nodes })
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node. Construction guarantees at least one node.
    pub fn root(&self) -> &CallTreeNode {
        &self.nodes[0]
    }

    /// The node at an arena index.
    pub fn node(&self, index: usize) -> &CallTreeNode {
        &self.nodes[index]
    }

    /// The children of a node.
    pub fn children<'a>(
        &'a self,
        node: &'a CallTreeNode,
    ) -> impl Iterator<Item = &'a CallTreeNode> {
        node.children.iter().map(move |&i| &self.nodes[i])
    }

    /// Depth-first, pre-order iteration over all nodes.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &CallTreeNode> {
        self.iter_depth(None)
    }

    /// Depth-first, pre-order iteration bounded by depth.
    /// `Some(0)` yields the root only.
    ///
    /// The arena is stored in discovery order, so a depth-filtered scan is
    /// exactly the bounded pre-order walk.
    pub fn iter_depth(&self, max_depth: Option<usize>) -> impl Iterator<Item = &CallTreeNode> {
        self.nodes
            .iter()
            .filter(move |node| max_depth.map_or(true, |limit| node.depth <= limit))
    }

    /// Human-readable indented rendering, for diagnostics only.
    ///
    /// Each line shows the short name and the cnode id, or the payload value
    /// looked up by id when `payload` is given.
    pub fn render(
        &self,
        max_depth: Option<usize>,
        payload: Option<&HashMap<u64, String>>,
    ) -> String {
        let mut out = String::new();
        self.render_into(0, "", max_depth, payload, &mut out);
        out
    }

    fn render_into(
        &self,
        index: usize,
        prefix: &str,
        max_depth: Option<usize>,
        payload: Option<&HashMap<u64, String>>,
        out: &mut String,
    ) {
        const LABEL_COLUMN: usize = 60;

        let node = &self.nodes[index];
        let label = payload
            .and_then(|values| values.get(&node.cnode_id).cloned())
            .unwrap_or_else(|| node.cnode_id.to_string());
        let head = format!("{prefix}-{}:", node.name);
        let pad = LABEL_COLUMN.saturating_sub(head.len());
        out.push_str(&head);
        out.push_str(&" ".repeat(pad));
        out.push_str(&label);
        out.push('\n');

        if max_depth.is_some_and(|limit| node.depth >= limit) {
            return;
        }
        if let Some((&last, rest)) = node.children.split_last() {
            for &child in rest {
                self.render_into(child, &format!("{prefix}  |"), max_depth, payload, out);
            }
            self.render_into(last, &format!("{prefix}   "), max_depth, payload, out);
        }
    }

    /// Tabular projection of the tree, one row per node in pre-order.
    ///
    /// With `include_full_path`, every row also carries the "/"-joined chain
    /// of short names from the root and the derived short callpath
    /// `"name,id"`.
    pub fn to_table(&self, include_full_path: bool) -> TreeTable {
        // parents precede their children in the arena, so one forward pass
        // can extend each parent's path
        let mut paths: Vec<String> = Vec::with_capacity(self.nodes.len());
        if include_full_path {
            for node in &self.nodes {
                paths.push(match node.parent {
                    None => node.name.clone(),
                    Some(parent) => format!("{}/{}", paths[parent], node.name),
                });
            }
        }

        let rows = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| TreeRow {
                function_name: node.name.clone(),
                cnode_id: node.cnode_id,
                parent_cnode_id: node.parent.map(|parent| self.nodes[parent].cnode_id),
                full_callpath: include_full_path.then(|| paths[index].clone()),
                short_callpath: include_full_path
                    .then(|| short_callpath(&node.name, node.cnode_id)),
            })
            .collect();
        TreeTable { rows }
    }
}

fn flatten(raw: RawNode, parent: Option<usize>, depth: usize, nodes: &mut Vec<CallTreeNode>) {
    let index = nodes.len();
    nodes.push(CallTreeNode {
        name: raw.record.name,
        full_signature: raw.record.full_signature,
        cnode_id: raw.record.cnode_id,
        parent,
        children: Vec::with_capacity(raw.children.len()),
        depth,
        template_args: raw.record.template_args,
        attrs: raw.record.attrs,
    });
    for child in raw.children {
        let child_index = nodes.len();
        nodes[index].children.push(child_index);
        flatten(child, Some(index), depth + 1, nodes);
    }
}

/// Recompute the level of every cnode id from a bare id-to-parent-id table.
///
/// The root maps to `None`. The result must agree with the depth stored in
/// the tree, but is derivable by callers that only hold a parent-id table.
///
/// # Errors
/// * `TableError::UnknownParent` - a parent chain leaves the table
pub fn compute_levels(
    parents: &HashMap<u64, Option<u64>>,
) -> Result<HashMap<u64, usize>, TableError> {
    fn level_of(id: u64, parents: &HashMap<u64, Option<u64>>) -> Result<usize, TableError> {
        match parents.get(&id) {
            None => Err(TableError::UnknownParent(id)),
            Some(None) => Ok(0),
            Some(Some(parent)) => Ok(level_of(*parent, parents)? + 1),
        }
    }
    parents
        .keys()
        .map(|&id| level_of(id, parents).map(|level| (id, level)))
        .collect()
}
