mod common;

use common::{fixture_tree, DUMP_TEXT};
use cubetree::calltree::{compute_levels, CallTree};
use cubetree::parser::{classify_line, line_level, section_lines};
use cubetree::utils::config::{CALL_TREE_END, CALL_TREE_START};
use cubetree::utils::error::ParseError;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

/// (level, short name, cnode id) triple for one line of the dump, with all
/// presentation-only characters stripped.
fn cleaned_input(line: &str) -> (usize, String, u64) {
    let level = line_level(line).unwrap();
    let record = classify_line(line).unwrap();
    (level, record.name, record.cnode_id)
}

/// The same triple recovered from one line of the diagnostic rendering.
///
/// A rendered line is `{prefix}-{name}:{padding}{id}` where the prefix is
/// three characters per level, drawn from spaces and pipes.
fn cleaned_rendered(line: &str) -> (usize, String, u64) {
    let dash = line
        .find(|c: char| c != ' ' && c != '|')
        .expect("rendered line has a name");
    let level = dash / 3;

    let id_start = line
        .rfind(|c: char| !c.is_ascii_digit())
        .expect("rendered line has a label")
        + 1;
    let id: u64 = line[id_start..].parse().expect("label is the cnode id");

    let head = line[..id_start].trim_end();
    let name = head
        .strip_suffix(':')
        .expect("name is terminated by a colon");
    (level, name[dash + 1..].to_string(), id)
}

#[test]
fn test_render_round_trips_the_cleaned_input() {
    let lines = section_lines(DUMP_TEXT, CALL_TREE_START, CALL_TREE_END).unwrap();
    let tree = CallTree::from_lines(&lines).unwrap();

    let expected: Vec<(usize, String, u64)> =
        lines.iter().map(|line| cleaned_input(line)).collect();
    let rendered: Vec<(usize, String, u64)> = tree
        .render(None, None)
        .lines()
        .map(cleaned_rendered)
        .collect();

    assert_eq!(rendered, expected);
}

#[test]
fn test_traversal_visits_every_id_exactly_once() {
    let lines = section_lines(DUMP_TEXT, CALL_TREE_START, CALL_TREE_END).unwrap();
    let input_ids: HashSet<u64> = lines
        .iter()
        .map(|line| classify_line(line).unwrap().cnode_id)
        .collect();

    let tree = fixture_tree();
    let visited: Vec<u64> = tree.iter_nodes().map(|node| node.cnode_id).collect();
    let distinct: HashSet<u64> = visited.iter().copied().collect();

    assert_eq!(visited.len(), distinct.len());
    assert_eq!(distinct, input_ids);
}

#[test]
fn test_depth_invariant_holds_both_ways() {
    let tree = fixture_tree();

    // from the tree's own fields
    for node in tree.iter_nodes() {
        match node.parent {
            None => assert_eq!(node.depth, 0),
            Some(parent) => assert_eq!(node.depth, tree.node(parent).depth + 1),
        }
    }

    // independently recomputed from the flat parent-id table
    let levels = compute_levels(&tree.to_table(false).parent_map()).unwrap();
    for node in tree.iter_nodes() {
        assert_eq!(levels[&node.cnode_id], node.depth);
    }
}

#[test]
fn test_template_node_through_the_full_pipeline() {
    let tree = fixture_tree();
    let node = tree
        .iter_nodes()
        .find(|node| node.cnode_id == 3)
        .unwrap();
    assert_eq!(node.name, "Eigen::internal::call_dense_assignment_loop");
    assert_eq!(
        node.full_signature,
        "void Eigen::internal::call_dense_assignment_loop(const DstXprType&, const SrcXprType&)"
    );
    assert_eq!(node.template_args.len(), 2);
    assert_eq!(
        node.template_args.get("DstXprType").unwrap(),
        "Eigen::Matrix<double, -1, -1>"
    );
    assert_eq!(node.depth, 2);
}

#[test]
fn test_line_without_id_fails_the_whole_tree() {
    let lines = [
        "main  [ ( id=0, mod=), -1, -1, paradigm=compiler]",
        "  |-broken  [ ( mod=), -1, -1, paradigm=compiler]",
    ];
    let err = CallTree::from_lines(&lines).unwrap_err();
    assert!(matches!(err, ParseError::MissingId(_)));
}

#[test]
fn test_empty_section_has_no_root() {
    let lines: [&str; 0] = [];
    let err = CallTree::from_lines(&lines).unwrap_err();
    assert!(matches!(err, ParseError::NoRoot));
}

#[test]
fn test_attrs_survive_into_the_tree() {
    let tree = fixture_tree();
    let root = tree.root();
    assert_eq!(root.name, "main");
    assert_eq!(root.attrs.get("paradigm").unwrap(), "compiler");
    assert_eq!(root.attrs.get("mode").unwrap(), "/home/user/app/src/app.cpp");

    let mpi_init = tree.iter_nodes().find(|n| n.cnode_id == 1).unwrap();
    assert_eq!(mpi_init.attrs.get("paradigm").unwrap(), "mpi");
}
