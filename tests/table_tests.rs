mod common;

use common::{exclusive_table, fixture_tree};
use cubetree::table::{convert_index, identify_key_column, KeyKind, NodeKey};
use cubetree::utils::error::TableError;
use pretty_assertions::assert_eq;

#[test]
fn test_index_translation_cycle_is_a_bijection() {
    let tree = fixture_tree();
    let lookup = tree.to_table(true);
    let original = exclusive_table();

    let short = convert_index(&original, Some(&lookup), KeyKind::ShortCallpath).unwrap();
    assert_eq!(short.key(), KeyKind::ShortCallpath);
    let full = convert_index(&short, Some(&lookup), KeyKind::FullCallpath).unwrap();
    assert_eq!(full.key(), KeyKind::FullCallpath);
    let back = convert_index(&full, Some(&lookup), KeyKind::CnodeId).unwrap();

    assert_eq!(back, original);
}

#[test]
fn test_translation_preserves_every_row() {
    let tree = fixture_tree();
    let lookup = tree.to_table(true);
    let original = exclusive_table();

    let full = convert_index(&original, Some(&lookup), KeyKind::FullCallpath).unwrap();
    assert_eq!(full.rows().len(), original.rows().len());
    assert_eq!(full.columns(), original.columns());

    // spot-check one relabeled row: cnode 3 is main/Grid::assemble/Eigen...
    let row = full
        .rows()
        .iter()
        .find(|row| {
            row.key
                == NodeKey::Path(
                    "main/Grid::assemble/Eigen::internal::call_dense_assignment_loop".into(),
                )
                && row.thread == 0
        })
        .expect("relabeled row exists");
    assert_eq!(row.values[0], 8.0);
}

#[test]
fn test_short_callpaths_are_name_comma_id() {
    let tree = fixture_tree();
    let lookup = tree.to_table(true);
    let short = convert_index(&exclusive_table(), Some(&lookup), KeyKind::ShortCallpath).unwrap();
    assert!(short
        .rows()
        .iter()
        .any(|row| row.key == NodeKey::Path("MPI_Finalize,7".into())));
}

#[test]
fn test_key_identification_requires_exactly_one_candidate() {
    assert!(matches!(
        identify_key_column(&["Thread ID", "time"]),
        Err(TableError::MissingKey(_))
    ));
    assert!(matches!(
        identify_key_column(&["Cnode ID", "Short Callpath", "time"]),
        Err(TableError::AmbiguousKey(_))
    ));
    let (kind, _) = identify_key_column(&["Full Callpath", "Thread ID", "time"]).unwrap();
    assert_eq!(kind, KeyKind::FullCallpath);
}

#[test]
fn test_select_metrics_drops_unlisted_columns() {
    let table = exclusive_table();
    let allowed = ["time".to_string(), "visits".to_string()].into();
    let selected = table.select_metrics(&allowed);
    assert_eq!(selected.metric_names(), ["time", "visits"]);
    assert_eq!(selected.rows().len(), table.rows().len());
}
