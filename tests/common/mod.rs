//! Shared synthetic dump fixtures for the integration tests.
//!
//! The call tree below mimics a small MPI solver run:
//!
//! ```text
//! main (0)
//!  |- MPI_Init (1)
//!  |- Grid::assemble (2)
//!  |   `- Eigen::internal::call_dense_assignment_loop (3)
//!  |- solve (4)
//!  |   |- MPI_Allreduce (5)
//!  |   `- SolverPetsc::factorise (6)
//!  `- MPI_Finalize (7)
//! ```

#![allow(dead_code)]

use cubetree::calltree::CallTree;
use cubetree::dump::parse_metric_csv;
use cubetree::table::MetricTable;

pub const DUMP_TEXT: &str = "\
CUBE 4.4
METRIC DIMENSION
time  ( id=0, time, sec, FLOAT, , Total CPU allocation time, INCLUSIVE convertible, cacheable)
visits  ( id=1, visits, occ, UINT64, , Number of visits, INCLUSIVE convertible, cacheable)
imbalance  ( id=2, imbalance, percent, FLOAT, , Load imbalance heuristic, NOT convertible, cacheable)
CALLTREE DIMENSION
CALL TREE
int main(int, char**)  [ ( id=0,   mod=), 22, 89, paradigm=compiler, role=function, url=, descr=, mode=/home/user/app/src/app.cpp]
  |-MPI_Init  [ ( id=1,   mod=), -1, -1, paradigm=mpi, role=function, url=, descr=, mode=MPI]
  |-void Grid::assemble(const Mesh&, double)  [ ( id=2,   mod=), 13, 20, paradigm=compiler, role=function, url=, descr=, mode=/home/user/app/src/Grid.cpp]
    |-void Eigen::internal::call_dense_assignment_loop(const DstXprType&, const SrcXprType&) [with DstXprType = Eigen::Matrix<double, -1, -1>; SrcXprType = Eigen::Matrix<double, -1, -1>]  [ ( id=3,   mod=), 632, 646, paradigm=compiler, role=function, url=, descr=, mode=/opt/eigen/AssignEvaluator.h]
  |-solve  [ ( id=4,   mod=), -1, -1, paradigm=compiler, role=function, url=, descr=, mode=]
    |-MPI_Allreduce  [ ( id=5,   mod=), -1, -1, paradigm=mpi, role=function, url=, descr=, mode=MPI]
    |-SolverPetsc::factorise()  [ ( id=6,   mod=), 40, 77, paradigm=compiler, role=function, url=, descr=, mode=/home/user/app/src/SolverPetsc.cpp]
  |-MPI_Finalize  [ ( id=7,   mod=), -1, -1, paradigm=mpi, role=function, url=, descr=, mode=MPI]
SYSTEM DIMENSION
machine Linux cluster
  node n01
";

/// Exclusive per-(cnode, thread) values, as `cube_dump -s csv2` prints them.
pub const EXCLUSIVE_CSV: &str = "\
Cnode ID, Thread ID, time, visits, imbalance
0, 0, 4.0, 1, 0.1
0, 1, 6.0, 1, 0.2
1, 0, 1.0, 1, 0.0
1, 1, 1.5, 1, 0.0
2, 0, 2.0, 4, 0.3
2, 1, 2.5, 4, 0.3
3, 0, 8.0, 16, 0.0
3, 1, 7.5, 16, 0.1
4, 0, 1.0, 2, 0.0
4, 1, 1.25, 2, 0.0
5, 0, 3.0, 8, 0.4
5, 1, 2.0, 8, 0.4
6, 0, 5.0, 8, 0.0
6, 1, 6.0, 8, 0.0
7, 0, 0.5, 1, 0.0
7, 1, 0.25, 1, 0.0
";

/// The inclusive values `cube_dump` itself reports for the convertible
/// metrics, used to cross-validate the aggregator.
pub const INCLUSIVE_CSV: &str = "\
Cnode ID, Thread ID, time, visits
0, 0, 24.5, 41
0, 1, 27.0, 41
1, 0, 1.0, 1
1, 1, 1.5, 1
2, 0, 10.0, 20
2, 1, 10.0, 20
3, 0, 8.0, 16
3, 1, 7.5, 16
4, 0, 9.0, 18
4, 1, 9.25, 18
5, 0, 3.0, 8
5, 1, 2.0, 8
6, 0, 5.0, 8
6, 1, 6.0, 8
7, 0, 0.5, 1
7, 1, 0.25, 1
";

/// Ids of the leaf nodes of the fixture tree.
pub const LEAF_IDS: [u64; 5] = [1, 3, 5, 6, 7];

pub fn fixture_tree() -> CallTree {
    CallTree::from_dump_text(DUMP_TEXT).expect("fixture dump parses")
}

pub fn exclusive_table() -> MetricTable {
    parse_metric_csv(EXCLUSIVE_CSV).expect("fixture csv parses")
}

pub fn inclusive_table() -> MetricTable {
    parse_metric_csv(INCLUSIVE_CSV).expect("fixture csv parses")
}
