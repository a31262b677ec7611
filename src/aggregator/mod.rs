//! Aggregation of exclusive metrics into inclusive metrics.
//!
//! An exclusive measurement is attributed only to time or events spent
//! directly in a function; the inclusive value adds the inclusive values of
//! all callees, i.e. the sum over the subtree rooted at the node.

pub mod inclusive;

pub use inclusive::{series_to_inclusive, table_to_inclusive};
