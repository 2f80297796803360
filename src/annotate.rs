//! Locating matches in the composite view and mutating the tree.
//!
//! - [`engine`] - the per-pass scan loop (keywords, caller regexes, ranges)
//! - [`wrapper`] - split-and-wrap primitives and segment re-basing
//! - [`ranges`] - validation of caller-supplied ranges
//! - [`unwrap`] - removal of annotation elements

pub mod engine;
pub mod ranges;
pub mod unwrap;
pub mod wrapper;

pub use self::ranges::MarkRange;
pub use self::unwrap::unmark;
