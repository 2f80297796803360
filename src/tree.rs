//! Node-tree data model and traversal.
//!
//! This module provides the arena-based document tree the engine searches and
//! mutates, plus the pieces that feed text nodes to a search pass:
//!
//! - [`node`] - arena document, node kinds, structural mutation primitives
//! - [`selector`] - the small selector language used for contexts and exclusions
//! - [`subdocument`] - asynchronously loaded nested sub-documents
//! - [`iterator`] - context resolution and the document-order text-node walk

pub mod iterator;
pub mod node;
pub mod selector;
pub mod subdocument;

pub use self::iterator::{Context, TreeWalk, WalkConfig, resolve_contexts};
pub use self::node::{Document, ElementData, Node, NodeData, NodeId};
pub use self::selector::Selector;
pub use self::subdocument::{SubDocument, SubDocumentLoader, SubDocumentState};

/// Attribute every annotation element carries so it can be found and removed
/// later, independent of the configured tag and class.
pub const MARKER_ATTRIBUTE: &str = "data-textmark";
