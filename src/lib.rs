//! # Textmark
//!
//! A match-locate-and-annotate engine for document trees.
//!
//! Textmark searches the text of an element tree for keywords, regular
//! expressions or explicit ranges and wraps each hit in an annotation
//! element, without ever changing the flattened text of the tree. The
//! annotations can later be removed again, restoring the original node
//! structure.
//!
//! ## Features
//!
//! - Keyword search with diacritics equivalence, synonyms, wildcards and
//!   configurable word-boundary accuracy
//! - Caller-supplied regexes with per-capture-group annotation
//! - Matches spanning element boundaries, with block-level separation
//! - Asynchronously loaded nested sub-documents
//! - Filter/each/no-match/done hooks for observing and steering a pass

pub mod annotate;
pub mod callbacks;
pub mod compose;
pub mod config;
pub mod error;
pub mod marker;
pub mod pattern;
pub mod tree;

pub use crate::annotate::MarkRange;
pub use crate::callbacks::{Filtering, MarkHooks, MarkSummary};
pub use crate::config::{Accuracy, BlockBoundary, MarkConfig, Wildcards};
pub use crate::error::{Result, TextmarkError};
pub use crate::marker::Marker;
pub use crate::tree::{Context, Document, NodeId};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
