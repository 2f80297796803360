//! Callback hooks reported to during a mark/unmark operation.
//!
//! Hooks are deliberately separate from [`MarkConfig`](crate::config::MarkConfig):
//! the config stays a plain immutable value while the hooks are mutable
//! closures invoked as the pass progresses. All failure reporting flows
//! through hooks (or debug logs), never through panics or errors raised
//! across an await point.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::annotate::ranges::MarkRange;
use crate::tree::node::{Document, NodeId};

/// Decision of a filter hook about one candidate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtering {
    /// Annotate the candidate.
    Keep,
    /// Skip it and keep scanning.
    Skip,
    /// Skip it and terminate the current pass early. Annotations already
    /// produced stay in place.
    Halt,
}

/// A candidate match presented to the filter hook.
#[derive(Debug)]
pub struct MatchCandidate<'a> {
    /// The matched text (the annotatable span, not discardable prefixes).
    pub text: &'a str,
    /// The text node owning the start of the match.
    pub node: NodeId,
    /// The term being searched, or the pattern source for regex passes.
    pub term: &'a str,
    /// How many matches this pass has accepted so far.
    pub match_count: usize,
}

/// Details passed to the `each` hook alongside the new annotation element.
#[derive(Debug, Clone)]
pub struct EachDetail {
    /// The term that produced this annotation.
    pub term: String,
    /// True on the first annotated fragment of a (possibly cross-node)
    /// match, false on continuation fragments.
    pub match_start: bool,
    /// Ordinal of the logical match within the pass, starting at 1.
    pub match_count: usize,
}

/// Why `no_match` fired.
#[derive(Debug, Clone, PartialEq)]
pub enum NoMatchReason {
    /// A term produced zero matches.
    Term(String),
    /// An explicit range was invalid or rejected.
    Range(MarkRange),
}

/// Aggregate counts reported once per public call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkSummary {
    /// Number of annotation elements created.
    pub total_marks: usize,
    /// Number of logical matches (a cross-node match counts once).
    pub total_matches: usize,
    /// Per-term logical match counts.
    pub term_counts: AHashMap<String, usize>,
}

type FilterFn<'h> = dyn FnMut(&Document, &MatchCandidate<'_>) -> Filtering + 'h;
type EachFn<'h> = dyn FnMut(&Document, NodeId, &EachDetail) + 'h;
type NoMatchFn<'h> = dyn FnMut(&NoMatchReason) + 'h;
type DoneFn<'h> = dyn FnMut(&MarkSummary) + 'h;

/// The hook bundle. All hooks are optional; an empty bundle is valid.
#[derive(Default)]
pub struct MarkHooks<'h> {
    filter: Option<Box<FilterFn<'h>>>,
    each: Option<Box<EachFn<'h>>>,
    no_match: Option<Box<NoMatchFn<'h>>>,
    done: Option<Box<DoneFn<'h>>>,
}

impl std::fmt::Debug for MarkHooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkHooks")
            .field("filter", &self.filter.is_some())
            .field("each", &self.each.is_some())
            .field("no_match", &self.no_match.is_some())
            .field("done", &self.done.is_some())
            .finish()
    }
}

impl<'h> MarkHooks<'h> {
    /// Create an empty hook bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accept/reject predicate for candidate matches.
    pub fn with_filter<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Document, &MatchCandidate<'_>) -> Filtering + 'h,
    {
        self.filter = Some(Box::new(f));
        self
    }

    /// Set the per-annotation hook.
    pub fn with_each<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Document, NodeId, &EachDetail) + 'h,
    {
        self.each = Some(Box::new(f));
        self
    }

    /// Set the zero-match hook.
    pub fn with_no_match<F>(mut self, f: F) -> Self
    where
        F: FnMut(&NoMatchReason) + 'h,
    {
        self.no_match = Some(Box::new(f));
        self
    }

    /// Set the completion hook.
    pub fn with_done<F>(mut self, f: F) -> Self
    where
        F: FnMut(&MarkSummary) + 'h,
    {
        self.done = Some(Box::new(f));
        self
    }

    pub(crate) fn filter(&mut self, doc: &Document, candidate: &MatchCandidate<'_>) -> Filtering {
        match &mut self.filter {
            Some(f) => f(doc, candidate),
            None => Filtering::Keep,
        }
    }

    pub(crate) fn each(&mut self, doc: &Document, node: NodeId, detail: &EachDetail) {
        if let Some(f) = &mut self.each {
            f(doc, node, detail);
        }
    }

    pub(crate) fn no_match(&mut self, reason: &NoMatchReason) {
        if let Some(f) = &mut self.no_match {
            f(reason);
        }
    }

    pub(crate) fn done(&mut self, summary: &MarkSummary) {
        if let Some(f) = &mut self.done {
            f(summary);
        }
    }
}
