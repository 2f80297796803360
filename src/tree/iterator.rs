//! Context resolution and the document-order text-node walk.
//!
//! The walk feeds every search pass: it resolves the caller's contexts to a
//! deduplicated root set, waits (bounded) for nested sub-documents to become
//! ready and merges their content into the host tree, and then enumerates
//! qualifying text nodes in document order, applying exclusion rules.

use std::time::Duration;

use ahash::AHashSet;
use tracing::debug;

use crate::config::MarkConfig;
use crate::error::Result;
use crate::tree::MARKER_ATTRIBUTE;
use crate::tree::node::{Document, NodeId};
use crate::tree::selector::Selector;

/// A root (or set of roots) of the tree to search.
#[derive(Debug, Clone)]
pub enum Context {
    /// The whole document.
    Root,
    /// A single node.
    Node(NodeId),
    /// An ordered collection of nodes.
    Nodes(Vec<NodeId>),
    /// All elements matching a selector.
    Selector(String),
}

/// Resolve contexts to a deduplicated list of roots in document order.
/// Contexts nested inside another listed context are dropped.
pub fn resolve_contexts(doc: &Document, contexts: &[Context]) -> Result<Vec<NodeId>> {
    let mut wanted: AHashSet<NodeId> = AHashSet::new();
    for context in contexts {
        match context {
            Context::Root => {
                wanted.insert(doc.root());
            }
            Context::Node(id) => {
                wanted.insert(*id);
            }
            Context::Nodes(ids) => {
                wanted.extend(ids.iter().copied());
            }
            Context::Selector(source) => {
                let selector = Selector::parse(source)?;
                for id in doc.descendants(doc.root()) {
                    if selector.matches(doc, id) {
                        wanted.insert(id);
                    }
                }
            }
        }
    }

    if wanted.contains(&doc.root()) {
        return Ok(vec![doc.root()]);
    }

    // document order, dropping descendants of listed ancestors
    let mut roots = Vec::new();
    for id in doc.descendants(doc.root()) {
        if !wanted.contains(&id) {
            continue;
        }
        if roots.iter().any(|&r| doc.is_ancestor(r, id)) {
            continue;
        }
        roots.push(id);
    }
    Ok(roots)
}

/// Resolved walk parameters for one pass.
#[derive(Debug)]
pub struct WalkConfig {
    /// Descend into nested sub-documents.
    pub sub_documents: bool,
    /// Readiness wait bound per sub-document.
    pub sub_document_timeout: Duration,
    /// Parsed exclusion selectors.
    pub exclude: Vec<Selector>,
    /// Skip subtrees of existing annotation elements (annotation passes
    /// only; the unwrap pass must see them).
    pub exclude_marked: bool,
}

impl WalkConfig {
    /// Derive walk parameters from a mark configuration, parsing the
    /// exclusion selectors up front. Unparsable selectors are fatal.
    pub fn from_config(config: &MarkConfig, exclude_marked: bool) -> Result<Self> {
        let mut exclude = Vec::with_capacity(config.exclude.len());
        for source in &config.exclude {
            exclude.extend(Selector::parse_list(source)?);
        }
        Ok(WalkConfig {
            sub_documents: config.sub_documents,
            sub_document_timeout: config.sub_document_timeout,
            exclude,
            exclude_marked,
        })
    }
}

/// The document-order text-node walk.
#[derive(Debug)]
pub struct TreeWalk;

impl TreeWalk {
    /// Enumerate every qualifying text node under the given roots, in
    /// document order, exactly once.
    ///
    /// When sub-document traversal is enabled, every directly and
    /// transitively nested sub-document is first awaited (bounded by the
    /// timeout) and its content merged into the host tree at the hosting
    /// element's position, so the subsequent walk interleaves it naturally.
    /// A sub-document that never becomes ready is skipped and logged; this
    /// is recoverable and never aborts the walk.
    pub async fn collect_text_nodes(
        doc: &mut Document,
        roots: &[NodeId],
        config: &WalkConfig,
    ) -> Vec<NodeId> {
        if config.sub_documents {
            integrate_sub_documents(doc, roots, config).await;
        }

        let mut out = Vec::new();
        for &root in roots {
            collect_under(doc, root, config, &mut out);
        }
        out
    }
}

/// Wait for and merge nested sub-documents, transitively. Each hosting
/// element is attempted once per pass.
pub(crate) async fn integrate_sub_documents(
    doc: &mut Document,
    roots: &[NodeId],
    config: &WalkConfig,
) {
    let mut attempted: AHashSet<NodeId> = AHashSet::new();
    loop {
        let mut hosts = Vec::new();
        for &root in roots {
            for id in doc.descendants(root) {
                if attempted.contains(&id) {
                    continue;
                }
                if doc.element(id).is_some_and(|e| e.sub_document.is_some()) {
                    hosts.push(id);
                }
            }
        }
        if hosts.is_empty() {
            return;
        }
        for host in hosts {
            attempted.insert(host);
            let Some(handle) = doc.element(host).and_then(|e| e.sub_document.clone()) else {
                continue;
            };
            if !handle.wait_ready(config.sub_document_timeout).await {
                debug!(host, "skipping inaccessible sub-document");
                continue;
            }
            if let Some(content) = handle.take_content() {
                doc.adopt(content, host);
            }
        }
        // adopted content may itself host sub-documents; scan again
    }
}

/// Depth-first collection below one root. Subtrees of excluded elements are
/// pruned wholesale; text nodes are emitted in document order.
fn collect_under(doc: &Document, root: NodeId, config: &WalkConfig, out: &mut Vec<NodeId>) {
    let mut stack: Vec<NodeId> = Vec::new();
    let mut child = doc.node(root).last_child;
    while let Some(c) = child {
        stack.push(c);
        child = doc.node(c).prev_sibling;
    }

    while let Some(id) = stack.pop() {
        if doc.is_element(id) {
            if config.exclude_marked && doc.attribute(id, MARKER_ATTRIBUTE).is_some() {
                continue;
            }
            if config.exclude.iter().any(|s| s.matches(doc, id)) {
                continue;
            }
            let mut child = doc.node(id).last_child;
            while let Some(c) = child {
                stack.push(c);
                child = doc.node(c).prev_sibling;
            }
        } else if doc.text(id).is_some_and(|t| !t.is_empty()) {
            out.push(id);
        }
    }
}
