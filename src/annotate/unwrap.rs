//! Removal of annotation elements.
//!
//! Only elements carrying the marker attribute are touched; the configured
//! tag name narrows the selection further so two annotation layers with
//! different tags can be removed independently. After unwrapping, adjacent
//! text nodes are merged back together so repeated mark/unmark cycles leave
//! the tree byte-identical.

use crate::config::MarkConfig;
use crate::error::Result;
use crate::tree::MARKER_ATTRIBUTE;
use crate::tree::iterator::{WalkConfig, integrate_sub_documents};
use crate::tree::node::{Document, NodeId};

/// Remove every annotation element under the given roots and merge the text
/// back together. Returns the number of elements removed.
///
/// Exclusion selectors still apply: annotations inside an excluded subtree
/// stay in place. Sub-documents are integrated first (when enabled) so
/// annotations inside them are found too.
pub async fn unmark(doc: &mut Document, roots: &[NodeId], config: &MarkConfig) -> Result<usize> {
    let walk = WalkConfig::from_config(config, false)?;
    if walk.sub_documents {
        integrate_sub_documents(doc, roots, &walk).await;
    }

    let mut marks = Vec::new();
    for &root in roots {
        collect_marks(doc, root, config, &walk, &mut marks);
    }
    // reverse document order so nested annotations unwrap inside-out
    for &mark in marks.iter().rev() {
        doc.replace_with_children(mark);
    }
    for &root in roots {
        doc.normalize(root);
    }
    Ok(marks.len())
}

fn collect_marks(
    doc: &Document,
    root: NodeId,
    config: &MarkConfig,
    walk: &WalkConfig,
    out: &mut Vec<NodeId>,
) {
    let mut stack: Vec<NodeId> = Vec::new();
    let mut child = doc.node(root).last_child;
    while let Some(c) = child {
        stack.push(c);
        child = doc.node(c).prev_sibling;
    }
    while let Some(id) = stack.pop() {
        if !doc.is_element(id) {
            continue;
        }
        if walk.exclude.iter().any(|s| s.matches(doc, id)) {
            continue;
        }
        if doc.attribute(id, MARKER_ATTRIBUTE).is_some()
            && doc.name(id) == Some(config.element.as_str())
        {
            out.push(id);
        }
        let mut child = doc.node(id).last_child;
        while let Some(c) = child {
            stack.push(c);
            child = doc.node(c).prev_sibling;
        }
    }
}
