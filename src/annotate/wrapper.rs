//! Tree mutation for annotation: splitting text nodes and wrapping the
//! matched span in an annotation element.
//!
//! Composite offsets are translated to node-local offsets through the
//! segment table. The composite value itself is never touched during a pass;
//! instead each wrap re-bases the affected segment so that later matches of
//! the same pass keep resolving against the already-mutated tree. The
//! non-overlap fast path updates one segment in place; the overlapping path
//! replaces the segment record with up to three exact records (text before,
//! annotated span, text after) so nested and overlapping spans stay
//! addressable.

use crate::compose::{CompositeView, TextSegment};
use crate::config::MarkConfig;
use crate::error::{Result, TextmarkError};
use crate::tree::MARKER_ATTRIBUTE;
use crate::tree::node::{Document, NodeId};

/// Result of wrapping a span inside a single text node.
#[derive(Debug)]
pub struct WrapOutcome {
    /// The new annotation element.
    pub mark: NodeId,
    /// The text node now inside the annotation element.
    pub inner: NodeId,
    /// Text after the wrapped span, split into its own node, if any.
    pub remainder: Option<NodeId>,
}

/// Wrap `[start, end)` (node-local byte offsets) of a text node in a new
/// annotation element carrying the marker attribute and the configured class.
pub fn wrap_range_in_node(
    doc: &mut Document,
    node: NodeId,
    start: usize,
    end: usize,
    config: &MarkConfig,
) -> Result<WrapOutcome> {
    let len = doc
        .text(node)
        .map(str::len)
        .ok_or_else(|| TextmarkError::tree(format!("node {node} is not a text node")))?;
    if start >= end || end > len {
        return Err(TextmarkError::invalid_argument(format!(
            "wrap range {start}..{end} out of bounds for text of length {len}"
        )));
    }

    let target = if start > 0 {
        doc.split_text(node, start)?
    } else {
        node
    };
    let remainder = if end < len {
        Some(doc.split_text(target, end - start)?)
    } else {
        None
    };

    let mark = doc.create_element(&config.element);
    doc.set_attribute(mark, MARKER_ATTRIBUTE, "true")?;
    if let Some(class) = &config.class_name {
        doc.set_attribute(mark, "class", class)?;
    }
    doc.insert_before(target, mark);
    doc.detach(target);
    doc.append_child(mark, target);

    Ok(WrapOutcome {
        mark,
        inner: target,
        remainder,
    })
}

/// Wrap composite range `[start, end)` on the non-overlap fast path,
/// splitting the span per owning node. Fragments falling entirely inside
/// already-wrapped text or inside a synthetic boundary suffix are skipped.
/// `on_fragment` fires once per created annotation element with a flag
/// marking the first fragment. Returns the number of fragments created.
///
/// Positions must be non-decreasing across calls on the same view.
pub fn wrap_composite_range<F>(
    doc: &mut Document,
    view: &mut CompositeView,
    start: usize,
    end: usize,
    config: &MarkConfig,
    mut on_fragment: F,
) -> Result<usize>
where
    F: FnMut(&mut Document, NodeId, bool),
{
    let mut pos = start;
    let mut fragments = 0;
    while pos < end {
        let Some(idx) = view.segment_at(pos) else {
            break;
        };
        let (seg_start, seg_end, text_end, start_offset, node) = {
            let seg = &view.segments[idx];
            (seg.start, seg.end, seg.text_end(), seg.start_offset, seg.node)
        };

        let frag_start = pos.max(seg_start + start_offset);
        let frag_end = end.min(text_end);
        if frag_start < frag_end {
            let base = seg_start + start_offset;
            let outcome =
                wrap_range_in_node(doc, node, frag_start - base, frag_end - base, config)?;
            let seg = &mut view.segments[idx];
            if let Some(rem) = outcome.remainder {
                seg.node = rem;
            }
            seg.start_offset = frag_end - seg.start;
            fragments += 1;
            on_fragment(doc, outcome.mark, fragments == 1);
        }

        if end > text_end {
            // rest of the range continues past this node's text; skip any
            // synthetic suffix
            pos = seg_end;
        } else {
            break;
        }
    }
    Ok(fragments)
}

/// Wrap composite range `[start, end)` with exact record replacement:
/// affected segment records are replaced with up to three records (text
/// before, annotated span, text after), so later ranges can address text
/// before, inside and after the annotation, in any order.
///
/// `allow_nested` controls what happens when the range hits an
/// already-annotated record: wrap again inside it (overlapping-range mode)
/// or skip that fragment (cached sequential passes, which must not
/// re-annotate earlier terms' spans).
pub fn wrap_composite_range_overlapping<F>(
    doc: &mut Document,
    view: &mut CompositeView,
    start: usize,
    end: usize,
    config: &MarkConfig,
    allow_nested: bool,
    mut on_fragment: F,
) -> Result<usize>
where
    F: FnMut(&mut Document, NodeId, bool),
{
    let mut pos = start;
    let mut fragments = 0;
    while pos < end {
        let Some(idx) = view.segment_at_unordered(pos) else {
            break;
        };
        let (seg_start, seg_end, text_end, offset, node, annotated) = {
            let seg = &view.segments[idx];
            (seg.start, seg.end, seg.text_end(), seg.offset, seg.node, seg.annotated)
        };

        let frag_end = end.min(text_end);
        if pos < frag_end && (allow_nested || !annotated) {
            let outcome =
                wrap_range_in_node(doc, node, pos - seg_start, frag_end - seg_start, config)?;

            let mut replacement: Vec<TextSegment> = Vec::with_capacity(3);
            if pos > seg_start {
                // text before the span stays in the (split) original node
                // and keeps its annotation status
                replacement.push(TextSegment {
                    node,
                    start: seg_start,
                    end: pos,
                    offset: 0,
                    start_offset: 0,
                    annotated,
                });
            }
            match outcome.remainder {
                Some(rem) => {
                    replacement.push(TextSegment {
                        node: outcome.inner,
                        start: pos,
                        end: frag_end,
                        offset: 0,
                        start_offset: 0,
                        annotated: true,
                    });
                    replacement.push(TextSegment {
                        node: rem,
                        start: frag_end,
                        end: seg_end,
                        offset,
                        start_offset: 0,
                        annotated,
                    });
                }
                None => {
                    // no tail text: the synthetic suffix (if any) rides on
                    // the annotated record to keep the table contiguous
                    replacement.push(TextSegment {
                        node: outcome.inner,
                        start: pos,
                        end: seg_end,
                        offset,
                        start_offset: 0,
                        annotated: true,
                    });
                }
            }
            view.last_index = idx + usize::from(pos > seg_start);
            view.segments.splice(idx..=idx, replacement);
            fragments += 1;
            on_fragment(doc, outcome.mark, fragments == 1);
        }

        if end > text_end {
            pos = seg_end;
        } else {
            break;
        }
    }
    Ok(fragments)
}
