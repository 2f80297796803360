//! Composite text view for cross-node matching.
//!
//! The composite view concatenates the text of every in-scope node into one
//! string and records, per node, its byte range inside that string. When two
//! consecutive nodes sit in different block-level elements, a synthetic
//! suffix (a space, or the configured boundary marker plus a space) is
//! appended after the first node so that matches cannot silently bridge
//! semantically separate blocks; the suffix length is stored on the segment
//! as `offset` and is subtracted back out during offset arithmetic, since
//! those characters exist in no node.

use ahash::AHashSet;
use lazy_static::lazy_static;

use crate::config::MarkConfig;
use crate::tree::node::{Document, NodeId};

lazy_static! {
    /// Element names treated as block-level for boundary decisions.
    static ref BLOCK_ELEMENTS: AHashSet<&'static str> = [
        "address", "article", "aside", "blockquote", "body", "br", "dd",
        "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer",
        "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
        "main", "nav", "ol", "output", "p", "pre", "section", "table",
        "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
    ]
    .into_iter()
    .collect();
}

/// One text node's slice of the composite value.
///
/// The node's own text occupies `[start + start_offset, end - offset)`;
/// `offset` is the synthetic suffix length and `start_offset` accumulates
/// bytes that earlier splits in the same pass moved out of `node` into
/// pre/annotation nodes.
#[derive(Debug, Clone)]
pub struct TextSegment {
    /// The text node currently owning the tail of this range.
    pub node: NodeId,
    /// Range start in the composite value (bytes).
    pub start: usize,
    /// Range end in the composite value (bytes), including the suffix.
    pub end: usize,
    /// Length of the synthetic boundary suffix, in bytes.
    pub offset: usize,
    /// Correction from earlier splits: bytes of the front of this range no
    /// longer inside `node`.
    pub start_offset: usize,
    /// True once this record's text sits inside an annotation element.
    /// Record-replacement wraps consult it to decide whether nesting is
    /// allowed.
    pub annotated: bool,
}

impl TextSegment {
    /// End of the node's real text inside the composite value.
    pub fn text_end(&self) -> usize {
        self.end - self.offset
    }
}

/// The flattened text of one search pass plus its offset table.
#[derive(Debug)]
pub struct CompositeView {
    /// Concatenated text, including synthetic boundary suffixes.
    pub value: String,
    /// Per-node segments, sorted by `start`, contiguous, non-overlapping
    /// (annotated records are interleaved in overlap mode).
    pub segments: Vec<TextSegment>,
    /// Monotonic segment cursor for the non-overlap fast path.
    pub last_index: usize,
}

impl CompositeView {
    /// Build the view over the given text nodes, in document order.
    ///
    /// When `cross_node` is false the view is a plain concatenation and all
    /// offsets are zero; otherwise boundary suffixes are inserted per the
    /// block-element rules.
    pub fn build(
        doc: &Document,
        text_nodes: &[NodeId],
        config: &MarkConfig,
        cross_node: bool,
    ) -> CompositeView {
        let mut value = String::new();
        let mut segments = Vec::with_capacity(text_nodes.len());

        for (i, &node) in text_nodes.iter().enumerate() {
            let text = doc.text(node).unwrap_or_default();
            let start = value.len();
            value.push_str(text);
            let mut offset = 0;
            if cross_node && i + 1 < text_nodes.len() && !ends_in_whitespace(text) {
                if let Some(suffix) = boundary_suffix(doc, node, config) {
                    offset = suffix.len();
                    value.push_str(&suffix);
                }
            }
            segments.push(TextSegment {
                node,
                start,
                end: value.len(),
                offset,
                start_offset: 0,
                annotated: false,
            });
        }

        CompositeView {
            value,
            segments,
            last_index: 0,
        }
    }

    /// Find the segment containing composite position `pos`, scanning
    /// forward from the monotonic cursor and advancing it. Fast path only;
    /// positions must be non-decreasing across calls.
    pub fn segment_at(&mut self, pos: usize) -> Option<usize> {
        while self.last_index < self.segments.len() {
            let seg = &self.segments[self.last_index];
            if pos < seg.end && pos >= seg.start {
                return Some(self.last_index);
            }
            if seg.start > pos {
                // pos falls into a gap (inside a synthetic suffix of a
                // segment already passed)
                return None;
            }
            self.last_index += 1;
        }
        None
    }

    /// Find the insertion segment for `pos` without the monotonic
    /// assumption: scan backward from the cursor while prior segments start
    /// beyond `pos`, then forward. Used by the overlapping-range path.
    pub fn segment_at_unordered(&self, pos: usize) -> Option<usize> {
        let mut i = self.last_index.min(self.segments.len().saturating_sub(1));
        while i > 0 && self.segments[i].start > pos {
            i -= 1;
        }
        while i < self.segments.len() {
            let seg = &self.segments[i];
            if pos >= seg.start && pos < seg.end {
                return Some(i);
            }
            if seg.start > pos {
                return None;
            }
            i += 1;
        }
        None
    }

    /// Reset the segment cursor. Used between passes that share a cached
    /// view.
    pub fn reset_cursors(&mut self) {
        self.last_index = 0;
    }
}

fn ends_in_whitespace(text: &str) -> bool {
    text.chars().next_back().is_some_and(|c| c.is_whitespace())
}

fn is_block(doc: &Document, id: NodeId, config: &MarkConfig) -> bool {
    let Some(name) = doc.name(id) else {
        return false;
    };
    BLOCK_ELEMENTS.contains(name)
        || config
            .block_boundary
            .extra_elements
            .iter()
            .any(|e| e.eq_ignore_ascii_case(name))
}

/// Decide the synthetic suffix after `node`. Climbs toward the root until a
/// following sibling exists; a block-level element among the exited
/// ancestors or at the entered sibling produces a boundary.
fn boundary_suffix(doc: &Document, node: NodeId, config: &MarkConfig) -> Option<String> {
    let mut cur = node;
    let mut crossed_block = false;
    loop {
        if let Some(next) = doc.node(cur).next_sibling {
            if crossed_block || is_block(doc, next, config) {
                return Some(if config.block_boundary.enabled {
                    format!("{} ", config.block_boundary.boundary_char)
                } else {
                    " ".to_string()
                });
            }
            return None;
        }
        let parent = doc.node(cur).parent?;
        if is_block(doc, parent, config) {
            crossed_block = true;
        }
        cur = parent;
    }
}
