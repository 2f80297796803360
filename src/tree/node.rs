//! Arena document tree.
//!
//! Nodes live in a flat arena and reference each other through compact ids,
//! so structural mutation (splitting a text node, wrapping a span, unwrapping
//! an annotation) is link surgery instead of pointer juggling. Detached nodes
//! stay in the arena until the document is dropped; ids are never reused
//! within a document's lifetime.

use ahash::AHashMap;

use crate::error::{Result, TextmarkError};
use crate::tree::subdocument::SubDocument;

/// Compact node identifier (index into the arena).
pub type NodeId = u32;

/// Payload of a node.
#[derive(Debug)]
pub enum NodeData {
    /// The document root. Exactly one per document, always id 0.
    Root,
    /// An element with a tag name, attributes and optionally an embedded
    /// sub-document.
    Element(ElementData),
    /// A run of text.
    Text(String),
}

/// Element payload.
#[derive(Debug)]
pub struct ElementData {
    /// Tag name, stored lowercase.
    pub name: String,
    /// Attribute map. Class membership is the space-separated `class` value.
    pub attributes: AHashMap<String, String>,
    /// Embedded sub-document, if this element hosts one.
    pub sub_document: Option<SubDocument>,
}

impl ElementData {
    fn new(name: &str) -> Self {
        ElementData {
            name: name.to_ascii_lowercase(),
            attributes: AHashMap::new(),
            sub_document: None,
        }
    }
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    /// Parent node (None for the root and for detached nodes).
    pub parent: Option<NodeId>,
    /// First child.
    pub first_child: Option<NodeId>,
    /// Last child.
    pub last_child: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Node payload.
    pub data: NodeData,
}

impl Node {
    fn detached(data: NodeData) -> Self {
        Node {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }
}

/// An arena-based tree of elements and text runs.
///
/// The root node always has id 0. Trees are built programmatically:
///
/// ```
/// use textmark::tree::Document;
///
/// let mut doc = Document::new();
/// let p = doc.append_element(doc.root(), "p");
/// doc.append_text(p, "Lorem ipsum dolor");
/// assert_eq!(doc.text_content(doc.root()), "Lorem ipsum dolor");
/// ```
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Document {
            nodes: vec![Node::detached(NodeData::Root)],
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Total number of nodes ever allocated, including detached ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Get a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::detached(data));
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text<S: Into<String>>(&mut self, content: S) -> NodeId {
        self.alloc(NodeData::Text(content.into()))
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.create_element(name);
        self.append_child(parent, id);
        id
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text<S: Into<String>>(&mut self, parent: NodeId, content: S) -> NodeId {
        let id = self.create_text(content);
        self.append_child(parent, id);
        id
    }

    /// True if the node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    /// True if the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element(_))
    }

    /// Text content of a text node, or None for other kinds.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Replace the content of a text node.
    pub fn set_text(&mut self, id: NodeId, content: String) -> Result<()> {
        match &mut self.node_mut(id).data {
            NodeData::Text(t) => {
                *t = content;
                Ok(())
            }
            _ => Err(TextmarkError::tree(format!("node {id} is not a text node"))),
        }
    }

    /// Element payload of a node, or None for non-elements.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Element payload, mutable.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Tag name of an element node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Attribute lookup on an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attributes.get(name))
            .map(|v| v.as_str())
    }

    /// Set an attribute on an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        match self.element_mut(id) {
            Some(e) => {
                e.attributes.insert(name.to_string(), value.to_string());
                Ok(())
            }
            None => Err(TextmarkError::tree(format!("node {id} is not an element"))),
        }
    }

    /// True if an element's `class` attribute contains the given class.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// True if `ancestor` lies on `node`'s parent chain (strictly above it).
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.node(node).parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.node(p).parent;
        }
        false
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        let prev = self.node(parent).last_child;
        self.node_mut(child).parent = Some(parent);
        self.node_mut(child).prev_sibling = prev;
        self.node_mut(child).next_sibling = None;
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert a detached node immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        let parent = self
            .node(reference)
            .parent
            .expect("reference node must be attached");
        let prev = self.node(reference).prev_sibling;
        self.node_mut(new).parent = Some(parent);
        self.node_mut(new).prev_sibling = prev;
        self.node_mut(new).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new);
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(new),
            None => self.node_mut(parent).first_child = Some(new),
        }
    }

    /// Insert a detached node immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        let parent = self
            .node(reference)
            .parent
            .expect("reference node must be attached");
        let next = self.node(reference).next_sibling;
        self.node_mut(new).parent = Some(parent);
        self.node_mut(new).prev_sibling = Some(reference);
        self.node_mut(new).next_sibling = next;
        self.node_mut(reference).next_sibling = Some(new);
        match next {
            Some(n) => self.node_mut(n).prev_sibling = Some(new),
            None => self.node_mut(parent).last_child = Some(new),
        }
    }

    /// Detach a node from its parent. The node and its subtree stay alive in
    /// the arena but are no longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        let Some(parent) = parent else { return };
        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }

    /// Split a text node at `offset` (bytes). The original node keeps
    /// `[0, offset)`; a new text node holding `[offset, len)` is inserted
    /// right after it and returned.
    ///
    /// `offset` must lie on a char boundary strictly inside the text.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let tail = match &mut self.node_mut(id).data {
            NodeData::Text(t) => {
                if offset == 0 || offset >= t.len() || !t.is_char_boundary(offset) {
                    return Err(TextmarkError::tree(format!(
                        "invalid split offset {offset} for text node {id}"
                    )));
                }
                t.split_off(offset)
            }
            _ => return Err(TextmarkError::tree(format!("node {id} is not a text node"))),
        };
        let new = self.create_text(tail);
        self.insert_after(id, new);
        Ok(new)
    }

    /// Replace an element with its own children, preserving order. The
    /// element itself is detached.
    pub fn replace_with_children(&mut self, id: NodeId) {
        let mut child = self.node(id).first_child;
        let mut anchor = id;
        while let Some(c) = child {
            let next = self.node(c).next_sibling;
            // take c out of id's child list
            self.node_mut(c).parent = None;
            self.node_mut(c).prev_sibling = None;
            self.node_mut(c).next_sibling = None;
            self.insert_after(anchor, c);
            anchor = c;
            child = next;
        }
        self.node_mut(id).first_child = None;
        self.node_mut(id).last_child = None;
        self.detach(id);
    }

    /// Merge adjacent text-node siblings throughout the subtree rooted at
    /// `root`. Empty text nodes are removed. Worklist-based, handles very
    /// large sibling runs without recursion.
    pub fn normalize(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let mut child = self.node(id).first_child;
            while let Some(c) = child {
                let next = self.node(c).next_sibling;
                if self.is_text(c) {
                    if self.text(c).is_some_and(|t| t.is_empty()) {
                        self.detach(c);
                    } else if let Some(n) = next {
                        if self.is_text(n) {
                            let merged = {
                                let mut s = self.text(c).unwrap_or_default().to_string();
                                s.push_str(self.text(n).unwrap_or_default());
                                s
                            };
                            let _ = self.set_text(c, merged);
                            self.detach(n);
                            // re-examine c against its new next sibling
                            child = Some(c);
                            continue;
                        }
                    }
                } else {
                    stack.push(c);
                }
                child = next;
            }
        }
    }

    /// Flattened text of the subtree rooted at `id`, in document order.
    /// Sub-document content counts once it has been integrated into the tree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(t) = self.text(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Iterate the subtree below `id` in document order (excluding `id`
    /// itself). Uses an explicit stack.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = Vec::new();
        let mut child = self.node(id).last_child;
        while let Some(c) = child {
            stack.push(c);
            child = self.node(c).prev_sibling;
        }
        Descendants { doc: self, stack }
    }

    /// Adopt another document's content under `parent`, remapping node ids
    /// into this arena. Returns nothing; the foreign document is consumed.
    pub fn adopt(&mut self, other: Document, parent: NodeId) {
        // (foreign id, target parent in self)
        let mut work: Vec<(NodeId, NodeId)> = Vec::new();
        let mut other = other;
        let mut child = other.node(other.root()).first_child;
        let mut ordered = Vec::new();
        while let Some(c) = child {
            ordered.push(c);
            child = other.node(c).next_sibling;
        }
        for c in ordered {
            work.push((c, parent));
        }
        let mut queue = std::collections::VecDeque::from(work);
        while let Some((foreign, target)) = queue.pop_front() {
            let data = std::mem::replace(&mut other.node_mut(foreign).data, NodeData::Root);
            let new = self.alloc(data);
            self.append_child(target, new);
            let mut c = other.node(foreign).first_child;
            while let Some(fc) = c {
                queue.push_back((fc, new));
                c = other.node(fc).next_sibling;
            }
        }
    }
}

/// Document-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let mut child = self.doc.node(id).last_child;
        while let Some(c) = child {
            self.stack.push(c);
            child = self.doc.node(c).prev_sibling;
        }
        Some(id)
    }
}
