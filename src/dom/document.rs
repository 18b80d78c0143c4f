use std::collections::HashMap;

use crate::dom::dom_model::{DomSnapshot, NodeRect, RawNode};

/// Opaque handle to a node in one `DomDocument`.
///
/// Handles are only meaningful against the document that produced them and
/// never cross a serialization boundary; snapshot types carry derived
/// metadata instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A child frame discovered while building the document: the hosting iframe
/// node, the frame's own snapshot, and the iframe's frame-local rect.
#[derive(Debug, Clone)]
pub struct ChildFrame {
    pub host: NodeId,
    pub snapshot: DomSnapshot,
    pub rect: NodeRect,
}

#[derive(Debug, Clone)]
struct StoredNode {
    tag: String,
    attrs: HashMap<String, String>,
    text: Option<String>,
    value: Option<String>,
    rect: NodeRect,
    visible: bool,
    topmost: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    in_shadow: bool,
}

/// Arena-backed view of one frame's DOM snapshot.
///
/// Nodes are stored in document order (preorder), so iterating ids in
/// ascending order visits the tree the way a tree walker would. Shadow
/// content is flattened into the arena at its host position and flagged
/// `in_shadow`.
#[derive(Debug, Clone)]
pub struct DomDocument {
    url: Option<String>,
    title: String,
    nodes: Vec<StoredNode>,
    child_frames: Vec<ChildFrame>,
}

impl DomDocument {
    /// Build the arena from a raw snapshot with an explicit worklist
    /// (no recursion through the visitor).
    pub fn from_snapshot(snapshot: DomSnapshot) -> Self {
        let mut doc = DomDocument {
            url: snapshot.url,
            title: snapshot.title,
            nodes: Vec::new(),
            child_frames: Vec::new(),
        };

        // (node, parent, in_shadow)
        let mut stack: Vec<(RawNode, Option<NodeId>, bool)> = vec![(snapshot.root, None, false)];

        while let Some((raw, parent, in_shadow)) = stack.pop() {
            let id = NodeId(doc.nodes.len());

            if let Some(frame) = raw.frame_snapshot {
                doc.child_frames.push(ChildFrame {
                    host: id,
                    snapshot: *frame,
                    rect: raw.rect,
                });
            }

            doc.nodes.push(StoredNode {
                tag: raw.tag.to_ascii_lowercase(),
                attrs: raw.attrs,
                text: raw.text,
                value: raw.value,
                rect: raw.rect,
                visible: raw.visible,
                topmost: raw.topmost,
                parent,
                children: Vec::new(),
                in_shadow,
            });

            if let Some(p) = parent {
                doc.nodes[p.0].children.push(id);
            }

            // Reverse push so the pop order is shadow content first, then
            // light children, both in document order.
            for child in raw.children.into_iter().rev() {
                stack.push((child, Some(id), in_shadow));
            }
            for child in raw.shadow_children.into_iter().rev() {
                stack.push((child, Some(id), true));
            }
        }

        doc
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn child_frames(&self) -> &[ChildFrame] {
        &self.child_frames
    }

    /// All node ids in document order.
    pub fn all_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Ids of the subtree rooted at `id` (inclusive), document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for child in self.nodes[n.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attrs.get(name).map(|s| s.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.nodes[id.0].attrs.contains_key(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.0].attrs.insert(name.to_string(), value.to_string());
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].value.as_deref()
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        self.nodes[id.0].value = Some(value.to_string());
    }

    pub fn rect(&self, id: NodeId) -> NodeRect {
        self.nodes[id.0].rect
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes[id.0].visible
    }

    pub fn is_topmost(&self, id: NodeId) -> bool {
        self.nodes[id.0].topmost
    }

    pub fn in_shadow(&self, id: NodeId) -> bool {
        self.nodes[id.0].in_shadow
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Walk ancestors from the parent upward.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p.0].parent;
        }
        out
    }

    /// Siblings before `id` under its parent, nearest first.
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes[id.0].parent else {
            return Vec::new();
        };
        let siblings = &self.nodes[parent.0].children;
        let pos = match siblings.iter().position(|s| *s == id) {
            Some(p) => p,
            None => return Vec::new(),
        };
        siblings[..pos].iter().rev().copied().collect()
    }

    /// Whether `ancestor` contains `id` (strictly above it).
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p.0].parent;
        }
        false
    }

    /// First node with `attrs[name] == value`, document order.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.all_nodes()
            .find(|id| self.attr(*id, name) == Some(value))
    }

    /// Concatenated trimmed text of the subtree rooted at `id`.
    pub fn deep_text(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        for n in self.descendants(id) {
            if let Some(t) = self.text(n) {
                let t = t.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
        }
        parts.join(" ")
    }
}
