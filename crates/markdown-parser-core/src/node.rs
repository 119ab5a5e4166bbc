//! # Node model — the typed document tree
//!
//! The tree is an arena: [`Tree`] owns every [`Node`] and hands out
//! [`NodeId`] handles. Nodes are mutable (attributes, children) only
//! while their id sits on the dispatcher's open stack; once a
//! recognizer's `close` fires, nothing outside this module touches
//! them again except to read.
//!
//! Per-recognizer transient state (`content_end`, `left_b`, ...) does
//! NOT live on `Node` — see [`crate::dispatcher::OpenFrame`]. That
//! keeps scratch state off the permanent tree by construction rather
//! than by remembering to delete fields.

use crate::position::Position;

/// Index into [`Tree`]. Cheap to copy, stable for the lifetime of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// The node taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The sentinel root, always named `#document`.
    Document,
    /// Inline literal text run.
    Text,
    /// An escaped/named entity atom; writers decide rendering.
    Entity,
    /// Named, may have children; attributes ordered by insertion.
    Element,
    /// Self-closing; never has children.
    Void,
    /// Element whose body is opaque text until the matching close tag.
    RawText,
    Comment,
    CData,
    DocumentType,
    /// `target` is stored in `name` (with its leading `?`), `data` holds
    /// the instruction body.
    ProcessingInstruction,
}

/// Ordered attribute value. Most attributes are plain text; `_alref` is
/// the one shortcut (`[ref]`) that accumulates a list instead of
/// overwriting.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    AlRefs(Vec<(Position, String)>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::AlRefs(_) => None,
        }
    }
}

/// Insertion-ordered attribute map. Redeclaring a key overwrites the
/// value but keeps its original position (spec invariant 2 only
/// requires order among distinct keys; overwriting a dup in place is
/// the natural effect of "the new value wins").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    order: Vec<String>,
    values: std::collections::HashMap<String, AttrValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    /// Insert/overwrite a plain text attribute. Returns `true` if `key`
    /// already existed (caller logs `E160`).
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let existed = self.values.contains_key(&key);
        if !existed {
            self.order.push(key.clone());
        }
        self.values.insert(key, AttrValue::Text(value.into()));
        existed
    }

    /// Append to `class`, space-joined, per the `.cls` shortcut.
    pub fn append_class(&mut self, cls: &str) {
        match self.values.get_mut("class") {
            Some(AttrValue::Text(existing)) => {
                existing.push(' ');
                existing.push_str(cls);
            }
            _ => {
                self.order.push("class".to_string());
                self.values
                    .insert("class".to_string(), AttrValue::Text(cls.to_string()));
            }
        }
    }

    /// Append to the `_alref` list, per the `[ref]` shortcut.
    pub fn push_alref(&mut self, pos: Position, reference: String) {
        match self.values.get_mut("_alref") {
            Some(AttrValue::AlRefs(list)) => list.push((pos, reference)),
            _ => {
                self.order.push("_alref".to_string());
                self.values
                    .insert("_alref".to_string(), AttrValue::AlRefs(vec![(pos, reference)]));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.order
            .iter()
            .map(move |k| (k.as_str(), self.values.get(k).unwrap()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Renames every key added since the map had `from_len` entries by
    /// prefixing it with `prefix`, keeping insertion order. Used by
    /// the list-item recognizer to namespace `[...]`/`{...}` attribute
    /// blocks (spec-supplemented `__`/`_` prefix convention).
    pub fn rename_tail(&mut self, from_len: usize, prefix: &str) {
        for key in self.order.iter_mut().skip(from_len) {
            if let Some(value) = self.values.remove(key) {
                let renamed = format!("{prefix}{key}");
                self.values.insert(renamed.clone(), value);
                *key = renamed;
            }
        }
    }
}

/// A single node in the tree. The `kind` discriminant decides which of
/// `name`/`data` is meaningful; see field docs.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Element/Void/RawText tag name; ProcessingInstruction target
    /// (with leading `?`); empty for Text/Entity/Comment/CData/DocumentType.
    pub name: String,
    /// Text/Entity literal content; Comment/CData/DocumentType data;
    /// RawText verbatim body. Empty for Element/Void/ProcessingInstruction
    /// (PI body lives here too, actually — see `ProcessingInstruction`).
    pub data: String,
    pub attrs: AttributeMap,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub pos: Position,
}

impl Node {
    pub fn is_element_like(&self) -> bool {
        matches!(self.kind, NodeKind::Element | NodeKind::Void | NodeKind::RawText)
    }
}

/// Arena owning every node produced during a parse.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Allocate a node with no parent yet; the dispatcher links it in
    /// once it knows which frame is current.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Append `child` to `parent`'s children and set `child.parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(data: &str) -> Node {
        Node {
            kind: NodeKind::Text,
            name: String::new(),
            data: data.to_string(),
            attrs: AttributeMap::new(),
            children: Vec::new(),
            parent: None,
            pos: Position::default(),
        }
    }

    #[test]
    fn append_child_links_parent() {
        let mut tree = Tree::new();
        let root = tree.alloc(text_node(""));
        let child = tree.alloc(text_node("hi"));
        tree.append_child(root, child);
        assert_eq!(tree.node(child).parent, Some(root));
        assert_eq!(tree.node(root).children, vec![child]);
    }

    #[test]
    fn attribute_order_preserved_across_overwrite() {
        let mut attrs = AttributeMap::new();
        attrs.set_text("b", "1");
        attrs.set_text("a", "2");
        let existed = attrs.set_text("b", "3");
        assert!(existed);
        let order: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(attrs.get_text("b"), Some("3"));
    }

    #[test]
    fn alref_accumulates() {
        let mut attrs = AttributeMap::new();
        attrs.push_alref(Position::new(1, 1), "a".into());
        attrs.push_alref(Position::new(1, 5), "b".into());
        match attrs.get("_alref") {
            Some(AttrValue::AlRefs(v)) => assert_eq!(v.len(), 2),
            _ => panic!("expected AlRefs"),
        }
    }
}
