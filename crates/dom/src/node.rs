//! Cheap-clone handles over live DOM nodes.
//!
//! The pipeline only ever reads the tree; ownership stays with the embedding
//! page. Handles are `Arc`-backed, parents are held weakly so detached
//! subtrees drop naturally, and handle equality is pointer identity.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element { tag: String },
    Text { content: String },
    ShadowRoot,
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    attributes: RwLock<BTreeMap<String, String>>,
    children: RwLock<Vec<DomNode>>,
    parent: RwLock<Weak<NodeRecord>>,
    shadow_root: RwLock<Option<DomNode>>,
    // set on shadow roots only, pointing back at the hosting element
    host: RwLock<Weak<NodeRecord>>,
}

#[derive(Clone, Debug)]
pub struct DomNode {
    record: Arc<NodeRecord>,
}

impl DomNode {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            record: Arc::new(NodeRecord {
                kind,
                attributes: RwLock::new(BTreeMap::new()),
                children: RwLock::new(Vec::new()),
                parent: RwLock::new(Weak::new()),
                shadow_root: RwLock::new(None),
                host: RwLock::new(Weak::new()),
            }),
        }
    }

    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element { tag: tag.into() })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text {
            content: content.into(),
        })
    }

    /// Builder-style attribute assignment for constructing trees in tests.
    pub fn with_attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child attachment.
    pub fn with_child(self, child: DomNode) -> Self {
        self.append_child(child);
        self
    }

    pub fn append_child(&self, child: DomNode) {
        *child.record.parent.write() = Arc::downgrade(&self.record);
        self.record.children.write().push(child);
    }

    /// Attach a shadow root to this element and return it.
    pub fn attach_shadow(&self) -> DomNode {
        let root = Self::with_kind(NodeKind::ShadowRoot);
        *root.record.host.write() = Arc::downgrade(&self.record);
        *self.record.shadow_root.write() = Some(root.clone());
        root
    }

    pub fn kind(&self) -> NodeKind {
        self.record.kind.clone()
    }

    pub fn is_element(&self) -> bool {
        matches!(self.record.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.record.kind, NodeKind::Text { .. })
    }

    pub fn is_shadow_root(&self) -> bool {
        matches!(self.record.kind, NodeKind::ShadowRoot)
    }

    pub fn is_document(&self) -> bool {
        matches!(self.record.kind, NodeKind::Document)
    }

    /// Lowercase tag name for element nodes.
    pub fn tag_name(&self) -> Option<String> {
        match &self.record.kind {
            NodeKind::Element { tag } => Some(tag.to_ascii_lowercase()),
            _ => None,
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    /// Text content of a text node.
    pub fn text_content(&self) -> Option<String> {
        match &self.record.kind {
            NodeKind::Text { content } => Some(content.clone()),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.record.attributes.read().get(name).cloned()
    }

    /// Snapshot of all attributes at call time.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.record.attributes.read().clone()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.record
            .attributes
            .write()
            .insert(name.into(), value.into());
    }

    pub fn parent(&self) -> Option<DomNode> {
        self.record
            .parent
            .read()
            .upgrade()
            .map(|record| DomNode { record })
    }

    pub fn children(&self) -> Vec<DomNode> {
        self.record.children.read().clone()
    }

    pub fn shadow_root(&self) -> Option<DomNode> {
        self.record.shadow_root.read().clone()
    }

    /// Hosting element of a shadow root.
    pub fn host(&self) -> Option<DomNode> {
        self.record
            .host
            .read()
            .upgrade()
            .map(|record| DomNode { record })
    }

    pub fn same_node(&self, other: &DomNode) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.attribute("class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_names().iter().any(|name| name == class)
    }

    /// Whether this is a form-field element (`input`/`select`/`textarea`).
    pub fn is_form_field(&self) -> bool {
        matches!(
            self.tag_name().as_deref(),
            Some("input") | Some("select") | Some("textarea")
        )
    }

    pub fn is_content_editable(&self) -> bool {
        self.attribute("contenteditable")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    /// 1-based position among element siblings, and among element siblings
    /// sharing the same tag. Text-node siblings are not counted. A node with
    /// no parent is its own first child.
    pub fn nth_position(&self) -> (u32, u32) {
        let Some(parent) = self.parent() else {
            return (1, 1);
        };
        let own_tag = self.tag_name();
        let mut nth_child = 1u32;
        let mut nth_of_type = 1u32;
        for sibling in parent.children() {
            if sibling.same_node(self) {
                break;
            }
            if sibling.is_element() {
                nth_child += 1;
                if sibling.tag_name() == own_tag {
                    nth_of_type += 1;
                }
            }
        }
        (nth_child, nth_of_type)
    }

    /// Direct text-node children, in document order.
    pub fn direct_text_chunks(&self) -> Vec<String> {
        self.children()
            .into_iter()
            .filter_map(|child| child.text_content())
            .collect()
    }

    /// Whether `ancestor` is this node or one of its ancestors, bridging out
    /// of shadow roots through their hosts.
    pub fn is_within(&self, ancestor: &DomNode) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.same_node(ancestor) {
                return true;
            }
            current = if node.is_shadow_root() {
                node.host()
            } else {
                node.parent()
            };
        }
        false
    }
}
