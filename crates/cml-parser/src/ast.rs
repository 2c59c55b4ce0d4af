//! Tree model for CML documents.
//!
//! Nodes live in an arena owned by [`Document`] and refer to each other by
//! [`NodeId`]. Tag, content and attribute text is kept as the raw fragments
//! the parser collected; joining them is left to the serializer.

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One item of node content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    /// A single text fragment.
    Text(String),
    /// The fragments of one `{ ... }` text block.
    Lines(Vec<String>),
}

impl ContentItem {
    /// Concatenated text of this item.
    pub fn text(&self) -> String {
        match self {
            ContentItem::Text(text) => text.clone(),
            ContentItem::Lines(lines) => lines.concat(),
        }
    }
}

/// An attribute: tag fragments and content fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribute {
    pub tag: Vec<String>,
    pub content: Vec<String>,
}

impl Attribute {
    pub fn new(tag: Vec<String>, content: Vec<String>) -> Self {
        Self { tag, content }
    }

    pub fn tag_text(&self) -> String {
        self.tag.concat()
    }

    pub fn content_text(&self) -> String {
        self.content.concat()
    }
}

/// A tree element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub tag: Vec<String>,
    pub content: Vec<ContentItem>,
    pub attributes: Vec<Attribute>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn with_parent(tag: Vec<String>, parent: NodeId) -> Self {
        Self {
            tag,
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn tag_text(&self) -> String {
        self.tag.concat()
    }

    /// Concatenated text of every content item.
    pub fn content_text(&self) -> String {
        self.content.iter().map(ContentItem::text).collect()
    }

    /// First attribute whose joined tag, less surrounding whitespace, equals `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.tag_text().trim() == name)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Back-reference for navigation. The parent does not own anything
    /// through this; ownership runs from the document downwards.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A parsed CML document. Owns every node; the root is a synthetic element
/// with no tag or content that anchors top-level children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Append a new child under `parent` and return it.
    pub fn add_child(&mut self, parent: NodeId, tag: Vec<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::with_parent(tag, parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// First child of `parent` whose tag fragments equal `tag`.
    pub fn find_child(&self, parent: NodeId, tag: &[String]) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).tag == tag)
    }

    /// Index of the first attribute of `node` tagged `tag`, inserting an
    /// empty one at the end if there is none.
    pub fn attribute_or_insert(&mut self, node: NodeId, tag: Vec<String>) -> usize {
        let attributes = &mut self.nodes[node.0].attributes;
        if let Some(index) = attributes.iter().position(|a| a.tag == tag) {
            return index;
        }
        attributes.push(Attribute::new(tag, Vec::new()));
        attributes.len() - 1
    }

    /// Every node id, root first, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.node(id)
            .children
            .iter()
            .map(move |&child| (child, self.node(child)))
    }
}
