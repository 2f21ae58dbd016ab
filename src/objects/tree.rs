//! Arena-backed XML tree.
//!
//! Every node lives in a single `Vec` owned by the [`Document`] and is
//! addressed by a [`NodeId`]. Children are stored as ordered id lists, so the
//! tree has no back-pointers and no shared ownership.
//!
//! Character data follows the text/tail model: an element's `text` is the
//! data before its first child, and a node's `tail` is the data between its
//! end and the next sibling (or the parent's closing tag).

/// Stable handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A qualified element or attribute name as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Namespace prefix, `None` for unprefixed names
    pub prefix: Option<String>,
    /// Local part of the name
    pub local: String,
}

impl QName {
    /// Splits a raw `prefix:local` name.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self {
                prefix: None,
                local: raw.to_string(),
            },
        }
    }

    /// Builds a name with an optional prefix; an empty prefix means none.
    pub fn new(prefix: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            local: local.into(),
        }
    }

    /// Returns the name as it appears in markup.
    pub fn as_raw(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute in source order. Namespace declarations are kept as ordinary
/// attributes so they are re-emitted where they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Raw attribute name (e.g. `ID`, `xmlns:foxml`)
    pub name: String,
    /// Unescaped value
    pub value: String,
}

impl Attribute {
    /// If this attribute declares a namespace, returns `(prefix, uri)`.
    /// The default namespace is reported with an empty prefix.
    pub fn namespace_declaration(&self) -> Option<(&str, &str)> {
        if self.name == "xmlns" {
            Some(("", self.value.as_str()))
        } else {
            self.name
                .strip_prefix("xmlns:")
                .map(|prefix| (prefix, self.value.as_str()))
        }
    }
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Name as written
    pub name: QName,
    /// Resolved namespace URI, if any
    pub namespace: Option<String>,
    /// Attributes in source order
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Creates an element without attributes.
    pub fn new(name: QName, namespace: Option<String>) -> Self {
        Self {
            name,
            namespace,
            attributes: Vec::new(),
        }
    }

    /// Returns the value of an attribute by raw name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Returns true if this element has the given namespace and local name.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.name.local == local
    }
}

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element
    Element(Element),
    /// A comment (`<!--...-->`), content without delimiters
    Comment(String),
    /// A processing instruction (`<?...?>`), content without delimiters
    ProcessingInstruction(String),
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// What this node is
    pub kind: NodeKind,
    /// Child nodes in document order (elements only)
    pub children: Vec<NodeId>,
    /// Character data before the first child
    pub text: Option<String>,
    /// Character data after this node's end
    pub tail: Option<String>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            text: None,
            tail: None,
        }
    }

    /// Returns the element payload if this node is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable variant of [`Node::as_element`].
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// A parsed XML document: the root element and its exclusively owned subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Creates a document holding only a root element.
    pub fn new(root: Element) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Element(root))],
            root: NodeId(0),
        }
    }

    /// Returns the root element's id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty (never the case for a built document).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns a mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Returns the element payload of a node, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).as_element()
    }

    /// Returns the mutable element payload of a node, if it is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.node_mut(id).as_element_mut()
    }

    /// Returns the children of a node in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Appends a new node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Appends a new element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.append(parent, NodeKind::Element(element))
    }

    /// Iterates the subtree under `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Returns the element children of `id` that match a namespace and local name.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).iter().copied().filter(move |child| {
            self.element(*child)
                .map(|e| e.is(namespace, local))
                .unwrap_or(false)
        })
    }

    /// Returns the path of ids from the root down to `target`, inclusive.
    pub fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![self.root];
        if self.path_from(self.root, target, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn path_from(&self, current: NodeId, target: NodeId, path: &mut Vec<NodeId>) -> bool {
        if current == target {
            return true;
        }
        for &child in self.children(current) {
            path.push(child);
            if self.path_from(child, target, path) {
                return true;
            }
            path.pop();
        }
        false
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(raw: &str) -> Element {
        Element::new(QName::parse(raw), Some("urn:test".to_string()))
    }

    #[test]
    fn test_qname_parse() {
        let q = QName::parse("foxml:datastream");
        assert_eq!(q.prefix.as_deref(), Some("foxml"));
        assert_eq!(q.local, "datastream");
        assert_eq!(q.as_raw(), "foxml:datastream");

        let q = QName::parse("datastream");
        assert_eq!(q.prefix, None);
        assert_eq!(q.as_raw(), "datastream");

        assert_eq!(QName::new(Some(""), "x").prefix, None);
    }

    #[test]
    fn test_namespace_declaration() {
        let default = Attribute {
            name: "xmlns".to_string(),
            value: "urn:a".to_string(),
        };
        let prefixed = Attribute {
            name: "xmlns:rdf".to_string(),
            value: "urn:rdf".to_string(),
        };
        let plain = Attribute {
            name: "ID".to_string(),
            value: "OBJ".to_string(),
        };
        assert_eq!(default.namespace_declaration(), Some(("", "urn:a")));
        assert_eq!(prefixed.namespace_declaration(), Some(("rdf", "urn:rdf")));
        assert_eq!(plain.namespace_declaration(), None);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut doc = Document::new(element("root"));
        let root = doc.root();
        let a = doc.append_element(root, element("a"));
        let a1 = doc.append_element(a, element("a1"));
        let b = doc.append_element(root, element("b"));

        let order: Vec<_> = doc.descendants(root).collect();
        assert_eq!(order, vec![a, a1, b]);
        assert_eq!(doc.path_to(a1), Some(vec![root, a, a1]));
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_set_attribute_keeps_order() {
        let mut e = element("v");
        e.set_attribute("ID", "X.0");
        e.set_attribute("LABEL", "x");
        e.set_attribute("ID", "X.1");
        assert_eq!(e.attributes[0].name, "ID");
        assert_eq!(e.attribute("ID"), Some("X.1"));
        assert_eq!(e.attributes.len(), 2);
    }
}
