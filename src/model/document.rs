//! Owned SVG document tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Child-index path from the root element to a node.
pub type NodePath = Vec<usize>;

/// A parsed SVG document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgDocument {
    /// Comments, processing instructions and DOCTYPE before the root
    pub prolog: Vec<Node>,

    /// The document element
    pub root: Element,

    /// Whether the source was gzip-compressed
    pub compressed: bool,
}

impl SvgDocument {
    /// Create a document around a root element.
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            compressed: false,
        }
    }

    /// Resolve a child-index path to an element.
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path {
            match current.children.get(index)? {
                Node::Element(el) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Mutable variant of [`SvgDocument::element_at`].
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path {
            match current.children.get_mut(index)? {
                Node::Element(el) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Find the first element with the given `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.root.find(&|el: &Element| el.attr("id") == Some(id))
    }

    /// Total number of elements, root included.
    pub fn element_count(&self) -> usize {
        self.root.descendant_count() + 1
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Node {
    Element(Element),
    /// Character data, unescaped
    Text(String),
    CData(String),
    /// Comment body, raw
    Comment(String),
    /// Processing instruction body, raw
    ProcessingInstruction(String),
    /// DOCTYPE body, raw
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Whitespace-only character data.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

/// An element with its attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Qualified name as written, e.g. `text` or `sodipodi:namedview`
    pub name: String,

    /// Attributes, unescaped, in document order
    pub attributes: IndexMap<String, String>,

    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Namespace prefix of the tag, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(p, _)| p)
    }

    /// Tag name without prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// SVG tag name, or `None` for foreign elements such as
    /// `sodipodi:namedview`. Unprefixed and `svg:` names count as SVG.
    pub fn svg_name(&self) -> Option<&str> {
        match self.prefix() {
            None | Some("svg") => Some(self.local_name()),
            Some(_) => None,
        }
    }

    /// `href`, falling back to `xlink:href`.
    pub fn href(&self) -> Option<&str> {
        self.attr("href").or_else(|| self.attr("xlink:href"))
    }

    /// Child elements, skipping character data and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Whether no child other than whitespace remains.
    pub fn is_effectively_empty(&self) -> bool {
        self.children
            .iter()
            .all(|c| c.is_blank_text() || matches!(c, Node::Comment(_)))
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
                _ => {}
            }
        }
    }

    /// Depth-first search, self included.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|el| el.find(pred))
    }

    /// Number of descendant elements.
    pub fn descendant_count(&self) -> usize {
        self.child_elements()
            .map(|el| 1 + el.descendant_count())
            .sum()
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}
