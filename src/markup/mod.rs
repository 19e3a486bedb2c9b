//! Markup trees consumed by templates.
//!
//! Templates never parse markup text. A definition stores a plain owned
//! [`Element`] tree so it can be shared between threads; every apply pass
//! loads it into a [`Document`] backed by `scraper`, which provides the
//! structural-selector interface described by [`Markup`]: select by CSS
//! path, set attributes or text, replace or insert nodes, and serialize.

use ego_tree::{NodeId, Tree};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

pub mod serialize;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Errors signalled by the markup tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// The selector is well formed but no element matched it
    #[error("selector '{0}' matched no element")]
    NoMatch(String),

    /// The selector could not be parsed
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// The content cannot be placed where the selector points
    #[error("cannot place {0}")]
    InvalidContent(String),

    /// A tag or attribute name that cannot be written as markup
    #[error("invalid tag or attribute name '{0}'")]
    InvalidName(String),

    /// The document lost its root element
    #[error("document has no root element")]
    MissingRoot,
}

/// Checks that `name` can be used as a tag or attribute name.
///
/// # Errors
/// * `MarkupError::InvalidName` for empty names and names containing
///   whitespace, control characters, quotes, `<`, `>`, `/` or `=`
pub fn validate_name(name: &str) -> Result<(), MarkupError> {
    let invalid = name.is_empty()
        || name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        });
    if invalid {
        return Err(MarkupError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Parses a CSS selector, mapping scraper's error into [`MarkupError`].
pub fn parse_selector(path: &str) -> Result<Selector, MarkupError> {
    Selector::parse(path).map_err(|e| MarkupError::InvalidSelector {
        selector: path.to_string(),
        message: e.to_string(),
    })
}

/// A node of the tree: either an element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// Shorthand for a text node.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
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

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

/// An owned element with ordered attributes and children.
///
/// This is the form template definitions and markup inputs are kept in.
/// It carries no selector machinery of its own; [`Element::select`] and
/// [`Element::serialize`] go through a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: IndexMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with the given tag name.
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builds an element from shorthand such as `div#main.page`.
    ///
    /// The tag defaults to `div` when only an id or classes are given.
    ///
    /// # Errors
    /// * `MarkupError::InvalidSelector` if the shorthand has an empty part or
    ///   more than one id
    /// * `MarkupError::InvalidName` if the tag is not a valid name
    pub fn from_shorthand(shorthand: &str) -> Result<Self, MarkupError> {
        let invalid = |message: &str| MarkupError::InvalidSelector {
            selector: shorthand.to_string(),
            message: message.to_string(),
        };
        let markers: &[char] = &['#', '.'];

        let tag_end = shorthand.find(markers).unwrap_or(shorthand.len());
        let tag = match &shorthand[..tag_end] {
            "" => "div",
            tag => tag,
        };
        validate_name(tag)?;

        let mut el = Element::new(tag);
        let mut classes = Vec::new();
        let mut rest = &shorthand[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[marker.len_utf8()..];
            let end = body.find(markers).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return Err(invalid("empty id or class"));
            }
            if marker == '#' {
                if el.attr("id").is_some() {
                    return Err(invalid("more than one id"));
                }
                el.set_attribute("id", name);
            } else {
                classes.push(name);
            }
            rest = &body[end..];
        }
        if !classes.is_empty() {
            el.set_attribute("class", classes.join(" "));
        }
        Ok(el)
    }

    /// Adds (or overwrites) an attribute.
    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Appends a text node.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Appends a child node.
    pub fn with_child<N: Into<Node>>(mut self, child: N) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attrs(&self) -> &IndexMap<String, String> {
        &self.attrs
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Whitespace separated values of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// The text before the first child element, if any.
    pub fn text(&self) -> Option<&str> {
        match self.children.first() {
            Some(Node::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of the whole subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Copies of the elements matched by `path`, in document order. The
    /// element itself is a candidate.
    pub fn select(&self, path: &str) -> Result<Vec<Element>, MarkupError> {
        let doc = Document::from(self);
        Ok(doc.select(path)?.into_iter().map(to_owned_element).collect())
    }

    /// Serializes the element as HTML, see [`serialize::to_string`].
    pub fn serialize(&self, pretty: bool) -> String {
        Document::from(self).serialize(pretty)
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(inner) => collect_text(inner, out),
        }
    }
}

/// The structural-selector interface templates use to mutate a tree.
///
/// Mutating operations return the number of matched elements.
pub trait Markup: Clone {
    /// Elements matched by the CSS selector `path`, in document order.
    fn select(&self, path: &str) -> Result<Vec<ElementRef<'_>>, MarkupError>;

    /// Sets `attr` on each matched element; fails with
    /// [`MarkupError::NoMatch`] when nothing matches.
    fn set_attr(&mut self, path: &str, attr: &str, value: &str) -> Result<usize, MarkupError>;

    /// Sets the leading text of each matched element. Matching nothing is
    /// not an error.
    fn set_text(&mut self, path: &str, text: &str) -> Result<usize, MarkupError>;

    /// Replaces each matched element with a copy of `node`; fails with
    /// [`MarkupError::NoMatch`] when nothing matches.
    fn replace(&mut self, path: &str, node: &Node) -> Result<usize, MarkupError>;

    /// Makes a copy of `node` the content of each matched element; fails
    /// with [`MarkupError::NoMatch`] when nothing matches.
    fn insert(&mut self, path: &str, node: &Node) -> Result<usize, MarkupError>;

    fn serialize(&self, pretty: bool) -> String;
}

/// A mutable working tree backed by [`scraper::Html`].
///
/// The document is a fragment holding exactly one root element. Nodes
/// removed by `replace` or `insert` are detached and never reached again.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    pub fn new(root: &Element) -> Self {
        let mut html = Html::new_fragment();
        let fragment = html.tree.root().id();
        graft(&mut html.tree, fragment, &element_node(root), Some(root), false);
        Self { html }
    }

    pub fn root(&self) -> Result<ElementRef<'_>, MarkupError> {
        self.html
            .tree
            .root()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or(MarkupError::MissingRoot)
    }

    fn root_id(&self) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .children()
            .find(|node| node.value().is_element())
            .map(|node| node.id())
    }

    /// Copies the document back into an owned tree.
    pub fn to_element(&self) -> Result<Element, MarkupError> {
        self.root().map(to_owned_element)
    }

    fn matching(&self, path: &str) -> Result<Vec<NodeId>, MarkupError> {
        let selector = parse_selector(path)?;
        Ok(self
            .html
            .tree
            .root()
            .descendants()
            .filter(|node| ElementRef::wrap(*node).is_some_and(|el| selector.matches(&el)))
            .map(|node| node.id())
            .collect())
    }

    fn matching_some(&self, path: &str) -> Result<Vec<NodeId>, MarkupError> {
        let found = self.matching(path)?;
        if found.is_empty() {
            return Err(MarkupError::NoMatch(path.to_string()));
        }
        Ok(found)
    }

    fn tag_of(&self, id: NodeId) -> Option<&str> {
        self.html
            .tree
            .get(id)
            .and_then(|node| node.value().as_element())
            .map(|el| el.name())
    }

    fn reject_void(&self, id: NodeId, what: &str) -> Result<(), MarkupError> {
        match self.tag_of(id) {
            Some(tag) if is_void(tag) => Err(MarkupError::InvalidContent(format!(
                "{} inside the void element <{}>",
                what, tag
            ))),
            _ => Ok(()),
        }
    }

    fn is_root(&self, id: NodeId) -> bool {
        self.root_id() == Some(id)
    }
}

impl From<&Element> for Document {
    fn from(root: &Element) -> Self {
        Document::new(root)
    }
}

impl Markup for Document {
    fn select(&self, path: &str) -> Result<Vec<ElementRef<'_>>, MarkupError> {
        let found = self.matching(path)?;
        Ok(found
            .into_iter()
            .filter_map(|id| self.html.tree.get(id))
            .filter_map(ElementRef::wrap)
            .collect())
    }

    fn set_attr(&mut self, path: &str, attr: &str, value: &str) -> Result<usize, MarkupError> {
        validate_name(attr)?;
        let found = self.matching_some(path)?;
        for &id in &found {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                if let scraper::Node::Element(el) = node.value() {
                    *el = with_attribute(el, attr, value);
                }
            }
        }
        Ok(found.len())
    }

    fn set_text(&mut self, path: &str, text: &str) -> Result<usize, MarkupError> {
        let found = self.matching(path)?;
        for &id in &found {
            self.reject_void(id, "text")?;
            let leading: Vec<NodeId> = match self.html.tree.get(id) {
                Some(node) => node
                    .children()
                    .take_while(|child| child.value().is_text())
                    .map(|child| child.id())
                    .collect(),
                None => continue,
            };
            for child in leading {
                if let Some(mut child) = self.html.tree.get_mut(child) {
                    child.detach();
                }
            }
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.prepend(text_node(text));
            }
        }
        Ok(found.len())
    }

    fn replace(&mut self, path: &str, node: &Node) -> Result<usize, MarkupError> {
        let found = self.matching_some(path)?;
        let value = node_value(node);
        for &id in found.iter().rev() {
            if matches!(node, Node::Text(_)) && self.is_root(id) {
                return Err(MarkupError::InvalidContent(
                    "a text node in place of the root element".to_string(),
                ));
            }
            graft(&mut self.html.tree, id, &value, node.as_element(), true);
            if let Some(mut old) = self.html.tree.get_mut(id) {
                old.detach();
            }
        }
        Ok(found.len())
    }

    fn insert(&mut self, path: &str, node: &Node) -> Result<usize, MarkupError> {
        let found = self.matching_some(path)?;
        let value = node_value(node);
        for &id in found.iter().rev() {
            self.reject_void(id, "content")?;
            let children: Vec<NodeId> = match self.html.tree.get(id) {
                Some(target) => target.children().map(|child| child.id()).collect(),
                None => continue,
            };
            for child in children {
                if let Some(mut child) = self.html.tree.get_mut(child) {
                    child.detach();
                }
            }
            graft(&mut self.html.tree, id, &value, node.as_element(), false);
        }
        Ok(found.len())
    }

    fn serialize(&self, pretty: bool) -> String {
        serialize::to_string(self, pretty)
    }
}

fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: value.into(),
    }
}

fn element_node(el: &Element) -> scraper::Node {
    let attrs = el
        .attrs
        .iter()
        .map(|(name, value)| attribute(name, value))
        .collect();
    scraper::Node::Element(scraper::node::Element::new(html_name(&el.tag), attrs))
}

fn text_node(text: &str) -> scraper::Node {
    scraper::Node::Text(scraper::node::Text { text: text.into() })
}

fn node_value(node: &Node) -> scraper::Node {
    match node {
        Node::Element(el) => element_node(el),
        Node::Text(text) => text_node(text),
    }
}

// Rebuilt through `Element::new` so scraper's cached id and classes follow
// the new attributes.
fn with_attribute(el: &scraper::node::Element, attr: &str, value: &str) -> scraper::node::Element {
    let mut replaced = false;
    let mut attrs: Vec<Attribute> = el
        .attrs()
        .map(|(name, old)| {
            if name == attr {
                replaced = true;
                attribute(name, value)
            } else {
                attribute(name, old)
            }
        })
        .collect();
    if !replaced {
        attrs.push(attribute(attr, value));
    }
    scraper::node::Element::new(el.name.clone(), attrs)
}

/// Places `value` next to `anchor` (as its previous sibling when `before`,
/// else as its last child), then copies the children of `source` under it.
fn graft(
    tree: &mut Tree<scraper::Node>,
    anchor: NodeId,
    value: &scraper::Node,
    source: Option<&Element>,
    before: bool,
) {
    let id = match tree.get_mut(anchor) {
        Some(mut target) if before => target.insert_before(value.clone()).id(),
        Some(mut target) => target.append(value.clone()).id(),
        None => return,
    };
    if let Some(source) = source {
        for child in &source.children {
            graft(tree, id, &node_value(child), child.as_element(), false);
        }
    }
}

fn to_owned_element(el: ElementRef<'_>) -> Element {
    let value = el.value();
    let mut out = Element::new(value.name());
    for (name, attr) in value.attrs() {
        out.set_attribute(name, attr);
    }
    for child in el.children() {
        match child.value() {
            scraper::Node::Text(text) => out.append(Node::Text(text.text.to_string())),
            scraper::Node::Element(_) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    out.append(Node::Element(to_owned_element(inner)));
                }
            }
            _ => {}
        }
    }
    out
}
