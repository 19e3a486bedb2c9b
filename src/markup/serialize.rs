//! Serialization of markup trees.
//!
//! HTML output is produced by html5ever through scraper, so escaping and
//! void elements follow the HTML serialization rules. Pretty printing only
//! adds whitespace text nodes before serializing. [`to_outline`] writes the
//! indented `tag#id.class` outline form.

use ego_tree::{NodeId, NodeRef, Tree};

use super::{text_node, Document, Element, Node};

const INDENT: &str = "  ";

/// Elements whose whitespace is significant; never reindented.
const PRESERVE: [&str; 4] = ["pre", "textarea", "script", "style"];

/// Serializes the document's root element as HTML.
///
/// In pretty mode every element whose content is only child elements (and
/// whitespace) places each child on its own indented line; mixed text
/// content is left untouched. Pretty output ends with a newline.
pub fn to_string(doc: &Document, pretty: bool) -> String {
    if !pretty {
        return doc.root().map(|root| root.html()).unwrap_or_default();
    }
    let mut indented = doc.clone();
    if let Some(root) = indented.root_id() {
        indent(&mut indented.html.tree, root, 0);
    }
    let mut out = indented.root().map(|root| root.html()).unwrap_or_default();
    out.push('\n');
    out
}

fn is_block(node: NodeRef<'_, scraper::Node>) -> bool {
    match node.value().as_element() {
        Some(el) if !PRESERVE.contains(&el.name()) => {}
        _ => return false,
    }
    let mut has_element = false;
    for child in node.children() {
        match child.value() {
            scraper::Node::Element(_) => has_element = true,
            scraper::Node::Text(t) if !t.text.trim().is_empty() => return false,
            _ => {}
        }
    }
    has_element
}

fn indent(tree: &mut Tree<scraper::Node>, id: NodeId, depth: usize) {
    let children: Vec<(NodeId, bool)> = match tree.get(id) {
        Some(node) if is_block(node) => node
            .children()
            .map(|child| (child.id(), child.value().is_element()))
            .collect(),
        _ => return,
    };

    let before_child = format!("\n{}", INDENT.repeat(depth + 1));
    for (child, is_element) in children {
        let Some(mut node) = tree.get_mut(child) else {
            continue;
        };
        if is_element {
            node.insert_before(text_node(&before_child));
            indent(tree, child, depth + 1);
        } else {
            node.detach();
        }
    }
    if let Some(mut node) = tree.get_mut(id) {
        node.append(text_node(&format!("\n{}", INDENT.repeat(depth))));
    }
}

/// Writes `root` as an indented outline, one element per line:
///
/// ```text
/// div#main.page(lang="en") Leading text
///   p Hello
///   br
///   | text after the br
/// ```
///
/// Text runs are whitespace-normalised. Text that follows a child element is
/// written as a `| ` line at the child's level.
pub fn to_outline(root: &Element) -> String {
    let mut lines = Vec::new();
    outline_element(root, 0, &mut lines);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn normalise(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn outline_element(el: &Element, depth: usize, lines: &mut Vec<String>) {
    let mut line = INDENT.repeat(depth);
    line.push_str(el.tag());
    if let Some(id) = el.attr("id").map(str::trim).filter(|id| !id.is_empty()) {
        line.push('#');
        line.push_str(id);
    }
    for class in el.classes() {
        line.push('.');
        line.push_str(class);
    }
    let others: Vec<String> = el
        .attrs()
        .iter()
        .filter(|(name, _)| name.as_str() != "id" && name.as_str() != "class")
        .map(|(name, value)| format!("{}=\"{}\"", name, value.replace('"', "\\\"")))
        .collect();
    if !others.is_empty() {
        line.push('(');
        line.push_str(&others.join(", "));
        line.push(')');
    }

    let leading: String = el
        .children()
        .iter()
        .map_while(|child| match child {
            Node::Text(text) => Some(text.as_str()),
            Node::Element(_) => None,
        })
        .collect();
    let leading = normalise(&leading);
    if !leading.is_empty() {
        line.push(' ');
        line.push_str(&leading);
    }
    lines.push(line);

    let mut seen_element = false;
    for child in el.children() {
        match child {
            Node::Element(inner) => {
                seen_element = true;
                outline_element(inner, depth + 1, lines);
            }
            Node::Text(text) if seen_element => {
                let text = normalise(text);
                if !text.is_empty() {
                    lines.push(format!("{}| {}", INDENT.repeat(depth + 1), text));
                }
            }
            Node::Text(_) => {}
        }
    }
}
