use std::collections::BTreeMap;
use std::fmt;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextNode {
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementNode {
    pub tag_name: String,
    pub attributes: ElementAttributes,
    pub children: ElementChildren,
}

pub type ElementChildren = Vec<Node>;
pub type ElementAttributes = BTreeMap<String, String>;

impl Node {
    pub fn element(tag_name: &str, children: ElementChildren) -> Node {
        Node::Element(ElementNode::new(tag_name).with_children(children))
    }

    pub fn text(content: &str) -> Node {
        Node::Text(TextNode {
            content: content.to_owned(),
        })
    }

    /// Whitespace-only text nodes carry no structure.
    pub fn is_significant(&self) -> bool {
        match self {
            Node::Element(_) => true,
            Node::Text(text) => !text.content.trim().is_empty(),
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }
}

impl ElementNode {
    pub fn new(tag_name: &str) -> ElementNode {
        ElementNode {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: ElementAttributes::new(),
            children: ElementChildren::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> ElementNode {
        self.attributes.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn with_children(mut self, children: ElementChildren) -> ElementNode {
        self.children = children;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag_name.as_str())
    }

    pub fn significant_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|child| child.is_significant())
    }

    /// Every element below this one, depth-first in document order.
    pub fn descendants(&self) -> Vec<&ElementNode> {
        let mut found = Vec::new();
        self.collect_descendants(&mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, found: &mut Vec<&'a ElementNode>) {
        for child in &self.children {
            if let Node::Element(element) = child {
                found.push(element);
                element.collect_descendants(found);
            }
        }
    }

    /// This element and its descendants whose `id` attribute equals `id`.
    pub fn elements_by_id(&self, id: &str) -> Vec<&ElementNode> {
        std::iter::once(self)
            .chain(self.descendants())
            .filter(|element| element.id() == Some(id))
            .collect()
    }

    pub fn text(&self) -> String {
        let mut content = String::new();
        self.collect_text(&mut content);
        content
    }

    fn collect_text(&self, content: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => content.push_str(&text.content),
                Node::Element(element) => element.collect_text(content),
            }
        }
    }
}

fn escape(value: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(value.len());

    for char in value.chars() {
        match char {
            '&' => escaped.push_str("&amp;"),
            '<' if !in_attribute => escaped.push_str("&lt;"),
            '>' if !in_attribute => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            '\u{a0}' => escaped.push_str("&nbsp;"),
            _ => escaped.push(char),
        }
    }

    escaped
}

impl fmt::Display for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape(&self.content, false))
    }
}

impl fmt::Display for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name)?;

        for (key, value) in &self.attributes {
            if value.is_empty() {
                write!(f, " {}", key)?;
            } else {
                write!(f, " {}=\"{}\"", key, escape(value, true))?;
            }
        }

        f.write_str(">")?;

        if self.is_void() {
            return Ok(());
        }

        for child in &self.children {
            write!(f, "{}", child)?;
        }

        write!(f, "</{}>", self.tag_name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => element.fmt(f),
            Node::Text(text) => text.fmt(f),
        }
    }
}
