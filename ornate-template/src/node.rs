use std::fmt;

use ornate_core::Value;

use crate::handlers::{EventHandler, ModelBinding, VisibilityCheck};

/// Structural tree node produced by the builder and rewritten by the
/// directive processor.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
    /// Removed by a falsy conditional; renders nothing.
    Pruned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    /// A slot is `None` once a directive removed or replaced its node.
    pub children: Vec<Option<Node>>,
    /// Insertion offset among the rendered siblings, set on repeat clones.
    pub position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

/// Attribute payload. Markup attributes start as `Literal`; directives
/// rewrite them into one of the resolved forms exactly once.
#[derive(Clone, PartialEq)]
pub enum AttrValue {
    Literal(String),
    Flag(bool),
    Data(Value),
    Event(EventHandler),
    Model(ModelBinding),
    Show(VisibilityCheck),
    /// Directive applied; nothing left to render.
    Consumed,
}

impl AttrValue {
    pub fn is_literal(&self) -> bool {
        matches!(self, AttrValue::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Literal(s) => write!(f, "{s:?}"),
            AttrValue::Flag(b) => write!(f, "Flag({b})"),
            AttrValue::Data(v) => write!(f, "Data({v:?})"),
            AttrValue::Event(h) => write!(f, "Event({:?})", h.source()),
            AttrValue::Model(m) => write!(f, "Model({:?})", m.target()),
            AttrValue::Show(s) => write!(f, "Show({:?})", s.source()),
            AttrValue::Consumed => f.write_str("Consumed"),
        }
    }
}

impl Attribute {
    pub fn literal(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: AttrValue::Literal(value.to_string()),
        }
    }
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            position: None,
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(Attribute::literal(name, value));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Some(child));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    pub fn literal(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|a| a.value.as_literal())
    }

    /// Children that survived processing.
    pub fn live_children(&self) -> impl Iterator<Item = &Node> {
        self.children
            .iter()
            .flatten()
            .filter(|n| !matches!(n, Node::Pruned))
    }
}

impl Node {
    pub fn element(tag: &str) -> Element {
        Element::new(tag)
    }

    pub fn text(text: &str) -> Node {
        Node::Text(Text {
            text: text.to_string(),
        })
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    pub fn is_pruned(&self) -> bool {
        matches!(self, Node::Pruned)
    }

    pub fn position(&self) -> Option<usize> {
        self.as_element().and_then(|el| el.position)
    }

    pub fn set_position(&mut self, position: usize) {
        if let Node::Element(el) = self {
            el.position = Some(position);
        }
    }

    /// Indented outline used by the CLI `tree` command and in test failures.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        write_outline(self, 0, &mut out);
        out
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

fn write_outline(node: &Node, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match node {
        Node::Pruned => out.push_str(&format!("{pad}(pruned)\n")),
        Node::Text(t) => {
            if !t.text.trim().is_empty() {
                out.push_str(&format!("{pad}#text {:?}\n", t.text.trim()));
            }
        }
        Node::Element(el) => {
            out.push_str(&format!("{pad}<{}>", el.tag));
            for attr in &el.attributes {
                out.push_str(&format!(" {}={:?}", attr.name, attr.value));
            }
            if let Some(p) = el.position {
                out.push_str(&format!(" @{p}"));
            }
            out.push('\n');
            for child in el.children.iter().flatten() {
                write_outline(child, depth + 1, out);
            }
        }
    }
}
