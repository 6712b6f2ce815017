//! In-memory host presentation tree: elements, text and comments with
//! attributes, properties, retained bindings and event listeners.

pub mod document;
pub mod event;
pub mod html;
pub mod node;
pub mod parse;

pub use document::Document;
pub use event::Event;
pub use node::{Binding, DomNode, Listener, NodeKind};
pub use parse::parse_fragment;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching closing tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Shorthand for building elements in tests and host code.
pub fn h(tag: &str, attrs: &[(&str, &str)], children: Vec<DomNode>) -> DomNode {
    let el = DomNode::element(tag);
    for (k, v) in attrs {
        el.set_attribute(k, v);
    }
    for child in &children {
        el.append_child(child);
    }
    el
}

pub fn text(t: &str) -> DomNode {
    DomNode::text(t)
}
