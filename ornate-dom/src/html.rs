use crate::node::{DomNode, NodeKind};
use crate::{is_raw_text, is_void};

pub fn serialize(node: &DomNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

pub fn serialize_children(node: &DomNode) -> String {
    let mut out = String::new();
    let raw = node.tag().is_some_and(|t| is_raw_text(&t) && t != "textarea" && t != "title");
    for child in node.children() {
        match child.kind() {
            NodeKind::Text(t) if raw => out.push_str(&t),
            _ => write_node(&child, &mut out),
        }
    }
    out
}

fn write_node(node: &DomNode, out: &mut String) {
    match node.kind() {
        NodeKind::Text(t) => out.push_str(&escape_text(&t)),
        NodeKind::Comment(c) => {
            out.push_str("<!--");
            out.push_str(&c);
            out.push_str("-->");
        }
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(&tag);
            for (name, value) in node.attributes() {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&escape_attr(&value));
                out.push('"');
            }
            out.push('>');
            if is_void(&tag) {
                return;
            }
            out.push_str(&serialize_children(node));
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\u{a0}', "&nbsp;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\u{a0}', "&nbsp;")
}
