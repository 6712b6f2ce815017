//! Conversion of host nodes into structural [`Node`] trees.

use std::collections::HashMap;

use ornate_dom::{DomNode, NodeKind, parse_fragment};
use tracing::trace;

use crate::node::{Attribute, Element, Node, Text};
use crate::processor::DEFAULT_PREFIX;

/// Builds structural trees from markup or live nodes.
///
/// Elements carrying the `module` directive are built once per module name;
/// later occurrences reuse the first build. `style` elements are detached
/// from their markup and collected so the caller can append them after the
/// rendered content; the tree keeps an empty `style` placeholder.
#[derive(Debug)]
pub struct TreeBuilder {
    module_attr: String,
    modules: HashMap<String, Node>,
    styles: Vec<DomNode>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl TreeBuilder {
    pub fn new(prefix: &str) -> Self {
        Self {
            module_attr: format!("{prefix}module"),
            modules: HashMap::new(),
            styles: Vec::new(),
        }
    }

    pub fn build_markup(&mut self, markup: &str) -> Vec<Node> {
        parse_fragment(markup)
            .iter()
            .filter_map(|node| self.build_node(node, false))
            .collect()
    }

    /// Builds the children of `root`, leaving `root` itself out.
    pub fn build_element(&mut self, root: &DomNode) -> Vec<Node> {
        root.children()
            .iter()
            .filter_map(|node| self.build_node(node, false))
            .collect()
    }

    /// Returns `None` for nodes that have no structural counterpart
    /// (comments).
    pub fn build_node(&mut self, node: &DomNode, in_module: bool) -> Option<Node> {
        let tag = match node.kind() {
            NodeKind::Comment(_) => return None,
            NodeKind::Text(text) => return Some(Node::Text(Text { text })),
            NodeKind::Element(tag) => tag,
        };

        if tag == "style" {
            node.detach();
            self.styles.push(node.clone());
            return Some(Node::Element(Element::new("style")));
        }

        if !in_module {
            if let Some(name) = node.attribute(&self.module_attr) {
                if let Some(cached) = self.modules.get(&name) {
                    trace!(module = %name, "reusing module build");
                    return Some(cached.clone());
                }
                let built = self.build_node(node, true)?;
                self.modules.insert(name, built.clone());
                return Some(built);
            }
        }

        let mut el = Element::new(&tag);
        for (name, value) in node.attributes() {
            el.attributes.push(Attribute::literal(&name, &value));
        }
        el.children = node
            .children()
            .iter()
            .map(|child| self.build_node(child, false))
            .collect();
        Some(Node::Element(el))
    }

    pub fn module(&self, name: &str) -> Option<&Node> {
        self.modules.get(name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Drains the `style` elements collected since the last call.
    pub fn take_styles(&mut self) -> Vec<DomNode> {
        std::mem::take(&mut self.styles)
    }
}
