use std::rc::Rc;

use ornate_core::{Value, diagnostic};
use ornate_dom::DomNode;
use ornate_template::{AttrValue, Element, ModelBinding, Node, Processor};
use tracing::trace;

use crate::events;
use crate::visibility::VisibilityTicker;

/// Materializes resolved trees into host nodes.
#[derive(Debug, Clone)]
pub struct Renderer {
    show_marker: String,
    ticker: Rc<VisibilityTicker>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Processor::default().prefix(), Rc::new(VisibilityTicker::new()))
    }
}

impl Renderer {
    pub fn new(prefix: &str, ticker: Rc<VisibilityTicker>) -> Self {
        Self {
            show_marker: format!("{prefix}show"),
            ticker,
        }
    }

    pub fn ticker(&self) -> &Rc<VisibilityTicker> {
        &self.ticker
    }

    /// Renders `node` into `target` and returns the node created for it.
    ///
    /// Text under an `option` becomes the option's label. Elements render
    /// their children before they are inserted; a `position` places the
    /// element at that child offset of `target`.
    pub fn render(&self, node: &Node, target: &DomNode) -> Option<DomNode> {
        match node {
            Node::Pruned => None,
            Node::Text(text) => {
                if target.is_tag("option") {
                    target.set_text_content(&text.text);
                    return Some(target.clone());
                }
                let out = DomNode::text(&text.text);
                target.append_child(&out);
                Some(out)
            }
            Node::Element(el) => Some(self.render_element(el, target)),
        }
    }

    /// Renders each node in order.
    pub fn render_all(&self, nodes: &[Node], target: &DomNode) -> Vec<DomNode> {
        nodes.iter().filter_map(|n| self.render(n, target)).collect()
    }

    fn render_element(&self, el: &Element, target: &DomNode) -> DomNode {
        let out = DomNode::element(&el.tag);
        let mut model: Option<&ModelBinding> = None;
        let mut value: Option<&Value> = None;

        for attr in &el.attributes {
            let name = attr.name.as_str();
            match &attr.value {
                AttrValue::Consumed | AttrValue::Flag(false) => {}
                AttrValue::Flag(true) => out.set_attribute(name, "true"),
                AttrValue::Event(handler) => {
                    events::wire_handler(&out, events::event_kind(name), handler.clone());
                }
                AttrValue::Model(binding) => {
                    events::wire_model(&out, binding.clone());
                    model = Some(binding);
                }
                AttrValue::Show(check) => {
                    events::wire_show(&out, check.clone());
                    out.set_attribute(&self.show_marker, "");
                    self.ticker.register(&out);
                }
                AttrValue::Literal(source) if is_inline_handler(name) => {
                    events::wire_inline(&out, events::event_kind(name), source);
                }
                AttrValue::Literal(literal) => out.set_attribute(name, literal),
                AttrValue::Data(data) if name == "value" => value = Some(data),
                AttrValue::Data(data) => apply_data(&out, name, data),
            }
        }

        for child in el.children.iter().flatten() {
            self.render(child, &out);
        }

        // select values need the options in place
        if let Some(data) = value {
            apply_data(&out, "value", data);
        }
        if let Some(binding) = model {
            binding.sync(&out);
        }
        out.run_binding("show", None);

        match el.position {
            Some(position) => target.insert_at(position, &out),
            None => target.append_child(&out),
        }
        trace!(tag = %el.tag, position = ?el.position, "rendered element");
        out
    }
}

fn is_inline_handler(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

/// Resolved directive values: functions are called with the element,
/// `value` becomes the element value, other non-primitives become
/// properties and everything else a markup attribute.
fn apply_data(out: &DomNode, name: &str, value: &Value) {
    let value = match value {
        Value::Function(f) => match f.call(&out.to_value(), &[out.to_value()]) {
            Ok(v) => v,
            Err(err) => {
                diagnostic!(attribute = name, error = %err, "attribute function failed");
                return;
            }
        },
        v => v.clone(),
    };
    if value.is_nullish() {
        return;
    }
    if name == "value" {
        out.set_value(&value.to_string());
    } else if value.is_primitive() {
        out.set_attribute(name, &value.to_string());
    } else {
        out.set_property(name, value);
    }
}
