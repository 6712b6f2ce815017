use std::sync::LazyLock;

use ornate_core::{ScopeChain, Value, diagnostic, evaluate};
use ornate_style::{compose_class, compose_style};
use regex::{Captures, Regex};
use tracing::trace;

use crate::handlers::{EventHandler, ModelBinding, ModelKind, VisibilityCheck};
use crate::node::{AttrValue, Attribute, Element, Node};
use crate::repeat;

pub const DEFAULT_PREFIX: &str = "orn-";

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("interpolation pattern"));

/// Replaces every `{{ expr }}` in `text` with the string form of its value.
pub fn interpolate(text: &str, chain: &ScopeChain) -> String {
    if !text.contains("{{") {
        return text.to_string();
    }
    INTERPOLATION
        .replace_all(text, |caps: &Captures<'_>| evaluate(&caps[1], chain).to_string())
        .into_owned()
}

/// Directive names, without the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive<'a> {
    Module,
    On(&'a str),
    Show,
    Model,
    Class,
    Style,
    If,
    InputState(&'a str),
    Generic(&'a str),
}

impl<'a> Directive<'a> {
    fn classify(name: &'a str) -> Self {
        match name {
            "module" => Directive::Module,
            "show" => Directive::Show,
            "model" => Directive::Model,
            "class" => Directive::Class,
            "style" => Directive::Style,
            "if" => Directive::If,
            "checked" | "selected" | "disabled" => Directive::InputState(name),
            n if n.starts_with("on") => Directive::On(n),
            n => Directive::Generic(n),
        }
    }
}

/// Walks a structural tree resolving directive attributes against a scope
/// chain.
#[derive(Debug, Clone)]
pub struct Processor {
    prefix: String,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Processor {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn directive_name<'a>(&self, attr: &'a Attribute) -> Option<&'a str> {
        if !attr.value.is_literal() {
            return None;
        }
        attr.name.strip_prefix(self.prefix.as_str())
    }

    /// Processes a list of top-level nodes as siblings of one implicit
    /// container, so top-level repeats and conditionals behave like nested
    /// ones.
    pub fn process_roots(&self, roots: Vec<Node>, chain: &ScopeChain) -> Vec<Node> {
        let mut slots: Vec<Option<Node>> = roots.into_iter().map(Some).collect();
        self.process_children(&mut slots, chain);
        slots.into_iter().flatten().collect()
    }

    /// Resolves `node` in place of `siblings[index]`.
    ///
    /// Returns `None` when the node vanished: it was expanded by a repeat
    /// (the clones are appended to `siblings`) or pruned by a falsy
    /// conditional while inside a container. A pruned node without a
    /// container comes back as [`Node::Pruned`].
    pub fn process(
        &self,
        node: Node,
        siblings: Option<&mut Vec<Option<Node>>>,
        index: usize,
        chain: &ScopeChain,
    ) -> Option<Node> {
        match node {
            Node::Pruned => Some(Node::Pruned),
            Node::Text(mut text) => {
                text.text = interpolate(&text.text, chain);
                Some(Node::Text(text))
            }
            Node::Element(el) => self.process_element(el, siblings, index, chain),
        }
    }

    fn process_element(
        &self,
        mut el: Element,
        siblings: Option<&mut Vec<Option<Node>>>,
        index: usize,
        chain: &ScopeChain,
    ) -> Option<Node> {
        if el.tag.is_empty() {
            diagnostic!(index, "skipping element without a tag");
            return None;
        }

        if let Some(pos) = el
            .attributes
            .iter()
            .position(|a| self.directive_name(a) == Some("repeat"))
        {
            let Some(siblings) = siblings else {
                diagnostic!(tag = %el.tag, "repeat directive needs a container");
                return None;
            };
            repeat::expand(self, el, pos, siblings, index, chain);
            return None;
        }

        let mut i = 0;
        while i < el.attributes.len() {
            let Some(name) = self.directive_name(&el.attributes[i]) else {
                i += 1;
                continue;
            };
            let name = name.to_string();
            let source = el.attributes[i]
                .value
                .as_literal()
                .unwrap_or_default()
                .to_string();
            trace!(directive = %name, tag = %el.tag, "applying directive");

            match Directive::classify(&name) {
                Directive::Module => {}
                Directive::On(event) => {
                    el.attributes[i] = Attribute {
                        name: event.to_string(),
                        value: AttrValue::Event(EventHandler::new(&source, chain.clone())),
                    };
                }
                Directive::Show => {
                    el.attributes[i] = Attribute {
                        name: "show".to_string(),
                        value: AttrValue::Show(VisibilityCheck::new(&source, chain.clone())),
                    };
                }
                Directive::Model => {
                    let kind = model_kind(&el);
                    el.attributes[i] = Attribute {
                        name: "model".to_string(),
                        value: AttrValue::Model(ModelBinding::new(&source, chain.clone(), kind)),
                    };
                }
                Directive::Class => {
                    let value = evaluate(&source, chain);
                    el.attributes[i].value = AttrValue::Consumed;
                    let existing = take_plain(&mut el, "class");
                    set_plain(&mut el, "class", compose_class(&existing, &value, chain));
                }
                Directive::Style => {
                    let value = evaluate(&source, chain);
                    el.attributes[i].value = AttrValue::Consumed;
                    let existing = take_plain(&mut el, "style");
                    set_plain(&mut el, "style", compose_style(&existing, &value));
                }
                Directive::If => {
                    el.attributes[i].value = AttrValue::Consumed;
                    if !evaluate(&source, chain).is_truthy() {
                        return match siblings {
                            Some(siblings) => {
                                if let Some(slot) = siblings.get_mut(index) {
                                    *slot = None;
                                }
                                None
                            }
                            None => Some(Node::Pruned),
                        };
                    }
                }
                Directive::InputState(state) => {
                    el.attributes[i] = if evaluate(&source, chain).is_truthy() {
                        Attribute {
                            name: state.to_string(),
                            value: AttrValue::Flag(true),
                        }
                    } else {
                        Attribute {
                            name: el.attributes[i].name.clone(),
                            value: AttrValue::Consumed,
                        }
                    };
                }
                Directive::Generic(bare) => {
                    let value = evaluate(&source, chain);
                    let value = if value.is_truthy() {
                        value
                    } else {
                        Value::from("")
                    };
                    el.attributes[i] = Attribute {
                        name: bare.to_string(),
                        value: AttrValue::Data(value),
                    };
                }
            }
            i += 1;
        }

        self.process_children(&mut el.children, chain);
        Some(Node::Element(el))
    }

    /// Children present before processing are visited in order; clones a
    /// repeat appends are already resolved and are not revisited.
    pub(crate) fn process_children(&self, children: &mut Vec<Option<Node>>, chain: &ScopeChain) {
        let len = children.len();
        for i in 0..len {
            let Some(child) = children[i].take() else {
                continue;
            };
            if let Some(done) = self.process(child, Some(children), i, chain) {
                children[i] = Some(done);
            }
        }
    }
}

fn model_kind(el: &Element) -> ModelKind {
    if el.tag == "select" {
        return ModelKind::Select;
    }
    match el
        .literal("type")
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("checkbox") => ModelKind::Toggle { radio: false },
        Some("radio") => ModelKind::Toggle { radio: true },
        _ => ModelKind::Text,
    }
}

/// Current text of a plain attribute, for composition.
fn take_plain(el: &mut Element, name: &str) -> String {
    match el.attribute(name).map(|a| &a.value) {
        Some(AttrValue::Literal(s)) => s.clone(),
        Some(AttrValue::Data(v)) if !v.is_nullish() => v.to_string(),
        _ => String::new(),
    }
}

fn set_plain(el: &mut Element, name: &str, value: String) {
    match el.attribute_mut(name) {
        Some(attr) => attr.value = AttrValue::Literal(value),
        None => el.attributes.push(Attribute {
            name: name.to_string(),
            value: AttrValue::Literal(value),
        }),
    }
}
