//! Resolved directive payloads: event handlers, two-way model bindings and
//! visibility checks. Each captures the expression source and the scope
//! chain in effect where the directive was processed.

use std::rc::Rc;

use ornate_core::{Invocation, ScopeChain, Value, assign, diagnostic, evaluate, evaluate_with};
use ornate_dom::DomNode;

#[derive(Clone)]
pub struct EventHandler {
    source: Rc<str>,
    chain: ScopeChain,
}

impl EventHandler {
    pub fn new(source: &str, chain: ScopeChain) -> Self {
        Self {
            source: Rc::from(source.trim()),
            chain,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runs the handler with `event` and `element` bound.
    pub fn invoke(&self, event: Value, element: Value) -> Value {
        evaluate_with(&self.source, &self.chain, &Invocation { event, element })
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }
}

/// How a model binding reads its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// `checkbox` or `radio` inputs.
    Toggle { radio: bool },
    Select,
    Text,
}

#[derive(Clone)]
pub struct ModelBinding {
    target: Rc<str>,
    chain: ScopeChain,
    kind: ModelKind,
}

impl ModelBinding {
    pub fn new(target: &str, chain: ScopeChain, kind: ModelKind) -> Self {
        Self {
            target: Rc::from(target.trim()),
            chain,
            kind,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn current(&self) -> Value {
        evaluate(&self.target, &self.chain)
    }

    /// Copies the element's state into the bound place.
    ///
    /// Array models collect values: toggles add their value once when
    /// checked and remove it when unchecked, text inputs add a value not yet
    /// present. Other models are overwritten.
    pub fn update(&self, el: &DomNode) {
        let current = self.current();
        let next = match self.kind {
            ModelKind::Toggle { radio } => {
                let value = Value::from(el.value());
                if let Value::Array(items) = &current {
                    let pos = items.borrow().iter().position(|v| v.strict_equals(&value));
                    match (el.checked(), pos) {
                        (true, None) => items.borrow_mut().push(value),
                        (false, Some(i)) => {
                            items.borrow_mut().remove(i);
                        }
                        _ => {}
                    }
                    current.clone()
                } else if el.checked() {
                    value
                } else if !radio {
                    Value::from("")
                } else {
                    current.clone()
                }
            }
            ModelKind::Select => {
                if el.multiple() {
                    let selected = el
                        .options()
                        .iter()
                        .filter(|o| o.selected())
                        .map(|o| {
                            let v = o.value();
                            Value::from(if v.is_empty() { o.text_content() } else { v })
                        })
                        .collect();
                    Value::array(selected)
                } else {
                    Value::from(el.value())
                }
            }
            ModelKind::Text => {
                let value = Value::from(el.value());
                if let Value::Array(items) = &current {
                    if !items.borrow().iter().any(|v| v.strict_equals(&value)) {
                        items.borrow_mut().push(value);
                    }
                    current.clone()
                } else {
                    value
                }
            }
        };
        if let Err(err) = assign(&self.target, &self.chain, next) {
            diagnostic!(model = %self.target, error = %err, "model binding could not store value");
        }
    }

    /// Writes the bound value into the element.
    pub fn sync(&self, el: &DomNode) {
        let current = self.current();
        match self.kind {
            ModelKind::Toggle { radio } => {
                let own = Value::from(el.value());
                let checked = match &current {
                    Value::Array(items) => items.borrow().iter().any(|v| v.strict_equals(&own)),
                    Value::Bool(b) if !radio => *b,
                    other => !other.is_nullish() && other.loose_equals(&own),
                };
                el.set_checked(checked);
            }
            ModelKind::Select => match &current {
                Value::Array(items) if el.multiple() => {
                    let wanted: Vec<String> = items.borrow().iter().map(Value::to_string).collect();
                    for option in el.options() {
                        option.set_selected(wanted.contains(&option.value()));
                    }
                }
                v if !v.is_nullish() => el.set_value(&v.to_string()),
                _ => {}
            },
            ModelKind::Text => {
                if !current.is_nullish() && !matches!(current, Value::Array(_)) {
                    el.set_value(&current.to_string());
                }
            }
        }
    }
}

impl PartialEq for ModelBinding {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.target, &other.target)
    }
}

#[derive(Clone)]
pub struct VisibilityCheck {
    source: Rc<str>,
    chain: ScopeChain,
}

impl VisibilityCheck {
    pub fn new(source: &str, chain: ScopeChain) -> Self {
        Self {
            source: Rc::from(source.trim()),
            chain,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_visible(&self) -> bool {
        evaluate(&self.source, &self.chain).is_truthy()
    }

    /// Hides the element with `display: none` or clears the override.
    /// Returns the visibility that was applied.
    pub fn apply(&self, el: &DomNode) -> bool {
        let visible = self.is_visible();
        if visible {
            el.remove_style_property("display");
        } else {
            el.set_style_property("display", "none");
        }
        visible
    }
}

impl PartialEq for VisibilityCheck {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }
}
