//! Listener wiring for resolved handlers and bindings.

use std::rc::Rc;

use ornate_core::{Invocation, ScopeChain, evaluate_with};
use ornate_dom::{DomNode, Event};
use ornate_template::{EventHandler, ModelBinding, VisibilityCheck};

/// Events that push an element's state into its model binding.
pub const MODEL_EVENTS: &[&str] = &["change", "keyup"];

/// Listener name for an `on*` attribute: `onclick` listens for `click`.
pub fn event_kind(attribute: &str) -> &str {
    attribute.strip_prefix("on").unwrap_or(attribute)
}

/// Runs the element's model binding, then `handler`, on every `kind` event.
pub fn wire_handler(el: &DomNode, kind: &str, handler: EventHandler) {
    el.add_event_listener(kind, move |event, node| {
        node.run_binding("model", Some(event));
        handler.invoke(event.to_value(), node.to_value());
    });
}

/// Inline `on*` markup attributes evaluate with the element itself as the
/// scope.
pub fn wire_inline(el: &DomNode, kind: &str, source: &str) {
    let source: Rc<str> = Rc::from(source);
    el.add_event_listener(kind, move |event, node| {
        node.run_binding("model", Some(event));
        let invocation = Invocation {
            event: event.to_value(),
            element: node.to_value(),
        };
        evaluate_with(&source, &ScopeChain::new(node.to_value()), &invocation);
    });
}

/// Retains `binding` on the element and feeds it from change and keyup
/// events.
pub fn wire_model(el: &DomNode, binding: ModelBinding) {
    el.set_binding("model", Rc::new(move |node: &DomNode, _event: Option<&Event>| binding.update(node)));
    for kind in MODEL_EVENTS {
        el.add_event_listener(kind, |_event, node| {
            node.run_binding("model", None);
        });
    }
}

/// Retains `check` as the element's `show` binding.
pub fn wire_show(el: &DomNode, check: VisibilityCheck) {
    el.set_binding("show", Rc::new(move |node: &DomNode, _event: Option<&Event>| {
        check.apply(node);
    }));
}

/// Dispatches a bubbling `kind` event at `el`. Returns the number of
/// listeners run.
pub fn fire(el: &DomNode, kind: &str) -> usize {
    el.dispatch_event(&Event::new(kind))
}
