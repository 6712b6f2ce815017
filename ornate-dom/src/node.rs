use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use ornate_core::{HostObject, Value};
use ornate_style::StyleDeclarations;

use crate::event::Event;
use crate::{html, parse};

/// Event callback. Receives the event and the element it is registered on.
pub type Listener = Rc<dyn Fn(&Event, &DomNode)>;
/// Named function retained on an element (`model`, `show`).
pub type Binding = Rc<dyn Fn(&DomNode, Option<&Event>)>;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(String),
    Text(String),
    Comment(String),
}

struct NodeData {
    kind: NodeKind,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, Value>,
    bindings: HashMap<String, Binding>,
    listeners: Vec<(String, Listener)>,
    children: Vec<DomNode>,
    parent: Weak<RefCell<NodeData>>,
}

/// Shared handle to a node of the host tree. Cloning aliases the node.
#[derive(Clone)]
pub struct DomNode(Rc<RefCell<NodeData>>);

/// Non-owning handle, used by pollers that must not keep elements alive.
#[derive(Clone)]
pub struct WeakDomNode(Weak<RefCell<NodeData>>);

impl WeakDomNode {
    pub fn upgrade(&self) -> Option<DomNode> {
        self.0.upgrade().map(DomNode)
    }
}

impl DomNode {
    fn new(kind: NodeKind) -> Self {
        DomNode(Rc::new(RefCell::new(NodeData {
            kind,
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            bindings: HashMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    pub fn element(tag: &str) -> Self {
        Self::new(NodeKind::Element(tag.to_ascii_lowercase()))
    }

    pub fn text(text: &str) -> Self {
        Self::new(NodeKind::Text(text.to_string()))
    }

    pub fn comment(text: &str) -> Self {
        Self::new(NodeKind::Comment(text.to_string()))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind.clone()
    }

    /// `#text`, `#comment`, or the lower-cased tag name.
    pub fn node_name(&self) -> String {
        match &self.0.borrow().kind {
            NodeKind::Element(tag) => tag.clone(),
            NodeKind::Text(_) => "#text".to_string(),
            NodeKind::Comment(_) => "#comment".to_string(),
        }
    }

    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element(tag) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        matches!(&self.0.borrow().kind, NodeKind::Element(t) if t == tag)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Text(_))
    }

    /// Payload of a text or comment node.
    pub fn data(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => Some(t.clone()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn set_data(&self, data: &str) {
        if let NodeKind::Text(t) | NodeKind::Comment(t) = &mut self.0.borrow_mut().kind {
            *t = data.to_string();
        }
    }

    pub fn ptr_eq(&self, other: &DomNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakDomNode {
        WeakDomNode(Rc::downgrade(&self.0))
    }

    // --- attributes ---

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.borrow().attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.borrow().attributes.contains_key(name)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .borrow_mut()
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.0.borrow_mut().attributes.shift_remove(name)
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // --- properties ---

    /// A property previously assigned with `set_property`.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.borrow().properties.get(name).cloned()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        self.0
            .borrow_mut()
            .properties
            .insert(name.to_string(), value);
    }

    pub fn value(&self) -> String {
        if let Some(v) = self.property("value") {
            return if v.is_nullish() { String::new() } else { v.to_string() };
        }
        match self.tag().as_deref() {
            Some("option") => self
                .attribute("value")
                .unwrap_or_else(|| self.text_content().trim().to_string()),
            Some("textarea") => self.text_content(),
            Some("select") => {
                let options = self.options();
                options
                    .iter()
                    .find(|o| o.selected())
                    .or(options.first())
                    .map(DomNode::value)
                    .unwrap_or_default()
            }
            Some("input") => self.attribute("value").unwrap_or_else(|| {
                match self.input_type().as_str() {
                    "checkbox" | "radio" => "on".to_string(),
                    _ => String::new(),
                }
            }),
            _ => self.attribute("value").unwrap_or_default(),
        }
    }

    /// Selects the matching option on a `select`; sets the value property
    /// elsewhere.
    pub fn set_value(&self, value: &str) {
        if self.is_tag("select") {
            for option in self.options() {
                option.set_selected(option.value() == value);
            }
            return;
        }
        self.set_property("value", Value::from(value));
    }

    pub fn checked(&self) -> bool {
        self.property("checked")
            .map_or_else(|| self.has_attribute("checked"), |v| v.is_truthy())
    }

    pub fn set_checked(&self, checked: bool) {
        self.set_property("checked", Value::Bool(checked));
    }

    pub fn selected(&self) -> bool {
        self.property("selected")
            .map_or_else(|| self.has_attribute("selected"), |v| v.is_truthy())
    }

    pub fn set_selected(&self, selected: bool) {
        self.set_property("selected", Value::Bool(selected));
    }

    pub fn multiple(&self) -> bool {
        self.has_attribute("multiple")
    }

    /// Lower-cased `type` attribute; `text` for inputs without one.
    pub fn input_type(&self) -> String {
        match self.attribute("type") {
            Some(t) => t.to_ascii_lowercase(),
            None if self.is_tag("input") => "text".to_string(),
            None => String::new(),
        }
    }

    pub fn options(&self) -> Vec<DomNode> {
        self.elements_by_tag("option")
    }

    // --- inline style ---

    pub fn style(&self) -> StyleDeclarations {
        StyleDeclarations::parse(&self.attribute("style").unwrap_or_default())
    }

    pub fn set_style_property(&self, property: &str, value: &str) {
        let mut style = self.style();
        style.set(property, value);
        self.set_attribute("style", &style.to_string());
    }

    pub fn remove_style_property(&self, property: &str) {
        if !self.has_attribute("style") {
            return;
        }
        let mut style = self.style();
        if style.remove(property).is_some() {
            self.set_attribute("style", &style.to_string());
        }
    }

    // --- bindings and events ---

    pub fn set_binding(&self, name: &str, binding: Binding) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.to_string(), binding);
    }

    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.0.borrow().bindings.get(name).cloned()
    }

    /// Runs a retained binding. Returns false when none is set.
    pub fn run_binding(&self, name: &str, event: Option<&Event>) -> bool {
        // cloned out so the binding may freely touch this node
        match self.binding(name) {
            Some(binding) => {
                binding(self, event);
                true
            }
            None => false,
        }
    }

    pub fn add_event_listener<F>(&self, kind: &str, listener: F)
    where
        F: Fn(&Event, &DomNode) + 'static,
    {
        self.0
            .borrow_mut()
            .listeners
            .push((kind.to_string(), Rc::new(listener)));
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.0
            .borrow()
            .listeners
            .iter()
            .filter(|(k, _)| k == kind)
            .count()
    }

    /// Invokes listeners for `event` on this node, then on its ancestors if
    /// the event bubbles. Returns the number of listeners invoked.
    pub fn dispatch_event(&self, event: &Event) -> usize {
        let event = event.with_target(self);
        let mut invoked = 0;
        let mut current = Some(self.clone());
        while let Some(node) = current {
            let listeners: Vec<Listener> = node
                .0
                .borrow()
                .listeners
                .iter()
                .filter(|(k, _)| k == event.kind())
                .map(|(_, l)| Rc::clone(l))
                .collect();
            for listener in listeners {
                listener(&event, &node);
                invoked += 1;
            }
            if !event.bubbles() {
                break;
            }
            current = node.parent();
        }
        invoked
    }

    // --- tree ---

    pub fn parent(&self) -> Option<DomNode> {
        self.0.borrow().parent.upgrade().map(DomNode)
    }

    pub fn children(&self) -> Vec<DomNode> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn child(&self, index: usize) -> Option<DomNode> {
        self.0.borrow().children.get(index).cloned()
    }

    pub fn first_child(&self) -> Option<DomNode> {
        self.child(0)
    }

    pub fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .0
            .borrow_mut()
            .children
            .retain(|c| !c.ptr_eq(self));
        self.0.borrow_mut().parent = Weak::new();
    }

    pub fn append_child(&self, child: &DomNode) {
        let len = self.child_count();
        self.insert_at(len, child);
    }

    /// Inserts at `index`, appending when the index is past the end.
    pub fn insert_at(&self, index: usize, child: &DomNode) {
        debug_assert!(!child.ptr_eq(self), "a node cannot contain itself");
        child.detach();
        {
            let mut data = self.0.borrow_mut();
            let index = index.min(data.children.len());
            data.children.insert(index, child.clone());
        }
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
    }

    pub fn insert_before(&self, child: &DomNode, reference: Option<&DomNode>) {
        let index = reference
            .and_then(|r| self.0.borrow().children.iter().position(|c| c.ptr_eq(r)))
            .unwrap_or(usize::MAX);
        self.insert_at(index, child);
    }

    pub fn remove_child(&self, child: &DomNode) -> bool {
        if child.parent().is_some_and(|p| p.ptr_eq(self)) {
            child.detach();
            true
        } else {
            false
        }
    }

    pub fn clear_children(&self) {
        let children = std::mem::take(&mut self.0.borrow_mut().children);
        for child in children {
            child.0.borrow_mut().parent = Weak::new();
        }
    }

    pub fn text_content(&self) -> String {
        match &self.0.borrow().kind {
            NodeKind::Text(t) => return t.clone(),
            NodeKind::Comment(_) => return String::new(),
            NodeKind::Element(_) => {}
        }
        self.children()
            .iter()
            .filter(|c| !matches!(c.kind(), NodeKind::Comment(_)))
            .map(DomNode::text_content)
            .collect()
    }

    pub fn set_text_content(&self, text: &str) {
        if !self.is_element() {
            self.set_data(text);
            return;
        }
        self.clear_children();
        if !text.is_empty() {
            self.append_child(&DomNode::text(text));
        }
    }

    /// All descendants in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<DomNode> {
        let mut out = Vec::new();
        fn walk(node: &DomNode, out: &mut Vec<DomNode>) {
            for child in node.children() {
                out.push(child.clone());
                walk(&child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    pub fn find_all<F>(&self, pred: F) -> Vec<DomNode>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.descendants().into_iter().filter(|n| pred(n)).collect()
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<DomNode> {
        self.find_all(|n| n.is_tag(tag))
    }

    pub fn set_inner_html(&self, markup: &str) {
        self.clear_children();
        for node in parse::parse_fragment(markup) {
            self.append_child(&node);
        }
    }

    pub fn inner_html(&self) -> String {
        html::serialize_children(self)
    }

    pub fn outer_html(&self) -> String {
        html::serialize(self)
    }

    /// Exposes the node to expressions as a host object.
    pub fn to_value(&self) -> Value {
        Value::host(ElementHandle(self.clone()))
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomNode({})", self.outer_html())
    }
}

const REFLECTED: &[&str] = &["name", "href", "src", "title", "placeholder", "alt", "for", "lang"];

struct ElementHandle(DomNode);

impl HostObject for ElementHandle {
    fn type_name(&self) -> &str {
        "Element"
    }

    fn get(&self, key: &str) -> Value {
        let node = &self.0;
        if let Some(v) = node.property(key).filter(|_| !matches!(key, "value" | "checked" | "selected")) {
            return v;
        }
        match key {
            "value" => Value::from(node.value()),
            "checked" => Value::Bool(node.checked()),
            "selected" => Value::Bool(node.selected()),
            "multiple" => Value::Bool(node.multiple()),
            "disabled" => Value::Bool(node.has_attribute("disabled")),
            "type" => Value::from(node.input_type()),
            "tagName" | "nodeName" => Value::from(node.node_name().to_ascii_uppercase()),
            "id" => Value::from(node.attribute("id").unwrap_or_default()),
            "className" => Value::from(node.attribute("class").unwrap_or_default()),
            "textContent" | "innerText" | "text" => Value::from(node.text_content()),
            "innerHTML" => Value::from(node.inner_html()),
            "options" => Value::array(node.options().iter().map(DomNode::to_value).collect()),
            "children" => Value::array(
                node.children()
                    .iter()
                    .filter(|c| c.is_element())
                    .map(DomNode::to_value)
                    .collect(),
            ),
            "parentNode" | "parentElement" => node.parent().map_or(Value::Null, |p| p.to_value()),
            k if REFLECTED.contains(&k) => Value::from(node.attribute(k).unwrap_or_default()),
            _ => Value::Undefined,
        }
    }

    fn set(&self, key: &str, value: Value) -> bool {
        let node = &self.0;
        match key {
            "value" => node.set_value(&value.to_string()),
            "checked" => node.set_checked(value.is_truthy()),
            "selected" => node.set_selected(value.is_truthy()),
            "textContent" | "innerText" | "text" => node.set_text_content(&value.to_string()),
            "innerHTML" => node.set_inner_html(&value.to_string()),
            "id" => node.set_attribute("id", &value.to_string()),
            "className" => node.set_attribute("class", &value.to_string()),
            "disabled" => {
                if value.is_truthy() {
                    node.set_attribute("disabled", "");
                } else {
                    node.remove_attribute("disabled");
                }
            }
            _ => node.set_property(key, value),
        }
        true
    }
}
