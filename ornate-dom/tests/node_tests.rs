use std::cell::RefCell;
use std::rc::Rc;

use ornate_core::Value;
use ornate_dom::{DomNode, Document, Event, h, text};

#[test]
fn insert_at_places_children_by_offset() {
    let list = h("ul", &[], vec![h("li", &[], vec![text("a")]), h("li", &[], vec![text("c")])]);
    list.insert_at(1, &h("li", &[], vec![text("b")]));
    list.insert_at(99, &h("li", &[], vec![text("d")]));
    assert_eq!(list.text_content(), "abcd");
}

#[test]
fn appending_moves_a_node_between_parents() {
    let a = h("div", &[], vec![]);
    let b = h("div", &[], vec![]);
    let child = text("x");
    a.append_child(&child);
    b.append_child(&child);
    assert_eq!(a.child_count(), 0);
    assert_eq!(b.child_count(), 1);
    assert!(child.parent().is_some_and(|p| p.ptr_eq(&b)));
}

#[test]
fn events_bubble_to_ancestors() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let button = h("button", &[], vec![]);
    let form = h("form", &[], vec![button.clone()]);

    let log = Rc::clone(&seen);
    button.add_event_listener("click", move |e, el| {
        log.borrow_mut().push(format!("{}:{}", e.kind(), el.node_name()));
    });
    let log = Rc::clone(&seen);
    form.add_event_listener("click", move |e, el| {
        let target = e.target().map(|t| t.node_name()).unwrap_or_default();
        log.borrow_mut().push(format!("{}:{}<-{}", e.kind(), el.node_name(), target));
    });

    assert_eq!(button.dispatch_event(&Event::new("click")), 2);
    assert_eq!(*seen.borrow(), vec!["click:button", "click:form<-button"]);
    assert_eq!(button.dispatch_event(&Event::non_bubbling("click")), 1);
}

#[test]
fn form_state_defaults_follow_markup() {
    let doc = Document::parse(
        r#"<input id="c" type="checkbox" checked><select id="s"><option>a</option><option value="2" selected>b</option></select>"#,
    );
    let checkbox = doc.get_element_by_id("c").expect("checkbox");
    assert!(checkbox.checked());
    assert_eq!(checkbox.value(), "on");
    checkbox.set_checked(false);
    assert!(!checkbox.checked());

    let select = doc.get_element_by_id("s").expect("select");
    assert_eq!(select.value(), "2");
    select.set_value("a");
    assert_eq!(select.value(), "a");
}

#[test]
fn style_properties_edit_the_style_attribute() {
    let el = h("div", &[("style", "color: red")], vec![]);
    el.set_style_property("display", "none");
    assert_eq!(el.attribute("style").as_deref(), Some("color: red; display: none;"));
    el.remove_style_property("display");
    assert_eq!(el.style().get("display"), None);
}

#[test]
fn host_values_expose_element_state() {
    let input = h("input", &[("type", "text")], vec![]);
    input.set_value("typed");
    let value = input.to_value();
    assert_eq!(value.get("value"), Value::from("typed"));
    assert_eq!(value.get("tagName"), Value::from("INPUT"));
    value.set("value", "changed");
    assert_eq!(input.value(), "changed");
}

#[test]
fn bindings_run_with_the_element() {
    let el = h("input", &[], vec![]);
    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    el.set_binding(
        "model",
        Rc::new(move |node: &DomNode, _event: Option<&Event>| {
            assert!(node.is_tag("input"));
            *counter.borrow_mut() += 1;
        }),
    );
    assert!(el.run_binding("model", None));
    assert!(!el.run_binding("show", None));
    assert_eq!(*hits.borrow(), 1);
}
