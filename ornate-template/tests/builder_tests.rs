use ornate_dom::{Document, h, text};
use ornate_template::{Node, TreeBuilder};

#[test]
fn builds_elements_text_and_attributes_in_order() {
    let nodes = TreeBuilder::default().build_markup(r#"<DIV Id="main" class="a">hi<b>there</b></DIV>"#);
    assert_eq!(nodes.len(), 1);
    let div = nodes[0].as_element().expect("div");
    assert_eq!(div.tag, "div");
    let names: Vec<&str> = div.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["id", "class"]);
    assert_eq!(div.literal("id"), Some("main"));
    assert_eq!(div.children.len(), 2);
    assert_eq!(div.children[0].as_ref().and_then(Node::as_text), Some("hi"));
}

#[test]
fn comments_leave_empty_slots() {
    let nodes = TreeBuilder::default().build_markup("<p>a<!-- note -->b</p>");
    let p = nodes[0].as_element().expect("p");
    assert_eq!(p.children.len(), 3);
    assert!(p.children[1].is_none());
    assert_eq!(p.live_children().count(), 2);
}

#[test]
fn styles_are_collected_and_replaced_by_placeholders() {
    let mut builder = TreeBuilder::default();
    let nodes = builder.build_markup("<div><style>p { color: red }</style><p>x</p></div>");
    let div = nodes[0].as_element().expect("div");
    let style = div.children[0]
        .as_ref()
        .and_then(Node::as_element)
        .expect("placeholder");
    assert_eq!(style.tag, "style");
    assert!(style.children.is_empty());

    let styles = builder.take_styles();
    assert_eq!(styles.len(), 1);
    assert_eq!(styles[0].text_content(), "p { color: red }");
    assert!(styles[0].parent().is_none());
    assert!(builder.take_styles().is_empty());
}

#[test]
fn modules_are_built_once_per_name() {
    let mut builder = TreeBuilder::default();
    let first = builder.build_markup(r#"<nav orn-module="menu"><a>one</a></nav>"#);
    let second = builder.build_markup(r#"<nav orn-module="menu"><a>two</a></nav>"#);
    assert_eq!(builder.module_count(), 1);
    assert_eq!(first, second);
    assert_eq!(builder.module("menu"), Some(&first[0]));
}

#[test]
fn builds_from_a_live_element() {
    let doc = Document::parse(r#"<section id="app"><h1>{{ title }}</h1></section>"#);
    let app = doc.get_element_by_id("app").expect("app");
    let nodes = TreeBuilder::default().build_element(&app);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].as_element().map(|e| e.tag.as_str()), Some("h1"));

    let live = h("div", &[], vec![text("plain")]);
    let nodes = TreeBuilder::default().build_element(&live);
    assert_eq!(nodes[0].as_text(), Some("plain"));
}

#[test]
fn malformed_markup_still_builds() {
    let nodes = TreeBuilder::default().build_markup("<ul><li>one<li>two</ul></div><p>tail");
    let ul = nodes[0].as_element().expect("ul");
    assert_eq!(ul.live_children().count(), 2);
    assert_eq!(nodes.last().and_then(Node::as_element).map(|e| e.tag.as_str()), Some("p"));
}
