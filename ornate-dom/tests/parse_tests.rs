use ornate_dom::{NodeKind, parse_fragment};

#[test]
fn nested_elements_and_text() {
    let nodes = parse_fragment(r#"<div class="app"><span>hi</span> there</div>"#);
    assert_eq!(nodes.len(), 1);
    let div = &nodes[0];
    assert_eq!(div.tag().as_deref(), Some("div"));
    assert_eq!(div.attribute("class").as_deref(), Some("app"));
    assert_eq!(div.child_count(), 2);
    assert_eq!(div.text_content(), "hi there");
}

#[test]
fn names_are_lower_cased_and_attribute_order_kept() {
    let nodes = parse_fragment(r#"<DIV Orn-If="x" id=main hidden></DIV>"#);
    let attrs = nodes[0].attributes();
    assert_eq!(
        attrs,
        vec![
            ("orn-if".to_string(), "x".to_string()),
            ("id".to_string(), "main".to_string()),
            ("hidden".to_string(), String::new()),
        ]
    );
}

#[test]
fn void_and_self_closing_tags_do_not_nest() {
    let nodes = parse_fragment(r#"<p><input type="text"><br/>after</p>"#);
    let p = &nodes[0];
    assert_eq!(p.child_count(), 3);
    assert_eq!(p.child(2).and_then(|n| n.data()).as_deref(), Some("after"));
}

#[test]
fn comments_are_kept_as_comment_nodes() {
    let nodes = parse_fragment("<ul><!-- note --><li>a</li></ul>");
    let first = nodes[0].first_child().expect("comment");
    assert_eq!(first.kind(), NodeKind::Comment(" note ".into()));
}

#[test]
fn raw_text_elements_keep_markup_verbatim() {
    let nodes = parse_fragment("<style>a > b { color: red }</style><p>x</p>");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].text_content(), "a > b { color: red }");
    assert_eq!(nodes[0].outer_html(), "<style>a > b { color: red }</style>");
}

#[test]
fn unclosed_and_stray_tags_are_tolerated() {
    let nodes = parse_fragment("<div><span>open</div></em>tail");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].text_content(), "open");
    assert_eq!(nodes[1].data().as_deref(), Some("tail"));
}

#[test]
fn sibling_list_items_close_each_other() {
    let nodes = parse_fragment("<ul><li>a<li>b</ul>");
    assert_eq!(nodes[0].child_count(), 2);
}

#[test]
fn serialization_round_trips_simple_markup() {
    let markup = r#"<div id="a"><b>x &amp; y</b><img src="p.png"></div>"#;
    let nodes = parse_fragment(markup);
    assert_eq!(nodes[0].outer_html(), markup);
}
