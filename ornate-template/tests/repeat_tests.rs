use ornate_core::{ScopeChain, Value};
use ornate_template::{Node, Processor, TreeBuilder};
use serde_json::json;

fn resolve(markup: &str, scope: serde_json::Value) -> Vec<Node> {
    let nodes = TreeBuilder::default().build_markup(markup);
    Processor::default().process_roots(nodes, &ScopeChain::new(Value::from(scope)))
}

fn text_of(node: &Node) -> String {
    node.as_element()
        .map(|el| el.live_children().filter_map(Node::as_text).collect())
        .unwrap_or_default()
}

#[test]
fn expands_one_sibling_per_entry_with_positions() {
    let nodes = resolve(
        r#"<ul><li orn-repeat="items as i:item">{{ i }}={{ item }}</li></ul>"#,
        json!({ "items": ["a", "b", "c"] }),
    );
    let ul = nodes[0].as_element().expect("ul");
    assert!(ul.children[0].is_none());
    let items: Vec<&Node> = ul.live_children().collect();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items.iter().map(|n| text_of(n)).collect::<Vec<_>>(),
        vec!["0=a", "1=b", "2=c"]
    );
    assert_eq!(
        items.iter().map(|n| n.position()).collect::<Vec<_>>(),
        vec![Some(0), Some(1), Some(2)]
    );
    assert!(items.iter().all(|n| {
        n.as_element()
            .is_some_and(|el| el.attribute("orn-repeat").is_none())
    }));
}

#[test]
fn positions_start_at_the_original_slot() {
    let nodes = resolve(
        r#"<div><h2>head</h2><p orn-repeat="xs as x">{{ x }}</p></div>"#,
        json!({ "xs": [10, 20] }),
    );
    let div = nodes[0].as_element().expect("div");
    let positions: Vec<Option<usize>> = div.live_children().map(Node::position).collect();
    assert_eq!(positions, vec![None, Some(1), Some(2)]);
}

#[test]
fn object_keys_iterate_in_enumeration_order() {
    let nodes = resolve(
        r#"<dl><dt orn-repeat="user as key:value">{{ key }}:{{ value }}</dt></dl>"#,
        json!({ "user": { "name": "Ada", "2": "two", "role": "admin" } }),
    );
    let dl = nodes[0].as_element().expect("dl");
    let rows: Vec<String> = dl.live_children().map(text_of).collect();
    assert_eq!(rows, vec!["2:two", "name:Ada", "role:admin"]);
}

#[test]
fn numeric_keys_bind_as_numbers() {
    let nodes = resolve(
        r#"<ol><li orn-repeat="xs as i:x">{{ i + 1 }}</li></ol>"#,
        json!({ "xs": ["a", "b"] }),
    );
    let ol = nodes[0].as_element().expect("ol");
    let rows: Vec<String> = ol.live_children().map(text_of).collect();
    assert_eq!(rows, vec!["1", "2"]);
}

#[test]
fn falsy_collections_make_the_node_vanish() {
    for scope in [json!({ "xs": null }), json!({}), json!({ "xs": "" })] {
        let nodes = resolve(r#"<ul><li orn-repeat="xs as x">x</li></ul>"#, scope);
        let ul = nodes[0].as_element().expect("ul");
        assert_eq!(ul.live_children().count(), 0);
    }
}

#[test]
fn malformed_clauses_make_the_node_vanish() {
    let nodes = resolve(r#"<ul><li orn-repeat="xs">x</li></ul>"#, json!({ "xs": [1] }));
    assert_eq!(nodes[0].as_element().expect("ul").live_children().count(), 0);
}

#[test]
fn clones_get_independent_frames() {
    let nodes = resolve(
        r#"<div><section orn-repeat="groups as g"><span orn-repeat="g.items as item">{{ g.name }}/{{ item }}</span></section></div>"#,
        json!({ "groups": [{ "name": "x", "items": [1, 2] }, { "name": "y", "items": [3] }] }),
    );
    let div = nodes[0].as_element().expect("div");
    let rows: Vec<Vec<String>> = div
        .live_children()
        .filter_map(Node::as_element)
        .map(|section| section.live_children().map(text_of).collect())
        .collect();
    assert_eq!(rows, vec![vec!["x/1", "x/2"], vec!["y/3"]]);
}

#[test]
fn loop_variables_shadow_root_fields() {
    let nodes = resolve(
        r#"<ul><li orn-repeat="names as name">{{ name }}</li></ul><p>{{ name }}</p>"#,
        json!({ "name": "root", "names": ["inner"] }),
    );
    assert_eq!(text_of(nodes[0].as_element().and_then(|ul| ul.live_children().next()).expect("li")), "inner");
    assert_eq!(text_of(&nodes[1]), "root");
}

#[test]
fn repeats_work_at_the_top_level() {
    let nodes = resolve(r#"<p orn-repeat="xs as x">{{ x }}</p>"#, json!({ "xs": [1, 2] }));
    let rows: Vec<String> = nodes.iter().map(text_of).collect();
    assert_eq!(rows, vec!["1", "2"]);
}

#[test]
fn conditionals_inside_clones_prune_them() {
    let nodes = resolve(
        r#"<ul><li orn-repeat="xs as x" orn-if="x > 1">{{ x }}</li></ul>"#,
        json!({ "xs": [1, 2, 3] }),
    );
    let ul = nodes[0].as_element().expect("ul");
    let rows: Vec<String> = ul.live_children().map(text_of).collect();
    assert_eq!(rows, vec!["2", "3"]);
    assert_eq!(ul.children.iter().flatten().filter(|n| n.is_pruned()).count(), 1);
}
