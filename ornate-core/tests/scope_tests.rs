use ornate_core::{ScopeChain, Value};

#[test]
fn array_scope_becomes_the_frame_list() {
    let outer = Value::from_entries([("a", 1)]);
    let inner = Value::from_entries([("a", 2), ("b", 3)]);
    let chain = ScopeChain::from_value(Value::array(vec![outer, inner]));

    assert_eq!(chain.len(), 2);
    assert_eq!(chain.lookup("a"), Some(Value::from(2)));
    assert_eq!(chain.lookup("b"), Some(Value::from(3)));
    assert_eq!(chain.lookup("c"), None);
}

#[test]
fn extend_leaves_the_original_chain_alone() {
    let chain = ScopeChain::new(Value::from_entries([("x", 1)]));
    let extended = chain.extend(Value::from_entries([("y", 2)]));

    assert_eq!(chain.len(), 1);
    assert_eq!(extended.len(), 2);
    assert_eq!(chain.lookup("y"), None);
    assert_eq!(extended.lookup("x"), Some(Value::from(1)));
}

#[test]
fn assign_targets_the_defining_frame_or_root() {
    let root = Value::from_entries([("x", 1)]);
    let frame = Value::from_entries([("y", 2)]);
    let chain = ScopeChain::new(root.clone()).extend(frame.clone());

    chain.assign("y", Value::from(20)).expect("assign y");
    chain.assign("z", Value::from(30)).expect("assign z");

    assert_eq!(frame.get("y"), Value::from(20));
    assert_eq!(root.get("z"), Value::from(30));
    assert_eq!(frame.get("z"), Value::Undefined);
}

#[test]
fn flatten_keeps_the_winning_value() {
    let chain = ScopeChain::new(Value::from_entries([("a", 1), ("b", 1)]))
        .extend(Value::from_entries([("b", 2)]));
    let names = chain.flatten();
    assert_eq!(names.get("a"), Some(&Value::from(1)));
    assert_eq!(names.get("b"), Some(&Value::from(2)));
}

#[test]
fn object_entries_follow_enumeration_order() {
    let obj = Value::from_entries([("b", 1), ("2", 2), ("a", 3), ("1", 4)]);
    let keys: Vec<String> = obj.entries().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["1", "2", "b", "a"]);
}

#[test]
fn truthiness_matches_script_rules() {
    assert!(!Value::from("").is_truthy());
    assert!(!Value::from(0).is_truthy());
    assert!(!Value::Number(f64::NAN).is_truthy());
    assert!(Value::array(vec![]).is_truthy());
    assert!(Value::object().is_truthy());
    assert!(Value::from("0").is_truthy());
}

#[test]
fn json_conversion_preserves_key_order() {
    let json = serde_json::json!({ "z": 1, "a": [true, null, "s"] });
    let value = Value::from(json.clone());
    assert_eq!(value.to_json(), json);
    assert_eq!(value.entries()[0].0, "z");
}
