use std::cell::Cell;
use std::rc::Rc;

use ornate_core::{EvalError, Invocation, ScopeChain, Value, assign, evaluate, evaluate_with, try_evaluate};

fn scope() -> ScopeChain {
    ScopeChain::new(Value::from_entries([
        ("count", Value::from(2)),
        ("name", Value::from("ada")),
        ("items", Value::array(vec![Value::from("a"), Value::from("b")])),
        ("user", Value::from_entries([("first", "Ada"), ("last", "Lovelace")])),
    ]))
}

#[test]
fn arithmetic_and_precedence() {
    let chain = scope();
    assert_eq!(evaluate("1 + 2 * 3", &chain), Value::from(7));
    assert_eq!(evaluate("(1 + 2) * 3", &chain), Value::from(9));
    assert_eq!(evaluate("count % 2 == 0", &chain), Value::from(true));
    assert_eq!(evaluate("-count + 1", &chain), Value::from(-1));
}

#[test]
fn string_concatenation_coerces() {
    let chain = scope();
    assert_eq!(evaluate("'n=' + count", &chain), Value::from("n=2"));
    assert_eq!(evaluate("user.first + ' ' + user.last", &chain), Value::from("Ada Lovelace"));
}

#[test]
fn loose_and_strict_equality_differ() {
    let chain = scope();
    assert_eq!(evaluate("count == '2'", &chain), Value::from(true));
    assert_eq!(evaluate("count === '2'", &chain), Value::from(false));
    assert_eq!(evaluate("null == undefined", &chain), Value::from(true));
    assert_eq!(evaluate("null === undefined", &chain), Value::from(false));
}

#[test]
fn logical_operators_return_operands() {
    let chain = scope();
    assert_eq!(evaluate("missing_flag || 'fallback'", &chain), Value::Null);
    assert_eq!(evaluate("'' || 'fallback'", &chain), Value::from("fallback"));
    assert_eq!(evaluate("name && count", &chain), Value::from(2));
    assert_eq!(evaluate("null ?? 'x'", &chain), Value::from("x"));
    assert_eq!(evaluate("0 ?? 'x'", &chain), Value::from(0));
}

#[test]
fn conditional_expression() {
    let chain = scope();
    assert_eq!(evaluate("count > 1 ? 'many' : 'one'", &chain), Value::from("many"));
}

#[test]
fn member_index_and_method_calls() {
    let chain = scope();
    assert_eq!(evaluate("items[1]", &chain), Value::from("b"));
    assert_eq!(evaluate("items.length", &chain), Value::from(2));
    assert_eq!(evaluate("name.toUpperCase()", &chain), Value::from("ADA"));
    assert_eq!(evaluate("items.join('-')", &chain), Value::from("a-b"));
    assert_eq!(evaluate("user?.middle?.name", &chain), Value::Undefined);
}

#[test]
fn object_and_array_literals() {
    let chain = scope();
    let value = evaluate("{ active: count > 1, 'data-x': 1, name }", &chain);
    assert_eq!(value.get("active"), Value::from(true));
    assert_eq!(value.get("data-x"), Value::from(1));
    assert_eq!(value.get("name"), Value::from("ada"));
    assert_eq!(evaluate("[1, 'two'].length", &chain), Value::from(2));
}

#[test]
fn unknown_names_fail_soft_to_null() {
    let chain = scope();
    assert_eq!(evaluate("nope + 1", &chain), Value::Null);
    assert!(matches!(
        try_evaluate("nope", &chain),
        Err(EvalError::UnknownName(name)) if name == "nope"
    ));
    assert_eq!(evaluate("typeof nope", &chain), Value::from("undefined"));
}

#[test]
fn syntax_errors_fail_soft_to_null() {
    let chain = scope();
    assert_eq!(evaluate("count +", &chain), Value::Null);
    assert!(matches!(try_evaluate("(", &chain), Err(EvalError::Syntax { .. })));
}

#[test]
fn assignments_write_through_to_the_scope() {
    let chain = scope();
    assert_eq!(evaluate("count = count + 1", &chain), Value::from(3));
    assert_eq!(chain.lookup("count"), Some(Value::from(3)));
    evaluate("count += 2; user.first = 'Grace'", &chain);
    assert_eq!(chain.lookup("count"), Some(Value::from(5)));
    assert_eq!(chain.lookup("user").map(|u| u.get("first")), Some(Value::from("Grace")));
    evaluate("count++", &chain);
    assert_eq!(chain.lookup("count"), Some(Value::from(6)));
}

#[test]
fn event_and_element_are_false_outside_handlers() {
    let chain = scope();
    assert_eq!(evaluate("event", &chain), Value::from(false));
    assert_eq!(evaluate("element", &chain), Value::from(false));
}

#[test]
fn invocation_binds_event_and_element() {
    let chain = ScopeChain::new(Value::from_entries([("event", "shadowed")]));
    let invocation = Invocation {
        event: Value::from_entries([("type", "click")]),
        element: Value::from("el"),
    };
    assert_eq!(evaluate_with("event.type", &chain, &invocation), Value::from("click"));
    assert_eq!(evaluate_with("element", &chain, &invocation), Value::from("el"));
    assert_eq!(evaluate("event", &chain), Value::from(false));
}

#[test]
fn functions_receive_the_root_scope_as_this() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let root = Value::from_entries([("hits", Value::from(0))]);
    root.set(
        "bump",
        Value::function("bump", move |this, args| {
            seen.set(seen.get() + 1);
            let step = args.first().map_or(1.0, Value::to_number);
            let next = this.get("hits").to_number() + step;
            this.set("hits", next);
            Ok(Value::from(next))
        }),
    );
    let chain = ScopeChain::new(root.clone());

    assert_eq!(evaluate("bump(2)", &chain), Value::from(2));
    assert_eq!(evaluate("bump()", &chain), Value::from(3));
    assert_eq!(calls.get(), 2);
    assert_eq!(root.get("hits"), Value::from(3));
}

#[test]
fn later_frames_shadow_earlier_ones() {
    let chain = scope().extend(Value::from_entries([("name", "inner")]));
    assert_eq!(evaluate("name", &chain), Value::from("inner"));
    assert_eq!(evaluate("count", &chain), Value::from(2));
}

#[test]
fn assign_stores_into_members() {
    let chain = scope();
    assign("user.first", &chain, Value::from("Grace")).expect("assign");
    assign("items[0]", &chain, Value::from("z")).expect("assign");
    assert_eq!(evaluate("user.first + items[0]", &chain), Value::from("Gracez"));
    assert_eq!(assign("1 + 1", &chain, Value::Null), Err(EvalError::InvalidTarget));
}

#[test]
fn globals_are_available() {
    let chain = scope();
    assert_eq!(evaluate("Math.max(1, count, 3)", &chain), Value::from(3));
    assert_eq!(evaluate("parseInt('12px')", &chain), Value::from(12));
    assert_eq!(evaluate("JSON.stringify({ a: [1, 2] })", &chain), Value::from(r#"{"a":[1,2]}"#));
    assert_eq!(evaluate("(1.005).toFixed(1)", &chain), Value::from("1.0"));
}

#[test]
fn oversized_repeat_evaluates_to_null() {
    let chain = scope();
    assert_eq!(evaluate("'ab'.repeat(1e19)", &chain), Value::Null);
    assert_eq!(evaluate("'ab'.repeat(1e9)", &chain), Value::Null);
    assert_eq!(evaluate("'ab'.repeat(NaN)", &chain), Value::from(""));
    assert_eq!(evaluate("'ab'.repeat(2.7)", &chain), Value::from("abab"));
    assert!(matches!(try_evaluate("'ab'.repeat(1e19)", &chain), Err(EvalError::Native(_))));
}

#[test]
fn array_length_writes_are_bounded() {
    let chain = scope();
    assert_eq!(evaluate("items.length = 1e30", &chain), Value::Null);
    assert!(matches!(try_evaluate("items.length = 1e30", &chain), Err(EvalError::Type(_))));
    assert_eq!(evaluate("items.length = 1e9", &chain), Value::Null);
    assert_eq!(evaluate("items.length", &chain), Value::from(2));
    evaluate("items.length = 1", &chain);
    assert_eq!(evaluate("items.join('-')", &chain), Value::from("a"));
}

#[test]
fn distant_index_writes_are_refused() {
    let chain = scope();
    assert!(matches!(try_evaluate("items[4000000000] = 1", &chain), Err(EvalError::Type(_))));
    assert_eq!(evaluate("items.length", &chain), Value::from(2));
    evaluate("items[3] = 'd'", &chain);
    assert_eq!(evaluate("items.length", &chain), Value::from(4));
    assert_eq!(evaluate("items.join()", &chain), Value::from("a,b,,d"));
}

#[test]
fn self_referencing_arrays_stringify_without_recursing() {
    let chain = scope();
    assert_eq!(evaluate("items.push(items); '' + items", &chain), Value::from("a,b,"));
    assert_eq!(evaluate("items.join('|')", &chain), Value::from("a|b|"));
    assert_eq!(evaluate("String(items)", &chain), Value::from("a,b,"));
    assert_eq!(evaluate("JSON.stringify(items)", &chain), Value::Null);
}

#[test]
fn reserved_names_shadow_scope_fields() {
    let chain = ScopeChain::new(Value::from_entries([("event", "x"), ("element", "y")]));
    assert_eq!(evaluate("event", &chain), Value::from(false));
    assert_eq!(evaluate("element", &chain), Value::from(false));
}
