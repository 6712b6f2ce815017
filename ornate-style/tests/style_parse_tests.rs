use ornate_style::StyleDeclarations;

#[test]
fn parses_declarations_in_order() {
    let decls = StyleDeclarations::parse("color: red; font-size: 18px;; bogus");
    assert_eq!(decls.len(), 2);
    assert_eq!(decls.get("color"), Some("red"));
    assert_eq!(decls.get("FONT-SIZE"), Some("18px"));
    assert_eq!(decls.to_string(), "color: red; font-size: 18px;");
}

#[test]
fn set_replaces_in_place_and_remove_drops() {
    let mut decls = StyleDeclarations::parse("display: block; color: red");
    decls.set("display", "none");
    assert_eq!(decls.to_string(), "display: none; color: red;");
    assert_eq!(decls.remove("display").as_deref(), Some("none"));
    assert_eq!(decls.to_string(), "color: red;");
    assert_eq!(decls.remove("display"), None);
}

#[test]
fn colons_inside_values_are_kept() {
    let decls = StyleDeclarations::parse("background: url(http://x/y.png)");
    assert_eq!(decls.get("background"), Some("url(http://x/y.png)"));
}
