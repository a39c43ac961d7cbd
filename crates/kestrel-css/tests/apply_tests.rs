//! Integration tests for style application.

use std::collections::{BTreeMap, HashMap};

use kestrel_css::{ElementQuery, Origin, StyleEngine};

fn engine(css: &str) -> StyleEngine {
    let mut engine = StyleEngine::default();
    let _ = engine.parse_stylesheet_str(css).unwrap();
    engine
}

#[test]
fn test_lookup_order() {
    let engine = engine(
        "#e { a: id; }
         rect#e { a: tag-id; b: tag-id; }
         .c { a: class; b: class; c: class; }
         rect { a: tag; b: tag; c: tag; d: tag; }
         * { a: any; b: any; c: any; d: any; e: any; }",
    );
    let query = ElementQuery::new("rect").with_class_attribute("c").with_id("e");
    let style = engine.apply_styles(&query);
    assert_eq!(style.value("a"), Some("tag-id"));
    assert_eq!(style.value("b"), Some("tag-id"));
    assert_eq!(style.value("c"), Some("class"));
    assert_eq!(style.value("d"), Some("tag"));
    assert_eq!(style.value("e"), Some("any"));
}

#[test]
fn test_first_compound_class_key_wins() {
    let engine = engine(
        "rect.c#e { fill: full; }
         .c#e { fill: class-id; stroke: class-id; }
         rect.c { fill: tag-class; stroke: tag-class; opacity: tag-class; }",
    );
    let style = engine.apply_styles(&ElementQuery::new("rect").with_class_attribute("c").with_id("e"));
    assert_eq!(style.value("fill"), Some("full"));
    // Only the first key found is applied.
    assert_eq!(style.value("stroke"), None);
    assert_eq!(style.value("opacity"), None);
}

#[test]
fn test_classes_resolve_in_attribute_order() {
    let engine = engine(".x { fill: x; } .y { fill: y; }");
    let xy = engine.apply_styles(&ElementQuery::new("g").with_class_attribute("x y"));
    let yx = engine.apply_styles(&ElementQuery::new("g").with_class_attribute("y  x"));
    assert_eq!(xy.value("fill"), Some("y"));
    assert_eq!(yx.value("fill"), Some("x"));
}

#[test]
fn test_two_class_selector_never_matches() {
    let engine = engine(".a.b { fill: red; }");
    let style = engine.apply_styles(&ElementQuery::new("g").with_class_attribute("a b"));
    assert!(style.is_empty());
}

#[test]
fn test_universal_canonicalizes() {
    let engine = engine("*.a { fill: red; } *#i { stroke: blue; }");
    let style = engine.apply_styles(&ElementQuery::new("g").with_class_attribute("a").with_id("i"));
    assert_eq!(style.value("fill"), Some("red"));
    assert_eq!(style.value("stroke"), Some("blue"));
}

#[test]
fn test_selector_case_is_preserved() {
    let engine = engine("Rect { fill: red; }");
    assert!(engine.apply_styles(&ElementQuery::new("rect")).is_empty());
    assert_eq!(
        engine.apply_styles(&ElementQuery::new("Rect")).value("fill"),
        Some("red")
    );
}

#[test]
fn test_presentation_attributes_from_hash_map() {
    let engine = engine("rect { stroke: blue; }");
    let attributes: HashMap<String, String> = [
        ("fill", "red"),
        ("stroke", "green"),
        ("x", "10"),
        ("transform", "rotate(45)"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let style = engine.apply_styles(&ElementQuery::from_attributes("rect", &attributes));
    assert_eq!(style.value("fill"), Some("red"));
    assert_eq!(style.get("fill").map(|v| v.origin), Some(Origin::Presentation));
    assert_eq!(style.value("stroke"), Some("blue"));
    assert_eq!(style.value("x"), None);
    assert_eq!(style.value("transform"), None);
    assert_eq!(style.transform.as_deref(), Some("rotate(45)"));
}

#[test]
fn test_attributes_from_btree_map() {
    let engine = engine("#hero { fill: gold; }");
    let mut attributes = BTreeMap::new();
    let _ = attributes.insert("id".to_string(), "hero".to_string());
    let _ = attributes.insert("style".to_string(), "opacity: .5".to_string());
    let style = engine.apply_styles(&ElementQuery::from_attributes("path", &attributes));
    assert_eq!(style.value("fill"), Some("gold"));
    assert_eq!(style.value("opacity"), Some(".5"));
}

#[test]
fn test_retained_style_used_without_attributes() {
    let engine = engine("g { fill: red; }");
    let style = engine.apply_styles(&ElementQuery::new("g").with_retained_style("fill: blue"));
    assert_eq!(style.value("fill"), Some("blue"));
    assert_eq!(style.get("fill").map(|v| v.origin), Some(Origin::Inline));
}

#[test]
fn test_inline_important_beats_stylesheet_important() {
    let engine = engine("g { fill: red !important; }");
    let attributes = [("style", "fill: blue !important")];
    let style = engine.apply_styles(&ElementQuery::from_attributes("g", &attributes));
    assert_eq!(style.value("fill"), Some("blue"));
}

#[test]
fn test_malformed_inline_declarations_are_dropped() {
    let engine = engine("");
    let attributes = [("style", "fill; : red; stroke: black")];
    let style = engine.apply_styles(&ElementQuery::from_attributes("g", &attributes));
    assert_eq!(style.len(), 1);
    assert_eq!(style.value("stroke"), Some("black"));
}

#[test]
fn test_no_tag_no_id() {
    let engine = engine("* { fill: red; } .a { stroke: blue; }");
    let style = engine.apply_styles(&ElementQuery::default().with_class_attribute("a"));
    assert_eq!(style.value("fill"), Some("red"));
    assert_eq!(style.value("stroke"), Some("blue"));
}

#[test]
fn test_resolved_style_serializes() {
    let engine = engine("g { fill: red; }");
    let style = engine.apply_styles(&ElementQuery::new("g"));
    let json = serde_json::to_value(&style).unwrap();
    assert_eq!(json["properties"]["fill"]["value"], "red");
    assert_eq!(json["properties"]["fill"]["origin"], "stylesheet");
    assert!(json.get("transform").is_none());
}
