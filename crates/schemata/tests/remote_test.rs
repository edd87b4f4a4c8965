use schemata::{CompileOptions, SchemaNode, compile};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tree(id: &str, value_type: &str) -> Value {
    json!({
        "$id": id,
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$recursiveAnchor": true,
        "type": "object",
        "properties": {
            "value": { "type": value_type },
            "children": { "type": "array", "items": { "$recursiveRef": "#" } }
        }
    })
}

fn root_with_remotes() -> SchemaNode {
    init_tracing();
    let node = compile(
        json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "type": "object",
            "properties": {
                "a": { "$ref": "https://a.example.com/tree" },
                "b": { "$ref": "https://b.example.com/tree" }
            }
        }),
        CompileOptions::default(),
    )
    .unwrap();
    node.add_remote("https://a.example.com/tree", tree("https://a.example.com/tree", "string"))
        .unwrap();
    node.add_remote("https://b.example.com/tree", tree("https://b.example.com/tree", "number"))
        .unwrap();
    node
}

#[test]
fn test_recursive_ref_stays_in_remote_scope() {
    let node = root_with_remotes();
    let data = json!({
        "a": { "value": "x", "children": [{ "value": "y", "children": [] }] },
        "b": { "value": 1, "children": [{ "value": 2 }] }
    });
    assert!(node.validate(&data).valid);

    let data = json!({
        "a": { "children": [{ "value": 1 }] },
        "b": { "children": [{ "value": "2" }] }
    });
    let errors = node.validate(&data).errors;
    let pointers: Vec<&str> = errors.iter().map(|error| error.pointer()).collect();
    assert_eq!(pointers, vec!["#/a/children/0/value", "#/b/children/0/value"]);
    assert!(errors.iter().all(|error| error.code.as_str() == "type-error"));
}

#[test]
fn test_remotes_are_listed_and_shared() {
    let node = root_with_remotes();
    assert_eq!(
        node.context.remotes(),
        vec!["https://a.example.com/tree", "https://b.example.com/tree"]
    );

    let other = compile(
        json!({ "$ref": "https://b.example.com/tree" }),
        CompileOptions::default().with_remote(&node),
    )
    .unwrap();
    assert!(other.is_valid(&json!({ "value": 3 })));
    assert!(!other.is_valid(&json!({ "value": "3" })));
}

#[test]
fn test_get_ref_into_remote() {
    let node = root_with_remotes();
    let found = node.get_ref("https://a.example.com/tree#/properties/value").unwrap();
    assert_eq!(found.schema, json!({ "type": "string" }));
    assert!(node.get_ref("https://c.example.com/missing").is_none());
}

fn strict_tree(draft: &str, anchor: (&str, Value), items: Value) -> SchemaNode {
    init_tracing();
    let (anchor_keyword, anchor_value) = anchor;
    let node = compile(
        json!({
            "$schema": draft,
            "$id": "https://example.com/strict-tree",
            anchor_keyword: anchor_value.clone(),
            "$ref": "https://example.com/tree",
            "unevaluatedProperties": false
        }),
        CompileOptions::default(),
    )
    .unwrap();
    node.add_remote(
        "https://example.com/tree",
        json!({
            "$schema": draft,
            "$id": "https://example.com/tree",
            anchor_keyword: anchor_value,
            "type": "object",
            "properties": {
                "data": true,
                "children": { "type": "array", "items": items }
            }
        }),
    )
    .unwrap();
    node
}

fn assert_outer_scope_applies(node: &SchemaNode) {
    assert!(node.validate(&json!({ "children": [{ "data": 1 }] })).valid);
    let output = node.validate(&json!({ "children": [{ "daat": 1 }] }));
    assert!(!output.valid);
    let codes: Vec<&str> = output.errors.iter().map(|error| error.code.as_str()).collect();
    assert!(codes.contains(&"unevaluated-property-error"), "{codes:?}");
}

#[test]
fn test_recursive_ref_binds_to_outermost_anchor() {
    let node = strict_tree(
        "https://json-schema.org/draft/2019-09/schema",
        ("$recursiveAnchor", json!(true)),
        json!({ "$recursiveRef": "#" }),
    );
    assert_outer_scope_applies(&node);
}

#[test]
fn test_dynamic_ref_binds_to_outermost_anchor() {
    let node = strict_tree(
        "https://json-schema.org/draft/2020-12/schema",
        ("$dynamicAnchor", json!("node")),
        json!({ "$dynamicRef": "#node" }),
    );
    assert_outer_scope_applies(&node);
}
