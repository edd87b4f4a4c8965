use schemata::{CompileOptions, GetDataOptions, GetOptions, SchemaNode, compile};
use serde_json::{Value, json};

fn node(schema: Value) -> SchemaNode {
    compile(schema, CompileOptions::default()).unwrap()
}

fn form() -> SchemaNode {
    node(json!({
        "type": "object",
        "required": ["contact"],
        "properties": {
            "contact": {
                "oneOfProperty": "kind",
                "oneOf": [
                    { "$ref": "#/$defs/email" },
                    { "$ref": "#/$defs/phone" }
                ]
            }
        },
        "$defs": {
            "email": {
                "type": "object",
                "required": ["kind", "address"],
                "properties": { "kind": { "const": "email" }, "address": { "type": "string", "format": "email" } }
            },
            "phone": {
                "type": "object",
                "required": ["kind", "number"],
                "properties": { "kind": { "const": "phone" }, "number": { "type": "string", "default": "+0" } }
            }
        }
    }))
}

#[test]
fn test_get_schema_through_declared_one_of() {
    let node = form();
    let data = json!({ "contact": { "kind": "phone", "number": "123" } });
    let found = node.get_schema("#/contact/number", &data, GetOptions::default()).unwrap().unwrap();
    assert_eq!(found.schema, json!({ "type": "string", "default": "+0" }));

    let data = json!({ "contact": { "kind": "fax" } });
    let error = node.get_schema("#/contact/number", &data, GetOptions::default()).unwrap_err();
    assert_eq!(error.code.as_str(), "one-of-property-error");
}

#[test]
fn test_get_schema_reduces_final_node() {
    let node = form();
    let data = json!({ "contact": { "kind": "email", "address": "a@b.c" } });
    let contact = node.get_schema("/contact", &data, GetOptions::default()).unwrap().unwrap();
    assert!(contact.one_of.is_none());
    assert_eq!(contact.schema["required"], json!(["kind", "address"]));
}

#[test]
fn test_get_data_follows_first_branch() {
    let node = form();
    let data = node.get_data(None, None);
    assert_eq!(data, json!({ "contact": { "kind": "email", "address": "" } }));
    assert!(node.validate(&json!({ "contact": { "kind": "email", "address": "a@b.c" } })).valid);
}

#[test]
fn test_get_data_completes_partial_input() {
    let node = form();
    let data = node.get_data(Some(&json!({ "contact": { "kind": "phone" } })), None);
    assert_eq!(data, json!({ "contact": { "kind": "phone", "number": "+0" } }));
    assert!(node.validate(&data).valid);
}

#[test]
fn test_self_referential_synthesis_terminates() {
    let node = node(json!({
        "$defs": { "n": { "type": "object", "properties": { "next": { "$ref": "#/$defs/n" } } } },
        "$ref": "#/$defs/n"
    }));
    let options = GetDataOptions {
        add_optional_props: true,
        recursion_limit: 1,
        ..GetDataOptions::default()
    };
    assert_eq!(node.get_data(None, Some(options)), json!({ "next": {} }));
    let options = GetDataOptions {
        recursion_limit: 2,
        ..options
    };
    assert_eq!(node.get_data(None, Some(options)), json!({ "next": { "next": {} } }));
}

#[test]
fn test_get_data_defaults_come_from_compile_options() {
    let options = CompileOptions {
        get_data_defaults: GetDataOptions {
            add_optional_props: true,
            ..GetDataOptions::default()
        },
        ..CompileOptions::default()
    };
    let node = compile(json!({ "properties": { "flag": { "type": "boolean" } } }), options).unwrap();
    assert_eq!(node.get_template(None, None), json!({ "flag": false }));
}

#[test]
fn test_to_data_nodes_pairs_values_with_schemas() {
    let node = form();
    let data = json!({ "contact": { "kind": "phone", "number": "1" } });
    let nodes = node.to_data_nodes(&data, "#");
    let found: Vec<(&str, &Value)> = nodes
        .iter()
        .map(|data_node| (data_node.pointer.as_str(), &data_node.node.schema))
        .collect();
    assert_eq!(found.len(), 4);
    assert_eq!(found[3].0, "#/contact/number");
    assert_eq!(found[3].1, &json!({ "type": "string", "default": "+0" }));
}
