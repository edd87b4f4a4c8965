//! `$ref`, `$recursiveRef`, `$dynamicRef` and identifier keywords
//!
//! Identifier and anchor keywords carry no hooks. Their descriptors only
//! declare that a dialect understands them, which gates anchor registration.

use serde_json::{Value, json};

use crate::compile::Compiler;
use crate::dialect::Keyword;
use crate::error::{ErrorCode, JsonError};
use crate::keywords::malformed;
use crate::node::{DynamicReference, SchemaNode};
use crate::reduce::{ReduceInput, mark};
use crate::reference::{join_id, resolve_dynamic_ref, resolve_ref, split_fragment};
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, validate_node};

pub const REF: Keyword = Keyword::new("$ref", "$ref")
    .with_order(10)
    .with_parse(parse_ref)
    .with_reduce(reduce_ref)
    .with_validate(validate_ref);

pub const RECURSIVE_REF: Keyword = Keyword::new("$recursiveRef", "$recursiveRef")
    .with_order(10)
    .with_parse(parse_recursive_ref)
    .with_reduce(reduce_dynamic_ref)
    .with_validate(validate_dynamic_ref);

pub const DYNAMIC_REF: Keyword = Keyword::new("$dynamicRef", "$dynamicRef")
    .with_order(10)
    .with_parse(parse_dynamic_ref)
    .with_reduce(reduce_dynamic_ref)
    .with_validate(validate_dynamic_ref);

pub const ID: Keyword = Keyword::new("$id", "$id");
pub const ID_04: Keyword = Keyword::new("id", "id");
pub const SCHEMA: Keyword = Keyword::new("$schema", "$schema");
pub const ANCHOR: Keyword = Keyword::new("$anchor", "$anchor");
pub const DYNAMIC_ANCHOR: Keyword = Keyword::new("$dynamicAnchor", "$dynamicAnchor");
pub const RECURSIVE_ANCHOR: Keyword = Keyword::new("$recursiveAnchor", "$recursiveAnchor");

fn reference_value<'a>(node: &'a SchemaNode, keyword: &str) -> Option<&'a str> {
    let value = node.schema.get(keyword).and_then(Value::as_str);
    if value.is_none() {
        malformed(node, keyword);
    }
    value
}

fn parse_ref(node: &mut SchemaNode, _compiler: &Compiler) {
    if let Some(value) = reference_value(node, "$ref") {
        node.reference = Some(join_id(&node.id, value));
    }
}

fn reduce_ref(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some(target) = resolve_ref(input.node) else {
        return Ok(None);
    };
    let reduced = input.reduce(&target, path)?;
    Ok(Some(mark(reduced, "$ref")))
}

fn validate_ref(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    match resolve_ref(input.node) {
        Some(target) => validate_node(&target, input.data, input.pointer, path),
        None => vec![input.error(
            ErrorCode::Ref,
            json!({ "ref": input.node.schema.get("$ref") }),
        )],
    }
}

fn parse_recursive_ref(node: &mut SchemaNode, _compiler: &Compiler) {
    if let Some(value) = reference_value(node, "$recursiveRef") {
        node.dynamic_reference = Some(DynamicReference::Recursive {
            target: join_id(&node.id, value),
        });
    }
}

fn parse_dynamic_ref(node: &mut SchemaNode, _compiler: &Compiler) {
    let Some(value) = reference_value(node, "$dynamicRef") else {
        return;
    };
    let target = join_id(&node.id, value);
    let (_, fragment) = split_fragment(&target);
    let anchor = (!fragment.is_empty() && !fragment.starts_with('/')).then(|| fragment.to_string());
    node.dynamic_reference = Some(DynamicReference::Dynamic { target, anchor });
}

fn reduce_dynamic_ref(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some(target) = resolve_dynamic_ref(input.node, path) else {
        return Ok(None);
    };
    let reduced = input.reduce(&target, path)?;
    Ok(Some(mark(reduced, "$dynamicRef")))
}

fn validate_dynamic_ref(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(target) = resolve_dynamic_ref(input.node, path) else {
        let reference = input
            .node
            .dynamic_reference
            .as_ref()
            .map(|reference| reference.target().to_string());
        return vec![input.error(ErrorCode::Ref, json!({ "ref": reference }))];
    };
    validate_node(&target, input.data, input.pointer, path)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::compile;
    use crate::config::CompileOptions;

    fn codes(schema: serde_json::Value, data: serde_json::Value) -> Vec<&'static str> {
        compile::compile(schema, CompileOptions::default())
            .unwrap()
            .validate(&data)
            .errors
            .iter()
            .map(|e| e.code.as_str())
            .collect()
    }

    #[test]
    fn test_ref_to_defs() {
        let schema = json!({
            "properties": { "a": { "$ref": "#/$defs/s" } },
            "$defs": { "s": { "type": "string" } }
        });
        assert!(codes(schema.clone(), json!({ "a": "x" })).is_empty());
        assert_eq!(codes(schema, json!({ "a": 1 })), vec!["type-error"]);
    }

    #[test]
    fn test_unresolved_ref() {
        assert_eq!(codes(json!({ "$ref": "#/$defs/missing" }), json!(1)), vec!["ref-error"]);
    }

    #[test]
    fn test_ref_siblings_apply_from_2019() {
        let schema = json!({ "$ref": "#/$defs/n", "maximum": 3, "$defs": { "n": { "type": "number" } } });
        assert_eq!(codes(schema, json!(4)), vec!["maximum-error"]);
        let legacy = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$ref": "#/definitions/n",
            "maximum": 3,
            "definitions": { "n": { "type": "number" } }
        });
        assert!(codes(legacy, json!(4)).is_empty());
    }

    #[test]
    fn test_recursive_ref_extends_schema() {
        let schema = json!({
            "$id": "https://example.com/tree",
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "$recursiveAnchor": true,
            "type": "object",
            "properties": {
                "children": { "type": "array", "items": { "$recursiveRef": "#" } }
            }
        });
        assert!(codes(schema.clone(), json!({ "children": [{ "children": [] }] })).is_empty());
        assert_eq!(codes(schema, json!({ "children": [1] })), vec!["type-error"]);
    }

    #[test]
    fn test_dynamic_ref_resolves_anchor() {
        let schema = json!({
            "$id": "https://example.com/list",
            "$dynamicAnchor": "item",
            "type": "array",
            "items": { "$dynamicRef": "#item" }
        });
        assert!(codes(schema.clone(), json!([[], [[]]])).is_empty());
        assert_eq!(codes(schema, json!([1])), vec!["type-error"]);
    }
}
