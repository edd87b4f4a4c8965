//! `unevaluatedProperties` and `unevaluatedItems`
//!
//! Both keywords look at what the other applicators of the same node
//! evaluated: adjacent keywords, `allOf` branches, matching `anyOf`/`oneOf`
//! branches, the active `if` branch, active dependent schemas and resolved
//! references. A nested schema that itself declares the keyword and
//! validates has evaluated everything.

use ahash::AHashSet;
use serde_json::{Map, Value, json};

use crate::compile::Compiler;
use crate::dialect::{Draft, Keyword};
use crate::error::ErrorCode;
use crate::keywords::array::has_item_list;
use crate::keywords::conditional::selected_branch;
use crate::keywords::object::matching_patterns;
use crate::keywords::{child_pointer, parse_box};
use crate::node::SchemaNode;
use crate::reference::{resolve_dynamic_ref, resolve_ref};
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, is_valid, validate_node};

pub const UNEVALUATED_PROPERTIES: Keyword = Keyword::new("unevaluatedProperties", "unevaluatedProperties")
    .with_parse(parse_unevaluated_properties)
    .with_validate(validate_unevaluated_properties);

pub const UNEVALUATED_ITEMS: Keyword = Keyword::new("unevaluatedItems", "unevaluatedItems")
    .with_parse(parse_unevaluated_items)
    .with_validate(validate_unevaluated_items);

fn parse_unevaluated_properties(node: &mut SchemaNode, compiler: &Compiler) {
    node.unevaluated_properties = parse_box(node, compiler, "unevaluatedProperties");
}

fn parse_unevaluated_items(node: &mut SchemaNode, compiler: &Compiler) {
    node.unevaluated_items = parse_box(node, compiler, "unevaluatedItems");
}

/// Nodes whose annotations count for `node` against `data`.
fn adjacent_nodes(node: &SchemaNode, data: &Value, pointer: &str, path: &mut ValidationPath) -> Vec<SchemaNode> {
    let mut nodes: Vec<SchemaNode> = Vec::new();
    nodes.extend(node.all_of.iter().flatten().cloned());
    for branches in [&node.any_of, &node.one_of].into_iter().flatten() {
        for branch in branches {
            if is_valid(branch, data, pointer, path) {
                nodes.push(branch.clone());
            }
        }
    }
    if let Some(condition) = node.if_.as_deref() {
        if is_valid(condition, data, pointer, path) {
            nodes.push(condition.clone());
        }
    }
    if let Some((_, branch)) = selected_branch(node, data, pointer, path) {
        nodes.push(branch.clone());
    }
    if let (Some(schemas), Value::Object(object)) = (&node.dependent_schemas, data) {
        nodes.extend(
            schemas
                .iter()
                .filter(|(name, _)| object.contains_key(name.as_str()))
                .map(|(_, child)| child.clone()),
        );
    }
    nodes.extend(resolve_ref(node));
    nodes.extend(resolve_dynamic_ref(node, path));
    nodes
}

/// Names of `object` evaluated by the applicators of `node`.
fn annotate_properties(
    node: &SchemaNode,
    object: &Map<String, Value>,
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
    evaluated: &mut AHashSet<String>,
) {
    for name in object.keys() {
        let declared = node
            .properties
            .as_ref()
            .is_some_and(|properties| properties.contains_key(name));
        let patterned = matching_patterns(node, name).next().is_some();
        if declared || patterned || node.additional_properties.is_some() {
            evaluated.insert(name.clone());
        }
    }
    for adjacent in adjacent_nodes(node, data, pointer, path) {
        collect_properties(&adjacent, object, data, pointer, path, evaluated);
    }
}

fn collect_properties(
    node: &SchemaNode,
    object: &Map<String, Value>,
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
    evaluated: &mut AHashSet<String>,
) {
    if !node.schema.is_object() || path.is_cycle(node, pointer) {
        return;
    }
    if node.unevaluated_properties.is_some() && is_valid(node, data, pointer, path) {
        evaluated.extend(object.keys().cloned());
        return;
    }
    let depth = path.len();
    path.push(node, pointer);
    annotate_properties(node, object, data, pointer, path, evaluated);
    path.truncate(depth);
}

fn validate_unevaluated_properties(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Object(object), Some(unevaluated)) = (input.data, &input.node.unevaluated_properties) else {
        return Vec::new();
    };
    let mut evaluated = AHashSet::new();
    annotate_properties(input.node, object, input.data, input.pointer, path, &mut evaluated);
    let mut outcomes = Vec::new();
    for (name, value) in object {
        if evaluated.contains(name) {
            continue;
        }
        let pointer = child_pointer(input.pointer, name);
        if unevaluated.is_false() {
            let error = input.node.create_error(
                ErrorCode::UnevaluatedProperty,
                &pointer,
                value,
                json!({ "property": name }),
            );
            outcomes.push(ValidationOutcome::Error(error));
        } else {
            outcomes.extend(validate_node(unevaluated, value, &pointer, path));
        }
    }
    outcomes
}

fn annotate_items(
    node: &SchemaNode,
    items: &[Value],
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
    evaluated: &mut AHashSet<usize>,
) {
    let prefix = node.prefix_items.as_ref().map_or(0, Vec::len);
    evaluated.extend(0..prefix.min(items.len()));
    let rest = match &node.items {
        Some(_) if has_item_list(node) => false,
        Some(_) => true,
        None => has_item_list(node) && node.additional_items.is_some(),
    };
    if rest {
        let from = if node.dialect.draft == Draft::Draft2020_12 { prefix } else { 0 };
        evaluated.extend(from..items.len());
    }
    if let Some(contains) = &node.contains {
        if node.dialect.draft == Draft::Draft2020_12 {
            for (index, item) in items.iter().enumerate() {
                if is_valid(contains, item, &child_pointer(pointer, index.to_string()), path) {
                    evaluated.insert(index);
                }
            }
        }
    }
    for adjacent in adjacent_nodes(node, data, pointer, path) {
        collect_items(&adjacent, items, data, pointer, path, evaluated);
    }
}

fn collect_items(
    node: &SchemaNode,
    items: &[Value],
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
    evaluated: &mut AHashSet<usize>,
) {
    if !node.schema.is_object() || path.is_cycle(node, pointer) {
        return;
    }
    if node.unevaluated_items.is_some() && is_valid(node, data, pointer, path) {
        evaluated.extend(0..items.len());
        return;
    }
    let depth = path.len();
    path.push(node, pointer);
    annotate_items(node, items, data, pointer, path, evaluated);
    path.truncate(depth);
}

fn validate_unevaluated_items(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Array(items), Some(unevaluated)) = (input.data, &input.node.unevaluated_items) else {
        return Vec::new();
    };
    let mut evaluated = AHashSet::new();
    annotate_items(input.node, items, input.data, input.pointer, path, &mut evaluated);
    let mut outcomes = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if evaluated.contains(&index) {
            continue;
        }
        let pointer = child_pointer(input.pointer, index.to_string());
        if unevaluated.is_false() {
            let error = input.node.create_error(
                ErrorCode::UnevaluatedItems,
                &pointer,
                item,
                json!({ "key": index }),
            );
            outcomes.push(ValidationOutcome::Error(error));
        } else {
            outcomes.extend(validate_node(unevaluated, item, &pointer, path));
        }
    }
    outcomes
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
    fn test_unevaluated_properties_sees_all_of() {
        let schema = json!({
            "allOf": [{ "properties": { "a": true } }],
            "properties": { "b": true },
            "unevaluatedProperties": false
        });
        assert!(codes(schema.clone(), json!({ "a": 1, "b": 2 })).is_empty());
        assert_eq!(codes(schema, json!({ "a": 1, "c": 2 })), vec!["unevaluated-property-error"]);
    }

    #[test]
    fn test_unevaluated_properties_follow_valid_branches() {
        let schema = json!({
            "anyOf": [
                { "properties": { "a": { "type": "string" } }, "required": ["a"] },
                { "properties": { "b": { "type": "string" } }, "required": ["b"] }
            ],
            "unevaluatedProperties": false
        });
        assert!(codes(schema.clone(), json!({ "a": "x" })).is_empty());
        assert_eq!(codes(schema, json!({ "a": "x", "b": 1 })), vec!["unevaluated-property-error"]);
    }

    #[test]
    fn test_unevaluated_properties_through_ref() {
        let schema = json!({
            "$ref": "#/$defs/base",
            "unevaluatedProperties": false,
            "$defs": { "base": { "properties": { "a": true } } }
        });
        assert!(codes(schema.clone(), json!({ "a": 1 })).is_empty());
        assert_eq!(codes(schema, json!({ "z": 1 })), vec!["unevaluated-property-error"]);
    }

    #[test]
    fn test_unevaluated_items() {
        let schema = json!({
            "prefixItems": [{ "type": "string" }],
            "unevaluatedItems": { "type": "number" }
        });
        assert!(codes(schema.clone(), json!(["a", 1, 2])).is_empty());
        assert_eq!(codes(schema, json!(["a", "b"])), vec!["type-error"]);
        let schema = json!({ "contains": { "type": "string" }, "unevaluatedItems": false });
        assert_eq!(codes(schema, json!(["a", 1])), vec!["unevaluated-items-error"]);
    }
}
