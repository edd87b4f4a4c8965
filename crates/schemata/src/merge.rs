//! Node merge engine
//!
//! `merge(a, b)` combines two compiled nodes into a new one without touching
//! either input. The result keeps the locations of `a`.
//!
//! # Schema merge rules
//!
//! | a | b | result |
//! |---|---|--------|
//! | `false` | any | `false` |
//! | any | `false` | `false` |
//! | `true` | x | x |
//! | object | object | keywords merged one by one |
//!
//! Within objects, nested objects merge recursively, arrays are concatenated
//! without duplicates and scalars are taken from `b`. `items` and
//! `prefixItems` arrays merge position by position; once `prefixItems` is
//! present an array form `items` is dropped.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::compile::sort_hooks;
use crate::dialect::Keyword;
use crate::node::{Dependency, PatternProperty, SchemaNode};
use crate::types::{json_equal, push_unique};

/// Merge two raw schemas.
pub fn merge_schema(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Bool(false), _) | (_, Value::Bool(false)) => Value::Bool(false),
        (Value::Bool(true), other) | (other, Value::Bool(true)) => other.clone(),
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = merge_objects(a, b);
            let legacy_items = merged.get("items").is_some_and(Value::is_array);
            if legacy_items && merged.contains_key("prefixItems") {
                merged.shift_remove("items");
            }
            Value::Object(merged)
        }
        (_, other) => other.clone(),
    }
}

fn merge_objects(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = a.clone();
    for (key, b_value) in b {
        let value = match merged.get(key) {
            Some(a_value) => merge_keyword(key, a_value, b_value),
            None => b_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

fn merge_keyword(key: &str, a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => Value::Object(merge_objects(a, b)),
        (Value::Array(a), Value::Array(b)) if key == "items" || key == "prefixItems" => {
            let mut merged: Vec<Value> = Vec::with_capacity(a.len().max(b.len()));
            for index in 0..a.len().max(b.len()) {
                let value = match (a.get(index), b.get(index)) {
                    (Some(x), Some(y)) => merge_schema(x, y),
                    (Some(x), None) | (None, Some(x)) => x.clone(),
                    (None, None) => continue,
                };
                merged.push(value);
            }
            Value::Array(merged)
        }
        (Value::Array(a), Value::Array(b)) => {
            let mut merged = a.clone();
            for value in b {
                push_unique(&mut merged, value.clone());
            }
            Value::Array(merged)
        }
        (Value::Bool(_), Value::Object(_)) | (Value::Object(_), Value::Bool(_)) => merge_schema(a, b),
        _ => b.clone(),
    }
}

/// Merge two nodes into a new node.
pub fn merge(a: &SchemaNode, b: &SchemaNode) -> SchemaNode {
    let mut node = a.clone();
    node.schema = merge_schema(&a.schema, &b.schema);
    if !a.dynamic_id.contains(&b.dynamic_id) {
        node.dynamic_id = format!("{}{}", a.dynamic_id, b.dynamic_id);
    }

    node.reference = b.reference.clone().or_else(|| a.reference.clone());
    node.dynamic_reference = b
        .dynamic_reference
        .clone()
        .or_else(|| a.dynamic_reference.clone());
    node.pattern = b.pattern.clone().or_else(|| a.pattern.clone());

    node.defs = merge_maps(&a.defs, &b.defs);
    node.properties = merge_maps(&a.properties, &b.properties);
    node.dependent_schemas = merge_maps(&a.dependent_schemas, &b.dependent_schemas);
    node.dependencies = merge_dependencies(&a.dependencies, &b.dependencies);
    node.pattern_properties = merge_patterns(&a.pattern_properties, &b.pattern_properties);

    node.additional_properties = merge_boxes(&a.additional_properties, &b.additional_properties);
    node.property_names = merge_boxes(&a.property_names, &b.property_names);
    node.items = merge_boxes(&a.items, &b.items);
    node.additional_items = merge_boxes(&a.additional_items, &b.additional_items);
    node.contains = merge_boxes(&a.contains, &b.contains);
    node.unevaluated_properties = merge_boxes(&a.unevaluated_properties, &b.unevaluated_properties);
    node.unevaluated_items = merge_boxes(&a.unevaluated_items, &b.unevaluated_items);
    node.not = merge_boxes(&a.not, &b.not);
    node.if_ = merge_boxes(&a.if_, &b.if_);
    node.then = merge_boxes(&a.then, &b.then);
    node.else_ = merge_boxes(&a.else_, &b.else_);

    node.prefix_items = merge_positional(&a.prefix_items, &b.prefix_items);
    node.all_of = concat_nodes(&a.all_of, &b.all_of);
    node.any_of = concat_nodes(&a.any_of, &b.any_of);
    node.one_of = concat_nodes(&a.one_of, &b.one_of);

    node.reducers = merge_hooks(&a.reducers, &b.reducers, true);
    node.resolvers = merge_hooks(&a.resolvers, &b.resolvers, true);
    node.validators = merge_hooks(&a.validators, &b.validators, false);
    node.prune_keyword_state();
    node.retain_present_hooks();
    node
}

/// Merge two nodes and remove `keywords` from the result.
pub fn merge_omitting(a: &SchemaNode, b: &SchemaNode, keywords: &[&str]) -> SchemaNode {
    merge(a, b).without(keywords)
}

fn merge_maps(
    a: &Option<IndexMap<String, SchemaNode>>,
    b: &Option<IndexMap<String, SchemaNode>>,
) -> Option<IndexMap<String, SchemaNode>> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for (key, node) in b {
                let value = match merged.get(key) {
                    Some(existing) => merge(existing, node),
                    None => node.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Some(merged)
        }
        (Some(map), None) | (None, Some(map)) => Some(map.clone()),
        (None, None) => None,
    }
}

fn merge_dependencies(
    a: &Option<IndexMap<String, Dependency>>,
    b: &Option<IndexMap<String, Dependency>>,
) -> Option<IndexMap<String, Dependency>> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for (key, dependency) in b {
                let value = match (merged.get(key), dependency) {
                    (Some(Dependency::Schema(x)), Dependency::Schema(y)) => {
                        Dependency::Schema(merge(x, y))
                    }
                    (Some(Dependency::Required(x)), Dependency::Required(y)) => {
                        let mut names = x.clone();
                        for name in y {
                            if !names.contains(name) {
                                names.push(name.clone());
                            }
                        }
                        Dependency::Required(names)
                    }
                    _ => dependency.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Some(merged)
        }
        (Some(map), None) | (None, Some(map)) => Some(map.clone()),
        (None, None) => None,
    }
}

fn merge_patterns(
    a: &Option<Vec<PatternProperty>>,
    b: &Option<Vec<PatternProperty>>,
) -> Option<Vec<PatternProperty>> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for pattern in b {
                match merged.iter_mut().find(|p| p.pattern == pattern.pattern) {
                    Some(existing) => existing.node = merge(&existing.node, &pattern.node),
                    None => merged.push(pattern.clone()),
                }
            }
            Some(merged)
        }
        (Some(list), None) | (None, Some(list)) => Some(list.clone()),
        (None, None) => None,
    }
}

fn merge_boxes(
    a: &Option<Box<SchemaNode>>,
    b: &Option<Box<SchemaNode>>,
) -> Option<Box<SchemaNode>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Box::new(merge(a, b))),
        (Some(node), None) | (None, Some(node)) => Some(node.clone()),
        (None, None) => None,
    }
}

fn merge_positional(
    a: &Option<Vec<SchemaNode>>,
    b: &Option<Vec<SchemaNode>>,
) -> Option<Vec<SchemaNode>> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let len = a.len().max(b.len());
            let merged = (0..len)
                .filter_map(|index| match (a.get(index), b.get(index)) {
                    (Some(x), Some(y)) => Some(merge(x, y)),
                    (Some(x), None) | (None, Some(x)) => Some(x.clone()),
                    (None, None) => None,
                })
                .collect();
            Some(merged)
        }
        (Some(list), None) | (None, Some(list)) => Some(list.clone()),
        (None, None) => None,
    }
}

fn concat_nodes(a: &Option<Vec<SchemaNode>>, b: &Option<Vec<SchemaNode>>) -> Option<Vec<SchemaNode>> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for node in b {
                let duplicate = merged.iter().any(|existing| {
                    existing.schema_location == node.schema_location
                        && json_equal(&existing.schema, &node.schema)
                });
                if !duplicate {
                    merged.push(node.clone());
                }
            }
            Some(merged)
        }
        (Some(list), None) | (None, Some(list)) => Some(list.clone()),
        (None, None) => None,
    }
}

/// Concatenate two hook lists, keeping the first entry of every id.
fn merge_hooks(a: &[Keyword], b: &[Keyword], sorted: bool) -> Vec<Keyword> {
    let mut hooks: Vec<Keyword> = a.to_vec();
    for keyword in b {
        if !hooks.iter().any(|existing| existing.id == keyword.id) {
            hooks.push(*keyword);
        }
    }
    if sorted {
        sort_hooks(&mut hooks);
    }
    hooks
}

impl SchemaNode {
    /// Clear precomputed state of keywords that are no longer in the schema.
    pub(crate) fn prune_keyword_state(&mut self) {
        let Value::Object(schema) = &self.schema else {
            return;
        };
        let absent: Vec<&'static str> = STATEFUL_KEYWORDS
            .iter()
            .copied()
            .filter(|keyword| !schema.contains_key(*keyword))
            .collect();
        let has_defs = schema.contains_key("$defs") || schema.contains_key("definitions");
        let array_items = schema.get("items").is_some_and(Value::is_array);
        let has_recursive_ref = schema.contains_key("$recursiveRef");
        let has_dynamic_ref = schema.contains_key("$dynamicRef");
        for keyword in absent {
            match keyword {
                "$defs" | "definitions" if has_defs => {}
                "prefixItems" if array_items => {}
                "$recursiveRef" if has_dynamic_ref => {}
                "$dynamicRef" if has_recursive_ref => {}
                _ => self.clear_keyword_state(keyword),
            }
        }
    }
}

/// Keywords with precomputed node state.
const STATEFUL_KEYWORDS: &[&str] = &[
    "$ref",
    "$recursiveRef",
    "$dynamicRef",
    "$defs",
    "definitions",
    "properties",
    "patternProperties",
    "additionalProperties",
    "propertyNames",
    "dependencies",
    "dependentSchemas",
    "items",
    "prefixItems",
    "additionalItems",
    "contains",
    "unevaluatedProperties",
    "unevaluatedItems",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "pattern",
];

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::compile;
    use crate::config::CompileOptions;

    fn node(schema: Value) -> SchemaNode {
        compile::compile(schema, CompileOptions::default()).unwrap()
    }

    #[test]
    fn test_merge_schema_booleans() {
        assert_eq!(merge_schema(&json!(false), &json!({ "type": "a" })), json!(false));
        assert_eq!(merge_schema(&json!({ "type": "a" }), &json!(false)), json!(false));
        assert_eq!(merge_schema(&json!(true), &json!({ "type": "a" })), json!({ "type": "a" }));
    }

    #[test]
    fn test_merge_schema_objects() {
        let merged = merge_schema(
            &json!({ "type": "object", "required": ["a"], "properties": { "a": { "type": "string" } } }),
            &json!({ "required": ["a", "b"], "properties": { "a": { "minLength": 1 }, "b": {} }, "title": "B" }),
        );
        assert_eq!(
            merged,
            json!({
                "type": "object",
                "required": ["a", "b"],
                "properties": { "a": { "type": "string", "minLength": 1 }, "b": {} },
                "title": "B"
            })
        );
    }

    #[test]
    fn test_prefix_items_win_over_array_items() {
        let merged = merge_schema(
            &json!({ "items": [{ "type": "string" }] }),
            &json!({ "prefixItems": [{ "type": "number" }] }),
        );
        assert_eq!(merged, json!({ "prefixItems": [{ "type": "number" }] }));
        let merged = merge_schema(
            &json!({ "prefixItems": [{ "type": "string" }, {}] }),
            &json!({ "prefixItems": [{ "minLength": 1 }] }),
        );
        assert_eq!(
            merged,
            json!({ "prefixItems": [{ "type": "string", "minLength": 1 }, {}] })
        );
    }

    #[test]
    fn test_merge_nodes_combines_state_and_hooks() {
        let a = node(json!({ "properties": { "a": { "type": "string" } } }));
        let b = node(json!({ "properties": { "b": { "type": "number" } }, "required": ["b"] }));
        let merged = merge(&a, &b);
        let properties = merged.properties.as_ref().unwrap();
        assert_eq!(properties.len(), 2);
        let ids: Vec<&str> = merged.validators.iter().map(|k| k.id).collect();
        assert_eq!(ids.iter().filter(|id| **id == "properties").count(), 1);
        assert!(ids.contains(&"required"));
        assert_eq!(merged.schema_location, a.schema_location);
        assert!(!merged.is_valid(&json!({ "a": "x" })));
        assert!(merged.is_valid(&json!({ "a": "x", "b": 1 })));
    }

    #[test]
    fn test_merge_with_self_omitting_one_of() {
        let a = node(json!({ "type": "object", "oneOf": [{ "required": ["a"] }, { "required": ["b"] }] }));
        let merged = merge_omitting(&a, &a, &["oneOf"]);
        assert_eq!(merged.schema, json!({ "type": "object" }));
        assert!(merged.one_of.is_none());
        assert!(merged.reducers.iter().all(|k| k.keyword != "oneOf"));
        assert!(merged.validators.iter().all(|k| k.keyword != "oneOf"));
    }

    #[test]
    fn test_merge_false_drops_hooks() {
        let a = node(json!({ "type": "string" }));
        let b = node(json!(false));
        let merged = merge(&a, &b);
        assert!(merged.is_false());
        assert!(merged.validators.is_empty());
        assert!(!merged.is_valid(&json!("x")));
    }
}
