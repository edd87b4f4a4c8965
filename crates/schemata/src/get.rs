//! Child lookup and data traversal
//!
//! `get` answers "which schema applies to this property/index of the
//! data". The node is first reduced against the data (fuzzy `oneOf`, so an
//! incomplete object still selects a branch), then its resolver hooks are
//! asked for the child in descending order; the first answer wins.

use serde_json::{Value, json};

use crate::compile::compile_transient;
use crate::config::GetOptions;
use crate::error::{ErrorCode, JsonError};
use crate::keywords::child_pointer;
use crate::node::SchemaNode;
use crate::reduce::{ReduceOptions, reduce_node};
use crate::reference::resolve_ref;
use crate::validate::ValidationPath;

/// Input handed to resolver hooks.
pub struct ResolveInput<'a> {
    pub node: &'a SchemaNode,
    /// Property name or array index asked for
    pub key: &'a str,
    /// Data of the parent value
    pub data: &'a Value,
    pub pointer: &'a str,
}

/// A data value paired with the schema that applies to it.
#[derive(Debug, Clone)]
pub struct DataNode {
    pub node: SchemaNode,
    pub data: Value,
    pub pointer: String,
}

fn child_data<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    schemata_pointer::get_token(data, key)
}

/// Resolve the child for `key` below `node` with `data` as the parent value.
pub(crate) fn get_child(
    node: &SchemaNode,
    key: &str,
    data: &Value,
    pointer: &str,
    options: GetOptions,
) -> Result<Option<SchemaNode>, JsonError> {
    let mut path = ValidationPath::new();
    let reduced = reduce_node(node, data, Some(key), pointer, &mut path, ReduceOptions { fuzzy_one_of: true })?;
    let input = ResolveInput {
        node: &reduced,
        key,
        data,
        pointer,
    };
    for keyword in &reduced.resolvers {
        let Some(resolve) = keyword.resolve else {
            continue;
        };
        if let Some(child) = resolve(&input) {
            tracing::trace!(keyword = keyword.id, key, pointer, "resolved child");
            return Ok(Some(child));
        }
    }
    if options.create_schema {
        if let Some(value) = child_data(data, key) {
            let schema = (reduced.dialect.methods.create_schema)(value);
            let mut created = compile_transient(&reduced, schema);
            created.evaluation_path = schemata_pointer::join(&reduced.evaluation_path, key);
            return Ok(Some(created));
        }
    }
    if options.with_schema_warning {
        return Err(reduced.create_error(
            ErrorCode::SchemaWarning,
            &child_pointer(pointer, key),
            child_data(data, key).unwrap_or(&Value::Null),
            json!({ "key": key }),
        ));
    }
    Ok(None)
}

impl SchemaNode {
    /// The schema of the property or item `key` for the given parent data.
    ///
    /// Returns `Ok(None)` when no keyword describes `key`, unless
    /// [`GetOptions`] asks for an inferred schema or a `schema-warning`.
    pub fn get(&self, key: &str, data: &Value, options: GetOptions) -> Result<Option<SchemaNode>, JsonError> {
        get_child(self, key, data, schemata_pointer::FRAGMENT_ROOT, options)
    }

    /// The schema at a data pointer (`#/a/0`, `/a/0` or `a/0`).
    ///
    /// The final node is reduced against the data found at `pointer`, when
    /// there is any.
    pub fn get_schema(&self, pointer: &str, data: &Value, options: GetOptions) -> Result<Option<SchemaNode>, JsonError> {
        let mut node = self.clone();
        let mut current = Some(data);
        let mut location = schemata_pointer::FRAGMENT_ROOT.to_string();
        for token in schemata_pointer::split(pointer) {
            let parent = current.unwrap_or(&Value::Null);
            let Some(child) = get_child(&node, &token, parent, &location, options)? else {
                return Ok(None);
            };
            node = child;
            current = current.and_then(|value| child_data(value, &token));
            location = child_pointer(&location, &token);
        }
        match current {
            Some(value) if node.is_dynamic() => {
                let mut path = ValidationPath::new();
                reduce_node(&node, value, None, &location, &mut path, ReduceOptions { fuzzy_one_of: true }).map(Some)
            }
            _ => Ok(Some(node)),
        }
    }

    /// Candidate schemas for a new child at `key`: the branches of a `oneOf`
    /// or `anyOf` child, otherwise the child itself.
    pub fn get_child_selection(&self, key: &str) -> Result<Vec<SchemaNode>, JsonError> {
        (self.dialect.methods.get_child_selection)(self, key)
    }

    /// Every value of `data` paired with its schema, parents first.
    pub fn to_data_nodes(&self, data: &Value, pointer: &str) -> Vec<DataNode> {
        (self.dialect.methods.to_data_nodes)(self, data, pointer)
    }
}

/// Default [`DialectMethods::get_child_selection`](crate::dialect::DialectMethods).
pub fn get_child_selection(node: &SchemaNode, key: &str) -> Result<Vec<SchemaNode>, JsonError> {
    let Some(child) = get_child(node, key, &Value::Null, schemata_pointer::FRAGMENT_ROOT, GetOptions::default())?
    else {
        return Ok(Vec::new());
    };
    let child = match resolve_ref(&child) {
        Some(target) if child.is_dynamic() => target,
        _ => child,
    };
    if let Some(branches) = child.one_of.as_ref().or(child.any_of.as_ref()) {
        return Ok(branches.clone());
    }
    Ok(vec![child])
}

/// Default [`DialectMethods::to_data_nodes`](crate::dialect::DialectMethods).
pub fn to_data_nodes(node: &SchemaNode, data: &Value, pointer: &str) -> Vec<DataNode> {
    let mut nodes = Vec::new();
    collect_data_nodes(node, data, pointer, &mut nodes);
    nodes
}

fn collect_data_nodes(node: &SchemaNode, data: &Value, pointer: &str, nodes: &mut Vec<DataNode>) {
    nodes.push(DataNode {
        node: node.clone(),
        data: data.clone(),
        pointer: pointer.to_string(),
    });
    let keys: Vec<String> = match data {
        Value::Object(object) => object.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|index| index.to_string()).collect(),
        _ => return,
    };
    for key in keys {
        let Some(value) = child_data(data, &key) else {
            continue;
        };
        match get_child(node, &key, data, pointer, GetOptions::default()) {
            Ok(Some(child)) => collect_data_nodes(&child, value, &child_pointer(pointer, &key), nodes),
            Ok(None) => {}
            Err(error) => {
                tracing::debug!(pointer, key, code = %error.code, "no schema for data node");
            }
        }
    }
}

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
    fn test_get_property_and_item() {
        let node = node(json!({
            "properties": { "list": { "type": "array", "items": { "type": "string" } } }
        }));
        let list = node.get("list", &json!({}), GetOptions::default()).unwrap().unwrap();
        assert_eq!(list.schema_location, "#/properties/list");
        let item = list.get("3", &json!([]), GetOptions::default()).unwrap().unwrap();
        assert_eq!(item.schema, json!({ "type": "string" }));
    }

    #[test]
    fn test_get_unknown_key() {
        let node = node(json!({ "properties": { "a": true } }));
        assert!(node.get("b", &json!({}), GetOptions::default()).unwrap().is_none());
        let warning = node
            .get(
                "b",
                &json!({ "b": 1 }),
                GetOptions {
                    with_schema_warning: true,
                    ..GetOptions::default()
                },
            )
            .unwrap_err();
        assert_eq!(warning.code, ErrorCode::SchemaWarning);
        let created = node
            .get(
                "b",
                &json!({ "b": 1 }),
                GetOptions {
                    create_schema: true,
                    ..GetOptions::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(created.schema, json!({ "type": "integer" }));
    }

    #[test]
    fn test_get_follows_one_of_and_if() {
        let node = node(json!({
            "oneOf": [
                { "properties": { "kind": { "const": "a" }, "a": { "type": "string" } }, "required": ["kind"] },
                { "properties": { "kind": { "const": "b" }, "b": { "type": "number" } }, "required": ["kind"] }
            ]
        }));
        let child = node.get("b", &json!({ "kind": "b" }), GetOptions::default()).unwrap().unwrap();
        assert_eq!(child.schema, json!({ "type": "number" }));

        let node = super::tests::node(json!({
            "if": { "required": ["x"] },
            "then": { "properties": { "y": { "type": "string" } } }
        }));
        assert!(node.get("y", &json!({}), GetOptions::default()).unwrap().is_none());
        assert!(node.get("y", &json!({ "x": 1 }), GetOptions::default()).unwrap().is_some());
    }

    #[test]
    fn test_get_schema_walks_pointer() {
        let node = node(json!({
            "properties": {
                "a": { "type": "array", "items": { "$ref": "#/$defs/item" } }
            },
            "$defs": { "item": { "type": "object", "properties": { "name": { "type": "string" } } } }
        }));
        let data = json!({ "a": [{ "name": "x" }] });
        let found = node.get_schema("#/a/0/name", &data, GetOptions::default()).unwrap().unwrap();
        assert_eq!(found.schema, json!({ "type": "string" }));
        assert!(node.get_schema("#/b", &data, GetOptions::default()).unwrap().is_none());
    }

    #[test]
    fn test_child_selection_lists_one_of_branches() {
        let node = node(json!({
            "type": "array",
            "items": { "oneOf": [{ "type": "string" }, { "type": "number" }] }
        }));
        let selection = node.get_child_selection("0").unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection[1].schema, json!({ "type": "number" }));
    }

    #[test]
    fn test_to_data_nodes() {
        let node = node(json!({
            "properties": { "a": { "type": "array", "items": { "type": "number" } } }
        }));
        let nodes = node.to_data_nodes(&json!({ "a": [1, 2], "b": 3 }), "#");
        let pointers: Vec<&str> = nodes.iter().map(|n| n.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["#", "#/a", "#/a/0", "#/a/1"]);
        assert_eq!(nodes[3].data, json!(2));
    }
}
