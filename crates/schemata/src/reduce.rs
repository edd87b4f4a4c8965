//! Schema reduction
//!
//! Reduction folds the dynamic keywords of a node (`allOf`, `oneOf`, `if`,
//! `$ref`, ...) against a data instance into one concrete node. Every reducer
//! hook returns an optional partial node which is merged into the node with
//! the reduced keywords removed. Partial nodes that bring new dynamic
//! keywords are reduced again.

use serde_json::Value;

use crate::compile::compile_transient;
use crate::error::JsonError;
use crate::merge::merge;
use crate::node::SchemaNode;
use crate::validate::ValidationPath;

/// Limit for repeated reduction of partial results.
const MAX_REDUCE_PASSES: usize = 32;

/// Options for a reduction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReduceOptions {
    /// Pick the best matching `oneOf` branch instead of failing when no
    /// single branch validates
    pub fuzzy_one_of: bool,
}

/// Input handed to reducer hooks.
pub struct ReduceInput<'a> {
    pub node: &'a SchemaNode,
    pub data: &'a Value,
    /// Property a caller asks for, used when the data does not contain it
    pub key: Option<&'a str>,
    pub pointer: &'a str,
    pub options: ReduceOptions,
}

impl ReduceInput<'_> {
    /// Reduce another node with the same data and options.
    pub fn reduce(&self, node: &SchemaNode, path: &mut ValidationPath) -> Result<SchemaNode, JsonError> {
        reduce_node(node, self.data, self.key, self.pointer, path, self.options)
    }
}

/// Reduce `node` against `data`.
pub fn reduce_node(
    node: &SchemaNode,
    data: &Value,
    key: Option<&str>,
    pointer: &str,
    path: &mut ValidationPath,
    options: ReduceOptions,
) -> Result<SchemaNode, JsonError> {
    let mut current = match &node.schema {
        Value::Bool(false) => return Ok(node.clone()),
        Value::Bool(true) => return Ok(compile_transient(node, (node.dialect.methods.create_schema)(data))),
        _ => node.clone(),
    };
    for _ in 0..MAX_REDUCE_PASSES {
        if current.reducers.is_empty() {
            return Ok(current);
        }
        if path.is_cycle(&current, pointer) {
            tracing::debug!(location = %current.schema_location, pointer, "reference cycle while reducing");
            return Ok(current.without(&reduced_keywords(&current)));
        }
        current = reduce_pass(&current, data, key, pointer, path, options)?;
    }
    tracing::debug!(location = %node.schema_location, "reduction did not settle");
    Ok(current.without(&reduced_keywords(&current)))
}

fn reduce_pass(
    node: &SchemaNode,
    data: &Value,
    key: Option<&str>,
    pointer: &str,
    path: &mut ValidationPath,
    options: ReduceOptions,
) -> Result<SchemaNode, JsonError> {
    let depth = path.len();
    path.push(node, pointer);
    let input = ReduceInput {
        node,
        data,
        key,
        pointer,
        options,
    };
    let mut reduced = node.without(&reduced_keywords(node));
    let mut result = Ok(());
    for keyword in &node.reducers {
        let Some(reduce) = keyword.reduce else {
            continue;
        };
        match reduce(&input, path) {
            Ok(Some(partial)) => {
                tracing::trace!(keyword = keyword.id, location = %node.schema_location, "merging reduced keyword");
                reduced = merge(&reduced, &partial);
            }
            Ok(None) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }
    path.truncate(depth);
    result.map(|()| reduced)
}

/// Schema keywords consumed by the reducers of `node`.
fn reduced_keywords(node: &SchemaNode) -> Vec<&'static str> {
    let mut keywords = Vec::new();
    for keyword in &node.reducers {
        keywords.push(keyword.keyword);
        if keyword.keyword == "if" {
            keywords.extend(["then", "else"]);
        }
    }
    keywords
}

/// Mark a partial node with the branch it came from.
pub(crate) fn mark(mut node: SchemaNode, marker: impl core::fmt::Display) -> SchemaNode {
    node.dynamic_id = format!("{}({marker})", node.dynamic_id);
    node
}

impl SchemaNode {
    /// Reduce this node against `data`.
    pub fn reduce(&self, data: &Value) -> Result<SchemaNode, JsonError> {
        let mut path = ValidationPath::new();
        reduce_node(
            self,
            data,
            None,
            schemata_pointer::FRAGMENT_ROOT,
            &mut path,
            ReduceOptions::default(),
        )
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
    fn test_reduce_one_of() {
        let node = node(json!({
            "oneOf": [
                { "type": "string", "title": "A" },
                { "type": "number", "title": "B" }
            ]
        }));
        let reduced = node.reduce(&json!(111)).unwrap();
        assert_eq!(reduced.schema, json!({ "type": "number", "title": "B" }));
        assert_eq!(reduced.schema_location, "#");
        assert!(reduced.one_of.is_none());
    }

    #[test]
    fn test_reduce_boolean_schemas() {
        let reduced = node(json!(false)).reduce(&json!(1)).unwrap();
        assert!(reduced.is_false());
        let reduced = node(json!(true)).reduce(&json!({ "a": "x" })).unwrap();
        assert_eq!(
            reduced.schema,
            json!({ "type": "object", "properties": { "a": { "type": "string" } } })
        );
    }

    #[test]
    fn test_reduce_all_of_and_if() {
        let node = node(json!({
            "allOf": [{ "required": ["a"] }, { "properties": { "a": { "type": "string" } } }],
            "if": { "required": ["b"] },
            "then": { "required": ["c"] },
            "else": { "required": ["d"] }
        }));
        let reduced = node.reduce(&json!({ "b": 1 })).unwrap();
        assert_eq!(
            reduced.schema,
            json!({ "required": ["a", "c"], "properties": { "a": { "type": "string" } } })
        );
        let reduced = node.reduce(&json!({})).unwrap();
        assert_eq!(reduced.schema["required"], json!(["a", "d"]));
    }

    #[test]
    fn test_reduce_nested_dependencies_compound() {
        let node = node(json!({
            "dependentSchemas": {
                "a": { "dependentSchemas": { "b": { "required": ["c"] } } }
            }
        }));
        let reduced = node.reduce(&json!({ "a": 1, "b": 2 })).unwrap();
        assert_eq!(reduced.schema, json!({ "required": ["c"] }));
    }

    #[test]
    fn test_reduce_ref_with_siblings() {
        let node = node(json!({
            "$ref": "#/$defs/base",
            "title": "outer",
            "$defs": { "base": { "type": "object", "required": ["id"] } }
        }));
        let reduced = node.reduce(&json!({})).unwrap();
        assert_eq!(reduced.schema["type"], json!("object"));
        assert_eq!(reduced.schema["required"], json!(["id"]));
        assert_eq!(reduced.schema["title"], json!("outer"));
        assert!(reduced.schema.get("$ref").is_none());
    }

    #[test]
    fn test_reduce_reports_one_of_errors() {
        let node = node(json!({ "oneOf": [{ "type": "integer" }, { "minimum": 2 }] }));
        let error = node.reduce(&json!(3)).unwrap_err();
        assert_eq!(error.code.as_str(), "multiple-one-of-error");
        let error = node.reduce(&json!(1.5)).unwrap_err();
        assert_eq!(error.code.as_str(), "one-of-error");
    }
}
