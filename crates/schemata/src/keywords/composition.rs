//! `allOf`, `anyOf`, `oneOf` and `not`
//!
//! Branch checks are trial validations: only synchronous errors decide
//! whether a branch matches.

use serde_json::{Value, json};

use crate::compile::Compiler;
use crate::dialect::Keyword;
use crate::error::{ErrorCode, JsonError};
use crate::keywords::{child_pointer, parse_box, parse_list};
use crate::merge::merge;
use crate::node::SchemaNode;
use crate::reduce::{ReduceInput, ReduceOptions, mark, reduce_node};
use crate::reference::resolve_ref;
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, is_valid, sync_errors, validate_node};

pub const ALL_OF: Keyword = Keyword::new("allOf", "allOf")
    .with_order(8)
    .with_parse(parse_all_of)
    .with_reduce(reduce_all_of)
    .with_validate(validate_all_of);

pub const ANY_OF: Keyword = Keyword::new("anyOf", "anyOf")
    .with_order(7)
    .with_parse(parse_any_of)
    .with_reduce(reduce_any_of)
    .with_validate(validate_any_of);

pub const ONE_OF: Keyword = Keyword::new("oneOf", "oneOf")
    .with_order(6)
    .with_parse(parse_one_of)
    .with_reduce(reduce_one_of)
    .with_validate(validate_one_of);

pub const NOT: Keyword = Keyword::new("not", "not")
    .with_parse(parse_not)
    .with_validate(validate_not);

fn merge_into(merged: Option<SchemaNode>, node: SchemaNode) -> Option<SchemaNode> {
    Some(match merged {
        Some(merged) => merge(&merged, &node),
        None => node,
    })
}

fn parse_all_of(node: &mut SchemaNode, compiler: &Compiler) {
    node.all_of = parse_list(node, compiler, "allOf");
}

fn reduce_all_of(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some(branches) = &input.node.all_of else {
        return Ok(None);
    };
    let mut merged = None;
    for (index, branch) in branches.iter().enumerate() {
        match input.reduce(branch, path) {
            Ok(reduced) => merged = merge_into(merged, reduced),
            Err(error) => {
                tracing::debug!(index, code = %error.code, "skipping allOf branch that failed to reduce");
            }
        }
    }
    Ok(merged.map(|node| mark(node, "allOf")))
}

fn validate_all_of(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(branches) = &input.node.all_of else {
        return Vec::new();
    };
    branches
        .iter()
        .flat_map(|branch| validate_node(branch, input.data, input.pointer, path))
        .collect()
}

fn parse_any_of(node: &mut SchemaNode, compiler: &Compiler) {
    node.any_of = parse_list(node, compiler, "anyOf");
}

fn reduce_any_of(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some(branches) = &input.node.any_of else {
        return Ok(None);
    };
    let mut merged = None;
    for (index, branch) in branches.iter().enumerate() {
        if !is_valid(branch, input.data, input.pointer, path) {
            continue;
        }
        let reduced = input.reduce(branch, path)?;
        merged = merge_into(merged, mark(reduced, format!("anyOf/{index}")));
    }
    Ok(merged)
}

fn validate_any_of(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(branches) = &input.node.any_of else {
        return Vec::new();
    };
    if branches.iter().any(|branch| is_valid(branch, input.data, input.pointer, path)) {
        return Vec::new();
    }
    vec![input.error(ErrorCode::AnyOf, json!({ "anyOf": input.node.schema.get("anyOf") }))]
}

fn parse_one_of(node: &mut SchemaNode, compiler: &Compiler) {
    node.one_of = parse_list(node, compiler, "oneOf");
}

fn reduce_one_of(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some(branches) = &input.node.one_of else {
        return Ok(None);
    };
    let index = select_one_of(
        input.node,
        branches,
        input.data,
        input.pointer,
        path,
        input.options.fuzzy_one_of,
    )?;
    let reduced = input.reduce(&branches[index], path)?;
    Ok(Some(mark(reduced, format!("oneOf/{index}"))))
}

fn validate_one_of(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(branches) = &input.node.one_of else {
        return Vec::new();
    };
    match strict_one_of(input.node, branches, input.data, input.pointer, path) {
        Ok(_) => Vec::new(),
        Err(error) => vec![ValidationOutcome::Error(error)],
    }
}

/// Pick the `oneOf` branch for `data`.
///
/// With a declarator keyword on `node` the branch is chosen by the value of
/// the declared property. Otherwise exactly one branch has to validate. In
/// fuzzy mode a failed strict selection falls back to ranking: `null` data
/// takes the first branch, object data takes the branch with the most
/// declared properties that validate (earliest branch on a tie).
pub(crate) fn select_one_of(
    node: &SchemaNode,
    branches: &[SchemaNode],
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
    fuzzy: bool,
) -> Result<usize, JsonError> {
    if branches.is_empty() {
        return Err(node.create_error(ErrorCode::OneOf, pointer, data, json!({ "oneOf": [] })));
    }
    let declarator = &node.context.config.one_of_declarator;
    if let Some(property) = node.schema.get(declarator.as_str()).and_then(Value::as_str) {
        return select_by_declarator(node, branches, data, pointer, path, property);
    }
    let strict = strict_one_of(node, branches, data, pointer, path);
    if strict.is_ok() || !fuzzy {
        return strict;
    }
    match data {
        Value::Null => Ok(0),
        Value::Object(object) => {
            let mut best: Option<(usize, usize)> = None;
            for (index, branch) in branches.iter().enumerate() {
                let score = fuzzy_score(branch, data, object, pointer, path);
                if best.is_none_or(|(_, top)| score > top) {
                    best = Some((index, score));
                }
            }
            match best {
                Some((index, score)) if score > 0 => {
                    tracing::trace!(index, score, "fuzzy oneOf selection");
                    Ok(index)
                }
                _ => strict,
            }
        }
        _ => strict,
    }
}

fn strict_one_of(
    node: &SchemaNode,
    branches: &[SchemaNode],
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
) -> Result<usize, JsonError> {
    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for (index, branch) in branches.iter().enumerate() {
        let branch_errors = sync_errors(branch, data, pointer, path);
        if branch_errors.is_empty() {
            matches.push(index);
        } else {
            errors.extend(branch_errors);
        }
    }
    match matches.as_slice() {
        [index] => Ok(*index),
        [] => Err(node.create_error(
            ErrorCode::OneOf,
            pointer,
            data,
            json!({ "oneOf": branches.len(), "errors": errors }),
        )),
        _ => {
            let locations: Vec<&str> = matches
                .iter()
                .map(|index| branches[*index].schema_location.as_str())
                .collect();
            Err(node.create_error(
                ErrorCode::MultipleOneOf,
                pointer,
                data,
                json!({ "matches": locations }),
            ))
        }
    }
}

/// Data properties declared by `branch` that validate against it.
fn fuzzy_score(
    branch: &SchemaNode,
    data: &Value,
    object: &serde_json::Map<String, Value>,
    pointer: &str,
    path: &mut ValidationPath,
) -> usize {
    let reduced = reduce_node(branch, data, None, pointer, path, ReduceOptions { fuzzy_one_of: true })
        .unwrap_or_else(|_| branch.clone());
    let Some(properties) = &reduced.properties else {
        return 0;
    };
    object
        .iter()
        .filter(|(name, value)| {
            properties
                .get(name.as_str())
                .is_some_and(|child| is_valid(child, value, &child_pointer(pointer, name), path))
        })
        .count()
}

fn select_by_declarator(
    node: &SchemaNode,
    branches: &[SchemaNode],
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
    property: &str,
) -> Result<usize, JsonError> {
    let Some(value) = data.get(property) else {
        return Err(node.create_error(
            ErrorCode::MissingOneOfProperty,
            pointer,
            data,
            json!({ "property": property }),
        ));
    };
    let value_pointer = child_pointer(pointer, property);
    for (index, branch) in branches.iter().enumerate() {
        if let Some(declared) = declared_property(branch, property) {
            if is_valid(&declared, value, &value_pointer, path) {
                return Ok(index);
            }
        }
    }
    Err(node.create_error(
        ErrorCode::OneOfProperty,
        pointer,
        data,
        json!({ "property": property, "value": value }),
    ))
}

/// Schema of `property` in a branch, looking through a branch `$ref`.
fn declared_property(branch: &SchemaNode, property: &str) -> Option<SchemaNode> {
    let declared = |node: &SchemaNode| node.properties.as_ref()?.get(property).cloned();
    declared(branch).or_else(|| resolve_ref(branch).and_then(|target| declared(&target)))
}

fn parse_not(node: &mut SchemaNode, compiler: &Compiler) {
    node.not = parse_box(node, compiler, "not");
}

fn validate_not(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(not) = &input.node.not else {
        return Vec::new();
    };
    if !is_valid(not, input.data, input.pointer, path) {
        return Vec::new();
    }
    vec![input.error(ErrorCode::Not, json!({ "not": not.schema }))]
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

    fn codes(schema: Value, data: Value) -> Vec<&'static str> {
        node(schema)
            .validate(&data)
            .errors
            .iter()
            .map(|e| e.code.as_str())
            .collect()
    }

    fn select(schema: Value, data: Value, fuzzy: bool) -> Result<usize, JsonError> {
        let node = node(schema);
        let branches = node.one_of.clone().unwrap();
        select_one_of(&node, &branches, &data, "#", &mut ValidationPath::new(), fuzzy)
    }

    #[test]
    fn test_all_of_reports_every_branch() {
        let errors = codes(
            json!({ "allOf": [{ "type": "integer" }, { "minimum": 4 }, { "maximum": 2 }] }),
            json!(3),
        );
        assert_eq!(errors, vec!["minimum-error", "maximum-error"]);
    }

    #[test]
    fn test_any_of_and_not() {
        let schema = json!({ "anyOf": [{ "type": "string" }, { "minimum": 2 }] });
        assert!(codes(schema.clone(), json!(3)).is_empty());
        assert_eq!(codes(schema, json!(1)), vec!["any-of-error"]);
        assert_eq!(codes(json!({ "not": { "type": "string" } }), json!("a")), vec!["not-error"]);
        assert!(codes(json!({ "not": { "type": "string" } }), json!(1)).is_empty());
    }

    #[test]
    fn test_one_of_validation() {
        let schema = json!({ "oneOf": [{ "type": "integer" }, { "minimum": 2 }] });
        assert_eq!(codes(schema.clone(), json!(3)), vec!["multiple-one-of-error"]);
        assert!(codes(schema.clone(), json!(1)).is_empty());
        assert_eq!(codes(schema, json!(1.5)), vec!["one-of-error"]);
    }

    #[test]
    fn test_reduce_any_of_merges_valid_branches() {
        let node = node(json!({
            "anyOf": [
                { "type": "number", "title": "n" },
                { "minimum": 1 },
                { "type": "string" }
            ]
        }));
        let reduced = node.reduce(&json!(4)).unwrap();
        assert_eq!(reduced.schema, json!({ "type": "number", "title": "n", "minimum": 1 }));
        let reduced = node.reduce(&json!(true)).unwrap();
        assert_eq!(reduced.schema, json!({ "minimum": 1 }));
    }

    #[test]
    fn test_fuzzy_one_of_ranks_object_branches() {
        let schema = json!({
            "oneOf": [
                { "type": "object", "properties": { "a": { "type": "string" } }, "required": ["z"] },
                {
                    "type": "object",
                    "properties": { "a": { "type": "string" }, "b": { "type": "number" } },
                    "required": ["z"]
                }
            ]
        });
        let data = json!({ "a": "x", "b": 1 });
        assert_eq!(select(schema.clone(), data.clone(), false).unwrap_err().code, ErrorCode::OneOf);
        assert_eq!(select(schema.clone(), data, true).unwrap(), 1);
        assert_eq!(select(schema.clone(), json!({ "a": "x" }), true).unwrap(), 0);
        assert_eq!(select(schema.clone(), json!(null), true).unwrap(), 0);
        assert_eq!(select(schema, json!({ "c": 1 }), true).unwrap_err().code, ErrorCode::OneOf);
    }

    #[test]
    fn test_declarator_selects_branch() {
        let schema = json!({
            "oneOfProperty": "kind",
            "oneOf": [
                { "properties": { "kind": { "const": "a" }, "value": { "type": "string" } } },
                { "properties": { "kind": { "const": "b" }, "value": { "type": "number" } } }
            ]
        });
        assert_eq!(select(schema.clone(), json!({ "kind": "b", "value": "x" }), false).unwrap(), 1);
        assert_eq!(
            select(schema.clone(), json!({ "value": 1 }), false).unwrap_err().code,
            ErrorCode::MissingOneOfProperty
        );
        assert_eq!(
            select(schema, json!({ "kind": "c" }), true).unwrap_err().code,
            ErrorCode::OneOfProperty
        );
    }
}
