//! `dependencies`, `dependentSchemas` and `dependentRequired`
//!
//! A dependency applies once its property is present in the data. Reduction
//! folds every active dependency into the node: required lists become a
//! `required` partial, schemas are reduced and merged.

use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::compile::{Compiler, compile_transient};
use crate::dialect::Keyword;
use crate::error::{ErrorCode, JsonError};
use crate::keywords::{malformed, parse_map};
use crate::merge::merge;
use crate::node::{Dependency, SchemaNode};
use crate::reduce::{ReduceInput, mark};
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, validate_node};

pub const DEPENDENCIES: Keyword = Keyword::new("dependencies", "dependencies")
    .with_order(4)
    .with_parse(parse_dependencies)
    .with_reduce(reduce_dependencies)
    .with_validate(validate_dependencies);

pub const DEPENDENT_SCHEMAS: Keyword = Keyword::new("dependentSchemas", "dependentSchemas")
    .with_order(4)
    .with_parse(parse_dependent_schemas)
    .with_reduce(reduce_dependent_schemas)
    .with_validate(validate_dependent_schemas);

pub const DEPENDENT_REQUIRED: Keyword = Keyword::new("dependentRequired", "dependentRequired")
    .with_order(4)
    .with_reduce(reduce_dependent_required)
    .with_validate(validate_dependent_required);

fn has_property(data: &Value, name: &str) -> bool {
    data.as_object().is_some_and(|object| object.contains_key(name))
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Accumulates the partial node produced by active dependencies.
struct Partial<'a> {
    node: &'a SchemaNode,
    required: Vec<String>,
    merged: Option<SchemaNode>,
}

impl<'a> Partial<'a> {
    fn new(node: &'a SchemaNode) -> Self {
        Self {
            node,
            required: Vec::new(),
            merged: None,
        }
    }

    fn require(&mut self, names: &[String]) {
        for name in names {
            if !self.required.contains(name) {
                self.required.push(name.clone());
            }
        }
    }

    fn add(&mut self, node: SchemaNode) {
        self.merged = Some(match self.merged.take() {
            Some(merged) => merge(&merged, &node),
            None => node,
        });
    }

    fn finish(mut self) -> Option<SchemaNode> {
        if !self.required.is_empty() {
            let required = compile_transient(self.node, json!({ "required": self.required }));
            self.merged = Some(match self.merged.take() {
                Some(merged) => merge(&required, &merged),
                None => required,
            });
        }
        self.merged
    }
}

fn missing_dependencies(
    input: &ValidationInput<'_>,
    property: &str,
    names: &[String],
) -> Vec<ValidationOutcome> {
    names
        .iter()
        .filter(|name| !has_property(input.data, name))
        .map(|name| {
            input.error(
                ErrorCode::MissingDependency,
                json!({ "missingProperty": name, "property": property }),
            )
        })
        .collect()
}

fn parse_dependencies(node: &mut SchemaNode, compiler: &Compiler) {
    let Some(Value::Object(entries)) = node.schema.get("dependencies") else {
        malformed(node, "dependencies");
        return;
    };
    let mut dependencies = IndexMap::new();
    for (name, value) in entries {
        if let Some(names) = string_list(value) {
            dependencies.insert(name.clone(), Dependency::Required(names));
        } else if let Some(child) = compiler.child(node, &["dependencies", name]) {
            dependencies.insert(name.clone(), Dependency::Schema(child));
        }
    }
    node.dependencies = Some(dependencies);
}

fn reduce_dependencies(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some(dependencies) = &input.node.dependencies else {
        return Ok(None);
    };
    let mut partial = Partial::new(input.node);
    for (name, dependency) in dependencies {
        if !has_property(input.data, name) {
            continue;
        }
        match dependency {
            Dependency::Required(names) => partial.require(names),
            Dependency::Schema(child) => {
                let reduced = input.reduce(child, path)?;
                partial.add(mark(reduced, format!("dependencies/{name}")));
            }
        }
    }
    Ok(partial.finish())
}

fn validate_dependencies(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(dependencies) = &input.node.dependencies else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    for (name, dependency) in dependencies {
        if !has_property(input.data, name) {
            continue;
        }
        match dependency {
            Dependency::Required(names) => outcomes.extend(missing_dependencies(input, name, names)),
            Dependency::Schema(child) => {
                outcomes.extend(validate_node(child, input.data, input.pointer, path));
            }
        }
    }
    outcomes
}

fn parse_dependent_schemas(node: &mut SchemaNode, compiler: &Compiler) {
    node.dependent_schemas = parse_map(node, compiler, "dependentSchemas");
}

fn reduce_dependent_schemas(
    input: &ReduceInput<'_>,
    path: &mut ValidationPath,
) -> Result<Option<SchemaNode>, JsonError> {
    let Some(schemas) = &input.node.dependent_schemas else {
        return Ok(None);
    };
    let mut partial = Partial::new(input.node);
    for (name, child) in schemas {
        if has_property(input.data, name) {
            let reduced = input.reduce(child, path)?;
            partial.add(mark(reduced, format!("dependentSchemas/{name}")));
        }
    }
    Ok(partial.finish())
}

fn validate_dependent_schemas(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(schemas) = &input.node.dependent_schemas else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    for (name, child) in schemas {
        if has_property(input.data, name) {
            outcomes.extend(validate_node(child, input.data, input.pointer, path));
        }
    }
    outcomes
}

fn dependent_required(node: &SchemaNode) -> Vec<(&str, Vec<String>)> {
    match node.schema.get("dependentRequired") {
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(name, value)| string_list(value).map(|names| (name.as_str(), names)))
            .collect(),
        _ => Vec::new(),
    }
}

fn reduce_dependent_required(
    input: &ReduceInput<'_>,
    _path: &mut ValidationPath,
) -> Result<Option<SchemaNode>, JsonError> {
    let mut partial = Partial::new(input.node);
    for (name, names) in dependent_required(input.node) {
        if has_property(input.data, name) {
            partial.require(&names);
        }
    }
    Ok(partial.finish())
}

fn validate_dependent_required(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    if !input.data.is_object() {
        return Vec::new();
    }
    dependent_required(input.node)
        .into_iter()
        .filter(|(name, _)| has_property(input.data, name))
        .flat_map(|(name, names)| missing_dependencies(input, name, &names))
        .collect()
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
    fn test_legacy_dependencies() {
        let node = node(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "dependencies": {
                "a": ["b"],
                "c": { "required": ["d"] }
            }
        }));
        let errors = node.validate(&json!({ "a": 1, "c": 2 })).errors;
        let codes: Vec<_> = errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["missing-dependency-error", "required-property-error"]);
        assert_eq!(errors[0].data.extra["missingProperty"], json!("b"));
        assert!(node.is_valid(&json!({ "b": 1 })));

        let reduced = node.reduce(&json!({ "a": 1, "c": 2 })).unwrap();
        assert_eq!(reduced.schema, json!({ "$schema": "http://json-schema.org/draft-07/schema#", "required": ["b", "d"] }));
    }

    #[test]
    fn test_dependent_required() {
        let node = node(json!({ "dependentRequired": { "a": ["b", "c"] } }));
        let errors = node.validate(&json!({ "a": 1, "b": 2 })).errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data.extra["missingProperty"], json!("c"));
        let reduced = node.reduce(&json!({ "a": 1 })).unwrap();
        assert_eq!(reduced.schema, json!({ "required": ["b", "c"] }));
        let reduced = node.reduce(&json!({})).unwrap();
        assert_eq!(reduced.schema, json!({}));
    }
}
