//! Object keywords

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::compile::{Compiler, compile_transient};
use crate::dialect::Keyword;
use crate::error::{ErrorCode, JsonError};
use crate::get::ResolveInput;
use crate::keywords::string::build_regex;
use crate::keywords::{child_pointer, malformed, parse_box, parse_map, usize_keyword};
use crate::merge::merge;
use crate::node::{PatternProperty, SchemaNode};
use crate::reduce::ReduceInput;
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, sync_errors, validate_node};

pub const PROPERTIES: Keyword = Keyword::new("properties", "properties")
    .with_parse(parse_properties)
    .with_resolve(resolve_properties)
    .with_validate(validate_properties);

pub const PATTERN_PROPERTIES: Keyword = Keyword::new("patternProperties", "patternProperties")
    .with_order(3)
    .with_parse(parse_pattern_properties)
    .with_reduce(reduce_pattern_properties)
    .with_resolve(resolve_pattern_properties)
    .with_validate(validate_pattern_properties);

pub const ADDITIONAL_PROPERTIES: Keyword = Keyword::new("additionalProperties", "additionalProperties")
    .with_order(-1)
    .with_parse(parse_additional_properties)
    .with_resolve(resolve_additional_properties)
    .with_validate(validate_additional_properties);

pub const PROPERTY_NAMES: Keyword = Keyword::new("propertyNames", "propertyNames")
    .with_parse(parse_property_names)
    .with_validate(validate_property_names);

pub const REQUIRED: Keyword = Keyword::new("required", "required").with_validate(validate_required);
pub const MIN_PROPERTIES: Keyword =
    Keyword::new("minProperties", "minProperties").with_validate(validate_min_properties);
pub const MAX_PROPERTIES: Keyword =
    Keyword::new("maxProperties", "maxProperties").with_validate(validate_max_properties);

// =============================================================================
// Shared helpers
// =============================================================================

/// Pattern nodes whose regex matches `name`.
pub(crate) fn matching_patterns<'a>(node: &'a SchemaNode, name: &'a str) -> impl Iterator<Item = &'a SchemaNode> {
    node.pattern_properties
        .iter()
        .flatten()
        .filter(move |pattern| pattern.regex.is_match(name))
        .map(|pattern| &pattern.node)
}

/// Whether `name` is covered by neither `properties` nor `patternProperties`.
pub(crate) fn is_additional(node: &SchemaNode, name: &str) -> bool {
    let declared = node
        .properties
        .as_ref()
        .is_some_and(|properties| properties.contains_key(name));
    !declared && matching_patterns(node, name).next().is_none()
}

/// Names listed in `required`.
pub(crate) fn required_names(schema: &Value) -> Vec<&str> {
    match schema.get("required") {
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// properties
// =============================================================================

fn parse_properties(node: &mut SchemaNode, compiler: &Compiler) {
    node.properties = parse_map(node, compiler, "properties");
}

fn resolve_properties(input: &ResolveInput<'_>) -> Option<SchemaNode> {
    input.node.properties.as_ref()?.get(input.key).cloned()
}

fn validate_properties(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Object(object), Some(properties)) = (input.data, &input.node.properties) else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    for (name, child) in properties {
        if let Some(value) = object.get(name) {
            outcomes.extend(validate_node(child, value, &child_pointer(input.pointer, name), path));
        }
    }
    outcomes
}

// =============================================================================
// patternProperties
// =============================================================================

fn parse_pattern_properties(node: &mut SchemaNode, compiler: &Compiler) {
    let Some(Value::Object(entries)) = node.schema.get("patternProperties") else {
        malformed(node, "patternProperties");
        return;
    };
    let flags = compiler.context.config.regex_flags.clone();
    let patterns = entries
        .keys()
        .filter_map(|pattern| {
            let regex = match build_regex(pattern, &flags) {
                Ok(regex) => regex,
                Err(error) => {
                    tracing::debug!(pattern, %error, "invalid patternProperties regex");
                    return None;
                }
            };
            let child = compiler.child(node, &["patternProperties", pattern])?;
            Some(PatternProperty {
                pattern: pattern.clone(),
                regex,
                node: child,
            })
        })
        .collect();
    node.pattern_properties = Some(patterns);
}

/// Move matching pattern schemas into `properties` for every data key and the
/// requested key.
fn reduce_pattern_properties(input: &ReduceInput<'_>, _path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let mut names: Vec<&str> = match input.data {
        Value::Object(object) => object.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    if let Some(key) = input.key {
        if !names.contains(&key) {
            names.push(key);
        }
    }
    let mut merged: IndexMap<String, SchemaNode> = IndexMap::new();
    for name in names {
        let combined = matching_patterns(input.node, name).fold(None, |acc: Option<SchemaNode>, pattern| {
            Some(match acc {
                Some(acc) => merge(&acc, pattern),
                None => pattern.clone(),
            })
        });
        if let Some(combined) = combined {
            merged.insert(name.to_string(), combined);
        }
    }
    if merged.is_empty() {
        return Ok(None);
    }
    let schemas: Map<String, Value> = merged
        .iter()
        .map(|(name, node)| (name.clone(), node.schema.clone()))
        .collect();
    let mut partial = compile_transient(input.node, json!({ "properties": schemas }));
    partial.properties = Some(merged);
    Ok(Some(partial))
}

fn resolve_pattern_properties(input: &ResolveInput<'_>) -> Option<SchemaNode> {
    let declared = input
        .node
        .properties
        .as_ref()
        .and_then(|properties| properties.get(input.key))
        .cloned();
    matching_patterns(input.node, input.key).fold(declared, |acc, pattern| {
        Some(match acc {
            Some(acc) => merge(&acc, pattern),
            None => pattern.clone(),
        })
    })
}

fn validate_pattern_properties(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Value::Object(object) = input.data else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    for (name, value) in object {
        for pattern in matching_patterns(input.node, name) {
            outcomes.extend(validate_node(pattern, value, &child_pointer(input.pointer, name), path));
        }
    }
    outcomes
}

// =============================================================================
// additionalProperties
// =============================================================================

fn parse_additional_properties(node: &mut SchemaNode, compiler: &Compiler) {
    node.additional_properties = parse_box(node, compiler, "additionalProperties");
}

fn resolve_additional_properties(input: &ResolveInput<'_>) -> Option<SchemaNode> {
    let additional = input.node.additional_properties.as_deref()?;
    if additional.is_false() || !is_additional(input.node, input.key) {
        return None;
    }
    Some(additional.clone())
}

fn validate_additional_properties(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Object(object), Some(additional)) = (input.data, &input.node.additional_properties) else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    for (name, value) in object {
        if !is_additional(input.node, name) {
            continue;
        }
        let pointer = child_pointer(input.pointer, name);
        if additional.is_false() {
            let error = input.node.create_error(
                ErrorCode::NoAdditionalProperties,
                &pointer,
                value,
                json!({ "property": name, "properties": input.node.properties.as_ref().map(|p| p.keys().collect::<Vec<_>>()) }),
            );
            outcomes.push(ValidationOutcome::Error(error));
            continue;
        }
        outcomes.extend(validate_node(additional, value, &pointer, path));
    }
    outcomes
}

// =============================================================================
// propertyNames
// =============================================================================

fn parse_property_names(node: &mut SchemaNode, compiler: &Compiler) {
    node.property_names = parse_box(node, compiler, "propertyNames");
}

fn validate_property_names(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Object(object), Some(names)) = (input.data, &input.node.property_names) else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    for name in object.keys() {
        let key = Value::String(name.clone());
        let errors = sync_errors(names, &key, &child_pointer(input.pointer, name), path);
        if !errors.is_empty() {
            outcomes.push(input.error(
                ErrorCode::InvalidPropertyName,
                json!({ "property": name, "errors": errors }),
            ));
        }
    }
    outcomes
}

// =============================================================================
// required, minProperties, maxProperties
// =============================================================================

fn validate_required(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Value::Object(object) = input.data else {
        return Vec::new();
    };
    required_names(&input.node.schema)
        .into_iter()
        .filter(|name| !object.contains_key(*name))
        .map(|name| input.error(ErrorCode::RequiredProperty, json!({ "key": name })))
        .collect()
}

fn validate_min_properties(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Object(object), Some(min)) = (input.data, usize_keyword(input.node, "minProperties")) else {
        return Vec::new();
    };
    if object.len() >= min {
        return Vec::new();
    }
    vec![input.error(
        ErrorCode::MinProperties,
        json!({ "minProperties": min, "length": object.len() }),
    )]
}

fn validate_max_properties(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Object(object), Some(max)) = (input.data, usize_keyword(input.node, "maxProperties")) else {
        return Vec::new();
    };
    if object.len() <= max {
        return Vec::new();
    }
    vec![input.error(
        ErrorCode::MaxProperties,
        json!({ "maxProperties": max, "length": object.len() }),
    )]
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

    #[test]
    fn test_additional_properties_false() {
        let schema = json!({
            "properties": { "a": { "type": "string" } },
            "patternProperties": { "^x-": { "type": "number" } },
            "additionalProperties": false
        });
        assert!(codes(schema.clone(), json!({ "a": "1", "x-b": 2 })).is_empty());
        let errors = node(schema).validate(&json!({ "a": "1", "c": 2 })).errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::NoAdditionalProperties);
        assert_eq!(errors[0].pointer(), "#/c");
        assert_eq!(errors[0].data.extra["property"], json!("c"));
    }

    #[test]
    fn test_pattern_properties_validate_matching_keys() {
        let schema = json!({ "patternProperties": { "^n": { "type": "number" } } });
        assert_eq!(codes(schema.clone(), json!({ "num": "x" })), vec!["type-error"]);
        assert!(codes(schema, json!({ "other": "x" })).is_empty());
    }

    #[test]
    fn test_required_and_counts() {
        assert_eq!(
            codes(json!({ "required": ["a", "b"] }), json!({ "a": 1 })),
            vec!["required-property-error"]
        );
        assert_eq!(codes(json!({ "minProperties": 2 }), json!({ "a": 1 })), vec!["min-properties-error"]);
        assert_eq!(
            codes(json!({ "maxProperties": 0 }), json!({ "a": 1 })),
            vec!["max-properties-error"]
        );
        assert!(codes(json!({ "required": ["a"] }), json!([1])).is_empty());
    }

    #[test]
    fn test_property_names() {
        let schema = json!({ "propertyNames": { "maxLength": 3 } });
        assert!(codes(schema.clone(), json!({ "abc": 1 })).is_empty());
        assert_eq!(codes(schema, json!({ "abcd": 1 })), vec!["invalid-property-name-error"]);
    }

    #[test]
    fn test_reduce_pattern_properties_into_properties() {
        let node = node(json!({
            "properties": { "na": { "minimum": 1 } },
            "patternProperties": { "^n": { "type": "number" } }
        }));
        let reduced = node.reduce(&json!({ "na": 2, "nb": 3 })).unwrap();
        assert_eq!(
            reduced.schema,
            json!({
                "properties": {
                    "na": { "minimum": 1, "type": "number" },
                    "nb": { "type": "number" }
                }
            })
        );
        assert!(reduced.properties.unwrap().contains_key("nb"));
    }
}
