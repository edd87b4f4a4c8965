//! Array keywords
//!
//! | draft | positional schemas | remaining items |
//! |-------|--------------------|-----------------|
//! | 04 to 2019-09 | `items: [..]` | `additionalItems` |
//! | 2020-12 | `prefixItems` | `items` |
//!
//! Both forms compile into `SchemaNode::prefix_items` plus either
//! `additional_items` or `items`.

use serde_json::{Value, json};

use crate::compile::Compiler;
use crate::dialect::{Draft, Keyword};
use crate::error::ErrorCode;
use crate::get::ResolveInput;
use crate::keywords::{child_pointer, parse_box, parse_list, usize_keyword};
use crate::node::SchemaNode;
use crate::types::json_equal;
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, is_valid, validate_node};

pub const PREFIX_ITEMS: Keyword = Keyword::new("prefixItems", "prefixItems")
    .with_parse(parse_prefix_items)
    .with_resolve(resolve_prefix_items)
    .with_validate(validate_prefix_items);

pub const ITEMS: Keyword = Keyword::new("items", "items")
    .with_parse(parse_items)
    .with_resolve(resolve_items)
    .with_validate(validate_items);

/// `items` of draft-04 to draft-2019-09, schema or array form.
pub const ITEMS_LEGACY: Keyword = Keyword::new("items", "items")
    .with_parse(parse_items_legacy)
    .with_resolve(resolve_items_legacy)
    .with_validate(validate_items_legacy);

pub const ADDITIONAL_ITEMS: Keyword = Keyword::new("additionalItems", "additionalItems")
    .with_parse(parse_additional_items)
    .with_validate(validate_additional_items);

pub const CONTAINS: Keyword = Keyword::new("contains", "contains")
    .with_parse(parse_contains)
    .with_validate(validate_contains);

pub const MIN_ITEMS: Keyword = Keyword::new("minItems", "minItems").with_validate(validate_min_items);
pub const MAX_ITEMS: Keyword = Keyword::new("maxItems", "maxItems").with_validate(validate_max_items);
pub const UNIQUE_ITEMS: Keyword = Keyword::new("uniqueItems", "uniqueItems").with_validate(validate_unique_items);

fn index_of(key: &str) -> Option<usize> {
    schemata_pointer::parse_index(key)
}

fn prefix_len(node: &SchemaNode) -> usize {
    node.prefix_items.as_ref().map_or(0, Vec::len)
}

/// Whether `items` is in its positional (array) form.
pub(crate) fn has_item_list(node: &SchemaNode) -> bool {
    node.schema.get("items").is_some_and(Value::is_array)
}

/// Validate `items[from..]` against `child`, reporting `false` schemas as
/// additional items.
fn validate_remaining(
    input: &ValidationInput<'_>,
    items: &[Value],
    from: usize,
    child: &SchemaNode,
    path: &mut ValidationPath,
) -> Vec<ValidationOutcome> {
    if child.is_false() {
        if items.len() > from {
            return vec![input.error(
                ErrorCode::AdditionalItems,
                json!({ "key": from, "length": items.len() }),
            )];
        }
        return Vec::new();
    }
    let mut outcomes = Vec::new();
    for (index, item) in items.iter().enumerate().skip(from) {
        outcomes.extend(validate_node(child, item, &child_pointer(input.pointer, index.to_string()), path));
    }
    outcomes
}

fn validate_prefix(
    input: &ValidationInput<'_>,
    items: &[Value],
    path: &mut ValidationPath,
) -> Vec<ValidationOutcome> {
    let mut outcomes = Vec::new();
    for (index, (child, item)) in input.node.prefix_items.iter().flatten().zip(items).enumerate() {
        outcomes.extend(validate_node(child, item, &child_pointer(input.pointer, index.to_string()), path));
    }
    outcomes
}

fn parse_prefix_items(node: &mut SchemaNode, compiler: &Compiler) {
    node.prefix_items = parse_list(node, compiler, "prefixItems");
}

fn resolve_prefix_items(input: &ResolveInput<'_>) -> Option<SchemaNode> {
    let index = index_of(input.key)?;
    input.node.prefix_items.as_ref()?.get(index).cloned()
}

fn validate_prefix_items(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Value::Array(items) = input.data else {
        return Vec::new();
    };
    validate_prefix(input, items, path)
}

fn parse_items(node: &mut SchemaNode, compiler: &Compiler) {
    node.items = parse_box(node, compiler, "items");
}

fn resolve_items(input: &ResolveInput<'_>) -> Option<SchemaNode> {
    let index = index_of(input.key)?;
    if index < prefix_len(input.node) {
        return None;
    }
    input.node.items.as_deref().filter(|items| !items.is_false()).cloned()
}

fn validate_items(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Array(items), Some(child)) = (input.data, &input.node.items) else {
        return Vec::new();
    };
    validate_remaining(input, items, prefix_len(input.node), child, path)
}

fn parse_items_legacy(node: &mut SchemaNode, compiler: &Compiler) {
    if has_item_list(node) {
        node.prefix_items = parse_list(node, compiler, "items");
    } else {
        node.items = parse_box(node, compiler, "items");
    }
}

fn resolve_items_legacy(input: &ResolveInput<'_>) -> Option<SchemaNode> {
    let index = index_of(input.key)?;
    let node = input.node;
    if let Some(items) = &node.items {
        return (!items.is_false()).then(|| items.as_ref().clone());
    }
    if let Some(prefix) = &node.prefix_items {
        if let Some(child) = prefix.get(index) {
            return Some(child.clone());
        }
    }
    node.additional_items
        .as_deref()
        .filter(|additional| !additional.is_false())
        .cloned()
}

fn validate_items_legacy(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Value::Array(items) = input.data else {
        return Vec::new();
    };
    if let Some(child) = &input.node.items {
        return validate_remaining(input, items, 0, child, path);
    }
    validate_prefix(input, items, path)
}

fn parse_additional_items(node: &mut SchemaNode, compiler: &Compiler) {
    node.additional_items = parse_box(node, compiler, "additionalItems");
}

fn validate_additional_items(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    if !has_item_list(input.node) {
        return Vec::new();
    }
    let (Value::Array(items), Some(child)) = (input.data, &input.node.additional_items) else {
        return Vec::new();
    };
    validate_remaining(input, items, prefix_len(input.node), child, path)
}

fn parse_contains(node: &mut SchemaNode, compiler: &Compiler) {
    node.contains = parse_box(node, compiler, "contains");
}

fn validate_contains(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Array(items), Some(contains)) = (input.data, &input.node.contains) else {
        return Vec::new();
    };
    let bounded = input.node.dialect.draft >= Draft::Draft2019_09;
    let min = if bounded { usize_keyword(input.node, "minContains") } else { None };
    let max = if bounded { usize_keyword(input.node, "maxContains") } else { None };
    if min == Some(0) && max.is_none() {
        return Vec::new();
    }
    if items.is_empty() && min != Some(0) {
        return vec![input.error(ErrorCode::ContainsAny, json!({}))];
    }
    let count = items
        .iter()
        .enumerate()
        .filter(|(index, item)| is_valid(contains, item, &child_pointer(input.pointer, index.to_string()), path))
        .count();
    let mut outcomes = Vec::new();
    match min {
        Some(min) if count < min => {
            outcomes.push(input.error(ErrorCode::ContainsMin, json!({ "minContains": min, "count": count })));
        }
        None if count == 0 => outcomes.push(input.error(ErrorCode::Contains, json!({}))),
        _ => {}
    }
    if let Some(max) = max {
        if count > max {
            outcomes.push(input.error(ErrorCode::ContainsMax, json!({ "maxContains": max, "count": count })));
        }
    }
    outcomes
}

fn validate_min_items(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Array(items), Some(min)) = (input.data, usize_keyword(input.node, "minItems")) else {
        return Vec::new();
    };
    if items.len() >= min {
        return Vec::new();
    }
    vec![input.error(ErrorCode::MinItems, json!({ "minItems": min, "length": items.len() }))]
}

fn validate_max_items(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::Array(items), Some(max)) = (input.data, usize_keyword(input.node, "maxItems")) else {
        return Vec::new();
    };
    if items.len() <= max {
        return Vec::new();
    }
    vec![input.error(ErrorCode::MaxItems, json!({ "maxItems": max, "length": items.len() }))]
}

fn validate_unique_items(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Value::Array(items) = input.data else {
        return Vec::new();
    };
    if input.node.schema.get("uniqueItems") != Some(&Value::Bool(true)) {
        return Vec::new();
    }
    let mut outcomes = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if let Some(first) = items[..index].iter().position(|other| json_equal(other, item)) {
            outcomes.push(input.error(
                ErrorCode::UniqueItems,
                json!({ "duplicatePointer": child_pointer(input.pointer, first.to_string()), "itemPointer": child_pointer(input.pointer, index.to_string()) }),
            ));
        }
    }
    outcomes
}
