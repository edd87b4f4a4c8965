//! Data synthesis
//!
//! `get_data` builds a value that satisfies a schema, starting from optional
//! input data. Values come from `const`, `default` and `enum` first; the
//! compositional keywords pick or merge branches; the declared (or inferred)
//! type finally shapes the value. References are followed at most
//! `recursion_limit` times per origin node and target, which bounds the
//! expansion of self-referential schemas. The visit counts belong to the
//! path from the root: every property and array element continues with its
//! own copy.

use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::config::GetDataOptions;
use crate::keywords::composition::select_one_of;
use crate::keywords::conditional::selected_branch;
use crate::keywords::object::{is_additional, matching_patterns, required_names};
use crate::keywords::usize_keyword;
use crate::keywords::value::declared_types;
use crate::merge::merge;
use crate::node::{Dependency, SchemaNode};
use crate::reference::{resolve_dynamic_ref, resolve_ref};
use crate::types::{JsonType, type_of};
use crate::validate::ValidationPath;

/// Visit counts of followed references, keyed by `origin>target`.
type Visits = AHashMap<String, usize>;

const POINTER: &str = schemata_pointer::FRAGMENT_ROOT;

impl SchemaNode {
    /// Synthesize data for this schema, completing `data` where given.
    ///
    /// Without `options` the defaults passed to [`compile`](crate::compile)
    /// apply. A schema that yields no value (`false`, an exhausted
    /// reference) produces `null`.
    pub fn get_data(&self, data: Option<&Value>, options: Option<GetDataOptions>) -> Value {
        let options = options.unwrap_or(self.context.get_data_defaults);
        (self.dialect.methods.get_data)(self, data, &options).unwrap_or(Value::Null)
    }

    /// Alias of [`SchemaNode::get_data`].
    pub fn get_template(&self, data: Option<&Value>, options: Option<GetDataOptions>) -> Value {
        self.get_data(data, options)
    }
}

/// Default [`DialectMethods::get_data`](crate::dialect::DialectMethods).
pub fn get_data(node: &SchemaNode, data: Option<&Value>, options: &GetDataOptions) -> Option<Value> {
    let mut visits = Visits::new();
    synthesize(node, data, options, &mut visits)
}

fn synthesize(node: &SchemaNode, data: Option<&Value>, options: &GetDataOptions, visits: &mut Visits) -> Option<Value> {
    // explicit null is treated like missing data
    let data = data.filter(|value| !value.is_null());
    match &node.schema {
        Value::Bool(false) => return None,
        Value::Bool(true) => return data.cloned(),
        _ => {}
    }
    if let Some(constant) = node.schema.get("const") {
        return Some(constant.clone());
    }
    if let Some(target) = follow_reference(node, options, visits)? {
        return synthesize(&target, data, options, visits);
    }

    let mut current = data.cloned();
    if current.is_none() {
        if let Some(default) = node.schema.get("default") {
            if !options.extend_defaults || !matches!(default, Value::Object(_) | Value::Array(_)) {
                return Some(default.clone());
            }
            current = Some(default.clone());
        } else if let Some(first) = node.schema.get("enum").and_then(Value::as_array).and_then(|e| e.first()) {
            return Some(first.clone());
        }
    }

    if let Some(branches) = &node.all_of {
        for branch in branches {
            if let Some(value) = synthesize(branch, current.as_ref(), options, &mut visits.clone()) {
                current = Some(merge_value(current, value));
            }
        }
        return synthesize(&node.without(&["allOf"]), current.as_ref(), options, visits);
    }
    if let Some(first) = node.any_of.as_ref().and_then(|branches| branches.first()) {
        let selected = merge(&node.without(&["anyOf"]), first);
        return synthesize(&selected, current.as_ref(), options, visits);
    }
    if let Some(branches) = node.one_of.as_ref().filter(|branches| !branches.is_empty()) {
        let index = match &current {
            Some(value) => {
                let mut path = ValidationPath::new();
                select_one_of(node, branches, value, POINTER, &mut path, true).unwrap_or_else(|error| {
                    tracing::debug!(code = %error.code, location = %node.schema_location, "no oneOf match, using first branch");
                    0
                })
            }
            None => 0,
        };
        let selected = merge(&node.without(&["oneOf"]), &branches[index]);
        return synthesize(&selected, current.as_ref(), options, visits);
    }
    if node.if_.is_some() {
        let base = node.without(&["if", "then", "else"]);
        let value = synthesize(&base, current.as_ref(), options, visits)?;
        let mut path = ValidationPath::new();
        return match selected_branch(node, &value, POINTER, &mut path) {
            Some((_, branch)) => {
                let extended = merge(&base, branch);
                Some(synthesize(&extended, Some(&value), options, visits).unwrap_or(value))
            }
            None => Some(value),
        };
    }

    match target_type(node, current.as_ref()) {
        Some(JsonType::Object) => Some(synthesize_object(node, current.as_ref(), options, visits)),
        Some(JsonType::Array) => Some(synthesize_array(node, current.as_ref(), options, visits)),
        Some(ty) => synthesize_scalar(node, ty, current, options),
        None => current,
    }
}

/// The target of a `$ref`/`$recursiveRef`/`$dynamicRef`, merged with the
/// sibling keywords where the draft applies them.
///
/// `Some(None)`: nothing to follow. `None`: the recursion limit is reached.
fn follow_reference(node: &SchemaNode, options: &GetDataOptions, visits: &mut Visits) -> Option<Option<SchemaNode>> {
    let (reference, resolved) = if let Some(reference) = &node.reference {
        (reference.clone(), resolve_ref(node))
    } else if let Some(reference) = &node.dynamic_reference {
        (reference.target().to_string(), resolve_dynamic_ref(node, &ValidationPath::new()))
    } else {
        return Some(None);
    };
    let Some(resolved) = resolved else {
        return Some(None);
    };
    let count = visits.entry(format!("{}>{reference}", node.dynamic_id)).or_default();
    *count += 1;
    if *count > options.recursion_limit {
        tracing::trace!(%reference, location = %node.schema_location, "recursion limit reached");
        return None;
    }
    if node.dialect.draft.is_legacy() {
        return Some(Some(resolved));
    }
    let siblings = node.without(&["$ref", "$recursiveRef", "$dynamicRef"]);
    Some(Some(merge(&siblings, &resolved)))
}

/// Type to synthesize: the declared type matching the data, the first
/// declared type, the type of the data, or the type implied by keywords.
fn target_type(node: &SchemaNode, data: Option<&Value>) -> Option<JsonType> {
    let declared: Vec<JsonType> = declared_types(&node.schema)
        .into_iter()
        .filter_map(JsonType::from_name)
        .collect();
    let fraction_is_integer = node.dialect.draft.fraction_is_integer();
    if let Some(value) = data {
        if let Some(ty) = declared.iter().find(|ty| ty.matches(value, fraction_is_integer)) {
            return Some(*ty);
        }
    }
    if let Some(first) = declared.first() {
        return Some(*first);
    }
    if let Some(value) = data {
        return Some(type_of(value));
    }
    let implies = |keywords: &[&str]| keywords.iter().any(|keyword| node.has_keyword(keyword));
    let object_keywords = [
        "properties",
        "required",
        "additionalProperties",
        "patternProperties",
        "dependentSchemas",
        "dependencies",
    ];
    if implies(&object_keywords) {
        return Some(JsonType::Object);
    }
    if implies(&["items", "prefixItems", "minItems", "additionalItems"]) {
        return Some(JsonType::Array);
    }
    None
}

fn synthesize_scalar(node: &SchemaNode, ty: JsonType, data: Option<Value>, options: &GetDataOptions) -> Option<Value> {
    let fraction_is_integer = node.dialect.draft.fraction_is_integer();
    match data {
        Some(value) if ty.matches(&value, fraction_is_integer) => Some(value),
        Some(value) if !options.remove_invalid_data => Some(value),
        _ if options.use_type_defaults => Some(type_default(ty)),
        _ => None,
    }
}

fn type_default(ty: JsonType) -> Value {
    match ty {
        JsonType::Null => Value::Null,
        JsonType::Boolean => Value::Bool(false),
        JsonType::Integer | JsonType::Number => Value::from(0),
        JsonType::String => Value::String(String::new()),
        JsonType::Array => Value::Array(Vec::new()),
        JsonType::Object => Value::Object(Map::new()),
    }
}

/// Shallow merge of a synthesized value into the data accumulated so far.
fn merge_value(current: Option<Value>, value: Value) -> Value {
    match (current, value) {
        (Some(Value::Object(mut base)), Value::Object(extension)) => {
            for (key, value) in extension {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, value) => value,
    }
}

fn synthesize_object(node: &SchemaNode, data: Option<&Value>, options: &GetDataOptions, visits: &Visits) -> Value {
    let input = match data {
        Some(Value::Object(object)) => object.clone(),
        _ => Map::new(),
    };
    let blacklist = &node.context.config.property_blacklist;
    let required = required_names(&node.schema);
    let mut object = Map::new();

    if let Some(properties) = &node.properties {
        for (name, child) in properties {
            let existing = input.get(name);
            let wanted = options.add_optional_props || required.contains(&name.as_str());
            if existing.is_none() && (blacklist.contains(name) || !wanted) {
                continue;
            }
            if let Some(value) = synthesize(child, existing, options, &mut visits.clone()) {
                object.insert(name.clone(), value);
            }
        }
    }
    for name in &required {
        if object.contains_key(*name) || input.contains_key(*name) || blacklist.iter().any(|b| b == name) {
            continue;
        }
        if let Some(child) = undeclared_child(node, name) {
            if let Some(value) = synthesize(&child, None, options, &mut visits.clone()) {
                object.insert(name.to_string(), value);
            }
        }
    }
    for (name, value) in &input {
        if object.contains_key(name) {
            continue;
        }
        match undeclared_child(node, name) {
            Some(child) if child.is_false() && options.remove_invalid_data => {}
            Some(child) => {
                let synthesized = synthesize(&child, Some(value), options, &mut visits.clone());
                object.insert(name.clone(), synthesized.unwrap_or_else(|| value.clone()));
            }
            None => {
                object.insert(name.clone(), value.clone());
            }
        }
    }

    apply_dependencies(node, Value::Object(object), options, visits)
}

/// Schema of a property not listed in `properties`.
fn undeclared_child(node: &SchemaNode, name: &str) -> Option<SchemaNode> {
    let mut patterns = matching_patterns(node, name);
    if let Some(first) = patterns.next() {
        return Some(patterns.fold(first.clone(), |merged, next| merge(&merged, next)));
    }
    if is_additional(node, name) {
        return node.additional_properties.as_deref().cloned();
    }
    None
}

/// Add what `dependencies`, `dependentRequired` and `dependentSchemas`
/// demand for the properties present in `value`.
fn apply_dependencies(node: &SchemaNode, mut value: Value, options: &GetDataOptions, visits: &Visits) -> Value {
    let present = |value: &Value, name: &str| value.get(name).is_some();
    let mut required: Vec<String> = Vec::new();
    let mut schemas: Vec<&SchemaNode> = Vec::new();

    for (name, dependency) in node.dependencies.iter().flatten() {
        if !present(&value, name) {
            continue;
        }
        match dependency {
            Dependency::Required(names) => required.extend(names.iter().cloned()),
            Dependency::Schema(schema) => schemas.push(schema),
        }
    }
    if let Some(Value::Object(dependent)) = node.schema.get("dependentRequired") {
        for (name, names) in dependent {
            if present(&value, name) {
                let names = names.as_array().into_iter().flatten().filter_map(Value::as_str);
                required.extend(names.map(String::from));
            }
        }
    }
    for (name, schema) in node.dependent_schemas.iter().flatten() {
        if present(&value, name) {
            schemas.push(schema);
        }
    }
    if required.is_empty() && schemas.is_empty() {
        return value;
    }

    // property schemas may come from the active dependent schemas
    let active = schemas.iter().fold(node.clone(), |merged, schema| merge(&merged, schema));
    for name in required {
        if present(&value, &name) {
            continue;
        }
        let child = active
            .properties
            .as_ref()
            .and_then(|properties| properties.get(&name).cloned())
            .or_else(|| undeclared_child(&active, &name));
        let synthesized = child.and_then(|child| synthesize(&child, None, options, &mut visits.clone()));
        if let (Some(synthesized), Value::Object(object)) = (synthesized, &mut value) {
            object.insert(name, synthesized);
        }
    }
    for schema in schemas {
        if let Some(extended) = synthesize(schema, Some(&value), options, &mut visits.clone()) {
            value = merge_value(Some(value), extended);
        }
    }
    value
}

fn synthesize_array(node: &SchemaNode, data: Option<&Value>, options: &GetDataOptions, visits: &Visits) -> Value {
    let input: &[Value] = match data {
        Some(Value::Array(items)) => items,
        _ => &[],
    };
    let min_items = usize_keyword(node, "minItems").unwrap_or(0);
    let length = input.len().max(min_items);
    let prefix = node.prefix_items.as_deref().unwrap_or_default();
    let rest = match (&node.items, prefix.is_empty()) {
        (Some(items), _) => Some(items.as_ref()),
        (None, false) => node.additional_items.as_deref(),
        (None, true) => None,
    };

    let mut items = Vec::with_capacity(length);
    for index in 0..length {
        let existing = input.get(index);
        let Some(child) = prefix.get(index).or(rest) else {
            if let Some(value) = existing {
                items.push(value.clone());
            }
            continue;
        };
        if child.is_false() && options.remove_invalid_data {
            continue;
        }
        let value = synthesize(child, existing, options, &mut visits.clone());
        items.push(value.or_else(|| existing.cloned()).unwrap_or(Value::Null));
    }
    Value::Array(items)
}
