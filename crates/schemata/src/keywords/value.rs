//! `type`, `enum` and `const`

use serde_json::{Value, json};

use crate::dialect::Keyword;
use crate::error::ErrorCode;
use crate::types::{JsonType, json_equal, type_of};
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath};

pub const TYPE: Keyword = Keyword::new("type", "type").with_validate(validate_type);
pub const ENUM: Keyword = Keyword::new("enum", "enum").with_validate(validate_enum);
pub const CONST: Keyword = Keyword::new("const", "const").with_validate(validate_const);

/// Type names declared by a `type` keyword value.
pub(crate) fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn validate_type(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let expected = declared_types(&input.node.schema);
    if expected.is_empty() {
        return Vec::new();
    }
    let fraction_is_integer = input.node.dialect.draft.fraction_is_integer();
    let matches = expected.iter().any(|name| {
        JsonType::from_name(name).is_some_and(|ty| ty.matches(input.data, fraction_is_integer))
    });
    if matches {
        return Vec::new();
    }
    vec![input.error(
        ErrorCode::Type,
        json!({ "received": type_of(input.data).as_str(), "expected": expected }),
    )]
}

fn validate_enum(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(Value::Array(values)) = input.node.schema.get("enum") else {
        return Vec::new();
    };
    if values.iter().any(|value| json_equal(value, input.data)) {
        return Vec::new();
    }
    vec![input.error(ErrorCode::Enum, json!({ "values": values }))]
}

fn validate_const(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(expected) = input.node.schema.get("const") else {
        return Vec::new();
    };
    if json_equal(expected, input.data) {
        return Vec::new();
    }
    vec![input.error(ErrorCode::Const, json!({ "expected": expected }))]
}
