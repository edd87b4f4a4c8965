//! Error types
//!
//! Two categories of errors:
//! - `JsonError`: data errors, resolution warnings and composition errors.
//!   These are always returned as values and never abort an operation.
//! - `EngineError`: fatal programmer/configuration errors that make the
//!   requested operation impossible (e.g. no dialect registered).

use core::fmt::Display;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Fatal errors returned by compilation and tree operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// `compile` was called with an empty dialect list
    #[error("no dialect registered")]
    NoDialect,

    /// The root value is neither a boolean nor an object
    #[error("invalid schema: expected boolean or object, got {kind}")]
    InvalidSchema { kind: String },

    /// The node's context has no compiled root document
    #[error("references were never parsed for node at {schema_location}")]
    RefsNotParsed { schema_location: String },

    /// A remote identifier could not be turned into a document identifier
    #[error("invalid remote identifier '{url}'")]
    InvalidRemote { url: String },
}

/// Stable error codes, rendered in kebab-case (`type-error`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AdditionalItems,
    AnyOf,
    Const,
    Contains,
    ContainsAny,
    ContainsMax,
    ContainsMin,
    Enum,
    ExclusiveMaximum,
    ExclusiveMinimum,
    FormatDate,
    FormatDateTime,
    FormatDuration,
    FormatEmail,
    FormatHostname,
    FormatIpv4,
    FormatIpv6,
    FormatJsonPointer,
    FormatRegex,
    FormatTime,
    FormatUri,
    FormatUriReference,
    FormatUuid,
    InvalidData,
    InvalidPropertyName,
    Maximum,
    MaxItems,
    MaxLength,
    MaxProperties,
    Minimum,
    MinItems,
    MinLength,
    MinProperties,
    MissingDependency,
    MissingOneOfProperty,
    MultipleOf,
    MultipleOneOf,
    NoAdditionalProperties,
    Not,
    OneOf,
    OneOfProperty,
    Pattern,
    Ref,
    RequiredProperty,
    SchemaWarning,
    Type,
    UnevaluatedItems,
    UnevaluatedProperty,
    UniqueItems,
}

impl ErrorCode {
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::AdditionalItems,
        ErrorCode::AnyOf,
        ErrorCode::Const,
        ErrorCode::Contains,
        ErrorCode::ContainsAny,
        ErrorCode::ContainsMax,
        ErrorCode::ContainsMin,
        ErrorCode::Enum,
        ErrorCode::ExclusiveMaximum,
        ErrorCode::ExclusiveMinimum,
        ErrorCode::FormatDate,
        ErrorCode::FormatDateTime,
        ErrorCode::FormatDuration,
        ErrorCode::FormatEmail,
        ErrorCode::FormatHostname,
        ErrorCode::FormatIpv4,
        ErrorCode::FormatIpv6,
        ErrorCode::FormatJsonPointer,
        ErrorCode::FormatRegex,
        ErrorCode::FormatTime,
        ErrorCode::FormatUri,
        ErrorCode::FormatUriReference,
        ErrorCode::FormatUuid,
        ErrorCode::InvalidData,
        ErrorCode::InvalidPropertyName,
        ErrorCode::Maximum,
        ErrorCode::MaxItems,
        ErrorCode::MaxLength,
        ErrorCode::MaxProperties,
        ErrorCode::Minimum,
        ErrorCode::MinItems,
        ErrorCode::MinLength,
        ErrorCode::MinProperties,
        ErrorCode::MissingDependency,
        ErrorCode::MissingOneOfProperty,
        ErrorCode::MultipleOf,
        ErrorCode::MultipleOneOf,
        ErrorCode::NoAdditionalProperties,
        ErrorCode::Not,
        ErrorCode::OneOf,
        ErrorCode::OneOfProperty,
        ErrorCode::Pattern,
        ErrorCode::Ref,
        ErrorCode::RequiredProperty,
        ErrorCode::SchemaWarning,
        ErrorCode::Type,
        ErrorCode::UnevaluatedItems,
        ErrorCode::UnevaluatedProperty,
        ErrorCode::UniqueItems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AdditionalItems => "additional-items-error",
            ErrorCode::AnyOf => "any-of-error",
            ErrorCode::Const => "const-error",
            ErrorCode::Contains => "contains-error",
            ErrorCode::ContainsAny => "contains-any-error",
            ErrorCode::ContainsMax => "contains-max-error",
            ErrorCode::ContainsMin => "contains-min-error",
            ErrorCode::Enum => "enum-error",
            ErrorCode::ExclusiveMaximum => "exclusive-maximum-error",
            ErrorCode::ExclusiveMinimum => "exclusive-minimum-error",
            ErrorCode::FormatDate => "format-date-error",
            ErrorCode::FormatDateTime => "format-date-time-error",
            ErrorCode::FormatDuration => "format-duration-error",
            ErrorCode::FormatEmail => "format-email-error",
            ErrorCode::FormatHostname => "format-hostname-error",
            ErrorCode::FormatIpv4 => "format-ipv4-error",
            ErrorCode::FormatIpv6 => "format-ipv6-error",
            ErrorCode::FormatJsonPointer => "format-json-pointer-error",
            ErrorCode::FormatRegex => "format-regex-error",
            ErrorCode::FormatTime => "format-time-error",
            ErrorCode::FormatUri => "format-uri-error",
            ErrorCode::FormatUriReference => "format-uri-reference-error",
            ErrorCode::FormatUuid => "format-uuid-error",
            ErrorCode::InvalidData => "invalid-data-error",
            ErrorCode::InvalidPropertyName => "invalid-property-name-error",
            ErrorCode::Maximum => "maximum-error",
            ErrorCode::MaxItems => "max-items-error",
            ErrorCode::MaxLength => "max-length-error",
            ErrorCode::MaxProperties => "max-properties-error",
            ErrorCode::Minimum => "minimum-error",
            ErrorCode::MinItems => "min-items-error",
            ErrorCode::MinLength => "min-length-error",
            ErrorCode::MinProperties => "min-properties-error",
            ErrorCode::MissingDependency => "missing-dependency-error",
            ErrorCode::MissingOneOfProperty => "missing-one-of-property-error",
            ErrorCode::MultipleOf => "multiple-of-error",
            ErrorCode::MultipleOneOf => "multiple-one-of-error",
            ErrorCode::NoAdditionalProperties => "no-additional-properties-error",
            ErrorCode::Not => "not-error",
            ErrorCode::OneOf => "one-of-error",
            ErrorCode::OneOfProperty => "one-of-property-error",
            ErrorCode::Pattern => "pattern-error",
            ErrorCode::Ref => "ref-error",
            ErrorCode::RequiredProperty => "required-property-error",
            ErrorCode::SchemaWarning => "schema-warning",
            ErrorCode::Type => "type-error",
            ErrorCode::UnevaluatedItems => "unevaluated-items-error",
            ErrorCode::UnevaluatedProperty => "unevaluated-property-error",
            ErrorCode::UniqueItems => "unique-items-error",
        }
    }

    /// Look up a code by its kebab-case name.
    pub fn from_name(name: &str) -> Option<ErrorCode> {
        ErrorCode::ALL.iter().copied().find(|code| code.as_str() == name)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Data attached to every [`JsonError`].
///
/// `pointer`, `schema` and `value` are always present; keyword specific
/// fields (`minimum`, `missingProperty`, ...) live in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ErrorData {
    pub pointer: String,
    pub schema: Value,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorData {
    pub fn new(pointer: impl Into<String>, schema: Value, value: Value) -> Self {
        Self {
            pointer: pointer.into(),
            schema,
            value,
            extra: Map::new(),
        }
    }

    /// Attach keyword specific fields. Non-object values are ignored.
    pub fn with_extra(mut self, extra: Value) -> Self {
        if let Value::Object(map) = extra {
            self.extra.extend(map);
        }
        self
    }

    /// Look up a field by name, including the fixed fields.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "schema" => Some(&self.schema),
            "value" => Some(&self.value),
            _ => self.extra.get(name),
        }
    }
}

/// A validation error, warning, or composition error returned as data.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{message}")]
pub struct JsonError {
    pub code: ErrorCode,
    pub message: String,
    pub data: ErrorData,
}

impl JsonError {
    /// Render a message template against error data.
    ///
    /// Placeholders take the form `{{name}}`. Strings are inserted verbatim,
    /// other values as compact JSON. Unknown placeholders are left in place.
    pub fn render(template: &str, data: &ErrorData) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = after[..end].trim();
            let replacement = if name == "pointer" {
                Some(data.pointer.clone())
            } else {
                data.field(name).map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            };
            match replacement {
                Some(text) => out.push_str(&text),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }

    pub fn pointer(&self) -> &str {
        &self.data.pointer
    }

    /// Nested errors collected by composition keywords (`anyOf`, `oneOf`, ...).
    pub fn nested_errors(&self) -> Vec<Value> {
        match self.data.extra.get("errors") {
            Some(Value::Array(errors)) => errors.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_code_names_roundtrip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_name(code.as_str()), Some(*code));
        }
        assert_eq!(ErrorCode::Type.to_string(), "type-error");
    }

    #[test]
    fn test_render_replaces_fields() {
        let data = ErrorData::new("#/a", json!({ "minimum": 4 }), json!(3))
            .with_extra(json!({ "minimum": 4, "label": "age" }));
        let message = JsonError::render(
            "Value in `{{pointer}}` is `{{value}}`, expected at least {{minimum}} ({{label}})",
            &data,
        );
        assert_eq!(message, "Value in `#/a` is `3`, expected at least 4 (age)");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let data = ErrorData::new("#", Value::Bool(false), Value::Null);
        assert_eq!(JsonError::render("{{missing}} at {{pointer}", &data), "{{missing}} at {{pointer}");
    }

    #[test]
    fn test_serialize_flattens_extra() {
        let error = JsonError {
            code: ErrorCode::RequiredProperty,
            message: "missing".to_string(),
            data: ErrorData::new("#", json!({}), json!({}))
                .with_extra(json!({ "key": "name" })),
        };
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["code"], json!("required-property-error"));
        assert_eq!(value["data"]["key"], json!("name"));
        assert_eq!(value["data"]["pointer"], json!("#"));
    }
}
