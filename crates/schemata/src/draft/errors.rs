//! Default error message templates
//!
//! Placeholders use `{{name}}` and are filled from the error data (see
//! [`JsonError::render`](crate::error::JsonError::render)).

use std::borrow::Cow;

use ahash::AHashMap;

use crate::error::ErrorCode;

const TEMPLATES: &[(ErrorCode, &str)] = &[
    (ErrorCode::AdditionalItems, "Array at `{{pointer}}` may not have an item at index {{key}}"),
    (ErrorCode::AnyOf, "Value `{{value}}` at `{{pointer}}` does not match any schema of {{anyOf}}"),
    (ErrorCode::Const, "Expected value at `{{pointer}}` to be `{{expected}}`, but value given is `{{value}}`"),
    (ErrorCode::Contains, "The array at `{{pointer}}` must contain an element that matches `{{schema}}`"),
    (ErrorCode::ContainsAny, "The array at `{{pointer}}` must contain at least one item"),
    (ErrorCode::ContainsMax, "The array at `{{pointer}}` contains {{count}} matching items, at most {{maxContains}} are allowed"),
    (ErrorCode::ContainsMin, "The array at `{{pointer}}` contains {{count}} matching items, at least {{minContains}} are required"),
    (ErrorCode::Enum, "Expected given value `{{value}}` in `{{pointer}}` to be one of `{{values}}`"),
    (ErrorCode::ExclusiveMaximum, "Value in `{{pointer}}` is `{{value}}`, but should be less than `{{limit}}`"),
    (ErrorCode::ExclusiveMinimum, "Value in `{{pointer}}` is `{{value}}`, but should be greater than `{{limit}}`"),
    (ErrorCode::FormatDate, "Value `{{value}}` at `{{pointer}}` is not a valid date"),
    (ErrorCode::FormatDateTime, "Value `{{value}}` at `{{pointer}}` is not a valid date-time"),
    (ErrorCode::FormatDuration, "Value `{{value}}` at `{{pointer}}` is not a valid duration"),
    (ErrorCode::FormatEmail, "Value `{{value}}` at `{{pointer}}` is not a valid email"),
    (ErrorCode::FormatHostname, "Value `{{value}}` at `{{pointer}}` is not a valid hostname"),
    (ErrorCode::FormatIpv4, "Value `{{value}}` at `{{pointer}}` is not a valid IPv4 address"),
    (ErrorCode::FormatIpv6, "Value `{{value}}` at `{{pointer}}` is not a valid IPv6 address"),
    (ErrorCode::FormatJsonPointer, "Value `{{value}}` at `{{pointer}}` is not a valid json-pointer"),
    (ErrorCode::FormatRegex, "Value `{{value}}` at `{{pointer}}` is not a valid regular expression"),
    (ErrorCode::FormatTime, "Value `{{value}}` at `{{pointer}}` is not a valid time"),
    (ErrorCode::FormatUri, "Value `{{value}}` at `{{pointer}}` is not a valid uri"),
    (ErrorCode::FormatUriReference, "Value `{{value}}` at `{{pointer}}` is not a valid uri-reference"),
    (ErrorCode::FormatUuid, "Value `{{value}}` at `{{pointer}}` is not a valid uuid"),
    (ErrorCode::InvalidData, "No value may be specified in `{{pointer}}`"),
    (ErrorCode::InvalidPropertyName, "Invalid property name `{{property}}` at `{{pointer}}`"),
    (ErrorCode::Maximum, "Value in `{{pointer}}` is `{{value}}`, but should be `{{maximum}}` at maximum"),
    (ErrorCode::MaxItems, "Too many items in `{{pointer}}`, should be `{{maxItems}}` at most, but got `{{length}}`"),
    (ErrorCode::MaxLength, "Value `{{pointer}}` should have a maximum length of `{{maxLength}}`, but got `{{length}}`"),
    (ErrorCode::MaxProperties, "Too many properties in `{{pointer}}`, should be `{{maxProperties}}` at most, but got `{{length}}`"),
    (ErrorCode::Minimum, "Value in `{{pointer}}` is `{{value}}`, but should be `{{minimum}}` at minimum"),
    (ErrorCode::MinItems, "Too few items in `{{pointer}}`, should be at least `{{minItems}}`, but got `{{length}}`"),
    (ErrorCode::MinLength, "Value `{{pointer}}` should have a minimum length of `{{minLength}}`, but got `{{length}}`"),
    (ErrorCode::MinProperties, "Too few properties in `{{pointer}}`, should be at least `{{minProperties}}`, but got `{{length}}`"),
    (ErrorCode::MissingDependency, "The required property `{{missingProperty}}` in `{{pointer}}` is missing, it is required by `{{property}}`"),
    (ErrorCode::MissingOneOfProperty, "Value at `{{pointer}}` property `{{property}}` is missing"),
    (ErrorCode::MultipleOf, "Expected `{{value}}` in `{{pointer}}` to be multiple of `{{multipleOf}}`"),
    (ErrorCode::MultipleOneOf, "Value `{{value}}` at `{{pointer}}` matches multiple schemas: {{matches}}"),
    (ErrorCode::NoAdditionalProperties, "Additional property `{{property}}` in `{{pointer}}` is not allowed"),
    (ErrorCode::Not, "Value at `{{pointer}}` should not match `{{not}}`"),
    (ErrorCode::OneOf, "Value `{{value}}` at `{{pointer}}` does not match any schema of `oneOf`"),
    (ErrorCode::OneOfProperty, "Value `{{value}}` at `{{pointer}}` has no matching schema for property `{{property}}`"),
    (ErrorCode::Pattern, "Value in `{{pointer}}` should match `{{pattern}}`, but received `{{value}}`"),
    (ErrorCode::Ref, "Reference `{{ref}}` at `{{pointer}}` could not be resolved"),
    (ErrorCode::RequiredProperty, "The required property `{{key}}` is missing at `{{pointer}}`"),
    (ErrorCode::SchemaWarning, "Failed retrieving a schema from `{{pointer}}` to key `{{key}}`"),
    (ErrorCode::Type, "Expected `{{value}}` ({{received}}) in `{{pointer}}` to be of type `{{expected}}`"),
    (ErrorCode::UnevaluatedItems, "Item at `{{pointer}}` was not evaluated and is not allowed"),
    (ErrorCode::UnevaluatedProperty, "Property `{{property}}` at `{{pointer}}` was not evaluated and is not allowed"),
    (ErrorCode::UniqueItems, "Items in `{{pointer}}` should be unique, `{{itemPointer}}` repeats `{{duplicatePointer}}`"),
];

/// Message templates for every error code.
pub fn templates() -> AHashMap<ErrorCode, Cow<'static, str>> {
    TEMPLATES
        .iter()
        .map(|(code, template)| (*code, Cow::Borrowed(*template)))
        .collect()
}
