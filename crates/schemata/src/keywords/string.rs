//! String keywords

use regex::Regex;
use serde_json::{Value, json};

use crate::compile::Compiler;
use crate::dialect::Keyword;
use crate::error::ErrorCode;
use crate::format;
use crate::keywords::{malformed, usize_keyword};
use crate::node::SchemaNode;
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath};

pub const MIN_LENGTH: Keyword = Keyword::new("minLength", "minLength").with_validate(validate_min_length);
pub const MAX_LENGTH: Keyword = Keyword::new("maxLength", "maxLength").with_validate(validate_max_length);
pub const PATTERN: Keyword = Keyword::new("pattern", "pattern")
    .with_parse(parse_pattern)
    .with_validate(validate_pattern);
pub const FORMAT: Keyword = Keyword::new("format", "format").with_validate(validate_format);

/// Compile a schema regex with the configured flags.
///
/// `i`, `m` and `s` become inline flags. `u` is accepted and ignored, the
/// regex engine always matches unicode.
pub(crate) fn build_regex(pattern: &str, flags: &str) -> Result<Regex, regex::Error> {
    let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
    if inline.is_empty() {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("(?{inline}){pattern}"))
    }
}

fn parse_pattern(node: &mut SchemaNode, compiler: &Compiler) {
    let Some(pattern) = node.schema.get("pattern").and_then(Value::as_str) else {
        malformed(node, "pattern");
        return;
    };
    match build_regex(pattern, &compiler.context.config.regex_flags) {
        Ok(regex) => node.pattern = Some(regex),
        Err(error) => {
            tracing::debug!(pattern, %error, location = %node.schema_location, "invalid pattern");
        }
    }
}

fn validate_pattern(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Value::String(value), Some(regex)) = (input.data, &input.node.pattern) else {
        return Vec::new();
    };
    if regex.is_match(value) {
        return Vec::new();
    }
    let pattern = input.node.schema.get("pattern").cloned().unwrap_or(Value::Null);
    vec![input.error(ErrorCode::Pattern, json!({ "pattern": pattern }))]
}

fn char_count(input: &ValidationInput<'_>) -> Option<usize> {
    input.data.as_str().map(|s| s.chars().count())
}

fn validate_min_length(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Some(length), Some(min)) = (char_count(input), usize_keyword(input.node, "minLength")) else {
        return Vec::new();
    };
    if length >= min {
        return Vec::new();
    }
    vec![input.error(ErrorCode::MinLength, json!({ "minLength": min, "length": length }))]
}

fn validate_max_length(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let (Some(length), Some(max)) = (char_count(input), usize_keyword(input.node, "maxLength")) else {
        return Vec::new();
    };
    if length <= max {
        return Vec::new();
    }
    vec![input.error(ErrorCode::MaxLength, json!({ "maxLength": max, "length": length }))]
}

fn validate_format(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    if !input.node.context.config.format_assertion {
        return Vec::new();
    }
    let (Value::String(value), Some(name)) = (input.data, input.node.schema.get("format").and_then(Value::as_str))
    else {
        return Vec::new();
    };
    match format::check(name, value) {
        Some(code) => vec![input.error(code, json!({ "format": name }))],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::compile;
    use crate::config::{CompileOptions, Config};

    fn codes_with(schema: Value, data: Value, config: Config) -> Vec<&'static str> {
        compile::compile(schema, CompileOptions::default().with_config(config))
            .unwrap()
            .validate(&data)
            .errors
            .iter()
            .map(|e| e.code.as_str())
            .collect()
    }

    fn codes(schema: Value, data: Value) -> Vec<&'static str> {
        codes_with(schema, data, Config::default())
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(codes(json!({ "maxLength": 2 }), json!("äö")).is_empty());
        assert_eq!(codes(json!({ "minLength": 3 }), json!("äö")), vec!["min-length-error"]);
        assert!(codes(json!({ "minLength": 3 }), json!(1)).is_empty());
    }

    #[test]
    fn test_regex_flags() {
        let config = Config {
            regex_flags: "iu".to_string(),
            ..Config::default()
        };
        assert!(codes_with(json!({ "pattern": "^abc$" }), json!("ABC"), config).is_empty());
        assert_eq!(codes(json!({ "pattern": "^abc$" }), json!("ABC")), vec!["pattern-error"]);
    }

    #[test]
    fn test_format_assertion_toggle() {
        assert_eq!(
            codes(json!({ "format": "ipv4" }), json!("1.2.3")),
            vec!["format-ipv4-error"]
        );
        let config = Config {
            format_assertion: false,
            ..Config::default()
        };
        assert!(codes_with(json!({ "format": "ipv4" }), json!("1.2.3"), config).is_empty());
    }

    #[test]
    fn test_build_regex() {
        assert!(build_regex("^a.b$", "s").unwrap().is_match("a\nb"));
        assert!(build_regex("(", "").is_err());
    }
}
