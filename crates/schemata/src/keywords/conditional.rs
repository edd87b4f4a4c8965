//! `if`, `then` and `else`
//!
//! `then` and `else` are compiled by the `if` descriptor and have no effect
//! on their own.

use serde_json::Value;

use crate::compile::Compiler;
use crate::dialect::Keyword;
use crate::error::JsonError;
use crate::keywords::parse_box;
use crate::node::SchemaNode;
use crate::reduce::{ReduceInput, mark};
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath, is_valid, validate_node};

pub const IF: Keyword = Keyword::new("if", "if")
    .with_order(5)
    .with_parse(parse_if)
    .with_reduce(reduce_if)
    .with_validate(validate_if);

fn parse_if(node: &mut SchemaNode, compiler: &Compiler) {
    node.if_ = parse_box(node, compiler, "if");
    node.then = parse_box(node, compiler, "then");
    node.else_ = parse_box(node, compiler, "else");
}

/// The branch selected by the `if` schema, with its keyword.
pub(crate) fn selected_branch<'a>(
    node: &'a SchemaNode,
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
) -> Option<(&'static str, &'a SchemaNode)> {
    let condition = node.if_.as_deref()?;
    if is_valid(condition, data, pointer, path) {
        node.then.as_deref().map(|then| ("then", then))
    } else {
        node.else_.as_deref().map(|otherwise| ("else", otherwise))
    }
}

fn reduce_if(input: &ReduceInput<'_>, path: &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError> {
    let Some((keyword, branch)) = selected_branch(input.node, input.data, input.pointer, path) else {
        return Ok(None);
    };
    let reduced = input.reduce(branch, path)?;
    Ok(Some(mark(reduced, keyword)))
}

fn validate_if(input: &ValidationInput<'_>, path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    match selected_branch(input.node, input.data, input.pointer, path) {
        Some((_, branch)) => validate_node(branch, input.data, input.pointer, path),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::compile;
    use crate::config::CompileOptions;

    #[test]
    fn test_if_then_else() {
        let node = compile::compile(
            json!({
                "if": { "minimum": 10 },
                "then": { "multipleOf": 5 },
                "else": { "multipleOf": 2 }
            }),
            CompileOptions::default(),
        )
        .unwrap();
        assert!(node.is_valid(&json!(15)));
        assert!(!node.is_valid(&json!(12)));
        assert!(node.is_valid(&json!(4)));
        assert!(!node.is_valid(&json!(5)));
    }

    #[test]
    fn test_then_without_if_is_ignored() {
        let node = compile::compile(json!({ "then": false }), CompileOptions::default()).unwrap();
        assert!(node.is_valid(&json!(1)));
        assert!(node.then.is_none());
    }

    #[test]
    fn test_reduce_without_matching_branch() {
        let node = compile::compile(
            json!({ "if": { "type": "string" }, "then": { "minLength": 1 }, "title": "t" }),
            CompileOptions::default(),
        )
        .unwrap();
        let reduced = node.reduce(&json!(1)).unwrap();
        assert_eq!(reduced.schema, json!({ "title": "t" }));
        let reduced = node.reduce(&json!("a")).unwrap();
        assert_eq!(reduced.schema, json!({ "title": "t", "minLength": 1 }));
    }
}
