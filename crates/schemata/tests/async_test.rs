use std::sync::Arc;

use futures::executor::block_on;
use schemata::validate::{ValidationInput, ValidationOutcome, ValidationPath};
use schemata::{CompileOptions, ErrorCode, Keyword, SchemaNode, compile, draft};
use serde_json::{Value, json};

/// Reports odd numbers from a future, like a lookup against a remote service.
fn validate_even_later(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some(number) = input.data.as_i64() else {
        return Vec::new();
    };
    let error = (number % 2 != 0).then(|| {
        input
            .node
            .create_error(ErrorCode::MultipleOf, input.pointer, input.data, json!({ "multipleOf": 2 }))
    });
    vec![ValidationOutcome::pending(async move { error.into_iter().collect() })]
}

const EVEN_LATER: Keyword = Keyword::new("evenLater", "evenLater").with_validate(validate_even_later);

fn node(schema: Value) -> SchemaNode {
    let dialect = draft::draft2020_12().with_keyword(EVEN_LATER);
    compile(schema, CompileOptions::default().with_drafts(vec![Arc::new(dialect)])).unwrap()
}

#[test]
fn test_pending_results_are_returned_unresolved() {
    let node = node(json!({ "type": "integer", "evenLater": true }));
    let output = node.validate(&json!(3));
    assert!(output.valid);
    assert!(output.errors.is_empty());
    assert_eq!(output.errors_async.len(), 1);
}

#[test]
fn test_validate_async_orders_sync_errors_first() {
    let node = node(json!({
        "properties": {
            "a": { "type": "string" },
            "b": { "evenLater": true }
        }
    }));
    let report = block_on(node.validate_async(&json!({ "a": 1, "b": 5 })));
    assert!(!report.valid);
    let codes: Vec<&str> = report.errors.iter().map(|error| error.code.as_str()).collect();
    assert_eq!(codes, vec!["type-error", "multiple-of-error"]);
    assert_eq!(report.errors[1].pointer(), "#/b");

    let report = block_on(node.validate_async(&json!({ "a": "x", "b": 4 })));
    assert!(report.valid);
}

#[test]
fn test_trial_validation_ignores_pending_results() {
    let node = node(json!({ "anyOf": [{ "evenLater": true }, { "type": "string" }] }));
    let output = node.validate(&json!(3));
    assert!(output.valid);
    assert!(output.errors_async.is_empty());
}
