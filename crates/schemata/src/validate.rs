//! Validation driver and output types
//!
//! `validate_node` runs every validator hook of a node and returns the raw
//! outcomes. An outcome is either a finished error or a pending asynchronous
//! result. Branch checks (`anyOf`, `oneOf`, `not`, `if`, ...) go through
//! [`is_valid`], which only looks at synchronous errors and drops pending
//! results.

use std::future::Future;

use futures::future::{BoxFuture, join_all};
use serde_json::{Value, json};

use crate::error::{ErrorCode, JsonError};
use crate::node::SchemaNode;

/// One entry of the validation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Data pointer the node was applied to
    pub pointer: String,
    pub schema_location: String,
    /// Identifier of the schema resource the node belongs to
    pub resource: String,
}

/// Frames of the nodes currently being evaluated, outermost first.
///
/// The path is the dynamic scope used to resolve `$recursiveRef` and
/// `$dynamicRef`. It is created per top level call.
#[derive(Debug, Clone, Default)]
pub struct ValidationPath {
    frames: Vec<Frame>,
}

impl ValidationPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: &SchemaNode, pointer: &str) {
        self.frames.push(Frame {
            pointer: pointer.to_string(),
            schema_location: node.schema_location.clone(),
            resource: node.id.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every frame pushed after the path had `len` frames.
    pub fn truncate(&mut self, len: usize) {
        self.frames.truncate(len);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Whether `node` is already being evaluated at `pointer`.
    ///
    /// A repeated frame means a reference cycle that makes no progress
    /// through the data.
    pub fn is_cycle(&self, node: &SchemaNode, pointer: &str) -> bool {
        self.frames.iter().any(|frame| {
            frame.pointer == pointer
                && frame.schema_location == node.schema_location
                && frame.resource == node.id
        })
    }

    /// Schema resources in scope, outermost first, without consecutive
    /// repetitions.
    pub fn resources(&self) -> Vec<String> {
        let mut resources: Vec<String> = Vec::new();
        for frame in &self.frames {
            if resources.last() != Some(&frame.resource) {
                resources.push(frame.resource.clone());
            }
        }
        resources
    }
}

/// Input handed to validator hooks.
pub struct ValidationInput<'a> {
    pub node: &'a SchemaNode,
    pub data: &'a Value,
    pub pointer: &'a str,
}

impl ValidationInput<'_> {
    /// Build an error for the current node, data and pointer.
    pub fn error(&self, code: ErrorCode, extra: Value) -> ValidationOutcome {
        ValidationOutcome::Error(self.node.create_error(code, self.pointer, self.data, extra))
    }
}

/// Result of a single validator hook entry.
pub enum ValidationOutcome {
    Error(JsonError),
    /// Result of an asynchronous validator, resolved by the caller
    Pending(BoxFuture<'static, Vec<JsonError>>),
}

impl ValidationOutcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Vec<JsonError>> + Send + 'static,
    {
        ValidationOutcome::Pending(Box::pin(future))
    }
}

impl core::fmt::Debug for ValidationOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValidationOutcome::Error(error) => f.debug_tuple("Error").field(error).finish(),
            ValidationOutcome::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Output of [`SchemaNode::validate`].
pub struct ValidationOutput {
    /// No synchronous errors
    pub valid: bool,
    pub errors: Vec<JsonError>,
    /// Pending results of asynchronous validators
    pub errors_async: Vec<BoxFuture<'static, Vec<JsonError>>>,
}

impl core::fmt::Debug for ValidationOutput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValidationOutput")
            .field("valid", &self.valid)
            .field("errors", &self.errors)
            .field("errors_async", &self.errors_async.len())
            .finish()
    }
}

impl From<Vec<ValidationOutcome>> for ValidationOutput {
    fn from(outcomes: Vec<ValidationOutcome>) -> Self {
        let mut errors = Vec::new();
        let mut errors_async = Vec::new();
        for outcome in outcomes {
            match outcome {
                ValidationOutcome::Error(error) => errors.push(error),
                ValidationOutcome::Pending(pending) => errors_async.push(pending),
            }
        }
        Self {
            valid: errors.is_empty(),
            errors,
            errors_async,
        }
    }
}

/// Output of [`SchemaNode::validate_async`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    /// Synchronous errors followed by asynchronous ones
    pub errors: Vec<JsonError>,
}

/// Validate `data` at `pointer` against `node`.
pub fn validate_node(
    node: &SchemaNode,
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
) -> Vec<ValidationOutcome> {
    match &node.schema {
        Value::Bool(true) => return Vec::new(),
        Value::Bool(false) => {
            let error = node.create_error(ErrorCode::InvalidData, pointer, data, json!({}));
            return vec![ValidationOutcome::Error(error)];
        }
        _ => {}
    }
    if path.is_cycle(node, pointer) {
        tracing::debug!(location = %node.schema_location, pointer, "reference cycle, stopping");
        return Vec::new();
    }
    let depth = path.len();
    path.push(node, pointer);
    let input = ValidationInput {
        node,
        data,
        pointer,
    };
    let mut outcomes = Vec::new();
    for keyword in &node.validators {
        if let Some(validate) = keyword.validate {
            outcomes.extend(validate(&input, path));
        }
    }
    path.truncate(depth);
    outcomes
}

/// Trial validation: synchronous errors only.
pub fn sync_errors(
    node: &SchemaNode,
    data: &Value,
    pointer: &str,
    path: &mut ValidationPath,
) -> Vec<JsonError> {
    validate_node(node, data, pointer, path)
        .into_iter()
        .filter_map(|outcome| match outcome {
            ValidationOutcome::Error(error) => Some(error),
            ValidationOutcome::Pending(_) => None,
        })
        .collect()
}

/// Whether `data` has no synchronous errors against `node`.
pub fn is_valid(node: &SchemaNode, data: &Value, pointer: &str, path: &mut ValidationPath) -> bool {
    sync_errors(node, data, pointer, path).is_empty()
}

impl SchemaNode {
    /// Validate `data` against this node.
    pub fn validate(&self, data: &Value) -> ValidationOutput {
        let mut path = ValidationPath::new();
        validate_node(self, data, schemata_pointer::FRAGMENT_ROOT, &mut path).into()
    }

    /// Validate `data` and await every asynchronous validator concurrently.
    pub fn validate_async(&self, data: &Value) -> impl Future<Output = ValidationReport> + Send + 'static {
        let output = self.validate(data);
        async move {
            let mut errors = output.errors;
            for batch in join_all(output.errors_async).await {
                errors.extend(batch);
            }
            ValidationReport {
                valid: errors.is_empty(),
                errors,
            }
        }
    }

    /// Whether `data` validates without synchronous errors.
    pub fn is_valid(&self, data: &Value) -> bool {
        self.validate(data).valid
    }
}
