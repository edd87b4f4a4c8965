//! Dialect registry
//!
//! A dialect is one JSON Schema draft: the `$schema` pattern that selects it,
//! an ordered table of keyword descriptors, an error template table and the
//! draft dependent helper methods. Keyword descriptors are plain data (a
//! predicate and optional handlers); compilation filters the table once per
//! node and attaches the matching handlers as hooks.

use std::borrow::Cow;
use std::sync::Arc;

use ahash::AHashMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::compile::Compiler;
use crate::config::GetDataOptions;
use crate::error::{ErrorCode, ErrorData, JsonError};
use crate::get::{DataNode, ResolveInput};
use crate::node::SchemaNode;
use crate::reduce::ReduceInput;
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath};

pub type AppliesFn = fn(&Map<String, Value>) -> bool;
pub type ParseFn = fn(&mut SchemaNode, &Compiler);
pub type ReduceFn =
    fn(&ReduceInput<'_>, &mut ValidationPath) -> Result<Option<SchemaNode>, JsonError>;
pub type ResolveFn = fn(&ResolveInput<'_>) -> Option<SchemaNode>;
pub type ValidateFn = fn(&ValidationInput<'_>, &mut ValidationPath) -> Vec<ValidationOutcome>;

/// Behaviour descriptor for one schema keyword.
///
/// `id` is the descriptor identity used to de-duplicate hook lists when
/// nodes are merged; `keyword` is the schema key the descriptor responds to.
#[derive(Clone, Copy)]
pub struct Keyword {
    pub id: &'static str,
    pub keyword: &'static str,
    /// Reducer/resolver priority, higher runs first
    pub order: i32,
    pub applies: Option<AppliesFn>,
    pub parse: Option<ParseFn>,
    pub reduce: Option<ReduceFn>,
    pub resolve: Option<ResolveFn>,
    pub validate: Option<ValidateFn>,
}

impl Keyword {
    pub const fn new(id: &'static str, keyword: &'static str) -> Self {
        Self {
            id,
            keyword,
            order: 0,
            applies: None,
            parse: None,
            reduce: None,
            resolve: None,
            validate: None,
        }
    }

    pub const fn with_order(self, order: i32) -> Self {
        Self { order, ..self }
    }

    pub const fn with_applies(self, applies: AppliesFn) -> Self {
        Self {
            applies: Some(applies),
            ..self
        }
    }

    pub const fn with_parse(self, parse: ParseFn) -> Self {
        Self {
            parse: Some(parse),
            ..self
        }
    }

    pub const fn with_reduce(self, reduce: ReduceFn) -> Self {
        Self {
            reduce: Some(reduce),
            ..self
        }
    }

    pub const fn with_resolve(self, resolve: ResolveFn) -> Self {
        Self {
            resolve: Some(resolve),
            ..self
        }
    }

    pub const fn with_validate(self, validate: ValidateFn) -> Self {
        Self {
            validate: Some(validate),
            ..self
        }
    }

    /// Whether this descriptor applies to a schema object.
    pub fn is_applicable(&self, schema: &Map<String, Value>) -> bool {
        match self.applies {
            Some(applies) => applies(schema),
            None => schema.contains_key(self.keyword),
        }
    }
}

impl core::fmt::Debug for Keyword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Keyword")
            .field("id", &self.id)
            .field("keyword", &self.keyword)
            .field("order", &self.order)
            .finish()
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Draft {
    Draft04,
    Draft06,
    Draft07,
    Draft2019_09,
    Draft2020_12,
}

impl Draft {
    pub fn version(&self) -> &'static str {
        match self {
            Draft::Draft04 => "draft-04",
            Draft::Draft06 => "draft-06",
            Draft::Draft07 => "draft-07",
            Draft::Draft2019_09 => "draft-2019-09",
            Draft::Draft2020_12 => "draft-2020-12",
        }
    }

    /// Drafts where `$ref` replaces all sibling keywords.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Draft::Draft04 | Draft::Draft06 | Draft::Draft07)
    }

    /// Whether `1.0` counts as an integer.
    pub fn fraction_is_integer(&self) -> bool {
        !matches!(self, Draft::Draft04)
    }

    pub fn id_keyword(&self) -> &'static str {
        match self {
            Draft::Draft04 => "id",
            _ => "$id",
        }
    }
}

/// Draft dependent helper methods.
#[derive(Clone, Copy)]
pub struct DialectMethods {
    pub create_schema: fn(&Value) -> Value,
    pub get_data: fn(&SchemaNode, Option<&Value>, &GetDataOptions) -> Option<Value>,
    pub get_child_selection: fn(&SchemaNode, &str) -> Result<Vec<SchemaNode>, JsonError>,
    pub to_data_nodes: fn(&SchemaNode, &Value, &str) -> Vec<DataNode>,
}

impl Default for DialectMethods {
    fn default() -> Self {
        Self {
            create_schema: crate::create_schema::create_schema,
            get_data: crate::data::get_data,
            get_child_selection: crate::get::get_child_selection,
            to_data_nodes: crate::get::to_data_nodes,
        }
    }
}

#[derive(Clone)]
pub struct Dialect {
    pub draft: Draft,
    /// Matched against `$schema` to select this dialect
    pub id_pattern: Regex,
    pub keywords: Vec<Keyword>,
    pub errors: AHashMap<ErrorCode, Cow<'static, str>>,
    pub methods: DialectMethods,
}

impl Dialect {
    pub fn new(
        draft: Draft,
        id_pattern: Regex,
        keywords: Vec<Keyword>,
        errors: AHashMap<ErrorCode, Cow<'static, str>>,
    ) -> Self {
        Self {
            draft,
            id_pattern,
            keywords,
            errors,
            methods: DialectMethods::default(),
        }
    }

    pub fn version(&self) -> &'static str {
        self.draft.version()
    }

    /// A copy of this dialect with an additional (or replaced) keyword.
    pub fn with_keyword(&self, keyword: Keyword) -> Dialect {
        let mut dialect = self.clone();
        match dialect.keywords.iter_mut().find(|k| k.id == keyword.id) {
            Some(existing) => *existing = keyword,
            None => dialect.keywords.push(keyword),
        }
        dialect
    }

    /// A copy of this dialect without the keyword with the given id.
    pub fn without_keyword(&self, id: &str) -> Dialect {
        let mut dialect = self.clone();
        dialect.keywords.retain(|k| k.id != id);
        dialect
    }

    /// A copy of this dialect with a replaced error message template.
    pub fn with_error(&self, code: ErrorCode, template: impl Into<Cow<'static, str>>) -> Dialect {
        let mut dialect = self.clone();
        dialect.errors.insert(code, template.into());
        dialect
    }

    pub fn with_methods(&self, methods: DialectMethods) -> Dialect {
        let mut dialect = self.clone();
        dialect.methods = methods;
        dialect
    }

    pub fn keyword(&self, id: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.id == id)
    }

    pub fn matches(&self, schema_uri: &str) -> bool {
        self.id_pattern.is_match(schema_uri)
    }

    /// Build an error using this dialect's message template.
    pub fn create_error(&self, code: ErrorCode, data: ErrorData) -> JsonError {
        let message = match self.errors.get(&code) {
            Some(template) => JsonError::render(template, &data),
            None => code.as_str().to_string(),
        };
        JsonError {
            code,
            message,
            data,
        }
    }
}

impl core::fmt::Debug for Dialect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dialect")
            .field("draft", &self.draft)
            .field("keywords", &self.keywords.len())
            .finish()
    }
}

/// Pick the dialect for a schema by its `$schema` value.
///
/// Candidates are tried in order; without a match (or without `$schema`) the
/// last, most recent, dialect is used.
pub fn select_dialect<'a>(dialects: &'a [Arc<Dialect>], schema: &Value) -> Option<&'a Arc<Dialect>> {
    let declared = schema.get("$schema").and_then(Value::as_str);
    if let Some(uri) = declared {
        if let Some(dialect) = dialects.iter().find(|d| d.matches(uri)) {
            return Some(dialect);
        }
        tracing::debug!(schema = uri, "no dialect matches $schema, using latest");
    }
    dialects.last()
}
