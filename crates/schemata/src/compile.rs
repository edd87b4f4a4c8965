//! Schema compilation
//!
//! `Compiler` turns raw schema values into [`SchemaNode`]s. A compiler either
//! owns a document and registers every node it builds in the shared
//! [`Context`] registry, or is *transient* and only builds nodes (used for
//! reference targets, partial schemas produced by reducers and inferred
//! schemas).
//!
//! # Keyword selection
//!
//! Each node runs every descriptor of its dialect whose applicability
//! predicate matches the node's own keys. In draft-04/06/07 a `$ref` hides
//! its siblings, so only the `$ref`, `if` and definitions descriptors run.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::CompileOptions;
use crate::context::{Context, RefTarget, Registry};
use crate::dialect::{Dialect, Keyword, select_dialect};
use crate::draft;
use crate::error::EngineError;
use crate::node::SchemaNode;
use crate::reference;
use crate::types::type_of;

/// Keywords that still apply next to `$ref` in draft-04/06/07.
const LEGACY_REF_KEYWORDS: &[&str] = &["$ref", "if", "$defs", "definitions"];

/// Compile a schema document into its root node.
pub fn compile(schema: Value, options: CompileOptions) -> Result<SchemaNode, EngineError> {
    ensure_schema(&schema)?;
    let dialects = options.drafts.unwrap_or_else(draft::all);
    let dialect = select_dialect(&dialects, &schema)
        .cloned()
        .ok_or(EngineError::NoDialect)?;
    let registry = options
        .remote
        .map(|remote| remote.context.snapshot().remotes_only())
        .unwrap_or_default();
    tracing::debug!(version = dialect.version(), "compiling schema");
    let context = Arc::new(Context::new(
        options.config,
        dialects,
        dialect.clone(),
        options.get_data_defaults,
        registry,
    ));
    let compiler = Compiler::document(context, Arc::new(schema), DocumentKind::Root, &dialect);
    Ok(compiler.compile_document(dialect))
}

fn ensure_schema(schema: &Value) -> Result<(), EngineError> {
    match schema {
        Value::Bool(_) | Value::Object(_) => Ok(()),
        other => Err(EngineError::InvalidSchema {
            kind: type_of(other).to_string(),
        }),
    }
}

/// Where a node is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub evaluation_path: String,
    pub schema_location: String,
    /// Identifier of the enclosing schema resource
    pub parent_id: String,
    /// Location of the enclosing schema resource
    pub resource_location: String,
}

impl Location {
    pub fn root(parent_id: impl Into<String>) -> Self {
        Self {
            evaluation_path: schemata_pointer::FRAGMENT_ROOT.to_string(),
            schema_location: schemata_pointer::FRAGMENT_ROOT.to_string(),
            parent_id: parent_id.into(),
            resource_location: schemata_pointer::FRAGMENT_ROOT.to_string(),
        }
    }
}

impl SchemaNode {
    /// The location this node occupies, for compiling siblings in place.
    pub fn location(&self) -> Location {
        Location {
            evaluation_path: self.evaluation_path.clone(),
            schema_location: self.schema_location.clone(),
            parent_id: self.id.clone(),
            resource_location: self.resource_location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Root,
    Remote(String),
}

pub struct Compiler {
    pub(crate) context: Arc<Context>,
    /// Document being registered; `None` for transient compilation
    pub(crate) document: Option<Arc<Value>>,
    pub(crate) kind: DocumentKind,
    /// Identifier of the document root
    pub(crate) document_id: String,
}

impl Compiler {
    /// A compiler that registers every node of `document`.
    pub(crate) fn document(
        context: Arc<Context>,
        document: Arc<Value>,
        kind: DocumentKind,
        dialect: &Dialect,
    ) -> Self {
        let base = match &kind {
            DocumentKind::Root => String::new(),
            DocumentKind::Remote(url) => url.clone(),
        };
        let document_id = reference::declared_id(&document, dialect)
            .map(|declared| reference::join_id(&base, declared))
            .unwrap_or(base);
        Self {
            context,
            document: Some(document),
            kind,
            document_id,
        }
    }

    /// A compiler that builds nodes without registering them.
    pub(crate) fn transient(context: Arc<Context>) -> Self {
        Self {
            context,
            document: None,
            kind: DocumentKind::Root,
            document_id: String::new(),
        }
    }

    /// Compile the whole document and register its root entry.
    pub(crate) fn compile_document(&self, dialect: Arc<Dialect>) -> SchemaNode {
        let Some(document) = &self.document else {
            return self.compile_node(Value::Bool(true), Location::root(""), dialect);
        };
        let parent_id = match &self.kind {
            DocumentKind::Root => String::new(),
            DocumentKind::Remote(url) => url.clone(),
        };
        let node = self.compile_node(
            document.as_ref().clone(),
            Location::root(parent_id.clone()),
            dialect.clone(),
        );
        let target = RefTarget {
            document: document.clone(),
            pointer: node.schema_location.clone(),
            parent_id,
            id: node.id.clone(),
            resource_location: node.resource_location.clone(),
            dialect,
        };
        let mut registry = self.context.registry.write();
        match &self.kind {
            DocumentKind::Root => registry.root = Some(target),
            DocumentKind::Remote(url) => {
                tracing::trace!(url = %url, "registered remote");
                registry.remotes.entry(url.clone()).or_insert(target);
            }
        }
        node
    }

    /// Compile one schema value at `location`.
    pub fn compile_node(&self, schema: Value, location: Location, dialect: Arc<Dialect>) -> SchemaNode {
        let dialect = schema
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(|uri| self.context.dialects.iter().find(|d| d.matches(uri)))
            .cloned()
            .unwrap_or(dialect);
        let identity = reference::parse_identity(self, &schema, &location, &dialect);
        let mut node = SchemaNode::bare(
            schema,
            location.evaluation_path,
            location.schema_location,
            identity.id,
            identity.resource_location,
            self.context.clone(),
            dialect.clone(),
        );
        let keywords = match &node.schema {
            Value::Object(schema) => applicable_keywords(&dialect, schema),
            _ => return node,
        };
        for keyword in &keywords {
            if let Some(parse) = keyword.parse {
                parse(&mut node, self);
            }
        }
        attach_hooks(&mut node, &keywords);
        node
    }

    /// Compile the value found under `tokens` below `parent`.
    ///
    /// Values that are neither booleans nor objects are not schemas and
    /// yield `None`.
    pub fn child(&self, parent: &SchemaNode, tokens: &[&str]) -> Option<SchemaNode> {
        let schema = tokens
            .iter()
            .try_fold(&parent.schema, |value, token| {
                schemata_pointer::get_token(value, token)
            })?;
        if !matches!(schema, Value::Bool(_) | Value::Object(_)) {
            tracing::debug!(
                location = %parent.schema_location,
                path = ?tokens,
                "skipping non-schema value"
            );
            return None;
        }
        let location = Location {
            evaluation_path: schemata_pointer::join_all(&parent.evaluation_path, tokens),
            schema_location: schemata_pointer::join_all(&parent.schema_location, tokens),
            parent_id: parent.id.clone(),
            resource_location: parent.resource_location.clone(),
        };
        Some(self.compile_node(schema.clone(), location, parent.dialect.clone()))
    }
}

/// Compile `schema` in place of `at` without registering anything.
pub fn compile_transient(at: &SchemaNode, schema: Value) -> SchemaNode {
    Compiler::transient(at.context.clone()).compile_node(schema, at.location(), at.dialect.clone())
}

/// Descriptors of `dialect` that apply to `schema`, in table order.
fn applicable_keywords(dialect: &Dialect, schema: &Map<String, Value>) -> Vec<Keyword> {
    let ref_only = dialect.draft.is_legacy() && schema.contains_key("$ref");
    dialect
        .keywords
        .iter()
        .filter(|keyword| !ref_only || LEGACY_REF_KEYWORDS.contains(&keyword.keyword))
        .filter(|keyword| keyword.is_applicable(schema))
        .copied()
        .collect()
}

/// Attach the hooks of `keywords`, ordered by descending priority.
pub(crate) fn attach_hooks(node: &mut SchemaNode, keywords: &[Keyword]) {
    node.reducers = keywords.iter().filter(|k| k.reduce.is_some()).copied().collect();
    node.resolvers = keywords.iter().filter(|k| k.resolve.is_some()).copied().collect();
    node.validators = keywords.iter().filter(|k| k.validate.is_some()).copied().collect();
    sort_hooks(&mut node.reducers);
    sort_hooks(&mut node.resolvers);
}

/// Stable sort by descending `order`.
pub(crate) fn sort_hooks(hooks: &mut [Keyword]) {
    hooks.sort_by(|a, b| b.order.cmp(&a.order));
}

impl SchemaNode {
    /// Register `schema` as a remote document reachable under `url`.
    ///
    /// The remote shares this node's context, so `$ref`s of this document
    /// (and of every other remote) can point into it. Returns the remote's
    /// root node.
    pub fn add_remote(&self, url: &str, schema: Value) -> Result<SchemaNode, EngineError> {
        ensure_schema(&schema)?;
        let url = reference::join_id("", url.trim());
        if url.is_empty() {
            return Err(EngineError::InvalidRemote { url });
        }
        let dialect = select_dialect(&self.context.dialects, &schema)
            .cloned()
            .ok_or(EngineError::NoDialect)?;
        let compiler = Compiler::document(
            self.context.clone(),
            Arc::new(schema),
            DocumentKind::Remote(url),
            &dialect,
        );
        Ok(compiler.compile_document(dialect))
    }

    /// Compile the root node of this node's document.
    pub fn root(&self) -> Result<SchemaNode, EngineError> {
        let Some(target) = self.context.registry.read().root.clone() else {
            return Err(EngineError::RefsNotParsed {
                schema_location: self.schema_location.clone(),
            });
        };
        let schema = target.schema().cloned().unwrap_or(Value::Bool(true));
        let location = Location::root(target.parent_id.clone());
        Ok(Compiler::transient(self.context.clone()).compile_node(schema, location, target.dialect))
    }
}

impl Registry {
    /// Entries that belong to remote documents only.
    pub(crate) fn remotes_only(self) -> Registry {
        let documents: Vec<Arc<Value>> = self
            .remotes
            .values()
            .map(|target| target.document.clone())
            .collect();
        let is_remote = |target: &RefTarget| documents.iter().any(|d| Arc::ptr_eq(d, &target.document));
        Registry {
            refs: self.refs.into_iter().filter(|(_, t)| is_remote(t)).collect(),
            anchors: self.anchors.into_iter().filter(|(_, t)| is_remote(t)).collect(),
            dynamic_anchors: self
                .dynamic_anchors
                .into_iter()
                .filter(|(_, t)| is_remote(t))
                .collect(),
            recursive_anchors: self.recursive_anchors,
            remotes: self.remotes,
            root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::draft;

    fn compile_default(schema: Value) -> SchemaNode {
        compile(schema, CompileOptions::default()).unwrap()
    }

    #[test]
    fn test_rejects_non_schema_root() {
        let error = compile(json!(4), CompileOptions::default()).unwrap_err();
        assert_eq!(
            error,
            EngineError::InvalidSchema {
                kind: "integer".to_string()
            }
        );
    }

    #[test]
    fn test_empty_drafts_is_fatal() {
        let options = CompileOptions::default().with_drafts(Vec::new());
        assert_eq!(compile(json!({}), options).unwrap_err(), EngineError::NoDialect);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let schema = json!({
            "type": "object",
            "properties": { "a": { "type": "string", "minLength": 2 } },
            "oneOf": [{ "required": ["a"] }, { "required": ["b"] }]
        });
        assert_eq!(compile_default(schema.clone()), compile_default(schema));
    }

    #[test]
    fn test_children_carry_locations() {
        let node = compile_default(json!({
            "properties": { "a/b": { "items": { "type": "string" } } }
        }));
        let child = &node.properties.as_ref().unwrap()["a/b"];
        assert_eq!(child.schema_location, "#/properties/a~1b");
        let items = child.items.as_ref().unwrap();
        assert_eq!(items.schema_location, "#/properties/a~1b/items");
        assert_eq!(items.evaluation_path, "#/properties/a~1b/items");
    }

    #[test]
    fn test_malformed_keyword_is_skipped() {
        let node = compile_default(json!({ "properties": 4, "pattern": "(" }));
        assert!(node.properties.is_none());
        assert!(node.pattern.is_none());
    }

    #[test]
    fn test_legacy_ref_hides_siblings() {
        let options = CompileOptions::default().with_drafts(vec![Arc::new(draft::draft07())]);
        let node = compile(
            json!({ "$ref": "#/definitions/a", "type": "string", "definitions": { "a": {} } }),
            options,
        )
        .unwrap();
        let ids: Vec<&str> = node.validators.iter().map(|k| k.id).collect();
        assert!(ids.contains(&"$ref"));
        assert!(!ids.contains(&"type"));
        assert!(node.defs.is_some());
    }

    #[test]
    fn test_nested_schema_switches_dialect() {
        let node = compile_default(json!({
            "properties": {
                "old": { "$schema": "http://json-schema.org/draft-04/schema#", "type": "integer" }
            }
        }));
        let old = &node.properties.as_ref().unwrap()["old"];
        assert_eq!(old.dialect.version(), "draft-04");
        assert_eq!(node.dialect.version(), "draft-2020-12");
    }

    #[test]
    fn test_reducers_sorted_by_order() {
        let node = compile_default(json!({
            "$ref": "#/$defs/a",
            "allOf": [{}],
            "if": {},
            "$defs": { "a": {} }
        }));
        let orders: Vec<i32> = node.reducers.iter().map(|k| k.order).collect();
        let mut sorted = orders.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(orders, sorted);
    }

    #[test]
    fn test_add_remote_rejects_empty_url() {
        let node = compile_default(json!({}));
        assert_eq!(
            node.add_remote("", json!({})).unwrap_err(),
            EngineError::InvalidRemote { url: String::new() }
        );
    }

    #[test]
    fn test_root_compiles_document() {
        let node = compile_default(json!({ "properties": { "a": { "type": "string" } } }));
        let child = node.properties.as_ref().unwrap()["a"].clone();
        assert_eq!(child.root().unwrap(), node);
    }
}
