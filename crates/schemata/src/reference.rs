//! Identifiers and reference resolution
//!
//! # Registration
//!
//! While a document is compiled every node registers itself under
//! `"{resource id}#{pointer inside the resource}"` and under
//! `"{document id}#{schema location}"`. Anchors register as
//! `"{resource id}#{name}"`; `$dynamicAnchor`s go into both the anchor and the
//! dynamic anchor table. Registration is insert-if-absent.
//!
//! # Resolution
//!
//! `$ref` is joined with the node's identifier while compiling, so lookups
//! only deal with absolute keys. `$recursiveRef` and `$dynamicRef` are joined
//! the same way, but the final target depends on the schema resources on the
//! current [`ValidationPath`]. Resolved targets are recompiled below
//! `<evaluation path>/$ref`; no resolved node is ever cached.

use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::Url;

use crate::compile::{Compiler, Location};
use crate::context::{Context, RefTarget};
use crate::dialect::Dialect;
use crate::node::{DynamicReference, SchemaNode};
use crate::validate::ValidationPath;

/// Join a reference onto a base identifier.
///
/// Absolute bases are joined as URLs, relative or empty bases (documents
/// without `$id`) by plain path rules. An empty trailing fragment is dropped,
/// so `"http://x/a.json#"` and `"http://x/a.json"` are the same identifier.
pub fn join_id(base: &str, reference: &str) -> String {
    let joined = if reference.is_empty() {
        base.to_string()
    } else if reference.starts_with('#') {
        format!("{}{reference}", strip_fragment(base))
    } else if let Ok(url) = Url::parse(reference) {
        url.to_string()
    } else if let Ok(base_url) = Url::parse(base) {
        base_url
            .join(reference)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| reference.to_string())
    } else {
        join_relative(strip_fragment(base), reference)
    };
    match joined.strip_suffix('#') {
        Some(stripped) => stripped.to_string(),
        None => joined,
    }
}

fn join_relative(base: &str, reference: &str) -> String {
    if base.is_empty() || reference.starts_with('/') {
        return reference.to_string();
    }
    match base.rfind('/') {
        Some(index) => format!("{}{reference}", &base[..=index]),
        None => reference.to_string(),
    }
}

pub(crate) fn strip_fragment(id: &str) -> &str {
    id.split('#').next().unwrap_or(id)
}

/// Split an identifier into base and (raw) fragment.
pub(crate) fn split_fragment(id: &str) -> (&str, &str) {
    match id.split_once('#') {
        Some((base, fragment)) => (base, fragment),
        None => (id, ""),
    }
}

/// The identifier a schema declares for itself, if any.
///
/// In draft-04/06/07 an `$id` next to `$ref` is ignored.
pub(crate) fn declared_id<'a>(schema: &'a Value, dialect: &Dialect) -> Option<&'a str> {
    let schema = schema.as_object()?;
    if dialect.draft.is_legacy() && schema.contains_key("$ref") {
        return None;
    }
    schema.get(dialect.draft.id_keyword()).and_then(Value::as_str)
}

/// Identity of a compiled node.
pub(crate) struct Identity {
    pub id: String,
    pub resource_location: String,
}

/// Compute the identifier of a node and register it when `compiler` owns a
/// document.
pub(crate) fn parse_identity(
    compiler: &Compiler,
    schema: &Value,
    location: &Location,
    dialect: &std::sync::Arc<Dialect>,
) -> Identity {
    let mut anchor = None;
    let identity = match declared_id(schema, dialect) {
        Some(declared) if declared.starts_with('#') => {
            anchor = Some(declared[1..].to_string());
            inherited(location)
        }
        Some(declared) => {
            let joined = join_id(&location.parent_id, declared);
            let (base, fragment) = split_fragment(&joined);
            if !fragment.is_empty() && !fragment.starts_with('/') {
                anchor = Some(fragment.to_string());
            }
            Identity {
                id: base.to_string(),
                resource_location: location.schema_location.clone(),
            }
        }
        None => inherited(location),
    };
    if let Some(document) = &compiler.document {
        let target = RefTarget {
            document: document.clone(),
            pointer: location.schema_location.clone(),
            parent_id: location.parent_id.clone(),
            id: identity.id.clone(),
            resource_location: identity.resource_location.clone(),
            dialect: dialect.clone(),
        };
        register(compiler, schema, &identity, anchor, target);
    }
    identity
}

fn inherited(location: &Location) -> Identity {
    Identity {
        id: location.parent_id.clone(),
        resource_location: location.resource_location.clone(),
    }
}

fn register(
    compiler: &Compiler,
    schema: &Value,
    identity: &Identity,
    fragment_anchor: Option<String>,
    target: RefTarget,
) {
    let local = relative_pointer(&target.pointer, &identity.resource_location);
    let document_key = format!(
        "{}#{}",
        compiler.document_id,
        plain_pointer(&target.pointer)
    );
    let is_resource_root = target.pointer == identity.resource_location;
    let dialect = target.dialect.clone();

    let mut registry = compiler.context.registry.write();
    let key = format!("{}#{local}", identity.id);
    tracing::trace!(key = %key, "registering schema");
    registry.refs.entry(key).or_insert_with(|| target.clone());
    registry
        .refs
        .entry(document_key)
        .or_insert_with(|| target.clone());

    let legacy_ref = dialect.draft.is_legacy() && schema.get("$ref").is_some();
    if legacy_ref {
        return;
    }
    if let Some(name) = fragment_anchor {
        registry
            .anchors
            .entry(format!("{}#{name}", identity.id))
            .or_insert_with(|| target.clone());
    }
    if dialect.keyword("$anchor").is_some() {
        if let Some(name) = str_keyword(schema, "$anchor") {
            registry
                .anchors
                .entry(format!("{}#{name}", identity.id))
                .or_insert_with(|| target.clone());
        }
    }
    if dialect.keyword("$dynamicAnchor").is_some() {
        if let Some(name) = str_keyword(schema, "$dynamicAnchor") {
            let key = format!("{}#{name}", identity.id);
            registry
                .dynamic_anchors
                .entry(key.clone())
                .or_insert_with(|| target.clone());
            registry.anchors.entry(key).or_insert_with(|| target.clone());
        }
    }
    if dialect.keyword("$recursiveAnchor").is_some() && is_resource_root {
        if let Some(flag) = schema.get("$recursiveAnchor").and_then(Value::as_bool) {
            registry
                .recursive_anchors
                .entry(identity.id.clone())
                .or_insert(flag);
        }
    }
}

fn str_keyword<'a>(schema: &'a Value, keyword: &str) -> Option<&'a str> {
    schema.get(keyword).and_then(Value::as_str)
}

/// `schema_location` relative to its resource, in plain form (`/a/b`).
fn relative_pointer(schema_location: &str, resource_location: &str) -> String {
    match schema_location.strip_prefix(resource_location) {
        Some(rest) => rest.to_string(),
        None => plain_pointer(schema_location).to_string(),
    }
}

fn plain_pointer(pointer: &str) -> &str {
    pointer
        .strip_prefix(schemata_pointer::FRAGMENT_ROOT)
        .unwrap_or(pointer)
}

/// Find the registered target of an absolute reference.
pub(crate) fn lookup(context: &Context, reference: &str) -> Option<RefTarget> {
    let (base, fragment) = split_fragment(reference);
    let fragment = percent_decode_str(fragment).decode_utf8_lossy().into_owned();
    let is_pointer = fragment.is_empty() || fragment.starts_with('/');
    let key = format!("{base}#{fragment}");
    let registry = context.registry.read();

    if is_pointer {
        if let Some(target) = registry.refs.get(&key) {
            return Some(target.clone());
        }
    } else {
        let anchored = registry
            .anchors
            .get(&key)
            .or_else(|| registry.dynamic_anchors.get(&key));
        if let Some(target) = anchored {
            return Some(target.clone());
        }
        return None;
    }

    let remote = registry.remotes.get(base);
    if fragment.is_empty() {
        return remote.cloned();
    }
    let resource = registry.refs.get(&format!("{base}#")).or(remote);
    if let Some(target) = resource.and_then(|root| walk(root, &fragment)) {
        return Some(target);
    }
    registry.root.as_ref().and_then(|root| walk(root, &fragment))
}

/// Follow a pointer from a registered target into its document.
fn walk(from: &RefTarget, pointer: &str) -> Option<RefTarget> {
    let location = format!("{}{pointer}", schemata_pointer::normalize(&from.pointer));
    let value = schemata_pointer::get(&from.document, &location)?;
    if !matches!(value, Value::Bool(_) | Value::Object(_)) {
        return None;
    }
    Some(RefTarget {
        document: from.document.clone(),
        pointer: location,
        parent_id: from.id.clone(),
        id: from.id.clone(),
        resource_location: from.resource_location.clone(),
        dialect: from.dialect.clone(),
    })
}

/// Recompile a target below `node`'s evaluation path.
fn compile_target(node: &SchemaNode, target: &RefTarget, keyword: &str) -> Option<SchemaNode> {
    let schema = target.schema()?.clone();
    let location = Location {
        evaluation_path: schemata_pointer::join(&node.evaluation_path, keyword),
        schema_location: target.pointer.clone(),
        parent_id: target.parent_id.clone(),
        resource_location: target.resource_location.clone(),
    };
    Some(Compiler::transient(node.context.clone()).compile_node(
        schema,
        location,
        target.dialect.clone(),
    ))
}

/// Resolve the `$ref` of `node`.
pub fn resolve_ref(node: &SchemaNode) -> Option<SchemaNode> {
    let reference = node.reference.as_deref()?;
    let Some(target) = lookup(&node.context, reference) else {
        tracing::debug!(reference, location = %node.schema_location, "unresolved $ref");
        return None;
    };
    compile_target(node, &target, "$ref")
}

/// Resolve the `$recursiveRef` or `$dynamicRef` of `node` against the
/// dynamic scope recorded in `path`.
pub fn resolve_dynamic_ref(node: &SchemaNode, path: &ValidationPath) -> Option<SchemaNode> {
    let reference = node.dynamic_reference.as_ref()?;
    let target = dynamic_target(&node.context, reference, path);
    let keyword = match reference {
        DynamicReference::Recursive { .. } => "$recursiveRef",
        DynamicReference::Dynamic { .. } => "$dynamicRef",
    };
    let Some(found) = lookup(&node.context, &target) else {
        tracing::debug!(reference = %target, location = %node.schema_location, "unresolved {keyword}");
        return None;
    };
    compile_target(node, &found, keyword)
}

/// Pick the identifier a dynamic reference points at.
///
/// The statically resolved target is used unless it is itself anchored
/// (`$recursiveAnchor: true`, or a matching `$dynamicAnchor`). In that case
/// the outermost schema resource on the path with the same anchor wins. For
/// `$recursiveRef` the scan starts after the innermost resource that sets
/// `$recursiveAnchor: false`.
fn dynamic_target(context: &Context, reference: &DynamicReference, path: &ValidationPath) -> String {
    let registry = context.registry.read();
    let resources = path.resources();
    match reference {
        DynamicReference::Recursive { target } => {
            if registry.recursive_anchors.get(target) != Some(&true) {
                return target.clone();
            }
            let start = resources
                .iter()
                .rposition(|r| registry.recursive_anchors.get(r) == Some(&false))
                .map_or(0, |index| index + 1);
            resources[start..]
                .iter()
                .find(|r| registry.recursive_anchors.get(*r) == Some(&true))
                .cloned()
                .unwrap_or_else(|| target.clone())
        }
        DynamicReference::Dynamic { target, anchor } => {
            let Some(anchor) = anchor else {
                return target.clone();
            };
            if !registry.dynamic_anchors.contains_key(target) {
                return target.clone();
            }
            resources
                .iter()
                .map(|resource| format!("{resource}#{anchor}"))
                .find(|key| registry.dynamic_anchors.contains_key(key))
                .unwrap_or_else(|| target.clone())
        }
    }
}

impl SchemaNode {
    /// Resolve a reference relative to this node's identifier.
    pub fn get_ref(&self, reference: &str) -> Option<SchemaNode> {
        let absolute = join_id(&self.id, reference);
        let target = lookup(&self.context, &absolute)?;
        compile_target(self, &target, "$ref")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::compile;
    use crate::config::CompileOptions;

    #[test]
    fn test_join_id() {
        assert_eq!(join_id("", "#/a"), "#/a");
        assert_eq!(join_id("", "#"), "");
        assert_eq!(join_id("http://x.com/a/b.json", "c.json"), "http://x.com/a/c.json");
        assert_eq!(join_id("http://x.com/a/b.json#/x", "#foo"), "http://x.com/a/b.json#foo");
        assert_eq!(join_id("http://x.com/b.json", "http://y.com/z#"), "http://y.com/z");
        assert_eq!(join_id("dir/b.json", "c.json"), "dir/c.json");
        assert_eq!(join_id("b.json", "c.json"), "c.json");
        assert_eq!(join_id("http://x.com/root", ""), "http://x.com/root");
    }

    #[test]
    fn test_registers_pointers_and_anchors() {
        let node = compile::compile(
            json!({
                "$id": "http://example.com/root.json",
                "$defs": {
                    "a": { "$anchor": "foo", "type": "integer" },
                    "b": { "$id": "b.json", "$defs": { "c": {} } },
                    "d": { "$dynamicAnchor": "meta" }
                }
            }),
            CompileOptions::default(),
        )
        .unwrap();
        let context = &node.context;
        assert!(context.has_ref("http://example.com/root.json#"));
        assert!(context.has_ref("http://example.com/root.json#/$defs/a"));
        assert!(context.has_ref("http://example.com/b.json#"));
        assert!(context.has_ref("http://example.com/b.json#/$defs/c"));
        assert!(context.has_ref("http://example.com/root.json#/$defs/b/$defs/c"));
        assert!(context.has_anchor("http://example.com/root.json#foo"));
        assert!(context.has_anchor("http://example.com/root.json#meta"));
        assert!(context.has_dynamic_anchor("http://example.com/root.json#meta"));
    }

    #[test]
    fn test_get_ref_percent_decodes() {
        let node = compile::compile(
            json!({ "$defs": { "a b": { "type": "string" }, "c%d": { "type": "null" } } }),
            CompileOptions::default(),
        )
        .unwrap();
        let target = node.get_ref("#/$defs/a%20b").unwrap();
        assert_eq!(target.schema, json!({ "type": "string" }));
        let target = node.get_ref("#/$defs/c%25d").unwrap();
        assert_eq!(target.schema, json!({ "type": "null" }));
        assert!(node.get_ref("#/$defs/missing").is_none());
    }

    #[test]
    fn test_get_ref_walks_unregistered_locations() {
        let node = compile::compile(
            json!({ "x-container": { "inner": { "type": "boolean" } } }),
            CompileOptions::default(),
        )
        .unwrap();
        let target = node.get_ref("#/x-container/inner").unwrap();
        assert_eq!(target.schema, json!({ "type": "boolean" }));
        assert_eq!(target.schema_location, "#/x-container/inner");
        assert_eq!(target.evaluation_path, "#/$ref");
    }

    #[test]
    fn test_remote_lookup() {
        let node = compile::compile(json!({ "$ref": "http://remote.com/s.json#/$defs/n" }), CompileOptions::default())
            .unwrap();
        node.add_remote(
            "http://remote.com/s.json",
            json!({ "$defs": { "n": { "type": "number" } } }),
        )
        .unwrap();
        let target = resolve_ref(&node).unwrap();
        assert_eq!(target.schema, json!({ "type": "number" }));
        assert_eq!(node.context.remotes(), vec!["http://remote.com/s.json".to_string()]);
    }

    #[test]
    fn test_legacy_id_next_to_ref_is_ignored() {
        let options = CompileOptions::default()
            .with_drafts(vec![std::sync::Arc::new(crate::draft::draft07())]);
        let node = compile::compile(
            json!({
                "definitions": {
                    "a": { "$id": "http://other.com/a.json", "$ref": "#/definitions/b" },
                    "b": { "type": "string" }
                }
            }),
            options,
        )
        .unwrap();
        assert!(!node.context.has_ref("http://other.com/a.json#"));
        let a = &node.defs.as_ref().unwrap()["a"];
        assert_eq!(a.reference.as_deref(), Some("#/definitions/b"));
        assert_eq!(resolve_ref(a).unwrap().schema, json!({ "type": "string" }));
    }
}
