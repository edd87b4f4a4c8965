//! Shared compilation context
//!
//! One `Context` exists per compiled document and its remotes. Every node
//! holds it through an `Arc`. The reference registry inside is an arena keyed
//! by resolved identifiers: entries point at a document and a location inside
//! it, never at a node, so resolving a reference always recompiles the target
//! and no node graph cycles exist.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config::{Config, GetDataOptions};
use crate::dialect::Dialect;

/// A registered schema location: document + pointer into it.
#[derive(Debug, Clone)]
pub(crate) struct RefTarget {
    pub document: Arc<Value>,
    /// Location inside `document`, fragment form (`#/$defs/a`)
    pub pointer: String,
    /// Identifier the target was compiled against (its parent's identifier)
    pub parent_id: String,
    /// Identifier of the target itself
    pub id: String,
    /// Location of the schema resource the target belongs to
    pub resource_location: String,
    pub dialect: Arc<Dialect>,
}

impl RefTarget {
    pub fn schema(&self) -> Option<&Value> {
        schemata_pointer::get(&self.document, &self.pointer)
    }
}

/// Append-only reference tables.
#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    pub refs: AHashMap<String, RefTarget>,
    pub anchors: AHashMap<String, RefTarget>,
    pub dynamic_anchors: AHashMap<String, RefTarget>,
    pub remotes: AHashMap<String, RefTarget>,
    /// Declared `$recursiveAnchor` per schema resource identifier
    pub recursive_anchors: AHashMap<String, bool>,
    pub root: Option<RefTarget>,
}

pub struct Context {
    pub config: Config,
    /// Dialects available to documents of this context
    pub dialects: Vec<Arc<Dialect>>,
    /// Dialect of the root document
    pub dialect: Arc<Dialect>,
    pub get_data_defaults: GetDataOptions,
    pub(crate) registry: RwLock<Registry>,
}

impl Context {
    pub(crate) fn new(
        config: Config,
        dialects: Vec<Arc<Dialect>>,
        dialect: Arc<Dialect>,
        get_data_defaults: GetDataOptions,
        registry: Registry,
    ) -> Self {
        Self {
            config,
            dialects,
            dialect,
            get_data_defaults,
            registry: RwLock::new(registry),
        }
    }

    pub fn version(&self) -> &'static str {
        self.dialect.version()
    }

    /// Identifiers of all registered remote documents.
    pub fn remotes(&self) -> Vec<String> {
        let mut remotes: Vec<String> = self.registry.read().remotes.keys().cloned().collect();
        remotes.sort();
        remotes
    }

    /// Whether a resolved `id#pointer` key is registered.
    pub fn has_ref(&self, key: &str) -> bool {
        self.registry.read().refs.contains_key(key)
    }

    pub fn has_anchor(&self, key: &str) -> bool {
        self.registry.read().anchors.contains_key(key)
    }

    pub fn has_dynamic_anchor(&self, key: &str) -> bool {
        self.registry.read().dynamic_anchors.contains_key(key)
    }

    pub(crate) fn snapshot(&self) -> Registry {
        self.registry.read().clone()
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("Context")
            .field("version", &self.version())
            .field("refs", &registry.refs.len())
            .field("anchors", &registry.anchors.len())
            .field("dynamic_anchors", &registry.dynamic_anchors.len())
            .field("remotes", &registry.remotes.len())
            .finish()
    }
}
