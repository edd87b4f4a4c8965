//! Compiled schema nodes
//!
//! A `SchemaNode` is the compiled form of one (sub)schema. It owns its nested
//! nodes (properties, items, branches, ...) and shares the document
//! [`Context`] with every other node of the same document. Nodes are never
//! mutated once compiled: reduction, merging and reference resolution all
//! return new nodes.

use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::dialect::{Dialect, Keyword};
use crate::error::{ErrorCode, ErrorData, JsonError};

/// A `patternProperties` entry with its compiled regex.
#[derive(Debug, Clone)]
pub struct PatternProperty {
    pub pattern: String,
    pub regex: Regex,
    pub node: SchemaNode,
}

/// A `dependencies` entry: either a schema or a list of required names.
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    Schema(SchemaNode),
    Required(Vec<String>),
}

/// A late bound reference resolved against the dynamic scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicReference {
    /// `$recursiveRef`, with its statically resolved target
    Recursive { target: String },
    /// `$dynamicRef`, with its statically resolved target and anchor name
    Dynamic {
        target: String,
        anchor: Option<String>,
    },
}

impl DynamicReference {
    pub fn target(&self) -> &str {
        match self {
            DynamicReference::Recursive { target } => target,
            DynamicReference::Dynamic { target, .. } => target,
        }
    }
}

#[derive(Clone)]
pub struct SchemaNode {
    /// Raw schema value (boolean or object)
    pub schema: Value,
    /// Pointer from the compilation root, including `$ref` hops
    pub evaluation_path: String,
    /// Pointer from the original document root
    pub schema_location: String,
    /// Accumulated identity of the dynamic branches taken
    pub dynamic_id: String,
    /// Effective base identifier
    pub id: String,
    pub(crate) resource_location: String,
    pub context: Arc<Context>,
    pub dialect: Arc<Dialect>,

    pub reference: Option<String>,
    pub dynamic_reference: Option<DynamicReference>,
    pub defs: Option<IndexMap<String, SchemaNode>>,
    pub properties: Option<IndexMap<String, SchemaNode>>,
    pub pattern_properties: Option<Vec<PatternProperty>>,
    pub additional_properties: Option<Box<SchemaNode>>,
    pub property_names: Option<Box<SchemaNode>>,
    pub dependencies: Option<IndexMap<String, Dependency>>,
    pub dependent_schemas: Option<IndexMap<String, SchemaNode>>,
    pub items: Option<Box<SchemaNode>>,
    pub prefix_items: Option<Vec<SchemaNode>>,
    pub additional_items: Option<Box<SchemaNode>>,
    pub contains: Option<Box<SchemaNode>>,
    pub unevaluated_properties: Option<Box<SchemaNode>>,
    pub unevaluated_items: Option<Box<SchemaNode>>,
    pub all_of: Option<Vec<SchemaNode>>,
    pub any_of: Option<Vec<SchemaNode>>,
    pub one_of: Option<Vec<SchemaNode>>,
    pub not: Option<Box<SchemaNode>>,
    pub if_: Option<Box<SchemaNode>>,
    pub then: Option<Box<SchemaNode>>,
    pub else_: Option<Box<SchemaNode>>,
    pub pattern: Option<Regex>,

    pub reducers: Vec<Keyword>,
    pub resolvers: Vec<Keyword>,
    pub validators: Vec<Keyword>,
}

impl SchemaNode {
    /// A node without keyword state or hooks.
    pub(crate) fn bare(
        schema: Value,
        evaluation_path: String,
        schema_location: String,
        id: String,
        resource_location: String,
        context: Arc<Context>,
        dialect: Arc<Dialect>,
    ) -> Self {
        Self {
            dynamic_id: schema_location.clone(),
            schema,
            evaluation_path,
            schema_location,
            id,
            resource_location,
            context,
            dialect,
            reference: None,
            dynamic_reference: None,
            defs: None,
            properties: None,
            pattern_properties: None,
            additional_properties: None,
            property_names: None,
            dependencies: None,
            dependent_schemas: None,
            items: None,
            prefix_items: None,
            additional_items: None,
            contains: None,
            unevaluated_properties: None,
            unevaluated_items: None,
            all_of: None,
            any_of: None,
            one_of: None,
            not: None,
            if_: None,
            then: None,
            else_: None,
            pattern: None,
            reducers: Vec::new(),
            resolvers: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn schema_object(&self) -> Option<&Map<String, Value>> {
        self.schema.as_object()
    }

    pub fn keyword_value(&self, keyword: &str) -> Option<&Value> {
        self.schema.get(keyword)
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.schema_object()
            .is_some_and(|schema| schema.contains_key(keyword))
    }

    pub fn is_true(&self) -> bool {
        self.schema == Value::Bool(true)
    }

    pub fn is_false(&self) -> bool {
        self.schema == Value::Bool(false)
    }

    /// Whether any reducer or reference is attached.
    pub fn is_dynamic(&self) -> bool {
        !self.reducers.is_empty()
    }

    /// A copy with the given keywords removed from the schema, their
    /// precomputed state cleared and their hooks dropped.
    pub fn without(&self, keywords: &[&str]) -> SchemaNode {
        let mut node = self.clone();
        if let Value::Object(schema) = &mut node.schema {
            for keyword in keywords {
                schema.shift_remove(*keyword);
            }
        }
        for keyword in keywords {
            node.clear_keyword_state(keyword);
        }
        node.retain_present_hooks();
        node
    }

    /// Drop hooks whose keyword is no longer part of the schema.
    pub(crate) fn retain_present_hooks(&mut self) {
        let Value::Object(schema) = &self.schema else {
            self.reducers.clear();
            self.resolvers.clear();
            self.validators.clear();
            return;
        };
        let present = |k: &Keyword| k.is_applicable(schema);
        self.reducers.retain(present);
        self.resolvers.retain(present);
        self.validators.retain(present);
    }

    pub(crate) fn clear_keyword_state(&mut self, keyword: &str) {
        match keyword {
            "$ref" => self.reference = None,
            "$recursiveRef" | "$dynamicRef" => self.dynamic_reference = None,
            "$defs" | "definitions" => self.defs = None,
            "properties" => self.properties = None,
            "patternProperties" => self.pattern_properties = None,
            "additionalProperties" => self.additional_properties = None,
            "propertyNames" => self.property_names = None,
            "dependencies" => self.dependencies = None,
            "dependentSchemas" => self.dependent_schemas = None,
            "items" => {
                self.items = None;
                if !self.has_keyword("prefixItems") {
                    self.prefix_items = None;
                }
            }
            "prefixItems" => self.prefix_items = None,
            "additionalItems" => self.additional_items = None,
            "contains" => self.contains = None,
            "unevaluatedProperties" => self.unevaluated_properties = None,
            "unevaluatedItems" => self.unevaluated_items = None,
            "allOf" => self.all_of = None,
            "anyOf" => self.any_of = None,
            "oneOf" => self.one_of = None,
            "not" => self.not = None,
            "if" => self.if_ = None,
            "then" => self.then = None,
            "else" => self.else_ = None,
            "pattern" => self.pattern = None,
            _ => {}
        }
    }

    /// Build an error for this node using the dialect's templates.
    pub fn create_error(
        &self,
        code: ErrorCode,
        pointer: &str,
        value: &Value,
        extra: Value,
    ) -> JsonError {
        let data = ErrorData::new(pointer, self.schema.clone(), value.clone()).with_extra(extra);
        self.dialect.create_error(code, data)
    }

    /// Directly nested nodes, in keyword order.
    pub fn children(&self) -> Vec<&SchemaNode> {
        let mut children: Vec<&SchemaNode> = Vec::new();
        let maps = [&self.defs, &self.properties, &self.dependent_schemas];
        for map in maps.into_iter().flatten() {
            children.extend(map.values());
        }
        if let Some(patterns) = &self.pattern_properties {
            children.extend(patterns.iter().map(|p| &p.node));
        }
        if let Some(dependencies) = &self.dependencies {
            children.extend(dependencies.values().filter_map(|d| match d {
                Dependency::Schema(node) => Some(node),
                Dependency::Required(_) => None,
            }));
        }
        let lists = [&self.prefix_items, &self.all_of, &self.any_of, &self.one_of];
        for list in lists.into_iter().flatten() {
            children.extend(list.iter());
        }
        let singles = [
            &self.additional_properties,
            &self.property_names,
            &self.items,
            &self.additional_items,
            &self.contains,
            &self.unevaluated_properties,
            &self.unevaluated_items,
            &self.not,
            &self.if_,
            &self.then,
            &self.else_,
        ];
        children.extend(singles.into_iter().flatten().map(|b| b.as_ref()));
        children
    }

    /// Visit this node and every nested node, depth first.
    pub fn each_schema(&self, visitor: &mut dyn FnMut(&SchemaNode)) {
        visitor(self);
        for child in self.children() {
            child.each_schema(visitor);
        }
    }
}

fn hook_ids(hooks: &[Keyword]) -> Vec<&'static str> {
    hooks.iter().map(|k| k.id).collect()
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.evaluation_path == other.evaluation_path
            && self.schema_location == other.schema_location
            && self.dynamic_id == other.dynamic_id
            && self.id == other.id
            && self.reference == other.reference
            && hook_ids(&self.reducers) == hook_ids(&other.reducers)
            && hook_ids(&self.resolvers) == hook_ids(&other.resolvers)
            && hook_ids(&self.validators) == hook_ids(&other.validators)
    }
}

impl core::fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SchemaNode")
            .field("schema", &self.schema)
            .field("evaluation_path", &self.evaluation_path)
            .field("schema_location", &self.schema_location)
            .field("dynamic_id", &self.dynamic_id)
            .field("id", &self.id)
            .field("reducers", &hook_ids(&self.reducers))
            .field("resolvers", &hook_ids(&self.resolvers))
            .field("validators", &hook_ids(&self.validators))
            .finish()
    }
}
