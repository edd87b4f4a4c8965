use std::sync::Arc;

use crate::dialect::Dialect;
use crate::node::SchemaNode;

/// Engine settings threaded through compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Schema keyword naming the property that selects a `oneOf` branch
    pub one_of_declarator: String,
    /// Flags applied to every `pattern`/`patternProperties` regex (`i`, `m`, `s`, `u`)
    pub regex_flags: String,
    /// Property names never produced by data synthesis
    pub property_blacklist: Vec<String>,
    /// Whether `format` produces validation errors
    pub format_assertion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            one_of_declarator: "oneOfProperty".to_string(),
            regex_flags: "u".to_string(),
            property_blacklist: Vec::new(),
            format_assertion: true,
        }
    }
}

/// Options for [`SchemaNode::get_data`](crate::SchemaNode::get_data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetDataOptions {
    /// Also create properties that are not listed in `required`
    pub add_optional_props: bool,
    /// Drop input data that contradicts the schema
    pub remove_invalid_data: bool,
    /// Fill missing required values inside object defaults
    pub extend_defaults: bool,
    /// Use `""`, `0`, `false`, ... for typed values without a default
    pub use_type_defaults: bool,
    /// How often the same `$ref` may be followed from the same origin
    pub recursion_limit: usize,
}

impl Default for GetDataOptions {
    fn default() -> Self {
        Self {
            add_optional_props: false,
            remove_invalid_data: false,
            extend_defaults: true,
            use_type_defaults: true,
            recursion_limit: 1,
        }
    }
}

/// Options for [`SchemaNode::get`](crate::SchemaNode::get) and
/// [`SchemaNode::get_schema`](crate::SchemaNode::get_schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetOptions {
    /// Return a `schema-warning` error instead of `None` for unknown keys
    pub with_schema_warning: bool,
    /// Infer a schema from the data for unknown keys
    pub create_schema: bool,
}

/// Options for [`compile`](crate::compile).
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Candidate dialects in matching order. `None` uses every built-in draft.
    pub drafts: Option<Vec<Arc<Dialect>>>,
    /// Share the remote documents already registered with this node
    pub remote: Option<SchemaNode>,
    pub config: Config,
    pub get_data_defaults: GetDataOptions,
}

impl CompileOptions {
    pub fn with_drafts(mut self, drafts: Vec<Arc<Dialect>>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    pub fn with_remote(mut self, remote: &SchemaNode) -> Self {
        self.remote = Some(remote.clone());
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}
