#![doc = include_str!("../README.md")]

pub mod compile;
pub mod config;
pub mod context;
pub mod create_schema;
pub mod data;
pub mod dialect;
pub mod draft;
pub mod error;
pub mod format;
pub mod get;
pub mod keywords;
pub mod merge;
pub mod node;
pub mod reduce;
pub mod reference;
pub mod types;
pub mod validate;

pub use compile::{Compiler, Location, compile, compile_transient};
pub use config::{CompileOptions, Config, GetDataOptions, GetOptions};
pub use context::Context;
pub use create_schema::create_schema;
pub use dialect::{Dialect, DialectMethods, Draft, Keyword, select_dialect};
pub use error::{EngineError, ErrorCode, ErrorData, JsonError};
pub use get::{DataNode, ResolveInput};
pub use merge::{merge, merge_omitting, merge_schema};
pub use node::SchemaNode;
pub use reduce::{ReduceInput, ReduceOptions};
pub use types::JsonType;
pub use validate::{ValidationInput, ValidationOutcome, ValidationOutput, ValidationPath, ValidationReport};
