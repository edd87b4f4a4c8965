//! Keyword descriptors
//!
//! Each submodule exports `Keyword` constants. The draft tables in
//! [`crate::draft`] list which of them a dialect uses, in evaluation order.
//!
//! Reducer priorities (higher runs first):
//!
//! | keyword | order |
//! |---------|-------|
//! | `$ref`, `$recursiveRef`, `$dynamicRef` | 10 |
//! | `allOf` | 8 |
//! | `anyOf` | 7 |
//! | `oneOf` | 6 |
//! | `if` | 5 |
//! | dependencies | 4 |
//! | `patternProperties` | 3 |

pub mod array;
pub mod composition;
pub mod conditional;
pub mod defs;
pub mod dependencies;
pub mod number;
pub mod object;
pub mod reference;
pub mod string;
pub mod unevaluated;
pub mod value;

use indexmap::IndexMap;
use serde_json::Value;

use crate::compile::Compiler;
use crate::node::SchemaNode;

/// Compile every entry of an object valued keyword.
pub(crate) fn parse_map(
    node: &SchemaNode,
    compiler: &Compiler,
    keyword: &str,
) -> Option<IndexMap<String, SchemaNode>> {
    let Some(Value::Object(entries)) = node.schema.get(keyword) else {
        malformed(node, keyword);
        return None;
    };
    let map = entries
        .keys()
        .filter_map(|name| {
            compiler
                .child(node, &[keyword, name])
                .map(|child| (name.clone(), child))
        })
        .collect();
    Some(map)
}

/// Compile every entry of an array valued keyword.
pub(crate) fn parse_list(node: &SchemaNode, compiler: &Compiler, keyword: &str) -> Option<Vec<SchemaNode>> {
    let Some(Value::Array(entries)) = node.schema.get(keyword) else {
        malformed(node, keyword);
        return None;
    };
    let list = (0..entries.len())
        .filter_map(|index| compiler.child(node, &[keyword, &index.to_string()]))
        .collect();
    Some(list)
}

/// Compile a schema valued keyword.
pub(crate) fn parse_box(node: &SchemaNode, compiler: &Compiler, keyword: &str) -> Option<Box<SchemaNode>> {
    compiler.child(node, &[keyword]).map(Box::new)
}

pub(crate) fn malformed(node: &SchemaNode, keyword: &str) {
    tracing::debug!(keyword, location = %node.schema_location, "skipping malformed keyword");
}

/// Non-negative integer value of a keyword.
pub(crate) fn usize_keyword(node: &SchemaNode, keyword: &str) -> Option<usize> {
    let value = node.schema.get(keyword)?;
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    // draft-06 and later accept `2.0`
    value
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
        .map(|f| f as usize)
}

/// Join a data pointer with an object key or array index.
pub(crate) fn child_pointer(pointer: &str, token: impl AsRef<str>) -> String {
    schemata_pointer::join(pointer, token.as_ref())
}
