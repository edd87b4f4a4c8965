//! `$defs` and `definitions`
//!
//! Definitions are compiled eagerly so every nested schema is registered
//! before the first reference is resolved.

use crate::compile::Compiler;
use crate::dialect::Keyword;
use crate::keywords::parse_map;
use crate::node::SchemaNode;

pub const DEFS: Keyword = Keyword::new("$defs", "$defs").with_parse(parse_defs);
pub const DEFINITIONS: Keyword = Keyword::new("definitions", "definitions").with_parse(parse_definitions);

fn extend(node: &mut SchemaNode, compiler: &Compiler, keyword: &str) {
    let Some(parsed) = parse_map(node, compiler, keyword) else {
        return;
    };
    node.defs.get_or_insert_with(Default::default).extend(parsed);
}

fn parse_defs(node: &mut SchemaNode, compiler: &Compiler) {
    extend(node, compiler, "$defs");
}

fn parse_definitions(node: &mut SchemaNode, compiler: &Compiler) {
    extend(node, compiler, "definitions");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::compile;
    use crate::config::CompileOptions;

    #[test]
    fn test_both_definition_keywords_compile() {
        let node = compile::compile(
            json!({
                "$defs": { "a": { "type": "string" } },
                "definitions": { "b": { "type": "number" } }
            }),
            CompileOptions::default(),
        )
        .unwrap();
        let defs = node.defs.as_ref().unwrap();
        assert_eq!(defs["a"].schema_location, "#/$defs/a");
        assert_eq!(defs["b"].schema_location, "#/definitions/b");
        assert!(node.context.has_ref("#/definitions/b"));
    }
}
