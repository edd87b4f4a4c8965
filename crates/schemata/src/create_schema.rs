//! Schema inference from data

use serde_json::{Map, Value, json};

use crate::types::{JsonType, push_unique, type_of};

/// Infer a schema describing `data`.
///
/// Objects list their properties, arrays describe their items with one
/// schema: integers widen to numbers, object schemas merge their properties
/// and anything else becomes an `anyOf`.
pub fn create_schema(data: &Value) -> Value {
    match data {
        Value::Object(object) => {
            let properties: Map<String, Value> = object
                .iter()
                .map(|(key, value)| (key.clone(), create_schema(value)))
                .collect();
            json!({ "type": "object", "properties": properties })
        }
        Value::Array(items) => {
            let mut schemas: Vec<Value> = Vec::new();
            for item in items {
                unify(&mut schemas, create_schema(item));
            }
            match schemas.len() {
                0 => json!({ "type": "array" }),
                1 => json!({ "type": "array", "items": schemas.remove(0) }),
                _ => json!({ "type": "array", "items": { "anyOf": schemas } }),
            }
        }
        value => json!({ "type": type_of(value).as_str() }),
    }
}

fn type_name(schema: &Value) -> Option<JsonType> {
    schema.get("type").and_then(Value::as_str).and_then(JsonType::from_name)
}

/// Add `schema` to the item schemas collected so far.
fn unify(schemas: &mut Vec<Value>, schema: Value) {
    let ty = type_name(&schema);
    let numeric = |t: Option<JsonType>| matches!(t, Some(JsonType::Integer | JsonType::Number));
    for existing in schemas.iter_mut() {
        let existing_ty = type_name(existing);
        if numeric(ty) && numeric(existing_ty) {
            if ty != existing_ty {
                *existing = json!({ "type": "number" });
            }
            return;
        }
        if ty == Some(JsonType::Object) && existing_ty == Some(JsonType::Object) {
            merge_properties(existing, &schema);
            return;
        }
    }
    push_unique(schemas, schema);
}

fn merge_properties(target: &mut Value, source: &Value) {
    let Some(Value::Object(incoming)) = source.get("properties") else {
        return;
    };
    let Some(Value::Object(properties)) = target.get_mut("properties") else {
        return;
    };
    for (key, schema) in incoming {
        if !properties.contains_key(key) {
            properties.insert(key.clone(), schema.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(create_schema(&json!(1)), json!({ "type": "integer" }));
        assert_eq!(create_schema(&json!(1.5)), json!({ "type": "number" }));
        assert_eq!(create_schema(&json!(null)), json!({ "type": "null" }));
        assert_eq!(create_schema(&json!("x")), json!({ "type": "string" }));
    }

    #[test]
    fn test_object() {
        assert_eq!(
            create_schema(&json!({ "a": true, "b": { "c": [] } })),
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "boolean" },
                    "b": { "type": "object", "properties": { "c": { "type": "array" } } }
                }
            })
        );
    }

    #[test]
    fn test_array_items_unify() {
        assert_eq!(
            create_schema(&json!([1, 2.5, 3])),
            json!({ "type": "array", "items": { "type": "number" } })
        );
        assert_eq!(
            create_schema(&json!([{ "a": 1 }, { "b": "x" }])),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": { "a": { "type": "integer" }, "b": { "type": "string" } }
                }
            })
        );
        assert_eq!(
            create_schema(&json!(["a", 1, "b"])),
            json!({ "type": "array", "items": { "anyOf": [{ "type": "string" }, { "type": "integer" }] } })
        );
    }
}
