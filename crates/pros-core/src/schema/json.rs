//! JSON Schema rendering of the schema graph.

use serde_json::{json, Map, Value};

use super::{FieldSchema, FieldType, ObjectSchema, SchemaError, SchemaSet};
use crate::model::PropertyKind;

impl SchemaSet {
    /// Render `root` as a JSON Schema document.
    ///
    /// Every other reachable object goes under `$defs`; references back to
    /// the root use `#`.
    pub fn to_json_schema(&self, root: &str) -> Result<Value, SchemaError> {
        let root_object = self
            .get(root)
            .ok_or_else(|| SchemaError::UnknownSchema(root.to_string()))?;

        let mut defs = Map::new();
        for name in self.reachable(root) {
            if name == root {
                continue;
            }
            let object = self
                .get(&name)
                .ok_or_else(|| SchemaError::UnknownSchema(name.clone()))?;
            defs.insert(name, object_json(object, root));
        }

        let mut document = object_json(root_object, root);
        if let Some(map) = document.as_object_mut() {
            map.insert(
                "$schema".to_string(),
                json!("https://json-schema.org/draft/2020-12/schema"),
            );
            if !defs.is_empty() {
                map.insert("$defs".to_string(), Value::Object(defs));
            }
        }
        Ok(document)
    }
}

fn object_json(object: &ObjectSchema, root: &str) -> Value {
    let properties: Map<String, Value> = object
        .fields
        .iter()
        .map(|field| (field.name.clone(), field_json(field, root)))
        .collect();
    let required: Vec<&str> = object
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect();

    json!({
        "title": object.name,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": object.additional_properties,
    })
}

fn field_json(field: &FieldSchema, root: &str) -> Value {
    let mut schema = type_json(&field.field_type, root);
    if !field.choices.is_empty() {
        if let Some(map) = schema.as_object_mut() {
            map.insert("enum".to_string(), json!(field.choices));
        }
    }

    let mut schema = if field.nullable {
        json!({ "anyOf": [schema, { "type": "null" }] })
    } else {
        schema
    };

    if let Some(map) = schema.as_object_mut() {
        if let Some(default) = &field.default {
            map.insert("default".to_string(), default.clone());
        }
        if let Some(description) = &field.description {
            map.insert("description".to_string(), json!(description));
        }
    }
    schema
}

fn type_json(field_type: &FieldType, root: &str) -> Value {
    match field_type {
        FieldType::Scalar { kind } => scalar_json(*kind),
        FieldType::Discriminant { value } => json!({ "type": "string", "enum": [value] }),
        FieldType::Array { items, bounds } => {
            let mut schema = json!({
                "type": "array",
                "items": type_json(items, root),
                "uniqueItems": bounds.unique_items,
            });
            if let Some(map) = schema.as_object_mut() {
                if let Some(min) = bounds.min_items {
                    map.insert("minItems".to_string(), json!(min));
                }
                if let Some(max) = bounds.max_items {
                    map.insert("maxItems".to_string(), json!(max));
                }
            }
            schema
        }
        FieldType::Object { schema } => reference(schema, root),
        FieldType::Union { schemas } => {
            let refs: Vec<Value> = schemas.iter().map(|s| reference(s, root)).collect();
            json!({ "anyOf": refs })
        }
    }
}

fn scalar_json(kind: PropertyKind) -> Value {
    match kind {
        PropertyKind::String => json!({ "type": "string" }),
        PropertyKind::Boolean => json!({ "type": "boolean" }),
        PropertyKind::Date => json!({ "type": "string", "format": "date" }),
        PropertyKind::DateTime => json!({ "type": "string", "format": "date-time" }),
        PropertyKind::Float => json!({ "type": "number" }),
        PropertyKind::Integer => json!({ "type": "integer" }),
        PropertyKind::UniqueId => json!({ "type": "string", "format": "uuid" }),
    }
}

fn reference(schema: &str, root: &str) -> Value {
    if schema == root {
        json!({ "$ref": "#" })
    } else {
        json!({ "$ref": format!("#/$defs/{}", schema) })
    }
}
