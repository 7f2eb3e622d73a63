//! JSON-Schema projection.

use serde_json::{json, Map, Value};

use super::{Bound, NumericConstraints, Schema, SchemaKind};

pub(super) fn to_document(schema: &Schema) -> Value {
    let mut doc = Map::new();
    doc.insert("type".into(), json!(schema.kind.type_name()));

    if let Some(ref description) = schema.description {
        doc.insert("description".into(), json!(description));
    }

    match &schema.kind {
        SchemaKind::String(constraints) => {
            if let Some(min) = constraints.min_length {
                doc.insert("minLength".into(), json!(min));
            }
            if let Some(max) = constraints.max_length {
                doc.insert("maxLength".into(), json!(max));
            }
            if let Some(ref pattern) = constraints.pattern {
                doc.insert("pattern".into(), json!(pattern.as_str()));
            }
        }
        SchemaKind::Number(constraints) | SchemaKind::Integer(constraints) => {
            insert_numeric(&mut doc, constraints);
        }
        SchemaKind::Boolean => {}
        SchemaKind::Array(constraints) => {
            doc.insert("items".into(), to_document(&constraints.items));
            if let Some(min) = constraints.min_items {
                doc.insert("minItems".into(), json!(min));
            }
            if let Some(max) = constraints.max_items {
                doc.insert("maxItems".into(), json!(max));
            }
            if constraints.unique_items {
                doc.insert("uniqueItems".into(), json!(true));
            }
        }
        SchemaKind::Object(constraints) => {
            let properties: Map<String, Value> = constraints
                .properties
                .iter()
                .map(|(name, property)| (name.clone(), to_document(property)))
                .collect();
            let required: Vec<&str> = constraints
                .properties
                .iter()
                .filter(|(_, property)| property.required)
                .map(|(name, _)| name.as_str())
                .collect();

            doc.insert("properties".into(), Value::Object(properties));
            if !required.is_empty() {
                doc.insert("required".into(), json!(required));
            }
            doc.insert(
                "additionalProperties".into(),
                json!(constraints.additional_properties),
            );
        }
        SchemaKind::Enum(values) => {
            doc.insert("enum".into(), json!(values));
        }
    }

    Value::Object(doc)
}

fn insert_numeric(doc: &mut Map<String, Value>, constraints: &NumericConstraints) {
    if let Some(Bound { value, exclusive }) = constraints.minimum {
        let key = if exclusive { "exclusiveMinimum" } else { "minimum" };
        doc.insert(key.into(), number(value));
    }
    if let Some(Bound { value, exclusive }) = constraints.maximum {
        let key = if exclusive { "exclusiveMaximum" } else { "maximum" };
        doc.insert(key.into(), number(value));
    }
    if let Some(divisor) = constraints.multiple_of {
        doc.insert("multipleOf".into(), number(divisor));
    }
}

/// Emits integral values without a fractional part.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number(value: f64) -> Value {
    let truncated = value.trunc();
    if truncated == value && value.abs() < 9.0e15 {
        json!(truncated as i64)
    } else {
        json!(value)
    }
}
