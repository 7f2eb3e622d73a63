//! Schema validation.
//!
//! Validation runs in two passes per value: a type check, then the
//! constraints of the declared type. The first failure aborts validation and
//! is reported with the path that led to it.

use serde_json::{Map, Value};

use super::{
    ArrayConstraints, Bound, NumericConstraints, ObjectConstraints, Schema, SchemaKind,
    StringConstraints, ValidationError,
};

/// Tolerance used when deciding whether a remainder is zero (or equal to the
/// divisor) in `multipleOf` checks.
pub const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

pub(super) fn validate(schema: &Schema, value: &Value) -> Result<(), ValidationError> {
    validate_at(schema, value, "")
}

fn validate_at(schema: &Schema, value: &Value, path: &str) -> Result<(), ValidationError> {
    check_type(schema, value, path)?;

    match (&schema.kind, value) {
        (SchemaKind::String(constraints), Value::String(s)) => {
            check_string(constraints, s, path)
        }
        (SchemaKind::Number(constraints) | SchemaKind::Integer(constraints), Value::Number(n)) => {
            // Every serde_json number has an f64 view
            n.as_f64()
                .map_or(Ok(()), |n| check_numeric(constraints, n, path))
        }
        (SchemaKind::Array(constraints), Value::Array(items)) => {
            check_array(constraints, items, path)
        }
        (SchemaKind::Object(constraints), Value::Object(map)) => {
            check_object(constraints, map, path)
        }
        (SchemaKind::Enum(allowed), Value::String(s)) => check_enum(allowed, s, path),
        _ => Ok(()),
    }
}

fn location(path: &str) -> &str {
    if path.is_empty() {
        "root"
    } else {
        path
    }
}

fn fail(path: &str, message: String) -> Result<(), ValidationError> {
    Err(ValidationError {
        message,
        path: path.to_string(),
    })
}

/// Names the JSON type of a runtime value.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_type(schema: &Schema, value: &Value, path: &str) -> Result<(), ValidationError> {
    let matches = match (&schema.kind, value) {
        (SchemaKind::String(_) | SchemaKind::Enum(_), Value::String(_))
        | (SchemaKind::Number(_), Value::Number(_))
        | (SchemaKind::Boolean, Value::Bool(_))
        | (SchemaKind::Array(_), Value::Array(_))
        | (SchemaKind::Object(_), Value::Object(_)) => true,
        (SchemaKind::Integer(_), Value::Number(n)) => n.is_i64() || n.is_u64(),
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        fail(
            path,
            format!(
                "Type mismatch at {}: expected {}, got {}",
                location(path),
                schema.kind.type_name(),
                value_type_name(value)
            ),
        )
    }
}

fn check_string(
    constraints: &StringConstraints,
    s: &str,
    path: &str,
) -> Result<(), ValidationError> {
    let length = s.chars().count();

    if let Some(min) = constraints.min_length {
        if length < min {
            return fail(
                path,
                format!(
                    "String at {} is shorter than minimum length {min}",
                    location(path)
                ),
            );
        }
    }

    if let Some(max) = constraints.max_length {
        if length > max {
            return fail(
                path,
                format!(
                    "String at {} is longer than maximum length {max}",
                    location(path)
                ),
            );
        }
    }

    if let Some(ref pattern) = constraints.pattern {
        if !pattern.is_match(s) {
            return fail(
                path,
                format!(
                    "String at {} does not match pattern '{}'",
                    location(path),
                    pattern.as_str()
                ),
            );
        }
    }

    Ok(())
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < MULTIPLE_OF_TOLERANCE
}

/// Accepts remainders close to zero and close to the divisor itself, since
/// exact multiples such as `0.3 / 0.1` leave a remainder just below `0.1`.
fn is_multiple_of(value: f64, divisor: f64) -> bool {
    let remainder = (value % divisor).abs();
    approx_eq(remainder, 0.0) || approx_eq(remainder, divisor.abs())
}

fn check_numeric(
    constraints: &NumericConstraints,
    n: f64,
    path: &str,
) -> Result<(), ValidationError> {
    if let Some(Bound { value, exclusive }) = constraints.minimum {
        if exclusive && n <= value {
            return fail(
                path,
                format!("Value {n} at {} must be greater than {value}", location(path)),
            );
        }
        if !exclusive && n < value {
            return fail(
                path,
                format!("Value {n} at {} is less than minimum {value}", location(path)),
            );
        }
    }

    if let Some(Bound { value, exclusive }) = constraints.maximum {
        if exclusive && n >= value {
            return fail(
                path,
                format!("Value {n} at {} must be less than {value}", location(path)),
            );
        }
        if !exclusive && n > value {
            return fail(
                path,
                format!("Value {n} at {} is greater than maximum {value}", location(path)),
            );
        }
    }

    if let Some(divisor) = constraints.multiple_of {
        if !is_multiple_of(n, divisor) {
            return fail(
                path,
                format!("Value {n} at {} is not a multiple of {divisor}", location(path)),
            );
        }
    }

    Ok(())
}

fn check_array(
    constraints: &ArrayConstraints,
    items: &[Value],
    path: &str,
) -> Result<(), ValidationError> {
    if let Some(min) = constraints.min_items {
        if items.len() < min {
            return fail(
                path,
                format!("Array at {} has fewer than {min} items", location(path)),
            );
        }
    }

    if let Some(max) = constraints.max_items {
        if items.len() > max {
            return fail(
                path,
                format!("Array at {} has more than {max} items", location(path)),
            );
        }
    }

    if constraints.unique_items {
        for (i, a) in items.iter().enumerate() {
            if items[i + 1..].iter().any(|b| values_equal(a, b)) {
                return fail(
                    path,
                    format!("Array at {} contains duplicate items", location(path)),
                );
            }
        }
    }

    for (index, item) in items.iter().enumerate() {
        validate_at(&constraints.items, item, &format!("{path}[{index}]"))?;
    }

    Ok(())
}

/// JSON equality where numbers compare by value, so `1` and `1.0` are equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, x)| y.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn check_object(
    constraints: &ObjectConstraints,
    map: &Map<String, Value>,
    path: &str,
) -> Result<(), ValidationError> {
    for (name, property) in &constraints.properties {
        if property.required && !map.contains_key(name) {
            return fail(
                path,
                format!("Missing required property '{name}' at {}", location(path)),
            );
        }
    }

    for (key, value) in map {
        match constraints.properties.get(key) {
            Some(property) => {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                validate_at(property, value, &child)?;
            }
            None if constraints.additional_properties => {}
            None => {
                return fail(
                    path,
                    format!("Unexpected property '{key}' at {}", location(path)),
                );
            }
        }
    }

    Ok(())
}

fn check_enum(allowed: &[String], s: &str, path: &str) -> Result<(), ValidationError> {
    if allowed.iter().any(|candidate| candidate == s) {
        return Ok(());
    }
    fail(
        path,
        format!(
            "Value '{s}' at {} is not one of the allowed values: {}",
            location(path),
            allowed.join(", ")
        ),
    )
}
