//! Integration tests for schema construction, validation and the
//! JSON-Schema document projection.

use serde_json::json;

use mcp_server_kit::schema::{Schema, SchemaBuilder};

fn person() -> Schema {
    Schema::object()
        .property("name", Schema::string().min_length(1).max_length(40))
        .property("age", Schema::integer().minimum(0).maximum(150))
        .property(
            "email",
            Schema::string()
                .pattern(r"^[^@\s]+@[^@\s]+$")
                .unwrap()
                .optional(),
        )
        .property(
            "tags",
            Schema::array(Schema::string())
                .max_items(3)
                .unique_items(true)
                .optional(),
        )
        .build()
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_enum_scenario() {
    let colour = Schema::enumeration(["red", "green", "blue"]).build();

    assert!(colour.validate(&json!("green")).is_ok());

    let err = colour.validate(&json!("purple")).unwrap_err();
    assert!(err.message.contains("red, green, blue"), "{}", err.message);
}

#[test]
fn test_missing_required_property_at_root() {
    let err = person().validate(&json!({"name": "Ada"})).unwrap_err();
    assert_eq!(err.message, "Missing required property 'age' at root");
}

#[test]
fn test_unexpected_property_rejected_by_default() {
    let err = person()
        .validate(&json!({"name": "Ada", "age": 36, "nickname": "A"}))
        .unwrap_err();
    assert!(err.message.contains("Unexpected property 'nickname'"));
}

#[test]
fn test_additional_properties_can_be_allowed() {
    let open = Schema::object()
        .property("id", Schema::integer())
        .additional_properties(true)
        .build();

    assert!(open.validate(&json!({"id": 1, "extra": [1, 2]})).is_ok());
}

#[test]
fn test_optional_properties_may_be_absent() {
    assert!(person().validate(&json!({"name": "Ada", "age": 36})).is_ok());
}

#[test]
fn test_nested_failures_report_path() {
    let err = person()
        .validate(&json!({"name": "Ada", "age": 36, "tags": ["a", 2]}))
        .unwrap_err();
    assert_eq!(err.path, "tags[1]");
    assert!(err.message.contains("Type mismatch at tags[1]"));
}

#[test]
fn test_array_constraints() {
    let dupes = person()
        .validate(&json!({"name": "Ada", "age": 36, "tags": ["a", "a"]}))
        .unwrap_err();
    assert!(dupes.message.contains("duplicate"));

    let too_many = person()
        .validate(&json!({"name": "Ada", "age": 36, "tags": ["a", "b", "c", "d"]}))
        .unwrap_err();
    assert!(too_many.message.contains("more than 3 items"));
}

#[test]
fn test_unique_items_treats_equal_numbers_as_duplicates() {
    let schema = Schema::array(Schema::number()).unique_items(true).build();

    let err = schema.validate(&json!([1, 1.0])).unwrap_err();
    assert_eq!(err.path, "");
    assert!(err.message.contains("duplicate"));

    let nested = Schema::array(Schema::array(Schema::number()))
        .unique_items(true)
        .build();
    assert!(nested.validate(&json!([[1], [1.0]])).is_err());
    assert!(nested.validate(&json!([[1], [2]])).is_ok());
}

#[test]
fn test_pattern_and_length() {
    let bad_email = person()
        .validate(&json!({"name": "Ada", "age": 36, "email": "not-an-address"}))
        .unwrap_err();
    assert!(bad_email.message.contains("does not match pattern"));

    let empty_name = person()
        .validate(&json!({"name": "", "age": 36}))
        .unwrap_err();
    assert!(empty_name.message.contains("shorter than minimum length 1"));
}

#[test]
fn test_integer_bounds_and_encoding() {
    let schema = person();

    assert!(schema.validate(&json!({"name": "Ada", "age": 150})).is_ok());
    assert!(schema.validate(&json!({"name": "Ada", "age": 151})).is_err());
    assert!(schema.validate(&json!({"name": "Ada", "age": 36.5})).is_err());
}

#[test]
fn test_exclusive_bounds() {
    let positive = Schema::number().exclusive_minimum(0.0).build();

    assert!(positive.validate(&json!(0.001)).is_ok());
    let err = positive.validate(&json!(0)).unwrap_err();
    assert!(err.message.contains("must be greater than 0"));
}

#[test]
fn test_multiple_of_decimal_steps() {
    let price = Schema::number().multiple_of(0.01).unwrap().build();

    assert!(price.validate(&json!(19.99)).is_ok());
    assert!(price.validate(&json!(0.3)).is_ok());
    assert!(price.validate(&json!(0.005)).is_err());
}

#[test]
fn test_validation_is_repeatable() {
    let schema = person();
    let value = json!({"name": 7, "age": 36});

    assert_eq!(schema.validate(&value), schema.validate(&value));
}

// =============================================================================
// Document Projection Tests
// =============================================================================

#[test]
fn test_document_projection() {
    let doc = person().to_document();

    assert_eq!(doc["type"], "object");
    assert_eq!(doc["required"], json!(["name", "age"]));
    assert_eq!(doc["additionalProperties"], false);
    assert_eq!(doc["properties"]["name"]["minLength"], 1);
    assert_eq!(doc["properties"]["age"]["maximum"], 150);
    assert_eq!(doc["properties"]["tags"]["items"]["type"], "string");
    assert_eq!(doc["properties"]["tags"]["uniqueItems"], true);
}

#[test]
fn test_enum_document() {
    let doc = Schema::enumeration(["red", "green", "blue"])
        .description("A primary colour")
        .build()
        .to_document();

    assert_eq!(
        doc,
        json!({
            "type": "string",
            "description": "A primary colour",
            "enum": ["red", "green", "blue"]
        })
    );
}

#[test]
fn test_document_property_order_follows_declaration() {
    let doc = person().to_document();
    let keys: Vec<&String> = doc["properties"].as_object().unwrap().keys().collect();

    assert_eq!(keys, ["name", "age", "email", "tags"]);
}
