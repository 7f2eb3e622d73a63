//! Schema engine for tool input validation.
//!
//! A [`Schema`] describes the shape of a JSON value: one of string, number,
//! integer, boolean, array, object, or a string enumeration. Schemas are
//! built once through the typed builders in [`builder`], are immutable
//! afterwards, and serve two purposes:
//!
//! - [`Schema::validate`] checks an incoming argument value
//! - [`Schema::to_document`] projects the schema into a JSON-Schema document
//!   for `tools/list`
//!
//! # Additional properties
//!
//! Object schemas reject unlisted keys unless
//! [`ObjectBuilder::additional_properties`] is called with `true`. This is
//! stricter than the JSON-Schema default, which allows them. The generated
//! document always states `additionalProperties` explicitly.
//!
//! # Example
//!
//! ```
//! use mcp_server_kit::schema::{Schema, SchemaBuilder};
//! use serde_json::json;
//!
//! let schema: Schema = Schema::object()
//!     .property("a", Schema::number().minimum(-1000.0).maximum(1000.0))
//!     .property("b", Schema::number().minimum(-1000.0).maximum(1000.0))
//!     .build();
//!
//! assert!(schema.validate(&json!({"a": 2, "b": 3})).is_ok());
//! assert!(schema.validate(&json!({"a": "x", "b": 3})).is_err());
//! ```

pub mod builder;
mod document;
mod validate;

pub use builder::{
    ArrayBuilder, BooleanBuilder, EnumBuilder, IntegerBuilder, NumberBuilder, ObjectBuilder,
    SchemaBuilder, StringBuilder,
};
pub use validate::MULTIPLE_OF_TOLERANCE;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while constructing a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The string pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// `multipleOf` must be a finite, strictly positive number.
    #[error("multipleOf must be a positive number, got {0}")]
    InvalidMultipleOf(String),
}

/// A failed validation, carrying the location of the first failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable description, including the location.
    pub message: String,
    /// Path to the failing value (`""` for the root).
    pub path: String,
}

/// A numeric bound, inclusive unless `exclusive` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// The limit.
    pub value: f64,
    /// Whether the limit itself is excluded.
    pub exclusive: bool,
}

/// Constraints for string schemas.
#[derive(Debug, Clone, Default)]
pub struct StringConstraints {
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    /// Pattern the string must contain a match for.
    pub pattern: Option<Regex>,
}

/// Constraints shared by number and integer schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericConstraints {
    /// Lower bound.
    pub minimum: Option<Bound>,
    /// Upper bound.
    pub maximum: Option<Bound>,
    /// Value must be a multiple of this divisor.
    pub multiple_of: Option<f64>,
}

/// Constraints for array schemas.
#[derive(Debug, Clone)]
pub struct ArrayConstraints {
    /// Schema every element must satisfy.
    pub items: Box<Schema>,
    /// Minimum element count.
    pub min_items: Option<usize>,
    /// Maximum element count.
    pub max_items: Option<usize>,
    /// Whether all elements must be distinct.
    pub unique_items: bool,
}

/// Constraints for object schemas.
#[derive(Debug, Clone, Default)]
pub struct ObjectConstraints {
    /// Declared properties, in declaration order.
    pub properties: IndexMap<String, Schema>,
    /// Whether keys not listed in `properties` are accepted.
    pub additional_properties: bool,
}

/// The type-specific part of a schema.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// A JSON string.
    String(StringConstraints),
    /// Any JSON number.
    Number(NumericConstraints),
    /// A JSON number with an integral encoding.
    Integer(NumericConstraints),
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    Array(ArrayConstraints),
    /// A JSON object.
    Object(ObjectConstraints),
    /// A string drawn from a fixed set.
    Enum(Vec<String>),
}

impl SchemaKind {
    /// Returns the JSON-Schema type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) | Self::Enum(_) => "string",
            Self::Number(_) => "number",
            Self::Integer(_) => "integer",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// An immutable schema description.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) description: Option<String>,
    pub(crate) required: bool,
    pub(crate) kind: SchemaKind,
}

impl Schema {
    /// Starts a string schema.
    #[must_use]
    pub fn string() -> StringBuilder {
        StringBuilder::new()
    }

    /// Starts a number schema.
    #[must_use]
    pub fn number() -> NumberBuilder {
        NumberBuilder::new()
    }

    /// Starts an integer schema.
    #[must_use]
    pub fn integer() -> IntegerBuilder {
        IntegerBuilder::new()
    }

    /// Starts a boolean schema.
    #[must_use]
    pub fn boolean() -> BooleanBuilder {
        BooleanBuilder::new()
    }

    /// Starts an array schema whose elements follow `items`.
    #[must_use]
    pub fn array(items: impl Into<Self>) -> ArrayBuilder {
        ArrayBuilder::new(items.into())
    }

    /// Starts an object schema.
    #[must_use]
    pub fn object() -> ObjectBuilder {
        ObjectBuilder::new()
    }

    /// Starts a string enumeration schema.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> EnumBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumBuilder::new(values.into_iter().map(Into::into).collect())
    }

    /// Returns the description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether this schema, used as an object property, is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the type-specific part of the schema.
    #[must_use]
    pub const fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Validates `value` against this schema.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered, with its location.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        validate::validate(self, value)
    }

    /// Projects this schema into a JSON-Schema document.
    #[must_use]
    pub fn to_document(&self) -> Value {
        document::to_document(self)
    }
}
