//! Typed schema builders.
//!
//! Each schema kind has its own builder type, so a constraint can only be
//! set on the kind it applies to: `max_items` exists on [`ArrayBuilder`] and
//! nowhere else. Mutators shared by every kind (description, optionality)
//! come from the [`SchemaBuilder`] trait.

use indexmap::IndexMap;
use regex::Regex;

use super::{
    ArrayConstraints, Bound, NumericConstraints, ObjectConstraints, Schema, SchemaError,
    SchemaKind, StringConstraints,
};

/// Attributes common to every schema kind.
#[derive(Debug, Clone)]
pub struct Common {
    description: Option<String>,
    required: bool,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            description: None,
            required: true,
        }
    }
}

impl Common {
    fn finish(self, kind: SchemaKind) -> Schema {
        Schema {
            description: self.description,
            required: self.required,
            kind,
        }
    }
}

/// Mutators available on every schema builder.
pub trait SchemaBuilder: Sized {
    /// Gives access to the attributes shared by every kind.
    fn common_mut(&mut self) -> &mut Common;

    /// Finishes the builder.
    fn build(self) -> Schema;

    /// Sets the human-readable description.
    #[must_use]
    fn description(mut self, text: impl Into<String>) -> Self {
        self.common_mut().description = Some(text.into());
        self
    }

    /// Marks the schema as optional when used as an object property.
    ///
    /// Properties are required by default.
    #[must_use]
    fn optional(mut self) -> Self {
        self.common_mut().required = false;
        self
    }
}

macro_rules! impl_schema_builder {
    ($builder:ty, |$this:ident| $kind:expr) => {
        impl SchemaBuilder for $builder {
            fn common_mut(&mut self) -> &mut Common {
                &mut self.common
            }

            fn build(self) -> Schema {
                let $this = self;
                $this.common.finish($kind)
            }
        }

        impl From<$builder> for Schema {
            fn from(builder: $builder) -> Self {
                builder.build()
            }
        }
    };
}

/// Builder for string schemas.
#[derive(Debug, Clone, Default)]
pub struct StringBuilder {
    common: Common,
    constraints: StringConstraints,
}

impl StringBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum length, in characters.
    #[must_use]
    pub fn min_length(mut self, length: usize) -> Self {
        self.constraints.min_length = Some(length);
        self
    }

    /// Sets the maximum length, in characters.
    #[must_use]
    pub fn max_length(mut self, length: usize) -> Self {
        self.constraints.max_length = Some(length);
        self
    }

    /// Requires the string to contain a match for `pattern`.
    ///
    /// Anchor the pattern with `^…$` to require a full match.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPattern`] if the pattern does not compile.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.constraints.pattern = Some(regex);
        Ok(self)
    }
}

impl_schema_builder!(StringBuilder, |b| SchemaKind::String(b.constraints));

/// Checks a `multipleOf` divisor.
fn checked_multiple_of(divisor: f64) -> Result<f64, SchemaError> {
    if divisor.is_finite() && divisor > 0.0 {
        Ok(divisor)
    } else {
        Err(SchemaError::InvalidMultipleOf(divisor.to_string()))
    }
}

/// Builder for number schemas.
#[derive(Debug, Clone, Default)]
pub struct NumberBuilder {
    common: Common,
    constraints: NumericConstraints,
}

impl NumberBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets an inclusive lower bound.
    #[must_use]
    pub fn minimum(mut self, value: f64) -> Self {
        self.constraints.minimum = Some(Bound {
            value,
            exclusive: false,
        });
        self
    }

    /// Sets an exclusive lower bound.
    #[must_use]
    pub fn exclusive_minimum(mut self, value: f64) -> Self {
        self.constraints.minimum = Some(Bound {
            value,
            exclusive: true,
        });
        self
    }

    /// Sets an inclusive upper bound.
    #[must_use]
    pub fn maximum(mut self, value: f64) -> Self {
        self.constraints.maximum = Some(Bound {
            value,
            exclusive: false,
        });
        self
    }

    /// Sets an exclusive upper bound.
    #[must_use]
    pub fn exclusive_maximum(mut self, value: f64) -> Self {
        self.constraints.maximum = Some(Bound {
            value,
            exclusive: true,
        });
        self
    }

    /// Requires the value to be a multiple of `divisor`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidMultipleOf`] unless `divisor` is finite
    /// and strictly positive.
    pub fn multiple_of(mut self, divisor: f64) -> Result<Self, SchemaError> {
        self.constraints.multiple_of = Some(checked_multiple_of(divisor)?);
        Ok(self)
    }
}

impl_schema_builder!(NumberBuilder, |b| SchemaKind::Number(b.constraints));

/// Builder for integer schemas.
#[derive(Debug, Clone, Default)]
pub struct IntegerBuilder {
    common: Common,
    constraints: NumericConstraints,
}

// Bounds are stored as f64; precision loss beyond 2^53 is accepted.
#[allow(clippy::cast_precision_loss)]
impl IntegerBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets an inclusive lower bound.
    #[must_use]
    pub fn minimum(mut self, value: i64) -> Self {
        self.constraints.minimum = Some(Bound {
            value: value as f64,
            exclusive: false,
        });
        self
    }

    /// Sets an exclusive lower bound.
    #[must_use]
    pub fn exclusive_minimum(mut self, value: i64) -> Self {
        self.constraints.minimum = Some(Bound {
            value: value as f64,
            exclusive: true,
        });
        self
    }

    /// Sets an inclusive upper bound.
    #[must_use]
    pub fn maximum(mut self, value: i64) -> Self {
        self.constraints.maximum = Some(Bound {
            value: value as f64,
            exclusive: false,
        });
        self
    }

    /// Sets an exclusive upper bound.
    #[must_use]
    pub fn exclusive_maximum(mut self, value: i64) -> Self {
        self.constraints.maximum = Some(Bound {
            value: value as f64,
            exclusive: true,
        });
        self
    }

    /// Requires the value to be a multiple of `divisor`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidMultipleOf`] unless `divisor` is
    /// strictly positive.
    pub fn multiple_of(mut self, divisor: i64) -> Result<Self, SchemaError> {
        self.constraints.multiple_of = Some(checked_multiple_of(divisor as f64)?);
        Ok(self)
    }
}

impl_schema_builder!(IntegerBuilder, |b| SchemaKind::Integer(b.constraints));

/// Builder for boolean schemas.
#[derive(Debug, Clone, Default)]
pub struct BooleanBuilder {
    common: Common,
}

impl BooleanBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl_schema_builder!(BooleanBuilder, |_b| SchemaKind::Boolean);

/// Builder for array schemas.
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    common: Common,
    constraints: ArrayConstraints,
}

impl ArrayBuilder {
    pub(crate) fn new(items: Schema) -> Self {
        Self {
            common: Common::default(),
            constraints: ArrayConstraints {
                items: Box::new(items),
                min_items: None,
                max_items: None,
                unique_items: false,
            },
        }
    }

    /// Sets the minimum number of elements.
    #[must_use]
    pub fn min_items(mut self, count: usize) -> Self {
        self.constraints.min_items = Some(count);
        self
    }

    /// Sets the maximum number of elements.
    #[must_use]
    pub fn max_items(mut self, count: usize) -> Self {
        self.constraints.max_items = Some(count);
        self
    }

    /// Requires all elements to be distinct.
    #[must_use]
    pub fn unique_items(mut self, unique: bool) -> Self {
        self.constraints.unique_items = unique;
        self
    }
}

impl_schema_builder!(ArrayBuilder, |b| SchemaKind::Array(b.constraints));

/// Builder for object schemas.
#[derive(Debug, Clone, Default)]
pub struct ObjectBuilder {
    common: Common,
    constraints: ObjectConstraints,
}

impl ObjectBuilder {
    pub(crate) fn new() -> Self {
        Self {
            common: Common::default(),
            constraints: ObjectConstraints {
                properties: IndexMap::new(),
                additional_properties: false,
            },
        }
    }

    /// Declares a property. Redeclaring a name replaces its schema in place.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.constraints
            .properties
            .insert(name.into(), schema.into());
        self
    }

    /// Allows keys that are not declared as properties.
    #[must_use]
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.constraints.additional_properties = allowed;
        self
    }
}

impl_schema_builder!(ObjectBuilder, |b| SchemaKind::Object(b.constraints));

/// Builder for string enumeration schemas.
#[derive(Debug, Clone, Default)]
pub struct EnumBuilder {
    common: Common,
    values: Vec<String>,
}

impl EnumBuilder {
    pub(crate) fn new(values: Vec<String>) -> Self {
        Self {
            common: Common::default(),
            values,
        }
    }
}

impl_schema_builder!(EnumBuilder, |b| SchemaKind::Enum(b.values));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_default_to_required() {
        let schema = Schema::string().build();
        assert!(schema.is_required());
        assert!(!Schema::string().optional().build().is_required());
    }

    #[test]
    fn description_is_kept() {
        let schema = Schema::boolean().description("A flag").build();
        assert_eq!(schema.description(), Some("A flag"));
    }

    #[test]
    fn invalid_pattern_is_construction_error() {
        let err = Schema::string().pattern("(unclosed").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn non_positive_multiple_of_rejected() {
        assert!(Schema::number().multiple_of(0.0).is_err());
        assert!(Schema::number().multiple_of(-2.0).is_err());
        assert!(Schema::number().multiple_of(f64::NAN).is_err());
        assert!(Schema::integer().multiple_of(0).is_err());
        assert!(Schema::integer().multiple_of(3).is_ok());
    }

    #[test]
    fn later_bound_replaces_earlier() {
        let schema = Schema::number().minimum(1.0).exclusive_minimum(2.0).build();
        let SchemaKind::Number(constraints) = schema.kind() else {
            panic!("expected number schema");
        };
        assert_eq!(
            constraints.minimum,
            Some(Bound {
                value: 2.0,
                exclusive: true
            })
        );
    }

    #[test]
    fn object_properties_keep_declaration_order() {
        let schema = Schema::object()
            .property("zeta", Schema::string())
            .property("alpha", Schema::integer())
            .property("mid", Schema::boolean())
            .build();
        let SchemaKind::Object(object) = schema.kind() else {
            panic!("expected object schema");
        };
        let names: Vec<&str> = object.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(!object.additional_properties);
    }
}
