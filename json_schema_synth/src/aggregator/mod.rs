//! Aggregators enrich a freshly built structural schema with the metadata
//! declared on the element it was built for.
//!
//! They run in a fixed order, each taking the current schema by value and
//! returning the (possibly replaced) schema. Later aggregators rely on the
//! `properties` map and `type` set finalized by earlier ones.

mod constraints;
mod documentation;
mod polymorphism;
mod properties;

pub use constraints::ConstraintAggregator;
pub use documentation::DocumentationAggregator;
pub use polymorphism::PolymorphismAggregator;
pub use properties::PropertyAggregator;

use crate::context::SynthesisContext;
use crate::error::JsonSchemaError;
use crate::schema::Schema;
use crate::types::{PropertyDef, TypeDef, TypeUse};

/// The element a schema was built for.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    /// A named type's own schema.
    Type(&'a TypeDef),
    /// A property of `owner`.
    Property {
        owner: &'a TypeDef,
        property: &'a PropertyDef,
    },
    /// A collection element, map value or catch-all value type.
    TypeArgument(&'a TypeUse),
}

impl Element<'_> {
    /// Name used in diagnostics and errors.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Type(type_def) => type_def.name.clone(),
            Self::Property { owner, property } => format!("{}.{}", owner.name, property.name),
            Self::TypeArgument(type_use) => format!("type argument {:?}", type_use.ty),
        }
    }
}

pub trait SchemaAggregator {
    /// Adds the information of `element` to `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::MalformedMetadata`] when declared metadata
    /// cannot apply to the element.
    fn add_info<'a>(
        &self,
        element: &Element<'a>,
        schema: Schema,
        ctx: &mut SynthesisContext<'a>,
    ) -> Result<Schema, JsonSchemaError>;
}

/// Polymorphism, then property semantics, then constraints, then documentation.
pub const AGGREGATORS: &[&dyn SchemaAggregator] = &[
    &PolymorphismAggregator,
    &PropertyAggregator,
    &ConstraintAggregator,
    &DocumentationAggregator,
];

/// Threads `schema` through every aggregator in order.
///
/// # Errors
///
/// Stops at the first aggregator error.
pub fn aggregate<'a>(
    element: &Element<'a>,
    schema: Schema,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    AGGREGATORS
        .iter()
        .try_fold(schema, |schema, aggregator| aggregator.add_info(element, schema, ctx))
}
