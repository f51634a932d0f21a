use super::{Element, SchemaAggregator};
use crate::context::{CacheEntry, SynthesisContext};
use crate::error::JsonSchemaError;
use crate::names;
use crate::schema::Schema;
use crate::synth;
use crate::types::{Inclusion, SubtypeRef, Subtypes, TypeDef, TypeIdStrategy};

/// Builds `oneOf` alternatives for a type with a closed set of subtypes and
/// injects the discriminator into each alternative.
pub struct PolymorphismAggregator;

impl SchemaAggregator for PolymorphismAggregator {
    fn add_info<'a>(
        &self,
        element: &Element<'a>,
        mut schema: Schema,
        ctx: &mut SynthesisContext<'a>,
    ) -> Result<Schema, JsonSchemaError> {
        let Element::Type(type_def) = *element else {
            return Ok(schema);
        };
        let Some(subtypes) = &type_def.subtypes else {
            return Ok(schema);
        };
        let mut alternatives: Vec<Schema> = Vec::with_capacity(subtypes.types.len());
        for subtype in &subtypes.types {
            let Some(subtype_def) = ctx.find_type(&subtype.type_name) else {
                ctx.warn(
                    &type_def.name,
                    format!("subtype {} is unknown and was skipped", subtype.type_name),
                );
                continue;
            };
            ctx.touch(&subtype_def.name);
            let alternative: Schema = subtype_schema(subtype_def, ctx)?;
            alternatives.push(discriminate(type_def, subtypes, subtype, subtype_def, alternative, ctx));
        }
        if let Some(object) = schema.content_mut() {
            object.one_of.extend(alternatives);
        }
        Ok(schema)
    }
}

/// The subtype's own schema. An addressable subtype's document is reused
/// without `$id` and `$schema` so the discriminator can be added to it.
fn subtype_schema<'a>(
    subtype_def: &'a TypeDef,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    let schema: Schema = synth::named_schema(&subtype_def.name, ctx)?;
    let Some(reference) = schema.reference_uri() else {
        return Ok(schema);
    };
    if let Some(CacheEntry::Document {
        id,
        schema: Some(document),
    }) = ctx.cached(&subtype_def.name)
        && id == reference
        && document.as_object().is_some_and(|object| object.defs.is_empty())
    {
        let mut detached: Schema = document.clone();
        if let Some(object) = detached.as_object_mut() {
            object.id = None;
            object.schema = None;
        }
        return Ok(detached);
    }
    Ok(schema)
}

/// The discriminator value of a subtype, or `None` when it is written as an
/// enumeration of aliases.
fn discriminator_value(
    parent: &TypeDef,
    subtypes: &Subtypes,
    subtype: &SubtypeRef,
    subtype_def: &TypeDef,
) -> Option<String> {
    match subtypes.id {
        TypeIdStrategy::Name | TypeIdStrategy::SimpleName => {
            if subtypes.id == TypeIdStrategy::Name && !subtype.names.is_empty() {
                return None;
            }
            Some(
                subtype
                    .name
                    .clone()
                    .or_else(|| subtype_def.type_name.clone())
                    .unwrap_or_else(|| subtype_def.simple_name()),
            )
        }
        TypeIdStrategy::Class => Some(subtype_def.name.clone()),
        TypeIdStrategy::MinimalClass => Some(names::minimal_class_name(
            parent.namespace(),
            &subtype_def.name,
        )),
        TypeIdStrategy::Deduction | TypeIdStrategy::None => None,
    }
}

fn discriminate(
    parent: &TypeDef,
    subtypes: &Subtypes,
    subtype: &SubtypeRef,
    subtype_def: &TypeDef,
    mut alternative: Schema,
    ctx: &mut SynthesisContext<'_>,
) -> Schema {
    let Some(property) = subtypes.discriminator() else {
        return alternative;
    };
    if matches!(subtypes.id, TypeIdStrategy::Deduction | TypeIdStrategy::None) {
        return alternative;
    }
    let value: Option<String> = discriminator_value(parent, subtypes, subtype, subtype_def);
    match subtypes.include {
        Inclusion::Property | Inclusion::ExistingProperty => {
            let discriminator: Schema = match &value {
                Some(value) => Schema::string().with_const(value.as_str()),
                None => Schema::string().with_enum_values(subtype.names.iter().map(String::as_str)),
            };
            if alternative.content_mut().is_none() {
                ctx.warn(
                    &parent.name,
                    format!(
                        "discriminator {property} cannot be added to subtype {} because its schema is a reference",
                        subtype_def.name
                    ),
                );
                return alternative;
            }
            alternative
                .with_property(property, discriminator)
                .with_required(property)
        }
        Inclusion::WrapperObject => {
            let key: String = value
                .or_else(|| subtype.names.first().cloned())
                .unwrap_or_else(|| subtype_def.simple_name());
            Schema::object()
                .with_property(key.as_str(), alternative)
                .with_required(key)
        }
        Inclusion::WrapperArray | Inclusion::ExternalProperty => {
            ctx.warn(
                &parent.name,
                format!("subtype inclusion {:?} is not supported", subtypes.include),
            );
            alternative
        }
    }
}
