use super::{Element, SchemaAggregator};
use crate::context::SynthesisContext;
use crate::error::JsonSchemaError;
use crate::schema::{AdditionalProperties, Schema, SchemaObject, SchemaType};
use crate::synth;
use crate::types::{Access, PropertyDef, TypeDef, TypeRef};

/// Applies serialization semantics to a type's `properties`: ignores, include
/// lists, catch-all maps, unwrapping, renames and per-property annotations.
pub struct PropertyAggregator;

impl SchemaAggregator for PropertyAggregator {
    fn add_info<'a>(
        &self,
        element: &Element<'a>,
        mut schema: Schema,
        ctx: &mut SynthesisContext<'a>,
    ) -> Result<Schema, JsonSchemaError> {
        let Element::Type(type_def) = *element else {
            return Ok(schema);
        };
        for hint in &type_def.hints {
            ctx.warn(
                &type_def.name,
                format!("serialization hint {} is not supported", hint.as_str()),
            );
        }
        let Some(object) = schema.content_mut() else {
            return Ok(schema);
        };
        if let Some(description) = &type_def.class_description {
            object.description = Some(description.clone());
        }

        // Declared properties are the snapshot; the map is edited in place.
        for property in &type_def.properties {
            apply_property(type_def, property, object, ctx)?;
        }

        if let Some(value) = &type_def.any_setter {
            object.additional_properties = if value.ty == TypeRef::Any {
                AdditionalProperties::Unset
            } else {
                AdditionalProperties::Typed(Box::new(synth::type_argument_schema(value, ctx)?))
            };
        }

        // A catch-all of `Any` values leaves the map unset but open.
        let captures_extra: bool = type_def.any_setter.is_some()
            || type_def
                .properties
                .iter()
                .any(|property| property.catch_all && !is_ignored(type_def, property, ctx));
        if ctx.is_strict(type_def)
            && !captures_extra
            && object.types.contains(&SchemaType::Object)
            && object.one_of.is_empty()
            && object.additional_properties.is_unset()
        {
            object.additional_properties = AdditionalProperties::Forbidden;
        }
        Ok(schema)
    }
}

fn is_ignored(type_def: &TypeDef, property: &PropertyDef, ctx: &SynthesisContext<'_>) -> bool {
    if property.ignored || type_def.ignore_properties.iter().any(|name| name == property.key()) {
        return true;
    }
    property
        .ty
        .type_name()
        .and_then(|name| ctx.find_type(name))
        .is_some_and(|property_type| property_type.ignored_type)
}

fn apply_property(
    type_def: &TypeDef,
    property: &PropertyDef,
    object: &mut SchemaObject,
    ctx: &mut SynthesisContext<'_>,
) -> Result<(), JsonSchemaError> {
    for hint in &property.hints {
        ctx.warn(
            &format!("{}.{}", type_def.name, property.name),
            format!("serialization hint {} is not supported", hint.as_str()),
        );
    }
    let Some(index) = object.properties.get_index_of(&property.name) else {
        return Ok(());
    };
    let key: &str = property.key();

    if is_ignored(type_def, property, ctx) {
        object.properties.shift_remove_index(index);
        return Ok(());
    }
    if let Some(include) = &type_def.include_properties
        && !include.iter().any(|name| name == key)
        && !property.explicitly_included
    {
        object.properties.shift_remove_index(index);
        return Ok(());
    }

    let Some((_, mut property_schema)) = object.properties.shift_remove_index(index) else {
        return Ok(());
    };

    if property.catch_all {
        if !property.ty.is_map() {
            return Err(JsonSchemaError::MalformedMetadata {
                element: format!("{}.{}", type_def.name, property.name),
                message: "a catch-all property must be of map type".to_string(),
            });
        }
        object.additional_properties = property_schema
            .as_object()
            .map(|map| map.additional_properties.clone())
            .unwrap_or_default();
        return Ok(());
    }

    if let Some(content) = property_schema.content_mut() {
        if let Some(description) = &property.description {
            content.description = Some(description.clone());
        }
        match property.access {
            Access::ReadOnly => content.read_only = Some(true),
            Access::WriteOnly => content.write_only = Some(true),
            Access::ReadWrite => {}
        }
        if property.deprecated {
            content.deprecated = Some(true);
        }
        if let Some(default) = &property.default_value {
            content.default = Some(default.clone());
        }
    }

    if property.unwrapped {
        let nested: Option<&Schema> = match property_schema.reference_uri() {
            Some(reference) => ctx.resolve_reference(reference),
            None => Some(&property_schema),
        };
        let Some(nested) = nested.and_then(Schema::as_object) else {
            ctx.warn(
                &format!("{}.{}", type_def.name, property.name),
                "unwrapped property has no properties to splice",
            );
            return Ok(());
        };
        for (offset, (name, schema)) in nested.properties.iter().enumerate() {
            object
                .properties
                .shift_insert(index + offset, name.clone(), schema.clone());
        }
        object.required.extend(nested.required.iter().cloned());
        return Ok(());
    }

    if key != property.name && object.properties.contains_key(key) {
        return Err(JsonSchemaError::MalformedMetadata {
            element: format!("{}.{}", type_def.name, property.name),
            message: format!("renamed to {key}, which another property already uses"),
        });
    }
    object
        .properties
        .shift_insert(index, key.to_string(), property_schema);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SynthesisSettings;
    use crate::types::{SerializationHint, TypeRegistry, TypeUse, ScalarType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn synthesize(registry: &TypeRegistry, name: &str, settings: SynthesisSettings) -> serde_json::Value {
        let mut ctx = SynthesisContext::new(registry, settings);
        serde_json::to_value(synth::synthesize(&mut ctx, name).unwrap()).unwrap()
    }

    fn keys(value: &serde_json::Value) -> Vec<String> {
        value["properties"]
            .as_object()
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn rename_keeps_position() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Keeper")
                .property(PropertyDef::new("firstName", TypeRef::string()).renamed("first_name"))
                .property(PropertyDef::new("age", TypeRef::Primitive(ScalarType::Int32))),
        );
        let value = synthesize(&registry, "zoo.Keeper", SynthesisSettings::default());
        assert_eq!(keys(&value), vec!["first_name", "age"]);
        assert_eq!(value["required"], json!(["age"]));
    }

    #[test]
    fn ignores_and_include_lists() {
        let registry = TypeRegistry::new()
            .with(
                TypeDef::bean("zoo.Keeper")
                    .ignoring(["secret"])
                    .include_only(["name", "badge"])
                    .property(PropertyDef::new("name", TypeRef::string()))
                    .property(PropertyDef::new("secret", TypeRef::string()))
                    .property(PropertyDef::new("internal", TypeRef::string()).ignored())
                    .property(PropertyDef::new("shift", TypeRef::string()))
                    .property(PropertyDef::new("notes", TypeRef::string()).explicitly_included())
                    .property(PropertyDef::new("handle", TypeRef::named("zoo.Handle"))),
            )
            .with(TypeDef::bean("zoo.Handle").ignored_type());
        let value = synthesize(&registry, "zoo.Keeper", SynthesisSettings::default());
        assert_eq!(keys(&value), vec!["name", "notes"]);
    }

    #[test]
    fn catch_all_becomes_additional_properties() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Tag")
                .property(PropertyDef::new("label", TypeRef::string()))
                .property(PropertyDef::new("extra", TypeRef::map(TypeRef::string())).catch_all()),
        );
        let value = synthesize(&registry, "zoo.Tag", SynthesisSettings::default());
        assert_eq!(keys(&value), vec!["label"]);
        assert_eq!(value["additionalProperties"], json!({ "type": ["string"] }));
    }

    #[test]
    fn catch_all_on_non_map_is_malformed() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Tag")
                .property(PropertyDef::new("extra", TypeRef::string()).catch_all()),
        );
        let mut ctx = SynthesisContext::new(&registry, SynthesisSettings::default());
        let err = synth::synthesize(&mut ctx, "zoo.Tag").unwrap_err();
        assert_eq!(
            err.to_string(),
            "zoo.Tag.extra: a catch-all property must be of map type"
        );
    }

    #[test]
    fn unwrapped_properties_are_spliced_in_place() {
        let registry = TypeRegistry::new()
            .with(
                TypeDef::bean("zoo.Enclosure")
                    .property(PropertyDef::new("id", TypeRef::Primitive(ScalarType::Int64)))
                    .property(PropertyDef::new("location", TypeRef::named("zoo.Location")).unwrapped())
                    .property(PropertyDef::new("open", TypeRef::Primitive(ScalarType::Boolean))),
            )
            .with(
                TypeDef::bean("zoo.Location")
                    .json_schema()
                    .property(PropertyDef::new("x", TypeRef::Primitive(ScalarType::Float64)))
                    .property(PropertyDef::new("y", TypeRef::Primitive(ScalarType::Float64))),
            );
        let value = synthesize(&registry, "zoo.Enclosure", SynthesisSettings::default());
        assert_eq!(keys(&value), vec!["id", "x", "y", "open"]);
        assert_eq!(value["required"], json!(["id", "open", "x", "y"]));
    }

    #[test]
    fn any_setter_and_annotations() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Ticket")
                .with_class_description("An entry ticket")
                .with_any_setter(TypeUse::from(TypeRef::Primitive(ScalarType::Int32)))
                .property(
                    PropertyDef::new("code", TypeRef::string())
                        .described("Ticket code")
                        .with_access(Access::ReadOnly)
                        .deprecated()
                        .with_default("A-1"),
                ),
        );
        let value = synthesize(&registry, "zoo.Ticket", SynthesisSettings::default());
        assert_eq!(
            value,
            json!({
                "title": "Ticket",
                "description": "An entry ticket",
                "type": ["object"],
                "properties": {
                    "code": {
                        "description": "Ticket code",
                        "type": ["string"],
                        "default": "A-1",
                        "deprecated": true,
                        "readOnly": true
                    }
                },
                "additionalProperties": { "type": ["integer"] }
            })
        );
    }

    #[test]
    fn strict_mode_forbids_unknown_properties() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Keeper").property(PropertyDef::new("name", TypeRef::string())),
        );
        let value = synthesize(
            &registry,
            "zoo.Keeper",
            SynthesisSettings::default().with_strict_mode(true),
        );
        assert_eq!(value["additionalProperties"], json!(false));
        assert_eq!(value["required"], json!(["name"]));
    }

    #[test]
    fn unsupported_hints_warn() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Keeper")
                .with_hint(SerializationHint::RootName)
                .property(
                    PropertyDef::new("name", TypeRef::string()).with_hint(SerializationHint::Alias),
                ),
        );
        let mut ctx = SynthesisContext::new(&registry, SynthesisSettings::default());
        synth::synthesize(&mut ctx, "zoo.Keeper").unwrap();
        let elements: Vec<&str> = ctx.warnings().map(|w| w.element.as_str()).collect();
        assert_eq!(elements, vec!["zoo.Keeper", "zoo.Keeper.name"]);
    }

    #[test]
    fn strict_mode_keeps_catch_all_maps_open() {
        let registry = TypeRegistry::new()
            .with(
                TypeDef::bean("zoo.Tag")
                    .property(PropertyDef::new("label", TypeRef::string()))
                    .property(PropertyDef::new("extra", TypeRef::map(TypeRef::Any)).catch_all()),
            )
            .with(
                TypeDef::bean("zoo.Badge")
                    .with_any_setter(TypeUse::from(TypeRef::Any))
                    .property(PropertyDef::new("label", TypeRef::string())),
            );
        let strict = SynthesisSettings::default().with_strict_mode(true);
        for name in ["zoo.Tag", "zoo.Badge"] {
            let value = synthesize(&registry, name, strict.clone());
            assert_eq!(keys(&value), vec!["label"]);
            assert_eq!(value["required"], json!(["label"]));
            assert!(value.get("additionalProperties").is_none(), "{name}: {value}");
        }
    }

    #[test]
    fn rename_onto_a_declared_name_is_malformed() {
        let registry = TypeRegistry::new().with(
            TypeDef::bean("zoo.Keeper")
                .property(PropertyDef::new("nickname", TypeRef::string()).renamed("name"))
                .property(PropertyDef::new("name", TypeRef::string()).ignored()),
        );
        let mut ctx = SynthesisContext::new(&registry, SynthesisSettings::default());
        let err = synth::synthesize(&mut ctx, "zoo.Keeper").unwrap_err();
        assert_eq!(
            err.to_string(),
            "zoo.Keeper.nickname: renamed to name, which another property already uses"
        );
    }
}
