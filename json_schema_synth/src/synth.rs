//! The type resolver: turns structural type descriptions into schema trees.
//!
//! Each named type is built once per session. Addressable types (schema roots
//! with a resolvable id) become documents of their own and are referenced by
//! `$ref` everywhere else. Other composite types are inlined; a cycle through
//! them is broken with a document-local reference.

use crate::aggregator::{self, Element};
use crate::context::{CacheEntry, SchemaDocument, SynthesisContext};
use crate::error::JsonSchemaError;
use crate::names;
use crate::schema::{AdditionalProperties, Schema, SchemaObject, SchemaType};
use crate::types::{PropertyDef, TypeDef, TypeRef, TypeUse};
use serde_json::Value;

/// Synthesizes the top-level schema of a named type and records its document
/// when the type is a schema root.
///
/// # Errors
///
/// Returns [`JsonSchemaError::UnknownType`] for names the provider cannot
/// resolve and [`JsonSchemaError::MalformedMetadata`] for metadata that cannot
/// apply to its element.
pub fn synthesize<'a>(
    ctx: &mut SynthesisContext<'a>,
    type_name: &str,
) -> Result<Schema, JsonSchemaError> {
    ctx.begin_root();
    let type_def: &'a TypeDef = ctx.type_def(type_name)?;
    ctx.touch(type_name);
    match canonical_id(type_def, ctx) {
        Some(id) => document_schema(type_def, &id, ctx),
        None => standalone_schema(type_def, ctx),
    }
}

/// The title a schema root is published under.
#[must_use]
pub fn schema_title(type_def: &TypeDef) -> String {
    type_def
        .schema
        .as_ref()
        .and_then(|annotation| annotation.title.clone())
        .unwrap_or_else(|| type_def.simple_name())
}

/// The id path of a schema root before resolution: the declared URI, else
/// `/` followed by the kebab-cased title.
pub(crate) fn declared_uri(type_def: &TypeDef) -> Option<String> {
    let annotation = type_def.schema.as_ref()?;
    Some(annotation.uri.clone().unwrap_or_else(|| {
        format!("/{}", names::camel_case_to_kebab_case(&schema_title(type_def)))
    }))
}

/// The canonical id of an addressable type; warns when a schema root has none.
fn canonical_id(type_def: &TypeDef, ctx: &mut SynthesisContext<'_>) -> Option<String> {
    let uri: String = declared_uri(type_def)?;
    let resolved: Option<String> = names::resolve_uri(&uri, ctx.settings().base_uri());
    if resolved.is_none() {
        ctx.warn(
            &type_def.name,
            format!(
                "the JSON schema for type {} does not have a resolvable URI",
                type_def.name
            ),
        );
    }
    resolved
}

fn document_schema<'a>(
    type_def: &'a TypeDef,
    id: &str,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    match ctx.cached(&type_def.name) {
        Some(CacheEntry::Document {
            schema: Some(schema),
            ..
        }) => return Ok(schema.clone()),
        Some(CacheEntry::Document { schema: None, .. }) => return Ok(Schema::reference(id)),
        _ => {}
    }
    ctx.cache(
        &type_def.name,
        CacheEntry::Document {
            id: id.to_string(),
            schema: None,
        },
    );

    let annotation = type_def.schema.clone().unwrap_or_default();
    let header: SchemaObject = SchemaObject {
        schema: Some(ctx.settings().draft.url().to_string()),
        id: Some(id.to_string()),
        title: Some(schema_title(type_def)),
        description: annotation.description,
        ..SchemaObject::default()
    };

    ctx.push_frame(&type_def.name);
    let built: Result<Schema, JsonSchemaError> = type_schema(type_def, header, ctx);
    let frame = ctx.pop_frame();
    let mut schema: Schema = match built {
        Ok(schema) => schema,
        Err(error) => {
            ctx.uncache(&type_def.name);
            return Err(error);
        }
    };
    if let Some(frame) = frame
        && let Some(object) = schema.content_mut()
    {
        object.defs.extend(frame.defs);
    }

    ctx.cache(
        &type_def.name,
        CacheEntry::Document {
            id: id.to_string(),
            schema: Some(schema.clone()),
        },
    );
    let file_name: String = names::file_name(id, ctx.settings());
    ctx.info(&type_def.name, format!("generated JSON schema {id}"));
    ctx.record_document(SchemaDocument {
        type_name: type_def.name.clone(),
        id: Some(id.to_string()),
        file_name,
        schema: schema.clone(),
    });
    Ok(schema)
}

/// A top-level schema for a type without a canonical id. Schema roots among
/// them are still recorded as documents, just without `$id`.
fn standalone_schema<'a>(
    type_def: &'a TypeDef,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    ctx.push_frame(&type_def.name);
    let built: Result<Schema, JsonSchemaError> = inline_schema(type_def, ctx);
    let frame = ctx.pop_frame();
    let mut schema: Schema = built?;
    if let Some(object) = schema.content_mut() {
        if let Some(frame) = frame {
            object.defs.extend(frame.defs);
        }
        if let Some(uri) = declared_uri(type_def) {
            object.schema = Some(ctx.settings().draft.url().to_string());
            let file_name: String = names::file_name(&uri, ctx.settings());
            ctx.record_document(SchemaDocument {
                type_name: type_def.name.clone(),
                id: None,
                file_name,
                schema: schema.clone(),
            });
        }
    }
    Ok(schema)
}

/// The schema of a property: its type's schema enriched by the aggregators.
///
/// # Errors
///
/// Propagates synthesis errors of the property type.
pub fn property_schema<'a>(
    owner: &'a TypeDef,
    property: &'a PropertyDef,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    let schema: Schema = shape_schema(&property.ty, ctx)?;
    aggregator::aggregate(&Element::Property { owner, property }, schema, ctx)
}

/// The schema of a type argument (collection element, map value, catch-all value).
///
/// # Errors
///
/// Propagates synthesis errors of the argument type.
pub fn type_argument_schema<'a>(
    type_use: &'a TypeUse,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    let schema: Schema = shape_schema(&type_use.ty, ctx)?;
    aggregator::aggregate(&Element::TypeArgument(type_use), schema, ctx)
}

/// Bare structural schema of a type reference, in shape priority order.
fn shape_schema<'a>(ty: &'a TypeRef, ctx: &mut SynthesisContext<'a>) -> Result<Schema, JsonSchemaError> {
    match ty {
        TypeRef::Bytes => {
            if ctx.settings().binary_as_array {
                Ok(Schema::array(Schema::integer()))
            } else {
                Ok(Schema::string())
            }
        }
        TypeRef::Map(value) => {
            let mut object: SchemaObject = SchemaObject::default();
            object.add_type(SchemaType::Object);
            if value.ty != TypeRef::Any {
                let value_schema: Schema = type_argument_schema(value, ctx)?;
                object.additional_properties = AdditionalProperties::Typed(Box::new(value_schema));
            }
            Ok(object.into())
        }
        TypeRef::List(element) => Ok(Schema::array(type_argument_schema(element, ctx)?)),
        TypeRef::Set(element) => {
            let mut schema: Schema = Schema::array(type_argument_schema(element, ctx)?);
            if let Some(object) = schema.as_object_mut() {
                object.unique_items = Some(true);
            }
            Ok(schema)
        }
        TypeRef::Primitive(scalar) | TypeRef::Scalar(scalar) => {
            let mut object: SchemaObject = SchemaObject::default();
            object.add_type(scalar.schema_type());
            object.format = scalar.format().map(str::to_string);
            Ok(object.into())
        }
        TypeRef::Any => Ok(Schema::always_valid()),
        TypeRef::Named(name) => named_schema(name, ctx),
    }
}

/// A named type in use position: a reference for addressable types, the
/// inline schema otherwise.
pub(crate) fn named_schema<'a>(type_name: &str, ctx: &mut SynthesisContext<'a>) -> Result<Schema, JsonSchemaError> {
    let type_def: &'a TypeDef = ctx.type_def(type_name)?;
    ctx.touch(type_name);
    if let Some(id) = canonical_id(type_def, ctx) {
        if !matches!(ctx.cached(type_name), Some(CacheEntry::Document { .. })) {
            document_schema(type_def, &id, ctx)?;
        }
        return Ok(Schema::reference(id));
    }
    inline_schema(type_def, ctx)
}

/// The schema of a type that has no canonical id, built in the current document.
pub(crate) fn inline_schema<'a>(
    type_def: &'a TypeDef,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    let type_name: &str = &type_def.name;
    let title: String = type_def.simple_name();
    if let Some(reference) = ctx.open_reference(type_name, &title) {
        return Ok(Schema::reference(reference));
    }
    if let Some(reference) = ctx.defined_reference(type_name) {
        return Ok(Schema::reference(reference));
    }
    let frame: Option<usize> = ctx.current_frame_id();
    if let Some(CacheEntry::Inline {
        schema,
        frame: bound,
    }) = ctx.cached(type_name)
        && (bound.is_none() || *bound == frame)
    {
        return Ok(schema.clone());
    }

    let local_references: usize = ctx.local_references();
    let mut header: SchemaObject = SchemaObject::default();
    if let Some(annotation) = &type_def.schema {
        header.title = Some(schema_title(type_def));
        header.description.clone_from(&annotation.description);
    }
    ctx.open(type_name)?;
    let built: Result<Schema, JsonSchemaError> = type_schema(type_def, header, ctx);
    let recursive: bool = ctx.close(type_name);
    let schema: Schema = built?;

    if recursive && let Some(reference) = ctx.define(type_name, &title, schema.clone()) {
        return Ok(Schema::reference(reference));
    }
    let bound: Option<usize> = if ctx.local_references() == local_references {
        None
    } else {
        frame
    };
    ctx.cache(
        type_name,
        CacheEntry::Inline {
            schema: schema.clone(),
            frame: bound,
        },
    );
    Ok(schema)
}

/// Structural schema of a named type followed by the type-level aggregators.
fn type_schema<'a>(
    type_def: &'a TypeDef,
    mut header: SchemaObject,
    ctx: &mut SynthesisContext<'a>,
) -> Result<Schema, JsonSchemaError> {
    if let Some(values) = type_def.enum_values() {
        header.add_type(SchemaType::String);
        header.enum_values = Some(values.iter().map(|value| Value::String(value.clone())).collect());
    } else {
        header.add_type(SchemaType::Object);
        if header.title.is_none() {
            header.title = Some(type_def.simple_name());
        }
        for property in &type_def.properties {
            let schema: Schema = property_schema(type_def, property, ctx)?;
            header.properties.insert(property.name.clone(), schema);
        }
    }
    aggregator::aggregate(&Element::Type(type_def), header.into(), ctx)
}
