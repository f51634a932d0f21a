use super::{Element, SchemaAggregator};
use crate::context::SynthesisContext;
use crate::error::JsonSchemaError;
use crate::schema::{Schema, SchemaObject, SchemaType};
use crate::types::{Constraint, Nullability, PropertyDef, TypeDef};
use regress::Regex;
use serde_json::{Number, Value};

/// Translates declared constraints into validation keywords and computes the
/// `required` set of composite types.
pub struct ConstraintAggregator;

impl SchemaAggregator for ConstraintAggregator {
    fn add_info<'a>(
        &self,
        element: &Element<'a>,
        mut schema: Schema,
        ctx: &mut SynthesisContext<'a>,
    ) -> Result<Schema, JsonSchemaError> {
        match *element {
            Element::Type(type_def) => {
                let strict: bool = ctx.is_strict(type_def);
                if let Some(object) = schema.content_mut() {
                    add_required(type_def, strict, object);
                }
                Ok(schema)
            }
            Element::Property { property, .. } => {
                apply_all(element, &property.constraints, &mut schema, ctx)?;
                Ok(apply_nullability(property, schema))
            }
            Element::TypeArgument(type_use) => {
                apply_all(element, &type_use.constraints, &mut schema, ctx)?;
                Ok(schema)
            }
        }
    }
}

fn is_required(property: &PropertyDef, strict: bool) -> bool {
    property.ty.is_primitive()
        || property.nullability == Nullability::NonNull
        || property.constraints.contains(&Constraint::NotNull)
        || (strict && property.nullability != Nullability::Nullable)
}

fn add_required(type_def: &TypeDef, strict: bool, object: &mut SchemaObject) {
    for property in &type_def.properties {
        let key: &str = property.key();
        if object.properties.contains_key(key) && is_required(property, strict) {
            object.required.insert(key.to_string());
        }
    }
}

/// Nullable content admits `null`; a nullable reference becomes a `oneOf`
/// between `null` and the reference.
fn apply_nullability(property: &PropertyDef, mut schema: Schema) -> Schema {
    if property.nullability != Nullability::Nullable
        || property.constraints.contains(&Constraint::NotNull)
    {
        return schema;
    }
    if schema.is_reference() {
        let mut wrapper: SchemaObject = SchemaObject::default();
        wrapper.one_of = vec![Schema::of_type(SchemaType::Null), schema];
        return wrapper.into();
    }
    if let Some(object) = schema.content_mut()
        && !object.types.is_empty()
    {
        object.add_type(SchemaType::Null);
    }
    schema
}

fn apply_all(
    element: &Element<'_>,
    constraints: &[Constraint],
    schema: &mut Schema,
    ctx: &mut SynthesisContext<'_>,
) -> Result<(), JsonSchemaError> {
    for constraint in constraints {
        if !constraint.is_supported() {
            ctx.warn(
                &element.label(),
                format!("constraint {} is not supported", constraint.keyword()),
            );
            continue;
        }
        let Some(object) = schema.content_mut() else {
            continue;
        };
        apply(constraint, object).map_err(|message| JsonSchemaError::MalformedMetadata {
            element: element.label(),
            message,
        })?;
    }
    Ok(())
}

fn has_any(object: &SchemaObject, types: &[SchemaType]) -> bool {
    types.iter().any(|schema_type| object.types.contains(schema_type))
}

fn apply(constraint: &Constraint, object: &mut SchemaObject) -> Result<(), String> {
    let keyword: &str = constraint.keyword();
    match constraint {
        Constraint::NotNull
        | Constraint::Future
        | Constraint::FutureOrPresent
        | Constraint::Past
        | Constraint::PastOrPresent => {}
        Constraint::Null => object.types = vec![SchemaType::Null],
        Constraint::AssertTrue => object.const_value = Some(Value::Bool(true)),
        Constraint::AssertFalse => object.const_value = Some(Value::Bool(false)),
        Constraint::NotBlank => {
            if object.types.contains(&SchemaType::String) {
                object.min_length = Some(1);
            }
        }
        Constraint::NotEmpty => set_size(object, Some(1), None, keyword)?,
        Constraint::Size { min, max } => set_size(object, *min, *max, keyword)?,
        Constraint::Positive => {
            numeric_allowed(object, keyword)?;
            object.exclusive_minimum = Some(Number::from(0));
        }
        Constraint::PositiveOrZero => {
            numeric_allowed(object, keyword)?;
            object.minimum = Some(Number::from(0));
        }
        Constraint::Negative => {
            numeric_allowed(object, keyword)?;
            object.exclusive_maximum = Some(Number::from(0));
        }
        Constraint::NegativeOrZero => {
            numeric_allowed(object, keyword)?;
            object.maximum = Some(Number::from(0));
        }
        Constraint::Min(value) => {
            numeric_allowed(object, keyword)?;
            object.minimum = Some(Number::from(*value));
        }
        Constraint::Max(value) => {
            numeric_allowed(object, keyword)?;
            object.maximum = Some(Number::from(*value));
        }
        Constraint::DecimalMin { value, inclusive } => {
            numeric_allowed(object, keyword)?;
            let bound: Number = parse_decimal(value, keyword)?;
            if *inclusive {
                object.minimum = Some(bound);
            } else {
                object.exclusive_minimum = Some(bound);
            }
        }
        Constraint::DecimalMax { value, inclusive } => {
            numeric_allowed(object, keyword)?;
            let bound: Number = parse_decimal(value, keyword)?;
            if *inclusive {
                object.maximum = Some(bound);
            } else {
                object.exclusive_maximum = Some(bound);
            }
        }
        Constraint::Digits { integer, fraction } => {
            numeric_allowed(object, keyword)?;
            let limit: Number = power_of_ten(*integer, keyword)?;
            object.exclusive_maximum = Some(limit.clone());
            object.exclusive_minimum = Some(negate(&limit));
            if *fraction > 0 {
                object.multiple_of = Some(parse_decimal(&format!("1e-{fraction}"), keyword)?);
            }
        }
        Constraint::Pattern { regexp } => {
            pattern_allowed(object, keyword, regexp)?;
            object.pattern = Some(regexp.clone());
        }
        Constraint::Email { regexp } => {
            pattern_allowed(object, keyword, regexp.as_deref().unwrap_or(".*"))?;
            object.format = Some("idn-email".to_string());
            if let Some(regexp) = regexp
                && regexp != ".*"
            {
                object.pattern = Some(regexp.clone());
            }
        }
    }
    Ok(())
}

fn numeric_allowed(object: &SchemaObject, keyword: &str) -> Result<(), String> {
    if has_any(
        object,
        &[SchemaType::Boolean, SchemaType::Array, SchemaType::Object],
    ) {
        return Err(format!("constraint {keyword} requires a numeric type"));
    }
    Ok(())
}

/// Patterns must target strings and compile as ECMA 262 regular expressions.
fn pattern_allowed(object: &SchemaObject, keyword: &str, regexp: &str) -> Result<(), String> {
    if has_any(
        object,
        &[SchemaType::Boolean, SchemaType::Array, SchemaType::Object],
    ) {
        return Err(format!("constraint {keyword} requires a string type"));
    }
    Regex::new(regexp)
        .map(|_| ())
        .map_err(|error| format!("constraint {keyword} has an invalid pattern {regexp}: {error}"))
}

/// Size bounds land on items, properties or length depending on the type.
fn set_size(
    object: &mut SchemaObject,
    min: Option<u64>,
    max: Option<u64>,
    keyword: &str,
) -> Result<(), String> {
    if object.types.contains(&SchemaType::Array) {
        object.min_items = min.or(object.min_items);
        object.max_items = max.or(object.max_items);
    } else if object.types.contains(&SchemaType::Object) {
        object.min_properties = min.or(object.min_properties);
        object.max_properties = max.or(object.max_properties);
    } else if has_any(object, &[SchemaType::Boolean]) || object.is_numeric() {
        return Err(format!(
            "constraint {keyword} requires a string, collection or map type"
        ));
    } else {
        object.min_length = min.or(object.min_length);
        object.max_length = max.or(object.max_length);
    }
    Ok(())
}

fn parse_decimal(value: &str, keyword: &str) -> Result<Number, String> {
    let value: &str = value.trim();
    if let Ok(integer) = value.parse::<i64>() {
        return Ok(Number::from(integer));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| format!("constraint {keyword} has an invalid value {value}"))
}

fn power_of_ten(exponent: u32, keyword: &str) -> Result<Number, String> {
    match 10_i64.checked_pow(exponent) {
        Some(value) => Ok(Number::from(value)),
        None => parse_decimal(&format!("1e{exponent}"), keyword),
    }
}

fn negate(number: &Number) -> Number {
    if let Some(value) = number.as_i64() {
        return Number::from(-value);
    }
    number
        .as_f64()
        .and_then(|value| Number::from_f64(-value))
        .unwrap_or_else(|| number.clone())
}
