//! Draft 2020-12 validation backed by the `jsonschema` crate.
//!
//! Resources arrive with their references already pointing at absolute
//! resource URIs (see [`resource_uri`]). A [`Retrieve`] implementation over
//! the loaded set keeps every `$ref` lookup local.

use super::message::{ValidationMessage, ValidationMessageKind, instance_type};
use super::{SchemaSlot, resource_uri, subschema_slot};
use crate::error::JsonSchemaError;
use crate::json_pointer;
use indexmap::IndexMap;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{Draft, Retrieve, Uri, ValidationError, ValidationOptions, Validator};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// A schema ready to validate instances.
pub trait CompiledSchema: Send + Sync {
    /// All failures of `instance`; empty when it is valid.
    fn validate(&self, instance: &Value) -> Vec<ValidationMessage>;
}

/// Turns a set of schema resources into a [`CompiledSchema`].
pub trait ValidationEngine: Send + Sync {
    /// `resources` maps resource paths to documents whose references already
    /// point at resource URIs; `root` is the path of the entry document.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::InvalidSchema`] if a document is not a valid
    /// schema or a reference cannot be resolved.
    fn compile(
        &self,
        root: &str,
        resources: IndexMap<String, Value>,
    ) -> Result<Arc<dyn CompiledSchema>, JsonSchemaError>;
}

/// Compiles resources with the `jsonschema` crate.
#[derive(Debug, Clone)]
pub struct JsonSchemaEngine {
    format_assertions: bool,
}

impl JsonSchemaEngine {
    #[must_use]
    pub fn new(format_assertions: bool) -> Self {
        Self { format_assertions }
    }

    fn options(&self, resources: &Arc<HashMap<String, Value>>) -> ValidationOptions {
        let mut options = jsonschema::options();
        options
            .with_draft(Draft::Draft202012)
            .should_validate_formats(self.format_assertions)
            .with_retriever(LoadedResources {
                by_uri: Arc::clone(resources),
            });
        options
    }
}

impl Default for JsonSchemaEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Serves `$ref` targets from the resources loaded for one compilation.
struct LoadedResources {
    by_uri: Arc<HashMap<String, Value>>,
}

impl Retrieve for LoadedResources {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self.by_uri
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| format!("schema resource {} was not loaded", uri.as_str()).into())
    }
}

impl ValidationEngine for JsonSchemaEngine {
    fn compile(
        &self,
        root: &str,
        resources: IndexMap<String, Value>,
    ) -> Result<Arc<dyn CompiledSchema>, JsonSchemaError> {
        let mut by_uri: HashMap<String, Value> = HashMap::with_capacity(resources.len());
        for (path, mut document) in resources {
            let uri: String = resource_uri(&path);
            // The resource location is the base every local reference resolves against.
            if let Value::Object(object) = &mut document {
                object.insert("$id".to_string(), Value::String(uri.clone()));
            }
            by_uri.insert(uri, document);
        }
        let root_uri: String = resource_uri(root);
        let resources: Arc<HashMap<String, Value>> = Arc::new(by_uri);
        let Some(root_document) = resources.get(&root_uri) else {
            return Err(JsonSchemaError::InvalidSchema(format!(
                "root resource {root} was not provided"
            )));
        };

        let options: ValidationOptions = self.options(&resources);
        let validator: Validator = build(&options, root_document, root)?;
        let mut alternatives: HashMap<String, Vec<Alternative>> = HashMap::new();
        for (uri, document) in resources.iter() {
            collect_alternatives(&options, uri, document, "", &mut alternatives)?;
        }
        tracing::debug!(
            root,
            resources = resources.len(),
            alternatives = alternatives.len(),
            "compiled schema"
        );
        Ok(Arc::new(CompiledDocument {
            root_uri,
            validator,
            resources,
            alternatives,
        }))
    }
}

fn build(options: &ValidationOptions, schema: &Value, name: &str) -> Result<Validator, JsonSchemaError> {
    options
        .build(schema)
        .map_err(|error| JsonSchemaError::InvalidSchema(format!("{name}: {error}")))
}

/// One `oneOf` alternative compiled on its own, so that an instance matching
/// no alternative can report why each of them failed.
struct Alternative {
    uri: String,
    pointer: String,
    validator: Validator,
}

/// Compiles every `oneOf` alternative reachable from `schema` through
/// subschema keywords, keyed by `<uri>#<pointer>` of the schema holding it.
fn collect_alternatives(
    options: &ValidationOptions,
    uri: &str,
    schema: &Value,
    pointer: &str,
    out: &mut HashMap<String, Vec<Alternative>>,
) -> Result<(), JsonSchemaError> {
    let Value::Object(object) = schema else {
        return Ok(());
    };
    for (key, child) in object {
        let location: String = json_pointer::format(pointer, key);
        match (subschema_slot(key), child) {
            (Some(SchemaSlot::Single), _) => collect_alternatives(options, uri, child, &location, out)?,
            (Some(SchemaSlot::Map), Value::Object(schemas)) => {
                for (name, subschema) in schemas {
                    collect_alternatives(options, uri, subschema, &json_pointer::format(&location, name), out)?;
                }
            }
            (Some(SchemaSlot::List), Value::Array(schemas)) => {
                for (index, subschema) in schemas.iter().enumerate() {
                    collect_alternatives(options, uri, subschema, &json_pointer::format(&location, &index.to_string()), out)?;
                }
            }
            _ => {}
        }
    }
    if let Some(Value::Array(schemas)) = object.get("oneOf") {
        let mut compiled: Vec<Alternative> = Vec::with_capacity(schemas.len());
        for index in 0..schemas.len() {
            let alternative: String =
                json_pointer::format(&json_pointer::format(pointer, "oneOf"), &index.to_string());
            let wrapper: Value = json!({ "$ref": format!("{uri}#{}", fragment(&alternative)) });
            compiled.push(Alternative {
                uri: uri.to_string(),
                validator: build(options, &wrapper, &format!("{uri}#{alternative}"))?,
                pointer: alternative,
            });
        }
        out.insert(format!("{uri}#{pointer}"), compiled);
    }
    Ok(())
}

/// Percent-encodes a JSON Pointer for use as a URI fragment.
fn fragment(pointer: &str) -> String {
    let mut encoded: String = String::with_capacity(pointer.len());
    for byte in pointer.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~!$&'()*+,;=:@/".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Where the keyword locations of a validator's errors start.
struct Origin<'o> {
    uri: &'o str,
    pointer: &'o str,
    /// Alternatives are compiled behind one `$ref` hop.
    wrapped: bool,
}

struct CompiledDocument {
    root_uri: String,
    validator: Validator,
    resources: Arc<HashMap<String, Value>>,
    alternatives: HashMap<String, Vec<Alternative>>,
}

impl CompiledDocument {
    fn collect(
        &self,
        validator: &Validator,
        origin: &Origin<'_>,
        instance: &Value,
        prefix: &str,
        out: &mut Vec<ValidationMessage>,
    ) {
        for error in validator.iter_errors(instance) {
            let location: String = format!("{prefix}{}", error.instance_path);
            let several_valid: bool = match &error.kind {
                ValidationErrorKind::OneOfNotValid { .. } => false,
                ValidationErrorKind::OneOfMultipleValid { .. } => true,
                _ => {
                    out.extend(messages(&error, &location));
                    continue;
                }
            };
            let alternatives: &[Alternative] = self
                .locate(origin, &error.schema_path.to_string())
                .and_then(|key| self.alternatives.get(&key))
                .map(Vec::as_slice)
                .unwrap_or_default();
            if several_valid {
                let valid: usize = alternatives
                    .iter()
                    .filter(|alternative| alternative.validator.is_valid(&error.instance))
                    .count();
                out.push(ValidationMessage::new(
                    &location,
                    ValidationMessageKind::OneOf { valid: valid.max(2) },
                ));
                continue;
            }
            out.push(ValidationMessage::new(&location, ValidationMessageKind::OneOf { valid: 0 }));
            for alternative in alternatives {
                let origin: Origin<'_> = Origin {
                    uri: &alternative.uri,
                    pointer: &alternative.pointer,
                    wrapped: true,
                };
                self.collect(&alternative.validator, &origin, &error.instance, &location, out);
            }
        }
    }

    /// The `<uri>#<pointer>` of the schema holding the keyword at
    /// `keyword_location`, following `$ref` hops through the loaded resources.
    fn locate(&self, origin: &Origin<'_>, keyword_location: &str) -> Option<String> {
        let mut segments: Vec<String> = json_pointer::parse(keyword_location);
        segments.pop()?;
        let mut segments = segments.into_iter();
        if origin.wrapped {
            segments.next()?;
        }
        let mut uri: String = origin.uri.to_string();
        let mut pointer: String = origin.pointer.to_string();
        let mut node: &Value = self.resources.get(&uri)?.pointer(&pointer)?;
        for segment in segments {
            if segment == "$ref" {
                let reference: &str = node.get("$ref")?.as_str()?;
                let (target, fragment) = reference.split_once('#').unwrap_or((reference, ""));
                if !target.is_empty() {
                    uri = target.to_string();
                }
                pointer = fragment.to_string();
                node = self.resources.get(&uri)?.pointer(&pointer)?;
                continue;
            }
            node = match node {
                Value::Object(object) => object.get(&segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
            pointer = json_pointer::format(&pointer, &segment);
        }
        Some(format!("{uri}#{pointer}"))
    }
}

impl CompiledSchema for CompiledDocument {
    fn validate(&self, instance: &Value) -> Vec<ValidationMessage> {
        let origin: Origin<'_> = Origin {
            uri: &self.root_uri,
            pointer: "",
            wrapped: false,
        };
        let mut messages: Vec<ValidationMessage> = Vec::new();
        self.collect(&self.validator, &origin, instance, "", &mut messages);
        messages
    }
}

fn length(instance: &Value) -> usize {
    match instance {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

fn property_name(property: &Value) -> String {
    property
        .as_str()
        .map_or_else(|| property.to_string(), ToString::to_string)
}

fn messages(error: &ValidationError<'_>, location: &str) -> Vec<ValidationMessage> {
    let instance: &Value = &error.instance;
    let kind: ValidationMessageKind = match &error.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            return unexpected
                .iter()
                .map(|property| {
                    ValidationMessage::new(
                        location,
                        ValidationMessageKind::AdditionalProperty {
                            property: property.clone(),
                        },
                    )
                })
                .collect();
        }
        ValidationErrorKind::AnyOf { .. } => ValidationMessageKind::AnyOf,
        ValidationErrorKind::Constant { expected_value } => ValidationMessageKind::Const {
            expected: expected_value.clone(),
        },
        ValidationErrorKind::Enum { options } => ValidationMessageKind::Enum {
            values: options
                .as_array()
                .cloned()
                .unwrap_or_else(|| vec![options.clone()]),
        },
        ValidationErrorKind::Minimum { limit } => ValidationMessageKind::Minimum { limit: limit.clone() },
        ValidationErrorKind::Maximum { limit } => ValidationMessageKind::Maximum { limit: limit.clone() },
        ValidationErrorKind::ExclusiveMinimum { limit } => {
            ValidationMessageKind::ExclusiveMinimum { limit: limit.clone() }
        }
        ValidationErrorKind::ExclusiveMaximum { limit } => {
            ValidationMessageKind::ExclusiveMaximum { limit: limit.clone() }
        }
        ValidationErrorKind::MultipleOf { multiple_of } => ValidationMessageKind::MultipleOf {
            divisor: *multiple_of,
        },
        ValidationErrorKind::MinLength { limit } => ValidationMessageKind::MinLength { limit: *limit },
        ValidationErrorKind::MaxLength { limit } => ValidationMessageKind::MaxLength { limit: *limit },
        ValidationErrorKind::Pattern { pattern } => ValidationMessageKind::Pattern {
            pattern: pattern.clone(),
        },
        ValidationErrorKind::Format { format } => ValidationMessageKind::Format {
            format: format.clone(),
        },
        ValidationErrorKind::MinItems { limit } => ValidationMessageKind::MinItems {
            limit: *limit,
            found: length(instance),
        },
        ValidationErrorKind::MaxItems { limit } => ValidationMessageKind::MaxItems {
            limit: *limit,
            found: length(instance),
        },
        ValidationErrorKind::UniqueItems => ValidationMessageKind::UniqueItems,
        ValidationErrorKind::Required { property } => ValidationMessageKind::Required {
            property: property_name(property),
        },
        ValidationErrorKind::MinProperties { limit } => {
            ValidationMessageKind::MinProperties { limit: *limit }
        }
        ValidationErrorKind::MaxProperties { limit } => {
            ValidationMessageKind::MaxProperties { limit: *limit }
        }
        ValidationErrorKind::Not { schema } => ValidationMessageKind::Not {
            schema: schema.clone(),
        },
        ValidationErrorKind::FalseSchema => ValidationMessageKind::FalseSchema,
        ValidationErrorKind::Type { kind } => ValidationMessageKind::Type {
            found: instance_type(instance).to_string(),
            expected: match kind {
                TypeKind::Single(single) => vec![single.to_string()],
                TypeKind::Multiple(types) => (*types).into_iter().map(|single| single.to_string()).collect(),
            },
        },
        _ => ValidationMessageKind::Other {
            message: error.to_string(),
        },
    };
    vec![ValidationMessage::new(location, kind)]
}
