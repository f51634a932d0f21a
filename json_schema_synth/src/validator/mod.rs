//! Validator runtime: locates a type's schema resource, compiles it once and
//! validates instances against it.
//!
//! Schema documents are addressed by `$id`s under a base URI but stored as
//! resources under a local folder. Before compilation every base-URI-prefixed
//! `$ref`/`$id` is rewritten to the resource's URI (see [`resource_uri`]), and
//! every referenced resource is loaded. Compiled schemas are cached per type and shared between
//! threads.

mod engine;
mod message;

pub use engine::{CompiledSchema, JsonSchemaEngine, ValidationEngine};
pub use message::{ValidationMessage, ValidationMessageKind};

use crate::context::SchemaDocument;
use crate::error::JsonSchemaError;
use crate::names::{self, SCHEMA_FILE_SUFFIX};
use crate::settings::{SynthesisSettings, ValidatorSettings};
use crate::synth;
use crate::types::TypeDef;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Reads schema resources by path (always `/`-separated and relative).
pub trait ResourceLoader: Send + Sync {
    /// The resource contents, or `None` if there is no such resource.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::IoError`] if the resource exists but cannot be read.
    fn load(&self, path: &str) -> Result<Option<String>, JsonSchemaError>;
}

/// Loads resources from files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, path: &str) -> Result<Option<String>, JsonSchemaError> {
        match std::fs::read_to_string(self.root.join(path)) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

/// Resources held in memory, e.g. documents just synthesized.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    resources: HashMap<String, String>,
}

impl MemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) -> &mut Self {
        self.resources.insert(path.into(), contents.into());
        self
    }

    #[must_use]
    pub fn with(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Serializes documents at the paths they would be written to:
    /// `<output_location>/<file_name>.schema.json`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::JsonError`] if a document cannot be serialized.
    pub fn from_documents(
        documents: &[SchemaDocument],
        settings: &SynthesisSettings,
    ) -> Result<Self, JsonSchemaError> {
        let mut loader: Self = Self::new();
        for document in documents {
            let path: String = if settings.output_location.is_empty() {
                format!("{}{SCHEMA_FILE_SUFFIX}", document.file_name)
            } else {
                format!(
                    "{}/{}{SCHEMA_FILE_SUFFIX}",
                    settings.output_location, document.file_name
                )
            };
            loader.insert(path, serde_json::to_string(&document.schema)?);
        }
        Ok(loader)
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<Option<String>, JsonSchemaError> {
        Ok(self.resources.get(path).cloned())
    }
}

/// Identifies the schema of a type at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTarget {
    /// Qualified name; the cache key.
    pub type_name: String,
    pub simple_name: String,
    /// Explicit schema URI; without one the resource name follows the
    /// fallback naming convention.
    pub uri: Option<String>,
}

impl SchemaTarget {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name: String = type_name.into();
        let simple_name: String = type_name
            .rsplit('.')
            .next()
            .unwrap_or(&type_name)
            .replace('$', ".");
        Self {
            type_name,
            simple_name,
            uri: None,
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// The target of a described type: its declared URI, or the path derived
    /// from its schema title.
    #[must_use]
    pub fn from_type_def(type_def: &TypeDef) -> Self {
        Self {
            type_name: type_def.name.clone(),
            simple_name: type_def.simple_name(),
            uri: synth::declared_uri(type_def),
        }
    }
}

/// Types that know which schema validates them.
pub trait JsonSchemaTarget {
    fn schema_target() -> SchemaTarget;
}

pub struct JsonSchemaValidator {
    settings: ValidatorSettings,
    loader: Box<dyn ResourceLoader>,
    engine: Arc<dyn ValidationEngine>,
    cache: DashMap<String, Arc<dyn CompiledSchema>>,
}

impl JsonSchemaValidator {
    #[must_use]
    pub fn new(settings: ValidatorSettings, loader: impl ResourceLoader + 'static) -> Self {
        let engine: JsonSchemaEngine = JsonSchemaEngine::new(settings.format_assertions);
        Self {
            settings,
            loader: Box::new(loader),
            engine: Arc::new(engine),
            cache: DashMap::new(),
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn ValidationEngine>) -> Self {
        self.engine = engine;
        self.cache.clear();
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Number of compiled schemas held.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// The resource path of a target's schema document.
    #[must_use]
    pub fn schema_path(&self, target: &SchemaTarget) -> String {
        let name: String = match &target.uri {
            Some(uri) => uri
                .strip_prefix(self.settings.normalized_base_uri())
                .unwrap_or(uri)
                .trim_start_matches('/')
                .to_string(),
            None => names::fallback_resource_name(&target.simple_name, self.settings.fallback_naming),
        };
        with_schema_suffix(&format!(
            "{}{name}",
            self.settings.normalized_resource_folder()
        ))
    }

    /// The compiled schema of a target, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::SchemaNotFound`] if the target's resource (or
    /// one it references) does not exist, [`JsonSchemaError::ResourceOutsideFolder`]
    /// if a reference leaves the resource folder, and
    /// [`JsonSchemaError::InvalidSchema`] if the engine rejects a document.
    pub fn compile(&self, target: &SchemaTarget) -> Result<Arc<dyn CompiledSchema>, JsonSchemaError> {
        if let Some(compiled) = self.cache.get(&target.type_name) {
            return Ok(Arc::clone(compiled.value()));
        }
        let compiled: Arc<dyn CompiledSchema> = self.compile_uncached(target)?;
        let entry = self
            .cache
            .entry(target.type_name.clone())
            .or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    fn compile_uncached(&self, target: &SchemaTarget) -> Result<Arc<dyn CompiledSchema>, JsonSchemaError> {
        let folder: String = self.settings.normalized_resource_folder();
        let requested: String = self.schema_path(target);
        let root: String = self.inside_folder(&requested, &requested, &folder)?;

        let mut resources: IndexMap<String, Value> = IndexMap::new();
        let mut pending: Vec<String> = vec![root.clone()];
        while let Some(path) = pending.pop() {
            if resources.contains_key(&path) {
                continue;
            }
            let Some(contents) = self.loader.load(&path)? else {
                return Err(JsonSchemaError::SchemaNotFound {
                    type_name: target.type_name.clone(),
                    path,
                });
            };
            let mut document: Value = serde_json::from_str(&contents)?;
            let mut referenced: Vec<String> = Vec::new();
            self.rewrite_references(&mut document, &path, &folder, &mut referenced)?;
            resources.insert(path, document);
            pending.extend(
                referenced
                    .into_iter()
                    .filter(|reference| !resources.contains_key(reference)),
            );
        }
        tracing::debug!(
            type_name = %target.type_name,
            path = %root,
            resources = resources.len(),
            "compiling JSON schema"
        );
        self.engine.compile(&root, resources)
    }

    /// Normalizes a resource path and checks that it stays in the resource folder.
    fn inside_folder(&self, reference: &str, path: &str, folder: &str) -> Result<String, JsonSchemaError> {
        match normalize(path) {
            Some(normalized) if normalized.starts_with(folder) => Ok(normalized),
            _ => Err(JsonSchemaError::ResourceOutsideFolder {
                reference: reference.to_string(),
                folder: self.settings.resource_folder.clone(),
            }),
        }
    }

    /// Rewrites `$ref`/`$id` values of `value` (a document stored at `resource`)
    /// to resource URIs and collects the resources referenced. Only subschema
    /// keywords are followed, so instance data under `const`, `enum`,
    /// `default` or `examples` is left alone.
    fn rewrite_references(
        &self,
        value: &mut Value,
        resource: &str,
        folder: &str,
        referenced: &mut Vec<String>,
    ) -> Result<(), JsonSchemaError> {
        match value {
            Value::Object(object) => {
                for (key, child) in object.iter_mut() {
                    match key.as_str() {
                        "$ref" => {
                            if let Value::String(reference) = child
                                && let Some((path, rewritten)) =
                                    self.reference_path(reference, resource, folder)?
                            {
                                referenced.push(path);
                                *reference = rewritten;
                            }
                        }
                        "$id" => {
                            if let Value::String(id) = child
                                && let Some(rest) = self.strip_base(id)
                            {
                                *id = resource_uri(&with_schema_suffix(&format!("{folder}{rest}")));
                            }
                        }
                        keyword => match (subschema_slot(keyword), child) {
                            (Some(SchemaSlot::Single | SchemaSlot::List), child) => {
                                self.rewrite_references(child, resource, folder, referenced)?;
                            }
                            (Some(SchemaSlot::Map), Value::Object(schemas)) => {
                                for schema in schemas.values_mut() {
                                    self.rewrite_references(schema, resource, folder, referenced)?;
                                }
                            }
                            _ => {}
                        },
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.rewrite_references(item, resource, folder, referenced)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn strip_base<'r>(&self, uri: &'r str) -> Option<&'r str> {
        uri.strip_prefix(self.settings.normalized_base_uri())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// The resource a reference points into and the rewritten reference.
    /// Document-local references (`#...`) and foreign absolute URIs give `None`.
    fn reference_path(
        &self,
        reference: &str,
        resource: &str,
        folder: &str,
    ) -> Result<Option<(String, String)>, JsonSchemaError> {
        if reference.starts_with('#') {
            return Ok(None);
        }
        let (target, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let path: String = if let Some(rest) = self.strip_base(target) {
            format!("{folder}{rest}")
        } else if target.contains("://") {
            return Ok(None);
        } else {
            let directory: &str = resource.rsplit_once('/').map_or("", |(directory, _)| directory);
            format!("{directory}/{target}")
        };
        let path: String = self.inside_folder(reference, &with_schema_suffix(&path), folder)?;
        let rewritten: String = if fragment.is_empty() {
            resource_uri(&path)
        } else {
            format!("{}#{fragment}", resource_uri(&path))
        };
        Ok(Some((path, rewritten)))
    }

    /// Validates an instance against a target's schema.
    ///
    /// # Errors
    ///
    /// Fails only when the schema cannot be compiled; validation failures are
    /// returned as messages.
    pub fn validate_value(
        &self,
        target: &SchemaTarget,
        instance: &Value,
    ) -> Result<Vec<ValidationMessage>, JsonSchemaError> {
        let compiled: Arc<dyn CompiledSchema> = self.compile(target)?;
        Ok(compiled.validate(instance))
    }

    /// Validates a JSON text against a target's schema.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::JsonError`] if `json` is not valid JSON, and
    /// compilation errors as for [`Self::compile`].
    pub fn validate_str(
        &self,
        target: &SchemaTarget,
        json: &str,
    ) -> Result<Vec<ValidationMessage>, JsonSchemaError> {
        let instance: Value = serde_json::from_str(json)?;
        self.validate_value(target, &instance)
    }

    /// Serializes `value` and validates it against the schema of its type.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::JsonError`] if `value` cannot be serialized,
    /// and compilation errors as for [`Self::compile`].
    pub fn validate<T: Serialize + JsonSchemaTarget>(
        &self,
        value: &T,
    ) -> Result<Vec<ValidationMessage>, JsonSchemaError> {
        let instance: Value = serde_json::to_value(value)?;
        self.validate_value(&T::schema_target(), &instance)
    }
}

/// Prefix of the absolute URIs resources are compiled under.
pub(crate) const RESOURCE_BASE: &str = "json-schema:///";

/// The absolute URI of the resource stored at `path`.
pub(crate) fn resource_uri(path: &str) -> String {
    format!("{RESOURCE_BASE}{}", path.trim_start_matches('/'))
}

/// How a keyword holds subschemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchemaSlot {
    Single,
    /// An object of named subschemas.
    Map,
    List,
}

/// The subschema shape of an applicator keyword; `None` for keywords whose
/// values are not schemas.
pub(crate) fn subschema_slot(keyword: &str) -> Option<SchemaSlot> {
    match keyword {
        "items" | "additionalProperties" | "additionalItems" | "not" | "if" | "then" | "else"
        | "contains" | "propertyNames" | "unevaluatedItems" | "unevaluatedProperties"
        | "contentSchema" => Some(SchemaSlot::Single),
        "properties" | "patternProperties" | "$defs" | "definitions" | "dependentSchemas" => {
            Some(SchemaSlot::Map)
        }
        "oneOf" | "anyOf" | "allOf" | "prefixItems" => Some(SchemaSlot::List),
        _ => None,
    }
}

fn with_schema_suffix(path: &str) -> String {
    if path.ends_with(".json") {
        path.to_string()
    } else {
        format!("{path}{SCHEMA_FILE_SUFFIX}")
    }
}

/// Resolves `.` and `..` segments; `None` if the path climbs above its root.
fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    Some(segments.join("/"))
}
