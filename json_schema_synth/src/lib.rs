//! Derive JSON Schema (draft 2020-12) documents from structural type
//! descriptions and validate JSON data against them.
//!
//! Synthesis turns a [`TypeRegistry`] into one [`SchemaDocument`] per schema
//! root (a type carrying a [`SchemaAnnotation`]). The validator runtime loads
//! those documents back from a resource folder, compiles each once and
//! reports failures as [`ValidationMessage`]s.

pub mod aggregator;
mod context;
mod error;
pub mod json_pointer;
mod names;
pub mod output;
mod schema;
mod settings;
pub mod synth;
mod types;
pub mod validator;

pub use context::{Diagnostic, DiagnosticLevel, SchemaDocument, SynthesisContext};
pub use error::JsonSchemaError;
pub use names::{SCHEMA_FILE_SUFFIX, camel_case_to_kebab_case};
pub use schema::{AdditionalProperties, Schema, SchemaObject, SchemaType};
pub use settings::{
    DEFAULT_BASE_URI, FallbackNaming, SchemaDraft, SynthesisSettings, ValidatorSettings,
};
pub use types::{
    Access, Constraint, Describe, Inclusion, Nullability, PropertyDef, ScalarType,
    SchemaAnnotation, SerializationHint, SubtypeRef, Subtypes, TypeDef, TypeIdStrategy, TypeKind,
    TypeProvider, TypeRef, TypeRegistry, TypeUse,
};
pub use validator::{
    CompiledSchema, DirectoryLoader, JsonSchemaEngine, JsonSchemaTarget, JsonSchemaValidator,
    MemoryLoader, ResourceLoader, SchemaTarget, ValidationEngine, ValidationMessage,
    ValidationMessageKind,
};

use std::io::Write;
use std::path::{Path, PathBuf};

/// The outcome of one synthesis session.
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    /// One document per schema root, in the order they were finished.
    pub documents: Vec<SchemaDocument>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Synthesis {
    /// Warnings only; informational diagnostics are skipped.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Warning)
    }

    #[must_use]
    pub fn document(&self, type_name: &str) -> Option<&SchemaDocument> {
        self.documents
            .iter()
            .find(|document| document.type_name == type_name)
    }
}

/// Synthesizes the documents of every schema root in `provider`.
///
/// # Errors
///
/// Returns the first synthesis error: [`JsonSchemaError::UnknownType`] for a
/// reference the registry cannot resolve, [`JsonSchemaError::MalformedMetadata`]
/// for metadata that cannot apply to its element.
pub fn generate_schemas(
    registry: &TypeRegistry,
    settings: SynthesisSettings,
) -> Result<Synthesis, JsonSchemaError> {
    let mut ctx: SynthesisContext<'_> = SynthesisContext::new(registry, settings);
    for type_def in registry.annotated() {
        synth::synthesize(&mut ctx, &type_def.name)?;
    }
    let (documents, diagnostics) = ctx.into_parts();
    tracing::debug!(
        documents = documents.len(),
        diagnostics = diagnostics.len(),
        "schema synthesis finished"
    );
    Ok(Synthesis {
        documents,
        diagnostics,
    })
}

/// Synthesizes every schema root and writes the documents under `out_dir`.
/// Returns the written paths.
///
/// # Errors
///
/// Returns synthesis errors as for [`generate_schemas`], and
/// [`JsonSchemaError::IoError`] if a document cannot be written.
pub fn generate_to_dir(
    registry: &TypeRegistry,
    settings: SynthesisSettings,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, JsonSchemaError> {
    let synthesis: Synthesis = generate_schemas(registry, settings.clone())?;
    for warning in synthesis.warnings() {
        tracing::warn!(element = %warning.element, "{}", warning.message);
    }
    output::write_documents(&synthesis.documents, out_dir.as_ref(), &settings)
}

/// Synthesizes the schema of one type and writes it, pretty-printed, to `writer`.
///
/// The type need not be a schema root.
///
/// # Errors
///
/// Returns synthesis errors as for [`generate_schemas`], and
/// [`JsonSchemaError::IoError`] if writing fails.
pub fn generate_to_writer<W: Write>(
    registry: &TypeRegistry,
    type_name: &str,
    settings: SynthesisSettings,
    writer: &mut W,
) -> Result<(), JsonSchemaError> {
    let mut ctx: SynthesisContext<'_> = SynthesisContext::new(registry, settings);
    let schema: Schema = synth::synthesize(&mut ctx, type_name)?;
    serde_json::to_writer_pretty(&mut *writer, &schema)?;
    writer.write_all(b"\n")?;
    Ok(())
}
