//! Writes finished schema documents.

use crate::context::SchemaDocument;
use crate::error::JsonSchemaError;
use crate::names::SCHEMA_FILE_SUFFIX;
use crate::settings::SynthesisSettings;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub use crate::names::file_name;

/// Serializes one document, pretty-printed, followed by a newline.
///
/// # Errors
///
/// Returns [`JsonSchemaError::JsonError`] or [`JsonSchemaError::IoError`] if
/// serializing or writing fails.
pub fn write_document<W: Write>(
    document: &SchemaDocument,
    writer: &mut W,
) -> Result<(), JsonSchemaError> {
    serde_json::to_writer_pretty(&mut *writer, &document.schema)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// `<out_dir>/<output_location>/<file_name>.schema.json`
#[must_use]
pub fn document_path(out_dir: &Path, settings: &SynthesisSettings, file_name: &str) -> PathBuf {
    let mut path: PathBuf = out_dir.to_path_buf();
    if !settings.output_location.is_empty() {
        path.push(&settings.output_location);
    }
    path.push(format!("{file_name}{SCHEMA_FILE_SUFFIX}"));
    path
}

/// Writes every document under `out_dir` and returns the written paths.
///
/// # Errors
///
/// Returns [`JsonSchemaError::IoError`] if a directory or file cannot be
/// created, or [`JsonSchemaError::JsonError`] if a document cannot be serialized.
pub fn write_documents(
    documents: &[SchemaDocument],
    out_dir: &Path,
    settings: &SynthesisSettings,
) -> Result<Vec<PathBuf>, JsonSchemaError> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(documents.len());
    for document in documents {
        let path: PathBuf = document_path(out_dir, settings, &document.file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer: BufWriter<File> = BufWriter::new(File::create(&path)?);
        write_document(document, &mut writer)?;
        writer.flush()?;
        tracing::info!(type_name = %document.type_name, path = %path.display(), "wrote schema document");
        written.push(path);
    }
    Ok(written)
}
