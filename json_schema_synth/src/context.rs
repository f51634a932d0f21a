//! Session state for one synthesis run.
//!
//! A [`SynthesisContext`] owns the dedup cache, the stack of documents under
//! construction, the diagnostics, and the finished documents. It is not shared
//! between sessions; run independent sessions with independent contexts.

use crate::error::JsonSchemaError;
use crate::json_pointer;
use crate::schema::Schema;
use crate::settings::SynthesisSettings;
use crate::types::{TypeDef, TypeProvider};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A non-fatal condition met during synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// Qualified name of the type or property the condition was found on.
    pub element: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.level, self.element, self.message)
    }
}

/// A finished top-level schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    /// Qualified name of the type the document describes.
    pub type_name: String,
    /// Canonical id; `None` when the type has no resolvable URI.
    pub id: Option<String>,
    /// File name without directory or suffix.
    pub file_name: String,
    pub schema: Schema,
}

/// Dedup cache entry.
#[derive(Debug, Clone)]
pub(crate) enum CacheEntry {
    /// An addressable type. `schema` is `None` while the document is under construction.
    Document { id: String, schema: Option<Schema> },
    /// A type without a canonical id. `frame` is set when the schema refers into
    /// that document's `$defs` and may only be reused there.
    Inline { schema: Schema, frame: Option<usize> },
}

/// A schema document under construction.
#[derive(Debug)]
pub(crate) struct DocumentFrame {
    id: usize,
    /// The type the document is built for.
    root: String,
    /// Non-addressable types currently being built, innermost last.
    open: Vec<String>,
    recursive: BTreeSet<String>,
    def_keys: HashMap<String, String>,
    pub(crate) defs: IndexMap<String, Schema>,
    /// Number of document-local references handed out.
    local_references: usize,
}

impl DocumentFrame {
    fn new(id: usize, root: &str) -> Self {
        Self {
            id,
            root: root.to_string(),
            open: Vec::new(),
            recursive: BTreeSet::new(),
            def_keys: HashMap::new(),
            defs: IndexMap::new(),
            local_references: 0,
        }
    }

    fn def_key(&mut self, type_name: &str, title: &str) -> String {
        if let Some(key) = self.def_keys.get(type_name) {
            return key.clone();
        }
        let mut key: String = title.to_string();
        let mut suffix: usize = 2;
        while self.def_keys.values().any(|taken| *taken == key) {
            key = format!("{title}{suffix}");
            suffix += 1;
        }
        self.def_keys.insert(type_name.to_string(), key.clone());
        key
    }

    fn def_reference(key: &str) -> String {
        format!("#{}", json_pointer::format(&json_pointer::format("", "$defs"), key))
    }
}

pub struct SynthesisContext<'a> {
    settings: SynthesisSettings,
    provider: &'a dyn TypeProvider,
    created: HashMap<String, CacheEntry>,
    frames: Vec<DocumentFrame>,
    next_frame: usize,
    originating: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
    documents: Vec<SchemaDocument>,
}

impl<'a> SynthesisContext<'a> {
    #[must_use]
    pub fn new(provider: &'a dyn TypeProvider, settings: SynthesisSettings) -> Self {
        Self {
            settings,
            provider,
            created: HashMap::new(),
            frames: Vec::new(),
            next_frame: 0,
            originating: BTreeSet::new(),
            diagnostics: Vec::new(),
            documents: Vec::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Looks up a type description.
    ///
    /// # Errors
    ///
    /// Returns [`JsonSchemaError::UnknownType`] if the provider does not know the name.
    pub fn type_def(&self, name: &str) -> Result<&'a TypeDef, JsonSchemaError> {
        let provider: &'a dyn TypeProvider = self.provider;
        provider
            .type_def(name)
            .ok_or_else(|| JsonSchemaError::UnknownType(name.to_string()))
    }

    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&'a TypeDef> {
        let provider: &'a dyn TypeProvider = self.provider;
        provider.type_def(name)
    }

    /// Strict mode for a type: the per-type override, else the session setting.
    #[must_use]
    pub fn is_strict(&self, type_def: &TypeDef) -> bool {
        type_def.strict.unwrap_or(self.settings.strict_mode)
    }

    /// Records a warning. Identical warnings are recorded once.
    pub fn warn(&mut self, element: &str, message: impl Into<String>) {
        let message: String = message.into();
        let exists: bool = self.diagnostics.iter().any(|diagnostic| {
            diagnostic.level == DiagnosticLevel::Warning
                && diagnostic.element == element
                && diagnostic.message == message
        });
        if exists {
            return;
        }
        tracing::warn!(element, "{message}");
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warning,
            element: element.to_string(),
            message,
        });
    }

    pub fn info(&mut self, element: &str, message: impl Into<String>) {
        let message: String = message.into();
        tracing::info!(element, "{message}");
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            element: element.to_string(),
            message,
        });
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Warning)
    }

    #[must_use]
    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<SchemaDocument>, Vec<Diagnostic>) {
        (self.documents, self.diagnostics)
    }

    /// Types touched while synthesizing the current root.
    #[must_use]
    pub fn originating_elements(&self) -> &BTreeSet<String> {
        &self.originating
    }

    pub(crate) fn begin_root(&mut self) {
        self.originating.clear();
    }

    pub(crate) fn touch(&mut self, type_name: &str) {
        if !self.originating.contains(type_name) {
            self.originating.insert(type_name.to_string());
        }
    }

    /// The finished schema of a type, if this session has built one.
    #[must_use]
    pub fn cached_schema(&self, type_name: &str) -> Option<&Schema> {
        match self.created.get(type_name)? {
            CacheEntry::Document { schema, .. } => schema.as_ref(),
            CacheEntry::Inline { schema, .. } => Some(schema),
        }
    }

    pub(crate) fn cached(&self, type_name: &str) -> Option<&CacheEntry> {
        self.created.get(type_name)
    }

    pub(crate) fn cache(&mut self, type_name: &str, entry: CacheEntry) {
        self.created.insert(type_name.to_string(), entry);
    }

    pub(crate) fn uncache(&mut self, type_name: &str) {
        self.created.remove(type_name);
    }

    pub(crate) fn record_document(&mut self, document: SchemaDocument) {
        if let Some(existing) = self
            .documents
            .iter_mut()
            .find(|existing| existing.type_name == document.type_name)
        {
            *existing = document;
        } else {
            self.documents.push(document);
        }
    }

    pub(crate) fn push_frame(&mut self, root: &str) {
        let frame: DocumentFrame = DocumentFrame::new(self.next_frame, root);
        self.next_frame += 1;
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) -> Option<DocumentFrame> {
        self.frames.pop()
    }

    pub(crate) fn current_frame_id(&self) -> Option<usize> {
        self.frames.last().map(|frame| frame.id)
    }

    pub(crate) fn local_references(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.local_references)
    }

    /// A reference to a type that is open in the current document, if it is.
    ///
    /// The document root is referenced as `#`; any other open type is marked
    /// recursive and referenced through `$defs`.
    pub(crate) fn open_reference(&mut self, type_name: &str, title: &str) -> Option<String> {
        let frame: &mut DocumentFrame = self.frames.last_mut()?;
        if !frame.open.iter().any(|open| open == type_name) {
            return None;
        }
        frame.local_references += 1;
        if frame.root == type_name {
            return Some("#".to_string());
        }
        frame.recursive.insert(type_name.to_string());
        let key: String = frame.def_key(type_name, title);
        Some(DocumentFrame::def_reference(&key))
    }

    /// A reference to a type already placed in the current document's `$defs`.
    pub(crate) fn defined_reference(&mut self, type_name: &str) -> Option<String> {
        let frame: &mut DocumentFrame = self.frames.last_mut()?;
        let key: &String = frame.def_keys.get(type_name)?;
        if !frame.defs.contains_key(key) {
            return None;
        }
        let reference: String = DocumentFrame::def_reference(key);
        frame.local_references += 1;
        Some(reference)
    }

    pub(crate) fn open(&mut self, type_name: &str) -> Result<(), JsonSchemaError> {
        let frame: &mut DocumentFrame = self
            .frames
            .last_mut()
            .ok_or_else(|| JsonSchemaError::from("no schema document under construction"))?;
        frame.open.push(type_name.to_string());
        Ok(())
    }

    /// Closes an open type. Returns whether a cyclic edge into it was found.
    pub(crate) fn close(&mut self, type_name: &str) -> bool {
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };
        if let Some(position) = frame.open.iter().rposition(|open| open == type_name) {
            frame.open.remove(position);
        }
        frame.recursive.remove(type_name)
    }

    /// Places a recursive type's schema in the current document's `$defs`.
    pub(crate) fn define(&mut self, type_name: &str, title: &str, schema: Schema) -> Option<String> {
        let frame: &mut DocumentFrame = self.frames.last_mut()?;
        let key: String = frame.def_key(type_name, title);
        frame.defs.insert(key.clone(), schema);
        frame.local_references += 1;
        Some(DocumentFrame::def_reference(&key))
    }

    /// Follows a reference to a schema this session has built: a canonical id,
    /// `#` for the current document root, or a `#/$defs/...` entry of the
    /// current document.
    #[must_use]
    pub fn resolve_reference(&self, reference: &str) -> Option<&Schema> {
        if let Some(fragment) = reference.strip_prefix('#') {
            let frame: &DocumentFrame = self.frames.last()?;
            if fragment.is_empty() {
                return self.cached_schema(&frame.root);
            }
            let segments: Vec<String> = json_pointer::parse(fragment);
            return match segments.as_slice() {
                [defs, key] if defs == "$defs" => frame.defs.get(key),
                _ => None,
            };
        }
        self.created.values().find_map(|entry| match entry {
            CacheEntry::Document {
                id,
                schema: Some(schema),
            } if id == reference => Some(schema),
            _ => None,
        })
    }
}
