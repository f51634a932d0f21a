//! Settings for schema synthesis and for the validator runtime.

use serde::Deserialize;

/// Base URI under which generated schemas are published unless configured otherwise.
pub const DEFAULT_BASE_URI: &str = "http://localhost:8080/schemas";

/// Schema draft versions. Only 2020-12 is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SchemaDraft {
    #[default]
    #[serde(rename = "2020-12")]
    Draft2020_12,
}

impl SchemaDraft {
    /// The `$schema` URL of the draft.
    #[must_use]
    pub fn url(self) -> &'static str {
        match self {
            Self::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }
}

/// Settings that control schema synthesis. One value configures one session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthesisSettings {
    /// Directory (relative to the output root) that schema documents are written to.
    pub output_location: String,

    /// Base URI that relative schema ids are resolved against. `None` leaves
    /// types without an explicit absolute URI unreferenceable.
    pub base_uri: Option<String>,

    /// Encode byte sequences as an array of integers instead of a base64 string.
    pub binary_as_array: bool,

    /// The draft written to `$schema`.
    pub draft: SchemaDraft,

    /// Make properties required unless marked nullable and forbid unknown properties.
    pub strict_mode: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            output_location: "schemas".to_string(),
            base_uri: Some(DEFAULT_BASE_URI.to_string()),
            binary_as_array: false,
            draft: SchemaDraft::Draft2020_12,
            strict_mode: false,
        }
    }
}

impl SynthesisSettings {
    /// Set the base URI. A trailing `/` is removed.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = Some(base_uri.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn without_base_uri(mut self) -> Self {
        self.base_uri = None;
        self
    }

    #[must_use]
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    #[must_use]
    pub fn with_binary_as_array(mut self, binary_as_array: bool) -> Self {
        self.binary_as_array = binary_as_array;
        self
    }

    #[must_use]
    pub fn with_output_location(mut self, output_location: &str) -> Self {
        self.output_location = output_location.trim_matches('/').to_string();
        self
    }

    /// The base URI without a trailing slash, if configured.
    #[must_use]
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri
            .as_deref()
            .map(|uri| uri.trim_end_matches('/'))
            .filter(|uri| !uri.is_empty())
    }
}

/// Naming convention used to locate a schema resource for a type that has no explicit URI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackNaming {
    /// Same convention the synthesizer uses for ids: `RWBlackbird` -> `rwblackbird`.
    #[default]
    Kebab,
    /// Word-splitting kebab case: `RWBlackbird` -> `rw-blackbird`.
    Hyphenated,
    /// `RWBlackbird` -> `rw_blackbird`.
    Snake,
}

/// Settings for the validator runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorSettings {
    /// Base URI under which schema `$id`s are expected to live.
    pub base_uri: String,

    /// Resource path prefix where schema documents are actually stored.
    pub resource_folder: String,

    /// How to name the resource of a type without an explicit URI.
    pub fallback_naming: FallbackNaming,

    /// Check the `format` keyword instead of treating it as an annotation.
    pub format_assertions: bool,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            base_uri: format!("{DEFAULT_BASE_URI}/"),
            resource_folder: "schemas/".to_string(),
            fallback_naming: FallbackNaming::Kebab,
            format_assertions: true,
        }
    }
}

impl ValidatorSettings {
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = base_uri.to_string();
        self
    }

    #[must_use]
    pub fn with_resource_folder(mut self, resource_folder: &str) -> Self {
        self.resource_folder = resource_folder.to_string();
        self
    }

    #[must_use]
    pub fn with_fallback_naming(mut self, fallback_naming: FallbackNaming) -> Self {
        self.fallback_naming = fallback_naming;
        self
    }

    /// The base URI without a trailing slash.
    #[must_use]
    pub fn normalized_base_uri(&self) -> &str {
        self.base_uri.trim_end_matches('/')
    }

    /// The resource folder with exactly one trailing slash, or empty for the loader root.
    #[must_use]
    pub fn normalized_resource_folder(&self) -> String {
        let trimmed: &str = self.resource_folder.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        }
    }
}
