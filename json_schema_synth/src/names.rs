//! Naming rules shared by synthesis and the validator: canonical-id path
//! segments, schema file names, and discriminator qualifiers.

use crate::settings::{FallbackNaming, SynthesisSettings};
use heck::{ToKebabCase, ToSnakeCase};

/// Suffix of every schema document file.
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Converts a camel-case title to the path segment used in derived ids.
///
/// Runs of uppercase letters collapse into one word, so `RWBlackbird` becomes
/// `rwblackbird` and `RedWingedBlackbird` becomes `red-winged-blackbird`.
/// A `.` is dropped.
#[must_use]
pub fn camel_case_to_kebab_case(value: &str) -> String {
    let mut result: String = String::with_capacity(value.len() + 4);
    let mut previous_new_word: bool = true;
    for c in value.chars() {
        if c == '.' {
            continue;
        }
        if c.is_uppercase() {
            if !previous_new_word {
                result.push('-');
            }
            previous_new_word = true;
        } else {
            previous_new_word = false;
        }
        result.extend(c.to_lowercase());
    }
    result
}

/// Resolves a schema URI against the base URI.
///
/// Absolute URIs (containing `://`) are returned verbatim. Relative URIs are
/// joined to the base with exactly one `/`. Returns `None` when the URI is
/// relative and there is no base to resolve it against.
#[must_use]
pub fn resolve_uri(uri: &str, base_uri: Option<&str>) -> Option<String> {
    if uri.contains("://") {
        return Some(uri.to_string());
    }
    let base: &str = base_uri?.trim_end_matches('/');
    let relative: &str = uri.trim_start_matches('/');
    Some(format!("{base}/{relative}"))
}

/// The path component of an absolute URI, without query or fragment.
fn uri_path(uri: &str) -> &str {
    let Some((_, rest)) = uri.split_once("://") else {
        return uri;
    };
    let path: &str = rest.find('/').map_or("", |index| &rest[index..]);
    let end: usize = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Derives the document file name (without suffix) from a canonical id.
///
/// The base URI prefix is stripped when present. Otherwise the URI path is
/// used, minus the output-location prefix. A leading `/` is always removed.
#[must_use]
pub fn file_name(id: &str, settings: &SynthesisSettings) -> String {
    let mut name: &str = id;
    if let Some(base) = settings.base_uri()
        && let Some(stripped) = id.strip_prefix(base)
    {
        name = stripped;
    } else if id.contains("://") {
        name = uri_path(id).trim_start_matches('/');
        if let Some(stripped) = name.strip_prefix(settings.output_location.as_str()) {
            name = stripped;
        }
    }
    name.trim_start_matches('/').to_string()
}

/// The qualified name with the parent's namespace prefix removed.
///
/// The separator after the namespace is kept, so `zoo.birds.Eagle` under
/// namespace `zoo.birds` becomes `.Eagle`.
#[must_use]
pub fn minimal_class_name(parent_namespace: &str, qualified_name: &str) -> String {
    qualified_name
        .strip_prefix(parent_namespace)
        .unwrap_or(qualified_name)
        .to_string()
}

/// The resource name the validator looks for when a type has no explicit URI.
#[must_use]
pub fn fallback_resource_name(simple_name: &str, naming: FallbackNaming) -> String {
    match naming {
        FallbackNaming::Kebab => camel_case_to_kebab_case(simple_name),
        FallbackNaming::Hyphenated => simple_name.to_kebab_case(),
        FallbackNaming::Snake => simple_name.to_snake_case(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_simple() {
        assert_eq!(camel_case_to_kebab_case("Llama"), "llama");
        assert_eq!(
            camel_case_to_kebab_case("RedWingedBlackbird"),
            "red-winged-blackbird"
        );
    }

    #[test]
    fn kebab_collapses_uppercase_runs() {
        assert_eq!(camel_case_to_kebab_case("RWBlackbird"), "rwblackbird");
        assert_eq!(camel_case_to_kebab_case("HTTPServer"), "httpserver");
    }

    #[test]
    fn kebab_drops_dots() {
        assert_eq!(camel_case_to_kebab_case("Outer.Inner"), "outer-inner");
        assert_eq!(camel_case_to_kebab_case("a.b"), "ab");
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let base = Some("http://localhost:8080/schemas");
        assert_eq!(
            resolve_uri("/llama", base).as_deref(),
            Some("http://localhost:8080/schemas/llama")
        );
        assert_eq!(
            resolve_uri("llama", Some("http://h/s/")).as_deref(),
            Some("http://h/s/llama")
        );
        assert_eq!(
            resolve_uri("https://other/x", None).as_deref(),
            Some("https://other/x")
        );
        assert_eq!(resolve_uri("/llama", None), None);
    }

    #[test]
    fn file_name_strips_base_uri() {
        let settings = SynthesisSettings::default();
        assert_eq!(
            file_name("http://localhost:8080/schemas/red-winged-blackbird", &settings),
            "red-winged-blackbird"
        );
    }

    #[test]
    fn file_name_from_foreign_uri_uses_path() {
        let settings = SynthesisSettings::default();
        assert_eq!(
            file_name("https://example.com/schemas/possum?v=1", &settings),
            "possum"
        );
        assert_eq!(file_name("https://example.com/zoo/possum", &settings), "zoo/possum");
    }

    #[test]
    fn file_name_without_base() {
        let settings = SynthesisSettings::default().without_base_uri();
        assert_eq!(file_name("/llama", &settings), "llama");
    }

    #[test]
    fn minimal_class_name_keeps_separator() {
        assert_eq!(minimal_class_name("zoo.birds", "zoo.birds.Eagle"), ".Eagle");
        assert_eq!(minimal_class_name("zoo.birds", "other.Eagle"), "other.Eagle");
    }

    #[test]
    fn fallback_naming_conventions() {
        assert_eq!(
            fallback_resource_name("RWBlackbird", FallbackNaming::Kebab),
            "rwblackbird"
        );
        assert_eq!(
            fallback_resource_name("RWBlackbird", FallbackNaming::Hyphenated),
            "rw-blackbird"
        );
        assert_eq!(
            fallback_resource_name("RWBlackbird", FallbackNaming::Snake),
            "rw_blackbird"
        );
    }
}
