//! JSON Pointer (RFC 6901) helpers.
//!
//! Validation messages locate instance values with pointers such as
//! `/children/0/name`, and document-local references use the fragment form
//! `#/$defs/Node`. A segment escapes `~` as `~0` and `/` as `~1`.

/// Appends one escaped segment.
pub fn push_segment(path: &mut String, segment: &str) {
    path.reserve(segment.len() + 1);
    path.push('/');
    for c in segment.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            other => path.push(other),
        }
    }
}

/// `path` extended by `segment`.
#[must_use]
pub fn format(path: &str, segment: &str) -> String {
    let mut result: String = path.to_string();
    push_segment(&mut result, segment);
    result
}

/// The unescaped segments of a pointer. A leading `#` is ignored, and the
/// empty pointer (the whole document) has no segments.
#[must_use]
pub fn parse(pointer: &str) -> Vec<String> {
    let pointer: &str = pointer.strip_prefix('#').unwrap_or(pointer);
    match pointer.strip_prefix('/') {
        Some(rest) => rest.split('/').map(unescape).collect(),
        None if pointer.is_empty() => Vec::new(),
        None => vec![unescape(pointer)],
    }
}

/// Decodes `~1` before `~0`, so `~01` is `~1` and not `/`.
#[must_use]
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
