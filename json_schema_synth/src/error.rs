use std::error;
use std::fmt;

/// Error type for schema synthesis, output, and validator compilation.
///
/// Validation failures are not errors: they are returned as
/// [`crate::ValidationMessage`]s.
#[derive(Debug)]
pub enum JsonSchemaError {
    /// Generic error with a message.
    GenericError(String),

    /// I/O error (e.g., reading a schema resource, writing a schema document).
    IoError(std::io::Error),

    /// JSON parsing or serialization error.
    JsonError(serde_json::Error),

    /// A named type could not be resolved by the type provider.
    UnknownType(String),

    /// Declared metadata cannot apply to the element it is declared on.
    MalformedMetadata { element: String, message: String },

    /// No schema resource exists for the requested type.
    SchemaNotFound { type_name: String, path: String },

    /// A referenced schema resource resolves outside the configured resource folder.
    ResourceOutsideFolder { reference: String, folder: String },

    /// The schema document could not be compiled by the validation engine.
    InvalidSchema(String),
}

impl error::Error for JsonSchemaError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::IoError(io_error) => Some(io_error),
            Self::JsonError(json_error) => Some(json_error),
            _ => None,
        }
    }
}

impl fmt::Display for JsonSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenericError(message) => write!(f, "{message}"),
            Self::IoError(io_error) => fmt::Display::fmt(io_error, f),
            Self::JsonError(json_error) => fmt::Display::fmt(json_error, f),
            Self::UnknownType(name) => write!(f, "unknown type: {name}"),
            Self::MalformedMetadata { element, message } => write!(f, "{element}: {message}"),
            Self::SchemaNotFound { type_name, path } => {
                write!(f, "no schema found for type {type_name} at path: {path}")
            }
            Self::ResourceOutsideFolder { reference, folder } => write!(
                f,
                "schema for reference {reference} is not inside the required folder {folder}"
            ),
            Self::InvalidSchema(message) => write!(f, "invalid schema: {message}"),
        }
    }
}

impl From<&str> for JsonSchemaError {
    fn from(message: &str) -> Self {
        Self::GenericError(message.to_string())
    }
}

impl From<String> for JsonSchemaError {
    fn from(message: String) -> Self {
        Self::GenericError(message)
    }
}

impl From<std::io::Error> for JsonSchemaError {
    fn from(io_error: std::io::Error) -> Self {
        Self::IoError(io_error)
    }
}

impl From<serde_json::Error> for JsonSchemaError {
    fn from(json_error: serde_json::Error) -> Self {
        Self::JsonError(json_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_malformed_metadata() {
        let err = JsonSchemaError::MalformedMetadata {
            element: "zoo.Llama.extra".to_string(),
            message: "catch-all property must be of map type".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "zoo.Llama.extra: catch-all property must be of map type"
        );
    }

    #[test]
    fn display_schema_not_found() {
        let err = JsonSchemaError::SchemaNotFound {
            type_name: "zoo.Llama".to_string(),
            path: "schemas/llama.schema.json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no schema found for type zoo.Llama at path: schemas/llama.schema.json"
        );
    }

    #[test]
    fn io_error_has_source() {
        let err = JsonSchemaError::from(std::io::Error::other("boom"));
        assert!(error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "boom");
    }
}
