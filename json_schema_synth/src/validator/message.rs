use serde_json::Value;
use std::fmt;

/// One validation failure: where it happened and what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationMessage {
    /// JSON Pointer to the failing instance value; empty for the root.
    pub location: String,
    pub kind: ValidationMessageKind,
}

impl ValidationMessage {
    #[must_use]
    pub fn new(location: &str, kind: ValidationMessageKind) -> Self {
        Self {
            location: location.to_string(),
            kind,
        }
    }

    /// The human-readable text without the location.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationMessageKind {
    Type { found: String, expected: Vec<String> },
    Const { expected: Value },
    Enum { values: Vec<Value> },
    Minimum { limit: Value },
    Maximum { limit: Value },
    ExclusiveMinimum { limit: Value },
    ExclusiveMaximum { limit: Value },
    MultipleOf { divisor: f64 },
    MinLength { limit: u64 },
    MaxLength { limit: u64 },
    Pattern { pattern: String },
    Format { format: String },
    MinItems { limit: u64, found: usize },
    MaxItems { limit: u64, found: usize },
    UniqueItems,
    Required { property: String },
    MinProperties { limit: u64 },
    MaxProperties { limit: u64 },
    AdditionalProperty { property: String },
    /// `valid` is the number of alternatives that matched: 0 or more than 1.
    OneOf { valid: usize },
    AnyOf,
    Not { schema: Value },
    /// The instance met a `false` schema.
    FalseSchema,
    /// Failures without a dedicated wording keep the engine's text.
    Other { message: String },
}

/// The JSON type name of an instance; integral numbers are `integer`.
pub(crate) fn instance_type(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number)
            if number.is_i64()
                || number.is_u64()
                || number.as_f64().is_some_and(|value| value.fract() == 0.0) =>
        {
            "integer"
        }
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn constant(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for ValidationMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { found, expected } => match expected.as_slice() {
                [single] => write!(f, "{found} found, {single} expected"),
                many => write!(f, "{found} found, [{}] expected", many.join(", ")),
            },
            Self::Const { expected } => {
                write!(f, "must be the constant value '{}'", constant(expected))
            }
            Self::Enum { values } => {
                let values: Vec<String> = values.iter().map(constant).collect();
                write!(
                    f,
                    "does not have a value in the enumeration [{}]",
                    values.join(", ")
                )
            }
            Self::Minimum { limit } => write!(f, "must have a minimum value of {limit}"),
            Self::Maximum { limit } => write!(f, "must have a maximum value of {limit}"),
            Self::ExclusiveMinimum { limit } => {
                write!(f, "must have an exclusive minimum value of {limit}")
            }
            Self::ExclusiveMaximum { limit } => {
                write!(f, "must have an exclusive maximum value of {limit}")
            }
            Self::MultipleOf { divisor } => write!(f, "must be multiple of {divisor}"),
            Self::MinLength { limit } => write!(f, "must be at least {limit} characters long"),
            Self::MaxLength { limit } => write!(f, "must be at most {limit} characters long"),
            Self::Pattern { pattern } => write!(f, "does not match the regex pattern {pattern}"),
            Self::Format { format } => write!(f, "does not match the {format} pattern"),
            Self::MinItems { limit, found } => {
                write!(f, "must have at least {limit} items but found {found}")
            }
            Self::MaxItems { limit, found } => {
                write!(f, "must have at most {limit} items but found {found}")
            }
            Self::UniqueItems => write!(f, "must have only unique items in the array"),
            Self::Required { property } => write!(f, "required property '{property}' not found"),
            Self::MinProperties { limit } => write!(f, "must have at least {limit} properties"),
            Self::MaxProperties { limit } => write!(f, "must have at most {limit} properties"),
            Self::AdditionalProperty { property } => write!(
                f,
                "property '{property}' is not defined in the schema and the schema does not allow additional properties"
            ),
            Self::OneOf { valid } => write!(
                f,
                "must be valid to one and only one schema, but {valid} are valid"
            ),
            Self::AnyOf => write!(f, "must be valid to at least one schema"),
            Self::Not { schema } => write!(f, "must not be valid to the schema {schema}"),
            Self::FalseSchema => write!(f, "is not allowed here"),
            Self::Other { message } => write!(f, "{message}"),
        }
    }
}
