//! In-memory JSON Schema document model.
//!
//! A [`Schema`] is either one of the boolean constants (`true` = always valid,
//! `false` = never valid) or a [`SchemaObject`]. Optional keywords are omitted
//! from the serialized JSON instead of being written as `null`.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeSet;

/// A JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// An ordered list of instances.
    Array,
    /// A `true` or `false` value.
    Boolean,
    /// A JSON `null` value.
    Null,
    /// An integer.
    Integer,
    /// An arbitrary-precision, base-10 decimal number value.
    Number,
    /// An unordered set of properties mapping a string to an instance.
    Object,
    /// A string of Unicode code points.
    String,
}

impl SchemaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Object => "object",
            Self::String => "string",
        }
    }
}

/// The `additionalProperties` keyword.
///
/// Absent is permissive, `Typed` constrains the values of unknown keys, and
/// `Forbidden` serializes as `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    #[default]
    Unset,
    Typed(Box<Schema>),
    Forbidden,
}

impl AdditionalProperties {
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl Serialize for AdditionalProperties {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Unset => serializer.serialize_bool(true),
            Self::Typed(schema) => schema.serialize(serializer),
            Self::Forbidden => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for AdditionalProperties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let schema: Schema = Deserialize::deserialize(deserializer)?;
        Ok(match schema {
            Schema::Bool(false) => Self::Forbidden,
            other => Self::Typed(Box::new(other)),
        })
    }
}

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    /// `true` (always valid) or `false` (never valid).
    Bool(bool),
    Object(Box<SchemaObject>),
}

impl Default for Schema {
    fn default() -> Self {
        Self::Object(Box::default())
    }
}

impl From<SchemaObject> for Schema {
    fn from(object: SchemaObject) -> Self {
        Self::Object(Box::new(object))
    }
}

impl Schema {
    #[must_use]
    pub fn always_valid() -> Self {
        Self::Bool(true)
    }

    #[must_use]
    pub fn never_valid() -> Self {
        Self::Bool(false)
    }

    #[must_use]
    pub fn of_type(schema_type: SchemaType) -> Self {
        let mut object = SchemaObject::default();
        object.add_type(schema_type);
        object.into()
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of_type(SchemaType::String)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::of_type(SchemaType::Integer)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of_type(SchemaType::Number)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of_type(SchemaType::Boolean)
    }

    #[must_use]
    pub fn object() -> Self {
        Self::of_type(SchemaType::Object)
    }

    #[must_use]
    pub fn array(items: Self) -> Self {
        let mut object = SchemaObject::default();
        object.add_type(SchemaType::Array);
        object.items = Some(Box::new(items));
        object.into()
    }

    /// A pure reference node.
    #[must_use]
    pub fn reference(uri: impl Into<String>) -> Self {
        SchemaObject {
            reference: Some(uri.into()),
            ..SchemaObject::default()
        }
        .into()
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Self::Object(object) => Some(object),
            Self::Bool(_) => None,
        }
    }

    #[must_use]
    pub fn as_object_mut(&mut self) -> Option<&mut SchemaObject> {
        match self {
            Self::Object(object) => Some(object),
            Self::Bool(_) => None,
        }
    }

    /// The `$ref` target, when this node is a reference.
    #[must_use]
    pub fn reference_uri(&self) -> Option<&str> {
        self.as_object().and_then(|o| o.reference.as_deref())
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.reference_uri().is_some()
    }

    /// The inline content of this node; `None` for boolean constants and references.
    #[must_use]
    pub fn content_mut(&mut self) -> Option<&mut SchemaObject> {
        self.as_object_mut().filter(|o| o.reference.is_none())
    }

    #[must_use]
    pub fn has_type(&self, schema_type: SchemaType) -> bool {
        self.as_object()
            .is_some_and(|o| o.types.contains(&schema_type))
    }

    /// Builder-style property insertion. No-op on boolean constants and references.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, property: Self) -> Self {
        if let Some(object) = self.content_mut() {
            object.properties.insert(name.into(), property);
        }
        self
    }

    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        if let Some(object) = self.content_mut() {
            object.required.insert(name.into());
        }
        self
    }

    #[must_use]
    pub fn with_const(mut self, value: impl Into<Value>) -> Self {
        if let Some(object) = self.content_mut() {
            object.const_value = Some(value.into());
        }
        self
    }

    #[must_use]
    pub fn with_enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if let Some(object) = self.content_mut() {
            object.enum_values = Some(values.into_iter().map(Into::into).collect());
        }
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        if let Some(object) = self.content_mut() {
            object.description = Some(description.into());
        }
        self
    }
}

/// The object form of a schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "AdditionalProperties::is_unset")]
    pub additional_properties: AdditionalProperties,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(rename = "$defs", default, skip_serializing_if = "IndexMap::is_empty")]
    pub defs: IndexMap<String, Schema>,
}

impl SchemaObject {
    /// Adds a type to the type set, keeping the set free of duplicates.
    pub fn add_type(&mut self, schema_type: SchemaType) {
        if !self.types.contains(&schema_type) {
            self.types.push(schema_type);
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.types.contains(&SchemaType::Integer) || self.types.contains(&SchemaType::Number)
    }
}
