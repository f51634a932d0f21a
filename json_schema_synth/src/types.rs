//! Structural type descriptions consumed by the synthesis engine.
//!
//! The engine never discovers types itself. A build tool (or hand-written
//! code, or the [`Describe`] adapter for Rust std types) supplies [`TypeDef`]s
//! through a [`TypeProvider`]. Every type here is serde-(de)serializable so a
//! description can also be handed over as JSON.

use crate::schema::SchemaType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Scalar value types with a fixed JSON Schema `type`/`format` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    BigInteger,
    Float32,
    Float64,
    Decimal,
    String,
    Char,
    Timestamp,
    Date,
    Time,
    Duration,
    Uuid,
    Uri,
}

impl ScalarType {
    #[must_use]
    pub fn schema_type(self) -> SchemaType {
        match self {
            Self::Boolean => SchemaType::Boolean,
            Self::Int8
            | Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::UInt8
            | Self::UInt16
            | Self::UInt32
            | Self::UInt64
            | Self::BigInteger => SchemaType::Integer,
            Self::Float32 | Self::Float64 | Self::Decimal => SchemaType::Number,
            Self::String
            | Self::Char
            | Self::Timestamp
            | Self::Date
            | Self::Time
            | Self::Duration
            | Self::Uuid
            | Self::Uri => SchemaType::String,
        }
    }

    #[must_use]
    pub fn format(self) -> Option<&'static str> {
        match self {
            Self::Timestamp => Some("date-time"),
            Self::Date => Some("date"),
            Self::Time => Some("time"),
            Self::Duration => Some("duration"),
            Self::Uuid => Some("uuid"),
            Self::Uri => Some("uri"),
            _ => None,
        }
    }
}

/// The structural shape of a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TypeRef {
    /// A non-nullable value type. Properties of this shape are always required.
    Primitive(ScalarType),
    /// A nullable scalar.
    Scalar(ScalarType),
    /// An opaque byte sequence.
    Bytes,
    /// The universal type: any JSON value.
    #[default]
    Any,
    List(Box<TypeUse>),
    /// A collection of unique elements.
    Set(Box<TypeUse>),
    /// A map with string keys.
    Map(Box<TypeUse>),
    /// A [`TypeDef`] by qualified name.
    Named(String),
}

impl TypeRef {
    #[must_use]
    pub fn list(element: impl Into<TypeUse>) -> Self {
        Self::List(Box::new(element.into()))
    }

    #[must_use]
    pub fn set(element: impl Into<TypeUse>) -> Self {
        Self::Set(Box::new(element.into()))
    }

    #[must_use]
    pub fn map(value: impl Into<TypeUse>) -> Self {
        Self::Map(Box::new(value.into()))
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn string() -> Self {
        Self::Scalar(ScalarType::String)
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// The qualified name of a named type.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

/// A type in use position together with its type-use constraints,
/// e.g. the `@Size(min = 3) String` element of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeUse {
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl TypeUse {
    #[must_use]
    pub fn constrained(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

impl From<TypeRef> for TypeUse {
    fn from(ty: TypeRef) -> Self {
        Self {
            ty,
            constraints: Vec::new(),
        }
    }
}

/// Declared value constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    NotNull,
    Null,
    NotBlank,
    NotEmpty,
    Size {
        #[serde(default)]
        min: Option<u64>,
        #[serde(default)]
        max: Option<u64>,
    },
    Min(i64),
    Max(i64),
    DecimalMin {
        value: String,
        #[serde(default = "inclusive_by_default")]
        inclusive: bool,
    },
    DecimalMax {
        value: String,
        #[serde(default = "inclusive_by_default")]
        inclusive: bool,
    },
    Positive,
    PositiveOrZero,
    Negative,
    NegativeOrZero,
    Pattern {
        regexp: String,
    },
    Email {
        #[serde(default)]
        regexp: Option<String>,
    },
    Digits {
        integer: u32,
        fraction: u32,
    },
    AssertTrue,
    AssertFalse,
    Future,
    FutureOrPresent,
    Past,
    PastOrPresent,
}

fn inclusive_by_default() -> bool {
    true
}

impl Constraint {
    #[must_use]
    pub fn size(min: Option<u64>, max: Option<u64>) -> Self {
        Self::Size { min, max }
    }

    #[must_use]
    pub fn pattern(regexp: impl Into<String>) -> Self {
        Self::Pattern {
            regexp: regexp.into(),
        }
    }

    #[must_use]
    pub fn decimal_min(value: impl Into<String>, inclusive: bool) -> Self {
        Self::DecimalMin {
            value: value.into(),
            inclusive,
        }
    }

    #[must_use]
    pub fn decimal_max(value: impl Into<String>, inclusive: bool) -> Self {
        Self::DecimalMax {
            value: value.into(),
            inclusive,
        }
    }

    /// Temporal constraints have no JSON Schema equivalent.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            Self::Future | Self::FutureOrPresent | Self::Past | Self::PastOrPresent
        )
    }

    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::NotNull => "NotNull",
            Self::Null => "Null",
            Self::NotBlank => "NotBlank",
            Self::NotEmpty => "NotEmpty",
            Self::Size { .. } => "Size",
            Self::Min(_) => "Min",
            Self::Max(_) => "Max",
            Self::DecimalMin { .. } => "DecimalMin",
            Self::DecimalMax { .. } => "DecimalMax",
            Self::Positive => "Positive",
            Self::PositiveOrZero => "PositiveOrZero",
            Self::Negative => "Negative",
            Self::NegativeOrZero => "NegativeOrZero",
            Self::Pattern { .. } => "Pattern",
            Self::Email { .. } => "Email",
            Self::Digits { .. } => "Digits",
            Self::AssertTrue => "AssertTrue",
            Self::AssertFalse => "AssertFalse",
            Self::Future => "Future",
            Self::FutureOrPresent => "FutureOrPresent",
            Self::Past => "Past",
            Self::PastOrPresent => "PastOrPresent",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nullability {
    #[default]
    Unspecified,
    Nullable,
    NonNull,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Serialization hints that are recognized but have no schema equivalent.
/// Each one present produces an unsupported-metadata warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializationHint {
    Alias,
    AutoDetect,
    BackReference,
    Creator,
    EnumDefaultValue,
    Format,
    IdentityInfo,
    IdentityReference,
    Key,
    ManagedReference,
    RawValue,
    RootName,
    TypeId,
    Value,
    View,
    Filter,
}

impl SerializationHint {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alias => "alias",
            Self::AutoDetect => "auto-detect",
            Self::BackReference => "back-reference",
            Self::Creator => "creator",
            Self::EnumDefaultValue => "enum-default-value",
            Self::Format => "format",
            Self::IdentityInfo => "identity-info",
            Self::IdentityReference => "identity-reference",
            Self::Key => "key",
            Self::ManagedReference => "managed-reference",
            Self::RawValue => "raw-value",
            Self::RootName => "root-name",
            Self::TypeId => "type-id",
            Self::Value => "value",
            Self::View => "view",
            Self::Filter => "filter",
        }
    }
}

/// How a subtype's discriminator value is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeIdStrategy {
    /// Explicit name, else declared type name, else simple name.
    #[default]
    Name,
    SimpleName,
    /// Fully qualified name.
    Class,
    /// Qualified name relative to the parent's namespace.
    MinimalClass,
    /// No discriminator; alternatives are told apart by shape.
    Deduction,
    None,
}

impl TypeIdStrategy {
    /// The discriminator property name used when none is declared.
    #[must_use]
    pub fn default_property(self) -> Option<&'static str> {
        match self {
            Self::Name | Self::SimpleName => Some("@type"),
            Self::Class => Some("@class"),
            Self::MinimalClass => Some("@c"),
            Self::Deduction | Self::None => None,
        }
    }
}

/// Where the discriminator is placed in the serialized value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inclusion {
    #[default]
    Property,
    ExistingProperty,
    WrapperObject,
    WrapperArray,
    ExternalProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtypeRef {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Accepted aliases; when present the discriminator becomes an enum.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl SubtypeRef {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            names: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A closed set of subtypes and the discriminator policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subtypes {
    pub id: TypeIdStrategy,
    pub include: Inclusion,
    /// Discriminator property name; defaults per [`TypeIdStrategy::default_property`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub types: Vec<SubtypeRef>,
}

impl Subtypes {
    #[must_use]
    pub fn new(id: TypeIdStrategy, include: Inclusion) -> Self {
        Self {
            id,
            include,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, subtype: SubtypeRef) -> Self {
        self.types.push(subtype);
        self
    }

    #[must_use]
    pub fn discriminator(&self) -> Option<&str> {
        self.property
            .as_deref()
            .or_else(|| self.id.default_property())
    }
}

/// Type-level schema metadata. Its presence marks a schema root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaAnnotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Record,
    #[default]
    Bean,
    Interface,
    Enum {
        values: Vec<String>,
    },
}

/// One structural property of a composite type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeRef,
    pub constraints: Vec<Constraint>,
    pub nullability: Nullability,
    pub documentation: Option<String>,
    /// Alternate name on the wire.
    pub wire_name: Option<String>,
    pub description: Option<String>,
    pub ignored: bool,
    /// Survives an include allow-list that does not name it.
    pub explicitly_included: bool,
    /// The property's own properties are spliced into the parent.
    pub unwrapped: bool,
    /// Captures unknown keys; must be a map.
    pub catch_all: bool,
    pub access: Access,
    pub deprecated: bool,
    pub default_value: Option<Value>,
    pub hints: Vec<SerializationHint>,
}

impl PropertyDef {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            ..Self::default()
        }
    }

    /// A property typed through the [`Describe`] adapter. `Option<T>` marks it nullable.
    #[must_use]
    pub fn of<T: Describe>(name: impl Into<String>) -> Self {
        let mut property: Self = Self::new(name, T::type_ref());
        if T::nullable() {
            property.nullability = Nullability::Nullable;
        }
        property
    }

    /// The key this property is written under.
    #[must_use]
    pub fn key(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn constrained(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullability = Nullability::Nullable;
        self
    }

    #[must_use]
    pub fn non_null(mut self) -> Self {
        self.nullability = Nullability::NonNull;
        self
    }

    #[must_use]
    pub fn documented(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    #[must_use]
    pub fn renamed(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    #[must_use]
    pub fn explicitly_included(mut self) -> Self {
        self.explicitly_included = true;
        self
    }

    #[must_use]
    pub fn unwrapped(mut self) -> Self {
        self.unwrapped = true;
        self
    }

    #[must_use]
    pub fn catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: SerializationHint) -> Self {
        self.hints.push(hint);
        self
    }
}

/// Description of one named type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeDef {
    /// Qualified name: `.`-separated namespace, `$` for nesting.
    pub name: String,
    pub kind: TypeKind,
    pub properties: Vec<PropertyDef>,
    pub schema: Option<SchemaAnnotation>,
    pub documentation: Option<String>,
    /// Declared discriminator name for this type when used as a subtype.
    pub type_name: Option<String>,
    pub class_description: Option<String>,
    pub subtypes: Option<Subtypes>,
    pub include_properties: Option<Vec<String>>,
    pub ignore_properties: Vec<String>,
    /// Properties of this type are dropped wherever they appear.
    pub ignored_type: bool,
    /// Value type of a catch-all setter.
    pub any_setter: Option<TypeUse>,
    /// Per-type strict-mode override.
    pub strict: Option<bool>,
    pub hints: Vec<SerializationHint>,
}

impl TypeDef {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn record(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Record)
    }

    #[must_use]
    pub fn bean(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Bean)
    }

    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    #[must_use]
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            TypeKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// The unqualified name. Nested-type separators become `.`.
    #[must_use]
    pub fn simple_name(&self) -> String {
        let last: &str = self.name.rsplit('.').next().unwrap_or(&self.name);
        last.replace('$', ".")
    }

    /// The namespace part of the qualified name; empty for the root namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(namespace, _)| namespace)
    }

    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self.kind, TypeKind::Record)
    }

    #[must_use]
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            TypeKind::Enum { values } => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.schema.is_some()
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Marks the type as a schema root.
    #[must_use]
    pub fn json_schema(mut self) -> Self {
        self.schema.get_or_insert_with(SchemaAnnotation::default);
        self
    }

    #[must_use]
    pub fn schema_title(mut self, title: impl Into<String>) -> Self {
        self.schema.get_or_insert_with(SchemaAnnotation::default).title = Some(title.into());
        self
    }

    #[must_use]
    pub fn schema_description(mut self, description: impl Into<String>) -> Self {
        self.schema
            .get_or_insert_with(SchemaAnnotation::default)
            .description = Some(description.into());
        self
    }

    #[must_use]
    pub fn schema_uri(mut self, uri: impl Into<String>) -> Self {
        self.schema.get_or_insert_with(SchemaAnnotation::default).uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn documented(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_class_description(mut self, description: impl Into<String>) -> Self {
        self.class_description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_subtypes(mut self, subtypes: Subtypes) -> Self {
        self.subtypes = Some(subtypes);
        self
    }

    #[must_use]
    pub fn include_only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_properties = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn ignoring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_properties = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn ignored_type(mut self) -> Self {
        self.ignored_type = true;
        self
    }

    #[must_use]
    pub fn with_any_setter(mut self, value: impl Into<TypeUse>) -> Self {
        self.any_setter = Some(value.into());
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: SerializationHint) -> Self {
        self.hints.push(hint);
        self
    }
}

/// Source of type descriptions for one synthesis session.
pub trait TypeProvider {
    fn type_def(&self, name: &str) -> Option<&TypeDef>;
}

/// An in-memory [`TypeProvider`] keyed by qualified name.
///
/// Serializes as a JSON array of [`TypeDef`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TypeDef>", into = "Vec<TypeDef>")]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDef>,
}

impl From<Vec<TypeDef>> for TypeRegistry {
    fn from(types: Vec<TypeDef>) -> Self {
        let mut registry: Self = Self::default();
        for type_def in types {
            registry.register(type_def);
        }
        registry
    }
}

impl From<TypeRegistry> for Vec<TypeDef> {
    fn from(registry: TypeRegistry) -> Self {
        registry.types.into_values().collect()
    }
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a type description.
    pub fn register(&mut self, type_def: TypeDef) -> &mut Self {
        self.types.insert(type_def.name.clone(), type_def);
        self
    }

    #[must_use]
    pub fn with(mut self, type_def: TypeDef) -> Self {
        self.register(type_def);
        self
    }

    /// Registers `T` and everything it refers to.
    pub fn describe<T: Describe>(&mut self) -> &mut Self {
        T::register(self);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Schema roots, in qualified-name order.
    pub fn annotated(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values().filter(|type_def| type_def.is_root())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeProvider for TypeRegistry {
    fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.get(name)
    }
}

/// Static structural description of a Rust type.
///
/// Implemented for common std types; implement it for your own types by
/// returning [`TypeRef::Named`] and registering a [`TypeDef`].
pub trait Describe {
    fn type_ref() -> TypeRef;

    /// Whether `null` is a legal value.
    fn nullable() -> bool {
        false
    }

    /// Registers the type descriptions this type depends on.
    fn register(_registry: &mut TypeRegistry) {}
}

macro_rules! describe_scalar {
    ($variant:ident, $scalar:ident: $($t:ty),+) => {
        $(
            impl Describe for $t {
                fn type_ref() -> TypeRef {
                    TypeRef::$variant(ScalarType::$scalar)
                }
            }
        )+
    };
}

describe_scalar!(Primitive, Boolean: bool);
describe_scalar!(Primitive, Int8: i8);
describe_scalar!(Primitive, Int16: i16);
describe_scalar!(Primitive, Int32: i32, isize);
describe_scalar!(Primitive, Int64: i64);
describe_scalar!(Primitive, UInt8: u8);
describe_scalar!(Primitive, UInt16: u16);
describe_scalar!(Primitive, UInt32: u32, usize);
describe_scalar!(Primitive, UInt64: u64);
describe_scalar!(Primitive, BigInteger: i128, u128);
describe_scalar!(Primitive, Float32: f32);
describe_scalar!(Primitive, Float64: f64);
describe_scalar!(Primitive, Char: char);
describe_scalar!(Scalar, String: String);

#[cfg(feature = "uuid")]
describe_scalar!(Scalar, Uuid: uuid::Uuid);

impl Describe for Value {
    fn type_ref() -> TypeRef {
        TypeRef::Any
    }
}

impl<T: Describe> Describe for Option<T> {
    fn type_ref() -> TypeRef {
        match T::type_ref() {
            TypeRef::Primitive(scalar) => TypeRef::Scalar(scalar),
            other => other,
        }
    }

    fn nullable() -> bool {
        true
    }

    fn register(registry: &mut TypeRegistry) {
        T::register(registry);
    }
}

impl<T: Describe> Describe for Box<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }

    fn nullable() -> bool {
        T::nullable()
    }

    fn register(registry: &mut TypeRegistry) {
        T::register(registry);
    }
}

macro_rules! describe_collection {
    ($constructor:ident: $($t:ident),+) => {
        $(
            impl<T: Describe> Describe for $t<T> {
                fn type_ref() -> TypeRef {
                    TypeRef::$constructor(T::type_ref())
                }

                fn register(registry: &mut TypeRegistry) {
                    T::register(registry);
                }
            }
        )+
    };
}

describe_collection!(list: Vec, VecDeque);
describe_collection!(set: HashSet, BTreeSet);

macro_rules! describe_map {
    ($($t:ident),+) => {
        $(
            impl<V: Describe> Describe for $t<String, V> {
                fn type_ref() -> TypeRef {
                    TypeRef::map(V::type_ref())
                }

                fn register(registry: &mut TypeRegistry) {
                    V::register(registry);
                }
            }
        )+
    };
}

describe_map!(HashMap, BTreeMap);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scalar_lookup_table() {
        assert_eq!(ScalarType::Int64.schema_type(), SchemaType::Integer);
        assert_eq!(ScalarType::Decimal.schema_type(), SchemaType::Number);
        assert_eq!(ScalarType::Timestamp.schema_type(), SchemaType::String);
        assert_eq!(ScalarType::Timestamp.format(), Some("date-time"));
        assert_eq!(ScalarType::Uuid.format(), Some("uuid"));
        assert_eq!(ScalarType::String.format(), None);
    }

    #[test]
    fn simple_name_and_namespace() {
        let def = TypeDef::bean("zoo.birds.Outer$Inner");
        assert_eq!(def.simple_name(), "Outer.Inner");
        assert_eq!(def.namespace(), "zoo.birds");
        let top = TypeDef::bean("Llama");
        assert_eq!(top.simple_name(), "Llama");
        assert_eq!(top.namespace(), "");
    }

    #[test]
    fn option_makes_primitive_nullable() {
        assert_eq!(i32::type_ref(), TypeRef::Primitive(ScalarType::Int32));
        assert_eq!(
            Option::<i32>::type_ref(),
            TypeRef::Scalar(ScalarType::Int32)
        );
        let property = PropertyDef::of::<Option<i32>>("age");
        assert_eq!(property.nullability, Nullability::Nullable);
        assert!(!property.ty.is_primitive());
    }

    #[test]
    fn std_collections_describe_shapes() {
        assert_eq!(
            Vec::<String>::type_ref(),
            TypeRef::list(TypeRef::string())
        );
        assert_eq!(
            BTreeSet::<u8>::type_ref(),
            TypeRef::set(TypeRef::Primitive(ScalarType::UInt8))
        );
        assert_eq!(
            HashMap::<String, Value>::type_ref(),
            TypeRef::map(TypeRef::Any)
        );
    }

    #[test]
    fn discriminator_defaults() {
        let subtypes = Subtypes::new(TypeIdStrategy::Name, Inclusion::Property);
        assert_eq!(subtypes.discriminator(), Some("@type"));
        let class = Subtypes::new(TypeIdStrategy::MinimalClass, Inclusion::Property);
        assert_eq!(class.discriminator(), Some("@c"));
        let deduction = Subtypes::new(TypeIdStrategy::Deduction, Inclusion::Property);
        assert_eq!(deduction.discriminator(), None);
        let custom = deduction.with_property("kind");
        assert_eq!(custom.discriminator(), Some("kind"));
    }

    #[test]
    fn registry_deserializes_from_array() {
        let registry: TypeRegistry = serde_json::from_str(
            r#"[
                {
                    "name": "zoo.Llama",
                    "kind": "Bean",
                    "schema": {},
                    "properties": [
                        { "name": "name", "ty": { "Scalar": "String" }, "constraints": ["NotBlank", "NotNull"] },
                        { "name": "age", "ty": { "Primitive": "Int32" }, "constraints": ["PositiveOrZero"] }
                    ]
                },
                {
                    "name": "zoo.Environment",
                    "properties": [
                        { "name": "name", "ty": { "Scalar": "String" }, "constraints": [{ "Size": { "min": 2 } }] }
                    ]
                }
            ]"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        let llama = registry.type_def("zoo.Llama").unwrap();
        assert!(llama.is_root());
        assert_eq!(llama.properties[0].constraints, vec![Constraint::NotBlank, Constraint::NotNull]);
        let environment = registry.get("zoo.Environment").unwrap();
        assert_eq!(
            environment.properties[0].constraints,
            vec![Constraint::size(Some(2), None)]
        );
        assert_eq!(registry.annotated().count(), 1);
    }

    #[test]
    fn decimal_bounds_default_to_inclusive() {
        let constraint: Constraint =
            serde_json::from_str(r#"{ "DecimalMax": { "value": "100.5" } }"#).unwrap();
        assert_eq!(constraint, Constraint::decimal_max("100.5", true));
        assert!(!Constraint::Future.is_supported());
        assert!(Constraint::NotBlank.is_supported());
    }
}
