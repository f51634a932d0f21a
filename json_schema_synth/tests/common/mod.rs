//! Zoo fixtures shared by the integration tests: type descriptions for
//! synthesis and matching serde types for validation.

use json_schema_synth::{
    Constraint, Inclusion, JsonSchemaTarget, JsonSchemaValidator, MemoryLoader, PropertyDef,
    ScalarType, SchemaTarget, SubtypeRef, Subtypes, SynthesisSettings, TypeDef, TypeIdStrategy,
    TypeRef, TypeRegistry, TypeUse, ValidatorSettings, generate_schemas,
};
use serde::Serialize;

pub fn zoo() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            TypeDef::record("zoo.Llama")
                .json_schema()
                .property(PropertyDef::new("name", TypeRef::string()).constrained(Constraint::NotBlank))
                .property(
                    PropertyDef::new("age", TypeRef::Primitive(ScalarType::Int32))
                        .constrained(Constraint::PositiveOrZero),
                ),
        )
        .with(
            TypeDef::record("zoo.RWBlackbird")
                .json_schema()
                .schema_title("RedWingedBlackbird")
                .schema_description("A species of blackbird with red wings")
                .schema_uri("/red-winged-blackbird")
                .property(PropertyDef::new("name", TypeRef::string()))
                .property(PropertyDef::new("wingSpan", TypeRef::Primitive(ScalarType::Float64))),
        )
        .with(
            TypeDef::record("zoo.Possum")
                .json_schema()
                .property(PropertyDef::new("name", TypeRef::string()).constrained(Constraint::NotBlank))
                .property(PropertyDef::new("children", TypeRef::list(TypeRef::named("zoo.Possum"))))
                .property(PropertyDef::new("environment", TypeRef::named("zoo.Environment"))),
        )
        .with(
            TypeDef::record("zoo.Environment").property(
                PropertyDef::new("name", TypeRef::string()).constrained(Constraint::size(Some(2), None)),
            ),
        )
        .with(
            TypeDef::interface("zoo.Bird").json_schema().with_subtypes(
                Subtypes::new(TypeIdStrategy::Name, Inclusion::Property)
                    .with_type(SubtypeRef::new("zoo.Ostrich").with_name("ostrich-bird"))
                    .with_type(SubtypeRef::new("zoo.Eagle")),
            ),
        )
        .with(
            TypeDef::record("zoo.Ostrich")
                .property(PropertyDef::new("name", TypeRef::string()))
                .property(
                    PropertyDef::new("runSpeed", TypeRef::Scalar(ScalarType::Float32))
                        .constrained(Constraint::Positive),
                ),
        )
        .with(
            TypeDef::record("zoo.Eagle")
                .with_type_name("eagle-bird")
                .property(PropertyDef::new("name", TypeRef::string()))
                .property(
                    PropertyDef::new("flySpeed", TypeRef::Scalar(ScalarType::Float32))
                        .constrained(Constraint::Min(1)),
                ),
        )
        .with(salamander())
}

fn salamander() -> TypeDef {
    let environment: TypeUse = TypeUse::from(TypeRef::string()).constrained(Constraint::size(Some(3), None));
    TypeDef::bean("zoo.Salamander")
        .json_schema()
        .property(
            PropertyDef::new("colors", TypeRef::list(TypeRef::string())).constrained(Constraint::NotEmpty),
        )
        .property(
            PropertyDef::new("environments", TypeRef::list(environment))
                .constrained(Constraint::size(Some(2), Some(10))),
        )
        .property(PropertyDef::new("skinColor", TypeRef::string()).constrained(Constraint::NotBlank))
        .property(
            PropertyDef::new("species", TypeRef::string())
                .constrained(Constraint::size(Some(3), Some(20)))
                .constrained(Constraint::pattern(r"^[a-zA-Z \-]+$")),
        )
        .property(
            PropertyDef::new("age", TypeRef::Scalar(ScalarType::Int32))
                .constrained(Constraint::PositiveOrZero),
        )
        .property(
            PropertyDef::new("negative", TypeRef::Scalar(ScalarType::Int32))
                .constrained(Constraint::Negative),
        )
        .property(
            PropertyDef::new("integer", TypeRef::Scalar(ScalarType::Int64))
                .constrained(Constraint::Min(10))
                .constrained(Constraint::Max(100)),
        )
        .property(
            PropertyDef::new("number", TypeRef::Scalar(ScalarType::Float64))
                .constrained(Constraint::decimal_min("10", false))
                .constrained(Constraint::decimal_max("100.5", true)),
        )
}

/// A validator over the zoo's freshly synthesized documents.
pub fn zoo_validator() -> JsonSchemaValidator {
    let settings: SynthesisSettings = SynthesisSettings::default();
    let synthesis = generate_schemas(&zoo(), settings.clone()).unwrap();
    let loader = MemoryLoader::from_documents(&synthesis.documents, &settings).unwrap();
    JsonSchemaValidator::new(ValidatorSettings::default(), loader)
}

#[derive(Debug, Clone, Serialize)]
pub struct Llama {
    pub name: String,
    pub age: i32,
}

impl JsonSchemaTarget for Llama {
    fn schema_target() -> SchemaTarget {
        SchemaTarget::new("zoo.Llama")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RWBlackbird {
    pub name: String,
    pub wing_span: f64,
}

impl JsonSchemaTarget for RWBlackbird {
    fn schema_target() -> SchemaTarget {
        SchemaTarget::new("zoo.RWBlackbird").with_uri("/red-winged-blackbird")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    pub name: String,
}

impl Environment {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Possum {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Possum>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

impl Possum {
    pub fn new(name: &str, children: Option<Vec<Possum>>, environment: Option<Environment>) -> Self {
        Self {
            name: name.to_string(),
            children,
            environment,
        }
    }
}

impl JsonSchemaTarget for Possum {
    fn schema_target() -> SchemaTarget {
        SchemaTarget::new("zoo.Possum")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ostrich {
    pub name: String,
    pub run_speed: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eagle {
    pub name: String,
    pub fly_speed: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "@type")]
pub enum Bird {
    #[serde(rename = "ostrich-bird")]
    Ostrich(Ostrich),
    #[serde(rename = "eagle-bird")]
    Eagle(Eagle),
}

impl JsonSchemaTarget for Bird {
    fn schema_target() -> SchemaTarget {
        SchemaTarget::new("zoo.Bird")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Salamander {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
}

impl JsonSchemaTarget for Salamander {
    fn schema_target() -> SchemaTarget {
        SchemaTarget::new("zoo.Salamander")
    }
}
