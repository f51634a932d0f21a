mod common;

use common::{
    Bird, Eagle, Environment, Llama, Ostrich, Possum, RWBlackbird, Salamander, zoo_validator,
};
use json_schema_synth::{
    DirectoryLoader, JsonSchemaError, JsonSchemaTarget, JsonSchemaValidator, MemoryLoader,
    SchemaTarget, SynthesisSettings, ValidationMessage, ValidatorSettings, generate_to_dir,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn texts(messages: &[ValidationMessage]) -> Vec<String> {
    messages.iter().map(ToString::to_string).collect()
}

#[test]
fn valid_llama() {
    let validator = zoo_validator();
    let messages = validator
        .validate(&Llama {
            name: "John".to_string(),
            age: 12,
        })
        .unwrap();
    assert!(messages.is_empty(), "{messages:?}");
}

#[test]
fn invalid_llamas() {
    let validator = zoo_validator();
    let cases = [
        (
            Llama {
                name: String::new(),
                age: 12,
            },
            "/name: must be at least 1 characters long",
        ),
        (
            Llama {
                name: "John".to_string(),
                age: -12,
            },
            "/age: must have a minimum value of 0",
        ),
    ];
    for (llama, expected) in cases {
        assert_eq!(texts(&validator.validate(&llama).unwrap()), vec![expected]);
    }
}

#[test]
fn missing_primitive_is_required() {
    let validator = zoo_validator();
    let messages = validator
        .validate_value(&Llama::schema_target(), &json!({ "name": "John" }))
        .unwrap();
    assert_eq!(texts(&messages), vec![": required property 'age' not found"]);
}

#[test]
fn explicit_uri_locates_the_document() {
    let validator = zoo_validator();
    let messages = validator
        .validate(&RWBlackbird {
            name: "Clara".to_string(),
            wing_span: 1.2,
        })
        .unwrap();
    assert!(messages.is_empty(), "{messages:?}");
    let messages = validator
        .validate_str(&RWBlackbird::schema_target(), r#"{"name":"Clara","wingSpan":"wide"}"#)
        .unwrap();
    assert_eq!(texts(&messages), vec!["/wingSpan: string found, number expected"]);
}

#[test]
fn valid_possum_with_references() {
    let validator = zoo_validator();
    let possum = Possum::new(
        "Bob",
        Some(vec![Possum::new(
            "Alice",
            Some(Vec::new()),
            Some(Environment::new("field")),
        )]),
        Some(Environment::new("marshland")),
    );
    let messages = validator.validate(&possum).unwrap();
    assert!(messages.is_empty(), "{messages:?}");
}

#[test]
fn invalid_possums_report_nested_locations() {
    let validator = zoo_validator();
    let cases = [
        (
            Possum::new("", Some(Vec::new()), Some(Environment::new("forest"))),
            "/name: must be at least 1 characters long",
        ),
        (
            Possum::new("Bob", Some(Vec::new()), Some(Environment::new("f"))),
            "/environment/name: must be at least 2 characters long",
        ),
        (
            Possum::new(
                "Bob",
                Some(vec![Possum::new("Alice", None, Some(Environment::new("f")))]),
                None,
            ),
            "/children/0/environment/name: must be at least 2 characters long",
        ),
        (
            Possum::new("Bob", Some(vec![Possum::new("", None, None)]), None),
            "/children/0/name: must be at least 1 characters long",
        ),
    ];
    for (possum, expected) in cases {
        assert_eq!(texts(&validator.validate(&possum).unwrap()), vec![expected]);
    }
}

#[test]
fn valid_birds() {
    let validator = zoo_validator();
    let birds = [
        Bird::Ostrich(Ostrich {
            name: "Bob".to_string(),
            run_speed: 10.5,
        }),
        Bird::Eagle(Eagle {
            name: "Blob".to_string(),
            fly_speed: 31.2,
        }),
    ];
    for bird in birds {
        let messages = validator.validate(&bird).unwrap();
        assert!(messages.is_empty(), "{messages:?}");
    }
}

fn assert_one_of_failure(messages: &[ValidationMessage], first: &str, second: &str) {
    let texts: Vec<String> = texts(messages);
    assert_eq!(texts.len(), 3, "{texts:?}");
    for expected in [
        ": must be valid to one and only one schema, but 0 are valid",
        first,
        second,
    ] {
        assert!(texts.iter().any(|text| text == expected), "{expected} not in {texts:?}");
    }
}

#[test]
fn invalid_birds_report_every_alternative() {
    let validator = zoo_validator();
    let ostrich = Bird::Ostrich(Ostrich {
        name: "Glob".to_string(),
        run_speed: -12.0,
    });
    assert_one_of_failure(
        &validator.validate(&ostrich).unwrap(),
        "/runSpeed: must have an exclusive minimum value of 0",
        "/@type: must be the constant value 'eagle-bird'",
    );
    let eagle = Bird::Eagle(Eagle {
        name: "Blob".to_string(),
        fly_speed: 0.5,
    });
    assert_one_of_failure(
        &validator.validate(&eagle).unwrap(),
        "/@type: must be the constant value 'ostrich-bird'",
        "/flySpeed: must have a minimum value of 1",
    );
}

#[test]
fn unknown_discriminator_matches_no_alternative() {
    let validator = zoo_validator();
    let messages = validator
        .validate_str(&Bird::schema_target(), r#"{"@type":"unknown-bird"}"#)
        .unwrap();
    assert_one_of_failure(
        &messages,
        "/@type: must be the constant value 'ostrich-bird'",
        "/@type: must be the constant value 'eagle-bird'",
    );
}

#[test]
fn valid_salamander() {
    let validator = zoo_validator();
    let salamander = Salamander {
        colors: Some(vec!["green".to_string(), "red".to_string()]),
        environments: Some(vec!["pond".to_string(), "river".to_string()]),
        skin_color: Some("green".to_string()),
        species: Some("Pond Salamander".to_string()),
        age: Some(1),
        negative: Some(-12),
        integer: Some(15),
        number: Some(20.25),
    };
    let messages = validator.validate(&salamander).unwrap();
    assert!(messages.is_empty(), "{messages:?}");
}

#[test]
fn invalid_salamanders() {
    let validator = zoo_validator();
    let cases = [
        (
            Salamander {
                colors: Some(Vec::new()),
                ..Salamander::default()
            },
            "/colors: must have at least 1 items but found 0",
        ),
        (
            Salamander {
                environments: Some(vec!["pond".to_string()]),
                ..Salamander::default()
            },
            "/environments: must have at least 2 items but found 1",
        ),
        (
            Salamander {
                skin_color: Some(String::new()),
                ..Salamander::default()
            },
            "/skinColor: must be at least 1 characters long",
        ),
        (
            Salamander {
                species: Some("a-very-long-species-name".to_string()),
                ..Salamander::default()
            },
            "/species: must be at most 20 characters long",
        ),
        (
            Salamander {
                species: Some("invalidChar$".to_string()),
                ..Salamander::default()
            },
            r"/species: does not match the regex pattern ^[a-zA-Z \-]+$",
        ),
        (
            Salamander {
                age: Some(-12),
                ..Salamander::default()
            },
            "/age: must have a minimum value of 0",
        ),
        (
            Salamander {
                negative: Some(12),
                ..Salamander::default()
            },
            "/negative: must have an exclusive maximum value of 0",
        ),
        (
            Salamander {
                integer: Some(1),
                ..Salamander::default()
            },
            "/integer: must have a minimum value of 10",
        ),
        (
            Salamander {
                integer: Some(120),
                ..Salamander::default()
            },
            "/integer: must have a maximum value of 100",
        ),
        (
            Salamander {
                number: Some(10.0),
                ..Salamander::default()
            },
            "/number: must have an exclusive minimum value of 10",
        ),
        (
            Salamander {
                number: Some(100.6),
                ..Salamander::default()
            },
            "/number: must have a maximum value of 100.5",
        ),
    ];
    for (salamander, expected) in cases {
        assert_eq!(texts(&validator.validate(&salamander).unwrap()), vec![expected]);
    }
}

#[test]
fn compiled_schemas_are_shared_between_threads() {
    let validator = zoo_validator();
    std::thread::scope(|scope| {
        for index in 0..8 {
            let validator = &validator;
            scope.spawn(move || {
                let llama = Llama {
                    name: format!("llama-{index}"),
                    age: index,
                };
                assert!(validator.validate(&llama).unwrap().is_empty());
            });
        }
    });
    assert_eq!(validator.cached_count(), 1);
}

#[test]
fn missing_schema_is_reported() {
    let validator = zoo_validator();
    let err = validator
        .validate_value(&SchemaTarget::new("zoo.Unicorn"), &json!({}))
        .unwrap_err();
    assert!(
        matches!(&err, JsonSchemaError::SchemaNotFound { type_name, path }
            if type_name == "zoo.Unicorn" && path == "schemas/unicorn.schema.json"),
        "{err}"
    );
}

#[test]
fn references_must_stay_in_the_resource_folder() {
    let loader = MemoryLoader::new().with(
        "schemas/pen.schema.json",
        json!({ "properties": { "keeper": { "$ref": "../../keeper.json" } } }).to_string(),
    );
    let validator = JsonSchemaValidator::new(ValidatorSettings::default(), loader);
    let err = validator
        .validate_value(&SchemaTarget::new("zoo.Pen"), &json!({}))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "schema for reference ../../keeper.json is not inside the required folder schemas/"
    );
}

#[test]
fn validates_documents_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    generate_to_dir(&common::zoo(), SynthesisSettings::default(), dir.path()).unwrap();
    let validator = JsonSchemaValidator::new(ValidatorSettings::default(), DirectoryLoader::new(dir.path()));
    let possum = Possum::new("Bob", None, Some(Environment::new("f")));
    assert_eq!(
        texts(&validator.validate(&possum).unwrap()),
        vec!["/environment/name: must be at least 2 characters long"]
    );
}
