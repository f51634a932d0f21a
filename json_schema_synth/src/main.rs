//! Binary to synthesize JSON Schema documents and validate JSON against them.
//!
//! Usage:
//! - `jsonschema-synth generate --types types.json --out target`
//! - `jsonschema-synth validate --schemas target --name Llama < llama.json`

use std::io::{read_to_string, stdin};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use json_schema_synth::{
    DEFAULT_BASE_URI, DirectoryLoader, JsonSchemaError, JsonSchemaValidator,
    SchemaTarget, SynthesisSettings, TypeRegistry, ValidationMessage, ValidatorSettings,
    generate_to_dir,
};

#[derive(Parser, Debug)]
#[command(name = "jsonschema-synth", version, about, long_about = None)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a document for every schema root in a type registry.
    Generate(GenerateArgs),
    /// Validate a JSON instance against a generated document.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON array of type descriptions.
    #[arg(long)]
    types: PathBuf,

    /// Output root directory.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, conflicts_with = "no_base_uri")]
    base_uri: Option<String>,

    /// Leave types without an absolute URI unreferenceable.
    #[arg(long)]
    no_base_uri: bool,

    /// Require every non-nullable property and forbid unknown properties.
    #[arg(long)]
    strict: bool,

    /// Encode byte sequences as integer arrays.
    #[arg(long)]
    binary_as_array: bool,

    /// Directory under `--out` the documents are written to.
    #[arg(long, default_value = "schemas")]
    output_location: String,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Root directory the schema resources are loaded from.
    #[arg(long)]
    schemas: PathBuf,

    /// Simple name of the type, used when no `--uri` is given.
    #[arg(long)]
    name: String,

    /// Qualified name of the type.
    #[arg(long)]
    type_name: Option<String>,

    /// Explicit schema URI of the type.
    #[arg(long)]
    uri: Option<String>,

    #[arg(long, default_value = DEFAULT_BASE_URI)]
    base_uri: String,

    #[arg(long, default_value = "schemas")]
    resource_folder: String,

    /// Instance file; stdin when absent.
    #[arg(long)]
    input: Option<PathBuf>,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level: &str = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, _) => "debug",
    };
    let filter: EnvFilter = EnvFilter::try_from_env("JSONSCHEMA_SYNTH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_generate(args: &GenerateArgs) -> Result<u8, JsonSchemaError> {
    let types: String = std::fs::read_to_string(&args.types)?;
    let registry: TypeRegistry = serde_json::from_str(&types)?;
    let mut settings: SynthesisSettings = SynthesisSettings::default()
        .with_strict_mode(args.strict)
        .with_binary_as_array(args.binary_as_array)
        .with_output_location(&args.output_location);
    if args.no_base_uri {
        settings = settings.without_base_uri();
    } else if let Some(base_uri) = &args.base_uri {
        settings = settings.with_base_uri(base_uri);
    }
    tracing::debug!(types = registry.len(), "loaded type registry");
    for path in generate_to_dir(&registry, settings, &args.out)? {
        println!("{}", path.display());
    }
    Ok(0)
}

fn run_validate(args: &ValidateArgs) -> Result<u8, JsonSchemaError> {
    let settings: ValidatorSettings = ValidatorSettings::default()
        .with_base_uri(&args.base_uri)
        .with_resource_folder(&args.resource_folder);
    let validator: JsonSchemaValidator =
        JsonSchemaValidator::new(settings, DirectoryLoader::new(&args.schemas));

    let mut target: SchemaTarget = SchemaTarget::new(args.type_name.as_deref().unwrap_or(&args.name));
    target.simple_name.clone_from(&args.name);
    if let Some(uri) = &args.uri {
        target = target.with_uri(uri);
    }

    let instance: String = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => read_to_string(stdin())?,
    };
    let messages: Vec<ValidationMessage> = validator.validate_str(&target, &instance)?;
    for message in &messages {
        println!("{message}");
    }
    Ok(u8::from(!messages.is_empty()))
}

fn main() -> ExitCode {
    let cli: Cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result: Result<u8, JsonSchemaError> = match &cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Validate(args) => run_validate(args),
    };
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(2)
        }
    }
}
