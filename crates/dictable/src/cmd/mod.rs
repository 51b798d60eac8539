use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use dictable_core::{Registry, Schema};
use dictable_document::{load_file, LoaderConfig};
use dictable_schema::SpecStyle;

use crate::exit::{document_error, model_error, CliResult};
use crate::output::OutputFormat;

pub mod check;
pub mod json_schema;
pub mod spec;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Construct an entity from a JSON payload and print it normalized.
    Check(CheckArgs),
    /// Print the declarative field spec of an entity.
    Spec(SpecArgs),
    /// Print the JSON Schema of an entity.
    JsonSchema(JsonSchemaArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Check(args) => check::run(args, format),
        Command::Spec(args) => spec::run(args, format),
        Command::JsonSchema(args) => json_schema::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema document declaring enums and entities.
    pub document: PathBuf,
    /// Entity to construct.
    #[arg(long, short = 'e')]
    pub entity: String,
    /// Read the payload from a file instead of stdin.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Construct the partial variant, where every top-level field is optional.
    #[arg(long)]
    pub partial: bool,
    /// Omit optional fields that are null from the output.
    #[arg(long)]
    pub compact: bool,
    /// Validate the payload against the exported JSON Schema first.
    #[arg(long)]
    pub json_schema: bool,
    /// Reject payload keys that no field declares.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Flat unless the entity is self-referential.
    #[default]
    Auto,
    Flat,
    /// Each entity once under `$defs`.
    Definitions,
}

impl From<StyleArg> for SpecStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Auto => SpecStyle::Auto,
            StyleArg::Flat => SpecStyle::Flat,
            StyleArg::Definitions => SpecStyle::Definitions,
        }
    }
}

#[derive(Args, Debug)]
pub struct SpecArgs {
    /// Schema document declaring enums and entities.
    pub document: PathBuf,
    /// Entity to describe.
    #[arg(long, short = 'e')]
    pub entity: String,
    /// Layout of nested entities.
    #[arg(long, value_enum, default_value_t = StyleArg::Auto)]
    pub style: StyleArg,
    /// Describe the partial variant.
    #[arg(long)]
    pub partial: bool,
}

#[derive(Args, Debug)]
pub struct JsonSchemaArgs {
    /// Schema document declaring enums and entities.
    pub document: PathBuf,
    /// Entity to export.
    #[arg(long, short = 'e')]
    pub entity: String,
    /// Disallow properties no field declares.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Load the schema document at `path` into a registry.
pub(crate) fn load_registry(path: &Path, strict: bool) -> CliResult<Registry> {
    let config = LoaderConfig {
        strict_mode: strict,
        ..LoaderConfig::default()
    };
    load_file(path, &config).map_err(|err| document_error("failed to load schema document", err))
}

/// Look up `entity`, or derive its partial variant.
pub(crate) fn resolve_schema(
    registry: &Registry,
    entity: &str,
    partial: bool,
) -> CliResult<Arc<Schema>> {
    let schema = if partial {
        registry.partial(entity)
    } else {
        registry.schema(entity).cloned()
    };
    schema.map_err(|err| model_error("entity lookup failed", err))
}
