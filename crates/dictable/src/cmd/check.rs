use dictable_core::{Init, OutputMode};
use dictable_schema::{ExportConfig, PayloadValidator};
use tracing::{debug, info};

use crate::cmd::{load_registry, resolve_schema, CheckArgs};
use crate::exit::{model_error, schema_error, CliResult, SUCCESS};
use crate::input::read_payload;
use crate::output::{print_document, OutputFormat};

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.document, args.strict)?;
    let schema = resolve_schema(&registry, &args.entity, args.partial)?;
    let raw = read_payload(args.input.as_deref())?;

    if args.json_schema {
        let config = ExportConfig {
            strict_mode: registry.config().strict_mode,
            ..ExportConfig::default()
        };
        PayloadValidator::compile(&registry, &schema, &config)
            .and_then(|validator| validator.validate(&raw))
            .map_err(|err| schema_error("json schema pre-flight failed", err))?;
        debug!(entity = schema.name(), "json schema pre-flight passed");
    }

    let entity = registry
        .construct_with(&schema, Init::raw(raw))
        .map_err(|err| model_error("check failed", err))?;
    info!(entity = entity.name(), "payload accepted");

    let mode = if args.compact {
        OutputMode::Compact
    } else {
        OutputMode::Full
    };
    print_document(&entity.to_external_with(mode), format);
    Ok(SUCCESS)
}
