use dictable_schema::{to_json_schema, ExportConfig};

use crate::cmd::{load_registry, resolve_schema, JsonSchemaArgs};
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_document, OutputFormat};

pub fn run(args: JsonSchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.document, args.strict)?;
    let schema = resolve_schema(&registry, &args.entity, false)?;
    let config = ExportConfig {
        strict_mode: registry.config().strict_mode,
        ..ExportConfig::default()
    };
    let document = to_json_schema(&registry, &schema, &config)
        .map_err(|err| schema_error("json schema export failed", err))?;

    // A table of `$schema`/`$ref`/`$defs` says little; print the document.
    let format = match format {
        OutputFormat::Table => OutputFormat::Pretty,
        other => other,
    };
    print_document(&document, format);
    Ok(SUCCESS)
}
