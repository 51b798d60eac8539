use dictable_core::{DefaultValue, FieldKind, Origin, Schema};
use dictable_schema::schema_spec;

use crate::cmd::{load_registry, resolve_schema, SpecArgs};
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{cell, print_document, print_table, OutputFormat};

pub fn run(args: SpecArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.document, false)?;
    let schema = resolve_schema(&registry, &args.entity, args.partial)?;

    if format == OutputFormat::Table {
        print_table(
            &["FIELD", "KEY", "TYPE", "REQUIRED", "DEFAULT", "SOURCE", "DESCRIPTION"],
            field_rows(&schema),
        );
        return Ok(SUCCESS);
    }

    let spec = schema_spec(&registry, &schema, args.style.into())
        .map_err(|err| schema_error("spec failed", err))?;
    print_document(&spec, format);
    Ok(SUCCESS)
}

fn field_rows(schema: &Schema) -> Vec<Vec<String>> {
    schema
        .slots()
        .iter()
        .map(|slot| {
            let field = slot.field();
            let default = match field.default_value() {
                Some(DefaultValue::Static(value)) => cell(&value.to_json()),
                Some(DefaultValue::Factory(factory)) => format!("{}()", factory.name()),
                None => String::new(),
            };
            let source = match slot.origin() {
                Origin::Explicit => "field",
                Origin::Hint => "hint",
            };
            vec![
                slot.name().to_string(),
                slot.key().to_string(),
                type_label(field.kind()),
                field.is_required().to_string(),
                default,
                source.to_string(),
                field.description().unwrap_or_default().to_string(),
            ]
        })
        .collect()
}

/// Type name with the entity or enumeration it points at.
fn type_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Object(entity) => format!("object({entity})"),
        FieldKind::MultiType { entities, .. } => format!("multi_type({})", entities.join("|")),
        FieldKind::Enum { enumeration, .. } => format!("enum({})", enumeration.name()),
        FieldKind::List(element) => format!("list({})", type_label(element.kind())),
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use dictable_core::Field;

    use super::*;

    #[test]
    fn rows_follow_declaration_order() {
        let schema = Schema::builder("User")
            .field("name", Field::str().required().key("user_name"))
            .field("tags", Field::list(Field::object("Tag")))
            .field("level", Field::int().default(1))
            .build()
            .unwrap();
        let rows = field_rows(&schema);
        assert_eq!(
            rows[0],
            ["name", "user_name", "str", "true", "", "field", ""]
        );
        assert_eq!(rows[1][2], "list(object(Tag))");
        assert_eq!(rows[2][4], "1");
    }
}
