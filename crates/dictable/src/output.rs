use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::Value as Json;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print a JSON document. Tables list the top-level keys of a mapping.
pub fn print_document(value: &Json, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", compact(value)),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Raw => print_raw(compact(value).as_bytes()),
        OutputFormat::Table => match value {
            Json::Object(map) => {
                let rows = map
                    .iter()
                    .map(|(key, value)| vec![key.clone(), cell(value)])
                    .collect();
                print_table(&["KEY", "VALUE"], rows);
            }
            other => println!("{}", compact(other)),
        },
    }
}

pub fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn compact(value: &Json) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Strings print bare, everything else as compact JSON.
pub fn cell(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        other => compact(other),
    }
}
