mod cmd;
mod exit;
mod input;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dictable", version, about = "Declarative data model CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). DICTABLE_LOG overrides it.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_subcommand() {
        let cli = Cli::try_parse_from([
            "dictable",
            "check",
            "models.json",
            "--entity",
            "User",
            "--input",
            "user.json",
            "--compact",
        ])
        .expect("check args should parse");

        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.entity, "User");
                assert!(args.compact);
                assert!(!args.partial);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn entity_is_required() {
        let err = Cli::try_parse_from(["dictable", "spec", "models.json"])
            .expect_err("missing --entity should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_spec_style_and_global_format() {
        let cli = Cli::try_parse_from([
            "dictable",
            "spec",
            "models.json",
            "--entity",
            "Author",
            "--style",
            "definitions",
            "--format",
            "pretty",
        ])
        .expect("spec args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Pretty));
        assert!(matches!(
            cli.command,
            Command::Spec(ref args) if args.style == cmd::StyleArg::Definitions
        ));
    }
}
