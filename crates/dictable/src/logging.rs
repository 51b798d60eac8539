use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive, e.g. `dictable_core=trace`.
pub const LOG_ENV: &str = "DICTABLE_LOG";

/// Crates whose events reach the subscriber at the chosen level.
const OWN_TARGETS: [&str; 4] = [
    "dictable",
    "dictable_core",
    "dictable_schema",
    "dictable_document",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives for `level`: the workspace crates at `level`,
/// everything else capped at `warn`.
fn level_directives(level: LogLevel) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        OWN_TARGETS
            .iter()
            .map(|target| format!("{target}={}", level.directive())),
    );
    directives.join(",")
}

/// Pick the filter: a non-blank `DICTABLE_LOG` wins, otherwise `--log-level`.
///
/// The second value carries an override that failed to parse so it can be
/// reported once the subscriber is up.
fn resolve_filter(level: LogLevel, env: Option<&str>) -> (EnvFilter, Option<String>) {
    let fallback = || EnvFilter::new(level_directives(level));
    match env.map(str::trim) {
        Some(directives) if !directives.is_empty() => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(err) => (fallback(), Some(format!("{directives}: {err}"))),
        },
        _ => (fallback(), None),
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = resolve_filter(level, env.as_deref());
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }

    if let Some(rejected) = rejected {
        tracing::warn!(variable = LOG_ENV, %rejected, "ignoring invalid log filter");
    }
}
