use std::io::Read;
use std::path::Path;

use serde_json::Value as Json;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};

/// Upper bound on a raw payload read from a file or stdin.
pub const MAX_INPUT_BYTES: usize = 16 * 1024 * 1024;

/// Read and parse a JSON payload from `path`, or stdin when absent.
pub fn read_payload(path: Option<&Path>) -> CliResult<Json> {
    let (source, bytes) = match path {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|err| io_error(&format!("failed to open {}", path.display()), err))?;
            (path.display().to_string(), read_bounded(file)?)
        }
        None => ("stdin".to_string(), read_bounded(std::io::stdin().lock())?),
    };
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(DATA_INVALID, format!("{source} is not valid JSON: {err}")))
}

fn read_bounded(reader: impl Read) -> CliResult<Vec<u8>> {
    let read_limit = u64::try_from(MAX_INPUT_BYTES.saturating_add(1)).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    reader
        .take(read_limit)
        .read_to_end(&mut bytes)
        .map_err(|err| io_error("failed reading input", err))?;
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(CliError::new(
            DATA_INVALID,
            format!("input exceeds {MAX_INPUT_BYTES} bytes"),
        ));
    }
    Ok(bytes)
}
