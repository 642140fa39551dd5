use std::io;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};

use crate::types::{ClientSecret, TRACK_URI_PREFIX};

/// Argument that switches input collection over to stdin.
pub const STDIN_MARKER: &str = "-";

pub fn is_canonical(reference: &str) -> bool {
    reference.starts_with(TRACK_URI_PREFIX)
}

/// Expands command-line references. Arguments are taken verbatim until the
/// first `-`, which is replaced by the non-empty lines read from `read_stdin`;
/// anything after the marker is ignored.
pub fn expand_input<F>(args: Vec<String>, read_stdin: F) -> io::Result<Vec<String>>
where
    F: FnOnce() -> io::Result<String>,
{
    let mut input = Vec::with_capacity(args.len());
    for arg in args {
        if arg != STDIN_MARKER {
            input.push(arg);
            continue;
        }

        let data = read_stdin()?;
        input.extend(
            data.lines()
                .map(|l| l.trim_end_matches('\r'))
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
        break;
    }
    Ok(input)
}

pub fn basic_auth_header(secret: &ClientSecret) -> String {
    let raw = format!("{}:{}", secret.id, secret.secret);
    format!("Basic {}", STANDARD.encode(raw))
}

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn ceil_div(value: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    value.div_ceil(divisor)
}

/// Formats milliseconds as `m:ss`.
pub fn format_duration_ms(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
