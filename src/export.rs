//! Sharing captured traffic.
//!
//! Converts captured requests into cURL commands that reproduce them, and
//! transactions into JSON for bug reports.

use crate::models::{HttpMethod, RequestRecord, Transaction};
use std::sync::Arc;

/// Commands up to this length stay on one line.
const SINGLE_LINE_LIMIT: usize = 80;

/// Builds a cURL command reproducing `request`.
///
/// Long commands are split over several lines with backslash continuations.
/// Headers are emitted in sorted order so the output is stable. Bodies that
/// are not valid UTF-8 cannot be inlined; the command reads them from stdin
/// instead.
///
/// ```
/// use traffic_inspector::export::to_curl;
/// use traffic_inspector::models::{HttpMethod, RequestRecord};
///
/// let request = RequestRecord::new(HttpMethod::DELETE, "https://api.example.com/users/7");
/// assert_eq!(to_curl(&request), "curl -X DELETE https://api.example.com/users/7");
/// ```
pub fn to_curl(request: &RequestRecord) -> String {
    let parts = curl_parts(request);
    let single_line = parts.join(" ");
    let command = if single_line.len() <= SINGLE_LINE_LIMIT {
        single_line
    } else {
        parts.join(" \\\n  ")
    };

    match binary_body_len(request) {
        Some(len) => format!(
            "# request body is {} bytes of binary data; pipe it on stdin\n{}",
            len, command
        ),
        None => command,
    }
}

/// Builds a single-line cURL command reproducing `request`.
pub fn to_curl_compact(request: &RequestRecord) -> String {
    curl_parts(request).join(" ")
}

/// Pretty-printed JSON array of `transactions`.
pub fn to_json(transactions: &[Arc<Transaction>]) -> Result<String, serde_json::Error> {
    let records: Vec<&Transaction> = transactions.iter().map(Arc::as_ref).collect();
    serde_json::to_string_pretty(&records)
}

/// Command fragments; each flag is kept together with its argument.
fn curl_parts(request: &RequestRecord) -> Vec<String> {
    let mut parts = vec!["curl".to_string()];

    if request.method != HttpMethod::GET {
        parts.push(format!("-X {}", request.method.as_str()));
    }

    let mut header_names: Vec<&String> = request.headers.keys().collect();
    header_names.sort();
    for name in header_names {
        let value = &request.headers[name];
        parts.push(format!("-H {}", escape_shell_arg(&format!("{}: {}", name, value))));
    }

    if let Some(body) = &request.body {
        match std::str::from_utf8(body) {
            Ok(text) => parts.push(format!("--data-raw {}", escape_shell_arg(text))),
            Err(_) => parts.push("--data-binary @-".to_string()),
        }
    }

    parts.push(escape_shell_arg(&request.url));
    parts
}

fn binary_body_len(request: &RequestRecord) -> Option<usize> {
    let body = request.body.as_ref()?;
    std::str::from_utf8(body).is_err().then_some(body.len())
}

/// Quotes `arg` for a POSIX shell when it contains special characters.
fn escape_shell_arg(arg: &str) -> String {
    if !needs_quoting(arg) {
        return arg.to_string();
    }
    // ' cannot appear inside single quotes; close, escape, reopen.
    format!("'{}'", arg.replace('\'', "'\\''"))
}

fn needs_quoting(s: &str) -> bool {
    const SPECIAL: &[char] = &[
        ' ', '\t', '\n', '\r', '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', '*',
        '?', '[', ']', '#', '~', '=', '%', '{', '}', '!',
    ];

    s.is_empty() || s.chars().any(|c| SPECIAL.contains(&c))
}
