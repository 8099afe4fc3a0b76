use std::fmt::Write;

use crate::sink::Event;
use crate::types::HttpRequest;

/// Serialize an [`HttpRequest`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(request: &HttpRequest, pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(request)
    } else {
        serde_json::to_string(request)
    };
    result.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Render events as JSON lines, one event per line.
pub fn format_events(events: &[Event]) -> String {
    let mut out = String::with_capacity(events.len() * 32);
    for event in events {
        match serde_json::to_string(event) {
            Ok(line) => out.push_str(&line),
            Err(e) => {
                let _ = write!(out, "{{\"error\": \"{e}\"}}");
            }
        }
        out.push('\n');
    }
    out
}

/// Render an [`HttpRequest`] in a human-readable debug format.
pub fn format_debug(request: &HttpRequest) -> String {
    let mut out = String::with_capacity(256);

    let _ = writeln!(out, "=== {} {} ===", request.method, request.uri);
    let _ = writeln!(out, "Version: {}", request.version);
    let _ = writeln!(out, "Headers: {}", request.headers.len());
    for header in &request.headers {
        let _ = writeln!(out, "  {}: {}", header.name, header.value);
    }

    match &request.body {
        Some(body) => {
            let _ = writeln!(out, "Body: {} bytes", body.len());
            match std::str::from_utf8(body) {
                Ok(s) => out.push_str(s),
                Err(_) => out.push_str("<binary data>"),
            }
            out.push('\n');
        }
        None => out.push_str("Body: none\n"),
    }

    out
}

/// Render only the request line and headers (no body).
pub fn format_headers_only(request: &HttpRequest) -> String {
    let mut out = String::with_capacity(64 + request.headers.len() * 40);

    let _ = writeln!(out, "{} {} {}", request.method, request.uri, request.version);
    for header in &request.headers {
        let _ = writeln!(out, "{}: {}", header.name, header.value);
    }

    out
}
