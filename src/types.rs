use serde::{Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

/// HTTP request method.
///
/// The engine accepts any token as a method; the standard RFC 9110 methods
/// get their own variant and everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
    Extension(String),
}

impl HttpMethod {
    /// Classify a method token.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            b"GET" => Self::GET,
            b"HEAD" => Self::HEAD,
            b"POST" => Self::POST,
            b"PUT" => Self::PUT,
            b"DELETE" => Self::DELETE,
            b"CONNECT" => Self::CONNECT,
            b"OPTIONS" => Self::OPTIONS,
            b"TRACE" => Self::TRACE,
            b"PATCH" => Self::PATCH,
            other => Self::Extension(String::from_utf8_lossy(other).into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::GET => "GET",
            Self::HEAD => "HEAD",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::CONNECT => "CONNECT",
            Self::OPTIONS => "OPTIONS",
            Self::TRACE => "TRACE",
            Self::PATCH => "PATCH",
            Self::Extension(name) => name,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HttpVersion
// ---------------------------------------------------------------------------

/// HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    Http11,
}

impl HttpVersion {
    /// Parse an HTTP version from a byte slice (e.g. `b"HTTP/1.1"`).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"HTTP/1.0" => Some(Self::Http10),
            b"HTTP/1.1" => Some(Self::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message framing
// ---------------------------------------------------------------------------

/// How the body of a message is delimited, decided when headers complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "length", rename_all = "snake_case")]
pub enum BodyMode {
    /// No body; the message ends with the header section.
    None,
    /// Exactly this many bytes follow (`Content-Length`).
    Fixed(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
}

/// Facts about a message known once its header section is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageHead {
    pub version: HttpVersion,
    pub body: BodyMode,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A single HTTP header field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header field name (original casing preserved).
    pub name: String,
    /// Header field value (OWS trimmed, folded lines joined by one SP).
    pub value: String,
}

// ---------------------------------------------------------------------------
// HttpRequest
// ---------------------------------------------------------------------------

/// A request assembled from the event stream by
/// [`RequestAssembler`](crate::RequestAssembler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// The request target, exactly as sent.
    pub uri: String,
    pub version: HttpVersion,
    pub headers: Vec<Header>,
    /// The request body, `None` when the message carried no body bytes.
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<Vec<u8>>,
}

/// Serialize body bytes as a UTF-8 string (lossy) for JSON output.
fn serialize_body<S: Serializer>(body: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match body {
        None => s.serialize_none(),
        Some(bytes) => s.serialize_str(&String::from_utf8_lossy(bytes)),
    }
}

impl HttpRequest {
    /// Return the body as a UTF-8 `&str` if it is valid UTF-8.
    pub fn body_as_str(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_as_lossy_string(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// The declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header_value("content-length")?.parse().ok()
    }

    /// Look up the first header value by name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Return all values for headers matching `name` (case-insensitive).
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Return `true` if the `Transfer-Encoding` header lists `chunked`.
    pub fn is_chunked(&self) -> bool {
        self.header_values("transfer-encoding")
            .iter()
            .any(|v| lists_chunked(v.as_bytes()))
    }
}

/// Whether a `Transfer-Encoding` value lists the `chunked` coding.
pub(crate) fn lists_chunked(value: &[u8]) -> bool {
    value
        .split(|&b| b == b',')
        .any(|coding| coding.trim_ascii().eq_ignore_ascii_case(b"chunked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_methods_are_kept_verbatim() {
        assert_eq!(HttpMethod::from_bytes(b"GET"), HttpMethod::GET);
        let purge = HttpMethod::from_bytes(b"PURGE");
        assert_eq!(purge, HttpMethod::Extension("PURGE".into()));
        assert_eq!(purge.as_str(), "PURGE");
    }

    #[test]
    fn chunked_coding_detection() {
        assert!(lists_chunked(b"chunked"));
        assert!(lists_chunked(b"gzip, Chunked"));
        assert!(!lists_chunked(b"gzip"));
        assert!(!lists_chunked(b"notchunked"));
    }

    #[test]
    fn body_mode_serializes_with_tag() {
        let json = serde_json::to_string(&BodyMode::Fixed(5)).unwrap();
        assert_eq!(json, r#"{"mode":"fixed","length":5}"#);
        let json = serde_json::to_string(&BodyMode::Chunked).unwrap();
        assert_eq!(json, r#"{"mode":"chunked"}"#);
    }
}
