use serde::{Deserialize, Serialize};

/// Limits that bound the memory one parser state may hold.
///
/// All sizes are in bytes unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum length of the request method token (default: 32).
    pub max_method_len: usize,
    /// Maximum length of any single line: the request line, a header field
    /// (its folded continuation lines included), a chunk-size line or a
    /// trailer line (default: 8 192).
    pub max_line_len: usize,
    /// Maximum number of header fields per message (default: 128).
    pub max_headers_count: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_method_len: 32,
            max_line_len: 8_192,
            max_headers_count: 128,
        }
    }
}

/// Settings for a [`ConnectionAdapter`](crate::ConnectionAdapter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Limits handed to every connection's parser state.
    pub parser: ParserConfig,
    /// Log every parse event at `DEBUG` level.
    pub debug_events: bool,
}

impl AdapterConfig {
    /// Load a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
