//! # wirefeed
//!
//! An **incremental, event-driven HTTP/1.x request parser**.
//!
//! Bytes are fed in whatever pieces the socket delivers them; the parser
//! reports the method, URL, header fields and values, body fragments and
//! message boundaries to an [`EventSink`] as soon as they are recognized. A
//! token split across two reads is resumed from the connection's
//! [`ParserState`]; nothing else is buffered. Chunked transfer encoding,
//! pipelined requests and folded headers are supported.
//!
//! ## Quick start: one connection, raw engine
//!
//! ```rust
//! use wirefeed::{feed, Event, EventRecorder, ParserState};
//!
//! let mut state = ParserState::new();
//! let mut events = EventRecorder::new();
//!
//! feed(&mut state, b"GET /foo HT", &mut events).unwrap();
//! feed(&mut state, b"TP/1.1\r\nHost: x\r\n\r\n", &mut events).unwrap();
//!
//! assert_eq!(events.coalesced()[2], Event::Url(b"/foo".to_vec()));
//! assert_eq!(events.coalesced().last(), Some(&Event::MessageComplete));
//! ```
//!
//! ## Quick start: one-shot parsing
//!
//! ```rust
//! use wirefeed::parse_request;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = parse_request(raw).expect("valid request");
//! assert_eq!(request.method.as_str(), "GET");
//! assert_eq!(request.uri, "/hello");
//! ```
//!
//! Servers with many connections use a [`ConnectionAdapter`], which owns one
//! state and one sink per [`ConnectionId`].

mod adapter;
mod assembler;
mod config;
mod cursor;
mod engine;
mod error;
mod output;
mod sink;
mod state;
mod types;

// Re-export public API.
pub use adapter::{ConnectionAdapter, ConnectionId, SinkFactory, end_of_stream};
pub use assembler::{AssemblerLimits, RequestAssembler};
pub use config::{AdapterConfig, ParserConfig};
pub use engine::feed;
pub use error::{ConnectionError, DisconnectError, ErrorKind, ParseError, SinkError};
pub use output::{format_debug, format_events, format_headers_only, format_json};
pub use sink::{Event, EventRecorder, EventSink, SinkResult, Traced};
pub use state::ParserState;
pub use types::{BodyMode, Header, HttpMethod, HttpRequest, HttpVersion, MessageHead};

/// Parse every request in a complete byte stream, including pipelined ones.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, or
/// [`ErrorKind::UnexpectedEndOfMessage`] if it ends mid-message.
pub fn parse_requests(data: &[u8]) -> Result<Vec<HttpRequest>, ParseError> {
    parse_requests_with_config(data, ParserConfig::default())
}

/// [`parse_requests`] with custom [`ParserConfig`] limits.
///
/// # Errors
///
/// As [`parse_requests`], plus limit breaches.
pub fn parse_requests_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<Vec<HttpRequest>, ParseError> {
    let mut state = ParserState::with_config(config);
    let mut assembler = RequestAssembler::new();
    feed(&mut state, data, &mut assembler)?;
    end_of_stream(&state)?;
    Ok(assembler.take_requests())
}

/// Parse the first request of a **complete** byte stream in one call.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, incomplete, or holds no
/// request at all.
pub fn parse_request(data: &[u8]) -> Result<HttpRequest, ParseError> {
    parse_request_with_config(data, ParserConfig::default())
}

/// [`parse_request`] with custom [`ParserConfig`] limits.
///
/// # Errors
///
/// As [`parse_request`], plus limit breaches.
pub fn parse_request_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<HttpRequest, ParseError> {
    parse_requests_with_config(data, config)?
        .into_iter()
        .next()
        .ok_or(ParseError::new(
            ErrorKind::UnexpectedEndOfMessage,
            data.len() as u64,
        ))
}
