use thiserror::Error;

use crate::adapter::ConnectionId;

/// Why a byte stream was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The request line is not a `METHOD SP URL SP VERSION CRLF` triplet.
    #[error("malformed request line")]
    MalformedRequestLine,
    /// A header line is not `name ":" value CRLF`, or a folded line has no
    /// header to continue.
    #[error("malformed header line")]
    MalformedHeader,
    /// `Content-Length` is not a non-negative integer, overflows, or
    /// disagrees with an earlier `Content-Length`.
    #[error("invalid Content-Length")]
    InvalidContentLength,
    /// A chunk-size line is not valid hexadecimal or overflows.
    #[error("invalid chunk size")]
    InvalidChunkSize,
    /// Chunk data is not followed by CRLF, or a trailer line is badly terminated.
    #[error("malformed chunk framing")]
    MalformedChunk,
    /// A request line, header line, chunk-size line or trailer line exceeds
    /// the configured maximum.
    #[error("line exceeds maximum allowed length")]
    HeaderTooLong,
    /// The number of header fields exceeds the configured maximum.
    #[error("number of headers exceeds maximum")]
    TooManyHeaders,
    /// The event sink refused a token.
    #[error("sink rejected event: {0}")]
    SinkRejected(String),
    /// The connection closed before the current message was complete.
    #[error("connection closed before end of message")]
    UnexpectedEndOfMessage,
    /// The parser state already failed and must be reset before reuse.
    #[error("parser state is poisoned by an earlier error")]
    Poisoned,
}

/// A parse failure at a specific byte of the connection's stream.
///
/// `offset` counts bytes from the start of the stream (connect or last
/// reset), so it stays meaningful across chunk boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub offset: u64,
}

impl ParseError {
    pub fn new(kind: ErrorKind, offset: u64) -> Self {
        Self { kind, offset }
    }
}

/// Returned by an [`EventSink`](crate::EventSink) callback to stop parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SinkError {
    pub reason: String,
}

impl SinkError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors reported by [`ConnectionAdapter`](crate::ConnectionAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// No parser state is bound to this connection.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
    /// `on_connect` was called twice for the same connection.
    #[error("connection {0} is already bound")]
    AlreadyConnected(ConnectionId),
    /// An earlier parse failure poisoned the connection; call `reset` first.
    #[error("connection {0} is poisoned by an earlier parse failure")]
    Poisoned(ConnectionId),
    /// The delivered bytes could not be fully consumed.
    #[error("connection {id}: {source}")]
    Parse {
        id: ConnectionId,
        #[source]
        source: ParseError,
    },
}

/// Returned by [`ConnectionAdapter::on_disconnect`](crate::ConnectionAdapter::on_disconnect).
///
/// When the connection existed its sink is handed back even on failure, so
/// requests completed before a truncated one are not lost.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct DisconnectError<S> {
    pub error: ConnectionError,
    pub sink: Option<S>,
}

impl ConnectionError {
    /// The underlying parse error, if this is a parse failure.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
