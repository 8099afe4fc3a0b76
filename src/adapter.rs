use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::AdapterConfig;
use crate::engine::feed;
use crate::error::{ConnectionError, DisconnectError, ErrorKind, ParseError};
use crate::sink::{EventSink, Traced};
use crate::state::ParserState;

/// Identifies one connection owned by the socket layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ConnectionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Creates the event sink for a newly accepted connection.
///
/// Any `FnMut(ConnectionId) -> S` closure is a factory.
pub trait SinkFactory {
    type Sink: EventSink;

    fn make_sink(&mut self, id: ConnectionId) -> Self::Sink;
}

impl<S, F> SinkFactory for F
where
    S: EventSink,
    F: FnMut(ConnectionId) -> S,
{
    type Sink = S;

    fn make_sink(&mut self, id: ConnectionId) -> S {
        self(id)
    }
}

struct Connection<S> {
    state: ParserState,
    sink: S,
}

/// Binds parser states to connections and feeds them as bytes arrive.
///
/// # Usage
///
/// ```rust
/// use wirefeed::{AdapterConfig, ConnectionAdapter, ConnectionId, RequestAssembler};
///
/// let mut adapter = ConnectionAdapter::new(AdapterConfig::default(), |_: ConnectionId| RequestAssembler::new());
/// let id = ConnectionId(7);
/// adapter.on_connect(id).unwrap();
///
/// // Whatever the socket delivered; chunk boundaries do not matter.
/// adapter.on_bytes(id, b"GET /a HTTP/1.1\r\nHo").unwrap();
/// adapter.on_bytes(id, b"st: x\r\n\r\n").unwrap();
///
/// let mut assembler = adapter.on_disconnect(id).unwrap();
/// assert_eq!(assembler.pop_request().unwrap().uri, "/a");
/// ```
pub struct ConnectionAdapter<F: SinkFactory> {
    config: AdapterConfig,
    factory: F,
    connections: HashMap<ConnectionId, Connection<F::Sink>>,
}

impl<F: SinkFactory> ConnectionAdapter<F> {
    pub fn new(config: AdapterConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            connections: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Bind a fresh parser state and sink to a newly accepted connection.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::AlreadyConnected`] if `id` is already bound.
    pub fn on_connect(&mut self, id: ConnectionId) -> Result<(), ConnectionError> {
        if self.connections.contains_key(&id) {
            return Err(ConnectionError::AlreadyConnected(id));
        }
        let connection = Connection {
            state: ParserState::with_config(self.config.parser.clone()),
            sink: self.factory.make_sink(id),
        };
        self.connections.insert(id, connection);
        tracing::debug!(conn = %id, "connection bound");
        Ok(())
    }

    /// Parse bytes delivered for `id`.
    ///
    /// `Ok(n)` means the whole chunk was consumed (`n == chunk.len()`) and the
    /// caller may skip `n` bytes. Any error means the chunk was not fully
    /// consumed: the connection is desynchronized and should be closed or
    /// [`reset`](Self::reset). Residue is never dropped silently.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::UnknownConnection`] if `id` is not bound.
    /// - [`ConnectionError::Poisoned`] if an earlier chunk failed.
    /// - [`ConnectionError::Parse`] if this chunk is malformed or the sink
    ///   rejected an event. This is reported once; the connection is poisoned.
    pub fn on_bytes(&mut self, id: ConnectionId, chunk: &[u8]) -> Result<usize, ConnectionError> {
        let debug_events = self.config.debug_events;
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(ConnectionError::UnknownConnection(id))?;

        if conn.state.is_poisoned() {
            return Err(ConnectionError::Poisoned(id));
        }

        let result = if debug_events {
            feed(&mut conn.state, chunk, &mut Traced::new(id, &mut conn.sink))
        } else {
            feed(&mut conn.state, chunk, &mut conn.sink)
        };

        result.map_err(|source| {
            tracing::warn!(
                conn = %id,
                offset = source.offset,
                error = %source.kind,
                "parse failed; connection poisoned"
            );
            ConnectionError::Parse { id, source }
        })
    }

    /// Release the connection's parser state and hand back its sink.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::UnknownConnection`] if `id` is not bound; there is
    ///   no sink to return.
    /// - [`ConnectionError::Parse`] with
    ///   [`ErrorKind::UnexpectedEndOfMessage`] if the peer closed in the middle
    ///   of a message. The state is released either way and the sink comes
    ///   back in [`DisconnectError::sink`].
    pub fn on_disconnect(
        &mut self,
        id: ConnectionId,
    ) -> Result<F::Sink, DisconnectError<F::Sink>> {
        let Some(conn) = self.connections.remove(&id) else {
            return Err(DisconnectError {
                error: ConnectionError::UnknownConnection(id),
                sink: None,
            });
        };

        if let Err(source) = end_of_stream(&conn.state) {
            tracing::warn!(conn = %id, offset = source.offset, "connection closed mid-message");
            return Err(DisconnectError {
                error: ConnectionError::Parse { id, source },
                sink: Some(conn.sink),
            });
        }

        tracing::debug!(conn = %id, bytes = conn.state.position(), "connection released");
        Ok(conn.sink)
    }

    /// Discard the connection's parser state, poisoned or not, and start over
    /// at the beginning of a message. The sink is kept.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::UnknownConnection`] if `id` is not bound.
    pub fn reset(&mut self, id: ConnectionId) -> Result<(), ConnectionError> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(ConnectionError::UnknownConnection(id))?;
        conn.state.reset();
        tracing::debug!(conn = %id, "parser state reset");
        Ok(())
    }

    pub fn state(&self, id: ConnectionId) -> Option<&ParserState> {
        self.connections.get(&id).map(|c| &c.state)
    }

    pub fn sink(&self, id: ConnectionId) -> Option<&F::Sink> {
        self.connections.get(&id).map(|c| &c.sink)
    }

    pub fn sink_mut(&mut self, id: ConnectionId) -> Option<&mut F::Sink> {
        self.connections.get_mut(&id).map(|c| &mut c.sink)
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Check that the stream may end here.
///
/// A poisoned state has already reported its failure and is not reported
/// again.
///
/// # Errors
///
/// [`ErrorKind::UnexpectedEndOfMessage`] if a message has begun but not
/// completed, such as a body cut short of its `Content-Length`.
pub fn end_of_stream(state: &ParserState) -> Result<(), ParseError> {
    if !state.is_poisoned() && state.is_mid_message() {
        return Err(ParseError::new(
            ErrorKind::UnexpectedEndOfMessage,
            state.position(),
        ));
    }
    Ok(())
}
