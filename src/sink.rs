use serde::{Serialize, Serializer};

use crate::adapter::ConnectionId;
use crate::error::SinkError;
use crate::types::MessageHead;

pub type SinkResult = Result<(), SinkError>;

/// Receives parse events from [`feed`](crate::feed) as tokens are recognized.
///
/// Byte-carrying callbacks (`on_url`, `on_header_field`, `on_header_value`,
/// `on_body`) may fire several times for one token when it spans chunk
/// boundaries; the receiver concatenates. Spans borrow the caller's chunk
/// and are only valid for the duration of the call.
///
/// Returning an error stops parsing; the engine reports it as
/// [`ErrorKind::SinkRejected`](crate::ErrorKind::SinkRejected).
#[allow(unused_variables)]
pub trait EventSink {
    /// The first byte of a new request was seen.
    fn on_message_begin(&mut self) -> SinkResult {
        Ok(())
    }

    /// The complete request method token.
    fn on_method(&mut self, method: &[u8]) -> SinkResult {
        Ok(())
    }

    fn on_url(&mut self, url: &[u8]) -> SinkResult {
        Ok(())
    }

    fn on_header_field(&mut self, name: &[u8]) -> SinkResult {
        Ok(())
    }

    /// Part of a header value. Folded continuation lines arrive here too,
    /// preceded by a single `b" "` separator.
    fn on_header_value(&mut self, value: &[u8]) -> SinkResult {
        Ok(())
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> SinkResult {
        Ok(())
    }

    fn on_body(&mut self, body: &[u8]) -> SinkResult {
        Ok(())
    }

    /// A chunk-size line was read. Fires for the terminal zero-size chunk too.
    fn on_chunk_header(&mut self, size: u64) -> SinkResult {
        Ok(())
    }

    /// The terminal chunk and trailer section were read.
    fn on_chunk_complete(&mut self) -> SinkResult {
        Ok(())
    }

    fn on_message_complete(&mut self) -> SinkResult {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_message_begin(&mut self) -> SinkResult {
        (**self).on_message_begin()
    }

    fn on_method(&mut self, method: &[u8]) -> SinkResult {
        (**self).on_method(method)
    }

    fn on_url(&mut self, url: &[u8]) -> SinkResult {
        (**self).on_url(url)
    }

    fn on_header_field(&mut self, name: &[u8]) -> SinkResult {
        (**self).on_header_field(name)
    }

    fn on_header_value(&mut self, value: &[u8]) -> SinkResult {
        (**self).on_header_value(value)
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> SinkResult {
        (**self).on_headers_complete(head)
    }

    fn on_body(&mut self, body: &[u8]) -> SinkResult {
        (**self).on_body(body)
    }

    fn on_chunk_header(&mut self, size: u64) -> SinkResult {
        (**self).on_chunk_header(size)
    }

    fn on_chunk_complete(&mut self) -> SinkResult {
        (**self).on_chunk_complete()
    }

    fn on_message_complete(&mut self) -> SinkResult {
        (**self).on_message_complete()
    }
}

// ---------------------------------------------------------------------------
// Recorded events
// ---------------------------------------------------------------------------

/// An owned copy of one sink callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    MessageBegin,
    Method(#[serde(serialize_with = "lossy")] Vec<u8>),
    Url(#[serde(serialize_with = "lossy")] Vec<u8>),
    HeaderField(#[serde(serialize_with = "lossy")] Vec<u8>),
    HeaderValue(#[serde(serialize_with = "lossy")] Vec<u8>),
    HeadersComplete(MessageHead),
    Body(#[serde(serialize_with = "lossy")] Vec<u8>),
    ChunkHeader(u64),
    ChunkComplete,
    MessageComplete,
}

fn lossy<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}

impl Event {
    /// Append `other` to `self` if both are fragments of the same token kind.
    fn absorb(&mut self, other: &Event) -> bool {
        match (self, other) {
            (Event::Url(a), Event::Url(b))
            | (Event::HeaderField(a), Event::HeaderField(b))
            | (Event::HeaderValue(a), Event::HeaderValue(b))
            | (Event::Body(a), Event::Body(b)) => {
                a.extend_from_slice(b);
                true
            }
            _ => false,
        }
    }
}

/// A sink that records every callback in order.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Vec<Event>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events exactly as the engine emitted them.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Events with adjacent fragments of the same token merged, which makes
    /// the sequence independent of how the input was chunked.
    pub fn coalesced(&self) -> Vec<Event> {
        let mut out: Vec<Event> = Vec::with_capacity(self.events.len());
        for event in &self.events {
            if let Some(last) = out.last_mut()
                && last.absorb(event)
            {
                continue;
            }
            out.push(event.clone());
        }
        out
    }

    /// Every body byte, across all messages and chunks.
    pub fn body(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Body(b) => Some(b.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventRecorder {
    fn on_message_begin(&mut self) -> SinkResult {
        self.events.push(Event::MessageBegin);
        Ok(())
    }

    fn on_method(&mut self, method: &[u8]) -> SinkResult {
        self.events.push(Event::Method(method.to_vec()));
        Ok(())
    }

    fn on_url(&mut self, url: &[u8]) -> SinkResult {
        self.events.push(Event::Url(url.to_vec()));
        Ok(())
    }

    fn on_header_field(&mut self, name: &[u8]) -> SinkResult {
        self.events.push(Event::HeaderField(name.to_vec()));
        Ok(())
    }

    fn on_header_value(&mut self, value: &[u8]) -> SinkResult {
        self.events.push(Event::HeaderValue(value.to_vec()));
        Ok(())
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> SinkResult {
        self.events.push(Event::HeadersComplete(*head));
        Ok(())
    }

    fn on_body(&mut self, body: &[u8]) -> SinkResult {
        self.events.push(Event::Body(body.to_vec()));
        Ok(())
    }

    fn on_chunk_header(&mut self, size: u64) -> SinkResult {
        self.events.push(Event::ChunkHeader(size));
        Ok(())
    }

    fn on_chunk_complete(&mut self) -> SinkResult {
        self.events.push(Event::ChunkComplete);
        Ok(())
    }

    fn on_message_complete(&mut self) -> SinkResult {
        self.events.push(Event::MessageComplete);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Debug tracing
// ---------------------------------------------------------------------------

/// Logs every event at `DEBUG` before forwarding it to the inner sink.
pub struct Traced<S> {
    id: ConnectionId,
    inner: S,
}

impl<S: EventSink> Traced<S> {
    pub fn new(id: ConnectionId, inner: S) -> Self {
        Self { id, inner }
    }
}

impl<S: EventSink> EventSink for Traced<S> {
    fn on_message_begin(&mut self) -> SinkResult {
        tracing::debug!(conn = %self.id, "message begin");
        self.inner.on_message_begin()
    }

    fn on_method(&mut self, method: &[u8]) -> SinkResult {
        tracing::debug!(conn = %self.id, method = %String::from_utf8_lossy(method), "method");
        self.inner.on_method(method)
    }

    fn on_url(&mut self, url: &[u8]) -> SinkResult {
        tracing::debug!(conn = %self.id, url = %String::from_utf8_lossy(url), "url");
        self.inner.on_url(url)
    }

    fn on_header_field(&mut self, name: &[u8]) -> SinkResult {
        tracing::debug!(conn = %self.id, field = %String::from_utf8_lossy(name), "header field");
        self.inner.on_header_field(name)
    }

    fn on_header_value(&mut self, value: &[u8]) -> SinkResult {
        tracing::debug!(conn = %self.id, value = %String::from_utf8_lossy(value), "header value");
        self.inner.on_header_value(value)
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> SinkResult {
        tracing::debug!(conn = %self.id, version = %head.version, body = ?head.body, "headers complete");
        self.inner.on_headers_complete(head)
    }

    fn on_body(&mut self, body: &[u8]) -> SinkResult {
        tracing::debug!(conn = %self.id, len = body.len(), "body");
        self.inner.on_body(body)
    }

    fn on_chunk_header(&mut self, size: u64) -> SinkResult {
        tracing::debug!(conn = %self.id, size, "chunk header");
        self.inner.on_chunk_header(size)
    }

    fn on_chunk_complete(&mut self) -> SinkResult {
        tracing::debug!(conn = %self.id, "chunk complete");
        self.inner.on_chunk_complete()
    }

    fn on_message_complete(&mut self) -> SinkResult {
        tracing::debug!(conn = %self.id, "message complete");
        self.inner.on_message_complete()
    }
}
