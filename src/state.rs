use crate::config::ParserConfig;
use crate::types::{BodyMode, HttpVersion};

/// Position of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    // ---- Between messages ----
    Start,
    MessageDone,

    // ---- Request line ----
    Method,
    UrlStart,
    Url,
    Version,
    RequestLineLf,

    // ---- Header section ----
    HeaderLineStart,
    HeaderName,
    HeaderValueOws,
    HeaderValue,
    HeaderLineLf,
    HeadersDoneLf,

    // ---- Fixed-length body ----
    Body,

    // ---- Chunked transfer encoding ----
    ChunkSize,
    ChunkExt,
    ChunkSizeLf,
    ChunkData,
    ChunkDataCr,
    ChunkDataLf,

    // ---- Chunked trailers ----
    TrailerLineStart,
    TrailerLine,
    TrailerLineLf,
    TrailerEndLf,

    // ---- Failed; only a reset leaves this ----
    Dead,
}

/// The header whose value the engine must see to frame the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capture {
    Ignored,
    ContentLength,
    TransferEncoding,
}

/// Per-connection parser position and carried-over token data.
///
/// A state is created fresh for each connection and handed to
/// [`feed`](crate::feed) with every chunk that arrives on it. The engine
/// keeps nothing between calls; everything needed to resume mid-token
/// lives here.
#[derive(Debug, Clone)]
pub struct ParserState {
    pub(crate) state: State,
    pub(crate) config: ParserConfig,

    /// Absolute stream offset of the next byte to be fed.
    pub(crate) position: u64,

    /// Partial token carried across calls: method, version, header name,
    /// or trailing whitespace held back from a header value.
    pub(crate) token: Vec<u8>,
    /// Value of a framing header (`Content-Length`, `Transfer-Encoding`).
    pub(crate) captured: Vec<u8>,
    pub(crate) capture: Capture,
    /// Bytes seen on the current line, checked against `max_line_len`.
    pub(crate) line_len: usize,
    pub(crate) header_count: usize,
    /// Whether the current header has emitted any value bytes yet.
    pub(crate) value_started: bool,
    /// The current header line is an obs-fold continuation.
    pub(crate) continuation: bool,

    pub(crate) version: Option<HttpVersion>,
    pub(crate) content_length: Option<u64>,
    pub(crate) chunked: bool,
    pub(crate) body_mode: Option<BodyMode>,
    /// Body or chunk bytes still to read.
    pub(crate) remaining: u64,
    pub(crate) chunk_size_digits: usize,

    pub(crate) message_begun: bool,
    pub(crate) headers_complete: bool,
    pub(crate) message_complete: bool,
}

impl ParserState {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            state: State::Start,
            config,
            position: 0,
            token: Vec::with_capacity(16),
            captured: Vec::new(),
            capture: Capture::Ignored,
            line_len: 0,
            header_count: 0,
            value_started: false,
            continuation: false,
            version: None,
            content_length: None,
            chunked: false,
            body_mode: None,
            remaining: 0,
            chunk_size_digits: 0,
            message_begun: false,
            headers_complete: false,
            message_complete: false,
        }
    }

    /// Discard everything, including a poisoned state, keeping the limits.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    /// Clear per-message data when a new message begins.
    pub(crate) fn begin_message(&mut self) {
        self.token.clear();
        self.captured.clear();
        self.capture = Capture::Ignored;
        self.line_len = 0;
        self.header_count = 0;
        self.value_started = false;
        self.continuation = false;
        self.version = None;
        self.content_length = None;
        self.chunked = false;
        self.body_mode = None;
        self.remaining = 0;
        self.chunk_size_digits = 0;
        self.message_begun = true;
        self.headers_complete = false;
        self.message_complete = false;
    }

    pub(crate) fn poison(&mut self) {
        self.state = State::Dead;
        self.token.clear();
        self.captured.clear();
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Bytes fed since the state was created or last reset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// A message has begun and not yet completed.
    pub fn is_mid_message(&self) -> bool {
        self.message_begun && !self.message_complete
    }

    /// The state failed and refuses further input until reset.
    pub fn is_poisoned(&self) -> bool {
        self.state == State::Dead
    }

    /// Body framing of the current message, once its headers are complete.
    pub fn body_mode(&self) -> Option<BodyMode> {
        self.body_mode
    }

    pub fn message_begun(&self) -> bool {
        self.message_begun
    }

    pub fn headers_complete(&self) -> bool {
        self.headers_complete
    }

    pub fn message_complete(&self) -> bool {
        self.message_complete
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}
