use crate::cursor::ByteCursor;
use crate::error::{ErrorKind, ParseError};
use crate::sink::{EventSink, SinkResult};
use crate::state::{Capture, ParserState, State};
use crate::types::{BodyMode, HttpVersion, MessageHead, lists_chunked};

/// Longest version token accepted (`HTTP/1.1`).
const MAX_VERSION_LEN: usize = 8;

/// Feed one delivered chunk into a connection's parser state.
///
/// Every recognized token is reported to `sink` before this returns, in the
/// order its bytes appear. Tokens split across calls are resumed from
/// `state` on the next call. On success the whole chunk is consumed and its
/// length is returned.
///
/// # Errors
///
/// Returns [`ParseError`] on a protocol violation, a limit breach, or a sink
/// rejection. The state is then poisoned: later calls fail with
/// [`ErrorKind::Poisoned`] until [`ParserState::reset`].
pub fn feed<S: EventSink + ?Sized>(
    state: &mut ParserState,
    bytes: &[u8],
    sink: &mut S,
) -> Result<usize, ParseError> {
    if state.state == State::Dead {
        return Err(ParseError::new(ErrorKind::Poisoned, state.position));
    }

    let mut cursor = ByteCursor::new(bytes, state.position);
    let result = run(state, &mut cursor, sink);
    state.position = cursor.offset();

    match result {
        Ok(()) => Ok(cursor.consumed()),
        Err(err) => {
            state.poison();
            Err(err)
        }
    }
}

fn run<S: EventSink + ?Sized>(
    st: &mut ParserState,
    cur: &mut ByteCursor<'_>,
    sink: &mut S,
) -> Result<(), ParseError> {
    loop {
        // ----- Span paths: forward runs of bytes without copying -----
        match st.state {
            State::Url => {
                let start = cur.offset();
                let span = cur.take_while(is_url_byte);
                if !span.is_empty() {
                    emit_span(st, span, start, |s| sink.on_url(s))?;
                }
            }
            State::HeaderName => {
                let start = cur.offset();
                let span = cur.take_while(is_tchar);
                if !span.is_empty() {
                    emit_span(st, span, start, |s| sink.on_header_field(s))?;
                    st.token.extend_from_slice(span);
                }
            }
            State::HeaderValue => {
                let start = cur.offset();
                let span = cur.take_while(is_field_content_byte);
                if !span.is_empty() {
                    value_span(st, span, start, sink)?;
                }
            }
            State::Body => {
                let start = cur.offset();
                let span = cur.take_up_to(st.remaining);
                if !span.is_empty() {
                    st.remaining -= span.len() as u64;
                    emit(sink.on_body(span), start)?;
                }
                if st.remaining == 0 {
                    complete_message(st, cur.offset(), sink)?;
                }
                if cur.is_empty() {
                    return Ok(());
                }
                continue;
            }
            State::ChunkData => {
                let start = cur.offset();
                let span = cur.take_up_to(st.remaining);
                if !span.is_empty() {
                    st.remaining -= span.len() as u64;
                    emit(sink.on_body(span), start)?;
                }
                if st.remaining == 0 {
                    st.state = State::ChunkDataCr;
                }
                if cur.is_empty() {
                    return Ok(());
                }
                continue;
            }
            _ => {}
        }

        // ----- Byte-by-byte path -----
        let Some(byte) = cur.peek() else {
            return Ok(());
        };
        let at = cur.offset();
        if step(st, byte, at, sink)? {
            cur.advance();
        }
    }
}

/// Handle one byte. Returns `false` when the byte only switched state and
/// must be looked at again in the new state.
fn step<S: EventSink + ?Sized>(
    st: &mut ParserState,
    byte: u8,
    at: u64,
    sink: &mut S,
) -> Result<bool, ParseError> {
    match st.state {
        // ===================== BETWEEN MESSAGES =====================
        State::Start | State::MessageDone => {
            if byte == b'\r' || byte == b'\n' {
                // Stray line ends between pipelined messages are tolerated.
                return Ok(true);
            }
            if !is_tchar(byte) {
                return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
            }
            st.begin_message();
            st.state = State::Method;
            emit(sink.on_message_begin(), at)?;
            Ok(false)
        }

        // ===================== REQUEST LINE =====================
        State::Method => {
            if is_tchar(byte) {
                if st.token.len() >= st.config.max_method_len {
                    return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
                }
                charge(st, 1, at)?;
                st.token.push(byte);
            } else if byte == b' ' {
                charge(st, 1, at)?;
                emit(sink.on_method(&st.token), at)?;
                st.token.clear();
                st.state = State::UrlStart;
            } else {
                return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
            }
            Ok(true)
        }

        State::UrlStart => {
            if !is_url_byte(byte) {
                return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
            }
            st.state = State::Url;
            Ok(false)
        }

        State::Url => {
            if byte != b' ' {
                return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
            }
            charge(st, 1, at)?;
            st.state = State::Version;
            Ok(true)
        }

        State::Version => {
            if byte == b'\r' {
                let version = HttpVersion::from_bytes(&st.token)
                    .ok_or_else(|| ParseError::new(ErrorKind::MalformedRequestLine, at))?;
                st.version = Some(version);
                st.token.clear();
                st.state = State::RequestLineLf;
            } else if byte.is_ascii_graphic() && st.token.len() < MAX_VERSION_LEN {
                charge(st, 1, at)?;
                st.token.push(byte);
            } else {
                return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
            }
            Ok(true)
        }

        State::RequestLineLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedRequestLine, at));
            }
            st.line_len = 0;
            st.state = State::HeaderLineStart;
            Ok(true)
        }

        // ===================== HEADERS =====================
        State::HeaderLineStart => {
            if byte == b'\r' {
                finish_capture(st, at)?;
                st.state = State::HeadersDoneLf;
                Ok(true)
            } else if byte == b' ' || byte == b'\t' {
                // obs-fold: this line continues the previous header's value.
                if st.header_count == 0 {
                    return Err(ParseError::new(ErrorKind::MalformedHeader, at));
                }
                charge(st, 1, at)?;
                st.continuation = true;
                st.state = State::HeaderValueOws;
                Ok(true)
            } else if is_tchar(byte) {
                finish_capture(st, at)?;
                if st.header_count >= st.config.max_headers_count {
                    return Err(ParseError::new(ErrorKind::TooManyHeaders, at));
                }
                st.header_count += 1;
                st.line_len = 0;
                st.token.clear();
                st.value_started = false;
                st.state = State::HeaderName;
                Ok(false)
            } else {
                Err(ParseError::new(ErrorKind::MalformedHeader, at))
            }
        }

        State::HeaderName => {
            if byte != b':' {
                return Err(ParseError::new(ErrorKind::MalformedHeader, at));
            }
            charge(st, 1, at)?;
            st.capture = classify_header(&st.token);
            st.token.clear();
            st.state = State::HeaderValueOws;
            Ok(true)
        }

        State::HeaderValueOws => {
            if byte == b' ' || byte == b'\t' {
                charge(st, 1, at)?;
                Ok(true)
            } else if byte == b'\r' {
                // An empty value is still reported, so a following field is
                // never mistaken for the rest of this field's name.
                if !st.continuation && !st.value_started {
                    emit(sink.on_header_value(b""), at)?;
                }
                st.continuation = false;
                st.state = State::HeaderLineLf;
                Ok(true)
            } else if is_field_content_byte(byte) {
                if st.continuation && st.value_started {
                    emit(sink.on_header_value(b" "), at)?;
                    if st.capture != Capture::Ignored {
                        st.captured.push(b' ');
                    }
                }
                st.continuation = false;
                st.state = State::HeaderValue;
                Ok(false)
            } else {
                Err(ParseError::new(ErrorKind::MalformedHeader, at))
            }
        }

        State::HeaderValue => {
            if byte != b'\r' {
                return Err(ParseError::new(ErrorKind::MalformedHeader, at));
            }
            // Trailing OWS held back in `token` is not part of the value.
            st.token.clear();
            st.state = State::HeaderLineLf;
            Ok(true)
        }

        State::HeaderLineLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedHeader, at));
            }
            // `line_len` keeps running: a folded continuation is charged to
            // the same field. It is reset when the next field starts.
            st.state = State::HeaderLineStart;
            Ok(true)
        }

        // ===================== END OF HEADERS =====================
        State::HeadersDoneLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedHeader, at));
            }
            complete_headers(st, at, sink)?;
            Ok(true)
        }

        // ===================== CHUNKED ENCODING =====================
        State::ChunkSize => {
            if let Some(digit) = hex_value(byte) {
                st.remaining = st
                    .remaining
                    .checked_mul(16)
                    .and_then(|v| v.checked_add(u64::from(digit)))
                    .ok_or_else(|| ParseError::new(ErrorKind::InvalidChunkSize, at))?;
                st.chunk_size_digits += 1;
                charge(st, 1, at)?;
            } else if st.chunk_size_digits == 0 {
                return Err(ParseError::new(ErrorKind::InvalidChunkSize, at));
            } else if byte == b'\r' {
                st.state = State::ChunkSizeLf;
            } else if matches!(byte, b';' | b' ' | b'\t') {
                // Chunk extensions (and BWS before them) are ignored.
                charge(st, 1, at)?;
                st.state = State::ChunkExt;
            } else {
                return Err(ParseError::new(ErrorKind::InvalidChunkSize, at));
            }
            Ok(true)
        }

        State::ChunkExt => {
            if byte == b'\r' {
                st.state = State::ChunkSizeLf;
            } else {
                charge(st, 1, at)?;
            }
            Ok(true)
        }

        State::ChunkSizeLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedChunk, at));
            }
            st.line_len = 0;
            st.state = if st.remaining == 0 {
                State::TrailerLineStart
            } else {
                State::ChunkData
            };
            emit(sink.on_chunk_header(st.remaining), at)?;
            Ok(true)
        }

        State::ChunkDataCr => {
            if byte != b'\r' {
                return Err(ParseError::new(ErrorKind::MalformedChunk, at));
            }
            st.state = State::ChunkDataLf;
            Ok(true)
        }

        State::ChunkDataLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedChunk, at));
            }
            st.chunk_size_digits = 0;
            st.remaining = 0;
            st.state = State::ChunkSize;
            Ok(true)
        }

        // ===================== TRAILER SECTION =====================
        State::TrailerLineStart => {
            match byte {
                b'\r' => st.state = State::TrailerEndLf,
                b'\n' => return Err(ParseError::new(ErrorKind::MalformedChunk, at)),
                _ => {
                    charge(st, 1, at)?;
                    st.state = State::TrailerLine;
                }
            }
            Ok(true)
        }

        State::TrailerLine => {
            match byte {
                b'\r' => st.state = State::TrailerLineLf,
                b'\n' => return Err(ParseError::new(ErrorKind::MalformedChunk, at)),
                _ => charge(st, 1, at)?,
            }
            Ok(true)
        }

        State::TrailerLineLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedChunk, at));
            }
            st.line_len = 0;
            st.state = State::TrailerLineStart;
            Ok(true)
        }

        State::TrailerEndLf => {
            if byte != b'\n' {
                return Err(ParseError::new(ErrorKind::MalformedChunk, at));
            }
            emit(sink.on_chunk_complete(), at)?;
            complete_message(st, at, sink)?;
            Ok(true)
        }

        State::Dead => Err(ParseError::new(ErrorKind::Poisoned, at)),

        // The span paths consume every byte these states accept.
        State::Body | State::ChunkData => unreachable!("span states are handled in run"),
    }
}

// ---------------------------------------------------------------------------
// Message milestones
// ---------------------------------------------------------------------------

/// Decide the body framing and report the end of the header section.
fn complete_headers<S: EventSink + ?Sized>(
    st: &mut ParserState,
    at: u64,
    sink: &mut S,
) -> Result<(), ParseError> {
    let version = st
        .version
        .ok_or_else(|| ParseError::new(ErrorKind::MalformedRequestLine, at))?;

    // Transfer-Encoding takes precedence over Content-Length (RFC 9112 §6.1).
    let mode = if st.chunked {
        BodyMode::Chunked
    } else {
        st.content_length.map_or(BodyMode::None, BodyMode::Fixed)
    };

    st.body_mode = Some(mode);
    st.headers_complete = true;
    st.line_len = 0;
    emit(
        sink.on_headers_complete(&MessageHead {
            version,
            body: mode,
        }),
        at,
    )?;

    match mode {
        BodyMode::None | BodyMode::Fixed(0) => complete_message(st, at, sink),
        BodyMode::Fixed(length) => {
            st.remaining = length;
            st.state = State::Body;
            Ok(())
        }
        BodyMode::Chunked => {
            st.remaining = 0;
            st.chunk_size_digits = 0;
            st.state = State::ChunkSize;
            Ok(())
        }
    }
}

fn complete_message<S: EventSink + ?Sized>(
    st: &mut ParserState,
    at: u64,
    sink: &mut S,
) -> Result<(), ParseError> {
    st.message_complete = true;
    st.state = State::MessageDone;
    emit(sink.on_message_complete(), at)
}

/// Apply the value of a framing header once its line (and any folded
/// continuation) has ended.
fn finish_capture(st: &mut ParserState, at: u64) -> Result<(), ParseError> {
    match st.capture {
        Capture::Ignored => {}
        Capture::ContentLength => {
            let length = parse_content_length(&st.captured)
                .ok_or_else(|| ParseError::new(ErrorKind::InvalidContentLength, at))?;
            // RFC 9112 §6.3: differing Content-Length values are an error.
            if st.content_length.is_some_and(|prev| prev != length) {
                return Err(ParseError::new(ErrorKind::InvalidContentLength, at));
            }
            st.content_length = Some(length);
        }
        Capture::TransferEncoding => {
            if lists_chunked(&st.captured) {
                st.chunked = true;
            }
        }
    }
    st.capture = Capture::Ignored;
    st.captured.clear();
    Ok(())
}

// ---------------------------------------------------------------------------
// Emission helpers
// ---------------------------------------------------------------------------

fn emit(result: SinkResult, at: u64) -> Result<(), ParseError> {
    result.map_err(|e| ParseError::new(ErrorKind::SinkRejected(e.reason), at))
}

/// Count `n` bytes against the current line's length limit.
fn charge(st: &mut ParserState, n: usize, at: u64) -> Result<(), ParseError> {
    let len = st.line_len.saturating_add(n);
    if len > st.config.max_line_len {
        return Err(ParseError::new(ErrorKind::HeaderTooLong, at));
    }
    st.line_len = len;
    Ok(())
}

/// Forward a span that counts against the line limit. The part that fits is
/// still delivered before the limit error, so the events seen before a
/// failure do not depend on chunking.
fn emit_span(
    st: &mut ParserState,
    span: &[u8],
    start: u64,
    deliver: impl FnOnce(&[u8]) -> SinkResult,
) -> Result<(), ParseError> {
    let allowed = st.config.max_line_len.saturating_sub(st.line_len);
    if span.len() > allowed {
        if allowed > 0 {
            emit(deliver(&span[..allowed]), start)?;
        }
        return Err(ParseError::new(
            ErrorKind::HeaderTooLong,
            start + allowed as u64,
        ));
    }
    st.line_len += span.len();
    emit(deliver(span), start)
}

/// Forward header-value bytes, holding back trailing whitespace until a
/// later byte shows it is interior.
fn value_span<S: EventSink + ?Sized>(
    st: &mut ParserState,
    span: &[u8],
    start: u64,
    sink: &mut S,
) -> Result<(), ParseError> {
    let allowed = st.config.max_line_len.saturating_sub(st.line_len);
    if span.len() > allowed {
        if allowed > 0 {
            value_span(st, &span[..allowed], start, sink)?;
        }
        return Err(ParseError::new(
            ErrorKind::HeaderTooLong,
            start + allowed as u64,
        ));
    }
    st.line_len += span.len();

    let Some(last) = span.iter().rposition(|&b| !is_ows(b)) else {
        st.token.extend_from_slice(span);
        return Ok(());
    };

    if !st.token.is_empty() {
        emit(sink.on_header_value(&st.token), start)?;
        if st.capture != Capture::Ignored {
            st.captured.extend_from_slice(&st.token);
        }
        st.token.clear();
    }

    let content = &span[..=last];
    emit(sink.on_header_value(content), start)?;
    if st.capture != Capture::Ignored {
        st.captured.extend_from_slice(content);
    }
    st.token.extend_from_slice(&span[last + 1..]);
    st.value_started = true;
    Ok(())
}

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

fn classify_header(name: &[u8]) -> Capture {
    if name.eq_ignore_ascii_case(b"content-length") {
        Capture::ContentLength
    } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
        Capture::TransferEncoding
    } else {
        Capture::Ignored
    }
}

/// Parse a decimal `Content-Length`, rejecting signs, empty values and
/// anything that does not fit in a `u64`.
fn parse_content_length(value: &[u8]) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    value.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Character classification helpers (RFC 9110 / RFC 9112)
// ---------------------------------------------------------------------------

/// `tchar` – characters allowed in HTTP tokens (method, header names).
///
/// ```text
/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
/// ```
#[inline]
fn is_tchar(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#'
            | b'$'
            | b'%'
            | b'&'
            | b'\''
            | b'*'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~'
            | b'0'..=b'9'
            | b'a'..=b'z'
            | b'A'..=b'Z'
    )
}

/// Request-target bytes: anything visible, including obs-text.
#[inline]
fn is_url_byte(b: u8) -> bool {
    b > b' ' && b != 0x7F
}

/// Bytes permitted inside a header field value:
/// `SP / HTAB / VCHAR / obs-text`.
#[inline]
fn is_field_content_byte(b: u8) -> bool {
    b == b' ' || b == b'\t' || (0x21..=0x7E).contains(&b) || b >= 0x80
}

#[inline]
fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
