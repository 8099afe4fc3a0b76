use std::collections::VecDeque;

use crate::error::SinkError;
use crate::sink::{EventSink, SinkResult};
use crate::types::{Header, HttpMethod, HttpRequest, HttpVersion, MessageHead};

/// Limits the assembler enforces on the requests it builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerLimits {
    /// Maximum length of the request URI (default: 8 192).
    pub max_uri_len: usize,
    /// Maximum body size (default: 10 MiB).
    pub max_body_size: usize,
}

impl Default for AssemblerLimits {
    fn default() -> Self {
        Self {
            max_uri_len: 8_192,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default)]
struct Partial {
    method: Vec<u8>,
    uri: Vec<u8>,
    headers: Vec<(Vec<u8>, Vec<u8>)>,
    /// The last header callback was a value, so the next field is a new header.
    in_value: bool,
    version: Option<HttpVersion>,
    body: Vec<u8>,
}

/// The production sink: builds an owned [`HttpRequest`] per message.
///
/// Completed requests queue up in arrival order, so pipelined requests come
/// out one by one via [`pop_request`](Self::pop_request).
#[derive(Debug, Default)]
pub struct RequestAssembler {
    limits: AssemblerLimits,
    current: Partial,
    completed: VecDeque<HttpRequest>,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::with_limits(AssemblerLimits::default())
    }

    pub fn with_limits(limits: AssemblerLimits) -> Self {
        Self {
            limits,
            current: Partial::default(),
            completed: VecDeque::new(),
        }
    }

    /// Oldest completed request not yet taken.
    pub fn pop_request(&mut self) -> Option<HttpRequest> {
        self.completed.pop_front()
    }

    /// All completed requests, oldest first.
    pub fn take_requests(&mut self) -> Vec<HttpRequest> {
        self.completed.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.completed.len()
    }
}

impl EventSink for RequestAssembler {
    fn on_message_begin(&mut self) -> SinkResult {
        self.current = Partial::default();
        Ok(())
    }

    fn on_method(&mut self, method: &[u8]) -> SinkResult {
        self.current.method = method.to_vec();
        Ok(())
    }

    fn on_url(&mut self, url: &[u8]) -> SinkResult {
        if self.current.uri.len() + url.len() > self.limits.max_uri_len {
            return Err(SinkError::new(format!(
                "request URI exceeds {} bytes",
                self.limits.max_uri_len
            )));
        }
        self.current.uri.extend_from_slice(url);
        Ok(())
    }

    fn on_header_field(&mut self, name: &[u8]) -> SinkResult {
        if self.current.in_value || self.current.headers.is_empty() {
            self.current.headers.push((name.to_vec(), Vec::new()));
        } else if let Some((field, _)) = self.current.headers.last_mut() {
            field.extend_from_slice(name);
        }
        self.current.in_value = false;
        Ok(())
    }

    fn on_header_value(&mut self, value: &[u8]) -> SinkResult {
        let Some((_, current)) = self.current.headers.last_mut() else {
            return Err(SinkError::new("header value without a field name"));
        };
        current.extend_from_slice(value);
        self.current.in_value = true;
        Ok(())
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> SinkResult {
        self.current.version = Some(head.version);
        Ok(())
    }

    fn on_body(&mut self, body: &[u8]) -> SinkResult {
        if self.current.body.len() + body.len() > self.limits.max_body_size {
            return Err(SinkError::new(format!(
                "body exceeds {} bytes",
                self.limits.max_body_size
            )));
        }
        self.current.body.extend_from_slice(body);
        Ok(())
    }

    fn on_message_complete(&mut self) -> SinkResult {
        let partial = std::mem::take(&mut self.current);
        let version = partial
            .version
            .ok_or_else(|| SinkError::new("message completed before its headers"))?;

        let headers = partial
            .headers
            .into_iter()
            .map(|(name, value)| Header {
                name: String::from_utf8_lossy(&name).into_owned(),
                value: String::from_utf8_lossy(&value).into_owned(),
            })
            .collect();

        self.completed.push_back(HttpRequest {
            method: HttpMethod::from_bytes(&partial.method),
            uri: String::from_utf8_lossy(&partial.uri).into_owned(),
            version,
            headers,
            body: (!partial.body.is_empty()).then_some(partial.body),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BodyMode;

    fn head() -> MessageHead {
        MessageHead {
            version: HttpVersion::Http11,
            body: BodyMode::None,
        }
    }

    #[test]
    fn split_field_names_are_joined() {
        let mut asm = RequestAssembler::new();
        asm.on_message_begin().unwrap();
        asm.on_method(b"GET").unwrap();
        asm.on_url(b"/").unwrap();
        asm.on_header_field(b"Ho").unwrap();
        asm.on_header_field(b"st").unwrap();
        asm.on_header_value(b"x").unwrap();
        asm.on_header_field(b"Accept").unwrap();
        asm.on_header_value(b"").unwrap();
        asm.on_headers_complete(&head()).unwrap();
        asm.on_message_complete().unwrap();

        let req = asm.pop_request().unwrap();
        assert_eq!(req.header_value("host"), Some("x"));
        assert_eq!(req.header_value("accept"), Some(""));
        assert_eq!(req.headers.len(), 2);
        assert!(req.body.is_none());
    }

    #[test]
    fn oversized_uri_is_rejected() {
        let mut asm = RequestAssembler::with_limits(AssemblerLimits {
            max_uri_len: 4,
            ..AssemblerLimits::default()
        });
        asm.on_message_begin().unwrap();
        asm.on_url(b"/ab").unwrap();
        assert!(asm.on_url(b"cd").is_err());
    }

    #[test]
    fn value_without_field_is_rejected() {
        let mut asm = RequestAssembler::new();
        asm.on_message_begin().unwrap();
        assert!(asm.on_header_value(b"x").is_err());
    }
}
