use wirefeed::{
    AssemblerLimits, ErrorKind, HttpMethod, HttpVersion, ParserConfig, ParserState,
    RequestAssembler, feed, format_debug, format_headers_only, format_json, parse_request,
    parse_request_with_config, parse_requests,
};

// =========================================================================
// Request-line parsing
// =========================================================================

#[test]
fn simple_get_request() {
    let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.method, HttpMethod::GET);
    assert_eq!(req.uri, "/");
    assert_eq!(req.version, HttpVersion::Http11);
    assert_eq!(req.headers.len(), 1);
    assert_eq!(req.headers[0].name, "Host");
    assert_eq!(req.headers[0].value, "example.com");
    assert!(req.body.is_none());
}

#[test]
fn get_with_query_string() {
    let raw =
        b"GET /api/users?page=1&limit=10 HTTP/1.1\r\nHost: api.example.com\r\nAccept: application/json\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.uri, "/api/users?page=1&limit=10");
    assert_eq!(req.header_value("Accept"), Some("application/json"));
}

#[test]
fn http_10_version() {
    let raw = b"GET /legacy HTTP/1.0\r\nHost: old.example.com\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.version, HttpVersion::Http10);
}

#[test]
fn all_standard_methods() {
    let methods = [
        ("GET", HttpMethod::GET),
        ("HEAD", HttpMethod::HEAD),
        ("POST", HttpMethod::POST),
        ("PUT", HttpMethod::PUT),
        ("DELETE", HttpMethod::DELETE),
        ("CONNECT", HttpMethod::CONNECT),
        ("OPTIONS", HttpMethod::OPTIONS),
        ("TRACE", HttpMethod::TRACE),
        ("PATCH", HttpMethod::PATCH),
    ];

    for (name, expected) in methods {
        let raw = format!("{name} / HTTP/1.1\r\nHost: h\r\n\r\n");
        let req = parse_request(raw.as_bytes()).unwrap_or_else(|e| panic!("method {name}: {e}"));
        assert_eq!(req.method, expected, "mismatch for method {name}");
    }
}

#[test]
fn extension_method_is_kept_verbatim() {
    let raw = b"FOOBAR / HTTP/1.1\r\nHost: h\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.method, HttpMethod::Extension("FOOBAR".into()));
    assert_eq!(req.method.as_str(), "FOOBAR");
}

#[test]
fn options_asterisk_uri() {
    let raw = b"OPTIONS * HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.uri, "*");
}

// =========================================================================
// Header parsing
// =========================================================================

#[test]
fn multiple_headers() {
    let raw = b"GET / HTTP/1.1\r\n\
        Host: example.com\r\n\
        Accept: text/html\r\n\
        Accept-Language: en-US\r\n\
        User-Agent: wirefeed/1.0\r\n\
        Connection: keep-alive\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.headers.len(), 5);
    assert_eq!(req.header_value("Host"), Some("example.com"));
    assert_eq!(req.header_value("Accept"), Some("text/html"));
    assert_eq!(req.header_value("User-Agent"), Some("wirefeed/1.0"));
}

#[test]
fn header_value_with_interior_spaces() {
    let raw = b"GET / HTTP/1.1\r\nX-Custom: hello   world\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.header_value("X-Custom"), Some("hello   world"));
}

#[test]
fn empty_header_value() {
    let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\nX-Empty:\r\nAccept: */*\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.header_value("X-Empty"), Some(""));
    assert_eq!(req.header_value("Accept"), Some("*/*"));
    assert_eq!(req.headers.len(), 3);
}

#[test]
fn folded_header_is_joined() {
    let raw = b"GET / HTTP/1.1\r\nX-Long: part one\r\n\tpart two\r\nHost: h\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.header_value("X-Long"), Some("part one part two"));
    assert_eq!(req.headers.len(), 2);
}

#[test]
fn case_insensitive_header_lookup() {
    let raw = b"GET / HTTP/1.1\r\nhost: example.com\r\ncontent-type: text/plain\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.header_value("Host"), Some("example.com"));
    assert_eq!(req.header_value("CONTENT-TYPE"), Some("text/plain"));
}

#[test]
fn duplicate_header_values() {
    let raw = b"GET / HTTP/1.1\r\nHost: h\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.header_values("Set-Cookie"), vec!["a=1", "b=2"]);
}

// =========================================================================
// Body parsing (Content-Length)
// =========================================================================

#[test]
fn post_with_content_length_body() {
    let body = "name=John&age=30";
    let raw = format!(
        "POST /submit HTTP/1.1\r\n\
         Host: example.com\r\n\
         Content-Length: {}\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\r\n\
         {}",
        body.len(),
        body
    );
    let req = parse_request(raw.as_bytes()).expect("should parse");
    assert_eq!(req.method, HttpMethod::POST);
    assert_eq!(req.uri, "/submit");
    assert_eq!(req.body_as_str(), Some(body));
    assert_eq!(req.content_length(), Some(16));
}

#[test]
fn content_length_zero_yields_no_body() {
    let raw = b"POST /empty HTTP/1.1\r\nHost: h\r\nContent-Length: 0\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert!(req.body.is_none());
}

// =========================================================================
// Chunked transfer encoding
// =========================================================================

#[test]
fn chunked_body_two_chunks() {
    let raw = b"POST /upload HTTP/1.1\r\n\
        Host: example.com\r\n\
        Transfer-Encoding: chunked\r\n\r\n\
        5\r\nHello\r\n6\r\n World\r\n0\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.body_as_str(), Some("Hello World"));
    assert!(req.is_chunked());
}

#[test]
fn chunked_empty_body_zero_only() {
    let raw = b"POST / HTTP/1.1\r\n\
        Host: h\r\n\
        Transfer-Encoding: chunked\r\n\r\n\
        0\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert!(req.body.is_none());
    assert!(req.is_chunked());
}

#[test]
fn chunked_with_trailer_fields() {
    let raw = b"POST / HTTP/1.1\r\n\
        Host: h\r\n\
        Transfer-Encoding: chunked\r\n\r\n\
        3\r\nabc\r\n0\r\n\
        Trailer-Field: value\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.body_as_str(), Some("abc"));
    assert_eq!(req.header_value("Trailer-Field"), None);
}

// =========================================================================
// Incremental (streaming) parsing
// =========================================================================

#[test]
fn incremental_byte_by_byte() {
    let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::new();

    for &byte in &raw[..raw.len() - 1] {
        feed(&mut state, &[byte], &mut assembler).expect("each byte should be ok");
        assert_eq!(assembler.pending(), 0);
    }

    feed(&mut state, &raw[raw.len() - 1..], &mut assembler).expect("last byte");
    let req = assembler.pop_request().expect("request completed");
    assert_eq!(req.method, HttpMethod::GET);
    assert_eq!(req.header_value("Host"), Some("example.com"));
}

#[test]
fn incremental_multi_chunk_with_body() {
    let parts: [&[u8]; 4] = [
        b"POST /path HTTP/1.1\r\n",
        b"Host: example.com\r\n",
        b"Content-Length: 5\r\n\r\n",
        b"Hello",
    ];

    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::new();
    for part in &parts[..3] {
        assert_eq!(feed(&mut state, part, &mut assembler).unwrap(), part.len());
        assert_eq!(assembler.pending(), 0);
    }
    feed(&mut state, parts[3], &mut assembler).unwrap();

    let req = assembler.pop_request().unwrap();
    assert_eq!(req.uri, "/path");
    assert_eq!(req.body_as_str(), Some("Hello"));
}

#[test]
fn incremental_chunked_body() {
    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::new();

    feed(
        &mut state,
        b"POST / HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n",
        &mut assembler,
    )
    .unwrap();
    feed(&mut state, b"3\r\nabc\r\n", &mut assembler).unwrap();
    assert_eq!(assembler.pending(), 0);
    feed(&mut state, b"0\r\n\r\n", &mut assembler).unwrap();

    assert_eq!(assembler.pop_request().unwrap().body_as_str(), Some("abc"));
}

// =========================================================================
// Pipelining
// =========================================================================

#[test]
fn pipelined_requests_come_out_in_order() {
    let raw = b"GET /a HTTP/1.1\r\nHost: h\r\n\r\n\
        POST /b HTTP/1.1\r\nHost: h\r\nContent-Length: 2\r\n\r\nOK\
        GET /c HTTP/1.0\r\n\r\n";
    let reqs = parse_requests(raw).expect("should parse");
    let uris: Vec<_> = reqs.iter().map(|r| r.uri.as_str()).collect();
    assert_eq!(uris, ["/a", "/b", "/c"]);
    assert_eq!(reqs[1].body_as_str(), Some("OK"));
    assert!(reqs[0].body.is_none());
    assert_eq!(reqs[2].version, HttpVersion::Http10);
}

#[test]
fn parse_request_returns_the_first_request() {
    let raw = b"GET /first HTTP/1.1\r\n\r\nGET /second HTTP/1.1\r\n\r\n";
    assert_eq!(parse_request(raw).unwrap().uri, "/first");
}

#[test]
fn state_reset_and_reuse() {
    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::new();

    assert!(feed(&mut state, b"GET /a HTTP/1.1\r\nBad Header\r\n", &mut assembler).is_err());
    state.reset();

    let raw = b"POST /b HTTP/1.1\r\nHost: h\r\nContent-Length: 2\r\n\r\nOK";
    feed(&mut state, raw, &mut assembler).unwrap();

    let req = assembler.pop_request().unwrap();
    assert_eq!(req.method, HttpMethod::POST);
    assert_eq!(req.uri, "/b");
    assert_eq!(req.body_as_str(), Some("OK"));
}

// =========================================================================
// Error conditions
// =========================================================================

#[test]
fn error_empty_method() {
    let err = parse_request(b" / HTTP/1.1\r\nHost: h\r\n\r\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedRequestLine);
    assert_eq!(err.offset, 0);
}

#[test]
fn error_invalid_version() {
    let err = parse_request(b"GET / HTTP/2.0\r\nHost: h\r\n\r\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedRequestLine);
}

#[test]
fn error_incomplete_request_no_end() {
    let raw = b"GET / HTTP/1.1\r\nHost: h\r\n";
    let err = parse_request(raw).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedEndOfMessage);
    assert_eq!(err.offset, raw.len() as u64);
}

#[test]
fn error_incomplete_body() {
    let raw = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 100\r\n\r\nshort";
    let err = parse_request(raw).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedEndOfMessage);
}

#[test]
fn error_empty_input() {
    let err = parse_request(b"").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedEndOfMessage);
}

#[test]
fn error_non_numeric_content_length() {
    let raw = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: abc\r\n\r\n";
    assert_eq!(parse_request(raw).unwrap_err().kind, ErrorKind::InvalidContentLength);
}

// =========================================================================
// Configuration limits
// =========================================================================

#[test]
fn config_max_line_len_enforced() {
    let config = ParserConfig {
        max_line_len: 12,
        ..ParserConfig::default()
    };
    let raw = b"GET / HTTP/1.1\r\nHost: very-long-value\r\n\r\n";
    let err = parse_request_with_config(raw, config).unwrap_err();
    assert_eq!(err.kind, ErrorKind::HeaderTooLong);
}

#[test]
fn assembler_max_body_size_enforced() {
    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::with_limits(AssemblerLimits {
        max_body_size: 5,
        ..AssemblerLimits::default()
    });
    let raw = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 10\r\n\r\n0123456789";
    let err = feed(&mut state, raw, &mut assembler).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SinkRejected(_)));
}

#[test]
fn assembler_chunked_body_too_large() {
    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::with_limits(AssemblerLimits {
        max_body_size: 3,
        ..AssemblerLimits::default()
    });
    let raw = b"POST / HTTP/1.1\r\n\
        Host: h\r\n\
        Transfer-Encoding: chunked\r\n\r\n\
        5\r\nHello\r\n0\r\n\r\n";
    assert!(feed(&mut state, raw, &mut assembler).is_err());
    assert!(state.is_poisoned());
}

#[test]
fn assembler_max_uri_len_enforced() {
    let mut state = ParserState::new();
    let mut assembler = RequestAssembler::with_limits(AssemblerLimits {
        max_uri_len: 5,
        ..AssemblerLimits::default()
    });
    let raw = b"GET /very-long-uri HTTP/1.1\r\nHost: h\r\n\r\n";
    let err = feed(&mut state, raw, &mut assembler).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SinkRejected(_)));
}

// =========================================================================
// HttpRequest helper methods
// =========================================================================

#[test]
fn body_as_lossy_string() {
    let raw = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 3\r\n\r\nabc";
    let req = parse_request(raw).unwrap();
    assert_eq!(req.body_as_lossy_string(), Some("abc".to_string()));
}

#[test]
fn body_bytes_accessor() {
    let raw = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 3\r\n\r\nXYZ";
    let req = parse_request(raw).unwrap();
    assert_eq!(req.body_bytes(), Some(b"XYZ".as_slice()));
}

#[test]
fn is_not_chunked_without_header() {
    let req = parse_request(b"GET / HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
    assert!(!req.is_chunked());
    assert_eq!(req.content_length(), None);
}

// =========================================================================
// Output formatting
// =========================================================================

#[test]
fn json_output_compact() {
    let req = parse_request(b"GET / HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
    let json = format_json(&req, false);
    assert!(json.contains("\"method\":\"GET\""));
    assert!(json.contains("\"uri\":\"/\""));
    assert!(json.contains("\"version\":\"HTTP/1.1\""));
    assert!(json.contains("\"body\":null"));
}

#[test]
fn json_output_with_body() {
    let raw = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 4\r\n\r\ndata";
    let req = parse_request(raw).unwrap();
    assert!(format_json(&req, false).contains("\"body\":\"data\""));
}

#[test]
fn debug_output_contains_sections() {
    let req = parse_request(b"GET /test HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
    let dbg = format_debug(&req);
    assert!(dbg.contains("=== GET /test ==="));
    assert!(dbg.contains("Version: HTTP/1.1"));
    assert!(dbg.contains("Headers: 1"));
    assert!(dbg.contains("  Host: h"));
    assert!(dbg.contains("Body: none"));
}

#[test]
fn debug_output_with_body() {
    let raw = b"POST /x HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi";
    let dbg = format_debug(&parse_request(raw).unwrap());
    assert!(dbg.contains("Body: 2 bytes\nhi\n"));
}

#[test]
fn headers_only_output() {
    let raw = b"GET /path HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";
    let out = format_headers_only(&parse_request(raw).unwrap());
    assert!(out.starts_with("GET /path HTTP/1.1\n"));
    assert!(out.contains("Host: example.com\n"));
    assert!(out.contains("Accept: */*\n"));
}

// =========================================================================
// Edge cases
// =========================================================================

#[test]
fn large_body_content_length() {
    let body = "X".repeat(100_000);
    let raw = format!(
        "POST / HTTP/1.1\r\n\
         Host: h\r\n\
         Content-Length: {}\r\n\r\n\
         {}",
        body.len(),
        body
    );
    let req = parse_request(raw.as_bytes()).unwrap();
    assert_eq!(req.body_as_str(), Some(body.as_str()));
}

#[test]
fn many_headers_within_limit() {
    let mut raw = String::from("GET / HTTP/1.1\r\n");
    for i in 0..100 {
        raw.push_str(&format!("X-Header-{i}: value-{i}\r\n"));
    }
    raw.push_str("\r\n");

    let req = parse_request(raw.as_bytes()).unwrap();
    assert_eq!(req.headers.len(), 100);
}

#[test]
fn header_with_obs_text_bytes() {
    // obs-text (0x80-0xFF) is allowed in header values.
    let raw = b"GET / HTTP/1.1\r\nHost: h\r\nX-Custom: hello\x80world\r\n\r\n";
    let req = parse_request(raw).unwrap();
    let val = req.header_value("X-Custom").unwrap();
    assert!(val.contains('\u{FFFD}'));
}
