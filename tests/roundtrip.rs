//! End-to-end parse -> resolve -> emit round trips, one per concrete
//! scenario in `spec.md` section 8, plus a few of the crate's ten
//! invariants exercised against full messages rather than individual
//! tokens.

use speccraft::{parse_request, parse_response, parse_websocket_frame, Message, Settings};
use speccraft::emitter::{emit, DEFAULT_BLOCK_SIZE};

fn wire_response(spec: &str, settings: &Settings) -> Vec<u8> {
    let msg = parse_response(spec).unwrap();
    let resolved = msg.resolve(settings).unwrap();
    let mut out = Vec::new();
    emit(&resolved, settings, &mut out, DEFAULT_BLOCK_SIZE).unwrap();
    out
}

fn wire_request(spec: &str, settings: &Settings) -> Vec<u8> {
    let msg = parse_request(spec).unwrap();
    let resolved = msg.resolve(settings).unwrap();
    let mut out = Vec::new();
    emit(&resolved, settings, &mut out, DEFAULT_BLOCK_SIZE).unwrap();
    out
}

#[test]
fn plain_400_response() {
    let settings = Settings::new();
    let out = wire_response("400", &settings);
    assert_eq!(out, b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n");
}

#[test]
fn generated_body_has_declared_length() {
    let settings = Settings::new();
    let out = wire_response("200:b@1k,ascii_letters", &settings);
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("Content-Length: 1024"));
    assert_eq!(out.len() - text.find("\r\n\r\n").unwrap() - 4, 1024);
}

#[test]
fn pause_splits_the_body_around_the_offset() {
    let settings = Settings::new();
    let msg = parse_response("200:b'hello':p2,1").unwrap();
    let resolved = msg.resolve(&settings).unwrap();
    let mut out = Vec::new();
    let started = std::time::Instant::now();
    let result = emit(&resolved, &settings, &mut out, DEFAULT_BLOCK_SIZE).unwrap();
    assert!(!result.disconnected);
    assert_eq!(out, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
    // The pause offset (2) is within the preamble/headers, not the body,
    // so "he"/"llo" is a body-relative illustration in spec.md §8, not a
    // literal split point once headers and Content-Length are accounted
    // for; this test only checks the pause actually blocked emission.
    assert!(started.elapsed() >= std::time::Duration::from_secs(1));
}

#[test]
fn inject_does_not_shift_the_content_length_header() {
    let settings = Settings::new();
    let out = wire_response("200:b'abcdef':i3,'XYZ'", &settings);
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("Content-Length: 6"));
    assert_eq!(&out[3..6], b"XYZ");
}

#[test]
fn request_with_header_and_host() {
    let settings = Settings { request_host: Some("example.com".into()), ..Settings::new() };
    let out = wire_request("get:/:h'X'='Y'", &settings);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("GET / HTTP/1.1\r\n"));
    assert!(text.contains("X: Y\r\n"));
    assert!(text.contains("Host: example.com\r\n"));
    assert!(text.contains("Content-Length: 0\r\n"));
}

#[test]
fn websocket_response_handshake_wire_bytes() {
    let settings = Settings {
        websocket_key: Some("dGhlIHNhbXBsZSBub25jZQ==".into()),
        ..Settings::new()
    };
    let out = wire_response("ws", &settings);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(text.contains("Upgrade: websocket\r\n"));
    assert!(text.contains("Connection: Upgrade\r\n"));
    assert!(text.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
    // WS handshakes never carry a synthesized Content-Length.
    assert!(!text.contains("Content-Length"));
}

#[test]
fn websocket_frame_default_preamble_then_body() {
    let settings = Settings::new();
    let msg = parse_websocket_frame("wf:b'ping'").unwrap();
    let resolved = msg.resolve(&settings).unwrap();
    let mut out = Vec::new();
    emit(&resolved, &settings, &mut out, DEFAULT_BLOCK_SIZE).unwrap();
    assert_eq!(&out[..2], &[0x82, 0x00]);
    assert_eq!(&out[2..], b"ping");
}

#[test]
fn raw_mode_emits_user_spec_verbatim() {
    let settings = Settings::new();
    let out = wire_response("200:r:h'X'='Y'", &settings);
    assert_eq!(out, b"HTTP/1.1 200 OK\r\nX: Y\r\n\r\n");
}

#[test]
fn resolve_is_idempotent_end_to_end() {
    let settings = Settings::new();
    let msg = parse_response("200:b'hi'").unwrap();
    let once = msg.resolve(&settings).unwrap();
    let twice = once.resolve(&settings).unwrap();
    assert_eq!(once.spec(), twice.spec());
}

#[test]
fn freeze_removes_randomness_and_is_stable() {
    let settings = Settings::new();
    let msg = parse_response("200:b@256,ascii_letters").unwrap();
    let frozen = msg.freeze(&settings).unwrap();
    let a = wire_bytes_for(&frozen, &settings);
    let b = wire_bytes_for(&frozen, &settings);
    assert_eq!(a, b);
}

fn wire_bytes_for(
    msg: &speccraft::Response,
    settings: &Settings,
) -> Vec<u8> {
    let mut out = Vec::new();
    emit(msg, settings, &mut out, DEFAULT_BLOCK_SIZE).unwrap();
    out
}

#[test]
fn embedded_pathodspec_is_emitted_verbatim_after_path() {
    let settings = Settings::new();
    let out = wire_request(r#"get:/:s'200:b\'ok\''"#, &settings);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("GET /200:b'ok' HTTP/1.1\r\n"));
}

#[test]
fn preview_safe_drops_pauses_but_keeps_everything_else() {
    let msg = parse_response("200:b'hi':p1,5").unwrap();
    let preview = msg.preview_safe();
    assert!(!preview.spec().contains(":p1,5"));
    assert!(preview.spec().contains("b'hi'"));
}

#[test]
fn parse_then_spec_then_parse_is_structurally_stable() {
    let msg = parse_request("get:/path:h'A'='B':b'body'").unwrap();
    let reparsed = parse_request(&msg.spec()).unwrap();
    assert_eq!(msg.spec(), reparsed.spec());
}
