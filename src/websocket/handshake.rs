//! RFC 6455 §4 handshake header synthesis and the canonical data-frame
//! header bytes this crate emits for a bare `wf` token.

use super::keys::Accept;

/// `(name, value)` headers a `ws` *request* token appends when absent, in
/// the order a client handshake would send them. `Sec-WebSocket-Key` is
/// generated once per request since the engine is the client side here.
pub fn client_handshake_headers(key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Upgrade", "websocket".to_string()),
        ("Connection", "Upgrade".to_string()),
        ("Sec-WebSocket-Key", key.to_string()),
        ("Sec-WebSocket-Version", "13".to_string()),
    ]
}

/// `(name, value)` headers a `ws` *response* token appends when absent,
/// computing `Sec-WebSocket-Accept` from the client's base64 key.
pub fn server_handshake_headers(client_key: &str) -> Vec<(&'static str, String)> {
    let accept = Accept::from_key_bytes(client_key.as_bytes());
    vec![
        ("Upgrade", "websocket".to_string()),
        ("Connection", "Upgrade".to_string()),
        ("Sec-WebSocket-Accept", accept.to_string()),
    ]
}

/// The two-byte frame header emitted for a `wf` token with no explicit
/// flags: FIN=1, opcode=binary(0x02), MASK=0, payload length=0.
pub const DEFAULT_FRAME_HEADER: [u8; 2] = [0x82, 0x00];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_frame_header_bytes() {
        assert_eq!(DEFAULT_FRAME_HEADER, [0x82, 0x00]);
    }

    #[test]
    fn server_handshake_includes_accept() {
        // Canonical example from RFC 6455 §1.3.
        let hdrs = server_handshake_headers("dGhlIHNhbXBsZSBub25jZQ==");
        let accept = hdrs.iter().find(|(k, _)| *k == "Sec-WebSocket-Accept").unwrap();
        assert_eq!(accept.1, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn client_handshake_carries_supplied_key() {
        let hdrs = client_handshake_headers("abc123==");
        let key = hdrs.iter().find(|(k, _)| *k == "Sec-WebSocket-Key").unwrap();
        assert_eq!(key.1, "abc123==");
    }
}
