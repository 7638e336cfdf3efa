//! Message assemblers: `Request`, `Response` and `WebsocketFrame` each
//! hold an ordered token list and know how to turn it into wire bytes,
//! a resolved/frozen copy of itself, and a loggable summary.

use std::collections::BTreeMap;

use crate::error::{RenderError, ResolveError};
use crate::token::{Offset, PauseDuration, Token};
use crate::value::{ByteSource, LiteralGenerator, Value};
use crate::settings::Settings;
use crate::websocket;

const TRUNCATE: usize = 1024;

fn lit(s: &str) -> Box<dyn ByteSource> {
    Box::new(LiteralGenerator::new(s.as_bytes().to_vec()))
}

/// Shared behavior across the three message kinds. Resolution and
/// freezing are type-specific (each constructs its own concrete type
/// back), so they stay inherent methods on each struct rather than
/// trait methods — only the read-only accessors are common enough to
/// share here.
pub trait Message {
    fn tokens(&self) -> &[Token];

    fn is_raw(&self) -> bool {
        self.tokens().iter().any(|t| matches!(t, Token::Raw))
    }

    fn actions(&self) -> Vec<&Token> {
        self.tokens().iter().filter(|t| t.is_action()).collect()
    }

    fn headers(&self) -> Vec<&Token> {
        self.tokens().iter().filter(|t| t.is_header()).collect()
    }

    fn body(&self) -> Option<&Value> {
        self.tokens().iter().find_map(|t| match *t {
            Token::Body(ref v) => Some(v),
            _ => None,
        })
    }

    /// Whether a header named `name` (case-insensitive) is already present.
    fn has_header(&self, name: &str, settings: &Settings) -> Result<bool, ResolveError> {
        for h in self.headers() {
            if let Some(key) = h.header_key() {
                let bytes = key.get_generator(settings)?.all();
                if bytes.eq_ignore_ascii_case(name.as_bytes()) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn spec(&self) -> String {
        self.tokens().iter().map(Token::spec).collect::<Vec<_>>().join(":")
    }
}

/// A lowered `(offset, kind)` pair ready for the emitter, produced by
/// resolving a message's action tokens.
pub enum EmitAction {
    Pause(u64, PauseDuration),
    Disconnect(u64),
    Inject(u64, Box<dyn ByteSource>),
}

fn lowered_actions(tokens: &[Token], settings: &Settings) -> Result<Vec<EmitAction>, ResolveError> {
    let mut out = Vec::new();
    for t in tokens {
        match *t {
            Token::PauseAt { offset, duration } => {
                let off = offset.value().expect("actions must be resolved before lowering");
                out.push(EmitAction::Pause(off, duration));
            }
            Token::DisconnectAt { offset } => {
                let off = offset.value().expect("actions must be resolved before lowering");
                out.push(EmitAction::Disconnect(off));
            }
            Token::InjectAt { offset, ref value } => {
                let off = offset.value().expect("actions must be resolved before lowering");
                out.push(EmitAction::Inject(off, value.get_generator(settings)?));
            }
            _ => {}
        }
    }
    Ok(out)
}

fn header_values(tokens: &[Token], settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
    let mut out = Vec::new();
    for t in tokens.iter().filter(|t| t.is_header()) {
        out.extend(t.values(settings).expect("header token always yields values")?);
    }
    Ok(out)
}

fn log_map(spec_text: String, fields: Vec<(&'static str, String)>) -> BTreeMap<&'static str, String> {
    let mut m = BTreeMap::new();
    for (k, v) in fields {
        m.insert(k, v);
    }
    m.insert("spec", spec_text);
    m
}

fn truncate_repr(bytes: &[u8]) -> String {
    let slice = &bytes[..bytes.len().min(TRUNCATE)];
    crate::escape::encode(slice, b'\'')
}

// ---------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Response {
    tokens: Vec<Token>,
}

impl Message for Response {
    fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl Response {
    pub fn new(tokens: Vec<Token>) -> Response {
        Response { tokens }
    }

    pub fn code(&self) -> Option<u16> {
        self.tokens.iter().find_map(|t| match *t {
            Token::Code(c) => Some(c),
            _ => None,
        })
    }

    pub fn reason(&self) -> Option<&Value> {
        self.tokens.iter().find_map(|t| match *t {
            Token::Reason(ref v) => Some(v),
            _ => None,
        })
    }

    pub fn is_websocket(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Ws))
    }

    fn preamble(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
        let code = self.code().unwrap_or(200);
        let mut v: Vec<Box<dyn ByteSource>> = vec![lit("HTTP/1.1 "), lit(&code.to_string()), lit(" ")];
        match self.reason() {
            Some(r) => v.push(r.get_generator(settings)?),
            None => v.push(lit(Token::default_reason(code))),
        }
        Ok(v)
    }

    /// The full ordered byte-generator sequence this response writes to
    /// the wire: preamble, headers, blank line, body.
    pub fn values(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
        let mut vals = self.preamble(settings)?;
        vals.push(lit("\r\n"));
        vals.extend(header_values(&self.tokens, settings)?);
        vals.push(lit("\r\n"));
        if let Some(b) = self.body() {
            vals.push(b.get_generator(settings)?);
        }
        Ok(vals)
    }

    pub fn length(&self, settings: &Settings) -> Result<u64, ResolveError> {
        Ok(self.values(settings)?.iter().map(|g| g.len() as u64).sum())
    }

    pub fn maximum_length(&self, settings: &Settings) -> Result<u64, ResolveError> {
        let mut l = self.length(settings)?;
        for t in self.actions() {
            if let Token::InjectAt { ref value, .. } = *t {
                l += value.byte_len(settings)?;
            }
        }
        Ok(l)
    }

    /// Drop all `PauseAt` tokens, for offline preview rendering.
    pub fn preview_safe(&self) -> Response {
        Response::new(
            self.tokens
                .iter()
                .filter(|t| !matches!(t, Token::PauseAt { .. }))
                .cloned()
                .collect(),
        )
    }

    /// Synthesize WebSocket and Content-Length headers, then resolve
    /// symbolic action offsets. Idempotent: resolving an already-resolved
    /// response is a no-op.
    pub fn resolve(&self, settings: &Settings) -> Result<Response, ResolveError> {
        let mut tokens = self.tokens.clone();

        if self.is_websocket() {
            let key = settings.websocket_key.as_ref().ok_or(RenderError::NoWebsocketKey)?;
            if self.code().is_none() {
                tokens.insert(1, Token::Code(101));
            }
            for (name, value) in websocket::server_handshake_headers(key) {
                if !self.has_header(name, settings)? {
                    tokens.push(Token::Header {
                        key: Value::literal(name.as_bytes().to_vec()),
                        value: Value::literal(value.into_bytes()),
                    });
                }
            }
        }

        if !self.is_raw() {
            if !self.has_header("Content-Length", settings)? {
                let len = match self.body() {
                    Some(b) => b.byte_len(settings)?,
                    None => 0,
                };
                tokens.push(Token::Header {
                    key: Value::literal(&b"Content-Length"[..]),
                    value: Value::literal(len.to_string().into_bytes()),
                });
            }
        }

        let intermediate = Response::new(tokens.clone());
        let length = intermediate.length(settings)?;
        Ok(Response::new(tokens.iter().map(|t| t.resolve_offset(length)).collect()))
    }

    pub fn freeze(&self, settings: &Settings) -> Result<Response, ResolveError> {
        let resolved = self.resolve(settings)?;
        let mut frozen = Vec::with_capacity(resolved.tokens.len());
        for t in &resolved.tokens {
            frozen.push(t.freeze(settings)?);
        }
        Ok(Response::new(frozen))
    }

    pub fn log(&self, settings: &Settings) -> BTreeMap<&'static str, String> {
        let code = self.code().map(|c| c.to_string()).unwrap_or_default();
        let reason = self
            .reason()
            .and_then(|v| v.get_generator(settings).ok())
            .map(|g| truncate_repr(&g.all()))
            .unwrap_or_default();
        let body = self
            .body()
            .and_then(|v| v.get_generator(settings).ok())
            .map(|g| truncate_repr(&g.all()))
            .unwrap_or_default();
        log_map(
            self.spec(),
            vec![("code", code), ("reason", reason), ("version", "HTTP/1.1".into()), ("body", body)],
        )
    }
}

// ---------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Request {
    tokens: Vec<Token>,
}

impl Message for Request {
    fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl Request {
    pub fn new(tokens: Vec<Token>) -> Request {
        Request { tokens }
    }

    pub fn method(&self) -> Option<&Value> {
        self.tokens.iter().find_map(|t| match *t {
            Token::Method(ref v) => Some(v),
            _ => None,
        })
    }

    pub fn path(&self) -> Option<&Value> {
        self.tokens.iter().find_map(|t| match *t {
            Token::Path(ref v) => Some(v),
            _ => None,
        })
    }

    pub fn pathodspec(&self) -> Option<&Response> {
        self.tokens.iter().find_map(|t| match *t {
            Token::PathodSpec { ref parsed, .. } => Some(parsed.as_ref()),
            _ => None,
        })
    }

    pub fn is_websocket(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Ws))
    }

    fn preamble(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
        let mut v: Vec<Box<dyn ByteSource>> = Vec::new();
        match self.method() {
            Some(m) => v.push(m.get_generator(settings)?),
            None => v.push(lit("GET")),
        }
        v.push(lit(" "));
        match self.path() {
            Some(p) => v.push(p.get_generator(settings)?),
            None => v.push(lit("/")),
        }
        if let Some(spec) = self.pathodspec() {
            v.push(lit(&spec.spec()));
        }
        v.push(lit(" HTTP/1.1"));
        Ok(v)
    }

    pub fn values(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
        let mut vals = self.preamble(settings)?;
        vals.push(lit("\r\n"));
        vals.extend(header_values(&self.tokens, settings)?);
        vals.push(lit("\r\n"));
        if let Some(b) = self.body() {
            vals.push(b.get_generator(settings)?);
        }
        Ok(vals)
    }

    pub fn length(&self, settings: &Settings) -> Result<u64, ResolveError> {
        Ok(self.values(settings)?.iter().map(|g| g.len() as u64).sum())
    }

    pub fn maximum_length(&self, settings: &Settings) -> Result<u64, ResolveError> {
        let mut l = self.length(settings)?;
        for t in self.actions() {
            if let Token::InjectAt { ref value, .. } = *t {
                l += value.byte_len(settings)?;
            }
        }
        Ok(l)
    }

    pub fn preview_safe(&self) -> Request {
        Request::new(
            self.tokens
                .iter()
                .filter(|t| !matches!(t, Token::PauseAt { .. }))
                .cloned()
                .collect(),
        )
    }

    pub fn resolve(&self, settings: &Settings) -> Result<Request, ResolveError> {
        let mut tokens = self.tokens.clone();

        if self.is_websocket() {
            if self.method().is_none() {
                tokens.insert(1, Token::method_keyword("get"));
            }
            // The client handshake key is per-request; absent an explicit
            // one in settings we mint a fresh one, matching the engine's
            // role as the handshake's initiator.
            let key = settings.websocket_key.clone().unwrap_or_else(|| {
                debug!("no settings.websocket_key, minting a fresh one");
                websocket::Key::new().to_string()
            });
            for (name, value) in websocket::client_handshake_headers(&key) {
                if !self.has_header(name, settings)? {
                    tokens.push(Token::Header {
                        key: Value::literal(name.as_bytes().to_vec()),
                        value: Value::literal(value.into_bytes()),
                    });
                }
            }
        }

        if !self.is_raw() {
            if !self.has_header("Content-Length", settings)? {
                if let Some(b) = self.body() {
                    let len = b.byte_len(settings)?;
                    tokens.push(Token::Header {
                        key: Value::literal(&b"Content-Length"[..]),
                        value: Value::literal(len.to_string().into_bytes()),
                    });
                }
            }
            if let Some(ref host) = settings.request_host {
                if !self.has_header("Host", settings)? {
                    tokens.push(Token::Header {
                        key: Value::literal(&b"Host"[..]),
                        value: Value::literal(host.clone().into_bytes()),
                    });
                }
            }
        }

        let intermediate = Request::new(tokens.clone());
        let length = intermediate.length(settings)?;
        Ok(Request::new(tokens.iter().map(|t| t.resolve_offset(length)).collect()))
    }

    pub fn freeze(&self, settings: &Settings) -> Result<Request, ResolveError> {
        let resolved = self.resolve(settings)?;
        let mut frozen = Vec::with_capacity(resolved.tokens.len());
        for t in &resolved.tokens {
            frozen.push(t.freeze(settings)?);
        }
        Ok(Request::new(frozen))
    }

    pub fn log(&self, settings: &Settings) -> BTreeMap<&'static str, String> {
        let method = self
            .method()
            .and_then(|v| v.get_generator(settings).ok())
            .map(|g| truncate_repr(&g.all()))
            .unwrap_or_default();
        let path = self
            .path()
            .and_then(|v| v.get_generator(settings).ok())
            .map(|g| truncate_repr(&g.all()))
            .unwrap_or_default();
        let body = self
            .body()
            .and_then(|v| v.get_generator(settings).ok())
            .map(|g| truncate_repr(&g.all()))
            .unwrap_or_default();
        log_map(self.spec(), vec![("method", method), ("path", path), ("body", body)])
    }
}

// ---------------------------------------------------------------------
// WebsocketFrame
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WebsocketFrame {
    tokens: Vec<Token>,
}

impl Message for WebsocketFrame {
    fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl WebsocketFrame {
    pub fn new(tokens: Vec<Token>) -> WebsocketFrame {
        WebsocketFrame { tokens }
    }

    pub fn values(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
        let mut vals: Vec<Box<dyn ByteSource>> =
            vec![Box::new(LiteralGenerator::new(websocket::DEFAULT_FRAME_HEADER.to_vec()))];
        if let Some(b) = self.body() {
            vals.push(b.get_generator(settings)?);
        }
        Ok(vals)
    }

    pub fn length(&self, settings: &Settings) -> Result<u64, ResolveError> {
        Ok(self.values(settings)?.iter().map(|g| g.len() as u64).sum())
    }

    pub fn maximum_length(&self, settings: &Settings) -> Result<u64, ResolveError> {
        let mut l = self.length(settings)?;
        for t in self.actions() {
            if let Token::InjectAt { ref value, .. } = *t {
                l += value.byte_len(settings)?;
            }
        }
        Ok(l)
    }

    pub fn preview_safe(&self) -> WebsocketFrame {
        WebsocketFrame::new(
            self.tokens
                .iter()
                .filter(|t| !matches!(t, Token::PauseAt { .. }))
                .cloned()
                .collect(),
        )
    }

    /// A data frame carries no auto-headers; resolving only fixes up
    /// symbolic action offsets.
    pub fn resolve(&self, settings: &Settings) -> Result<WebsocketFrame, ResolveError> {
        let length = self.length(settings)?;
        Ok(WebsocketFrame::new(self.tokens.iter().map(|t| t.resolve_offset(length)).collect()))
    }

    pub fn freeze(&self, settings: &Settings) -> Result<WebsocketFrame, ResolveError> {
        let resolved = self.resolve(settings)?;
        let mut frozen = Vec::with_capacity(resolved.tokens.len());
        for t in &resolved.tokens {
            frozen.push(t.freeze(settings)?);
        }
        Ok(WebsocketFrame::new(frozen))
    }

    pub fn log(&self, settings: &Settings) -> BTreeMap<&'static str, String> {
        let body = self
            .body()
            .and_then(|v| v.get_generator(settings).ok())
            .map(|g| truncate_repr(&g.all()))
            .unwrap_or_default();
        log_map(self.spec(), vec![("body", body)])
    }
}

pub(crate) use lowered_actions as actions_for_emitter;

#[cfg(test)]
mod test {
    use super::*;
    use crate::datatype::{Datatype, SizeUnit};

    fn get(settings: &Settings, vals: &[Box<dyn ByteSource>]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in vals {
            out.extend(v.all());
        }
        out
    }

    #[test]
    fn simple_400_response() {
        let r = Response::new(vec![Token::Code(400)]);
        let settings = Settings::new();
        let resolved = r.resolve(&settings).unwrap();
        let bytes = get(&settings, &resolved.values(&settings).unwrap());
        assert_eq!(bytes, b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn response_with_generated_body() {
        let r = Response::new(vec![
            Token::Code(200),
            Token::Body(Value::Generate { size: 1, unit: SizeUnit::Kilo, datatype: Datatype::AsciiLetters }),
        ]);
        let settings = Settings::new();
        let resolved = r.resolve(&settings).unwrap();
        assert!(resolved.has_header("Content-Length", &settings).unwrap());
        assert_eq!(resolved.length(&settings).unwrap(), resolved.length(&settings).unwrap());
    }

    #[test]
    fn get_request_wire_bytes() {
        let r = Request::new(vec![
            Token::method_keyword("get"),
            Token::Path(Value::literal(&b"/"[..])),
            Token::Header { key: Value::literal(&b"X"[..]), value: Value::literal(&b"Y"[..]) },
        ]);
        let settings = Settings::new();
        let resolved = r.resolve(&settings).unwrap();
        let bytes = get(&settings, &resolved.values(&settings).unwrap());
        assert_eq!(bytes, b"GET / HTTP/1.1\r\nX: Y\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn request_host_header_synthesized() {
        let r = Request::new(vec![Token::method_keyword("get"), Token::Path(Value::literal(&b"/"[..]))]);
        let settings = Settings { request_host: Some("example.com".into()), ..Settings::new() };
        let resolved = r.resolve(&settings).unwrap();
        assert!(resolved.has_header("Host", &settings).unwrap());
    }

    #[test]
    fn raw_mode_skips_auto_headers() {
        let r = Response::new(vec![Token::Code(200), Token::Raw]);
        let settings = Settings::new();
        let resolved = r.resolve(&settings).unwrap();
        assert!(!resolved.has_header("Content-Length", &settings).unwrap());
    }

    #[test]
    fn websocket_response_requires_key() {
        let r = Response::new(vec![Token::Ws]);
        let settings = Settings::new();
        assert!(r.resolve(&settings).is_err());
    }

    #[test]
    fn websocket_response_synthesizes_handshake() {
        let r = Response::new(vec![Token::Ws]);
        let settings = Settings { websocket_key: Some("dGhlIHNhbXBsZSBub25jZQ==".into()), ..Settings::new() };
        let resolved = r.resolve(&settings).unwrap();
        assert_eq!(resolved.code(), Some(101));
        assert!(resolved.has_header("Sec-WebSocket-Accept", &settings).unwrap());
    }

    #[test]
    fn resolve_is_idempotent() {
        let r = Response::new(vec![Token::Code(200), Token::Body(Value::literal(&b"hi"[..]))]);
        let settings = Settings::new();
        let once = r.resolve(&settings).unwrap();
        let twice = once.resolve(&settings).unwrap();
        assert_eq!(once.spec(), twice.spec());
    }

    #[test]
    fn websocket_frame_default_header() {
        let f = WebsocketFrame::new(vec![]);
        let settings = Settings::new();
        let bytes = get(&settings, &f.values(&settings).unwrap());
        assert_eq!(bytes, vec![0x82, 0x00]);
    }
}
