//! The token AST: one tagged sum type covering every component and action
//! variant a spec can contain, plus the `r`/`a`/numeric offset it shares
//! across all three action kinds.
//!
//! Every variant implements `spec()` (inverse of parsing) and `freeze()`
//! (fix randomness). Component variants additionally contribute bytes via
//! `values()`; action variants carry an `Offset` resolved by
//! `resolve_offset()`. There is no trait hierarchy here — callers match on
//! the enum directly, per the token model's own preference for pattern
//! matching over dynamic dispatch.

use crate::error::{FileAccessDenied, ResolveError};
use crate::message::Response;
use crate::status;
use crate::uastrings;
use crate::value::{ByteSource, LiteralGenerator, Value};
use crate::settings::Settings;

/// The HTTP methods recognized as bare keywords (case-insensitive) rather
/// than requiring a quoted value literal.
pub const METHODS: &[&str] = &[
    "get", "head", "post", "put", "delete", "options", "trace", "connect",
];

/// An action's position in the output byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Absolute(u64),
    /// `r`: resolves to a uniform random offset in `[0, length)`.
    Random,
    /// `a`: resolves to `length + 1`, i.e. just past the end of the message.
    AfterEnd,
}

impl Offset {
    pub fn spec(&self) -> String {
        match *self {
            Offset::Absolute(n) => n.to_string(),
            Offset::Random => "r".into(),
            Offset::AfterEnd => "a".into(),
        }
    }

    /// Resolve a symbolic offset against a message of the given length.
    /// Already-numeric offsets pass through unchanged, making resolution
    /// idempotent.
    pub fn resolve(&self, length: u64) -> Offset {
        match *self {
            Offset::Random => {
                let n = if length == 0 { 0 } else { rand::random::<u64>() % length };
                Offset::Absolute(n)
            }
            Offset::AfterEnd => Offset::Absolute(length + 1),
            Offset::Absolute(n) => Offset::Absolute(n),
        }
    }

    pub fn value(&self) -> Option<u64> {
        match *self {
            Offset::Absolute(n) => Some(n),
            _ => None,
        }
    }
}

/// How long a `PauseAt` suspends emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseDuration {
    Seconds(u64),
    Forever,
}

impl PauseDuration {
    pub fn spec(&self) -> String {
        match *self {
            PauseDuration::Seconds(s) => s.to_string(),
            PauseDuration::Forever => "f".into(),
        }
    }
}

/// One node of a message's token list.
#[derive(Debug, Clone)]
pub enum Token {
    Header { key: Value, value: Value },
    ContentType(Value),
    Location(Value),
    UserAgent { shortcut: Option<String>, value: Value },
    Body(Value),
    Method(Value),
    Path(Value),
    Code(u16),
    Reason(Value),
    /// An embedded response spec, parsed eagerly at construction and
    /// cached alongside its source text.
    PathodSpec { text: Value, parsed: Box<Response> },
    Raw,
    Ws,
    Wf,
    PauseAt { offset: Offset, duration: PauseDuration },
    DisconnectAt { offset: Offset },
    InjectAt { offset: Offset, value: Value },
}

fn lit(s: &str) -> Box<dyn ByteSource> {
    Box::new(LiteralGenerator::new(s.as_bytes().to_vec()))
}

impl Token {
    pub fn method_keyword(keyword: &str) -> Token {
        Token::Method(Value::literal(keyword.to_uppercase().into_bytes()))
    }

    pub fn is_header(&self) -> bool {
        matches!(
            self,
            Token::Header { .. } | Token::ContentType(_) | Token::Location(_) | Token::UserAgent { .. }
        )
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Token::PauseAt { .. } | Token::DisconnectAt { .. } | Token::InjectAt { .. })
    }

    pub fn offset(&self) -> Option<Offset> {
        match *self {
            Token::PauseAt { offset, .. } => Some(offset),
            Token::DisconnectAt { offset } => Some(offset),
            Token::InjectAt { offset, .. } => Some(offset),
            _ => None,
        }
    }

    /// The header key this token contributes, for headers and header
    /// shortcuts. `None` for every other variant.
    pub fn header_key(&self) -> Option<Value> {
        match *self {
            Token::Header { ref key, .. } => Some(key.clone()),
            Token::ContentType(_) => Some(Value::literal(&b"Content-Type"[..])),
            Token::Location(_) => Some(Value::literal(&b"Location"[..])),
            Token::UserAgent { .. } => Some(Value::literal(&b"User-Agent"[..])),
            _ => None,
        }
    }

    /// Byte generators contributed by a component token, in wire order.
    /// `None` for markers and actions, which contribute no direct bytes
    /// of their own (actions are interleaved by the emitter instead).
    pub fn values(&self, settings: &Settings) -> Option<Result<Vec<Box<dyn ByteSource>>, ResolveError>> {
        let result = match *self {
            Token::Header { ref key, ref value } => vec![
                key.get_generator(settings).map_err(ResolveError::from),
                Ok(lit(": ")),
                value.get_generator(settings).map_err(ResolveError::from),
                Ok(lit("\r\n")),
            ],
            Token::ContentType(ref value) => vec![
                Ok(lit("Content-Type: ")),
                value.get_generator(settings).map_err(ResolveError::from),
                Ok(lit("\r\n")),
            ],
            Token::Location(ref value) => vec![
                Ok(lit("Location: ")),
                value.get_generator(settings).map_err(ResolveError::from),
                Ok(lit("\r\n")),
            ],
            Token::UserAgent { ref value, .. } => vec![
                Ok(lit("User-Agent: ")),
                value.get_generator(settings).map_err(ResolveError::from),
                Ok(lit("\r\n")),
            ],
            Token::Body(ref value) => vec![value.get_generator(settings).map_err(ResolveError::from)],
            Token::Method(ref value) => vec![value.get_generator(settings).map_err(ResolveError::from)],
            Token::Path(ref value) => vec![value.get_generator(settings).map_err(ResolveError::from)],
            Token::Code(code) => vec![Ok(lit(&code.to_string()))],
            Token::Reason(ref value) => vec![value.get_generator(settings).map_err(ResolveError::from)],
            _ => return None,
        };
        let mut out = Vec::with_capacity(result.len());
        for item in result {
            match item {
                Ok(v) => out.push(v),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(out))
    }

    /// Resolve symbolic offsets against a message of the given length.
    /// Identity for everything but action tokens.
    pub fn resolve_offset(&self, length: u64) -> Token {
        match *self {
            Token::PauseAt { offset, duration } => {
                Token::PauseAt { offset: offset.resolve(length), duration }
            }
            Token::DisconnectAt { offset } => Token::DisconnectAt { offset: offset.resolve(length) },
            Token::InjectAt { offset, ref value } => {
                Token::InjectAt { offset: offset.resolve(length), value: value.clone() }
            }
            ref other => other.clone(),
        }
    }

    /// Realize any `Generate`/`File` values into `Literal`s.
    pub fn freeze(&self, settings: &Settings) -> Result<Token, FileAccessDenied> {
        Ok(match *self {
            Token::Header { ref key, ref value } => Token::Header {
                key: key.freeze(settings)?,
                value: value.freeze(settings)?,
            },
            Token::ContentType(ref v) => Token::ContentType(v.freeze(settings)?),
            Token::Location(ref v) => Token::Location(v.freeze(settings)?),
            Token::UserAgent { ref shortcut, ref value } => {
                Token::UserAgent { shortcut: shortcut.clone(), value: value.freeze(settings)? }
            }
            Token::Body(ref v) => Token::Body(v.freeze(settings)?),
            Token::Method(ref v) => Token::Method(v.freeze(settings)?),
            Token::Path(ref v) => Token::Path(v.freeze(settings)?),
            Token::Reason(ref v) => Token::Reason(v.freeze(settings)?),
            Token::PathodSpec { ref parsed, .. } => {
                let frozen = parsed.freeze(settings)?;
                let text = Value::literal(frozen.spec().into_bytes());
                Token::PathodSpec { text, parsed: Box::new(frozen) }
            }
            Token::InjectAt { offset, ref value } => {
                Token::InjectAt { offset, value: value.freeze(settings)? }
            }
            ref other => other.clone(),
        })
    }

    /// Render this token back into spec-language text. `parse(t.spec())`
    /// reproduces a structurally equal token.
    pub fn spec(&self) -> String {
        match *self {
            Token::Header { ref key, ref value } => format!("h{}={}", key.spec(), value.spec()),
            Token::ContentType(ref v) => format!("c{}", v.spec()),
            Token::Location(ref v) => format!("l{}", v.spec()),
            Token::UserAgent { ref shortcut, ref value } => match shortcut {
                Some(s) => format!("u{}", s),
                None => format!("u{}", value.spec()),
            },
            Token::Body(ref v) => format!("b{}", v.spec()),
            Token::Method(ref v) => {
                let s = v.spec();
                let unquoted = unquote(&s);
                // Only the canonical upper-case spelling a bare keyword
                // parses to (`GET`, `POST`, ...) renders back as the bare
                // keyword. Any other casing is an explicit literal and
                // must stay quoted, or a keyword round-trip like `'GeT'`
                // would canonicalize to `get` and reparse as `GET`.
                if METHODS.iter().any(|m| unquoted == m.to_uppercase()) {
                    unquoted.to_lowercase()
                } else {
                    s
                }
            }
            Token::Path(ref v) => v.spec(),
            Token::Code(code) => code.to_string(),
            Token::Reason(ref v) => format!("m{}", v.spec()),
            Token::PathodSpec { ref text, .. } => format!("s{}", text.spec()),
            Token::Raw => "r".into(),
            Token::Ws => "ws".into(),
            Token::Wf => "wf".into(),
            Token::PauseAt { offset, duration } => format!("p{},{}", offset.spec(), duration.spec()),
            Token::DisconnectAt { offset } => format!("d{}", offset.spec()),
            Token::InjectAt { offset, ref value } => format!("i{},{}", offset.spec(), value.spec()),
        }
    }

    /// Default reason phrase text for a `Code` with no explicit `Reason`.
    pub fn default_reason(code: u16) -> &'static str {
        status::reason_phrase(code)
    }

    pub fn user_agent_from_shortcut(key: &str) -> Option<Token> {
        uastrings::lookup(key).map(|expanded| Token::UserAgent {
            shortcut: Some(key.to_string()),
            value: Value::literal(expanded.as_bytes().to_vec()),
        })
    }
}

fn unquote(s: &str) -> &str {
    if s.len() >= 2 && (s.starts_with('\'') || s.starts_with('"')) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn method_keyword_canonicalizes_case() {
        let t = Token::method_keyword("get");
        assert_eq!(t.spec(), "get");
    }

    #[test]
    fn method_literal_round_trips_quoted() {
        let t = Token::Method(Value::literal(&b"GeT"[..]));
        assert_eq!(t.spec(), "'GeT'");
    }

    #[test]
    fn header_spec_round_trip() {
        let t = Token::Header { key: Value::literal(&b"X"[..]), value: Value::literal(&b"Y"[..]) };
        assert_eq!(t.spec(), "h'X'='Y'");
    }

    #[test]
    fn offset_resolve_is_identity_for_absolute() {
        let o = Offset::Absolute(5);
        assert_eq!(o.resolve(100), Offset::Absolute(5));
    }

    #[test]
    fn offset_random_resolves_within_bounds() {
        let o = Offset::Random;
        for _ in 0..20 {
            match o.resolve(10) {
                Offset::Absolute(n) => assert!(n < 10),
                _ => panic!("expected Absolute"),
            }
        }
    }

    #[test]
    fn offset_after_end_is_length_plus_one() {
        assert_eq!(Offset::AfterEnd.resolve(42), Offset::Absolute(43));
    }

    #[test]
    fn user_agent_shortcut_expands() {
        let t = Token::user_agent_from_shortcut("firefox").unwrap();
        assert!(t.spec().starts_with("ufirefox"));
    }

    #[test]
    fn code_values_render_digits() {
        let t = Token::Code(200);
        let settings = Settings::new();
        let vals = t.values(&settings).unwrap().unwrap();
        assert_eq!(vals[0].all(), b"200");
    }

    #[test]
    fn default_reason_known_code() {
        assert_eq!(Token::default_reason(404), "Not Found");
    }
}
