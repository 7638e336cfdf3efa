//! Grammar rules: each function consumes exactly the construct it is
//! named for, or returns an error without having consumed anything it
//! shouldn't have on failure paths that are allowed to backtrack.

use crate::datatype::{Datatype, SizeUnit};
use crate::error::ParseError;
use crate::message::{Request, Response, WebsocketFrame};
use crate::token::{Offset, PauseDuration, Token, METHODS};
use crate::uastrings;
use crate::value::Value;

use super::lexer::Cursor;

// ---------------------------------------------------------------------
// Value grammar: generate | file | qliteral, with an optional naked
// fallback for sites that allow it (`nvalue`).
// ---------------------------------------------------------------------

fn looks_like_value_start(cur: &Cursor) -> bool {
    matches!(cur.peek(), Some(b'@') | Some(b'<') | Some(b'\'') | Some(b'"'))
}

pub fn parse_value(cur: &mut Cursor) -> Result<Value, ParseError> {
    match cur.peek() {
        Some(b'@') => parse_generate(cur),
        Some(b'<') => parse_file(cur),
        Some(b'\'') | Some(b'"') => Ok(Value::literal(cur.parse_quoted()?)),
        _ => Err(cur.error("expected a value (@, <, or a quoted literal)")),
    }
}

/// `value | naked`: used where a bare, unquoted token is also accepted
/// (currently only `Path`).
pub fn parse_nvalue(cur: &mut Cursor) -> Result<Value, ParseError> {
    if looks_like_value_start(cur) {
        parse_value(cur)
    } else {
        Ok(Value::literal(cur.parse_naked()?))
    }
}

fn parse_generate(cur: &mut Cursor) -> Result<Value, ParseError> {
    if !cur.eat(b'@') {
        return Err(cur.error("expected '@'"));
    }
    let size = cur.parse_integer()?;
    let unit = match cur.peek() {
        Some(b) => match SizeUnit::from_letter(b as char) {
            Some(u) => {
                cur.advance();
                u
            }
            None => SizeUnit::Bytes,
        },
        None => SizeUnit::Bytes,
    };
    let datatype = if cur.eat(b',') {
        parse_datatype_keyword(cur)?
    } else {
        Datatype::Bytes
    };
    Ok(Value::Generate { size, unit, datatype })
}

const DATATYPE_KEYWORDS: &[&str] = &[
    "ascii_letters", "ascii_lowercase", "ascii_uppercase", "digits", "hexdigits",
    "octdigits", "punctuation", "whitespace", "ascii", "bytes",
];

fn parse_datatype_keyword(cur: &mut Cursor) -> Result<Datatype, ParseError> {
    // Longest-first so `ascii_letters` isn't shadowed by `ascii`.
    let mut keywords = DATATYPE_KEYWORDS.to_vec();
    keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));
    for kw in keywords {
        if cur.eat_keyword_ci(kw) {
            return Ok(Datatype::from_keyword(kw).expect("keyword table is exhaustive"));
        }
    }
    Err(cur.error("expected a datatype keyword"))
}

fn parse_file(cur: &mut Cursor) -> Result<Value, ParseError> {
    if !cur.eat(b'<') {
        return Err(cur.error("expected '<'"));
    }
    let path = if matches!(cur.peek(), Some(b'\'') | Some(b'"')) {
        cur.parse_quoted()?
    } else {
        cur.parse_naked()?
    };
    let path = String::from_utf8(path).map_err(|_| cur.error("file path must be ASCII"))?;
    Ok(Value::File(path))
}

// ---------------------------------------------------------------------
// Offsets and actions
// ---------------------------------------------------------------------

fn parse_offset(cur: &mut Cursor) -> Result<Offset, ParseError> {
    match cur.peek() {
        Some(b) if b.is_ascii_digit() => Ok(Offset::Absolute(cur.parse_integer()?)),
        Some(b'r') => {
            cur.advance();
            Ok(Offset::Random)
        }
        Some(b'a') => {
            cur.advance();
            Ok(Offset::AfterEnd)
        }
        _ => Err(cur.error("expected an offset (integer, 'r', or 'a')")),
    }
}

fn parse_pause(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'p'
    let offset = parse_offset(cur)?;
    if !cur.eat(b',') {
        return Err(cur.error("expected ',' after pause offset"));
    }
    let duration = if cur.eat(b'f') {
        PauseDuration::Forever
    } else {
        PauseDuration::Seconds(cur.parse_integer()?)
    };
    Ok(Token::PauseAt { offset, duration })
}

fn parse_discon(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'd'
    let offset = parse_offset(cur)?;
    Ok(Token::DisconnectAt { offset })
}

fn parse_inject(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'i'
    let offset = parse_offset(cur)?;
    if !cur.eat(b',') {
        return Err(cur.error("expected ',' after inject offset"));
    }
    let value = parse_value(cur)?;
    Ok(Token::InjectAt { offset, value })
}

// ---------------------------------------------------------------------
// Headers and shortcuts
// ---------------------------------------------------------------------

fn parse_header(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'h'
    let key = parse_value(cur)?;
    if !cur.eat(b'=') {
        return Err(cur.error("expected '=' in header"));
    }
    let value = parse_value(cur)?;
    Ok(Token::Header { key, value })
}

fn parse_contype(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'c'
    Ok(Token::ContentType(parse_value(cur)?))
}

fn parse_location(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'l'
    Ok(Token::Location(parse_value(cur)?))
}

fn parse_uagent(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'u'
    for key in uastrings::keys_longest_first() {
        if cur.eat_keyword_ci(key) {
            return Ok(Token::user_agent_from_shortcut(key).expect("key just matched the table"));
        }
    }
    let value = parse_value(cur)?;
    Ok(Token::UserAgent { shortcut: None, value })
}

fn parse_body(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'b'
    Ok(Token::Body(parse_value(cur)?))
}

fn parse_reason(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 'm'
    Ok(Token::Reason(parse_value(cur)?))
}

fn parse_code(cur: &mut Cursor) -> Result<Token, ParseError> {
    let n = cur.parse_integer()?;
    let code = u16::try_from(n).map_err(|_| cur.error("status code out of range"))?;
    Ok(Token::Code(code))
}

fn try_parse_code(cur: &mut Cursor) -> Result<Option<Token>, ParseError> {
    if matches!(cur.peek(), Some(b) if b.is_ascii_digit()) {
        Ok(Some(parse_code(cur)?))
    } else {
        Ok(None)
    }
}

fn parse_method(cur: &mut Cursor) -> Result<Token, ParseError> {
    for kw in METHODS {
        if cur.eat_keyword_ci(kw) {
            return Ok(Token::method_keyword(kw));
        }
    }
    if looks_like_value_start(cur) {
        Ok(Token::Method(parse_value(cur)?))
    } else {
        Err(cur.error("expected an HTTP method"))
    }
}

fn try_parse_method(cur: &mut Cursor) -> Result<Option<Token>, ParseError> {
    for kw in METHODS {
        if cur.eat_keyword_ci(kw) {
            return Ok(Some(Token::method_keyword(kw)));
        }
    }
    if looks_like_value_start(cur) {
        Ok(Some(Token::Method(parse_value(cur)?)))
    } else {
        Ok(None)
    }
}

fn parse_path(cur: &mut Cursor) -> Result<Token, ParseError> {
    Ok(Token::Path(parse_nvalue(cur)?))
}

fn parse_pathodspec(cur: &mut Cursor) -> Result<Token, ParseError> {
    cur.advance(); // 's'
    let text = cur.parse_quoted()?;
    let text_str = String::from_utf8(text.clone()).map_err(|_| cur.error("embedded spec must be ASCII"))?;
    let parsed = parse_response(&text_str).map_err(|e| match e {
        ParseError::Syntax(msg, line, col) => ParseError::Embedded(msg, line, col),
        ParseError::TrailingInput(line, col) => {
            ParseError::Embedded("unexpected trailing input".into(), line, col)
        }
        other => other,
    })?;
    Ok(Token::PathodSpec { text: Value::literal(text), parsed: Box::new(parsed) })
}

// ---------------------------------------------------------------------
// Atom dispatch, one per message kind
// ---------------------------------------------------------------------

fn try_atom_response(cur: &mut Cursor) -> Result<Option<Token>, ParseError> {
    match cur.peek() {
        Some(b'h') => Ok(Some(parse_header(cur)?)),
        Some(b'c') => Ok(Some(parse_contype(cur)?)),
        Some(b'l') => Ok(Some(parse_location(cur)?)),
        Some(b'b') => Ok(Some(parse_body(cur)?)),
        Some(b'p') => Ok(Some(parse_pause(cur)?)),
        Some(b'd') => Ok(Some(parse_discon(cur)?)),
        Some(b'i') => Ok(Some(parse_inject(cur)?)),
        Some(b'm') => Ok(Some(parse_reason(cur)?)),
        Some(b'r') => {
            cur.advance();
            Ok(Some(Token::Raw))
        }
        _ => Ok(None),
    }
}

fn try_atom_request(cur: &mut Cursor) -> Result<Option<Token>, ParseError> {
    match cur.peek() {
        Some(b'h') => Ok(Some(parse_header(cur)?)),
        Some(b'c') => Ok(Some(parse_contype(cur)?)),
        Some(b'u') => Ok(Some(parse_uagent(cur)?)),
        Some(b'b') => Ok(Some(parse_body(cur)?)),
        Some(b'p') => Ok(Some(parse_pause(cur)?)),
        Some(b'd') => Ok(Some(parse_discon(cur)?)),
        Some(b'i') => Ok(Some(parse_inject(cur)?)),
        Some(b's') => Ok(Some(parse_pathodspec(cur)?)),
        Some(b'r') => {
            cur.advance();
            Ok(Some(Token::Raw))
        }
        _ => Ok(None),
    }
}

fn try_atom_wsframe(cur: &mut Cursor) -> Result<Option<Token>, ParseError> {
    match cur.peek() {
        Some(b'b') => Ok(Some(parse_body(cur)?)),
        Some(b'p') => Ok(Some(parse_pause(cur)?)),
        Some(b'd') => Ok(Some(parse_discon(cur)?)),
        Some(b'i') => Ok(Some(parse_inject(cur)?)),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------
// Top-level messages
// ---------------------------------------------------------------------

/// `response := (ws (":" code)? | code) (":" atom)*`
pub fn parse_response(cur: &mut Cursor) -> Result<Response, ParseError> {
    let mut tokens = Vec::new();
    if cur.eat_keyword_ci("ws") {
        tokens.push(Token::Ws);
        cur.eat_separator();
        if let Some(code) = try_parse_code(cur)? {
            tokens.push(code);
        }
    } else {
        tokens.push(parse_code(cur)?);
    }
    loop {
        cur.eat_separator();
        match try_atom_response(cur)? {
            Some(t) => tokens.push(t),
            None => break,
        }
    }
    Ok(Response::new(tokens))
}

/// `request := (ws (":" method)? | method) ":" path (":" atom)*`
pub fn parse_request(cur: &mut Cursor) -> Result<Request, ParseError> {
    let mut tokens = Vec::new();
    if cur.eat_keyword_ci("ws") {
        tokens.push(Token::Ws);
        cur.eat_separator();
        if let Some(m) = try_parse_method(cur)? {
            tokens.push(m);
        }
    } else {
        tokens.push(parse_method(cur)?);
    }
    cur.eat_separator();
    tokens.push(parse_path(cur)?);
    loop {
        cur.eat_separator();
        match try_atom_request(cur)? {
            Some(t) => tokens.push(t),
            None => break,
        }
    }
    Ok(Request::new(tokens))
}

/// `wsframe := wf (":" atom)*`
pub fn parse_wsframe(cur: &mut Cursor) -> Result<WebsocketFrame, ParseError> {
    if !cur.eat_keyword_ci("wf") {
        return Err(cur.error("expected 'wf'"));
    }
    let mut tokens = vec![Token::Wf];
    loop {
        cur.eat_separator();
        match try_atom_wsframe(cur)? {
            Some(t) => tokens.push(t),
            None => break,
        }
    }
    Ok(WebsocketFrame::new(tokens))
}

/// Peeks far enough to tell a `wf` frame apart from a request, without
/// consuming input on a miss.
pub fn peek_is_wsframe(cur: &Cursor) -> bool {
    let mut probe = cur.clone();
    probe.eat_keyword_ci("wf")
}

#[cfg(test)]
mod test {
    use super::*;

    fn cur(s: &str) -> Cursor {
        Cursor::new(s).unwrap()
    }

    #[test]
    fn parses_generate_value() {
        let mut c = cur("@1k,ascii_letters");
        let v = parse_value(&mut c).unwrap();
        assert_eq!(v.spec(), "@1k,ascii_letters");
    }

    #[test]
    fn parses_bare_generate_bytes() {
        let mut c = cur("@5");
        let v = parse_value(&mut c).unwrap();
        assert_eq!(v.spec(), "@5");
    }

    #[test]
    fn parses_file_value_naked() {
        let mut c = cur("<foo.txt");
        let v = parse_value(&mut c).unwrap();
        match v {
            Value::File(ref p) => assert_eq!(p, "foo.txt"),
            _ => panic!("expected File"),
        }
    }

    #[test]
    fn parses_quoted_literal_value() {
        let mut c = cur("'hello world'");
        let v = parse_value(&mut c).unwrap();
        assert_eq!(v.spec(), "'hello world'");
    }

    #[test]
    fn response_simple_code() {
        let mut c = cur("400");
        let r = parse_response(&mut c).unwrap();
        assert_eq!(r.code(), Some(400));
        assert!(c.is_eof());
    }

    #[test]
    fn response_with_body_and_pause() {
        let mut c = cur("200:b'hello':p2,1");
        let r = parse_response(&mut c).unwrap();
        assert_eq!(r.code(), Some(200));
        assert!(c.is_eof());
    }

    #[test]
    fn request_get_with_header() {
        let mut c = cur("get:/:h'X'='Y'");
        let r = parse_request(&mut c).unwrap();
        assert_eq!(r.method().unwrap().spec(), "'GET'");
        assert!(c.is_eof());
    }

    #[test]
    fn request_path_accepts_naked_token() {
        let mut c = cur("get:/index.html");
        let r = parse_request(&mut c).unwrap();
        assert_eq!(r.path().unwrap().spec(), "/index.html");
    }

    #[test]
    fn wsframe_with_body() {
        let mut c = cur("wf:b'abc'");
        let f = parse_wsframe(&mut c).unwrap();
        assert!(c.is_eof());
        assert!(f.body().is_some());
    }

    #[test]
    fn response_ws_handshake() {
        let mut c = cur("ws");
        let r = parse_response(&mut c).unwrap();
        assert!(r.is_websocket());
        assert_eq!(r.code(), None);
    }

    #[test]
    fn embedded_pathodspec_parses_inner_response() {
        let mut c = cur(r#"get:/:s'200:b\'ok\''"#);
        let r = parse_request(&mut c).unwrap();
        assert!(r.pathodspec().is_some());
        assert_eq!(r.pathodspec().unwrap().code(), Some(200));
    }
}
