//! Public parsing entry points. Each wraps a grammar production with
//! `parseAll` semantics: any input left unconsumed after a successful
//! parse is a [`ParseError::TrailingInput`], not a silent partial parse.

mod grammar;
mod lexer;

use crate::error::ParseError;
use crate::message::{Request, Response, WebsocketFrame};

pub use lexer::Cursor;

fn parse_all<T>(
    input: &str,
    rule: impl FnOnce(&mut Cursor) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    let mut cur = Cursor::new(input)?;
    let value = rule(&mut cur)?;
    if !cur.is_eof() {
        return Err(ParseError::TrailingInput(cur.line(), cur.col()));
    }
    Ok(value)
}

/// Parse a single response spec, e.g. `"400:b'not found'"`.
pub fn parse_response(input: &str) -> Result<Response, ParseError> {
    parse_all(input, grammar::parse_response)
}

/// Parse a single request spec, e.g. `"get:/"`.
pub fn parse_request(input: &str) -> Result<Request, ParseError> {
    parse_all(input, grammar::parse_request)
}

/// Parse a single WebSocket frame spec, e.g. `"wf:b'ping'"`.
pub fn parse_websocket_frame(input: &str) -> Result<WebsocketFrame, ParseError> {
    parse_all(input, grammar::parse_wsframe)
}

/// One entry of a `parse_requests` stream: either an HTTP request or a
/// WebSocket data frame, distinguished by their disjoint leading
/// keywords (`wf` vs. everything else).
#[derive(Debug, Clone)]
pub enum RequestOrFrame {
    Request(Request),
    Frame(WebsocketFrame),
}

fn skip_whitespace(cur: &mut Cursor) {
    while matches!(cur.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
        cur.advance();
    }
}

/// Parse one or more requests/frames in sequence, e.g. a file holding a
/// batch of specs to fire at a server back to back.
pub fn parse_requests(input: &str) -> Result<Vec<RequestOrFrame>, ParseError> {
    let mut cur = Cursor::new(input)?;
    let mut out = Vec::new();
    skip_whitespace(&mut cur);
    loop {
        if cur.is_eof() {
            break;
        }
        if grammar::peek_is_wsframe(&cur) {
            out.push(RequestOrFrame::Frame(grammar::parse_wsframe(&mut cur)?));
        } else {
            out.push(RequestOrFrame::Request(grammar::parse_request(&mut cur)?));
        }
        skip_whitespace(&mut cur);
    }
    if out.is_empty() {
        return Err(cur.error("expected at least one request or websocket frame"));
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::Message;

    #[test]
    fn parses_simple_response() {
        let r = parse_response("400:b'nope'").unwrap();
        assert_eq!(r.code(), Some(400));
    }

    #[test]
    fn rejects_trailing_input() {
        let err = parse_response("400 garbage").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput(_, _)));
    }

    #[test]
    fn parses_single_request() {
        let r = parse_request("get:/index.html").unwrap();
        assert_eq!(r.path().unwrap().spec(), "/index.html");
    }

    #[test]
    fn parses_websocket_frame() {
        let f = parse_websocket_frame("wf:b'ping'").unwrap();
        assert!(f.body().is_some());
    }

    #[test]
    fn parses_multiple_requests_separated_by_whitespace() {
        let items = parse_requests("get:/a\nget:/b\nwf:b'x'").unwrap();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], RequestOrFrame::Request(_)));
        assert!(matches!(items[1], RequestOrFrame::Request(_)));
        assert!(matches!(items[2], RequestOrFrame::Frame(_)));
    }

    #[test]
    fn parse_requests_rejects_empty_input() {
        assert!(parse_requests("   ").is_err());
    }
}
