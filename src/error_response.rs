//! The synthetic `800` response used to report a resolution failure
//! in-band, since the emitter has already committed to writing *a*
//! response by the time resolution can fail.

use crate::message::Response;
use crate::token::Token;
use crate::value::Value;

/// Build a `Code(800)` response carrying `reason` (and optionally a more
/// detailed `body`, falling back to `reason` itself). `800` sits outside
/// the HTTP status range and is never confused with a real response.
pub fn make_error_response(reason: &str, body: Option<&str>) -> Response {
    let body_text = format!("engine error: {}", body.unwrap_or(reason));
    Response::new(vec![
        Token::Code(800),
        Token::ContentType(Value::literal(&b"text/plain"[..])),
        Token::Reason(Value::literal(reason.as_bytes().to_vec())),
        Token::Body(Value::literal(body_text.into_bytes())),
    ])
}
