//! A mini-language engine for crafting byte-exact HTTP/1.1 requests,
//! responses and WebSocket frames for protocol testing.
//!
//! A spec string parses into a [`message`] AST of [`token::Token`]s,
//! `resolve` (on [`Request`], [`Response`] or [`WebsocketFrame`])
//! synthesizes auto-headers and fixes symbolic action offsets, and
//! [`emitter::emit`] writes the result to any [`std::io::Write`],
//! interleaving pauses, disconnects and mid-stream injections at their
//! resolved byte offsets.

#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate log;

pub mod datatype;
pub mod emitter;
pub mod error;
pub mod error_response;
mod escape;
pub mod message;
pub mod parser;
pub mod settings;
pub mod status;
pub mod token;
pub mod uastrings;
pub mod value;
pub mod websocket;

pub use error::{FileAccessDenied, ParseError, RenderError, ResolveError};
pub use error_response::make_error_response;
pub use message::{Message, Request, Response, WebsocketFrame};
pub use parser::{parse_request, parse_requests, parse_response, parse_websocket_frame, RequestOrFrame};
pub use settings::Settings;
pub use token::{Offset, PauseDuration, Token};
pub use value::{ByteSource, Value};
