//! WebSocket handshake header synthesis and the default data-frame header.
//!
//! This crate emits WebSocket traffic; it does not parse it back, so there
//! is no frame-decoding machinery here.

mod handshake;
mod keys;

pub use self::handshake::{client_handshake_headers, server_handshake_headers, DEFAULT_FRAME_HEADER};
pub use self::keys::{Accept, Key};
