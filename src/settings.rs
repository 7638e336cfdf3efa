//! Runtime configuration consumed while resolving a message.

/// Knobs that influence how a [`Message`](crate::message::Message)
/// resolves auto-headers and validates `<file` value generators.
///
/// `Settings` is plain data: this crate never reads a configuration file
/// itself, the host builds one directly.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Base directory for `<file` value generators. `None` disables file
    /// access entirely.
    pub staticdir: Option<String>,
    /// When `true`, `<file` paths may resolve outside `staticdir`.
    pub unconstrained_file_access: bool,
    /// Default `Host` header value for requests that don't supply one.
    pub request_host: Option<String>,
    /// Client `Sec-WebSocket-Key` (base64) used to compute
    /// `Sec-WebSocket-Accept` when resolving a `ws` response.
    pub websocket_key: Option<String>,
}

impl Settings {
    /// A `Settings` with file access and request-host defaulting disabled.
    pub fn new() -> Settings {
        Settings::default()
    }
}
