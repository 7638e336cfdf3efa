//! Error kinds for the parser, resolver and value generators.
//!
//! Emission failures are handled separately (see `emitter`): a writer
//! disconnect is not an error at all, it is reported as a boolean flag.

use std::io;

quick_error! {
    /// A malformed specification.
    ///
    /// Carries a human-oriented line/column so a caller can point an
    /// operator at the bad character.
    #[derive(Debug, PartialEq, Eq, Clone)]
    pub enum ParseError {
        Syntax(message: String, line: usize, column: usize) {
            description("malformed specification")
            display("{} at line {}, column {}", message, line, column)
        }
        /// An embedded `s'...'` response spec failed to parse.
        Embedded(inner: String, line: usize, column: usize) {
            description("malformed embedded response specification")
            display("{} at line {}, column {}", inner, line, column)
        }
        NotAscii {
            description("specification must be valid ASCII")
        }
        TrailingInput(line: usize, column: usize) {
            description("unexpected trailing input")
            display("unexpected trailing input at line {}, column {}", line, column)
        }
    }
}

quick_error! {
    /// A resolution precondition failed.
    ///
    /// Unlike `ParseError`, this is only ever raised from
    /// `Message::resolve`, after a spec has already parsed successfully.
    #[derive(Debug, PartialEq, Eq, Clone)]
    pub enum RenderError {
        NoWebsocketKey {
            description("websocket response requires settings.websocket_key")
        }
    }
}

quick_error! {
    /// A `<file` value generator violated the file-access policy.
    #[derive(Debug)]
    pub enum FileAccessDenied {
        Disabled {
            description("file access disabled: no staticdir configured")
        }
        Outside(path: String) {
            description("file path resolves outside staticdir")
            display("file path {:?} resolves outside the configured staticdir", path)
        }
        NotReadable(path: String, err: io::Error) {
            description("file not readable")
            display("file {:?} not readable: {}", path, err)
        }
    }
}

quick_error! {
    /// Anything that can go wrong resolving a parsed message for emission.
    ///
    /// Resolution errors abort the current message; the caller is
    /// expected to fall back to the synthetic `800` error response
    /// (`error_response::make_error_response`).
    #[derive(Debug)]
    pub enum ResolveError {
        Render(err: RenderError) {
            description("render precondition failed")
            display("{}", err)
            from()
        }
        File(err: FileAccessDenied) {
            description("file access denied")
            display("{}", err)
            from()
        }
    }
}
