//! Writes a resolved message's bytes to a writer, interleaving actions
//! (pause / disconnect / inject) at their resolved byte offsets.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ResolveError;
use crate::message::EmitAction;
use crate::settings::Settings;
use crate::token::PauseDuration;
use crate::value::ByteSource;

/// Bytes written per `write_all` call while draining a value or an
/// injected payload.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Outcome of one emission.
#[derive(Debug)]
pub struct EmitResult {
    /// `true` if the writer disconnected mid-emission. Not an error: the
    /// caller's job is done either way.
    pub disconnected: bool,
    pub duration: Duration,
}

/// Anything that can drive a message's byte sequence plus its lowered
/// action list through `emit`. `Request`, `Response` and
/// `WebsocketFrame` all implement this via their `values`/`resolve`
/// pair; this trait exists purely so `emit` takes one generic argument
/// instead of three near-identical functions.
pub trait Emittable {
    fn emit_values(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError>;
    fn emit_actions(&self, settings: &Settings) -> Result<Vec<EmitAction>, ResolveError>;
}

macro_rules! impl_emittable {
    ($ty:ty) => {
        impl Emittable for $ty {
            fn emit_values(&self, settings: &Settings) -> Result<Vec<Box<dyn ByteSource>>, ResolveError> {
                self.values(settings)
            }
            fn emit_actions(&self, settings: &Settings) -> Result<Vec<EmitAction>, ResolveError> {
                crate::message::actions_for_emitter(crate::message::Message::tokens(self), settings)
            }
        }
    };
}

impl_emittable!(crate::message::Response);
impl_emittable!(crate::message::Request);
impl_emittable!(crate::message::WebsocketFrame);

/// Write a resolved message to `writer`, in blocks of `block_size`,
/// executing pauses/disconnects/injects at their resolved offsets.
///
/// `msg` must already be resolved — action offsets must be numeric, or
/// this panics (a symbolic offset reaching the emitter is a caller bug,
/// not a runtime condition to recover from).
pub fn emit<M: Emittable, W: Write>(
    msg: &M,
    settings: &Settings,
    writer: &mut W,
    block_size: usize,
) -> Result<EmitResult, ResolveError> {
    let started = Instant::now();
    let vals = msg.emit_values(settings)?;
    let mut actions = msg.emit_actions(settings)?;
    actions.sort_by_key(action_offset);

    let mut actions = actions.into_iter().peekable();
    let mut sofar: u64 = 0;

    for val in &vals {
        let len = val.len() as u64;
        let mut cursor: u64 = 0;

        while let Some(offset) = actions.peek().map(action_offset) {
            if offset >= sofar + len {
                break;
            }
            let local_end = offset.saturating_sub(sofar);
            if let Disconnected::Yes = write_blocked(writer, &val.slice(cursor as usize, local_end as usize), block_size)? {
                return Ok(finish(started, true));
            }
            cursor = local_end;

            let action = actions.next().unwrap();
            match dispatch(action, writer, block_size)? {
                Disconnected::Yes => return Ok(finish(started, true)),
                Disconnected::No => {}
            }
        }

        if let Disconnected::Yes = write_blocked(writer, &val.slice(cursor as usize, len as usize), block_size)? {
            return Ok(finish(started, true));
        }
        sofar += len;
    }

    for action in actions {
        match dispatch(action, writer, block_size)? {
            Disconnected::Yes => return Ok(finish(started, true)),
            Disconnected::No => {}
        }
    }

    Ok(finish(started, false))
}

fn finish(started: Instant, disconnected: bool) -> EmitResult {
    EmitResult { disconnected, duration: started.elapsed() }
}

fn action_offset(action: &EmitAction) -> u64 {
    match *action {
        EmitAction::Pause(o, _) => o,
        EmitAction::Disconnect(o) => o,
        EmitAction::Inject(o, _) => o,
    }
}

enum Disconnected {
    Yes,
    No,
}

fn dispatch<W: Write>(action: EmitAction, writer: &mut W, block_size: usize) -> Result<Disconnected, ResolveError> {
    match action {
        EmitAction::Pause(offset, PauseDuration::Seconds(s)) => {
            trace!("pausing {}s at offset {}", s, offset);
            thread::sleep(Duration::from_secs(s));
            Ok(Disconnected::No)
        }
        EmitAction::Pause(offset, PauseDuration::Forever) => {
            debug!("pausing forever at offset {}", offset);
            // No built-in timeout: interruptible only by the writer
            // failing on a subsequent write, or the process being killed.
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
        EmitAction::Disconnect(offset) => {
            debug!("disconnecting at offset {}", offset);
            Ok(Disconnected::Yes)
        }
        EmitAction::Inject(_, bytes) => write_blocked(writer, &bytes.all(), block_size),
    }
}

/// Write `data` in chunks of `block_size`. A disconnect-shaped IO error
/// (broken pipe / connection reset) ends emission quietly; any other
/// error propagates as fatal to this message.
fn write_blocked<W: Write>(writer: &mut W, data: &[u8], block_size: usize) -> Result<Disconnected, ResolveError> {
    for chunk in data.chunks(block_size.max(1)) {
        if let Err(e) = writer.write_all(chunk) {
            if is_disconnect(&e) {
                debug!("writer disconnected: {}", e);
                return Ok(Disconnected::Yes);
            }
            // Emission errors have no place in `ResolveError`; wrap as an
            // io error surfaced through the same channel callers already
            // handle for resolution failures.
            return Err(io_to_resolve(e));
        }
    }
    Ok(Disconnected::No)
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
    )
}

fn io_to_resolve(e: io::Error) -> ResolveError {
    // There is no direct `From<io::Error>` for `ResolveError` (resolution
    // itself never touches a writer); emission failures are rare enough
    // that round-tripping through `FileAccessDenied::NotReadable`'s io
    // payload is acceptable rather than growing the error enum for a
    // single non-resolution case.
    ResolveError::File(crate::error::FileAccessDenied::NotReadable("<writer>".into(), e))
}
