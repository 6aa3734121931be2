//! Engine log emissions arrive as a level plus lazily formatted arguments.
//! They leave as one fully formatted, NUL-terminated string handed to the
//! registered C callback. Formatting takes two passes over the same
//! arguments: the first measures the exact length, the second writes into a
//! buffer of exactly that size. Nothing is truncated and no fixed-size buffer
//! is assumed.

use std::ffi::{c_char, c_int};
use std::fmt::{self, Write as _};
use std::sync::{PoisonError, RwLock};

use dof_engine::{LogHook, LogLevel, config};

/// C log callback: `(level, message)`.
///
/// `message` is NUL-terminated and owned by the bridge; it is released as soon
/// as the callback returns. Interior NUL bytes in a message end the C string
/// early.
pub type LogCallback = unsafe extern "C" fn(level: c_int, message: *const c_char);

static CALLBACK: RwLock<Option<LogCallback>> = RwLock::new(None);

/// Store `callback` in the process-wide slot and (de)register the adapter
/// hook with the engine configuration. `None` disables forwarding entirely.
pub fn register(callback: Option<LogCallback>) {
    *CALLBACK.write().unwrap_or_else(PoisonError::into_inner) = callback;
    config::set_log_hook(callback.map(|_| adapter as LogHook));
}

/// Currently registered callback.
pub fn registered() -> Option<LogCallback> {
    *CALLBACK.read().unwrap_or_else(PoisonError::into_inner)
}

fn adapter(level: LogLevel, args: fmt::Arguments<'_>) {
    let Some(callback) = registered() else {
        return;
    };
    forward_with(callback, level, args, try_alloc);
}

fn try_alloc(capacity: usize) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity).ok()?;
    Some(buf)
}

struct Measure(usize);

impl fmt::Write for Measure {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 = self.0.saturating_add(s.len());
        Ok(())
    }
}

/// Writes at most `limit` bytes; the rest is discarded.
struct Bounded<'a> {
    buf: &'a mut Vec<u8>,
    limit: usize,
}

impl fmt::Write for Bounded<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.limit.saturating_sub(self.buf.len());
        let take = s.len().min(room);
        self.buf.extend_from_slice(&s.as_bytes()[..take]);
        Ok(())
    }
}

/// Format `args` and invoke `callback` exactly once, unless the buffer
/// allocation fails, in which case the emission is dropped.
///
/// A zero-length measurement, or a failure in either formatting pass, still
/// invokes the callback, with an empty string.
pub(crate) fn forward_with<A>(
    callback: LogCallback,
    level: LogLevel,
    args: fmt::Arguments<'_>,
    alloc: A,
) where
    A: FnOnce(usize) -> Option<Vec<u8>>,
{
    let mut measure = Measure(0);
    let len = match measure.write_fmt(args) {
        Ok(()) => measure.0,
        Err(_) => 0,
    };

    if len == 0 {
        forward_empty(callback, level);
        return;
    }

    let Some(capacity) = len.checked_add(1) else {
        return;
    };
    let Some(mut buf) = alloc(capacity) else {
        return;
    };

    let written = Bounded {
        buf: &mut buf,
        limit: len,
    }
    .write_fmt(args);
    if written.is_err() {
        forward_empty(callback, level);
        return;
    }
    buf.push(0);

    // SAFETY: `buf` is NUL-terminated and outlives the call.
    unsafe { callback(level.ordinal(), buf.as_ptr().cast::<c_char>()) };
}

fn forward_empty(callback: LogCallback, level: LogLevel) {
    // SAFETY: the callback contract takes a level and a NUL-terminated string.
    unsafe { callback(level.ordinal(), c"".as_ptr()) };
}
