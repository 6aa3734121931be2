//! Mangling-free C entry points. See `include/dof_bridge.h`.
//!
//! No entry point unwinds or reports an error to the caller: panics and
//! misuse are caught here and reported on the log channel.

use std::any::Any;
use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::{CStr, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};

use dof_engine::{LogLevel, log_error, log_warn};

use crate::config;
use crate::forward::LogCallback;
use crate::instance::{self, BridgeError, Handle};
use crate::session;

/// Raw engine handle. `0` never names a live instance.
pub type DofHandle = u64;

fn guarded<R>(call: &'static str, fallback: R, body: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(payload) => {
            log_error!("{call}: engine panicked: {}", panic_message(payload.as_ref()));
            fallback
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

thread_local! {
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

/// Errors raised while an earlier report is still in the log callback on this
/// thread are dropped, so a callback that re-enters on ERROR cannot recurse.
fn report(call: &str, result: Result<(), BridgeError>) {
    let Err(err) = result else {
        return;
    };
    if REPORTING.replace(true) {
        return;
    }
    log_error!("{call}: {err}");
    REPORTING.set(false);
}

fn resolve(raw: DofHandle) -> Result<Handle, BridgeError> {
    Handle::from_raw(raw).ok_or(BridgeError::NullHandle)
}

/// # Safety
///
/// `ptr` is null or points to a NUL-terminated string valid for `'a`.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
}

/// Set the base directory the engine searches for its configuration files.
/// `NULL` or `""` selects the engine default.
///
/// # Safety
///
/// `path` is null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dof_config_set_base_path(path: *const c_char) {
    guarded("dof_config_set_base_path", (), || {
        // SAFETY: forwarded caller contract.
        let path = unsafe { c_str(path) };
        config::set_base_path(path.as_deref().unwrap_or(""));
    })
}

/// Set the minimum log level (`0` INFO, `1` WARN, `2` ERROR, `3` DEBUG).
/// Unknown ordinals leave the level unchanged.
#[unsafe(no_mangle)]
pub extern "C" fn dof_config_set_log_level(level: c_int) {
    guarded("dof_config_set_log_level", (), || {
        match LogLevel::try_from(level) {
            Ok(level) => config::set_log_level(level),
            Err(err) => log_warn!("dof_config_set_log_level: {err}"),
        }
    })
}

/// Register the log callback; `NULL` disables logging.
#[unsafe(no_mangle)]
pub extern "C" fn dof_config_set_log_callback(callback: Option<LogCallback>) {
    guarded("dof_config_set_log_callback", (), || {
        config::set_log_callback(callback)
    })
}

/// Create an engine instance. Returns `0` if construction failed.
#[unsafe(no_mangle)]
pub extern "C" fn dof_create() -> DofHandle {
    guarded("dof_create", 0, || instance::create().into_raw())
}

/// Destroy an instance created with [`dof_create`].
#[unsafe(no_mangle)]
pub extern "C" fn dof_destroy(dof: DofHandle) {
    guarded("dof_destroy", (), || {
        report("dof_destroy", resolve(dof).and_then(instance::destroy))
    })
}

/// Start a session for `rom_name`; `table_filename` may be `""` or `NULL`.
///
/// # Safety
///
/// `table_filename` and `rom_name` are null or valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dof_init(
    dof: DofHandle,
    table_filename: *const c_char,
    rom_name: *const c_char,
) {
    guarded("dof_init", (), || {
        // SAFETY: forwarded caller contract.
        let table_filename = unsafe { c_str(table_filename) }.unwrap_or(Cow::Borrowed(""));
        // SAFETY: forwarded caller contract.
        let result = match unsafe { c_str(rom_name) } {
            Some(rom_name) => {
                resolve(dof).and_then(|handle| session::init(handle, &table_filename, &rom_name))
            }
            None => Err(BridgeError::MissingArgument("rom_name")),
        };
        report("dof_init", result);
    })
}

/// Forward one `(type, number, value)` event.
#[unsafe(no_mangle)]
pub extern "C" fn dof_data_receive(dof: DofHandle, kind: c_char, number: c_int, value: c_int) {
    guarded("dof_data_receive", (), || {
        report(
            "dof_data_receive",
            resolve(dof).and_then(|handle| session::data_receive(handle, kind as u8, number, value)),
        )
    })
}

/// End the current session; the handle may be re-initialised.
#[unsafe(no_mangle)]
pub extern "C" fn dof_finish(dof: DofHandle) {
    guarded("dof_finish", (), || {
        report("dof_finish", resolve(dof).and_then(session::finish))
    })
}
