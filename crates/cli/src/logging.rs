use std::borrow::Cow;
use std::ffi::{CStr, c_char, c_int};

use dof_bridge::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter; the
/// engine's own level filter already applies before messages get here.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Log callback registered with the bridge: re-emits engine messages as
/// `tracing` events.
pub unsafe extern "C" fn forward_to_tracing(level: c_int, message: *const c_char) {
    let text = if message.is_null() {
        Cow::Borrowed("")
    } else {
        // SAFETY: the bridge passes a NUL-terminated string valid for this call.
        unsafe { CStr::from_ptr(message) }.to_string_lossy()
    };
    match LogLevel::try_from(level) {
        Ok(LogLevel::Info) => tracing::info!("[DOF] {text}"),
        Ok(LogLevel::Warn) => tracing::warn!("[DOF] {text}"),
        Ok(LogLevel::Error) => tracing::error!("[DOF] {text}"),
        Ok(LogLevel::Debug) => tracing::debug!("[DOF] {text}"),
        Err(err) => tracing::warn!("[DOF] ({err}) {text}"),
    }
}
