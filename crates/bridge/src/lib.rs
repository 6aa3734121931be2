#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! Flat C-ABI bridge over a DOF engine.
//!
//! Callers configure the process-wide engine settings, create opaque engine
//! handles, and stream `(type, number, value)` events into them. Engine log
//! output is formatted on this side and handed to one registered C callback
//! as a plain NUL-terminated string.
//!
//! # Caller obligations
//!
//! - Configuration calls and log-callback registration mutate process-wide
//!   state; callers serialize them if they come from several threads.
//! - A log callback runs synchronously on the thread that triggered the
//!   emission and must not unwind. The message pointer is only valid for the
//!   duration of the call.
//! - Handles are checked: a destroyed or unknown handle turns the call into a
//!   no-op reported on the log channel. So does a callback calling back into
//!   the handle whose call emitted the message.

/// Process-wide configuration calls.
pub mod config;
/// Exported C entry points.
pub mod exports;
/// Log forwarding to a C callback.
pub mod forward;
/// Engine instance table.
pub mod instance;
/// Per-handle lifecycle and event forwarding.
pub mod session;

pub use dof_engine::{Engine, EngineStatus, EventRecord, LogLevel, SessionInfo, StateEngine};
pub use forward::LogCallback;
pub use instance::{
    BridgeError, EngineFactory, Handle, create, destroy, live_instances, set_engine_factory,
};
pub use session::{Instance, data_receive, finish, init, status};
