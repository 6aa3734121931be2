use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use thiserror::Error;

use dof_engine::{Engine, StateEngine};

/// Constructor used by [`create`].
pub type EngineFactory = fn() -> Box<dyn Engine>;

/// Opaque engine identity handed to callers.
///
/// Ids are never reused, so a stale handle can never address a newer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Wrap a raw token; `0` is never a valid handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw token for the C surface.
    pub fn into_raw(self) -> u64 {
        self.0.get()
    }
}

/// Errors from handle-addressed calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The null handle was passed.
    #[error("null engine handle")]
    NullHandle,

    /// The handle was never issued or has been destroyed.
    #[error("unknown or destroyed engine handle: {0}")]
    UnknownHandle(u64),

    /// A required argument was null.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// The handle was called again from inside one of its own calls, for
    /// example from the log callback.
    #[error("engine handle {0} is already in a call on this thread")]
    Reentrant(u64),
}

type Slot = Arc<Mutex<Box<dyn Engine>>>;

struct InstanceTable {
    next_id: NonZeroU64,
    live: HashMap<NonZeroU64, Slot>,
}

static TABLE: Lazy<RwLock<InstanceTable>> = Lazy::new(|| {
    RwLock::new(InstanceTable {
        next_id: NonZeroU64::MIN,
        live: HashMap::new(),
    })
});

static FACTORY: RwLock<EngineFactory> = RwLock::new(StateEngine::boxed as EngineFactory);

fn table() -> RwLockReadGuard<'static, InstanceTable> {
    TABLE.read().unwrap_or_else(PoisonError::into_inner)
}

fn table_mut() -> RwLockWriteGuard<'static, InstanceTable> {
    TABLE.write().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    static IN_CALL: RefCell<Vec<NonZeroU64>> = const { RefCell::new(Vec::new()) };
}

/// Marks a handle as busy on the current thread until dropped.
struct CallMarker(NonZeroU64);

impl CallMarker {
    fn enter(id: NonZeroU64) -> Option<Self> {
        IN_CALL.with_borrow_mut(|busy| {
            if busy.contains(&id) {
                return None;
            }
            busy.push(id);
            Some(Self(id))
        })
    }
}

impl Drop for CallMarker {
    fn drop(&mut self) {
        IN_CALL.with_borrow_mut(|busy| {
            if let Some(pos) = busy.iter().rposition(|id| *id == self.0) {
                busy.remove(pos);
            }
        });
    }
}

/// Replace the constructor used for new instances. Live instances keep the
/// engine they were created with.
pub fn set_engine_factory(factory: EngineFactory) {
    *FACTORY.write().unwrap_or_else(PoisonError::into_inner) = factory;
}

/// Construct a new engine instance and return its handle.
pub fn create() -> Handle {
    let factory = *FACTORY.read().unwrap_or_else(PoisonError::into_inner);
    let engine = factory();

    let mut table = table_mut();
    let id = table.next_id;
    table.next_id = id.saturating_add(1);
    table.live.insert(id, Arc::new(Mutex::new(engine)));
    Handle(id)
}

/// Release the instance behind `handle`.
///
/// A call still running on another thread keeps the engine alive until it
/// returns.
pub fn destroy(handle: Handle) -> Result<(), BridgeError> {
    let slot = table_mut()
        .live
        .remove(&handle.0)
        .ok_or(BridgeError::UnknownHandle(handle.into_raw()))?;
    drop(slot);
    Ok(())
}

/// Number of live instances.
pub fn live_instances() -> usize {
    table().live.len()
}

/// Run `f` against the engine behind `handle`.
///
/// The table is only read-locked for the lookup and released before `f`
/// runs; only the instance's own lock is held, so calls on different handles
/// never wait on each other. A call on a handle that is already inside `f` on
/// this thread fails with [`BridgeError::Reentrant`] instead of deadlocking.
pub(crate) fn with_engine<R>(
    handle: Handle,
    f: impl FnOnce(&mut dyn Engine) -> R,
) -> Result<R, BridgeError> {
    let _marker =
        CallMarker::enter(handle.0).ok_or(BridgeError::Reentrant(handle.into_raw()))?;
    let slot = table()
        .live
        .get(&handle.0)
        .cloned()
        .ok_or(BridgeError::UnknownHandle(handle.into_raw()))?;
    let mut engine = slot.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&mut **engine))
}
