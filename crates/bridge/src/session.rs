use dof_engine::{EngineStatus, EventRecord, log_error};

use crate::instance::{BridgeError, Handle, create, destroy, with_engine};

/// Start a session on `handle`. An empty `table_filename` means no table
/// file. Calling it again starts a new session on the same instance.
pub fn init(handle: Handle, table_filename: &str, rom_name: &str) -> Result<(), BridgeError> {
    with_engine(handle, |engine| engine.init(table_filename, rom_name))
}

/// Forward one event as-is. The bridge adds no allocation; only the instance
/// lock is taken.
pub fn data_receive(handle: Handle, kind: u8, number: i32, value: i32) -> Result<(), BridgeError> {
    with_engine(handle, |engine| {
        engine.data_receive(EventRecord::new(kind, number, value))
    })
}

/// End the current session. The handle stays valid.
pub fn finish(handle: Handle) -> Result<(), BridgeError> {
    with_engine(handle, |engine| engine.finish())
}

/// Current engine state behind `handle`.
pub fn status(handle: Handle) -> Result<EngineStatus, BridgeError> {
    with_engine(handle, |engine| engine.status())
}

/// Owned engine instance.
///
/// Dropping it finishes any active session and then destroys the handle, so
/// an early return or unwind never leaves outputs driven.
#[derive(Debug)]
pub struct Instance {
    handle: Handle,
}

impl Instance {
    /// Create a new engine instance.
    pub fn new() -> Self {
        Self { handle: create() }
    }

    /// Handle of this instance.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// See [`init`].
    pub fn init(&self, table_filename: &str, rom_name: &str) -> Result<(), BridgeError> {
        init(self.handle, table_filename, rom_name)
    }

    /// See [`data_receive`].
    pub fn data_receive(&self, kind: u8, number: i32, value: i32) -> Result<(), BridgeError> {
        data_receive(self.handle, kind, number, value)
    }

    /// See [`finish`].
    pub fn finish(&self) -> Result<(), BridgeError> {
        finish(self.handle)
    }

    /// See [`status`].
    pub fn status(&self) -> Result<EngineStatus, BridgeError> {
        status(self.handle)
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        if let Err(err) = finish(self.handle).and_then(|()| destroy(self.handle)) {
            log_error!("dropping engine instance: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::instance::live_instances;
    use crate::test_support::{self, capture, take_captured};

    #[test]
    fn handles_do_not_share_engine_state() {
        let _guard = test_support::lock();
        let a = create();
        let b = create();

        init(a, "", "afm").unwrap();
        data_receive(a, b'S', 27, 1).unwrap();
        data_receive(a, b'L', 88, 5).unwrap();

        let status_b = status(b).unwrap();
        assert_eq!(status_b, EngineStatus::default());

        init(b, "tables/tna.vpx", "tna").unwrap();
        data_receive(b, b'E', 103, 1).unwrap();
        finish(b).unwrap();

        let status_a = status(a).unwrap();
        assert_eq!(status_a.session.as_ref().unwrap().rom_name, "afm");
        assert_eq!(status_a.events_received, 2);
        assert_eq!(status_a.active_elements, 2);
        assert_eq!(status_a.sessions_started, 1);

        destroy(a).unwrap();
        destroy(b).unwrap();
    }

    #[test]
    fn init_finish_init_matches_a_fresh_session() {
        let _guard = test_support::lock();
        let reused = create();
        let fresh = create();

        init(reused, "", "ij_l7").unwrap();
        data_receive(reused, b'L', 88, 1).unwrap();
        finish(reused).unwrap();
        assert_eq!(status(reused).unwrap().session, None);
        init(reused, "", "ij_l7").unwrap();

        init(fresh, "", "ij_l7").unwrap();

        let reused_status = status(reused).unwrap();
        let fresh_status = status(fresh).unwrap();
        assert_eq!(reused_status.session, fresh_status.session);
        assert_eq!(reused_status.events_received, fresh_status.events_received);
        assert_eq!(reused_status.active_elements, fresh_status.active_elements);

        destroy(reused).unwrap();
        destroy(fresh).unwrap();
    }

    #[test]
    fn dropping_an_instance_finishes_then_destroys() {
        let _guard = test_support::lock();
        config::set_log_callback(Some(capture));
        let before = live_instances();

        let instance = Instance::new();
        let handle = instance.handle();
        instance.init("", "afm").unwrap();
        instance.data_receive(b'S', 27, 1).unwrap();
        assert_eq!(live_instances(), before + 1);
        take_captured();

        drop(instance);
        assert_eq!(
            take_captured(),
            vec![(0, "DOF finished: rom=afm, events=1".to_string())]
        );
        assert_eq!(live_instances(), before);
        assert_eq!(
            status(handle),
            Err(BridgeError::UnknownHandle(handle.into_raw()))
        );
    }

    #[test]
    fn calls_on_destroyed_handles_fail() {
        let _guard = test_support::lock();
        let handle = create();
        destroy(handle).unwrap();

        let err = BridgeError::UnknownHandle(handle.into_raw());
        assert_eq!(init(handle, "", "afm"), Err(err.clone()));
        assert_eq!(data_receive(handle, b'S', 1, 1), Err(err.clone()));
        assert_eq!(finish(handle), Err(err.clone()));
        assert_eq!(status(handle), Err(err));
    }
}
