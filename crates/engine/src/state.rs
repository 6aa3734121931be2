use std::collections::HashMap;

use crate::config;
use crate::engine::{Engine, EngineStatus, SessionInfo};
use crate::event::EventRecord;
use crate::{log_debug, log_info, log_warn};

const CONFIG_DIR: &str = "directoutputconfig";

/// Built-in engine that tracks the latest value of every addressed element.
///
/// It drives no hardware; it exists so the bridge has a working engine out of
/// the box and so output state can be inspected.
#[derive(Debug, Default)]
pub struct StateEngine {
    session: Option<SessionInfo>,
    elements: HashMap<(u8, i32), i32>,
    events_received: u64,
    sessions_started: u64,
}

impl StateEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle engine behind the [`Engine`] trait object.
    pub fn boxed() -> Box<dyn Engine> {
        Box::new(Self::new())
    }

    /// Latest non-zero value of an element in the current session.
    pub fn element_value(&self, kind: u8, number: i32) -> Option<i32> {
        self.elements.get(&(kind, number)).copied()
    }

    fn check_base_path() -> Option<String> {
        match config::resolve_base_path() {
            Ok(path) => {
                let config_dir = path.join(CONFIG_DIR);
                if !config_dir.is_dir() {
                    log_warn!("config directory not found: {}", config_dir.display());
                }
                Some(path.display().to_string())
            }
            Err(err) => {
                log_warn!("unable to resolve base path: {err:#}");
                None
            }
        }
    }
}

impl Engine for StateEngine {
    fn init(&mut self, table_filename: &str, rom_name: &str) {
        if self.session.is_some() {
            self.finish();
        }

        let base_path = Self::check_base_path();
        let table_filename = (!table_filename.is_empty()).then(|| table_filename.to_string());
        log_info!(
            "DOF initialized: rom={rom_name}, table={}",
            table_filename.as_deref().unwrap_or("<none>")
        );

        self.session = Some(SessionInfo {
            rom_name: rom_name.to_string(),
            table_filename,
            base_path,
        });
        self.sessions_started += 1;
        self.events_received = 0;
        self.elements.clear();
    }

    fn data_receive(&mut self, event: EventRecord) {
        if self.session.is_none() {
            log_debug!("event {event} ignored: no active session");
            return;
        }

        self.events_received += 1;
        let key = (event.kind, event.number);
        let previous = if event.value == 0 {
            self.elements.remove(&key)
        } else {
            self.elements.insert(key, event.value)
        };
        if previous.unwrap_or(0) != event.value {
            log_debug!("{} {event}", event.element().label());
        }
    }

    fn finish(&mut self) {
        let Some(session) = self.session.take() else {
            log_debug!("finish: no active session");
            return;
        };
        log_info!(
            "DOF finished: rom={}, events={}",
            session.rom_name,
            self.events_received
        );
        self.events_received = 0;
        self.elements.clear();
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            session: self.session.clone(),
            sessions_started: self.sessions_started,
            events_received: self.events_received,
            active_elements: self.elements.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogLevel;
    use crate::test_support::{self, record, take_recorded};

    #[test]
    fn events_before_init_are_ignored() {
        let _guard = test_support::lock();
        let mut engine = StateEngine::new();
        engine.data_receive(EventRecord::new(b'S', 27, 1));
        assert_eq!(engine.status(), EngineStatus::default());
        assert_eq!(engine.element_value(b'S', 27), None);
    }

    #[test]
    fn tracks_latest_values_and_logs_changes() {
        let _guard = test_support::lock();
        config::set_base_path("/nonexistent/dof-test/");
        config::set_log_hook(Some(record));
        config::set_log_level(LogLevel::Debug);

        let mut engine = StateEngine::new();
        engine.init("", "afm");
        take_recorded();

        engine.data_receive(EventRecord::new(b'S', 27, 1));
        engine.data_receive(EventRecord::new(b'S', 27, 1));
        engine.data_receive(EventRecord::new(b'L', 88, 200));
        engine.data_receive(EventRecord::new(b'S', 27, 0));

        assert_eq!(engine.element_value(b'S', 27), None);
        assert_eq!(engine.element_value(b'L', 88), Some(200));
        let status = engine.status();
        assert_eq!(status.events_received, 4);
        assert_eq!(status.active_elements, 1);

        let messages: Vec<String> = take_recorded().into_iter().map(|(_, m)| m).collect();
        assert_eq!(messages, vec!["solenoid S27=1", "lamp L88=200", "solenoid S27=0"]);
    }

    #[test]
    fn init_warns_on_missing_config_dir_and_records_session() {
        let _guard = test_support::lock();
        config::set_base_path("/nonexistent/dof-test/");
        config::set_log_hook(Some(record));

        let mut engine = StateEngine::new();
        engine.init("tables/afm.vpx", "afm");

        let recorded = take_recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0, LogLevel::Warn);
        assert!(recorded[0].1.contains(CONFIG_DIR));
        assert_eq!(
            recorded[1],
            (
                LogLevel::Info,
                "DOF initialized: rom=afm, table=tables/afm.vpx".to_string()
            )
        );

        let session = engine.status().session.unwrap();
        assert_eq!(session.rom_name, "afm");
        assert_eq!(session.table_filename.as_deref(), Some("tables/afm.vpx"));
        assert_eq!(session.base_path.as_deref(), Some("/nonexistent/dof-test/"));
    }

    #[test]
    fn reinit_starts_a_fresh_session() {
        let _guard = test_support::lock();
        config::set_base_path("/nonexistent/dof-test/");

        let mut engine = StateEngine::new();
        engine.init("", "afm");
        let first = engine.status();
        engine.data_receive(EventRecord::new(b'W', 74, 1));
        engine.finish();
        engine.finish();
        assert_eq!(engine.status().session, None);

        engine.init("", "afm");
        let second = engine.status();
        assert_eq!(second.session, first.session);
        assert_eq!(second.events_received, 0);
        assert_eq!(second.active_elements, 0);
        assert_eq!(second.sessions_started, 2);

        engine.data_receive(EventRecord::new(b'E', 103, 1));
        engine.init("", "tna");
        let third = engine.status();
        assert_eq!(third.session.unwrap().rom_name, "tna");
        assert_eq!(third.active_elements, 0);
        assert_eq!(third.sessions_started, 3);

        let json = serde_json::to_value(engine.status()).unwrap();
        assert_eq!(json["session"]["rom_name"], "tna");
        assert!(json["session"].get("table_filename").is_none());
    }
}
