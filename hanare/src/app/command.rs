use hanare_ipc::{Command, Response};

use crate::config_store::ConfigStore;
use crate::engine::Engine;
use crate::platform::Platform;

/// Run one IPC command against the engine.
pub fn handle_command<P: Platform>(
    engine: &Engine<P>,
    store: &dyn ConfigStore,
    cmd: &Command,
) -> Response {
    match cmd {
        Command::Status => Response::Status {
            status: engine.status(),
        },
        Command::ListWindows => Response::Windows {
            windows: engine.windows(),
        },
        Command::GetConfig => match serde_json::to_value(&*engine.config()) {
            Ok(config) => Response::Config { config },
            Err(e) => Response::Error {
                message: format!("Failed to serialize configuration: {}", e),
            },
        },
        Command::ReloadConfig => reload_config(engine, store),
        Command::Pause => {
            engine.set_paused(true);
            Response::Ok
        }
        Command::Resume => {
            engine.set_paused(false);
            Response::Ok
        }
        Command::Quit => {
            tracing::info!("Quit command received");
            Response::Ok
        }
    }
}

fn reload_config<P: Platform>(engine: &Engine<P>, store: &dyn ConfigStore) -> Response {
    let config = match store.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Config reload failed: {:#}", e);
            return Response::Error {
                message: format!("{:#}", e),
            };
        }
    };

    let delta = match engine.apply_configuration(config.clone()) {
        Ok(delta) => delta,
        Err(e) => {
            tracing::warn!("Rejected configuration from {:?}: {}", store.path(), e);
            return Response::Error {
                message: e.to_string(),
            };
        }
    };

    let restarted = delta.requires_restart();
    if restarted {
        tracing::info!(
            "Restarting engine for {:?}",
            delta.restart_required
        );
        if let Err(e) = engine.restart_with(config) {
            tracing::error!("Engine restart failed: {:#}", e);
            return Response::Error {
                message: format!("Engine restart failed: {:#}", e),
            };
        }
    }

    Response::ConfigReloaded {
        delta: delta.to_info(),
        restarted,
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::mpsc as std_mpsc;
    use std::sync::Arc;

    use anyhow::Result;
    use parking_lot::Mutex;

    use super::*;
    use crate::core::EngineConfiguration;
    use crate::event_emitter::EventEmitter;
    use crate::platform::mock::{create_test_monitor, create_topmost_window, MockPlatform};

    struct MemoryStore {
        path: PathBuf,
        config: Mutex<Option<EngineConfiguration>>,
    }

    impl MemoryStore {
        fn new(config: EngineConfiguration) -> Self {
            Self {
                path: PathBuf::from("/memory/config.json"),
                config: Mutex::new(Some(config)),
            }
        }

        fn set(&self, config: Option<EngineConfiguration>) {
            *self.config.lock() = config;
        }
    }

    impl ConfigStore for MemoryStore {
        fn load(&self) -> Result<EngineConfiguration> {
            self.config
                .lock()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("config file unreadable"))
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    fn setup() -> (Engine<MockPlatform>, MemoryStore) {
        let platform = MockPlatform::new()
            .with_monitors(vec![create_test_monitor(1, 0, 0, 1920, 1080, 1.0)])
            .with_windows(vec![create_topmost_window(7, "Notes", 500, 500, 200, 100)]);
        let (tx, _rx) = std_mpsc::channel();
        let engine = Engine::new(
            Arc::new(platform),
            EngineConfiguration::default(),
            EventEmitter::new(tx),
        )
        .unwrap();
        (engine, MemoryStore::new(EngineConfiguration::default()))
    }

    #[test]
    fn test_status_and_list_windows() {
        let (engine, store) = setup();
        engine.discover_at(std::time::Instant::now());

        match handle_command(&engine, &store, &Command::Status) {
            Response::Status { status } => {
                assert_eq!(status.lifecycle, "idle");
                assert_eq!(status.tracked_windows, 1);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        match handle_command(&engine, &store, &Command::ListWindows) {
            Response::Windows { windows } => {
                assert_eq!(windows.len(), 1);
                assert_eq!(windows[0].id, 7);
                assert!(windows[0].is_topmost);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_get_config() {
        let (engine, store) = setup();
        match handle_command(&engine, &store, &Command::GetConfig) {
            Response::Config { config } => {
                assert_eq!(config["push_distance"], 100);
                assert_eq!(config["multi_monitor"]["wrap_preference"], "smart");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_pause_and_resume() {
        let (engine, store) = setup();
        assert!(matches!(
            handle_command(&engine, &store, &Command::Pause),
            Response::Ok
        ));
        assert!(engine.is_paused());
        handle_command(&engine, &store, &Command::Resume);
        assert!(!engine.is_paused());
    }

    #[test]
    fn test_reload_hot_settings() {
        let (engine, store) = setup();
        store.set(Some(EngineConfiguration {
            proximity_threshold: 80,
            ..Default::default()
        }));

        match handle_command(&engine, &store, &Command::ReloadConfig) {
            Response::ConfigReloaded { delta, restarted } => {
                assert_eq!(delta.hot_swappable, vec!["proximity_threshold".to_string()]);
                assert!(delta.restart_required.is_empty());
                assert!(!restarted);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(engine.config().proximity_threshold, 80);
    }

    #[test]
    fn test_reload_restart_required_settings() {
        let (engine, store) = setup();
        store.set(Some(EngineConfiguration {
            discovery_interval_ms: 1000,
            ..Default::default()
        }));

        match handle_command(&engine, &store, &Command::ReloadConfig) {
            Response::ConfigReloaded { delta, restarted } => {
                assert_eq!(delta.restart_required, vec!["discovery_interval_ms".to_string()]);
                assert!(restarted);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(engine.config().discovery_interval_ms, 1000);
    }

    #[test]
    fn test_reload_errors_keep_running_config() {
        let (engine, store) = setup();

        store.set(None);
        assert!(matches!(
            handle_command(&engine, &store, &Command::ReloadConfig),
            Response::Error { .. }
        ));

        store.set(Some(EngineConfiguration {
            push_distance: 0,
            ..Default::default()
        }));
        match handle_command(&engine, &store, &Command::ReloadConfig) {
            Response::Error { message } => assert!(message.contains("push_distance")),
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(*engine.config(), EngineConfiguration::default());
    }
}
