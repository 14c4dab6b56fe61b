mod channels;
mod command;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hanare_ipc::Command;

use crate::config_store::ConfigStore;
#[cfg(target_os = "macos")]
use crate::config_store::JsonConfigStore;
use crate::engine::Engine;
use crate::event_emitter::EventEmitter;
use crate::platform::Platform;
use channels::MainChannels;

/// How long the main thread sleeps (or pumps its run loop) between polls.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct App {}

impl App {
    #[cfg(target_os = "macos")]
    pub fn run() -> Result<()> {
        if !crate::macos::is_trusted() {
            tracing::warn!("Accessibility permission not granted, requesting...");
            crate::macos::is_trusted_with_prompt();
            anyhow::bail!("Please grant Accessibility permission and restart");
        }
        let platform = Arc::new(crate::platform::MacOSPlatform::new());
        Self::run_with(platform, Box::new(JsonConfigStore::discover()))
    }

    #[cfg(not(target_os = "macos"))]
    pub fn run() -> Result<()> {
        anyhow::bail!("hanare currently only runs on macOS")
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    fn run_with<P: Platform>(platform: Arc<P>, store: Box<dyn ConfigStore>) -> Result<()> {
        let config = store.load()?;
        tracing::info!("Configuration loaded from {:?}", store.path());

        let (tokio_channels, main_channels) = channels::create_channels();
        std::thread::Builder::new()
            .name("hanare-tokio".into())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(channels::run_async(tokio_channels)),
                Err(e) => tracing::error!("Failed to start tokio runtime: {}", e),
            })?;

        let emitter = EventEmitter::new(main_channels.engine_event_tx.clone());
        let engine = Engine::new(platform, config, emitter)?;

        #[cfg(target_os = "macos")]
        crate::macos::register_display_callback(main_channels.display_reconfig_tx.clone())?;

        engine.start()?;
        run_main_loop(&engine, store.as_ref(), &main_channels);
        engine.stop();

        tracing::info!("hanare exiting");
        Ok(())
    }
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn run_main_loop<P: Platform>(engine: &Engine<P>, store: &dyn ConfigStore, channels: &MainChannels) {
    tracing::info!("Starting main loop");
    loop {
        wait(POLL_INTERVAL);

        #[cfg(target_os = "macos")]
        {
            let changes = channels.display_reconfig_rx.try_iter().count();
            if changes > 0 {
                tracing::info!("Display configuration changed ({} event(s))", changes);
                engine.notify_topology_changed();
            }
        }

        while let Ok(resp_tx) = channels.snapshot_request_rx.try_recv() {
            let _ = resp_tx.send(engine.snapshot_event());
        }

        while let Ok((cmd, resp_tx)) = channels.ipc_cmd_rx.try_recv() {
            tracing::debug!("Received IPC command: {:?}", cmd);
            let response = command::handle_command(engine, store, &cmd);
            let _ = resp_tx.blocking_send(response);
            if matches!(cmd, Command::Quit) {
                return;
            }
        }
    }
}

/// Let the main run loop deliver display callbacks for up to `timeout`.
#[cfg(target_os = "macos")]
fn wait(timeout: Duration) {
    use core_foundation_sys::runloop::{kCFRunLoopDefaultMode, CFRunLoopRunInMode};
    unsafe {
        CFRunLoopRunInMode(kCFRunLoopDefaultMode, timeout.as_secs_f64(), 0);
    }
}

#[cfg(not(target_os = "macos"))]
fn wait(timeout: Duration) {
    std::thread::sleep(timeout);
}
