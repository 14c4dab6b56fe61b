mod lifecycle;
mod telemetry;
mod tick;


use std::sync::atomic::Ordering;
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use hanare_ipc::{EngineEvent, EngineStatus, TrackedWindowInfo};
use parking_lot::Mutex;

pub use lifecycle::EngineLifecycle;
pub use telemetry::{Cadence, PerformanceSample};

use self::tick::Shared;
use crate::core::{
    analyze_changes, ConfigError, ConfigurationDelta, EngineConfiguration, TrackedWindow,
    WindowId,
};
use crate::event_emitter::{window_to_info, EventEmitter};
use crate::platform::Platform;

struct Workers {
    stop_txs: Vec<std_mpsc::Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

/// Owns the tracking table and drives the tick and discovery threads.
///
/// Every method takes `&self`; the engine is shared behind an `Arc` between
/// the main loop and the IPC handlers.
pub struct Engine<P: Platform> {
    shared: Arc<Shared<P>>,
    workers: Mutex<Option<Workers>>,
}

impl<P: Platform> Engine<P> {
    pub fn new(
        platform: Arc<P>,
        config: EngineConfiguration,
        emitter: EventEmitter,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::new(platform, config, emitter)),
            workers: Mutex::new(None),
        })
    }

    pub fn lifecycle(&self) -> EngineLifecycle {
        *self.shared.lifecycle.read()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle() == EngineLifecycle::Running
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Paused engines keep tracking windows but never move them.
    pub fn set_paused(&self, paused: bool) {
        if self.shared.paused.swap(paused, Ordering::AcqRel) != paused {
            tracing::info!("Engine {}", if paused { "paused" } else { "resumed" });
        }
    }

    pub fn config(&self) -> Arc<EngineConfiguration> {
        self.shared.config()
    }

    /// Start the tick and discovery threads. Starting a running engine is a
    /// no-op.
    pub fn start(&self) -> Result<()> {
        let mut workers = self.workers.lock();
        if workers.is_some() {
            tracing::debug!("Engine already running");
            return Ok(());
        }

        let config = self.shared.config();
        let now = Instant::now();
        self.shared.topology_dirty.store(false, Ordering::Release);
        self.shared.reload_topology();
        self.shared.discover(now);
        self.shared.telemetry.lock().reset();

        let (tick_tx, tick_rx) = std_mpsc::channel();
        let (discovery_tx, discovery_rx) = std_mpsc::channel();

        let tick_handle = {
            let shared = Arc::clone(&self.shared);
            let mut cadence = Cadence::new(config.update_interval(), config.max_update_interval());
            thread::Builder::new()
                .name("hanare-tick".into())
                .spawn(move || {
                    run_until_stopped(&tick_rx, cadence.interval(), || {
                        let started = Instant::now();
                        shared.tick(started);
                        cadence.record(started.elapsed());
                        cadence.interval()
                    })
                })?
        };

        let discovery_handle = {
            let shared = Arc::clone(&self.shared);
            let interval = config.discovery_interval();
            thread::Builder::new()
                .name("hanare-discovery".into())
                .spawn(move || {
                    run_until_stopped(&discovery_rx, interval, || {
                        shared.discover(Instant::now());
                        interval
                    })
                })?
        };

        *workers = Some(Workers {
            stop_txs: vec![tick_tx, discovery_tx],
            handles: vec![tick_handle, discovery_handle],
        });
        *self.shared.lifecycle.write() = EngineLifecycle::Running;

        tracing::info!(
            "Engine started: {} window(s) on {} monitor(s), tick {:?}",
            self.shared.table.len(),
            self.shared.topology().len(),
            config.update_interval()
        );
        self.shared.emitter.emit_engine_started();
        Ok(())
    }

    /// Stop both threads, waiting for an in-flight tick, and forget every
    /// tracked window. Stopping a stopped engine is a no-op.
    pub fn stop(&self) {
        let Some(workers) = self.workers.lock().take() else {
            tracing::debug!("Engine not running");
            return;
        };

        for tx in &workers.stop_txs {
            let _ = tx.send(());
        }
        drop(workers.stop_txs);
        for handle in workers.handles {
            if handle.join().is_err() {
                tracing::error!("Engine thread panicked");
            }
        }

        let _tick = self.shared.tick_lock.lock();
        self.shared.animations.lock().cancel_all();
        self.shared.table.clear();
        self.shared.override_active.store(false, Ordering::Release);
        *self.shared.lifecycle.write() = EngineLifecycle::Stopped;

        tracing::info!("Engine stopped");
        self.shared.emitter.emit_engine_stopped();
    }

    /// Run one tick as if the clock read `now`.
    #[cfg(test)]
    pub fn tick_at(&self, now: Instant) {
        self.shared.tick(now);
    }

    /// Run one discovery pass as if the clock read `now`.
    #[cfg(test)]
    pub fn discover_at(&self, now: Instant) {
        self.shared.discover(now);
    }

    /// Reload the monitor topology before the next tick does anything else.
    pub fn notify_topology_changed(&self) {
        tracing::debug!("Monitor topology change flagged");
        self.shared.topology_dirty.store(true, Ordering::Release);
    }

    /// Validate `new` and apply its hot-swappable settings. Restart-required
    /// settings keep their running values until [`Engine::restart_with`].
    pub fn apply_configuration(
        &self,
        new: EngineConfiguration,
    ) -> Result<ConfigurationDelta, ConfigError> {
        new.validate()?;

        let delta = {
            let mut current = self.shared.config.write();
            let delta = analyze_changes(&current, &new);
            if !delta.hot_swappable.is_empty() {
                *current = Arc::new(current.merge_hot_swappable(&new));
            }
            delta
        };

        if delta.is_empty() {
            tracing::debug!("Configuration unchanged");
        } else {
            tracing::info!(
                "Configuration updated: applied {:?}, pending restart {:?}",
                delta.hot_swappable,
                delta.restart_required
            );
            self.shared.emitter.emit_configuration_updated(&delta);
        }
        Ok(delta)
    }

    /// Replace the whole configuration, restarting the engine if it was
    /// running.
    pub fn restart_with(&self, config: EngineConfiguration) -> Result<()> {
        config.validate()?;
        let was_running = self.is_running();
        self.stop();
        *self.shared.config.write() = Arc::new(config);
        self.shared.topology_dirty.store(true, Ordering::Release);
        if was_running {
            self.start()?;
        }
        tracing::info!("Engine restarted with new configuration");
        Ok(())
    }

    pub fn status(&self) -> EngineStatus {
        let lifecycle = self.lifecycle();
        let lifecycle = if lifecycle == EngineLifecycle::Running && self.is_paused() {
            "paused"
        } else {
            lifecycle.as_str()
        };
        EngineStatus {
            lifecycle: lifecycle.to_string(),
            tracked_windows: self.shared.table.len(),
            monitors: self.shared.topology().len(),
            override_active: self.shared.override_active.load(Ordering::Acquire),
        }
    }

    pub fn tracked(&self, id: WindowId) -> Option<TrackedWindow> {
        self.shared.table.get(id)
    }

    pub fn windows(&self) -> Vec<TrackedWindowInfo> {
        self.shared
            .table
            .snapshot()
            .iter()
            .map(window_to_info)
            .collect()
    }

    pub fn snapshot_event(&self) -> EngineEvent {
        EngineEvent::Snapshot {
            status: self.status(),
            windows: self.windows(),
        }
    }
}

impl<P: Platform> Drop for Engine<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Call `work` until a stop signal arrives or every sender is gone. `work`
/// returns how long to wait before the next call.
fn run_until_stopped(
    stop_rx: &std_mpsc::Receiver<()>,
    first: Duration,
    mut work: impl FnMut() -> Duration,
) {
    let mut interval = first;
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => interval = work(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
