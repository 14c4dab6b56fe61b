use std::sync::mpsc as std_mpsc;

use hanare_ipc::{EngineEvent, TrackedWindowInfo};

use crate::core::{ConfigurationDelta, MonitorId, Rect, TrackedWindow, WindowId};
use crate::engine::PerformanceSample;

/// Sends engine events from the engine threads to the tokio thread, which
/// fans them out to subscribers.
#[derive(Clone)]
pub struct EventEmitter {
    tx: std_mpsc::Sender<EngineEvent>,
}

impl EventEmitter {
    pub fn new(tx: std_mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: EngineEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("Failed to emit event (no receivers?): {}", e);
        }
    }

    pub fn emit_engine_started(&self) {
        self.emit(EngineEvent::EngineStarted);
    }

    pub fn emit_engine_stopped(&self) {
        self.emit(EngineEvent::EngineStopped);
    }

    pub fn emit_window_pushed(
        &self,
        window_id: WindowId,
        old: Rect,
        new: Rect,
        monitor_id: MonitorId,
        crossed_monitor: bool,
    ) {
        self.emit(EngineEvent::WindowPushed {
            window_id,
            old: old.into(),
            new: new.into(),
            monitor_id,
            crossed_monitor,
        });
    }

    pub fn emit_performance_sample(&self, sample: &PerformanceSample) {
        self.emit(EngineEvent::PerformanceSample {
            average_tick_micros: sample.average_tick_micros,
            max_tick_micros: sample.max_tick_micros,
            tick_count: sample.tick_count,
            tracked_windows: sample.tracked_windows,
        });
    }

    pub fn emit_configuration_updated(&self, delta: &ConfigurationDelta) {
        self.emit(EngineEvent::ConfigurationUpdated {
            delta: delta.to_info(),
        });
    }
}

pub fn window_to_info(window: &TrackedWindow) -> TrackedWindowInfo {
    TrackedWindowInfo {
        id: window.id,
        title: window.title.clone(),
        owner_name: window.owner_name.clone(),
        x: window.bounds.x,
        y: window.bounds.y,
        width: window.bounds.width,
        height: window.bounds.height,
        hover_state: window.hover.state.as_str().to_string(),
        is_topmost: window.is_topmost,
        is_animating: window.is_animating,
        in_proximity: window.in_proximity,
    }
}
