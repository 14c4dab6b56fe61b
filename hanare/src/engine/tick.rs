use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use super::lifecycle::EngineLifecycle;
use super::telemetry::Telemetry;
use crate::core::{
    hover, nearest_edge_distance, proximity, wrap, Animation, AnimationDriver,
    EngineConfiguration, Frame, HoverInput, HoverSettings, MonitorTopology, Point, Sensitivity,
    TrackingTable, WindowId, WrapError, WrapRequest,
};
use crate::event_emitter::EventEmitter;
use crate::platform::{Platform, PlatformError};

#[derive(Debug, Error)]
pub(super) enum TickError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Wrap(#[from] WrapError),
}

/// State shared by the engine handle, the tick thread and the discovery
/// thread.
pub(super) struct Shared<P> {
    pub platform: Arc<P>,
    pub config: RwLock<Arc<EngineConfiguration>>,
    pub topology: RwLock<Arc<MonitorTopology>>,
    pub topology_dirty: AtomicBool,
    pub table: TrackingTable,
    pub animations: Mutex<AnimationDriver>,
    pub telemetry: Mutex<Telemetry>,
    pub lifecycle: RwLock<EngineLifecycle>,
    pub paused: AtomicBool,
    pub override_active: AtomicBool,
    pub emitter: EventEmitter,
    /// Held for the duration of a tick so stop waits for it.
    pub tick_lock: Mutex<()>,
}

impl<P: Platform> Shared<P> {
    pub fn new(platform: Arc<P>, config: EngineConfiguration, emitter: EventEmitter) -> Self {
        Self {
            platform,
            config: RwLock::new(Arc::new(config)),
            topology: RwLock::new(Arc::new(MonitorTopology::default())),
            topology_dirty: AtomicBool::new(true),
            table: TrackingTable::new(),
            animations: Mutex::new(AnimationDriver::new()),
            telemetry: Mutex::new(Telemetry::default()),
            lifecycle: RwLock::new(EngineLifecycle::Idle),
            paused: AtomicBool::new(false),
            override_active: AtomicBool::new(false),
            emitter,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> Arc<EngineConfiguration> {
        Arc::clone(&self.config.read())
    }

    pub fn topology(&self) -> Arc<MonitorTopology> {
        Arc::clone(&self.topology.read())
    }

    pub fn reload_topology(&self) {
        let topology = MonitorTopology::new(self.platform.get_monitors());
        if topology.is_empty() {
            tracing::warn!("No monitors reported; windows will not be pushed");
        }
        for m in topology.iter() {
            tracing::info!(
                "Monitor [{}] {}: {:?} work area {:?} scale {}",
                m.id,
                m.name,
                m.bounds,
                m.work_area,
                m.dpi.scale
            );
        }
        *self.topology.write() = Arc::new(topology);
    }

    pub fn discover(&self, now: Instant) {
        let config = self.config();
        let infos = self.platform.get_windows();
        let result = self.table.sync(&infos, now, config.apply_to_all_windows);
        if result.has_changes() {
            let mut animations = self.animations.lock();
            for id in &result.removed {
                animations.cancel(*id);
            }
            tracing::debug!(
                "Discovery: +{} -{} ({} tracked)",
                result.added.len(),
                result.removed.len(),
                self.table.len()
            );
        }
    }

    pub fn tick(&self, now: Instant) {
        let _guard = self.tick_lock.lock();
        let started = Instant::now();

        if self.topology_dirty.swap(false, Ordering::AcqRel) {
            self.reload_topology();
        }
        if self.paused.load(Ordering::Acquire) {
            return;
        }

        let config = self.config();
        let topology = self.topology();

        let override_held =
            config.override_enabled && self.platform.is_modifier_held(config.override_key);
        let cursor = self.platform.cursor_position();

        if override_held {
            self.engage_override(now, &config);
        } else {
            if self.override_active.swap(false, Ordering::AcqRel) {
                tracing::info!("Override released");
            }

            let frames = self.animations.lock().advance(now);
            for frame in frames {
                self.apply_frame(frame);
            }

            if let Some(cursor) = cursor {
                for id in self.table.ids() {
                    if let Err(e) = self.process_window(id, cursor, now, &config, &topology) {
                        tracing::warn!("Skipping window {} this tick: {}", id, e);
                    }
                }
            }
        }

        let sample = self
            .telemetry
            .lock()
            .record(started.elapsed(), now, self.table.len());
        if let Some(sample) = sample {
            tracing::debug!(
                "Tick avg {}us max {}us over {} ticks",
                sample.average_tick_micros,
                sample.max_tick_micros,
                sample.tick_count
            );
            self.emitter.emit_performance_sample(&sample);
        }
    }

    fn engage_override(&self, now: Instant, config: &EngineConfiguration) {
        let cancelled = self.animations.lock().cancel_all();
        for id in &cancelled {
            self.table.update(*id, |w| w.is_animating = false);
        }

        let input = HoverInput {
            now,
            cursor_inside: false,
            within_proximity: false,
            edge_distance: 0.0,
            override_held: true,
        };
        let settings = HoverSettings {
            proximity_threshold: config.proximity_threshold as f64,
            hover_timeout: config.hover_timeout(),
            override_release_tolerance: config.override_release_tolerance as f64,
        };
        for id in self.table.ids() {
            self.table.update(id, |w| {
                hover::step(&mut w.hover, &input, &settings);
            });
        }

        if !self.override_active.swap(true, Ordering::AcqRel) {
            tracing::info!(
                "Override engaged, {} animation(s) cancelled",
                cancelled.len()
            );
        }
    }

    fn apply_frame(&self, frame: Frame) {
        let id = frame.window_id;
        if let Err(e) = self.platform.set_window_rect(id, &frame.rect) {
            tracing::warn!("Failed to animate window {}: {}", id, e);
            self.animations.lock().cancel(id);
            self.table.update(id, |w| w.is_animating = false);
            return;
        }

        let alive = self.table.update(id, |w| {
            w.bounds = frame.rect;
            if frame.finished {
                w.is_animating = false;
            }
        });
        if !alive {
            self.animations.lock().cancel(id);
            return;
        }

        if frame.finished {
            self.emitter.emit_window_pushed(
                id,
                frame.from,
                frame.rect,
                frame.monitor_id,
                frame.crossed_monitor,
            );
        }
    }

    fn process_window(
        &self,
        id: WindowId,
        cursor: Point,
        now: Instant,
        config: &EngineConfiguration,
        topology: &MonitorTopology,
    ) -> Result<(), TickError> {
        let Some(window) = self.table.get(id) else {
            return Ok(());
        };
        if self.animations.lock().is_animating(id) {
            return Ok(());
        }
        let Some(monitor) = topology.monitor_for_rect(&window.bounds) else {
            return Ok(());
        };
        let settings = config.for_monitor(monitor.id);
        if !settings.enabled {
            return Ok(());
        }

        let mut threshold = settings.proximity_threshold;
        if window.is_topmost {
            threshold = threshold.saturating_add(config.topmost_repel_border);
        }
        let threshold = monitor.to_physical(threshold as f64);

        let sensitivity = Sensitivity {
            x: config.sensitivity_x,
            y: config.sensitivity_y,
        };
        let prox = proximity::evaluate(
            cursor,
            &window.bounds,
            config.proximity_algorithm,
            sensitivity,
            threshold,
        );

        let input = HoverInput {
            now,
            cursor_inside: window.bounds.contains(cursor),
            within_proximity: prox.within,
            edge_distance: nearest_edge_distance(cursor, &window.bounds),
            override_held: false,
        };
        let hover_settings = HoverSettings {
            proximity_threshold: threshold,
            hover_timeout: config.hover_timeout(),
            override_release_tolerance: monitor
                .to_physical(config.override_release_tolerance as f64),
        };

        let mut record = window.hover;
        let permitted = hover::step(&mut record, &input, &hover_settings);
        let alive = self.table.update(id, |w| {
            w.hover = record;
            w.in_proximity = prox.within;
            w.last_proximity_check = Some(now);
        });
        if !alive || !permitted {
            return Ok(());
        }

        let current = self.platform.get_window_rect(id)?;
        let decision = wrap::resolve(
            &WrapRequest {
                current,
                push: prox.push,
                distance: monitor.to_physical(settings.push_distance as f64),
                source: monitor.id,
                edge_buffer: config.edge_buffer,
            },
            topology,
            &config.multi_monitor,
        )?;
        if decision.rect == current {
            return Ok(());
        }

        tracing::debug!(
            "Pushing window {} ({:.0}px from cursor) {:?} -> {:?} [{:?}]",
            id,
            prox.distance,
            current,
            decision.rect,
            decision.outcome
        );

        let duration = config.animation_duration();
        if duration.is_zero() {
            self.platform.set_window_rect(id, &decision.rect)?;
            self.table.update(id, |w| w.bounds = decision.rect);
            self.emitter.emit_window_pushed(
                id,
                current,
                decision.rect,
                decision.monitor_id,
                decision.crossed_monitor,
            );
        } else {
            self.table.update(id, |w| w.is_animating = true);
            self.animations.lock().begin(Animation::new(
                id,
                current,
                &decision,
                now,
                duration,
                config.animation_easing,
            ));
        }
        Ok(())
    }
}
