use hanare_ipc::WrapPreference;
use thiserror::Error;

use super::{MonitorDescriptor, MonitorId, MonitorTopology, MultiMonitorSettings, Rect, Side};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapError {
    #[error("no monitors available")]
    NoMonitors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapOutcome {
    /// Destination fit in the usable area as-is.
    Inside,
    Clamped,
    Adjacent,
    Opposite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapDecision {
    pub rect: Rect,
    pub monitor_id: MonitorId,
    pub crossed_monitor: bool,
    pub outcome: WrapOutcome,
}

#[derive(Debug, Clone, Copy)]
pub struct WrapRequest {
    pub current: Rect,
    /// Unit direction of travel.
    pub push: (f64, f64),
    /// Physical pixels.
    pub distance: f64,
    pub source: MonitorId,
    /// Logical pixels.
    pub edge_buffer: u32,
}

/// Work out where a pushed window ends up. The returned rectangle always lies
/// inside the usable area of the returned monitor.
pub fn resolve(
    request: &WrapRequest,
    topology: &MonitorTopology,
    settings: &MultiMonitorSettings,
) -> Result<WrapDecision, WrapError> {
    let source = topology
        .get(request.source)
        .or_else(|| topology.primary())
        .ok_or(WrapError::NoMonitors)?;
    if source.id != request.source {
        tracing::debug!(
            "Monitor {} not in topology, falling back to {}",
            request.source,
            source.id
        );
    }

    let usable = source.usable_area(settings.respect_work_area, request.edge_buffer);
    let dx = (request.push.0 * request.distance).round() as i32;
    let dy = (request.push.1 * request.distance).round() as i32;
    let dest = request.current.translate(dx, dy);

    let overflow = dest.overflow(&usable).toward(request.push);
    let Some((side, amount)) = overflow.dominant_side(request.push) else {
        let outcome = if usable.contains_rect(&dest) {
            WrapOutcome::Inside
        } else {
            WrapOutcome::Clamped
        };
        return Ok(stay(source, dest.clamp_into(&usable), outcome));
    };

    if !settings.wrap_enabled {
        return Ok(stay(source, dest.clamp_into(&usable), WrapOutcome::Clamped));
    }

    let ctx = Wrap {
        topology,
        settings,
        source,
        usable,
        dest,
        side,
        amount,
        edge_buffer: request.edge_buffer,
    };
    let decision = match settings.wrap_preference_for(source.id) {
        WrapPreference::Adjacent => ctx
            .adjacent()
            .unwrap_or_else(|| stay(source, dest.clamp_into(&usable), WrapOutcome::Clamped)),
        WrapPreference::Opposite => ctx.opposite(),
        WrapPreference::Smart => ctx.adjacent().unwrap_or_else(|| ctx.opposite()),
    };

    tracing::debug!(
        "Wrap {:?} past {:?} by {}px: {:?} on monitor {}",
        decision.outcome,
        side,
        amount,
        decision.rect,
        decision.monitor_id
    );
    Ok(decision)
}

fn stay(monitor: &MonitorDescriptor, rect: Rect, outcome: WrapOutcome) -> WrapDecision {
    WrapDecision {
        rect,
        monitor_id: monitor.id,
        crossed_monitor: false,
        outcome,
    }
}

struct Wrap<'a> {
    topology: &'a MonitorTopology,
    settings: &'a MultiMonitorSettings,
    source: &'a MonitorDescriptor,
    usable: Rect,
    dest: Rect,
    side: Side,
    amount: i32,
    edge_buffer: u32,
}

impl Wrap<'_> {
    fn adjacent(&self) -> Option<WrapDecision> {
        if !self.settings.cross_monitor_enabled {
            return None;
        }
        let target = self.topology.neighbor(
            self.source,
            self.side,
            self.settings.cross_monitor_threshold,
            &self.dest,
        )?;

        let ratio = self.source.scale_ratio_to(target);
        let tu = target.usable_area(self.settings.respect_work_area, self.edge_buffer);
        let width = ((self.dest.width as f64 * ratio).round() as u32).max(1);
        let height = ((self.dest.height as f64 * ratio).round() as u32).max(1);
        let carried = (self.amount as f64 * ratio).round() as i32;

        let x = match self.side {
            Side::Right => tu.x + carried,
            Side::Left => tu.right() - width as i32 - carried,
            _ => map_offset(self.dest.x, self.usable.x, self.usable.width, tu.x, tu.width),
        };
        let y = match self.side {
            Side::Bottom => tu.y + carried,
            Side::Top => tu.bottom() - height as i32 - carried,
            _ => map_offset(self.dest.y, self.usable.y, self.usable.height, tu.y, tu.height),
        };

        Some(WrapDecision {
            rect: Rect::new(x, y, width, height).clamp_into(&tu),
            monitor_id: target.id,
            crossed_monitor: true,
            outcome: WrapOutcome::Adjacent,
        })
    }

    fn opposite(&self) -> WrapDecision {
        let u = &self.usable;
        let d = &self.dest;
        let rect = match self.side {
            Side::Right => Rect::new(u.x + self.amount, d.y, d.width, d.height),
            Side::Left => Rect::new(u.right() - d.width as i32 - self.amount, d.y, d.width, d.height),
            Side::Bottom => Rect::new(d.x, u.y + self.amount, d.width, d.height),
            Side::Top => Rect::new(d.x, u.bottom() - d.height as i32 - self.amount, d.width, d.height),
        };
        stay(self.source, rect.clamp_into(u), WrapOutcome::Opposite)
    }
}

/// Keep the relative position of `pos` within `[from, from + from_len]` when
/// moving into `[to, to + to_len]`.
fn map_offset(pos: i32, from: i32, from_len: u32, to: i32, to_len: u32) -> i32 {
    let frac = (pos - from) as f64 / from_len.max(1) as f64;
    to + (frac * to_len as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dpi, MonitorOverride};

    fn monitor(id: MonitorId, x: i32, y: i32, w: u32, h: u32, scale: f64) -> MonitorDescriptor {
        MonitorDescriptor {
            id,
            name: format!("Monitor {}", id),
            bounds: Rect::new(x, y, w, h),
            work_area: Rect::new(x, y, w, h),
            is_primary: id == 1,
            dpi: Dpi::from_scale(scale),
        }
    }

    fn settings(preference: WrapPreference) -> MultiMonitorSettings {
        MultiMonitorSettings {
            wrap_preference: preference,
            ..Default::default()
        }
    }

    fn push_right(current: Rect, distance: f64) -> WrapRequest {
        WrapRequest {
            current,
            push: (1.0, 0.0),
            distance,
            source: 1,
            edge_buffer: 10,
        }
    }

    fn dual() -> MonitorTopology {
        MonitorTopology::new(vec![
            monitor(1, 0, 0, 1920, 1080, 1.0),
            monitor(2, 1920, 0, 3840, 2160, 2.0),
        ])
    }

    #[test]
    fn test_inside_is_translated() {
        let topology = MonitorTopology::new(vec![monitor(1, 0, 0, 1920, 1080, 1.0)]);
        let d = resolve(
            &push_right(Rect::new(100, 100, 200, 100), 100.0),
            &topology,
            &settings(WrapPreference::Smart),
        )
        .unwrap();
        assert_eq!(d.outcome, WrapOutcome::Inside);
        assert_eq!(d.rect, Rect::new(200, 100, 200, 100));
        assert!(!d.crossed_monitor);
    }

    #[test]
    fn test_wrap_disabled_clamps() {
        let topology = dual();
        let mm = MultiMonitorSettings {
            wrap_enabled: false,
            ..Default::default()
        };
        let d = resolve(&push_right(Rect::new(1700, 100, 200, 100), 100.0), &topology, &mm).unwrap();
        assert_eq!(d.outcome, WrapOutcome::Clamped);
        assert_eq!(d.rect, Rect::new(1710, 100, 200, 100));
        assert_eq!(d.monitor_id, 1);
    }

    #[test]
    fn test_smart_wraps_into_right_monitor_with_dpi() {
        let topology = dual();
        // Destination x=1800..2000 overflows usable right edge (1910) by 90.
        let d = resolve(
            &push_right(Rect::new(1700, 540, 200, 100), 100.0),
            &topology,
            &settings(WrapPreference::Smart),
        )
        .unwrap();

        assert_eq!(d.outcome, WrapOutcome::Adjacent);
        assert!(d.crossed_monitor);
        assert_eq!(d.monitor_id, 2);
        // Size and overflow doubled by the 2x monitor, entering past its
        // 20px (10 logical) buffer.
        assert_eq!(d.rect.width, 400);
        assert_eq!(d.rect.height, 200);
        assert_eq!(d.rect.x, 1940 + 180);
        // Vertical position kept proportionally: (540-10)/1060 of 2120.
        assert_eq!(d.rect.y, 20 + 1060);

        let usable = topology.get(2).unwrap().usable_area(true, 10);
        assert!(usable.contains_rect(&d.rect));
    }

    #[test]
    fn test_smart_without_neighbor_goes_opposite() {
        let topology = MonitorTopology::new(vec![monitor(1, 0, 0, 1920, 1080, 1.0)]);
        let d = resolve(
            &push_right(Rect::new(1700, 100, 200, 100), 100.0),
            &topology,
            &settings(WrapPreference::Smart),
        )
        .unwrap();
        assert_eq!(d.outcome, WrapOutcome::Opposite);
        assert_eq!(d.rect, Rect::new(10 + 90, 100, 200, 100));
    }

    #[test]
    fn test_adjacent_without_neighbor_clamps() {
        let topology = MonitorTopology::new(vec![monitor(1, 0, 0, 1920, 1080, 1.0)]);
        let d = resolve(
            &push_right(Rect::new(1700, 100, 200, 100), 100.0),
            &topology,
            &settings(WrapPreference::Adjacent),
        )
        .unwrap();
        assert_eq!(d.outcome, WrapOutcome::Clamped);
        assert_eq!(d.rect.right(), 1910);
    }

    #[test]
    fn test_cross_monitor_disabled_skips_neighbor() {
        let mm = MultiMonitorSettings {
            cross_monitor_enabled: false,
            ..Default::default()
        };
        let d = resolve(&push_right(Rect::new(1700, 100, 200, 100), 100.0), &dual(), &mm).unwrap();
        assert_eq!(d.outcome, WrapOutcome::Opposite);
        assert_eq!(d.monitor_id, 1);
    }

    #[test]
    fn test_monitor_override_preference_wins() {
        let mut mm = settings(WrapPreference::Smart);
        mm.monitor_overrides.insert(
            1,
            MonitorOverride {
                wrap_preference: Some(WrapPreference::Opposite),
                ..Default::default()
            },
        );
        let d = resolve(&push_right(Rect::new(1700, 100, 200, 100), 100.0), &dual(), &mm).unwrap();
        assert_eq!(d.outcome, WrapOutcome::Opposite);
    }

    #[test]
    fn test_wrap_upward_to_opposite_bottom() {
        let topology = MonitorTopology::new(vec![monitor(1, 0, 0, 1920, 1080, 1.0)]);
        let request = WrapRequest {
            current: Rect::new(500, 30, 200, 100),
            push: (0.0, -1.0),
            distance: 100.0,
            source: 1,
            edge_buffer: 10,
        };
        let d = resolve(&request, &topology, &settings(WrapPreference::Opposite)).unwrap();
        // dest.y = -70, overflow 80 past y=10.
        assert_eq!(d.rect, Rect::new(500, 1070 - 100 - 80, 200, 100));
    }

    #[test]
    fn test_unknown_source_falls_back_to_primary() {
        let topology = MonitorTopology::new(vec![monitor(1, 0, 0, 1920, 1080, 1.0)]);
        let request = WrapRequest {
            source: 42,
            ..push_right(Rect::new(100, 100, 200, 100), 50.0)
        };
        let d = resolve(&request, &topology, &settings(WrapPreference::Smart)).unwrap();
        assert_eq!(d.monitor_id, 1);
    }

    #[test]
    fn test_no_monitors_is_an_error() {
        let err = resolve(
            &push_right(Rect::new(0, 0, 10, 10), 10.0),
            &MonitorTopology::default(),
            &settings(WrapPreference::Smart),
        )
        .unwrap_err();
        assert_eq!(err, WrapError::NoMonitors);
    }

    #[test]
    fn test_result_always_within_a_usable_area() {
        let layouts = vec![
            MonitorTopology::new(vec![monitor(1, 0, 0, 1920, 1080, 1.0)]),
            dual(),
            MonitorTopology::new(vec![
                monitor(1, 0, 0, 1920, 1080, 1.0),
                monitor(2, -1280, 200, 1280, 800, 1.0),
                monitor(3, 0, 1080, 2560, 1440, 1.5),
            ]),
        ];
        let directions = [
            (1.0, 0.0),
            (-1.0, 0.0),
            (0.0, 1.0),
            (0.0, -1.0),
            (0.6, 0.8),
            (-0.8, -0.6),
        ];
        let starts = [
            Rect::new(20, 20, 300, 200),
            Rect::new(1600, 850, 300, 200),
            Rect::new(900, 500, 2500, 1500),
        ];

        for topology in &layouts {
            for preference in [WrapPreference::Adjacent, WrapPreference::Opposite, WrapPreference::Smart] {
                for &push in &directions {
                    for &current in &starts {
                        for distance in [50.0, 400.0, 3000.0] {
                            let request = WrapRequest {
                                current,
                                push,
                                distance,
                                source: 1,
                                edge_buffer: 10,
                            };
                            let mm = settings(preference);
                            let d = resolve(&request, topology, &mm).unwrap();
                            let usable = topology
                                .get(d.monitor_id)
                                .unwrap()
                                .usable_area(mm.respect_work_area, 10);
                            assert!(
                                usable.contains_rect(&d.rect),
                                "{:?} {:?} {:?} -> {:?} outside {:?}",
                                preference,
                                push,
                                current,
                                d.rect,
                                usable
                            );
                        }
                    }
                }
            }
        }
    }
}
