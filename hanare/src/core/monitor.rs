use super::{Rect, Side};

pub type MonitorId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dpi {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Dpi {
    pub const BASE: f64 = 96.0;

    pub fn from_scale(scale: f64) -> Self {
        Self {
            x: Self::BASE * scale,
            y: Self::BASE * scale,
            scale,
        }
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::from_scale(1.0)
    }
}

/// Immutable description of one monitor. Rectangles are physical pixels in
/// the global desktop space.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorDescriptor {
    pub id: MonitorId,
    pub name: String,
    pub bounds: Rect,
    pub work_area: Rect,
    pub is_primary: bool,
    pub dpi: Dpi,
}

impl MonitorDescriptor {
    /// Logical pixels (configuration units) to physical pixels on this monitor.
    pub fn to_physical(&self, logical: f64) -> f64 {
        logical * self.dpi.scale
    }

    /// Area windows may occupy: work area or full bounds, minus the edge buffer
    /// (given in logical pixels).
    pub fn usable_area(&self, respect_work_area: bool, edge_buffer: u32) -> Rect {
        let area = if respect_work_area {
            self.work_area
        } else {
            self.bounds
        };
        let buffer = self.to_physical(edge_buffer as f64).round() as u32;
        area.inset(buffer)
    }

    /// Factor that keeps a window's logical size when it moves from this
    /// monitor onto `other`.
    pub fn scale_ratio_to(&self, other: &MonitorDescriptor) -> f64 {
        other.dpi.scale / self.dpi.scale
    }
}

/// Snapshot of every connected monitor. Replaced wholesale on change.
#[derive(Debug, Clone, Default)]
pub struct MonitorTopology {
    monitors: Vec<MonitorDescriptor>,
}

impl MonitorTopology {
    pub fn new(monitors: Vec<MonitorDescriptor>) -> Self {
        Self { monitors }
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitorDescriptor> {
        self.monitors.iter()
    }

    pub fn get(&self, id: MonitorId) -> Option<&MonitorDescriptor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    pub fn primary(&self) -> Option<&MonitorDescriptor> {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.first())
    }

    /// Monitor holding the largest part of `rect`. A rectangle that is not on
    /// any monitor resolves to the primary one.
    pub fn monitor_for_rect(&self, rect: &Rect) -> Option<&MonitorDescriptor> {
        self.monitors
            .iter()
            .map(|m| (m, m.bounds.intersection_area(rect)))
            .filter(|(_, area)| *area > 0)
            .max_by_key(|(_, area)| *area)
            .map(|(m, _)| m)
            .or_else(|| self.primary())
    }

    /// Monitor whose facing edge touches `from`'s `side` within `max_gap`
    /// pixels and shares perpendicular space with `span`. The candidate with
    /// the largest shared span wins, ties go to the smallest gap.
    pub fn neighbor(
        &self,
        from: &MonitorDescriptor,
        side: Side,
        max_gap: u32,
        span: &Rect,
    ) -> Option<&MonitorDescriptor> {
        let max_gap = max_gap as i32;
        self.monitors
            .iter()
            .filter(|m| m.id != from.id)
            .filter_map(|m| {
                let gap = match side {
                    Side::Right => m.bounds.x - from.bounds.right(),
                    Side::Left => from.bounds.x - m.bounds.right(),
                    Side::Bottom => m.bounds.y - from.bounds.bottom(),
                    Side::Top => from.bounds.y - m.bounds.bottom(),
                };
                if !(-max_gap..=max_gap).contains(&gap) {
                    return None;
                }
                let shared = m.bounds.perpendicular_overlap(span, side);
                (shared > 0).then_some((m, shared, gap.abs()))
            })
            .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
            .map(|(m, _, _)| m)
    }
}
