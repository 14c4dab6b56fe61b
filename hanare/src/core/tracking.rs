use std::collections::HashMap;
use std::time::Instant;

use dashmap::DashMap;

use super::{HoverRecord, Rect, WindowId};
use crate::platform::WindowInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedWindow {
    pub id: WindowId,
    pub pid: i32,
    pub title: String,
    pub owner_name: String,
    pub is_topmost: bool,
    pub bounds: Rect,
    pub first_seen: Instant,
    pub last_proximity_check: Option<Instant>,
    pub hover: HoverRecord,
    /// Owned by the animation driver; discovery leaves `bounds` alone while set.
    pub is_animating: bool,
    pub in_proximity: bool,
}

impl TrackedWindow {
    pub fn from_window_info(info: &WindowInfo, now: Instant) -> Self {
        Self {
            id: info.window_id,
            pid: info.pid,
            title: info.title.clone().unwrap_or_default(),
            owner_name: info.owner_name.clone(),
            is_topmost: info.is_topmost,
            bounds: info.bounds,
            first_seen: now,
            last_proximity_check: None,
            hover: HoverRecord::default(),
            is_animating: false,
            in_proximity: false,
        }
    }

    fn refresh(&mut self, info: &WindowInfo) {
        self.title = info.title.clone().unwrap_or_default();
        self.owner_name = info.owner_name.clone();
        self.is_topmost = info.is_topmost;
        if !self.is_animating {
            self.bounds = info.bounds;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub added: Vec<WindowId>,
    pub removed: Vec<WindowId>,
}

impl SyncResult {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Windows currently under management, shared between the tick and
/// discovery threads. Entries are copied out for computation and written
/// back through [`TrackingTable::update`], so an entry removed in between
/// turns the write into a no-op.
#[derive(Debug, Default)]
pub struct TrackingTable {
    windows: DashMap<WindowId, TrackedWindow>,
}

impl TrackingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<_> = self.windows.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn get(&self, id: WindowId) -> Option<TrackedWindow> {
        self.windows.get(&id).map(|e| e.value().clone())
    }

    /// Copy of every entry, ordered by window id.
    pub fn snapshot(&self) -> Vec<TrackedWindow> {
        let mut windows: Vec<_> = self.windows.iter().map(|e| e.value().clone()).collect();
        windows.sort_unstable_by_key(|w| w.id);
        windows
    }

    /// Run `f` on the entry under its shard lock. Returns false when the
    /// window is no longer tracked.
    pub fn update<F>(&self, id: WindowId, f: F) -> bool
    where
        F: FnOnce(&mut TrackedWindow),
    {
        match self.windows.get_mut(&id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.windows.clear();
    }

    /// Bring the table in line with the windows currently on screen.
    ///
    /// Minimized and invisible windows are dropped. Unless `apply_to_all` is
    /// set only always-on-top windows are tracked.
    pub fn sync(&self, infos: &[WindowInfo], now: Instant, apply_to_all: bool) -> SyncResult {
        let eligible: HashMap<WindowId, &WindowInfo> = infos
            .iter()
            .filter(|info| !info.is_minimized && info.is_visible)
            .filter(|info| apply_to_all || info.is_topmost)
            .map(|info| (info.window_id, info))
            .collect();

        let mut result = SyncResult::default();

        self.windows.retain(|id, window| match eligible.get(id) {
            Some(info) => {
                window.refresh(info);
                true
            }
            None => {
                result.removed.push(*id);
                false
            }
        });

        for (id, info) in &eligible {
            if self.windows.contains_key(id) {
                continue;
            }
            self.windows
                .insert(*id, TrackedWindow::from_window_info(info, now));
            result.added.push(*id);
            tracing::info!(
                "Window added: [{}] {} ({})",
                id,
                info.title.as_deref().unwrap_or(""),
                info.owner_name
            );
        }

        for id in &result.removed {
            tracing::info!("Window removed: [{}]", id);
        }

        result.added.sort_unstable();
        result.removed.sort_unstable();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::create_test_window;

    fn topmost(id: WindowId, x: i32) -> WindowInfo {
        WindowInfo {
            is_topmost: true,
            ..create_test_window(id, "Stickies", x, 0, 200, 100)
        }
    }

    #[test]
    fn test_sync_tracks_only_topmost_by_default() {
        let table = TrackingTable::new();
        let infos = vec![
            topmost(1, 0),
            create_test_window(2, "Finder", 300, 0, 200, 100),
        ];

        let result = table.sync(&infos, Instant::now(), false);
        assert_eq!(result.added, vec![1]);
        assert_eq!(table.ids(), vec![1]);

        let result = table.sync(&infos, Instant::now(), true);
        assert_eq!(result.added, vec![2]);
        assert_eq!(table.ids(), vec![1, 2]);
    }

    #[test]
    fn test_sync_skips_minimized_and_invisible() {
        let table = TrackingTable::new();
        let infos = vec![
            WindowInfo {
                is_minimized: true,
                ..topmost(1, 0)
            },
            WindowInfo {
                is_visible: false,
                ..topmost(2, 0)
            },
            topmost(3, 0),
        ];
        table.sync(&infos, Instant::now(), false);
        assert_eq!(table.ids(), vec![3]);
    }

    #[test]
    fn test_sync_removes_closed_windows_and_keeps_state() {
        let table = TrackingTable::new();
        let t0 = Instant::now();
        table.sync(&[topmost(1, 0), topmost(2, 300)], t0, false);
        table.update(1, |w| w.in_proximity = true);

        let result = table.sync(&[topmost(1, 50)], t0, false);
        assert_eq!(result.removed, vec![2]);
        assert!(result.added.is_empty());

        let w = table.get(1).unwrap();
        assert!(w.in_proximity);
        assert_eq!(w.bounds.x, 50);
        assert_eq!(w.first_seen, t0);
    }

    #[test]
    fn test_sync_does_not_overwrite_animating_bounds() {
        let table = TrackingTable::new();
        table.sync(&[topmost(1, 0)], Instant::now(), false);
        table.update(1, |w| {
            w.is_animating = true;
            w.bounds = Rect::new(80, 0, 200, 100);
        });

        table.sync(&[topmost(1, 10)], Instant::now(), false);
        assert_eq!(table.get(1).unwrap().bounds.x, 80);
    }

    #[test]
    fn test_update_missing_window_is_noop() {
        let table = TrackingTable::new();
        assert!(!table.update(9, |w| w.in_proximity = true));
        assert!(table.get(9).is_none());
    }

    #[test]
    fn test_concurrent_sync_and_update() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(TrackingTable::new());
        let infos: Vec<_> = (0..50).map(|i| topmost(i, 0)).collect();
        table.sync(&infos, Instant::now(), false);

        let writer = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for _ in 0..200 {
                    for id in table.ids() {
                        table.update(id, |w| w.in_proximity = !w.in_proximity);
                    }
                }
            })
        };
        let discovery = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for round in 0..200 {
                    let keep = if round % 2 == 0 { 25 } else { 50 };
                    table.sync(&infos[..keep], Instant::now(), false);
                }
            })
        };

        writer.join().unwrap();
        discovery.join().unwrap();
        assert_eq!(table.len(), 50);
    }
}
