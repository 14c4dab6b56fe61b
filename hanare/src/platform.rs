use hanare_ipc::ModifierKey;
use thiserror::Error;

use crate::core::{MonitorDescriptor, Point, Rect, WindowId};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub window_id: WindowId,
    pub pid: i32,
    pub title: Option<String>,
    pub owner_name: String,
    pub bounds: Rect,
    pub is_minimized: bool,
    pub is_topmost: bool,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    #[error("{operation} failed for window {window_id}: error {code}")]
    Os {
        operation: &'static str,
        window_id: WindowId,
        code: i32,
    },
}

/// Read-only view of windows and monitors.
/// This abstraction allows mocking in tests.
pub trait WindowSystem {
    fn get_windows(&self) -> Vec<WindowInfo>;
    fn get_monitors(&self) -> Vec<MonitorDescriptor>;
}

/// Moving windows (side effects). Failures are recoverable and only affect
/// the window involved.
pub trait WindowManipulator {
    fn get_window_rect(&self, window_id: WindowId) -> Result<Rect, PlatformError>;
    fn set_window_rect(&self, window_id: WindowId, rect: &Rect) -> Result<(), PlatformError>;
}

pub trait InputSource {
    fn cursor_position(&self) -> Option<Point>;
    fn is_modifier_held(&self, key: ModifierKey) -> bool;
}

/// Everything the engine needs from the host OS.
pub trait Platform: WindowSystem + WindowManipulator + InputSource + Send + Sync + 'static {}

impl<T> Platform for T where T: WindowSystem + WindowManipulator + InputSource + Send + Sync + 'static
{}

#[cfg(target_os = "macos")]
pub use self::macos_impl::MacOSPlatform;

#[cfg(target_os = "macos")]
mod macos_impl {
    use std::collections::HashMap;

    use core_graphics::geometry::{CGPoint, CGSize};
    use parking_lot::RwLock;

    use super::*;
    use crate::macos::{self, AXUIElement, AX_ERROR_INVALID_UIELEMENT};

    /// macOS implementation backed by Core Graphics and the Accessibility API.
    #[derive(Default)]
    pub struct MacOSPlatform {
        /// Window id -> owning pid, refreshed on every window listing.
        owners: RwLock<HashMap<WindowId, i32>>,
    }

    impl MacOSPlatform {
        pub fn new() -> Self {
            Self::default()
        }

        fn find_ax_window(&self, window_id: WindowId) -> Result<AXUIElement, PlatformError> {
            let pid = self
                .owners
                .read()
                .get(&window_id)
                .copied()
                .ok_or(PlatformError::WindowNotFound(window_id))?;

            let app = AXUIElement::application(pid);
            let ax_windows = app.windows().map_err(|code| PlatformError::Os {
                operation: "list windows",
                window_id,
                code,
            })?;

            ax_windows
                .into_iter()
                .find(|w| w.window_id() == Some(window_id))
                .ok_or(PlatformError::WindowNotFound(window_id))
        }
    }

    impl WindowSystem for MacOSPlatform {
        fn get_windows(&self) -> Vec<WindowInfo> {
            let own_pid = std::process::id() as i32;
            let windows: Vec<WindowInfo> = macos::get_on_screen_windows()
                .into_iter()
                .filter(|w| w.pid != own_pid)
                .collect();

            let mut owners = self.owners.write();
            owners.clear();
            owners.extend(windows.iter().map(|w| (w.window_id, w.pid)));
            windows
        }

        fn get_monitors(&self) -> Vec<MonitorDescriptor> {
            macos::get_all_monitors()
        }
    }

    impl WindowManipulator for MacOSPlatform {
        fn get_window_rect(&self, window_id: WindowId) -> Result<Rect, PlatformError> {
            let ax_win = self.find_ax_window(window_id)?;
            let os_err = |code| PlatformError::Os {
                operation: "read frame",
                window_id,
                code,
            };
            let pos = ax_win.position().map_err(os_err)?;
            let size = ax_win.size().map_err(os_err)?;
            Ok(Rect::new(
                pos.x.round() as i32,
                pos.y.round() as i32,
                size.width.round() as u32,
                size.height.round() as u32,
            ))
        }

        fn set_window_rect(&self, window_id: WindowId, rect: &Rect) -> Result<(), PlatformError> {
            let ax_win = self.find_ax_window(window_id)?;
            let os_err = |code| {
                if code == AX_ERROR_INVALID_UIELEMENT {
                    PlatformError::WindowNotFound(window_id)
                } else {
                    PlatformError::Os {
                        operation: "set frame",
                        window_id,
                        code,
                    }
                }
            };

            ax_win
                .set_position(CGPoint::new(rect.x as f64, rect.y as f64))
                .map_err(os_err)?;
            ax_win
                .set_size(CGSize::new(rect.width as f64, rect.height as f64))
                .map_err(os_err)?;
            tracing::trace!("Set window {} frame to {:?}", window_id, rect);
            Ok(())
        }
    }

    impl InputSource for MacOSPlatform {
        fn cursor_position(&self) -> Option<Point> {
            macos::cursor_position()
        }

        fn is_modifier_held(&self, key: ModifierKey) -> bool {
            macos::is_modifier_held(key)
        }
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::mpsc as std_mpsc;

    use parking_lot::Mutex;

    use super::*;
    use crate::core::{Dpi, MonitorId};

    /// Scriptable platform. Tests mutate it between ticks through the
    /// setters; the engine sees it through the traits.
    #[derive(Default)]
    pub struct MockPlatform {
        windows: Mutex<Vec<WindowInfo>>,
        monitors: Mutex<Vec<MonitorDescriptor>>,
        cursor: Mutex<Option<Point>>,
        held: Mutex<Vec<ModifierKey>>,
        failing: Mutex<Vec<WindowId>>,
        moves: Mutex<Vec<(WindowId, Rect)>>,
        cursor_gate: Mutex<Option<Gate>>,
    }

    struct Gate {
        entered: std_mpsc::Sender<()>,
        release: std_mpsc::Receiver<()>,
    }

    impl MockPlatform {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_windows(self, windows: Vec<WindowInfo>) -> Self {
            *self.windows.lock() = windows;
            self
        }

        pub fn with_monitors(self, monitors: Vec<MonitorDescriptor>) -> Self {
            *self.monitors.lock() = monitors;
            self
        }

        pub fn with_cursor(self, x: i32, y: i32) -> Self {
            self.set_cursor(x, y);
            self
        }

        pub fn set_cursor(&self, x: i32, y: i32) {
            *self.cursor.lock() = Some(Point::new(x, y));
        }

        pub fn set_modifier(&self, key: ModifierKey, held: bool) {
            let mut keys = self.held.lock();
            keys.retain(|k| *k != key);
            if held {
                keys.push(key);
            }
        }

        pub fn set_monitors(&self, monitors: Vec<MonitorDescriptor>) {
            *self.monitors.lock() = monitors;
        }

        pub fn remove_window(&self, window_id: WindowId) {
            self.windows.lock().retain(|w| w.window_id != window_id);
        }

        /// Park the next `cursor_position` call. The first receiver fires
        /// once the call is parked; it returns when the sender fires or is
        /// dropped.
        pub fn gate_cursor(&self) -> (std_mpsc::Receiver<()>, std_mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = std_mpsc::channel();
            let (release_tx, release_rx) = std_mpsc::channel();
            *self.cursor_gate.lock() = Some(Gate {
                entered: entered_tx,
                release: release_rx,
            });
            (entered_rx, release_tx)
        }

        /// Make `set_window_rect` fail for the window.
        pub fn fail_moves_for(&self, window_id: WindowId) {
            self.failing.lock().push(window_id);
        }

        pub fn window_rect(&self, window_id: WindowId) -> Option<Rect> {
            self.windows
                .lock()
                .iter()
                .find(|w| w.window_id == window_id)
                .map(|w| w.bounds)
        }

        /// Every successful `set_window_rect` call so far.
        pub fn moves(&self) -> Vec<(WindowId, Rect)> {
            self.moves.lock().clone()
        }

        pub fn moves_by_window(&self) -> HashMap<WindowId, Vec<Rect>> {
            let mut map: HashMap<WindowId, Vec<Rect>> = HashMap::new();
            for (id, rect) in self.moves.lock().iter() {
                map.entry(*id).or_default().push(*rect);
            }
            map
        }
    }

    impl WindowSystem for MockPlatform {
        fn get_windows(&self) -> Vec<WindowInfo> {
            self.windows.lock().clone()
        }

        fn get_monitors(&self) -> Vec<MonitorDescriptor> {
            self.monitors.lock().clone()
        }
    }

    impl WindowManipulator for MockPlatform {
        fn get_window_rect(&self, window_id: WindowId) -> Result<Rect, PlatformError> {
            self.window_rect(window_id)
                .ok_or(PlatformError::WindowNotFound(window_id))
        }

        fn set_window_rect(&self, window_id: WindowId, rect: &Rect) -> Result<(), PlatformError> {
            if self.failing.lock().contains(&window_id) {
                return Err(PlatformError::Os {
                    operation: "set frame",
                    window_id,
                    code: -25200,
                });
            }
            let mut windows = self.windows.lock();
            let window = windows
                .iter_mut()
                .find(|w| w.window_id == window_id)
                .ok_or(PlatformError::WindowNotFound(window_id))?;
            window.bounds = *rect;
            self.moves.lock().push((window_id, *rect));
            Ok(())
        }
    }

    impl InputSource for MockPlatform {
        fn cursor_position(&self) -> Option<Point> {
            let gate = self.cursor_gate.lock().take();
            if let Some(gate) = gate {
                let _ = gate.entered.send(());
                let _ = gate.release.recv();
            }
            *self.cursor.lock()
        }

        fn is_modifier_held(&self, key: ModifierKey) -> bool {
            self.held.lock().contains(&key)
        }
    }

    pub fn create_test_monitor(
        id: MonitorId,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        scale: f64,
    ) -> MonitorDescriptor {
        MonitorDescriptor {
            id,
            name: format!("Monitor {}", id),
            bounds: Rect::new(x, y, width, height),
            work_area: Rect::new(x, y, width, height),
            is_primary: id == 1,
            dpi: Dpi::from_scale(scale),
        }
    }

    pub fn create_test_window(
        window_id: WindowId,
        owner_name: &str,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> WindowInfo {
        WindowInfo {
            window_id,
            pid: 1000 + window_id as i32,
            title: Some(format!("{} Window", owner_name)),
            owner_name: owner_name.to_string(),
            bounds: Rect::new(x, y, width, height),
            is_minimized: false,
            is_topmost: false,
            is_visible: true,
        }
    }

    pub fn create_topmost_window(
        window_id: WindowId,
        owner_name: &str,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> WindowInfo {
        WindowInfo {
            is_topmost: true,
            ..create_test_window(window_id, owner_name, x, y, width, height)
        }
    }
}
