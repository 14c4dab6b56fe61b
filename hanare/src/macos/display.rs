use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::mpsc::Sender;
use std::sync::OnceLock;

use core_foundation::{
    array::CFArray, base::TCFType, boolean::CFBoolean, dictionary::CFDictionary,
    number::CFNumber, string::CFString,
};
use core_graphics::display::{CGDirectDisplayID, CGDisplay, CGDisplayBounds, CGMainDisplayID};
use core_graphics::window::{
    kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly,
    CGWindowListCopyWindowInfo,
};
use objc2::MainThreadMarker;
use objc2_app_kit::NSScreen;

use crate::core::{Dpi, MonitorDescriptor, MonitorId, Rect};
use crate::platform::WindowInfo;

/// Window layers at or above this are system chrome (Dock, menu bar, ...).
const SYSTEM_LAYER: i32 = 20;
const MENU_BAR_LAYER: i32 = 24;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGDisplayRegisterReconfigurationCallback(
        callback: unsafe extern "C" fn(CGDirectDisplayID, u32, *mut c_void),
        user_info: *mut c_void,
    ) -> i32;
}

#[derive(Debug, Clone)]
pub struct DisplayReconfigEvent {
    pub display_id: MonitorId,
    pub flags: u32,
}

static DISPLAY_RECONFIG_TX: OnceLock<Sender<DisplayReconfigEvent>> = OnceLock::new();

extern "C" fn display_reconfig_callback(
    display_id: CGDirectDisplayID,
    flags: u32,
    _user_info: *mut c_void,
) {
    if let Some(tx) = DISPLAY_RECONFIG_TX.get() {
        let _ = tx.send(DisplayReconfigEvent { display_id, flags });
    }
}

pub fn register_display_callback(tx: Sender<DisplayReconfigEvent>) -> anyhow::Result<()> {
    DISPLAY_RECONFIG_TX
        .set(tx)
        .map_err(|_| anyhow::anyhow!("Display callback already registered"))?;

    let result = unsafe {
        CGDisplayRegisterReconfigurationCallback(display_reconfig_callback, std::ptr::null_mut())
    };

    if result != 0 {
        anyhow::bail!("Failed to register display callback: {}", result);
    }

    tracing::info!("Display reconfiguration callback registered");
    Ok(())
}

pub fn get_on_screen_windows() -> Vec<WindowInfo> {
    let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
    let window_list: CFArray = unsafe {
        CFArray::wrap_under_create_rule(CGWindowListCopyWindowInfo(options, kCGNullWindowID))
    };

    let mut windows = Vec::new();

    for i in 0..window_list.len() {
        let dict_ptr = unsafe { *window_list.get_unchecked(i) };
        let dict: CFDictionary = unsafe { CFDictionary::wrap_under_get_rule(dict_ptr as *const _) };

        let Some(info) = parse_window_info(&dict) else {
            continue;
        };

        windows.push(info);
    }

    windows
}

fn parse_window_info(dict: &CFDictionary) -> Option<WindowInfo> {
    let layer = get_number(dict, "kCGWindowLayer")?.to_i32()?;
    if !(0..SYSTEM_LAYER).contains(&layer) {
        return None;
    }

    let pid = get_number(dict, "kCGWindowOwnerPID")?.to_i32()?;
    let window_id = get_number(dict, "kCGWindowNumber")?.to_i32()? as u32;
    let owner_name = get_string(dict, "kCGWindowOwnerName")?;
    let title = get_string(dict, "kCGWindowName");
    let bounds = parse_bounds(dict, "kCGWindowBounds")?;
    let alpha = get_number(dict, "kCGWindowAlpha")
        .and_then(|n| n.to_f64())
        .unwrap_or(1.0);
    let on_screen = get_bool(dict, "kCGWindowIsOnscreen").unwrap_or(true);

    Some(WindowInfo {
        window_id,
        pid,
        title,
        owner_name,
        bounds,
        // Minimized windows are not in the on-screen list.
        is_minimized: false,
        is_topmost: layer > 0,
        is_visible: on_screen && alpha > 0.0 && bounds.width > 0 && bounds.height > 0,
    })
}

fn get_number(dict: &CFDictionary, key: &str) -> Option<CFNumber> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        Some(CFNumber::wrap_under_get_rule(*value as *const _))
    }
}

fn get_bool(dict: &CFDictionary, key: &str) -> Option<bool> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        Some(CFBoolean::wrap_under_get_rule(*value as *const _).into())
    }
}

fn get_string(dict: &CFDictionary, key: &str) -> Option<String> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        let cf_str = CFString::wrap_under_get_rule(*value as *const _);
        Some(cf_str.to_string())
    }
}

fn parse_bounds(dict: &CFDictionary, key: &str) -> Option<Rect> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        let bounds_dict = CFDictionary::wrap_under_get_rule(*value as *const _);

        let x = get_number(&bounds_dict, "X")?.to_f64()?;
        let y = get_number(&bounds_dict, "Y")?.to_f64()?;
        let width = get_number(&bounds_dict, "Width")?.to_f64()?;
        let height = get_number(&bounds_dict, "Height")?.to_f64()?;

        Some(Rect::new(
            x.round() as i32,
            y.round() as i32,
            width.max(0.0).round() as u32,
            height.max(0.0).round() as u32,
        ))
    }
}

pub fn get_all_monitors() -> Vec<MonitorDescriptor> {
    let display_ids = get_active_display_ids();
    if display_ids.is_empty() {
        return Vec::new();
    }

    let main_display_id = unsafe { CGMainDisplayID() };
    let menu_bar_heights = detect_menu_bar_heights(&display_ids);
    let display_names = get_display_names();

    display_ids
        .iter()
        .map(|&display_id| {
            let bounds = get_display_bounds(display_id);
            let menu_bar_height = menu_bar_heights.get(&display_id).copied().unwrap_or(0);

            let work_area = Rect::new(
                bounds.x,
                bounds.y + menu_bar_height as i32,
                bounds.width,
                bounds.height.saturating_sub(menu_bar_height),
            );

            let name = display_names
                .get(&display_id)
                .cloned()
                .unwrap_or_else(|| format!("Display {}", display_id));

            MonitorDescriptor {
                id: display_id,
                name,
                bounds,
                work_area,
                is_primary: display_id == main_display_id,
                dpi: display_dpi(display_id),
            }
        })
        .collect()
}

/// Global desktop coordinates on macOS are points, so configuration values
/// map 1:1 onto them. The backing scale only shows up in the reported DPI.
fn display_dpi(display_id: MonitorId) -> Dpi {
    let backing = CGDisplay::new(display_id)
        .display_mode()
        .filter(|mode| mode.width() > 0)
        .map(|mode| mode.pixel_width() as f64 / mode.width() as f64)
        .unwrap_or(1.0);
    Dpi {
        x: Dpi::BASE * backing,
        y: Dpi::BASE * backing,
        scale: 1.0,
    }
}

/// Display names from NSScreen (best effort; names don't change with resolution)
fn get_display_names() -> HashMap<MonitorId, String> {
    let mtm = unsafe { MainThreadMarker::new_unchecked() };
    let screens = NSScreen::screens(mtm);

    screens
        .iter()
        .filter_map(|screen| {
            let display_id = get_display_id_for_screen(&screen)?;
            let name = screen.localizedName().to_string();
            Some((display_id, name))
        })
        .collect()
}

fn get_display_id_for_screen(screen: &NSScreen) -> Option<MonitorId> {
    use objc2_foundation::NSNumber;

    let desc = screen.deviceDescription();
    let key = objc2_foundation::ns_string!("NSScreenNumber");
    let value = desc.objectForKey(key)?;

    let number: &NSNumber = unsafe { &*(&*value as *const _ as *const NSNumber) };
    Some(number.unsignedIntValue())
}

fn get_active_display_ids() -> Vec<MonitorId> {
    use core_graphics::display::CGGetActiveDisplayList;

    const MAX_DISPLAYS: u32 = 16;
    let mut display_ids: [u32; 16] = [0; 16];
    let mut display_count: u32 = 0;

    let result = unsafe {
        CGGetActiveDisplayList(MAX_DISPLAYS, display_ids.as_mut_ptr(), &mut display_count)
    };

    if result != 0 {
        tracing::warn!("CGGetActiveDisplayList failed: {}", result);
        return Vec::new();
    }

    display_ids[..display_count as usize].to_vec()
}

fn get_display_bounds(display_id: MonitorId) -> Rect {
    let rect = unsafe { CGDisplayBounds(display_id) };
    Rect::new(
        rect.origin.x.round() as i32,
        rect.origin.y.round() as i32,
        rect.size.width.round() as u32,
        rect.size.height.round() as u32,
    )
}

/// Menu bars are thin, screen-wide Window Server windows on the menu bar
/// layer. Returns display id -> menu bar height.
fn detect_menu_bar_heights(display_ids: &[MonitorId]) -> HashMap<MonitorId, u32> {
    let display_bounds: Vec<(MonitorId, Rect)> = display_ids
        .iter()
        .map(|&id| (id, get_display_bounds(id)))
        .collect();

    let window_list: CFArray = unsafe {
        CFArray::wrap_under_create_rule(CGWindowListCopyWindowInfo(
            kCGWindowListOptionOnScreenOnly,
            kCGNullWindowID,
        ))
    };

    let mut heights = HashMap::new();

    for i in 0..window_list.len() {
        let dict_ptr = unsafe { *window_list.get_unchecked(i) };
        let dict: CFDictionary = unsafe { CFDictionary::wrap_under_get_rule(dict_ptr as *const _) };

        if get_number(&dict, "kCGWindowLayer").and_then(|n| n.to_i32()) != Some(MENU_BAR_LAYER) {
            continue;
        }
        if get_string(&dict, "kCGWindowOwnerName").as_deref() != Some("Window Server") {
            continue;
        }
        let Some(bounds) = parse_bounds(&dict, "kCGWindowBounds") else {
            continue;
        };
        if bounds.height >= 50 || bounds.width <= 500 {
            continue;
        }

        if let Some((display_id, _)) = display_bounds.iter().find(|(_, display)| {
            bounds.x == display.x && bounds.y == display.y && bounds.width == display.width
        }) {
            heights.insert(*display_id, bounds.height);
        }
    }

    heights
}
