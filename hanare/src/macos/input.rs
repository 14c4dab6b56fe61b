use core_graphics::event::{CGEvent, CGEventFlags};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use hanare_ipc::ModifierKey;

use crate::core::Point;

extern "C" {
    fn CGEventSourceFlagsState(state_id: CGEventSourceStateID) -> CGEventFlags;
}

/// Current cursor location in global desktop coordinates.
pub fn cursor_position() -> Option<Point> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState).ok()?;
    let event = CGEvent::new(source).ok()?;
    let location = event.location();
    Some(Point::new(
        location.x.round() as i32,
        location.y.round() as i32,
    ))
}

pub fn is_modifier_held(key: ModifierKey) -> bool {
    let flags = unsafe { CGEventSourceFlagsState(CGEventSourceStateID::CombinedSessionState) };
    let mask = match key {
        ModifierKey::Control => CGEventFlags::CGEventFlagControl,
        ModifierKey::Option => CGEventFlags::CGEventFlagAlternate,
        ModifierKey::Shift => CGEventFlags::CGEventFlagShift,
        ModifierKey::Command => CGEventFlags::CGEventFlagCommand,
    };
    flags.contains(mask)
}
