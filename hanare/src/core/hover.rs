//! Per-window hover and override state machine.
//!
//! The machine is a pure function of a window's [`HoverRecord`] and one
//! [`HoverInput`] sample, so it can be driven tick by tick in tests.
//!
//! Timing rules:
//! - Hovering (cursor inside the window) never times out.
//! - The hover timer starts when the cursor first leaves the window and is
//!   never restarted by bouncing back in and out. While it runs the window is
//!   still protected from pushes (grace period).
//! - Once the timer expires the window is TimedOut and stays protected until
//!   the cursor leaves the proximity zone entirely.
//! - While the override key is held every window is suppressed. After release
//!   the window stays suppressed until the cursor is at least the release
//!   tolerance away from it.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HoverState {
    #[default]
    Idle,
    Approaching,
    Hovering,
    TimedOut,
    OverrideSuppressed,
}

impl HoverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoverState::Idle => "idle",
            HoverState::Approaching => "approaching",
            HoverState::Hovering => "hovering",
            HoverState::TimedOut => "timed_out",
            HoverState::OverrideSuppressed => "override_suppressed",
        }
    }
}

/// Hover bookkeeping stored on each tracked window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverRecord {
    pub state: HoverState,
    /// Set when the cursor first leaves the window after hovering it.
    pub hover_started_at: Option<Instant>,
    pub timeout_reached: bool,
}

impl HoverRecord {
    fn reset(&mut self) {
        *self = HoverRecord::default();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HoverInput {
    pub now: Instant,
    pub cursor_inside: bool,
    pub within_proximity: bool,
    /// Physical pixels from the cursor to the window edge (0 inside).
    pub edge_distance: f64,
    pub override_held: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverSettings {
    /// Physical pixels.
    pub proximity_threshold: f64,
    /// `None` disables the post-hover grace period.
    pub hover_timeout: Option<Duration>,
    /// Physical pixels.
    pub override_release_tolerance: f64,
}

/// Advance `record` by one sample. Returns true when the window may be
/// pushed this tick.
///
/// An idle window within proximity is pushed even if the cursor is already
/// inside it; Hovering is only entered from Approaching or when the cursor is
/// inside but outside the threshold.
pub fn step(record: &mut HoverRecord, input: &HoverInput, settings: &HoverSettings) -> bool {
    if input.override_held {
        if record.state != HoverState::OverrideSuppressed {
            tracing::trace!("Override engaged (was {})", record.state.as_str());
        }
        record.state = HoverState::OverrideSuppressed;
        record.hover_started_at = None;
        record.timeout_reached = false;
        return false;
    }

    if record.state == HoverState::OverrideSuppressed {
        if input.edge_distance < settings.override_release_tolerance {
            return false;
        }
        record.reset();
    }

    match record.state {
        HoverState::Idle => {
            if input.within_proximity {
                record.state = HoverState::Approaching;
                true
            } else if input.cursor_inside {
                enter_hover(record);
                false
            } else {
                false
            }
        }
        HoverState::Approaching => {
            if input.cursor_inside {
                enter_hover(record);
                false
            } else if input.within_proximity {
                true
            } else {
                record.state = HoverState::Idle;
                false
            }
        }
        HoverState::Hovering => {
            if input.cursor_inside {
                return false;
            }
            let Some(timeout) = settings.hover_timeout else {
                record.reset();
                if input.within_proximity {
                    record.state = HoverState::Approaching;
                    return true;
                }
                return false;
            };
            let started = *record.hover_started_at.get_or_insert(input.now);
            if input.now.saturating_duration_since(started) >= timeout {
                record.state = HoverState::TimedOut;
                record.timeout_reached = true;
                disengage_if_clear(record, input, settings);
            }
            false
        }
        HoverState::TimedOut => {
            disengage_if_clear(record, input, settings);
            false
        }
        HoverState::OverrideSuppressed => unreachable!("released above"),
    }
}

fn enter_hover(record: &mut HoverRecord) {
    record.state = HoverState::Hovering;
    record.hover_started_at = None;
    record.timeout_reached = false;
}

fn disengage_if_clear(record: &mut HoverRecord, input: &HoverInput, settings: &HoverSettings) {
    if input.edge_distance > settings.proximity_threshold {
        record.reset();
    }
}
