//! Time-based window movement.
//!
//! Animations are sampled against the tick's `now`, so there are no timers
//! and a tick that runs late simply jumps further along the curve.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use hanare_ipc::EasingType;

use super::{MonitorId, Rect, WindowId, WrapDecision};

#[inline]
fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (end - start).mul_add(t, start)
}

/// Map linear progress `t` in `[0, 1]` onto the easing curve.
pub fn ease(easing: EasingType, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    match easing {
        EasingType::Linear => t,
        EasingType::EaseIn => t * t * t,
        EasingType::EaseOut => {
            let t1 = t - 1.0;
            (t1 * t1).mul_add(t1, 1.0)
        }
        EasingType::EaseInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let t1 = 2.0f64.mul_add(t, -2.0);
                (0.5 * t1 * t1).mul_add(t1, 1.0)
            }
        }
    }
}

pub fn interpolate(from: &Rect, to: &Rect, t: f64) -> Rect {
    let width = lerp(from.width as f64, to.width as f64, t).round().max(1.0);
    let height = lerp(from.height as f64, to.height as f64, t).round().max(1.0);
    Rect::new(
        lerp(from.x as f64, to.x as f64, t).round() as i32,
        lerp(from.y as f64, to.y as f64, t).round() as i32,
        width as u32,
        height as u32,
    )
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub window_id: WindowId,
    pub from: Rect,
    pub to: Rect,
    pub monitor_id: MonitorId,
    pub crossed_monitor: bool,
    started_at: Instant,
    duration: Duration,
    easing: EasingType,
}

impl Animation {
    /// Panics when `duration` is zero; callers apply such moves directly.
    pub fn new(
        window_id: WindowId,
        from: Rect,
        decision: &WrapDecision,
        started_at: Instant,
        duration: Duration,
        easing: EasingType,
    ) -> Self {
        assert!(!duration.is_zero(), "animation duration must be positive");
        Self {
            window_id,
            from,
            to: decision.rect,
            monitor_id: decision.monitor_id,
            crossed_monitor: decision.crossed_monitor,
            started_at,
            duration,
            easing,
        }
    }

    /// Rectangle at `now` and whether the animation has finished.
    pub fn sample(&self, now: Instant) -> (Rect, bool) {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed >= self.duration {
            return (self.to, true);
        }
        let t = ease(
            self.easing,
            elapsed.as_secs_f64() / self.duration.as_secs_f64(),
        );
        (interpolate(&self.from, &self.to, t), false)
    }
}

/// One sampled step of an animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub window_id: WindowId,
    pub rect: Rect,
    /// Set on the final frame, which is always exactly the target.
    pub finished: bool,
    pub from: Rect,
    pub monitor_id: MonitorId,
    pub crossed_monitor: bool,
}

#[derive(Debug, Default)]
pub struct AnimationDriver {
    animations: HashMap<WindowId, Animation>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start animating. Replaces any animation already running for the window.
    pub fn begin(&mut self, animation: Animation) {
        tracing::trace!(
            "Animating window {} {:?} -> {:?}",
            animation.window_id,
            animation.from,
            animation.to
        );
        self.animations.insert(animation.window_id, animation);
    }

    pub fn is_animating(&self, window_id: WindowId) -> bool {
        self.animations.contains_key(&window_id)
    }

    /// Sample every animation at `now`. Finished animations yield their target
    /// once and are dropped.
    pub fn advance(&mut self, now: Instant) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(self.animations.len());
        self.animations.retain(|_, animation| {
            let (rect, finished) = animation.sample(now);
            frames.push(Frame {
                window_id: animation.window_id,
                rect,
                finished,
                from: animation.from,
                monitor_id: animation.monitor_id,
                crossed_monitor: animation.crossed_monitor,
            });
            !finished
        });
        frames
    }

    pub fn cancel(&mut self, window_id: WindowId) -> Option<Animation> {
        self.animations.remove(&window_id)
    }

    /// Drop every in-flight animation, returning the affected windows.
    pub fn cancel_all(&mut self) -> Vec<WindowId> {
        self.animations.drain().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WrapOutcome;

    fn decision(rect: Rect) -> WrapDecision {
        WrapDecision {
            rect,
            monitor_id: 1,
            crossed_monitor: false,
            outcome: WrapOutcome::Inside,
        }
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            EasingType::Linear,
            EasingType::EaseIn,
            EasingType::EaseOut,
            EasingType::EaseInOut,
        ] {
            assert!(ease(easing, 0.0).abs() < 1e-12);
            assert!((ease(easing, 1.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_easing_shapes() {
        assert!((ease(EasingType::Linear, 0.25) - 0.25).abs() < f64::EPSILON);
        assert!(ease(EasingType::EaseIn, 0.5) < 0.5);
        assert!(ease(EasingType::EaseOut, 0.5) > 0.5);
        assert!((ease(EasingType::EaseInOut, 0.5) - 0.5).abs() < 1e-12);
        assert!(ease(EasingType::EaseInOut, 0.25) < 0.25);
        assert!(ease(EasingType::EaseInOut, 0.75) > 0.75);
    }

    #[test]
    fn test_interpolate() {
        let from = Rect::new(0, 0, 100, 100);
        let to = Rect::new(100, -50, 200, 100);
        assert_eq!(interpolate(&from, &to, 0.5), Rect::new(50, -25, 150, 100));
        assert_eq!(interpolate(&from, &to, 1.0), to);
    }

    #[test]
    fn test_driver_yields_target_once_then_drops() {
        let t0 = Instant::now();
        let from = Rect::new(0, 0, 200, 100);
        let to = Rect::new(100, 0, 200, 100);
        let mut driver = AnimationDriver::new();
        driver.begin(Animation::new(
            7,
            from,
            &decision(to),
            t0,
            Duration::from_millis(100),
            EasingType::Linear,
        ));
        assert!(driver.is_animating(7));

        let frames = driver.advance(t0 + Duration::from_millis(50));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].rect, Rect::new(50, 0, 200, 100));
        assert!(!frames[0].finished);

        let frames = driver.advance(t0 + Duration::from_millis(130));
        assert_eq!(frames[0].rect, to);
        assert!(frames[0].finished);
        assert_eq!(frames[0].from, from);

        assert!(!driver.is_animating(7));
        assert!(driver.advance(t0 + Duration::from_millis(200)).is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let t0 = Instant::now();
        let mut driver = AnimationDriver::new();
        for id in [1, 2, 3] {
            driver.begin(Animation::new(
                id,
                Rect::new(0, 0, 10, 10),
                &decision(Rect::new(50, 0, 10, 10)),
                t0,
                Duration::from_millis(150),
                EasingType::EaseOut,
            ));
        }
        assert!(driver.cancel(2).is_some());
        let mut cancelled = driver.cancel_all();
        cancelled.sort();
        assert_eq!(cancelled, vec![1, 3]);
        assert!(!driver.is_animating(1));
        assert!(!driver.is_animating(3));
    }

    #[test]
    #[should_panic(expected = "animation duration must be positive")]
    fn test_zero_duration_is_a_contract_error() {
        Animation::new(
            1,
            Rect::default(),
            &decision(Rect::default()),
            Instant::now(),
            Duration::ZERO,
            EasingType::Linear,
        );
    }
}
