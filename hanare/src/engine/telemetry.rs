use std::time::{Duration, Instant};

pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceSample {
    pub average_tick_micros: u64,
    pub max_tick_micros: u64,
    /// Ticks since the engine started.
    pub tick_count: u64,
    pub tracked_windows: usize,
}

/// Tick timing statistics, summarized every [`SAMPLE_INTERVAL`].
#[derive(Debug)]
pub struct Telemetry {
    tick_count: u64,
    window_ticks: u64,
    window_total: Duration,
    window_max: Duration,
    last_sample_at: Option<Instant>,
    interval: Duration,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL)
    }
}

impl Telemetry {
    pub fn new(interval: Duration) -> Self {
        Self {
            tick_count: 0,
            window_ticks: 0,
            window_total: Duration::ZERO,
            window_max: Duration::ZERO,
            last_sample_at: None,
            interval,
        }
    }

    /// Record one tick. Returns a sample once per interval.
    pub fn record(
        &mut self,
        elapsed: Duration,
        now: Instant,
        tracked_windows: usize,
    ) -> Option<PerformanceSample> {
        self.tick_count += 1;
        self.window_ticks += 1;
        self.window_total += elapsed;
        self.window_max = self.window_max.max(elapsed);

        let last = *self.last_sample_at.get_or_insert(now);
        if now.saturating_duration_since(last) < self.interval {
            return None;
        }

        let sample = PerformanceSample {
            average_tick_micros: (self.window_total / self.window_ticks as u32).as_micros() as u64,
            max_tick_micros: self.window_max.as_micros() as u64,
            tick_count: self.tick_count,
            tracked_windows,
        };
        self.window_ticks = 0;
        self.window_total = Duration::ZERO;
        self.window_max = Duration::ZERO;
        self.last_sample_at = Some(now);
        Some(sample)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.interval);
    }
}

/// Tick interval that backs off while ticks overrun their budget.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Cadence {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            current: base,
        }
    }

    pub fn interval(&self) -> Duration {
        self.current
    }

    /// Double the interval after an overrun, up to `max`. Halve it back
    /// toward `base` once ticks comfortably fit again.
    pub fn record(&mut self, elapsed: Duration) {
        if elapsed > self.current {
            let next = (self.current * 2).min(self.max);
            if next != self.current {
                tracing::debug!(
                    "Tick took {:?}, backing off to {:?}",
                    elapsed,
                    next
                );
            }
            self.current = next;
        } else if self.current > self.base && elapsed * 2 < self.current {
            self.current = (self.current / 2).max(self.base);
        }
    }
}
