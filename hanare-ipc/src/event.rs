use serde::{Deserialize, Serialize};

use crate::{ConfigDeltaInfo, EngineStatus, TrackedWindowInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectInfo {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to engine started/stopped events
    #[serde(default)]
    pub lifecycle: bool,
    /// Subscribe to window pushed events
    #[serde(default)]
    pub windows: bool,
    /// Subscribe to performance samples
    #[serde(default)]
    pub performance: bool,
    /// Subscribe to configuration updates
    #[serde(default)]
    pub configuration: bool,
}

impl EventFilter {
    /// Create a filter that subscribes to all events
    pub fn all() -> Self {
        Self {
            lifecycle: true,
            windows: true,
            performance: true,
            configuration: true,
        }
    }

    /// Check if the filter matches a given event
    pub fn matches(&self, event: &EngineEvent) -> bool {
        match event {
            EngineEvent::EngineStarted | EngineEvent::EngineStopped => self.lifecycle,
            EngineEvent::WindowPushed { .. } => self.windows,
            EngineEvent::PerformanceSample { .. } => self.performance,
            EngineEvent::ConfigurationUpdated { .. } => self.configuration,
            EngineEvent::Snapshot { .. } => true,
        }
    }

    /// Check if any filter is set
    pub fn any(&self) -> bool {
        self.lifecycle || self.windows || self.performance || self.configuration
    }
}

/// Request to subscribe to engine events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Whether to send a snapshot on connection
    #[serde(default)]
    pub snapshot: bool,
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    /// Get the effective filter (all if none specified)
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

/// Events emitted by the engine to UI and telemetry subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    EngineStarted,
    EngineStopped,
    WindowPushed {
        window_id: u32,
        old: RectInfo,
        new: RectInfo,
        monitor_id: u32,
        crossed_monitor: bool,
    },
    PerformanceSample {
        average_tick_micros: u64,
        max_tick_micros: u64,
        tick_count: u64,
        tracked_windows: usize,
    },
    ConfigurationUpdated {
        delta: ConfigDeltaInfo,
    },
    Snapshot {
        status: EngineStatus,
        windows: Vec<TrackedWindowInfo>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pushed() -> EngineEvent {
        EngineEvent::WindowPushed {
            window_id: 42,
            old: RectInfo {
                x: 0,
                y: 0,
                width: 200,
                height: 100,
            },
            new: RectInfo {
                x: 99,
                y: 16,
                width: 200,
                height: 100,
            },
            monitor_id: 1,
            crossed_monitor: false,
        }
    }

    #[test]
    fn test_event_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.lifecycle);
        assert!(filter.windows);
        assert!(filter.performance);
        assert!(filter.configuration);
    }

    #[test]
    fn test_event_filter_matches() {
        let filter = EventFilter {
            windows: true,
            ..Default::default()
        };
        assert!(filter.matches(&pushed()));
        assert!(!filter.matches(&EngineEvent::EngineStarted));
        assert!(!filter.matches(&EngineEvent::PerformanceSample {
            average_tick_micros: 10,
            max_tick_micros: 20,
            tick_count: 5,
            tracked_windows: 1,
        }));

        let snapshot = EngineEvent::Snapshot {
            status: EngineStatus {
                lifecycle: "running".to_string(),
                tracked_windows: 0,
                monitors: 1,
                override_active: false,
            },
            windows: vec![],
        };
        assert!(filter.matches(&snapshot));
    }

    #[test]
    fn test_subscribe_request_effective_filter() {
        let request = SubscribeRequest::default();
        let filter = request.effective_filter();
        assert!(filter.lifecycle && filter.windows && filter.performance && filter.configuration);

        let request = SubscribeRequest {
            snapshot: false,
            filter: EventFilter {
                performance: true,
                ..Default::default()
            },
        };
        let filter = request.effective_filter();
        assert!(filter.performance);
        assert!(!filter.windows);
    }

    #[test]
    fn test_window_pushed_serialization() {
        let json = serde_json::to_string(&pushed()).unwrap();
        assert!(json.contains("\"type\":\"window_pushed\""));
        assert!(json.contains("\"window_id\":42"));
        assert!(json.contains("\"crossed_monitor\":false"));

        let deserialized: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, pushed());
    }

    #[test]
    fn test_lifecycle_serialization() {
        let json = serde_json::to_string(&EngineEvent::EngineStopped).unwrap();
        assert_eq!(json, "{\"type\":\"engine_stopped\"}");
    }

    #[test]
    fn test_subscribe_request_serialization() {
        let request: SubscribeRequest =
            serde_json::from_str("{\"snapshot\":true,\"filter\":{\"configuration\":true}}")
                .unwrap();
        assert!(request.snapshot);
        assert!(request.filter.configuration);
        assert!(!request.filter.lifecycle);

        let empty: SubscribeRequest = serde_json::from_str("{}").unwrap();
        assert!(!empty.snapshot);
        assert!(!empty.filter.any());
    }
}
