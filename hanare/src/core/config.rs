use std::collections::BTreeMap;
use std::time::Duration;

use hanare_ipc::{ConfigDeltaInfo, EasingType, ModifierKey, ProximityAlgorithm, WrapPreference};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MonitorId;

pub const MIN_HOVER_TIMEOUT_MS: u64 = 100;
/// Upper bound for every pixel setting.
pub const MAX_PIXEL_VALUE: u32 = 100_000;

/// Engine settings. Pixel values are logical pixels and are scaled by the
/// DPI of the monitor a window is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfiguration {
    pub proximity_threshold: u32,
    pub push_distance: u32,
    pub edge_buffer: u32,
    pub proximity_algorithm: ProximityAlgorithm,
    pub sensitivity_x: f64,
    pub sensitivity_y: f64,
    pub override_enabled: bool,
    pub override_key: ModifierKey,
    pub override_release_tolerance: u32,
    /// Added to the proximity threshold of always-on-top windows.
    pub topmost_repel_border: u32,
    pub hover_timeout_enabled: bool,
    pub hover_timeout_ms: u64,
    pub animation_enabled: bool,
    pub animation_duration_ms: u64,
    pub animation_easing: EasingType,
    pub update_interval_ms: u64,
    pub max_update_interval_ms: u64,
    pub discovery_interval_ms: u64,
    pub apply_to_all_windows: bool,
    pub multi_monitor: MultiMonitorSettings,
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            proximity_threshold: 50,
            push_distance: 100,
            edge_buffer: 10,
            proximity_algorithm: ProximityAlgorithm::NearestEdge,
            sensitivity_x: 1.0,
            sensitivity_y: 1.0,
            override_enabled: true,
            override_key: ModifierKey::Control,
            override_release_tolerance: 30,
            topmost_repel_border: 0,
            hover_timeout_enabled: true,
            hover_timeout_ms: 5000,
            animation_enabled: true,
            animation_duration_ms: 150,
            animation_easing: EasingType::EaseOut,
            update_interval_ms: 16,
            max_update_interval_ms: 100,
            discovery_interval_ms: 500,
            apply_to_all_windows: false,
            multi_monitor: MultiMonitorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiMonitorSettings {
    pub wrap_enabled: bool,
    pub wrap_preference: WrapPreference,
    pub respect_work_area: bool,
    pub cross_monitor_enabled: bool,
    /// Largest gap in pixels between two monitors that still counts as
    /// contiguous.
    pub cross_monitor_threshold: u32,
    pub monitor_overrides: BTreeMap<MonitorId, MonitorOverride>,
}

impl Default for MultiMonitorSettings {
    fn default() -> Self {
        Self {
            wrap_enabled: true,
            wrap_preference: WrapPreference::Smart,
            respect_work_area: true,
            cross_monitor_enabled: true,
            cross_monitor_threshold: 16,
            monitor_overrides: BTreeMap::new(),
        }
    }
}

impl MultiMonitorSettings {
    pub fn wrap_preference_for(&self, monitor_id: MonitorId) -> WrapPreference {
        self.monitor_overrides
            .get(&monitor_id)
            .and_then(|o| o.wrap_preference)
            .unwrap_or(self.wrap_preference)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorOverride {
    pub enabled: bool,
    pub wrap_preference: Option<WrapPreference>,
    pub proximity_threshold: Option<u32>,
    pub push_distance: Option<u32>,
}

impl Default for MonitorOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            wrap_preference: None,
            proximity_threshold: None,
            push_distance: None,
        }
    }
}

/// Settings after applying the override for one monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub proximity_threshold: u32,
    pub push_distance: u32,
}

impl EngineConfiguration {
    pub fn for_monitor(&self, monitor_id: MonitorId) -> MonitorSettings {
        let o = self.multi_monitor.monitor_overrides.get(&monitor_id);
        MonitorSettings {
            enabled: o.map_or(true, |o| o.enabled),
            proximity_threshold: o
                .and_then(|o| o.proximity_threshold)
                .unwrap_or(self.proximity_threshold),
            push_distance: o
                .and_then(|o| o.push_distance)
                .unwrap_or(self.push_distance),
        }
    }

    pub fn hover_timeout(&self) -> Option<Duration> {
        self.hover_timeout_enabled
            .then(|| Duration::from_millis(self.hover_timeout_ms))
    }

    pub fn animation_duration(&self) -> Duration {
        if self.animation_enabled {
            Duration::from_millis(self.animation_duration_ms)
        } else {
            Duration::ZERO
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn max_update_interval(&self) -> Duration {
        Duration::from_millis(self.max_update_interval_ms)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        if self.proximity_threshold == 0 {
            violations.push(ConfigViolation::ZeroValue("proximity_threshold"));
        }
        if self.push_distance == 0 {
            violations.push(ConfigViolation::ZeroValue("push_distance"));
        }
        if self.hover_timeout_enabled && self.hover_timeout_ms < MIN_HOVER_TIMEOUT_MS {
            violations.push(ConfigViolation::HoverTimeoutTooShort {
                value: self.hover_timeout_ms,
            });
        }
        for (name, value) in [
            ("sensitivity_x", self.sensitivity_x),
            ("sensitivity_y", self.sensitivity_y),
        ] {
            if !value.is_finite() || value <= 0.0 {
                violations.push(ConfigViolation::InvalidSensitivity { name, value });
            }
        }
        if self.update_interval_ms == 0 {
            violations.push(ConfigViolation::ZeroValue("update_interval_ms"));
        } else if self.update_interval_ms > self.max_update_interval_ms {
            violations.push(ConfigViolation::UpdateIntervalAboveMax {
                interval: self.update_interval_ms,
                max: self.max_update_interval_ms,
            });
        }
        if self.discovery_interval_ms == 0 {
            violations.push(ConfigViolation::ZeroValue("discovery_interval_ms"));
        }
        for (name, value) in [
            ("proximity_threshold", self.proximity_threshold),
            ("push_distance", self.push_distance),
            ("edge_buffer", self.edge_buffer),
            ("override_release_tolerance", self.override_release_tolerance),
            ("topmost_repel_border", self.topmost_repel_border),
            (
                "multi_monitor.cross_monitor_threshold",
                self.multi_monitor.cross_monitor_threshold,
            ),
        ] {
            if value > MAX_PIXEL_VALUE {
                violations.push(ConfigViolation::PixelValueTooLarge { name, value });
            }
        }
        for (monitor_id, o) in &self.multi_monitor.monitor_overrides {
            for (name, value) in [
                ("proximity_threshold", o.proximity_threshold),
                ("push_distance", o.push_distance),
            ] {
                if value.is_some_and(|v| v > MAX_PIXEL_VALUE) {
                    violations.push(ConfigViolation::MonitorPixelValueTooLarge {
                        monitor_id: *monitor_id,
                        name,
                    });
                }
            }
            if o.proximity_threshold == Some(0) {
                violations.push(ConfigViolation::ZeroMonitorOverride {
                    monitor_id: *monitor_id,
                    name: "proximity_threshold",
                });
            }
            if o.push_distance == Some(0) {
                violations.push(ConfigViolation::ZeroMonitorOverride {
                    monitor_id: *monitor_id,
                    name: "push_distance",
                });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(violations))
        }
    }

    /// Copy of `self` with every hot-swappable field taken from `incoming`.
    /// Restart-required fields keep their current values.
    pub fn merge_hot_swappable(&self, incoming: &EngineConfiguration) -> EngineConfiguration {
        EngineConfiguration {
            update_interval_ms: self.update_interval_ms,
            max_update_interval_ms: self.max_update_interval_ms,
            discovery_interval_ms: self.discovery_interval_ms,
            apply_to_all_windows: self.apply_to_all_windows,
            multi_monitor: self.multi_monitor.clone(),
            ..incoming.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigViolation {
    #[error("{0} must be greater than 0")]
    ZeroValue(&'static str),
    #[error("hover_timeout_ms must be at least {MIN_HOVER_TIMEOUT_MS}ms when enabled (got {value})")]
    HoverTimeoutTooShort { value: u64 },
    #[error("{name} must be a positive number (got {value})")]
    InvalidSensitivity { name: &'static str, value: f64 },
    #[error("update_interval_ms ({interval}) must not exceed max_update_interval_ms ({max})")]
    UpdateIntervalAboveMax { interval: u64, max: u64 },
    #[error("monitor {monitor_id}: {name} must be greater than 0")]
    ZeroMonitorOverride {
        monitor_id: MonitorId,
        name: &'static str,
    },
    #[error("{name} must not exceed {MAX_PIXEL_VALUE}px (got {value})")]
    PixelValueTooLarge { name: &'static str, value: u32 },
    #[error("monitor {monitor_id}: {name} must not exceed {MAX_PIXEL_VALUE}px")]
    MonitorPixelValueTooLarge {
        monitor_id: MonitorId,
        name: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", describe(.0))]
    Invalid(Vec<ConfigViolation>),
}

impl ConfigError {
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            ConfigError::Invalid(v) => v,
        }
    }
}

fn describe(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingClass {
    HotSwappable,
    RestartRequired,
}

/// Every setting name and how a change to it is applied.
pub const SETTING_CLASSES: &[(&str, SettingClass)] = &[
    ("proximity_threshold", SettingClass::HotSwappable),
    ("push_distance", SettingClass::HotSwappable),
    ("edge_buffer", SettingClass::HotSwappable),
    ("proximity_algorithm", SettingClass::HotSwappable),
    ("sensitivity_x", SettingClass::HotSwappable),
    ("sensitivity_y", SettingClass::HotSwappable),
    ("override_enabled", SettingClass::HotSwappable),
    ("override_key", SettingClass::HotSwappable),
    ("override_release_tolerance", SettingClass::HotSwappable),
    ("topmost_repel_border", SettingClass::HotSwappable),
    ("hover_timeout_enabled", SettingClass::HotSwappable),
    ("hover_timeout_ms", SettingClass::HotSwappable),
    ("animation_enabled", SettingClass::HotSwappable),
    ("animation_duration_ms", SettingClass::HotSwappable),
    ("animation_easing", SettingClass::HotSwappable),
    ("update_interval_ms", SettingClass::RestartRequired),
    ("max_update_interval_ms", SettingClass::RestartRequired),
    ("discovery_interval_ms", SettingClass::RestartRequired),
    ("apply_to_all_windows", SettingClass::RestartRequired),
    ("multi_monitor.wrap_enabled", SettingClass::RestartRequired),
    ("multi_monitor.wrap_preference", SettingClass::RestartRequired),
    ("multi_monitor.respect_work_area", SettingClass::RestartRequired),
    ("multi_monitor.cross_monitor_enabled", SettingClass::RestartRequired),
    ("multi_monitor.cross_monitor_threshold", SettingClass::RestartRequired),
    ("multi_monitor.monitor_overrides", SettingClass::RestartRequired),
];

pub fn classify(name: &str) -> Option<SettingClass> {
    SETTING_CLASSES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, class)| *class)
}

/// Changed setting names between two configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationDelta {
    pub hot_swappable: Vec<&'static str>,
    pub restart_required: Vec<&'static str>,
}

impl ConfigurationDelta {
    pub fn is_empty(&self) -> bool {
        self.hot_swappable.is_empty() && self.restart_required.is_empty()
    }

    pub fn requires_restart(&self) -> bool {
        !self.restart_required.is_empty()
    }

    pub fn to_info(&self) -> ConfigDeltaInfo {
        ConfigDeltaInfo {
            hot_swappable: self.hot_swappable.iter().map(|s| s.to_string()).collect(),
            restart_required: self.restart_required.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn changed_settings(old: &EngineConfiguration, new: &EngineConfiguration) -> Vec<&'static str> {
    let (om, nm) = (&old.multi_monitor, &new.multi_monitor);
    [
        ("proximity_threshold", old.proximity_threshold != new.proximity_threshold),
        ("push_distance", old.push_distance != new.push_distance),
        ("edge_buffer", old.edge_buffer != new.edge_buffer),
        ("proximity_algorithm", old.proximity_algorithm != new.proximity_algorithm),
        ("sensitivity_x", old.sensitivity_x != new.sensitivity_x),
        ("sensitivity_y", old.sensitivity_y != new.sensitivity_y),
        ("override_enabled", old.override_enabled != new.override_enabled),
        ("override_key", old.override_key != new.override_key),
        (
            "override_release_tolerance",
            old.override_release_tolerance != new.override_release_tolerance,
        ),
        ("topmost_repel_border", old.topmost_repel_border != new.topmost_repel_border),
        ("hover_timeout_enabled", old.hover_timeout_enabled != new.hover_timeout_enabled),
        ("hover_timeout_ms", old.hover_timeout_ms != new.hover_timeout_ms),
        ("animation_enabled", old.animation_enabled != new.animation_enabled),
        ("animation_duration_ms", old.animation_duration_ms != new.animation_duration_ms),
        ("animation_easing", old.animation_easing != new.animation_easing),
        ("update_interval_ms", old.update_interval_ms != new.update_interval_ms),
        ("max_update_interval_ms", old.max_update_interval_ms != new.max_update_interval_ms),
        ("discovery_interval_ms", old.discovery_interval_ms != new.discovery_interval_ms),
        ("apply_to_all_windows", old.apply_to_all_windows != new.apply_to_all_windows),
        ("multi_monitor.wrap_enabled", om.wrap_enabled != nm.wrap_enabled),
        ("multi_monitor.wrap_preference", om.wrap_preference != nm.wrap_preference),
        ("multi_monitor.respect_work_area", om.respect_work_area != nm.respect_work_area),
        (
            "multi_monitor.cross_monitor_enabled",
            om.cross_monitor_enabled != nm.cross_monitor_enabled,
        ),
        (
            "multi_monitor.cross_monitor_threshold",
            om.cross_monitor_threshold != nm.cross_monitor_threshold,
        ),
        (
            "multi_monitor.monitor_overrides",
            om.monitor_overrides != nm.monitor_overrides,
        ),
    ]
    .into_iter()
    .filter_map(|(name, changed)| changed.then_some(name))
    .collect()
}

/// Compare two configurations and sort every changed setting into the set
/// that can be applied live or the set that needs an engine restart.
pub fn analyze_changes(old: &EngineConfiguration, new: &EngineConfiguration) -> ConfigurationDelta {
    let mut delta = ConfigurationDelta::default();
    for name in changed_settings(old, new) {
        match classify(name) {
            Some(SettingClass::HotSwappable) => delta.hot_swappable.push(name),
            // Anything unclassified is treated conservatively.
            Some(SettingClass::RestartRequired) | None => delta.restart_required.push(name),
        }
    }
    delta
}
