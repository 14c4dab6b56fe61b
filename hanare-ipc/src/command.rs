use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Queries
    Status,
    ListWindows,
    GetConfig,

    // Engine control
    ReloadConfig,
    Pause,
    Resume,

    // Control
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error {
        message: String,
    },
    Status {
        status: EngineStatus,
    },
    Windows {
        windows: Vec<TrackedWindowInfo>,
    },
    Config {
        config: serde_json::Value,
    },
    ConfigReloaded {
        delta: ConfigDeltaInfo,
        restarted: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub lifecycle: String,
    pub tracked_windows: usize,
    pub monitors: usize,
    pub override_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedWindowInfo {
    pub id: u32,
    pub title: String,
    pub owner_name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub hover_state: String,
    pub is_topmost: bool,
    pub is_animating: bool,
    pub in_proximity: bool,
}

/// Changed setting names, split by how they take effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDeltaInfo {
    #[serde(default)]
    pub hot_swappable: Vec<String>,
    #[serde(default)]
    pub restart_required: Vec<String>,
}
