use serde::{Deserialize, Serialize};

/// How the distance between the cursor and a window is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityAlgorithm {
    /// Distance from the cursor to the closest point of the window (0 inside).
    #[default]
    NearestEdge,
    /// Straight-line distance to the window center.
    Euclidean,
    /// Taxicab distance to the window center.
    Manhattan,
}

/// Where a window goes when a push would leave its monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapPreference {
    /// Continue onto the neighboring monitor in the direction of travel.
    Adjacent,
    /// Reappear at the opposite edge of the same monitor.
    Opposite,
    /// Adjacent when a neighbor exists, otherwise opposite.
    #[default]
    Smart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
}

/// Modifier key that suspends pushing while held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    #[default]
    Control,
    Option,
    Shift,
    Command,
}

impl std::fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModifierKey::Control => "control",
            ModifierKey::Option => "option",
            ModifierKey::Shift => "shift",
            ModifierKey::Command => "command",
        };
        write!(f, "{}", name)
    }
}
