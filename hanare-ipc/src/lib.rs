pub mod command;
pub mod event;
pub mod settings;

pub use command::{Command, ConfigDeltaInfo, EngineStatus, Response, TrackedWindowInfo};
pub use event::{EngineEvent, EventFilter, RectInfo, SubscribeRequest};
pub use settings::{EasingType, ModifierKey, ProximityAlgorithm, WrapPreference};
