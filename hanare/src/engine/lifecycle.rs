#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineLifecycle {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl EngineLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineLifecycle::Idle => "idle",
            EngineLifecycle::Running => "running",
            EngineLifecycle::Stopped => "stopped",
        }
    }
}
