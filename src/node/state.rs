use serde::{Deserialize, Serialize};

/// Lifecycle of an exchanger node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Starting,
    Running,
    Stopped,
}

impl NodeState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: &NodeState) -> bool {
        matches!(
            (self, target),
            (Self::Starting, Self::Running)
                | (Self::Starting, Self::Stopped)
                | (Self::Running, Self::Stopped)
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}
