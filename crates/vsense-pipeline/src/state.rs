//! Pipeline states and stages.

use serde::Serialize;
use std::fmt;

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Fetching,
    Training,
    Succeeded,
    Failed,
}

impl PipelineState {
    /// Whether a run in this state still owns the pipeline.
    pub fn is_active(&self) -> bool {
        matches!(self, PipelineState::Fetching | PipelineState::Training)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }

    /// Transition guard.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Training)
                | (Fetching, Failed)
                | (Training, Succeeded)
                | (Training, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Fetching => "fetching",
            PipelineState::Training => "training",
            PipelineState::Succeeded => "succeeded",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Train,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Train => "train",
        }
    }

    /// State the run is in while this stage executes.
    pub fn running_state(&self) -> PipelineState {
        match self {
            Stage::Fetch => PipelineState::Fetching,
            Stage::Train => PipelineState::Training,
        }
    }

    /// Error reported when this stage fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Stage::Fetch => "Failed to fetch data",
            Stage::Train => "Model training failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Idle.can_transition_to(Fetching));
        assert!(Fetching.can_transition_to(Training));
        assert!(Fetching.can_transition_to(Failed));
        assert!(Training.can_transition_to(Succeeded));
        assert!(Training.can_transition_to(Failed));
    }

    #[test]
    fn test_rejected_transitions() {
        // Training can only be reached through a successful fetch.
        assert!(!Idle.can_transition_to(Training));
        assert!(!Fetching.can_transition_to(Succeeded));
        assert!(!Succeeded.can_transition_to(Fetching));
        assert!(!Failed.can_transition_to(Training));
        assert!(!Training.can_transition_to(Fetching));
    }

    #[test]
    fn test_activity() {
        assert!(Fetching.is_active() && Training.is_active());
        assert!(!Idle.is_active() && !Succeeded.is_active() && !Failed.is_active());
        assert!(Succeeded.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Fetching).unwrap(), "\"fetching\"");
        assert_eq!(serde_json::to_string(&Stage::Train).unwrap(), "\"train\"");
    }
}
