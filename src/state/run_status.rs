/// Run lifecycle definitions
///
/// A run starts `Idle`, becomes `Running` once its engine loop starts, and
/// ends in exactly one terminal state.
use crate::CrawlError;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Engine created, loop not started
    Idle,

    /// Traversal loop is active
    Running,

    // ===== Terminal States =====
    /// Budget reached or frontier exhausted
    Completed,

    /// Cancellation flag observed; results are partial
    Cancelled,

    /// Unrecoverable setup error
    Failed,
}

impl RunStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Cancelled)
                | (Self::Running, Self::Failed)
        )
    }

    /// Performs a checked transition
    pub fn transition(self, next: RunStatus) -> Result<RunStatus, CrawlError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// String form used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!RunStatus::Idle.is_terminal());
        assert!(!RunStatus::Running.is_terminal());

        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        assert_eq!(
            RunStatus::Idle.transition(RunStatus::Running).unwrap(),
            RunStatus::Running
        );
        assert_eq!(
            RunStatus::Running.transition(RunStatus::Cancelled).unwrap(),
            RunStatus::Cancelled
        );
        assert!(RunStatus::Idle.can_transition_to(RunStatus::Failed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Completed));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [RunStatus::Completed, RunStatus::Cancelled, RunStatus::Failed] {
            assert!(!terminal.can_transition_to(RunStatus::Running));
            assert!(terminal.transition(RunStatus::Idle).is_err());
        }
    }

    #[test]
    fn test_idle_cannot_complete_directly() {
        let err = RunStatus::Idle.transition(RunStatus::Completed).unwrap_err();
        assert!(matches!(
            err,
            CrawlError::InvalidTransition {
                from: RunStatus::Idle,
                to: RunStatus::Completed
            }
        ));
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(format!("{}", RunStatus::Cancelled), "cancelled");
        assert_eq!(
            serde_json::to_string(&RunStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
