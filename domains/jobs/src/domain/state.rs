//! State machine for job status
//!
//! Valid transitions form the DAG `queued → processing → {completed, failed}`.
//! Terminal states never transition again, which is what keeps recovery from
//! re-running finished work.

use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

/// Job status states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [JobState] {
        match self {
            Self::Queued => &[Self::Processing],
            Self::Processing => &[Self::Completed, Self::Failed],
            Self::Completed => &[],
            Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Events that trigger job state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// Worker picks up the job for processing
    WorkerPicksUp,
    /// Job completes successfully
    Success,
    /// Job fails with an error
    Failure,
}

impl std::fmt::Display for JobEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkerPicksUp => write!(f, "worker_picks_up"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Job state machine
pub struct JobStateMachine;

impl JobStateMachine {
    /// Attempt a state transition
    ///
    /// Returns the new state if the transition is valid, or an error otherwise.
    pub fn transition(current: JobState, event: JobEvent) -> Result<JobState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (JobState::Queued, JobEvent::WorkerPicksUp) => JobState::Processing,
            (JobState::Processing, JobEvent::Success) => JobState::Completed,
            (JobState::Processing, JobEvent::Failure) => JobState::Failed,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: JobState, event: &JobEvent) -> bool {
        Self::transition(current, event.clone()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let state = JobStateMachine::transition(JobState::Queued, JobEvent::WorkerPicksUp).unwrap();
        assert_eq!(state, JobState::Processing);

        let state = JobStateMachine::transition(JobState::Processing, JobEvent::Success).unwrap();
        assert_eq!(state, JobState::Completed);

        let state = JobStateMachine::transition(JobState::Processing, JobEvent::Failure).unwrap();
        assert_eq!(state, JobState::Failed);
    }

    #[test]
    fn test_terminal_states_never_transition() {
        for terminal in [JobState::Completed, JobState::Failed] {
            for event in [JobEvent::WorkerPicksUp, JobEvent::Success, JobEvent::Failure] {
                let result = JobStateMachine::transition(terminal, event);
                assert!(matches!(result, Err(StateError::TerminalState(_))));
            }
        }
    }

    #[test]
    fn test_queued_cannot_complete_directly() {
        let result = JobStateMachine::transition(JobState::Queued, JobEvent::Success);
        assert!(matches!(result, Err(StateError::InvalidTransition { .. })));

        let result = JobStateMachine::transition(JobState::Queued, JobEvent::Failure);
        assert!(matches!(result, Err(StateError::InvalidTransition { .. })));
    }

    #[test]
    fn test_processing_cannot_be_picked_up_again() {
        let result = JobStateMachine::transition(JobState::Processing, JobEvent::WorkerPicksUp);
        assert!(matches!(result, Err(StateError::InvalidTransition { .. })));
    }

    #[test]
    fn test_valid_transitions_match_dag() {
        assert_eq!(JobState::Queued.valid_transitions(), &[JobState::Processing]);
        assert_eq!(
            JobState::Processing.valid_transitions(),
            &[JobState::Completed, JobState::Failed]
        );
        assert!(JobState::Completed.valid_transitions().is_empty());
        assert!(JobState::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn test_can_transition() {
        assert!(JobStateMachine::can_transition(
            JobState::Queued,
            &JobEvent::WorkerPicksUp
        ));
        assert!(!JobStateMachine::can_transition(
            JobState::Completed,
            &JobEvent::Failure
        ));
    }
}
