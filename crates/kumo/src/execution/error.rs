//! Error types for plan execution.

use thiserror::Error;

use crate::plan::NodeId;
use crate::registry::StepError;

/// Misuse of a node's execution state machine.
///
/// These indicate a bug in the embedding engine rather than a failing test,
/// so they are raised immediately instead of being recorded as outcomes.
///
/// # Examples
///
/// ```
/// use kumo::execution::{ExecutionState, StateError};
/// use kumo::NodeResult;
///
/// let mut state = ExecutionState::new();
/// assert_eq!(state.mark_finished(NodeResult::Passed), Err(StateError::NotStarted));
/// state.mark_started().expect("first start");
/// assert_eq!(state.mark_started(), Err(StateError::AlreadyStarted));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StateError {
    /// `mark_started` called on a node that already started.
    #[error("node has already started")]
    AlreadyStarted,
    /// `mark_finished` called on a node that never started.
    #[error("node has not started")]
    NotStarted,
    /// `mark_finished` called on a node that already finished.
    #[error("node has already finished")]
    AlreadyFinished,
}

/// A run aborted by state machine misuse on a specific node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution state of node {node} misused: {source}")]
pub struct RunStateError {
    /// Node whose state was misused.
    pub node: NodeId,
    /// The misuse.
    pub source: StateError,
}

/// Failure of a backend lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// A set-up hook failed.
    #[error("set-up failed: {0}")]
    SetUp(StepError),
    /// A tear-down hook failed.
    #[error("tear-down failed: {0}")]
    TearDown(StepError),
    /// A hook panicked.
    #[error("hook panicked: {0}")]
    Panicked(String),
    /// The factory could not create a backend.
    #[error("no backend available for '{0}'")]
    Unavailable(String),
}
