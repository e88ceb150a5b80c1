//! Per-node execution state.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;

use super::error::StateError;
use super::result::NodeResult;
use crate::plan::NodeId;
use crate::registry::Argument;

/// Lifecycle position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Not visited yet.
    #[default]
    NotStarted,
    /// Started but not finished.
    Running,
    /// Finished with a result.
    Finished,
}

/// Execution record of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionState {
    status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<NodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    arguments: Vec<Argument>,
}

impl ExecutionState {
    /// A state that has not started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `RUNNING` and stamp the start time.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::AlreadyStarted`] unless the node is `NOT_STARTED`.
    pub fn mark_started(&mut self) -> Result<(), StateError> {
        if self.status != ExecutionStatus::NotStarted {
            return Err(StateError::AlreadyStarted);
        }
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Move to `FINISHED` with `result` and stamp the finish time, unless a
    /// narrower timing was already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotStarted`] or [`StateError::AlreadyFinished`]
    /// unless the node is `RUNNING`.
    pub fn mark_finished(&mut self, result: NodeResult) -> Result<(), StateError> {
        match self.status {
            ExecutionStatus::NotStarted => Err(StateError::NotStarted),
            ExecutionStatus::Finished => Err(StateError::AlreadyFinished),
            ExecutionStatus::Running => {
                self.status = ExecutionStatus::Finished;
                self.finished_at.get_or_insert_with(Utc::now);
                self.result = Some(result);
                Ok(())
            }
        }
    }

    pub(crate) fn set_timing(&mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) {
        self.started_at = Some(started_at);
        self.finished_at = Some(finished_at);
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub(crate) fn set_arguments(&mut self, arguments: Vec<Argument>) {
        self.arguments = arguments;
    }

    /// Lifecycle position.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// When the node started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the node finished.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Time between start and finish, once both are known.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Result once finished.
    #[must_use]
    pub const fn result(&self) -> Option<NodeResult> {
        self.result
    }

    /// Error message of a failing node.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Coerced step arguments.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }
}

/// Execution states of a run keyed by node.
///
/// Nodes the run never visited have no entry.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTable {
    states: HashMap<NodeId, ExecutionState>,
}

impl ExecutionTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `node`, if it was visited.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&ExecutionState> {
        self.states.get(&node)
    }

    pub(crate) fn state_mut(&mut self, node: NodeId) -> &mut ExecutionState {
        self.states.entry(node).or_default()
    }

    /// Result of `node`, if it finished.
    #[must_use]
    pub fn result(&self, node: NodeId) -> Option<NodeResult> {
        self.get(node).and_then(ExecutionState::result)
    }

    /// Every recorded state.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &ExecutionState)> {
        self.states.iter()
    }

    /// Number of visited nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no node was visited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_lifecycle_once() {
        let mut state = ExecutionState::new();
        assert_eq!(state.status(), ExecutionStatus::NotStarted);
        assert_eq!(state.mark_started(), Ok(()));
        assert_eq!(state.status(), ExecutionStatus::Running);
        assert!(state.started_at().is_some());
        assert_eq!(state.mark_finished(NodeResult::Failed), Ok(()));
        assert_eq!(state.result(), Some(NodeResult::Failed));
        assert!(state.duration().is_some_and(|d| d >= chrono::Duration::zero()));
        assert_eq!(
            state.mark_finished(NodeResult::Passed),
            Err(StateError::AlreadyFinished)
        );
        assert_eq!(state.mark_started(), Err(StateError::AlreadyStarted));
        assert_eq!(state.result(), Some(NodeResult::Failed));
    }

    #[test]
    fn table_records_only_visited_nodes() {
        let mut table = ExecutionTable::new();
        let root = NodeId::root();
        let child = root.child("FEATURE:a.feature");
        let state = table.state_mut(child);
        assert_eq!(state.mark_started(), Ok(()));
        assert_eq!(state.mark_finished(NodeResult::Skipped), Ok(()));
        assert_eq!(table.len(), 1);
        assert_eq!(table.result(child), Some(NodeResult::Skipped));
        assert!(table.get(root).is_none());
    }
}
