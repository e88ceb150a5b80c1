//! Run events delivered synchronously to observers.
//!
//! Observers are called in subscription order on the thread executing the
//! plan. A slow observer stalls the run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::execution::NodeResult;
use crate::plan::{NodeId, NodeKind, PlanNode};

/// What an [`Event`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A plan run began.
    PlanRunStarted,
    /// A plan run ended.
    PlanRunFinished,
    /// A node started.
    NodeRunStarted,
    /// A node finished.
    NodeRunFinished,
}

/// A timestamped notification about a plan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Node concerned; the plan root for plan events.
    pub node: NodeId,
    /// Kind of that node.
    pub node_kind: NodeKind,
    /// Name of that node.
    pub name: String,
    /// Result, on finish events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<NodeResult>,
}

impl Event {
    pub(crate) fn new(kind: EventKind, node: &PlanNode, result: Option<NodeResult>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            node: node.id,
            node_kind: node.kind,
            name: node.name.clone(),
            result,
        }
    }
}

/// Receives run events.
pub trait EventObserver {
    /// Handle one event.
    fn notify(&mut self, event: &Event);
}

impl<F> EventObserver for F
where
    F: FnMut(&Event),
{
    fn notify(&mut self, event: &Event) {
        self(event);
    }
}

/// Ordered list of observers.
#[derive(Default)]
pub struct EventBus<'o> {
    observers: Vec<Box<dyn EventObserver + 'o>>,
}

impl fmt::Debug for EventBus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<'o> EventBus<'o> {
    /// A bus without observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer after the existing ones.
    pub fn subscribe(&mut self, observer: impl EventObserver + 'o) {
        self.observers.push(Box::new(observer));
    }

    /// Deliver `event` to every observer in subscription order.
    pub fn emit(&mut self, event: &Event) {
        for observer in &mut self.observers {
            observer.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_events_in_emission_order() {
        let mut seen = Vec::new();
        {
            let mut bus = EventBus::new();
            bus.subscribe(|event: &Event| seen.push(event.kind));
            let root = PlanNode::new(NodeKind::Plan, NodeId::root(), "plan");
            bus.emit(&Event::new(EventKind::PlanRunStarted, &root, None));
            bus.emit(&Event::new(
                EventKind::PlanRunFinished,
                &root,
                Some(NodeResult::Passed),
            ));
        }
        assert_eq!(
            seen,
            vec![
                EventKind::PlanRunStarted,
                EventKind::PlanRunFinished,
            ]
        );
    }
}
