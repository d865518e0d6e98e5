//! Ticket position schema - where a ticket sits in its workflow
//!
//! Tickets are owned elsewhere; this is the slice of a ticket the workflow
//! core reads and produces when a ticket moves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Escalation severity, ordered from none to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    #[default]
    None,
    Level1,
    Level2,
    Level3,
}

/// Remembers the highest escalation level a timer has reached.
///
/// Levels only ratchet upwards, even if a later evaluation computes a lower
/// one (clock skew, edited timeouts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscalationTracker {
    pub(crate) highest: EscalationLevel,
}

/// SLA clock started when a ticket enters a state through a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaTimer {
    /// Transition that started the clock
    pub transition_id: Option<EntityId>,

    pub started_at: DateTime<Utc>,

    /// None when the transition carries no SLA
    pub due_at: Option<DateTime<Utc>>,

    pub escalate_on_violation: bool,

    /// Set once the ticket transitions away, which stops the clock
    #[serde(default)]
    pub left_at: Option<DateTime<Utc>>,

    /// Highest level this timer has escalated to
    #[serde(default)]
    pub escalation: EscalationTracker,
}

/// A ticket's current position in a workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPosition {
    pub workflow_id: EntityId,

    pub current_state_id: EntityId,

    pub entered_at: DateTime<Utc>,

    /// Timer of the transition that led into the current state
    #[serde(default)]
    pub sla: Option<SlaTimer>,
}

impl TicketPosition {
    /// A ticket placed in a state without taking a transition (no SLA)
    pub fn new(
        workflow_id: EntityId,
        current_state_id: EntityId,
        entered_at: DateTime<Utc>,
    ) -> Self {
        TicketPosition {
            workflow_id,
            current_state_id,
            entered_at,
            sla: None,
        }
    }
}
