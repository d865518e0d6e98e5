//! Transition queries and ticket moves
//!
//! Pure functions answering "where can a ticket go from here" against a
//! workflow graph, and applying a move to a ticket position. Callers must
//! pass the live graph: a move validated against a stale copy may be wrong.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{Result, TicketflowError};
use crate::schemas::{
    EntityId, SlaTimer, TicketPosition, TimeUnit, WorkflowDetail, WorkflowState,
    WorkflowTransition,
};

use super::sla::start_timer;

/// All states flagged initial.
///
/// Does not assume the single-initial invariant holds.
pub fn initial_states(detail: &WorkflowDetail) -> Vec<WorkflowState> {
    detail
        .states
        .iter()
        .filter(|s| s.is_initial)
        .cloned()
        .collect()
}

fn require_state(detail: &WorkflowDetail, state_id: EntityId) -> Result<&WorkflowState> {
    detail.state(state_id).ok_or_else(|| {
        TicketflowError::InvalidReference(format!(
            "state {} does not belong to workflow {}",
            state_id,
            detail
                .id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "(unsaved)".to_string())
        ))
    })
}

/// States reachable from `from_state_id` by exactly one transition.
///
/// Each target appears once, in order of first appearance. With
/// `include_self` the source state is included as a "stay" option. An empty
/// result means no further transitions are available.
pub fn valid_target_states(
    detail: &WorkflowDetail,
    from_state_id: EntityId,
    include_self: bool,
) -> Result<Vec<WorkflowState>> {
    let from = require_state(detail, from_state_id)?;

    let mut seen = BTreeSet::new();
    let mut targets = Vec::new();

    if include_self {
        seen.insert(from_state_id);
        targets.push(from.clone());
    }

    for transition in detail.outgoing(from_state_id) {
        let Some(target_id) = transition.target_state_id else {
            continue;
        };
        if !seen.insert(target_id) {
            continue;
        }
        if let Some(target) = detail.state(target_id) {
            targets.push(target.clone());
        }
    }

    Ok(targets)
}

/// One way out of a state: the transition and where it leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOption {
    pub transition_id: Option<EntityId>,
    pub event_name: String,
    pub target: WorkflowState,
}

/// Every outgoing transition of a state with its event name.
///
/// Unlike [`valid_target_states`] this keeps one entry per transition, so
/// two events leading to the same state stay distinguishable.
pub fn available_moves(
    detail: &WorkflowDetail,
    from_state_id: EntityId,
) -> Result<Vec<MoveOption>> {
    require_state(detail, from_state_id)?;

    Ok(detail
        .outgoing(from_state_id)
        .filter_map(|t| {
            let target = detail.state(t.target_state_id?)?;
            Some(MoveOption {
                transition_id: t.id,
                event_name: t.event_name.clone(),
                target: target.clone(),
            })
        })
        .collect())
}

/// How a requested move is justified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move<'a> {
    /// Along this transition
    Transition(&'a WorkflowTransition),
    /// Staying in the current state without taking a transition
    Stay,
}

/// Check that a ticket may move from `from` to `to`.
///
/// When several transitions connect the pair, the first declared one is used.
/// `allow_stay` accepts `from == to` as a no-op when no self-loop exists.
pub fn check_move(
    detail: &WorkflowDetail,
    from: EntityId,
    to: EntityId,
    allow_stay: bool,
) -> Result<Move<'_>> {
    let from_state = require_state(detail, from)?;
    let to_state = require_state(detail, to)?;

    if let Some(transition) = detail
        .outgoing(from)
        .find(|t| t.target_state_id == Some(to))
    {
        return Ok(Move::Transition(transition));
    }

    if from == to && allow_stay {
        return Ok(Move::Stay);
    }

    Err(TicketflowError::StateTransition(format!(
        "cannot transition from {} to {}",
        from_state.state_name, to_state.state_name
    )))
}

/// Outcome of a successful ticket move
#[derive(Debug, Clone, PartialEq)]
pub struct TicketMove {
    /// Where the ticket is now
    pub position: TicketPosition,

    /// Transition taken, or None when the ticket stayed without one
    pub transition: Option<WorkflowTransition>,

    /// The previous SLA timer, closed at the time of the move
    pub closed_timer: Option<SlaTimer>,
}

impl TicketMove {
    pub fn stayed(&self) -> bool {
        self.transition.is_none()
    }
}

/// Pure function that moves a ticket to `target_state_id` at time `at`.
///
/// This function:
/// - Never mutates the input position
/// - Validates the move against `detail`
/// - Closes the SLA timer of the state being left
/// - Starts the SLA timer of the transition taken, if it has one
///
/// # Errors
/// * `InvalidReference` - If the ticket or a state is not part of `detail`
/// * `StateTransition` - If no transition connects the two states
/// * `Validation` - If the transition's SLA duration is out of range
pub fn apply_ticket_transition(
    position: &TicketPosition,
    detail: &WorkflowDetail,
    target_state_id: EntityId,
    at: DateTime<Utc>,
    unit: TimeUnit,
    allow_stay: bool,
) -> Result<TicketMove> {
    if detail.id() != Some(position.workflow_id) {
        return Err(TicketflowError::InvalidReference(format!(
            "ticket belongs to workflow {}, not {:?}",
            position.workflow_id,
            detail.id()
        )));
    }

    let from_state_id = position.current_state_id;
    let transition = match check_move(detail, from_state_id, target_state_id, allow_stay)? {
        Move::Transition(transition) => transition,
        Move::Stay => {
            return Ok(TicketMove {
                position: position.clone(),
                transition: None,
                closed_timer: None,
            });
        }
    };

    let closed_timer = position.sla.clone().map(|mut timer| {
        timer.close(at);
        timer
    });

    let next_position = TicketPosition {
        workflow_id: position.workflow_id,
        current_state_id: target_state_id,
        entered_at: at,
        sla: start_timer(transition, at, unit)?,
    };

    Ok(TicketMove {
        position: next_position,
        transition: Some(transition.clone()),
        closed_timer,
    })
}
