//! State query commands - Initial states and valid next states

use crate::errors::Result;
use crate::schemas::{EntityId, WorkflowState};
use std::path::Path;

use super::{open_service, print_json};

pub async fn initial(cwd: Option<&Path>, id: EntityId, json: bool) -> Result<()> {
    let service = open_service(cwd)?;
    let states = service.initial_states(id)?;
    if json {
        return print_json(&states);
    }
    if states.is_empty() {
        println!("Workflow {} has no initial state", id);
    }
    print_states(&states);
    Ok(())
}

/// States reachable from `from`, or the outgoing transitions with `events`
pub async fn next(
    cwd: Option<&Path>,
    id: EntityId,
    from: EntityId,
    include_self: bool,
    events: bool,
    json: bool,
) -> Result<()> {
    let service = open_service(cwd)?;

    if events {
        let moves = service.available_moves(id, from)?;
        if json {
            return print_json(&moves);
        }
        if moves.is_empty() {
            println!("No further transitions available");
        }
        for m in &moves {
            println!(
                "  {:>5}  {} -> {}",
                m.transition_id.unwrap_or_default(),
                m.event_name,
                m.target.state_name
            );
        }
        return Ok(());
    }

    let include_self = include_self || service.config().include_self_default;
    let states = service.valid_target_states(id, from, include_self)?;
    if json {
        return print_json(&states);
    }
    if states.is_empty() {
        println!("No further transitions available");
    }
    print_states(&states);
    Ok(())
}

fn print_states(states: &[WorkflowState]) {
    for state in states {
        println!("  {:>5}  {}", state.id.unwrap_or_default(), state.state_name);
    }
}
