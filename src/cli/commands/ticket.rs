//! Move and sla commands - Ticket moves and SLA evaluation

use chrono::{DateTime, Duration, Utc};

use crate::errors::{Result, TicketflowError};
use crate::schemas::{EntityId, TicketPosition};
use std::path::Path;

use super::{open_service, print_json};

/// Check a move from `from` to `to` against the stored graph
pub async fn move_ticket(
    cwd: Option<&Path>,
    workflow: EntityId,
    from: EntityId,
    to: EntityId,
    at: Option<DateTime<Utc>>,
    allow_stay: bool,
) -> Result<()> {
    let service = open_service(cwd)?;
    let at = at.unwrap_or_else(Utc::now);
    let position = TicketPosition::new(workflow, from, at);

    let moved = service.move_ticket(&position, to, at, allow_stay)?;
    let Some(transition) = &moved.transition else {
        println!("Ticket stays in state {}", from);
        return Ok(());
    };

    println!(
        "Moved ticket from state {} to {} ({})",
        from, moved.position.current_state_id, transition.event_name
    );
    if let Some(timer) = &moved.position.sla {
        if let Some(due_at) = timer.due_at {
            println!(
                "  SLA due at {}{}",
                due_at.to_rfc3339(),
                if timer.escalate_on_violation {
                    " (escalates on violation)"
                } else {
                    ""
                }
            );
        }
    }
    Ok(())
}

/// Evaluate the SLA of `transition` taken at `taken_at`
pub async fn sla(
    cwd: Option<&Path>,
    workflow: EntityId,
    transition: EntityId,
    taken_at: DateTime<Utc>,
    now: Option<DateTime<Utc>>,
    after: Option<Duration>,
    json: bool,
) -> Result<()> {
    let service = open_service(cwd)?;
    let now = match (now, after) {
        (Some(now), _) => now,
        (None, Some(after)) => taken_at.checked_add_signed(after).ok_or_else(|| {
            TicketflowError::wrap("time out of range", format!("--after {}", after))
        })?,
        (None, None) => Utc::now(),
    };

    let Some(mut timer) = service.start_sla(workflow, transition, taken_at)? else {
        println!("Transition {} has no SLA", transition);
        return Ok(());
    };
    let status = service.sla_status(workflow, &mut timer, now)?;

    if json {
        return print_json(&status);
    }
    if let Some(due_at) = status.due_at {
        println!("Due at:    {}", due_at.to_rfc3339());
    }
    println!("Violated:  {}", status.violated);
    if status.violated {
        println!("Overdue:   {} min", status.overdue_by.num_minutes());
    }
    println!("Escalates: {}", status.escalation_eligible);
    println!("Level:     {}", status.level);
    Ok(())
}
