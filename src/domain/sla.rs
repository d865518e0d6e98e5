//! SLA timers and escalation levels
//!
//! A transition may carry an SLA duration. When a ticket takes that
//! transition a timer starts; if the ticket is still in the resulting state
//! after the due time the SLA is violated. Escalation severity then grows
//! with the time elapsed since the breach: each of the workflow's three
//! escalation timeouts is measured from the breach itself.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::validation::Violation;
use crate::errors::{Result, TicketflowError};
use crate::schemas::{SlaTimer, TimeUnit, Workflow, WorkflowTransition};

pub use crate::schemas::{EscalationLevel, EscalationTracker};

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationLevel::None => write!(f, "none"),
            EscalationLevel::Level1 => write!(f, "level 1"),
            EscalationLevel::Level2 => write!(f, "level 2"),
            EscalationLevel::Level3 => write!(f, "level 3"),
        }
    }
}

fn out_of_range(field: &str, amount: i64, unit: TimeUnit) -> TicketflowError {
    TicketflowError::Validation(vec![Violation::new(
        field,
        format!("{} {} is out of range", amount, unit),
    )])
}

fn to_duration(field: &str, amount: i64, unit: TimeUnit) -> Result<Duration> {
    unit.to_duration(amount).ok_or_else(|| out_of_range(field, amount, unit))
}

/// `taken_at + slaDuration`, or None when the transition has no SLA
///
/// # Errors
/// * `Validation` - If the due time cannot be represented
pub fn sla_due_at(
    taken_at: DateTime<Utc>,
    transition: &WorkflowTransition,
    unit: TimeUnit,
) -> Result<Option<DateTime<Utc>>> {
    let Some(amount) = transition.sla_duration else {
        return Ok(None);
    };
    let duration = to_duration("slaDuration", amount, unit)?;
    taken_at
        .checked_add_signed(duration)
        .map(Some)
        .ok_or_else(|| out_of_range("slaDuration", amount, unit))
}

/// Start the SLA clock for a transition taken at `taken_at`.
///
/// Returns None when the transition carries no SLA. Each timer starts with
/// a fresh escalation tracker.
pub fn start_timer(
    transition: &WorkflowTransition,
    taken_at: DateTime<Utc>,
    unit: TimeUnit,
) -> Result<Option<SlaTimer>> {
    let Some(due_at) = sla_due_at(taken_at, transition, unit)? else {
        return Ok(None);
    };
    Ok(Some(SlaTimer {
        transition_id: transition.id,
        started_at: taken_at,
        due_at: Some(due_at),
        escalate_on_violation: transition.escalate_on_violation,
        left_at: None,
        escalation: EscalationTracker::new(),
    }))
}

impl SlaTimer {
    /// Stop the clock because the ticket transitioned away
    pub fn close(&mut self, at: DateTime<Utc>) {
        if self.left_at.is_none() {
            self.left_at = Some(at);
        }
    }

    pub fn is_open(&self) -> bool {
        self.left_at.is_none()
    }

    /// The instant the clock is read at: `now`, or when the ticket left
    fn effective_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.left_at {
            Some(left) if left < now => left,
            _ => now,
        }
    }

    /// Whether the SLA was exceeded, as of `now`
    pub fn is_violated(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) => self.effective_time(now) > due,
            None => false,
        }
    }
}

/// The workflow's escalation timeouts as durations.
///
/// Every timeout counts from the SLA breach. A level without a timeout is
/// never reached, but does not block the levels after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscalationPolicy {
    pub level1: Option<Duration>,
    pub level2: Option<Duration>,
    pub level3: Option<Duration>,
}

impl EscalationPolicy {
    /// # Errors
    /// * `Validation` - If a timeout does not fit in a `Duration`
    pub fn from_workflow(workflow: &Workflow, unit: TimeUnit) -> Result<Self> {
        let level = |field: &str, timeout: Option<i64>| {
            timeout
                .map(|amount| to_duration(field, amount, unit))
                .transpose()
        };
        Ok(EscalationPolicy {
            level1: level("level1EscalationTimeout", workflow.level1_escalation_timeout)?,
            level2: level("level2EscalationTimeout", workflow.level2_escalation_timeout)?,
            level3: level("level3EscalationTimeout", workflow.level3_escalation_timeout)?,
        })
    }

    /// Highest escalation level reached after `elapsed` since the SLA breach
    pub fn level_for(&self, elapsed: Duration) -> EscalationLevel {
        [
            (EscalationLevel::Level1, self.level1),
            (EscalationLevel::Level2, self.level2),
            (EscalationLevel::Level3, self.level3),
        ]
        .into_iter()
        .filter(|(_, timeout)| matches!(timeout, Some(t) if elapsed >= *t))
        .map(|(level, _)| level)
        .max()
        .unwrap_or(EscalationLevel::None)
    }
}

/// SLA state of a ticket at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaStatus {
    pub due_at: Option<DateTime<Utc>>,

    /// The ticket stayed in the state past the due time
    pub violated: bool,

    /// Violated, still in the state, and the transition asks for escalation
    pub escalation_eligible: bool,

    /// How long past due the ticket is (zero when not violated)
    #[serde(skip)]
    pub overdue_by: Duration,

    pub level: EscalationLevel,

    /// Set when this evaluation raised the level, i.e. a notice is due
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_reached: Option<EscalationLevel>,
}

/// Evaluate a timer at `now` against a workflow's escalation policy.
///
/// The level is computed from `now` alone; see [`record`] for the ratcheted
/// level.
pub fn evaluate(timer: &SlaTimer, policy: &EscalationPolicy, now: DateTime<Utc>) -> SlaStatus {
    let violated = timer.is_violated(now);
    let overdue_by = match (violated, timer.due_at) {
        (true, Some(due)) => timer.effective_time(now) - due,
        _ => Duration::zero(),
    };
    let escalation_eligible = violated && timer.is_open() && timer.escalate_on_violation;
    let level = if escalation_eligible {
        policy.level_for(overdue_by)
    } else {
        EscalationLevel::None
    };

    SlaStatus {
        due_at: timer.due_at,
        violated,
        escalation_eligible,
        overdue_by,
        level,
        newly_reached: None,
    }
}

/// Evaluate a timer and ratchet its escalation tracker.
///
/// The returned level is the highest one the timer has ever reached, so an
/// evaluation with an earlier clock or shorter timeouts never lowers it.
pub fn record(timer: &mut SlaTimer, policy: &EscalationPolicy, now: DateTime<Utc>) -> SlaStatus {
    let mut status = evaluate(timer, policy, now);
    status.newly_reached = timer.escalation.observe(status.level);
    status.level = timer.escalation.highest();
    status
}

impl EscalationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highest(&self) -> EscalationLevel {
        self.highest
    }

    /// Record an observed level. Returns the level if it is new (higher than
    /// anything seen before), which is when an escalation notice is due.
    pub fn observe(&mut self, level: EscalationLevel) -> Option<EscalationLevel> {
        if level > self.highest {
            self.highest = level;
            Some(level)
        } else {
            None
        }
    }
}
