//! Structural validation run before a workflow is persisted

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TicketflowError};
use crate::schemas::{WorkflowDetail, MAX_TIME_AMOUNT};

/// A single field-level problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Payload field the problem is attached to, e.g. `transitions[2].eventName`
    pub field: String,

    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a workflow detail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Every violation found, in rule order
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        ValidationResult::default()
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }

    /// Turn a failed result into a `Validation` error
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(TicketflowError::Validation(self.violations))
        }
    }
}

/// Validate a workflow detail, collecting every violation.
///
/// Rules, in order:
/// 1. at most one initial state
/// 2. non-null transition endpoints reference states of this workflow
/// 3. transition event names are non-empty
/// 4. workflow name and request name are non-empty
/// 5. SLA durations and escalation timeouts lie in `0..=MAX_TIME_AMOUNT`
pub fn validate(detail: &WorkflowDetail) -> ValidationResult {
    let mut result = ValidationResult::success();

    let initial = detail.states.iter().filter(|s| s.is_initial).count();
    if initial > 1 {
        result.push(
            "states",
            format!("only one initial state is allowed, found {}", initial),
        );
    }

    let state_ids = detail.state_ids();
    for (i, transition) in detail.transitions.iter().enumerate() {
        if let Some(source) = transition.source_state_id {
            if !state_ids.contains(&source) {
                result.push(
                    format!("transitions[{}].sourceStateId", i),
                    format!("source state {} is not part of this workflow", source),
                );
            }
        }
        if let Some(target) = transition.target_state_id {
            if !state_ids.contains(&target) {
                result.push(
                    format!("transitions[{}].targetStateId", i),
                    format!("target state {} is not part of this workflow", target),
                );
            }
        }
    }

    for (i, transition) in detail.transitions.iter().enumerate() {
        if transition.event_name.trim().is_empty() {
            result.push(
                format!("transitions[{}].eventName", i),
                "event name must not be empty",
            );
        }
    }

    if detail.workflow.name.trim().is_empty() {
        result.push("name", "name must not be empty");
    }
    if detail.workflow.request_name.trim().is_empty() {
        result.push("requestName", "request name must not be empty");
    }

    for (i, transition) in detail.transitions.iter().enumerate() {
        check_time_amount(
            &mut result,
            format!("transitions[{}].slaDuration", i),
            transition.sla_duration,
        );
    }
    let workflow = &detail.workflow;
    for (field, timeout) in [
        ("level1EscalationTimeout", workflow.level1_escalation_timeout),
        ("level2EscalationTimeout", workflow.level2_escalation_timeout),
        ("level3EscalationTimeout", workflow.level3_escalation_timeout),
    ] {
        check_time_amount(&mut result, field.to_string(), timeout);
    }

    result
}

fn check_time_amount(result: &mut ValidationResult, field: String, amount: Option<i64>) {
    match amount {
        Some(v) if v < 0 => result.push(field, format!("must not be negative, got {}", v)),
        Some(v) if v > MAX_TIME_AMOUNT => result.push(
            field,
            format!("must be at most {}, got {}", MAX_TIME_AMOUNT, v),
        ),
        _ => {}
    }
}
