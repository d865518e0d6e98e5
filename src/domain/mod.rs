//! Domain logic for workflow graphs: authoring, validation, transition
//! queries, SLA escalation and derivation

mod derivation;
mod graph;
mod sla;
mod transitions;
mod validation;

// Property-based tests (compiled only in test builds)
#[cfg(test)]
mod property_tests;

pub use derivation::{
    derivation_candidates, derive_clone, derive_reference, ensure_not_linked, graph_owner_id,
    linked_sources, remap_identities, DerivationStrategy, RemapTable, WorkflowOverrides,
};
pub use graph::{CommandOutcome, GraphCommand, GraphStore};
pub use sla::{
    evaluate, record, sla_due_at, start_timer, EscalationLevel, EscalationPolicy,
    EscalationTracker, SlaStatus,
};
pub use transitions::{
    apply_ticket_transition, available_moves, check_move, initial_states, valid_target_states,
    Move, MoveOption, TicketMove,
};
pub use validation::{validate, ValidationResult, Violation};
