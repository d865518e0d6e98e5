//! Schema types for ticketflow
//!
//! Workflow types use the camelCase JSON shape of the workflow REST payloads.

mod config;
mod index;
mod ticket;
mod workflow;

pub use config::{Config, EscalationDefaults, TimeUnit, MAX_TIME_AMOUNT};
pub use index::StoreIndex;
pub use ticket::{EscalationLevel, EscalationTracker, SlaTimer, TicketPosition};
pub use workflow::{
    is_persisted_id, EntityId, Visibility, Workflow, WorkflowDetail, WorkflowState,
    WorkflowTransition,
};
