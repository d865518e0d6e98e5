//! Ticketflow - workflow definitions and transition validation for ticket lifecycles
//!
//! This library provides:
//! - Schema definitions for workflows, states, transitions, config and ticket positions
//! - Domain logic: graph authoring, structural validation, transition queries,
//!   SLA escalation and workflow derivation (reference or clone)
//! - A repository seam with JSON-file and in-memory stores
//! - [`service::WorkflowService`], the operations a host exposes
//! - The `ticketflow` command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fs;
pub mod schemas;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use errors::{Result, TicketflowError};
pub use schemas::{Config, Workflow, WorkflowDetail, WorkflowState, WorkflowTransition};
pub use service::WorkflowService;
