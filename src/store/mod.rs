//! Workflow persistence
//!
//! The workflow core talks to storage through [`WorkflowRepository`]. Two
//! implementations are provided: JSON files under `.ticketflow/` and an
//! in-memory map for tests and embedding.

mod json;
mod memory;

use std::collections::BTreeSet;

use crate::errors::Result;
use crate::schemas::{EntityId, Workflow, WorkflowDetail};

pub use json::JsonWorkflowRepository;
pub use memory::InMemoryWorkflowRepository;

/// Storage interface for workflow details and team links
pub trait WorkflowRepository {
    /// Load the stored detail. Reference workflows are stored without a graph.
    fn load(&self, id: EntityId) -> Result<WorkflowDetail>;

    /// Insert or replace a detail; its workflow id must be set
    fn save(&mut self, detail: &WorkflowDetail) -> Result<()>;

    /// Remove a detail. Returns false if it did not exist.
    fn remove(&mut self, id: EntityId) -> Result<bool>;

    /// Every stored workflow record, ordered by id
    fn list(&self) -> Result<Vec<Workflow>>;

    /// Reserve `count` consecutive fresh ids and return the first one
    fn reserve_ids(&mut self, count: usize) -> Result<EntityId>;

    /// Workflows linked to a team
    fn team_links(&self, team_id: EntityId) -> Result<BTreeSet<EntityId>>;

    fn link(&mut self, team_id: EntityId, workflow_id: EntityId) -> Result<()>;

    /// Returns false if the link did not exist
    fn unlink(&mut self, team_id: EntityId, workflow_id: EntityId) -> Result<bool>;

    /// Drop every team link to a workflow
    fn unlink_everywhere(&mut self, workflow_id: EntityId) -> Result<()>;
}

/// Hand out ids from a block reserved with [`WorkflowRepository::reserve_ids`]
pub(crate) fn id_block(first: EntityId) -> impl FnMut() -> EntityId {
    let mut next = first;
    move || {
        let id = next;
        next += 1;
        id
    }
}
