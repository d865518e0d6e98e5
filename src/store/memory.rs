//! In-memory workflow repository

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, TicketflowError};
use crate::schemas::{EntityId, StoreIndex, Workflow, WorkflowDetail};

use super::WorkflowRepository;

/// Repository keeping everything in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: BTreeMap<EntityId, WorkflowDetail>,
    index: StoreIndex,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowRepository for InMemoryWorkflowRepository {
    fn load(&self, id: EntityId) -> Result<WorkflowDetail> {
        self.workflows
            .get(&id)
            .cloned()
            .ok_or(TicketflowError::NotFound(id))
    }

    fn save(&mut self, detail: &WorkflowDetail) -> Result<()> {
        let id = detail.id().ok_or_else(|| {
            TicketflowError::InvalidReference("cannot store a workflow without an id".to_string())
        })?;
        self.workflows.insert(id, detail.clone());
        Ok(())
    }

    fn remove(&mut self, id: EntityId) -> Result<bool> {
        Ok(self.workflows.remove(&id).is_some())
    }

    fn list(&self) -> Result<Vec<Workflow>> {
        Ok(self.workflows.values().map(|d| d.workflow.clone()).collect())
    }

    fn reserve_ids(&mut self, count: usize) -> Result<EntityId> {
        Ok(self.index.reserve_ids(count))
    }

    fn team_links(&self, team_id: EntityId) -> Result<BTreeSet<EntityId>> {
        Ok(self.index.linked_to(team_id))
    }

    fn link(&mut self, team_id: EntityId, workflow_id: EntityId) -> Result<()> {
        self.index.link(team_id, workflow_id);
        Ok(())
    }

    fn unlink(&mut self, team_id: EntityId, workflow_id: EntityId) -> Result<bool> {
        Ok(self.index.unlink(team_id, workflow_id))
    }

    fn unlink_everywhere(&mut self, workflow_id: EntityId) -> Result<()> {
        self.index.unlink_everywhere(workflow_id);
        Ok(())
    }
}
