//! Workflow repository backed by JSON files
//!
//! Every call goes to disk, so reads always observe the latest writes of
//! other processes (last write wins).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::{Result, TicketflowError};
use crate::fs;
use crate::schemas::{EntityId, StoreIndex, Workflow, WorkflowDetail};

use super::WorkflowRepository;

/// Repository storing one file per workflow under `.ticketflow/workflows/`
#[derive(Debug, Clone)]
pub struct JsonWorkflowRepository {
    root: PathBuf,
}

impl JsonWorkflowRepository {
    /// Open the store rooted at `root` (the directory containing `.ticketflow`)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonWorkflowRepository { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn update_index<T>(&self, f: impl FnOnce(&mut StoreIndex) -> T) -> Result<T> {
        let mut index = fs::read_index(&self.root)?;
        let out = f(&mut index);
        index.touch();
        fs::write_index(&self.root, &index)?;
        Ok(out)
    }
}

impl WorkflowRepository for JsonWorkflowRepository {
    fn load(&self, id: EntityId) -> Result<WorkflowDetail> {
        fs::read_workflow(&self.root, id)
    }

    fn save(&mut self, detail: &WorkflowDetail) -> Result<()> {
        let id = detail.id().ok_or_else(|| {
            TicketflowError::InvalidReference("cannot store a workflow without an id".to_string())
        })?;
        tracing::debug!(workflow_id = id, "writing workflow file");
        fs::write_workflow(&self.root, id, detail)
    }

    fn remove(&mut self, id: EntityId) -> Result<bool> {
        fs::remove_workflow(&self.root, id)
    }

    fn list(&self) -> Result<Vec<Workflow>> {
        fs::list_workflow_ids(&self.root)?
            .into_iter()
            .map(|id| self.load(id).map(|detail| detail.workflow))
            .collect()
    }

    fn reserve_ids(&mut self, count: usize) -> Result<EntityId> {
        self.update_index(|index| index.reserve_ids(count))
    }

    fn team_links(&self, team_id: EntityId) -> Result<BTreeSet<EntityId>> {
        Ok(fs::read_index(&self.root)?.linked_to(team_id))
    }

    fn link(&mut self, team_id: EntityId, workflow_id: EntityId) -> Result<()> {
        self.update_index(|index| index.link(team_id, workflow_id))
    }

    fn unlink(&mut self, team_id: EntityId, workflow_id: EntityId) -> Result<bool> {
        self.update_index(|index| index.unlink(team_id, workflow_id))
    }

    fn unlink_everywhere(&mut self, workflow_id: EntityId) -> Result<()> {
        self.update_index(|index| index.unlink_everywhere(workflow_id))
    }
}
