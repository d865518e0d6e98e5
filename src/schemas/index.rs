//! Index schema - id sequence and team links for the workflow store

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::EntityId;

/// Store-wide bookkeeping persisted next to the workflow files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreIndex {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// Last id handed out; ids are shared by workflows, states and transitions
    pub last_id: EntityId,

    /// Team id -> workflows linked to that team
    #[serde(default)]
    pub team_links: BTreeMap<EntityId, BTreeSet<EntityId>>,

    /// ISO 8601 timestamp of the last write
    pub generated_at: String,
}

impl StoreIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        StoreIndex {
            schema_version: 1,
            last_id: 0,
            team_links: BTreeMap::new(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Reserve `count` consecutive positive ids and return the first
    pub fn reserve_ids(&mut self, count: usize) -> EntityId {
        let first = self.last_id + 1;
        self.last_id += count as EntityId;
        first
    }

    pub fn is_linked(&self, team_id: EntityId, workflow_id: EntityId) -> bool {
        self.team_links
            .get(&team_id)
            .is_some_and(|ids| ids.contains(&workflow_id))
    }

    pub fn link(&mut self, team_id: EntityId, workflow_id: EntityId) {
        self.team_links.entry(team_id).or_default().insert(workflow_id);
    }

    /// Remove one team link. Returns false if the link did not exist.
    pub fn unlink(&mut self, team_id: EntityId, workflow_id: EntityId) -> bool {
        let Some(ids) = self.team_links.get_mut(&team_id) else {
            return false;
        };
        let removed = ids.remove(&workflow_id);
        if ids.is_empty() {
            self.team_links.remove(&team_id);
        }
        removed
    }

    /// Drop every link to a workflow (used on delete)
    pub fn unlink_everywhere(&mut self, workflow_id: EntityId) {
        for ids in self.team_links.values_mut() {
            ids.remove(&workflow_id);
        }
        self.team_links.retain(|_, ids| !ids.is_empty());
    }

    /// Workflows linked to a team
    pub fn linked_to(&self, team_id: EntityId) -> BTreeSet<EntityId> {
        self.team_links.get(&team_id).cloned().unwrap_or_default()
    }

    pub fn touch(&mut self) {
        self.generated_at = chrono::Utc::now().to_rfc3339();
    }
}

impl Default for StoreIndex {
    fn default() -> Self {
        Self::new()
    }
}
