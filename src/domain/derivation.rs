//! Deriving new workflows from existing ones
//!
//! Two explicit strategies:
//! - `Reference`: a new record that shares the source's graph
//! - `Clone`: a structurally independent copy with fresh identities

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TicketflowError};
use crate::schemas::{EntityId, Visibility, Workflow, WorkflowDetail};

/// How a derived workflow relates to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationStrategy {
    Reference,
    Clone,
}

impl std::fmt::Display for DerivationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivationStrategy::Reference => write!(f, "reference"),
            DerivationStrategy::Clone => write!(f, "clone"),
        }
    }
}

/// Record fields supplied for the derived workflow; unset fields are copied
/// from the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOverrides {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub request_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub owner_id: Option<EntityId>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub level1_escalation_timeout: Option<i64>,
    #[serde(default)]
    pub level2_escalation_timeout: Option<i64>,
    #[serde(default)]
    pub level3_escalation_timeout: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub use_for_project: Option<bool>,
}

impl WorkflowOverrides {
    fn apply(&self, source: &Workflow) -> Workflow {
        let mut workflow = source.clone();
        workflow.id = None;
        workflow.graph_source_id = None;
        if let Some(name) = &self.name {
            workflow.name = name.clone();
        }
        if let Some(request_name) = &self.request_name {
            workflow.request_name = request_name.clone();
        }
        if let Some(description) = &self.description {
            workflow.description = description.clone();
        }
        if let Some(visibility) = self.visibility {
            workflow.visibility = visibility;
        }
        if let Some(owner_id) = self.owner_id {
            workflow.owner_id = Some(owner_id);
            workflow.owner_name = self.owner_name.clone();
        }
        for (timeout, value) in [
            (&mut workflow.level1_escalation_timeout, self.level1_escalation_timeout),
            (&mut workflow.level2_escalation_timeout, self.level2_escalation_timeout),
            (&mut workflow.level3_escalation_timeout, self.level3_escalation_timeout),
        ] {
            if value.is_some() {
                *timeout = value;
            }
        }
        if let Some(tags) = &self.tags {
            workflow.tags = tags.clone();
        }
        if let Some(use_for_project) = self.use_for_project {
            workflow.use_for_project = use_for_project;
        }
        workflow
    }
}

/// Old state id -> new state id
pub type RemapTable = BTreeMap<EntityId, EntityId>;

/// Give every state and transition of `detail` a new identity.
///
/// `next_id` is called with each current id and returns the new one. The
/// state remap table is completed before any transition is rewritten; an
/// endpoint missing from it fails with `IncompleteRemap` and nothing is
/// returned.
pub fn remap_identities<F>(
    detail: &WorkflowDetail,
    workflow_id: Option<EntityId>,
    mut next_id: F,
) -> Result<(WorkflowDetail, RemapTable)>
where
    F: FnMut(Option<EntityId>) -> EntityId,
{
    let mut table = RemapTable::new();
    let mut states = Vec::with_capacity(detail.states.len());
    for state in &detail.states {
        let new_id = next_id(state.id);
        if let Some(old_id) = state.id {
            if table.insert(old_id, new_id).is_some() {
                return Err(TicketflowError::InvalidReference(format!(
                    "state id {} appears more than once",
                    old_id
                )));
            }
        }
        let mut state = state.clone();
        state.id = Some(new_id);
        state.workflow_id = workflow_id;
        states.push(state);
    }

    let remap = |endpoint: Option<EntityId>, index: usize| -> Result<Option<EntityId>> {
        match endpoint {
            None => Ok(None),
            Some(old) => table.get(&old).copied().map(Some).ok_or_else(|| {
                TicketflowError::IncompleteRemap(format!(
                    "transition {} references state {} which has no new identity",
                    index, old
                ))
            }),
        }
    };

    let mut transitions = Vec::with_capacity(detail.transitions.len());
    for (i, transition) in detail.transitions.iter().enumerate() {
        let mut transition = transition.clone();
        transition.source_state_id = remap(transition.source_state_id, i)?;
        transition.target_state_id = remap(transition.target_state_id, i)?;
        transition.id = Some(next_id(transition.id));
        transition.workflow_id = workflow_id;
        transitions.push(transition);
    }

    let mut workflow = detail.workflow.clone();
    workflow.id = workflow_id;
    Ok((
        WorkflowDetail {
            workflow,
            states,
            transitions,
        },
        table,
    ))
}

/// A new record pointing at the source's graph.
///
/// The returned detail carries the source's states and transitions for
/// display; they are not owned by the new record.
pub fn derive_reference(
    source: &WorkflowDetail,
    overrides: &WorkflowOverrides,
) -> Result<WorkflowDetail> {
    let source_id = graph_owner_id(source)?;
    let mut workflow = overrides.apply(&source.workflow);
    workflow.graph_source_id = Some(source_id);

    Ok(WorkflowDetail {
        workflow,
        states: source.states.clone(),
        transitions: source.transitions.clone(),
    })
}

/// A full structural copy with new identities from `allocate`
pub fn derive_clone<A>(
    source: &WorkflowDetail,
    overrides: &WorkflowOverrides,
    workflow_id: EntityId,
    mut allocate: A,
) -> Result<WorkflowDetail>
where
    A: FnMut() -> EntityId,
{
    let (mut detail, _) = remap_identities(source, Some(workflow_id), |_| allocate())?;
    let mut workflow = overrides.apply(&source.workflow);
    workflow.id = Some(workflow_id);
    detail.workflow = workflow;
    Ok(detail)
}

/// Id of the workflow that owns `detail`'s graph: the source of a reference,
/// or the workflow itself.
pub fn graph_owner_id(detail: &WorkflowDetail) -> Result<EntityId> {
    detail
        .workflow
        .graph_source_id
        .or(detail.workflow.id)
        .ok_or_else(|| {
            TicketflowError::InvalidReference("cannot derive from an unsaved workflow".to_string())
        })
}

/// The workflow's own id and the id of the graph it shares, if any
fn graph_ids(workflow: &Workflow) -> impl Iterator<Item = EntityId> {
    workflow.id.into_iter().chain(workflow.graph_source_id)
}

/// Workflow ids a team already has: linked workflows and the graphs they reference
pub fn linked_sources(team_workflows: &[Workflow]) -> BTreeSet<EntityId> {
    team_workflows.iter().flat_map(graph_ids).collect()
}

/// Refuse to derive from a workflow the team already has linked, either
/// directly or through the graph it shares
pub fn ensure_not_linked(
    team_workflows: &[Workflow],
    source: &Workflow,
    team_id: EntityId,
) -> Result<()> {
    let linked = linked_sources(team_workflows);
    if graph_ids(source).any(|id| linked.contains(&id)) {
        return Err(TicketflowError::AlreadyLinked {
            workflow_id: source.id.or(source.graph_source_id).unwrap_or_default(),
            team_id,
        });
    }
    Ok(())
}

/// Workflows a team may derive from: visible to the team and sharing no
/// graph with anything already linked
pub fn derivation_candidates<'a>(
    all: &'a [Workflow],
    team_workflows: &[Workflow],
    team_id: EntityId,
) -> Vec<&'a Workflow> {
    let linked = linked_sources(team_workflows);
    all.iter()
        .filter(|w| w.id.is_some() && w.is_visible_to(Some(team_id)))
        .filter(|w| !graph_ids(w).any(|id| linked.contains(&id)))
        .collect()
}
