//! Workflow schema - workflow records, states, transitions and the detail view

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identity of persisted workflows, states and transitions.
///
/// Persisted ids are positive. Ids `<= 0` are draft ids handed out during an
/// authoring session and are replaced when the detail is persisted.
pub type EntityId = i64;

/// Returns true if the id was assigned by the store.
pub fn is_persisted_id(id: Option<EntityId>) -> bool {
    matches!(id, Some(id) if id > 0)
}

/// Who can see a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Visible to every team
    #[default]
    Public,
    /// Visible to the owning team only
    Private,
    /// Shared within the owning team
    Team,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "PUBLIC"),
            Visibility::Private => write!(f, "PRIVATE"),
            Visibility::Team => write!(f, "TEAM"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Visibility::Public),
            "PRIVATE" => Ok(Visibility::Private),
            "TEAM" => Ok(Visibility::Team),
            _ => Err(format!("Unknown visibility: {}", s)),
        }
    }
}

/// A workflow record governing one ticket type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Store-assigned id (null until persisted)
    #[serde(default)]
    pub id: Option<EntityId>,

    /// Human-readable name
    pub name: String,

    /// Label of the ticket type this workflow governs
    pub request_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub visibility: Visibility,

    /// Owning team (null for global workflows)
    #[serde(default)]
    pub owner_id: Option<EntityId>,

    #[serde(default)]
    pub owner_name: Option<String>,

    /// Time after the SLA breach until escalation level 1
    #[serde(default)]
    pub level1_escalation_timeout: Option<i64>,

    /// Time after the SLA breach until escalation level 2
    #[serde(default)]
    pub level2_escalation_timeout: Option<i64>,

    /// Time after the SLA breach until escalation level 3
    #[serde(default)]
    pub level3_escalation_timeout: Option<i64>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub use_for_project: bool,

    /// Workflow whose graph this record shares (reference workflows only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_source_id: Option<EntityId>,
}

impl Workflow {
    /// Create a new, unpersisted, global workflow record
    pub fn new(name: impl Into<String>, request_name: impl Into<String>) -> Self {
        Workflow {
            id: None,
            name: name.into(),
            request_name: request_name.into(),
            description: String::new(),
            visibility: Visibility::Public,
            owner_id: None,
            owner_name: None,
            level1_escalation_timeout: None,
            level2_escalation_timeout: None,
            level3_escalation_timeout: None,
            tags: Vec::new(),
            use_for_project: false,
            graph_source_id: None,
        }
    }

    pub fn with_owner(mut self, owner_id: EntityId, owner_name: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id);
        self.owner_name = Some(owner_name.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_escalation_timeouts(
        mut self,
        level1: Option<i64>,
        level2: Option<i64>,
        level3: Option<i64>,
    ) -> Self {
        self.level1_escalation_timeout = level1;
        self.level2_escalation_timeout = level2;
        self.level3_escalation_timeout = level3;
        self
    }

    /// Global workflows have no owning team
    pub fn is_global(&self) -> bool {
        self.owner_id.is_none()
    }

    /// Whether this record shares another workflow's graph
    pub fn is_reference(&self) -> bool {
        self.graph_source_id.is_some()
    }

    /// Whether a team (or an anonymous caller when `team_id` is None) can see this workflow.
    pub fn is_visible_to(&self, team_id: Option<EntityId>) -> bool {
        if self.is_global() || self.visibility == Visibility::Public {
            return true;
        }
        team_id.is_some() && team_id == self.owner_id
    }
}

/// A named node of a workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    #[serde(default)]
    pub id: Option<EntityId>,

    /// Owning workflow
    #[serde(default)]
    pub workflow_id: Option<EntityId>,

    pub state_name: String,

    #[serde(default)]
    pub is_initial: bool,

    #[serde(default)]
    pub is_final: bool,
}

impl WorkflowState {
    /// Create an unpersisted state that is neither initial nor final
    pub fn new(state_name: impl Into<String>) -> Self {
        WorkflowState {
            id: None,
            workflow_id: None,
            state_name: state_name.into(),
            is_initial: false,
            is_final: false,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn final_state(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// A directed, named edge between two states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTransition {
    #[serde(default)]
    pub id: Option<EntityId>,

    #[serde(default)]
    pub workflow_id: Option<EntityId>,

    /// Null only while authoring
    #[serde(default)]
    pub source_state_id: Option<EntityId>,

    /// Null only while authoring
    #[serde(default)]
    pub target_state_id: Option<EntityId>,

    /// User-facing action label, e.g. "Approve"
    pub event_name: String,

    /// SLA duration in the configured time unit; null means no SLA
    #[serde(default)]
    pub sla_duration: Option<i64>,

    #[serde(default)]
    pub escalate_on_violation: bool,
}

impl WorkflowTransition {
    pub fn new(source: EntityId, target: EntityId, event_name: impl Into<String>) -> Self {
        WorkflowTransition {
            id: None,
            workflow_id: None,
            source_state_id: Some(source),
            target_state_id: Some(target),
            event_name: event_name.into(),
            sla_duration: None,
            escalate_on_violation: false,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_sla(mut self, duration: Option<i64>, escalate_on_violation: bool) -> Self {
        self.sla_duration = duration;
        self.escalate_on_violation = escalate_on_violation;
        self
    }

    /// Whether either endpoint is the given state
    pub fn touches(&self, state_id: EntityId) -> bool {
        self.source_state_id == Some(state_id) || self.target_state_id == Some(state_id)
    }
}

/// A workflow with its full graph: the unit of authoring and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,

    #[serde(default)]
    pub states: Vec<WorkflowState>,

    #[serde(default)]
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowDetail {
    /// Create a detail with an empty graph
    pub fn new(workflow: Workflow) -> Self {
        WorkflowDetail {
            workflow,
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.workflow.id
    }

    /// Find a state by id
    pub fn state(&self, id: EntityId) -> Option<&WorkflowState> {
        self.states.iter().find(|s| s.id == Some(id))
    }

    /// Find a transition by id
    pub fn transition(&self, id: EntityId) -> Option<&WorkflowTransition> {
        self.transitions.iter().find(|t| t.id == Some(id))
    }

    pub fn has_state(&self, id: EntityId) -> bool {
        self.state(id).is_some()
    }

    /// Ids of every state that has one
    pub fn state_ids(&self) -> BTreeSet<EntityId> {
        self.states.iter().filter_map(|s| s.id).collect()
    }

    /// Transitions leaving the given state, in declaration order
    pub fn outgoing(&self, state_id: EntityId) -> impl Iterator<Item = &WorkflowTransition> {
        self.transitions
            .iter()
            .filter(move |t| t.source_state_id == Some(state_id))
    }
}
