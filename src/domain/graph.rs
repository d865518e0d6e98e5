//! Graph store for workflow authoring sessions
//!
//! Holds a mutable [`WorkflowDetail`] while a workflow is created or edited.
//! Every operation either applies completely or leaves the graph untouched.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TicketflowError};
use crate::schemas::{
    EntityId, Workflow, WorkflowDetail, WorkflowState, WorkflowTransition, MAX_TIME_AMOUNT,
};

use super::validation::Violation;

/// A structural edit to a workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphCommand {
    AddState {
        name: String,
        #[serde(default)]
        is_initial: bool,
        #[serde(default)]
        is_final: bool,
    },
    RenameState {
        state_id: EntityId,
        name: String,
    },
    SetInitial {
        state_id: EntityId,
    },
    ClearInitial {
        state_id: EntityId,
    },
    SetFinal {
        state_id: EntityId,
        is_final: bool,
    },
    RemoveState {
        state_id: EntityId,
    },
    AddTransition {
        source_id: EntityId,
        target_id: EntityId,
        event_name: String,
    },
    RemoveTransition {
        transition_id: EntityId,
    },
    SetEventName {
        transition_id: EntityId,
        event_name: String,
    },
    SetSla {
        transition_id: EntityId,
        sla_duration: Option<i64>,
        #[serde(default)]
        escalate_on_violation: bool,
    },
}

/// What a successfully applied command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A state or transition was added with this draft id
    Created(EntityId),
    Updated,
    /// Something was removed, along with this many cascaded transitions
    Removed { cascaded_transitions: usize },
}

/// In-memory workflow graph being authored
#[derive(Debug, Clone)]
pub struct GraphStore {
    detail: WorkflowDetail,
    next_draft_id: EntityId,
}

impl GraphStore {
    /// Start authoring a workflow from scratch
    pub fn new(workflow: Workflow) -> Self {
        GraphStore {
            detail: WorkflowDetail::new(workflow),
            next_draft_id: -1,
        }
    }

    /// Start editing an existing detail.
    ///
    /// States and transitions without ids receive draft ids so they can be
    /// addressed by later commands.
    pub fn from_detail(detail: WorkflowDetail) -> Self {
        let lowest = detail
            .states
            .iter()
            .filter_map(|s| s.id)
            .chain(detail.transitions.iter().filter_map(|t| t.id))
            .min()
            .unwrap_or(0);

        let mut store = GraphStore {
            detail,
            next_draft_id: lowest.min(0) - 1,
        };

        for i in 0..store.detail.states.len() {
            if store.detail.states[i].id.is_none() {
                let id = store.allocate_draft_id();
                store.detail.states[i].id = Some(id);
            }
        }
        for i in 0..store.detail.transitions.len() {
            if store.detail.transitions[i].id.is_none() {
                let id = store.allocate_draft_id();
                store.detail.transitions[i].id = Some(id);
            }
        }
        store
    }

    pub fn detail(&self) -> &WorkflowDetail {
        &self.detail
    }

    pub fn into_detail(self) -> WorkflowDetail {
        self.detail
    }

    /// Workflow record fields (name, visibility, escalation timeouts, ...)
    pub fn workflow_mut(&mut self) -> &mut Workflow {
        &mut self.detail.workflow
    }

    fn allocate_draft_id(&mut self) -> EntityId {
        let id = self.next_draft_id;
        self.next_draft_id -= 1;
        id
    }

    fn state_index(&self, state_id: EntityId) -> Result<usize> {
        self.detail
            .states
            .iter()
            .position(|s| s.id == Some(state_id))
            .ok_or_else(|| {
                TicketflowError::InvalidReference(format!(
                    "state {} does not belong to this workflow",
                    state_id
                ))
            })
    }

    fn transition_index(&self, transition_id: EntityId) -> Result<usize> {
        self.detail
            .transitions
            .iter()
            .position(|t| t.id == Some(transition_id))
            .ok_or_else(|| {
                TicketflowError::InvalidReference(format!(
                    "transition {} does not belong to this workflow",
                    transition_id
                ))
            })
    }

    /// Add a state and return its draft id.
    ///
    /// An initial state takes the initial flag away from every other state.
    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        is_initial: bool,
        is_final: bool,
    ) -> EntityId {
        let id = self.allocate_draft_id();
        if is_initial {
            for state in &mut self.detail.states {
                state.is_initial = false;
            }
        }
        self.detail.states.push(WorkflowState {
            id: Some(id),
            workflow_id: self.detail.workflow.id,
            state_name: name.into(),
            is_initial,
            is_final,
        });
        id
    }

    pub fn rename_state(&mut self, state_id: EntityId, name: impl Into<String>) -> Result<()> {
        let idx = self.state_index(state_id)?;
        self.detail.states[idx].state_name = name.into();
        Ok(())
    }

    /// Make `state_id` the only initial state of the workflow.
    pub fn set_initial(&mut self, state_id: EntityId) -> Result<()> {
        self.state_index(state_id)?;
        for state in &mut self.detail.states {
            state.is_initial = state.id == Some(state_id);
        }
        Ok(())
    }

    pub fn clear_initial(&mut self, state_id: EntityId) -> Result<()> {
        let idx = self.state_index(state_id)?;
        self.detail.states[idx].is_initial = false;
        Ok(())
    }

    pub fn set_final(&mut self, state_id: EntityId, is_final: bool) -> Result<()> {
        let idx = self.state_index(state_id)?;
        self.detail.states[idx].is_final = is_final;
        Ok(())
    }

    /// Remove a state and every transition entering or leaving it.
    ///
    /// Returns the removed state and the number of cascaded transitions.
    pub fn remove_state(&mut self, state_id: EntityId) -> Result<(WorkflowState, usize)> {
        let idx = self.state_index(state_id)?;
        let removed = self.detail.states.remove(idx);

        let before = self.detail.transitions.len();
        self.detail.transitions.retain(|t| !t.touches(state_id));
        Ok((removed, before - self.detail.transitions.len()))
    }

    /// Add a transition between two states of this workflow and return its draft id.
    pub fn add_transition(
        &mut self,
        source_id: EntityId,
        target_id: EntityId,
        event_name: impl Into<String>,
    ) -> Result<EntityId> {
        let event_name = event_name.into();
        self.state_index(source_id)?;
        self.state_index(target_id)?;
        if event_name.trim().is_empty() {
            return Err(TicketflowError::InvalidReference(
                "transition event name must not be empty".to_string(),
            ));
        }

        let id = self.allocate_draft_id();
        let mut transition = WorkflowTransition::new(source_id, target_id, event_name).with_id(id);
        transition.workflow_id = self.detail.workflow.id;
        self.detail.transitions.push(transition);
        Ok(id)
    }

    pub fn remove_transition(&mut self, transition_id: EntityId) -> Result<WorkflowTransition> {
        let idx = self.transition_index(transition_id)?;
        Ok(self.detail.transitions.remove(idx))
    }

    pub fn set_event_name(
        &mut self,
        transition_id: EntityId,
        event_name: impl Into<String>,
    ) -> Result<()> {
        let event_name = event_name.into();
        let idx = self.transition_index(transition_id)?;
        if event_name.trim().is_empty() {
            return Err(TicketflowError::InvalidReference(
                "transition event name must not be empty".to_string(),
            ));
        }
        self.detail.transitions[idx].event_name = event_name;
        Ok(())
    }

    /// Attach, change or clear (`None`) the SLA of a transition
    pub fn set_sla(
        &mut self,
        transition_id: EntityId,
        sla_duration: Option<i64>,
        escalate_on_violation: bool,
    ) -> Result<()> {
        let idx = self.transition_index(transition_id)?;
        if matches!(sla_duration, Some(d) if !(0..=MAX_TIME_AMOUNT).contains(&d)) {
            return Err(TicketflowError::Validation(vec![Violation::new(
                format!("transitions[{}].slaDuration", idx),
                format!("SLA duration must be between 0 and {}", MAX_TIME_AMOUNT),
            )]));
        }
        let transition = &mut self.detail.transitions[idx];
        transition.sla_duration = sla_duration;
        transition.escalate_on_violation = escalate_on_violation;
        Ok(())
    }

    /// Apply a single command
    pub fn apply(&mut self, command: GraphCommand) -> Result<CommandOutcome> {
        match command {
            GraphCommand::AddState {
                name,
                is_initial,
                is_final,
            } => Ok(CommandOutcome::Created(self.add_state(name, is_initial, is_final))),
            GraphCommand::RenameState { state_id, name } => {
                self.rename_state(state_id, name).map(|_| CommandOutcome::Updated)
            }
            GraphCommand::SetInitial { state_id } => {
                self.set_initial(state_id).map(|_| CommandOutcome::Updated)
            }
            GraphCommand::ClearInitial { state_id } => {
                self.clear_initial(state_id).map(|_| CommandOutcome::Updated)
            }
            GraphCommand::SetFinal { state_id, is_final } => {
                self.set_final(state_id, is_final).map(|_| CommandOutcome::Updated)
            }
            GraphCommand::RemoveState { state_id } => {
                let (_, cascaded) = self.remove_state(state_id)?;
                Ok(CommandOutcome::Removed {
                    cascaded_transitions: cascaded,
                })
            }
            GraphCommand::AddTransition {
                source_id,
                target_id,
                event_name,
            } => self
                .add_transition(source_id, target_id, event_name)
                .map(CommandOutcome::Created),
            GraphCommand::RemoveTransition { transition_id } => {
                self.remove_transition(transition_id)?;
                Ok(CommandOutcome::Removed {
                    cascaded_transitions: 0,
                })
            }
            GraphCommand::SetEventName {
                transition_id,
                event_name,
            } => self
                .set_event_name(transition_id, event_name)
                .map(|_| CommandOutcome::Updated),
            GraphCommand::SetSla {
                transition_id,
                sla_duration,
                escalate_on_violation,
            } => self
                .set_sla(transition_id, sla_duration, escalate_on_violation)
                .map(|_| CommandOutcome::Updated),
        }
    }

    /// Apply a batch of commands atomically: on the first failure the store
    /// is rolled back to its state before the batch.
    pub fn apply_all(&mut self, commands: Vec<GraphCommand>) -> Result<Vec<CommandOutcome>> {
        let checkpoint = self.clone();
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            match self.apply(command) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    *self = checkpoint;
                    return Err(e);
                }
            }
        }
        Ok(outcomes)
    }
}
