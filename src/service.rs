//! Workflow operations over a repository
//!
//! [`WorkflowService`] is what a host (the CLI, or a REST layer) calls. It
//! composes the pure domain functions with a [`WorkflowRepository`]: every
//! write is validated first, ids are assigned on save, and queries always
//! re-read the stored graph.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::domain::{
    self, derive_clone, derive_reference, ensure_not_linked, record, remap_identities,
    start_timer, CommandOutcome, EscalationPolicy, GraphCommand, GraphStore, MoveOption,
    SlaStatus, TicketMove, ValidationResult, WorkflowOverrides,
};
use crate::errors::{Result, TicketflowError};
use crate::schemas::{
    is_persisted_id, Config, EntityId, SlaTimer, TicketPosition, Workflow, WorkflowDetail,
    WorkflowState,
};
use crate::store::{id_block, WorkflowRepository};

/// Workflow operations backed by a repository
pub struct WorkflowService<R> {
    repo: R,
    config: Config,
}

impl<R: WorkflowRepository> WorkflowService<R> {
    pub fn new(repo: R, config: Config) -> Self {
        WorkflowService { repo, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    // ===== QUERIES =====

    /// Workflow with its full graph.
    ///
    /// A reference workflow is returned with the graph of the workflow it
    /// points at.
    pub fn get_detail(&self, id: EntityId) -> Result<WorkflowDetail> {
        let mut detail = self.repo.load(id)?;
        if let Some(source_id) = detail.workflow.graph_source_id {
            let source = self.repo.load(source_id).map_err(|e| match e {
                TicketflowError::NotFound(_) => TicketflowError::InvalidReference(format!(
                    "workflow {} references missing workflow {}",
                    id, source_id
                )),
                other => other,
            })?;
            detail.states = source.states;
            detail.transitions = source.transitions;
        }
        Ok(detail)
    }

    /// Workflows visible to a team, or every workflow when no team is given
    pub fn list(&self, team_id: Option<EntityId>) -> Result<Vec<Workflow>> {
        let all = self.repo.list()?;
        Ok(match team_id {
            Some(_) => all.into_iter().filter(|w| w.is_visible_to(team_id)).collect(),
            None => all,
        })
    }

    /// Workflows linked to a team
    pub fn team_workflows(&self, team_id: EntityId) -> Result<Vec<Workflow>> {
        self.repo
            .team_links(team_id)?
            .into_iter()
            .map(|id| self.repo.load(id).map(|detail| detail.workflow))
            .collect()
    }

    /// Workflows the team may still reference or clone
    pub fn derivation_candidates(&self, team_id: EntityId) -> Result<Vec<Workflow>> {
        let all = self.repo.list()?;
        let linked = self.team_workflows(team_id)?;
        Ok(domain::derivation_candidates(&all, &linked, team_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn initial_states(&self, id: EntityId) -> Result<Vec<WorkflowState>> {
        Ok(domain::initial_states(&self.get_detail(id)?))
    }

    /// States reachable from `from_state_id` in one transition, read from
    /// the stored graph
    pub fn valid_target_states(
        &self,
        id: EntityId,
        from_state_id: EntityId,
        include_self: bool,
    ) -> Result<Vec<WorkflowState>> {
        let detail = self.get_detail(id)?;
        domain::valid_target_states(&detail, from_state_id, include_self)
    }

    /// Outgoing transitions of a state with their event names
    pub fn available_moves(
        &self,
        id: EntityId,
        from_state_id: EntityId,
    ) -> Result<Vec<MoveOption>> {
        let detail = self.get_detail(id)?;
        domain::available_moves(&detail, from_state_id)
    }

    /// Run the structural validator without saving anything
    pub fn validate(&self, detail: &WorkflowDetail) -> ValidationResult {
        domain::validate(detail)
    }

    // ===== AUTHORING =====

    /// Persist a new workflow.
    ///
    /// Every state and transition receives a fresh id; unset escalation
    /// timeouts take the configured defaults.
    pub fn create_detail(&mut self, mut detail: WorkflowDetail) -> Result<WorkflowDetail> {
        if detail.workflow.graph_source_id.is_some() {
            return Err(TicketflowError::InvalidReference(
                "reference workflows are created by derivation".to_string(),
            ));
        }
        domain::validate(&detail).into_result()?;
        self.fill_escalation_defaults(&mut detail.workflow);

        let count = 1 + detail.states.len() + detail.transitions.len();
        let first = self.repo.reserve_ids(count)?;
        let (saved, _) = remap_identities(&detail, Some(first), {
            let mut next = id_block(first + 1);
            move |_: Option<EntityId>| next()
        })?;

        self.repo.save(&saved)?;
        tracing::info!(
            workflow_id = first,
            states = saved.states.len(),
            transitions = saved.transitions.len(),
            "created workflow"
        );
        Ok(saved)
    }

    /// Replace a stored workflow.
    ///
    /// States and transitions keep their ids when they already belong to the
    /// stored graph; anything else (draft ids, missing ids) gets a fresh one.
    /// Updating a reference workflow writes its graph to the source, so every
    /// workflow sharing the graph sees the change.
    pub fn update_detail(
        &mut self,
        id: EntityId,
        detail: WorkflowDetail,
    ) -> Result<WorkflowDetail> {
        let existing = self.repo.load(id)?;
        domain::validate(&detail).into_result()?;

        let graph_owner = existing.workflow.graph_source_id.unwrap_or(id);
        let stored_graph = if graph_owner == id {
            existing
        } else {
            self.repo.load(graph_owner)?
        };

        let known: BTreeSet<EntityId> = stored_graph
            .states
            .iter()
            .filter_map(|s| s.id)
            .chain(stored_graph.transitions.iter().filter_map(|t| t.id))
            .collect();
        let keeps = |id: Option<EntityId>| {
            is_persisted_id(id) && id.is_some_and(|id| known.contains(&id))
        };
        let fresh = detail
            .states
            .iter()
            .map(|s| s.id)
            .chain(detail.transitions.iter().map(|t| t.id))
            .filter(|id| !keeps(*id))
            .count();
        let first = self.repo.reserve_ids(fresh)?;

        let (mut saved, _) = remap_identities(&detail, Some(graph_owner), {
            let mut next = id_block(first);
            move |current: Option<EntityId>| match current {
                Some(current) if keeps(Some(current)) => current,
                _ => next(),
            }
        })?;

        if graph_owner == id {
            saved.workflow.id = Some(id);
            saved.workflow.graph_source_id = None;
            self.repo.save(&saved)?;
        } else {
            let mut source = stored_graph;
            source.states = saved.states.clone();
            source.transitions = saved.transitions.clone();
            self.repo.save(&source)?;

            saved.workflow.id = Some(id);
            saved.workflow.graph_source_id = Some(graph_owner);
            self.repo.save(&WorkflowDetail::new(saved.workflow.clone()))?;
        }

        tracing::info!(workflow_id = id, graph_owner, new_ids = fresh, "updated workflow");
        Ok(saved)
    }

    /// Apply authoring commands to a stored workflow and save the result.
    ///
    /// Nothing is saved if any command fails.
    pub fn edit(
        &mut self,
        id: EntityId,
        commands: Vec<GraphCommand>,
    ) -> Result<(WorkflowDetail, Vec<CommandOutcome>)> {
        let mut store = GraphStore::from_detail(self.get_detail(id)?);
        let outcomes = store.apply_all(commands)?;
        tracing::debug!(workflow_id = id, commands = outcomes.len(), "applied graph commands");
        let saved = self.update_detail(id, store.into_detail())?;
        Ok((saved, outcomes))
    }

    fn fill_escalation_defaults(&self, workflow: &mut Workflow) {
        let defaults = self.config.default_escalation;
        workflow
            .level1_escalation_timeout
            .get_or_insert(defaults.level1);
        workflow
            .level2_escalation_timeout
            .get_or_insert(defaults.level2);
        workflow
            .level3_escalation_timeout
            .get_or_insert(defaults.level3);
    }

    // ===== DERIVATION =====

    /// Check that `team_id` may derive from `source_id`, returning the
    /// source with its graph
    pub fn check_derivation(
        &self,
        source_id: EntityId,
        team_id: EntityId,
    ) -> Result<WorkflowDetail> {
        let source = self.get_detail(source_id)?;
        if !source.workflow.is_visible_to(Some(team_id)) {
            return Err(TicketflowError::InvalidReference(format!(
                "workflow {} is not visible to team {}",
                source_id, team_id
            )));
        }
        ensure_not_linked(&self.team_workflows(team_id)?, &source.workflow, team_id)?;
        Ok(source)
    }

    /// New workflow for a team sharing the graph of `ref_id`
    pub fn create_from_reference(
        &mut self,
        ref_id: EntityId,
        team_id: EntityId,
        overrides: WorkflowOverrides,
    ) -> Result<WorkflowDetail> {
        let source = self.check_derivation(ref_id, team_id)?;
        let mut detail = derive_reference(&source, &owned_by_team(overrides, team_id))?;

        let id = self.repo.reserve_ids(1)?;
        detail.workflow.id = Some(id);
        self.repo.save(&WorkflowDetail::new(detail.workflow.clone()))?;
        self.repo.link(team_id, id)?;

        tracing::info!(
            workflow_id = id,
            source_id = ref_id,
            graph_source_id = ?detail.workflow.graph_source_id,
            team_id,
            "created reference workflow"
        );
        Ok(detail)
    }

    /// New workflow for a team with an independent copy of the graph of `clone_id`
    pub fn create_from_clone(
        &mut self,
        clone_id: EntityId,
        team_id: EntityId,
        overrides: WorkflowOverrides,
    ) -> Result<WorkflowDetail> {
        let source = self.check_derivation(clone_id, team_id)?;

        let count = 1 + source.states.len() + source.transitions.len();
        let first = self.repo.reserve_ids(count)?;
        let detail = derive_clone(
            &source,
            &owned_by_team(overrides, team_id),
            first,
            id_block(first + 1),
        )?;

        self.repo.save(&detail)?;
        self.repo.link(team_id, first)?;

        tracing::info!(
            workflow_id = first,
            source_id = clone_id,
            team_id,
            states = detail.states.len(),
            "cloned workflow"
        );
        Ok(detail)
    }

    // ===== REMOVAL =====

    /// Check that a workflow exists and no other workflow shares its graph
    pub fn check_delete(&self, id: EntityId) -> Result<()> {
        self.repo.load(id)?;
        let referenced = self
            .repo
            .list()?
            .iter()
            .any(|w| w.graph_source_id == Some(id));
        if referenced {
            return Err(TicketflowError::InUse(id));
        }
        Ok(())
    }

    /// Delete a workflow and every team link to it
    pub fn delete(&mut self, id: EntityId) -> Result<()> {
        self.check_delete(id)?;
        self.repo.remove(id)?;
        self.repo.unlink_everywhere(id)?;
        tracing::info!(workflow_id = id, "deleted workflow");
        Ok(())
    }

    /// Remove a team's link to a workflow. Returns false if it was not linked.
    pub fn unlink(&mut self, id: EntityId, team_id: EntityId) -> Result<bool> {
        let removed = self.repo.unlink(team_id, id)?;
        if removed {
            tracing::info!(workflow_id = id, team_id, "unlinked workflow");
        } else {
            tracing::warn!(workflow_id = id, team_id, "workflow was not linked to team");
        }
        Ok(removed)
    }

    // ===== TICKETS =====

    /// Move a ticket to `target_state_id` at time `at`.
    ///
    /// The workflow is re-read right before the move is checked.
    pub fn move_ticket(
        &self,
        position: &TicketPosition,
        target_state_id: EntityId,
        at: DateTime<Utc>,
        allow_stay: bool,
    ) -> Result<TicketMove> {
        let detail = self.get_detail(position.workflow_id)?;
        let moved = domain::apply_ticket_transition(
            position,
            &detail,
            target_state_id,
            at,
            self.config.time_unit,
            allow_stay,
        )?;
        tracing::debug!(
            workflow_id = position.workflow_id,
            from = position.current_state_id,
            to = target_state_id,
            transition_id = moved.transition.as_ref().and_then(|t| t.id),
            "moved ticket"
        );
        Ok(moved)
    }

    /// SLA timer started by taking `transition_id` at `taken_at`, if the
    /// transition carries an SLA
    pub fn start_sla(
        &self,
        workflow_id: EntityId,
        transition_id: EntityId,
        taken_at: DateTime<Utc>,
    ) -> Result<Option<SlaTimer>> {
        let detail = self.get_detail(workflow_id)?;
        let transition = detail.transition(transition_id).ok_or_else(|| {
            TicketflowError::InvalidReference(format!(
                "transition {} does not belong to workflow {}",
                transition_id, workflow_id
            ))
        })?;
        start_timer(transition, taken_at, self.config.time_unit)
    }

    /// Evaluate a timer against the workflow's escalation timeouts.
    ///
    /// The timer's escalation tracker is ratcheted, so the reported level
    /// never drops below one reached by an earlier evaluation. Callers
    /// persist the updated timer with the ticket.
    pub fn sla_status(
        &self,
        workflow_id: EntityId,
        timer: &mut SlaTimer,
        now: DateTime<Utc>,
    ) -> Result<SlaStatus> {
        let workflow = self.repo.load(workflow_id)?.workflow;
        let policy = EscalationPolicy::from_workflow(&workflow, self.config.time_unit)?;
        let status = record(timer, &policy, now);
        if let Some(level) = status.newly_reached {
            tracing::info!(workflow_id, %level, "SLA escalated");
        }
        Ok(status)
    }
}

/// Derived workflows belong to the requesting team unless told otherwise
fn owned_by_team(mut overrides: WorkflowOverrides, team_id: EntityId) -> WorkflowOverrides {
    if overrides.owner_id.is_none() {
        overrides.owner_id = Some(team_id);
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EscalationLevel;
    use crate::schemas::Visibility;
    use crate::store::InMemoryWorkflowRepository;
    use chrono::{Duration, TimeZone};

    fn service() -> WorkflowService<InMemoryWorkflowRepository> {
        WorkflowService::new(InMemoryWorkflowRepository::new(), Config::default())
    }

    // A(initial) --start--> B --finish--> C(final), authored with draft ids
    fn draft_abc() -> WorkflowDetail {
        let mut store = GraphStore::new(Workflow::new("Global IT", "Incident"));
        let a = store.add_state("A", true, false);
        let b = store.add_state("B", false, false);
        let c = store.add_state("C", false, true);
        let start = store.add_transition(a, b, "start").unwrap();
        store.add_transition(b, c, "finish").unwrap();
        store.set_sla(start, Some(4), true).unwrap();
        store.into_detail()
    }

    fn state_id(detail: &WorkflowDetail, name: &str) -> EntityId {
        detail
            .states
            .iter()
            .find(|s| s.state_name == name)
            .and_then(|s| s.id)
            .unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_create_assigns_positive_ids() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();

        let id = saved.id().unwrap();
        assert!(id > 0);
        assert!(saved.states.iter().all(|s| is_persisted_id(s.id)));
        assert!(saved.transitions.iter().all(|t| is_persisted_id(t.id)));
        assert!(saved.states.iter().all(|s| s.workflow_id == Some(id)));
        assert!(svc.validate(&saved).is_valid());
        assert_eq!(svc.get_detail(id).unwrap(), saved);
    }

    #[test]
    fn test_create_fills_escalation_defaults() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.workflow.level1_escalation_timeout = Some(1);
        let saved = svc.create_detail(detail).unwrap();

        assert_eq!(saved.workflow.level1_escalation_timeout, Some(1));
        assert_eq!(saved.workflow.level2_escalation_timeout, Some(8));
        assert_eq!(saved.workflow.level3_escalation_timeout, Some(24));
    }

    #[test]
    fn test_create_rejects_invalid_detail_with_all_violations() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.states[1].is_initial = true;
        detail.transitions[0].event_name = " ".to_string();

        match svc.create_detail(detail) {
            Err(TicketflowError::Validation(violations)) => assert_eq!(violations.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(svc.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_valid_target_states_reads_stored_graph() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();
        let a = state_id(&saved, "A");

        let names = |states: Vec<WorkflowState>| -> Vec<String> {
            states.into_iter().map(|s| s.state_name).collect()
        };
        assert_eq!(names(svc.valid_target_states(id, a, false).unwrap()), vec!["B"]);
        assert_eq!(names(svc.valid_target_states(id, a, true).unwrap()), vec!["A", "B"]);
        assert_eq!(names(svc.initial_states(id).unwrap()), vec!["A"]);

        let c = state_id(&saved, "C");
        assert!(svc.valid_target_states(id, c, false).unwrap().is_empty());
    }

    #[test]
    fn test_update_keeps_known_ids_and_assigns_new_ones() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();
        let (b, c) = (state_id(&saved, "B"), state_id(&saved, "C"));

        let mut store = GraphStore::from_detail(saved.clone());
        let d = store.add_state("D", false, false);
        store.add_transition(b, d, "park").unwrap();
        store.add_transition(d, c, "resume").unwrap();
        let updated = svc.update_detail(id, store.into_detail()).unwrap();

        assert_eq!(updated.states.len(), 4);
        assert_eq!(state_id(&updated, "B"), b);
        assert!(state_id(&updated, "D") > 0);
        assert_eq!(updated.transitions[0].id, saved.transitions[0].id);
        assert!(updated.transitions.iter().all(|t| is_persisted_id(t.id)));
    }

    #[test]
    fn test_update_rejects_invalid_and_keeps_stored_version() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();

        let mut broken = saved.clone();
        broken.transitions[0].target_state_id = Some(9_999);
        assert!(matches!(
            svc.update_detail(id, broken),
            Err(TicketflowError::Validation(_))
        ));
        assert_eq!(svc.get_detail(id).unwrap(), saved);
    }

    #[test]
    fn test_edit_applies_commands_atomically() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();
        let b = state_id(&saved, "B");

        let (edited, outcomes) = svc
            .edit(id, vec![GraphCommand::RemoveState { state_id: b }])
            .unwrap();
        assert_eq!(outcomes, vec![CommandOutcome::Removed { cascaded_transitions: 2 }]);
        assert_eq!(edited.states.len(), 2);
        assert!(edited.transitions.is_empty());

        let err = svc
            .edit(
                id,
                vec![
                    GraphCommand::AddState {
                        name: "Z".to_string(),
                        is_initial: false,
                        is_final: false,
                    },
                    GraphCommand::RemoveState { state_id: 12_345 },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, TicketflowError::InvalidReference(_)));
        assert_eq!(svc.get_detail(id).unwrap().states.len(), 2);
    }

    #[test]
    fn test_reference_shares_graph_and_sees_source_edits() {
        let mut svc = service();
        let source = svc.create_detail(draft_abc()).unwrap();
        let source_id = source.id().unwrap();

        let overrides = WorkflowOverrides {
            name: Some("Team Incident".to_string()),
            ..Default::default()
        };
        let reference = svc.create_from_reference(source_id, 7, overrides).unwrap();
        let ref_id = reference.id().unwrap();

        assert_eq!(reference.workflow.graph_source_id, Some(source_id));
        assert_eq!(reference.workflow.owner_id, Some(7));
        assert!(svc.repository().load(ref_id).unwrap().states.is_empty());
        assert_eq!(svc.get_detail(ref_id).unwrap().states, source.states);

        let b = state_id(&source, "B");
        svc.edit(
            source_id,
            vec![GraphCommand::RenameState {
                state_id: b,
                name: "In Progress".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(state_id(&svc.get_detail(ref_id).unwrap(), "In Progress"), b);
    }

    #[test]
    fn test_clone_is_independent_and_linked() {
        let mut svc = service();
        let source = svc.create_detail(draft_abc()).unwrap();
        let source_id = source.id().unwrap();

        let clone = svc
            .create_from_clone(source_id, 7, WorkflowOverrides::default())
            .unwrap();
        let clone_id = clone.id().unwrap();

        assert_ne!(clone_id, source_id);
        assert_eq!(clone.states.len(), 3);
        assert_eq!(clone.transitions.len(), 2);
        assert!(clone.states.iter().all(|s| !source.has_state(s.id.unwrap())));
        assert_eq!(svc.team_workflows(7).unwrap().len(), 1);

        let b = state_id(&clone, "B");
        svc.edit(clone_id, vec![GraphCommand::RemoveState { state_id: b }])
            .unwrap();
        assert_eq!(svc.get_detail(source_id).unwrap().states.len(), 3);
    }

    #[test]
    fn test_derivation_refuses_already_linked_source() {
        let mut svc = service();
        let source_id = svc.create_detail(draft_abc()).unwrap().id().unwrap();
        svc.create_from_reference(source_id, 7, WorkflowOverrides::default())
            .unwrap();

        for result in [
            svc.create_from_reference(source_id, 7, WorkflowOverrides::default()),
            svc.create_from_clone(source_id, 7, WorkflowOverrides::default()),
        ] {
            assert!(matches!(
                result,
                Err(TicketflowError::AlreadyLinked { workflow_id, team_id: 7 })
                    if workflow_id == source_id
            ));
        }
        assert!(svc.derivation_candidates(7).unwrap().is_empty());
        // Team 8 sees the source and team 7's public reference
        assert_eq!(svc.derivation_candidates(8).unwrap().len(), 2);
    }

    #[test]
    fn test_derivation_refuses_reference_to_linked_graph() {
        let mut svc = service();
        let source_id = svc.create_detail(draft_abc()).unwrap().id().unwrap();
        svc.create_from_reference(source_id, 7, WorkflowOverrides::default())
            .unwrap();
        let other_ref = svc
            .create_from_reference(source_id, 8, WorkflowOverrides::default())
            .unwrap()
            .id()
            .unwrap();

        assert!(matches!(
            svc.create_from_reference(other_ref, 7, WorkflowOverrides::default()),
            Err(TicketflowError::AlreadyLinked { team_id: 7, .. })
        ));
        assert!(svc
            .derivation_candidates(7)
            .unwrap()
            .iter()
            .all(|w| w.id != Some(other_ref)));
        assert_eq!(svc.team_workflows(7).unwrap().len(), 1);
    }

    #[test]
    fn test_derivation_requires_visibility() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.workflow = detail.workflow.with_owner(3, "Ops").with_visibility(Visibility::Private);
        let source_id = svc.create_detail(detail).unwrap().id().unwrap();

        assert!(matches!(
            svc.create_from_clone(source_id, 7, WorkflowOverrides::default()),
            Err(TicketflowError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_delete_refused_while_referenced() {
        let mut svc = service();
        let source_id = svc.create_detail(draft_abc()).unwrap().id().unwrap();
        let ref_id = svc
            .create_from_reference(source_id, 7, WorkflowOverrides::default())
            .unwrap()
            .id()
            .unwrap();

        let refused = svc.delete(source_id);
        assert!(matches!(refused, Err(TicketflowError::InUse(id)) if id == source_id));

        svc.delete(ref_id).unwrap();
        assert!(svc.team_workflows(7).unwrap().is_empty());
        svc.delete(source_id).unwrap();
        assert!(matches!(svc.get_detail(source_id), Err(TicketflowError::NotFound(_))));
    }

    #[test]
    fn test_unlink_reports_missing_link() {
        let mut svc = service();
        let source_id = svc.create_detail(draft_abc()).unwrap().id().unwrap();
        let clone_id = svc
            .create_from_clone(source_id, 7, WorkflowOverrides::default())
            .unwrap()
            .id()
            .unwrap();

        assert!(svc.unlink(clone_id, 7).unwrap());
        assert!(!svc.unlink(clone_id, 7).unwrap());
        // The workflow itself survives
        assert!(svc.get_detail(clone_id).is_ok());
    }

    #[test]
    fn test_move_ticket_starts_and_closes_timers() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();
        let (a, b, c) = (
            state_id(&saved, "A"),
            state_id(&saved, "B"),
            state_id(&saved, "C"),
        );

        let position = TicketPosition::new(id, a, t0());
        let moved = svc.move_ticket(&position, b, t0(), false).unwrap();
        let timer = moved.position.sla.clone().unwrap();
        assert_eq!(timer.due_at, Some(t0() + Duration::hours(4)));
        assert!(moved.closed_timer.is_none());

        let later = t0() + Duration::hours(5);
        let done = svc.move_ticket(&moved.position, c, later, false).unwrap();
        assert_eq!(done.closed_timer.unwrap().left_at, Some(later));
        assert!(done.position.sla.is_none());

        assert!(matches!(
            svc.move_ticket(&position, c, t0(), false),
            Err(TicketflowError::StateTransition(_))
        ));
    }

    #[test]
    fn test_move_ticket_from_unknown_state_is_reference_error() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();
        let b = state_id(&saved, "B");

        let position = TicketPosition::new(id, 9_999, t0());
        let err = svc.move_ticket(&position, b, t0(), false).unwrap_err();
        assert_eq!(err.code(), "INVALID_REFERENCE");
        assert!(!err.is_user_correctable());
    }

    #[test]
    fn test_create_rejects_out_of_range_durations() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.transitions[0].sla_duration = Some(10_i64.pow(16));
        detail.transitions[1].sla_duration = Some(-5);

        match svc.create_detail(detail) {
            Err(TicketflowError::Validation(violations)) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["transitions[0].slaDuration", "transitions[1].slaDuration"]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(svc.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_move_ticket_sees_concurrent_edit() {
        let mut svc = service();
        let saved = svc.create_detail(draft_abc()).unwrap();
        let id = saved.id().unwrap();
        let (a, b) = (state_id(&saved, "A"), state_id(&saved, "B"));
        let start = saved.transitions[0].id.unwrap();

        svc.edit(id, vec![GraphCommand::RemoveTransition { transition_id: start }])
            .unwrap();
        let position = TicketPosition::new(id, a, t0());
        assert!(svc.move_ticket(&position, b, t0(), false).is_err());
    }

    #[test]
    fn test_sla_status_uses_workflow_timeouts() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.workflow = detail
            .workflow
            .with_escalation_timeouts(Some(1), Some(2), Some(3));
        let saved = svc.create_detail(detail).unwrap();
        let id = saved.id().unwrap();
        let start = saved.transitions[0].id.unwrap();

        let mut timer = svc.start_sla(id, start, t0()).unwrap().unwrap();
        let status = svc.sla_status(id, &mut timer, t0() + Duration::hours(3)).unwrap();
        assert!(!status.violated);

        // Due at +4h; each level counts from the breach
        let status = svc.sla_status(id, &mut timer, t0() + Duration::hours(6)).unwrap();
        assert!(status.violated);
        assert_eq!(status.level, EscalationLevel::Level2);
        let status = svc.sla_status(id, &mut timer, t0() + Duration::hours(7)).unwrap();
        assert_eq!(status.level, EscalationLevel::Level3);
        assert_eq!(status.newly_reached, Some(EscalationLevel::Level3));

        let finish = saved.transitions[1].id.unwrap();
        assert!(svc.start_sla(id, finish, t0()).unwrap().is_none());
        assert!(matches!(
            svc.start_sla(id, 9_999, t0()),
            Err(TicketflowError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_sla_level_survives_an_earlier_clock() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.workflow = detail
            .workflow
            .with_escalation_timeouts(Some(1), Some(2), Some(3));
        let saved = svc.create_detail(detail).unwrap();
        let id = saved.id().unwrap();
        let start = saved.transitions[0].id.unwrap();

        let mut timer = svc.start_sla(id, start, t0()).unwrap().unwrap();
        let status = svc.sla_status(id, &mut timer, t0() + Duration::hours(7)).unwrap();
        assert_eq!(status.level, EscalationLevel::Level3);

        let status = svc.sla_status(id, &mut timer, t0() + Duration::hours(5)).unwrap();
        assert_eq!(status.level, EscalationLevel::Level3);
        assert_eq!(status.newly_reached, None);

        // Longer timeouts after the fact do not lower it either
        let mut edited = svc.get_detail(id).unwrap();
        edited.workflow = edited
            .workflow
            .with_escalation_timeouts(Some(10), Some(20), Some(30));
        svc.update_detail(id, edited).unwrap();
        let status = svc.sla_status(id, &mut timer, t0() + Duration::hours(7)).unwrap();
        assert_eq!(status.level, EscalationLevel::Level3);
        assert_eq!(timer.escalation.highest(), EscalationLevel::Level3);
    }

    #[test]
    fn test_create_rejects_reference_records() {
        let mut svc = service();
        let mut detail = draft_abc();
        detail.workflow.graph_source_id = Some(1);
        assert!(matches!(
            svc.create_detail(detail),
            Err(TicketflowError::InvalidReference(_))
        ));
    }
}
