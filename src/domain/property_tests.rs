//! Property-based tests for domain logic
//!
//! These tests use proptest to verify graph invariants across many random workflows.

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;
    use proptest::sample::Index;

    use crate::domain::derivation::{derive_clone, WorkflowOverrides};
    use crate::domain::graph::GraphStore;
    use crate::domain::sla::{EscalationLevel, EscalationPolicy, EscalationTracker};
    use crate::domain::transitions::valid_target_states;
    use crate::domain::validation::validate;
    use crate::schemas::{Workflow, WorkflowDetail, WorkflowState, WorkflowTransition};

    // ===== STRATEGY HELPERS =====

    fn build_detail(flags: Vec<(bool, bool)>, edges: Vec<(i64, i64, String)>) -> WorkflowDetail {
        let mut workflow = Workflow::new("Support", "Incident");
        workflow.id = Some(1000);
        let mut detail = WorkflowDetail::new(workflow);
        for (i, (is_initial, is_final)) in flags.into_iter().enumerate() {
            let mut state = WorkflowState::new(format!("S{}", i + 1)).with_id(i as i64 + 1);
            state.is_initial = is_initial;
            state.is_final = is_final;
            detail.states.push(state);
        }
        for (i, (source, target, event)) in edges.into_iter().enumerate() {
            detail
                .transitions
                .push(WorkflowTransition::new(source, target, event).with_id(500 + i as i64));
        }
        detail
    }

    /// A graph whose transitions may dangle or carry blank event names
    fn any_detail() -> impl Strategy<Value = WorkflowDetail> {
        (1i64..8)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec((any::<bool>(), any::<bool>()), n as usize),
                    prop::collection::vec((1i64..=n + 2, 1i64..=n + 2, "[a-z ]{0,6}"), 0..12),
                )
            })
            .prop_map(|(flags, edges)| build_detail(flags, edges))
    }

    /// A graph with no dangling endpoints and non-blank event names
    fn well_formed_detail() -> impl Strategy<Value = WorkflowDetail> {
        (1i64..8)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec((any::<bool>(), any::<bool>()), n as usize),
                    prop::collection::vec((1i64..=n, 1i64..=n, "[a-z]{1,6}"), 0..12),
                )
            })
            .prop_map(|(flags, edges)| build_detail(flags, edges))
    }

    fn any_level() -> impl Strategy<Value = EscalationLevel> {
        prop_oneof![
            Just(EscalationLevel::None),
            Just(EscalationLevel::Level1),
            Just(EscalationLevel::Level2),
            Just(EscalationLevel::Level3),
        ]
    }

    // ===== GRAPH STORE =====

    proptest! {
        /// Property: after set_initial(s) exactly one state is initial, and it is s
        #[test]
        fn test_set_initial_is_exclusive_and_idempotent(detail in any_detail(), pick in any::<Index>()) {
            let mut store = GraphStore::from_detail(detail);
            let id = store.detail().states[pick.index(store.detail().states.len())].id.unwrap();

            store.set_initial(id).unwrap();
            let once = store.detail().clone();
            store.set_initial(id).unwrap();

            let initial: Vec<_> = store.detail().states.iter().filter(|s| s.is_initial).collect();
            prop_assert_eq!(initial.len(), 1);
            prop_assert_eq!(initial[0].id, Some(id));
            prop_assert_eq!(store.detail(), &once);
        }

        /// Property: removing a state leaves no transition referencing it
        #[test]
        fn test_remove_state_cascades(detail in any_detail(), pick in any::<Index>()) {
            let mut store = GraphStore::from_detail(detail);
            let id = store.detail().states[pick.index(store.detail().states.len())].id.unwrap();

            store.remove_state(id).unwrap();
            prop_assert!(store.detail().transitions.iter().all(|t| !t.touches(id)));
            prop_assert!(!store.detail().has_state(id));
        }
    }

    // ===== VALIDATOR =====

    proptest! {
        /// Property: validate passes iff endpoints resolve, at most one initial, and events are non-blank
        #[test]
        fn test_validate_iff_structural_rules_hold(detail in any_detail()) {
            let ids = detail.state_ids();
            let endpoints_ok = detail.transitions.iter().all(|t| {
                t.source_state_id.map_or(true, |s| ids.contains(&s))
                    && t.target_state_id.map_or(true, |s| ids.contains(&s))
            });
            let initial_ok = detail.states.iter().filter(|s| s.is_initial).count() <= 1;
            let events_ok = detail.transitions.iter().all(|t| !t.event_name.trim().is_empty());

            prop_assert_eq!(validate(&detail).is_valid(), endpoints_ok && initial_ok && events_ok);
        }
    }

    // ===== TRANSITION QUERIES =====

    proptest! {
        /// Property: include_self always yields the source; without it only a self-loop does
        #[test]
        fn test_include_self_semantics(detail in well_formed_detail(), pick in any::<Index>()) {
            let id = detail.states[pick.index(detail.states.len())].id.unwrap();

            let with_self = valid_target_states(&detail, id, true).unwrap();
            prop_assert!(with_self.iter().any(|s| s.id == Some(id)));

            let has_loop = detail.outgoing(id).any(|t| t.target_state_id == Some(id));
            let without_self = valid_target_states(&detail, id, false).unwrap();
            prop_assert_eq!(without_self.iter().any(|s| s.id == Some(id)), has_loop);
        }

        /// Property: targets are distinct
        #[test]
        fn test_targets_are_distinct(detail in well_formed_detail(), pick in any::<Index>()) {
            let id = detail.states[pick.index(detail.states.len())].id.unwrap();
            let targets = valid_target_states(&detail, id, true).unwrap();
            let mut ids: Vec<_> = targets.iter().map(|s| s.id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), targets.len());
        }
    }

    // ===== DERIVATION =====

    proptest! {
        /// Property: a clone has as many states and transitions as its source, none dangling
        #[test]
        fn test_clone_round_trip(detail in well_formed_detail()) {
            let mut next = 10_000;
            let clone = derive_clone(&detail, &WorkflowOverrides::default(), 9_999, || {
                next += 1;
                next
            })
            .unwrap();

            prop_assert_eq!(clone.states.len(), detail.states.len());
            prop_assert_eq!(clone.transitions.len(), detail.transitions.len());

            let ids = clone.state_ids();
            prop_assert_eq!(ids.len(), clone.states.len());
            prop_assert!(ids.iter().all(|id| !detail.has_state(*id)));
            for t in &clone.transitions {
                prop_assert!(ids.contains(&t.source_state_id.unwrap()));
                prop_assert!(ids.contains(&t.target_state_id.unwrap()));
            }
            prop_assert!(validate(&clone).is_valid() == validate(&detail).is_valid());
        }
    }

    // ===== ESCALATION =====

    proptest! {
        /// Property: escalation level never drops as time since breach grows
        #[test]
        fn test_level_is_monotone_in_elapsed(
            l1 in prop::option::of(0i64..48),
            l2 in prop::option::of(0i64..48),
            l3 in prop::option::of(0i64..48),
            a in 0i64..200,
            b in 0i64..200,
        ) {
            let policy = EscalationPolicy {
                level1: l1.map(Duration::hours),
                level2: l2.map(Duration::hours),
                level3: l3.map(Duration::hours),
            };
            let (lo, hi) = (a.min(b), a.max(b));
            let (early, late) = (Duration::hours(lo), Duration::hours(hi));
            prop_assert!(policy.level_for(early) <= policy.level_for(late));
        }

        /// Property: a level is reached exactly when its own timeout has elapsed
        #[test]
        fn test_each_level_counts_from_the_breach(
            l1 in prop::option::of(0i64..48),
            l2 in prop::option::of(0i64..48),
            l3 in prop::option::of(0i64..48),
            elapsed in 0i64..100,
        ) {
            let policy = EscalationPolicy {
                level1: l1.map(Duration::hours),
                level2: l2.map(Duration::hours),
                level3: l3.map(Duration::hours),
            };
            let expected = [
                (EscalationLevel::Level1, l1),
                (EscalationLevel::Level2, l2),
                (EscalationLevel::Level3, l3),
            ]
            .into_iter()
            .filter(|(_, timeout)| timeout.is_some_and(|t| elapsed >= t))
            .map(|(level, _)| level)
            .last()
            .unwrap_or(EscalationLevel::None);
            prop_assert_eq!(policy.level_for(Duration::hours(elapsed)), expected);
        }

        /// Property: the tracker's highest level is the max of everything observed
        #[test]
        fn test_tracker_is_running_max(levels in prop::collection::vec(any_level(), 0..20)) {
            let mut tracker = EscalationTracker::new();
            let mut previous = tracker.highest();
            for level in &levels {
                tracker.observe(*level);
                prop_assert!(tracker.highest() >= previous);
                previous = tracker.highest();
            }
            let expected = levels.iter().copied().max().unwrap_or(EscalationLevel::None);
            prop_assert_eq!(tracker.highest(), expected);
        }
    }
}
