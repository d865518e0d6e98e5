//! Show command - Show a workflow with its graph

use crate::errors::Result;
use crate::schemas::{EntityId, WorkflowDetail};
use std::path::Path;

use super::{open_service, print_json, workflow_line};

pub async fn run(cwd: Option<&Path>, id: EntityId, json: bool) -> Result<()> {
    let service = open_service(cwd)?;
    let detail = service.get_detail(id)?;
    if json {
        return print_json(&detail);
    }
    print_detail(&detail);
    Ok(())
}

pub(crate) fn print_detail(detail: &WorkflowDetail) {
    let workflow = &detail.workflow;
    println!("{}", workflow_line(workflow));
    println!("  request: {}", workflow.request_name);
    if !workflow.description.is_empty() {
        println!("  {}", workflow.description);
    }
    let timeouts: Vec<String> = [
        workflow.level1_escalation_timeout,
        workflow.level2_escalation_timeout,
        workflow.level3_escalation_timeout,
    ]
    .iter()
    .map(|t| t.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()))
    .collect();
    println!("  escalation: {}", timeouts.join(" / "));

    println!("States:");
    for state in &detail.states {
        let mut flags = Vec::new();
        if state.is_initial {
            flags.push("initial");
        }
        if state.is_final {
            flags.push("final");
        }
        println!(
            "  {:>5}  {}{}",
            state.id.unwrap_or_default(),
            state.state_name,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            }
        );
    }

    println!("Transitions:");
    let name_of = |id: Option<EntityId>| {
        id.and_then(|id| detail.state(id))
            .map(|s| s.state_name.clone())
            .unwrap_or_else(|| "?".to_string())
    };
    for transition in &detail.transitions {
        let sla = match transition.sla_duration {
            Some(d) if transition.escalate_on_violation => format!("  sla {} (escalates)", d),
            Some(d) => format!("  sla {}", d),
            None => String::new(),
        };
        println!(
            "  {:>5}  {} --{}--> {}{}",
            transition.id.unwrap_or_default(),
            name_of(transition.source_state_id),
            transition.event_name,
            name_of(transition.target_state_id),
            sla
        );
    }
}
