//! List command - List workflows

use crate::errors::Result;
use crate::schemas::EntityId;
use std::path::Path;

use super::{open_service, print_json, workflow_line};

/// List workflows, optionally scoped to what a team can see or derive from
pub async fn run(
    cwd: Option<&Path>,
    team: Option<EntityId>,
    candidates: bool,
    json: bool,
) -> Result<()> {
    let service = open_service(cwd)?;
    let workflows = match team {
        Some(team_id) if candidates => service.derivation_candidates(team_id)?,
        _ => service.list(team)?,
    };

    if json {
        return print_json(&workflows);
    }
    if workflows.is_empty() {
        println!("No workflows");
        return Ok(());
    }
    for workflow in &workflows {
        println!("{}", workflow_line(workflow));
    }
    Ok(())
}
