//! Reference and clone commands - Derive team workflows

use crate::domain::{DerivationStrategy, WorkflowOverrides};
use crate::errors::Result;
use crate::schemas::EntityId;
use std::path::Path;

use super::open_service;

/// Derive a workflow for `team` from `source` with the given strategy
pub async fn run(
    cwd: Option<&Path>,
    strategy: DerivationStrategy,
    source: EntityId,
    team: EntityId,
    name: Option<String>,
    description: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let mut service = open_service(cwd)?;
    let overrides = WorkflowOverrides {
        name,
        description,
        ..Default::default()
    };

    if dry_run {
        service.check_derivation(source, team)?;
        println!("Would {} workflow {} for team {}", strategy, source, team);
        return Ok(());
    }

    let derived = match strategy {
        DerivationStrategy::Reference => service.create_from_reference(source, team, overrides)?,
        DerivationStrategy::Clone => service.create_from_clone(source, team, overrides)?,
    };
    println!(
        "Created workflow {} '{}' for team {} ({} of {})",
        derived.id().unwrap_or_default(),
        derived.workflow.name,
        team,
        strategy,
        source
    );
    Ok(())
}
