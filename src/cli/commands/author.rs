//! Create, update and edit commands - Write workflow definitions

use crate::domain::{GraphCommand, GraphStore};
use crate::errors::Result;
use crate::schemas::{EntityId, WorkflowDetail};
use std::path::Path;

use super::{open_service, read_input};

/// Save a new workflow from a detail file
pub async fn create(cwd: Option<&Path>, file: &Path, dry_run: bool) -> Result<()> {
    let mut service = open_service(cwd)?;
    let detail: WorkflowDetail = read_input(cwd, file)?;

    if dry_run {
        service.validate(&detail).into_result()?;
        println!("Would create workflow '{}'", detail.workflow.name);
        return Ok(());
    }

    let saved = service.create_detail(detail)?;
    println!(
        "Created workflow {} '{}'",
        saved.id().unwrap_or_default(),
        saved.workflow.name
    );
    Ok(())
}

/// Replace a stored workflow with a detail file
pub async fn update(cwd: Option<&Path>, id: EntityId, file: &Path, dry_run: bool) -> Result<()> {
    let mut service = open_service(cwd)?;
    let detail: WorkflowDetail = read_input(cwd, file)?;

    if dry_run {
        service.get_detail(id)?;
        service.validate(&detail).into_result()?;
        println!("Would update workflow {}", id);
        return Ok(());
    }

    let saved = service.update_detail(id, detail)?;
    println!(
        "Updated workflow {} ({} states, {} transitions)",
        id,
        saved.states.len(),
        saved.transitions.len()
    );
    Ok(())
}

/// Apply a JSON array of graph commands to a stored workflow
pub async fn edit(cwd: Option<&Path>, id: EntityId, file: &Path, dry_run: bool) -> Result<()> {
    let mut service = open_service(cwd)?;
    let commands: Vec<GraphCommand> = read_input(cwd, file)?;
    let count = commands.len();

    if dry_run {
        let mut store = GraphStore::from_detail(service.get_detail(id)?);
        store.apply_all(commands)?;
        service.validate(store.detail()).into_result()?;
        println!("Would apply {} command(s) to workflow {}", count, id);
        return Ok(());
    }

    let (saved, _) = service.edit(id, commands)?;
    println!(
        "Applied {} command(s) to workflow {} ({} states, {} transitions)",
        count,
        id,
        saved.states.len(),
        saved.transitions.len()
    );
    Ok(())
}
