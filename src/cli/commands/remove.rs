//! Delete and unlink commands

use crate::errors::Result;
use crate::schemas::EntityId;
use std::path::Path;

use super::open_service;

pub async fn delete(cwd: Option<&Path>, id: EntityId, dry_run: bool) -> Result<()> {
    let mut service = open_service(cwd)?;
    if dry_run {
        service.check_delete(id)?;
        println!("Would delete workflow {}", id);
        return Ok(());
    }

    service.delete(id)?;
    println!("Deleted workflow {}", id);
    Ok(())
}

pub async fn unlink(cwd: Option<&Path>, id: EntityId, team: EntityId, dry_run: bool) -> Result<()> {
    let mut service = open_service(cwd)?;
    if dry_run {
        println!("Would unlink workflow {} from team {}", id, team);
        return Ok(());
    }

    if service.unlink(id, team)? {
        println!("Unlinked workflow {} from team {}", id, team);
    } else {
        println!("Workflow {} was not linked to team {}", id, team);
    }
    Ok(())
}
