//! Init command - Create a workflow store

use crate::config::init_store;
use crate::errors::Result;
use crate::fs::{get_store_dir, resolve_cwd};
use std::path::Path;

/// Create `.ticketflow/` in the working directory
pub async fn run(cwd: Option<&Path>, force: bool, dry_run: bool) -> Result<()> {
    let root = resolve_cwd(cwd);
    let store_dir = get_store_dir(&root);

    if dry_run {
        println!("Would initialize {}", store_dir.display());
        return Ok(());
    }

    if init_store(&root, force)? {
        println!("Initialized {}", store_dir.display());
    } else {
        println!("{} already exists (use --force to reset config.json)", store_dir.display());
    }
    Ok(())
}
