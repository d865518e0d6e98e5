//! CLI command implementations

pub mod author;
pub mod derive;
pub mod init;
pub mod list;
pub mod remove;
pub mod show;
pub mod states;
pub mod ticket;
pub mod validate;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::load_config;
use crate::errors::{Result, TicketflowError};
use crate::fs::{find_store_root, read_json, resolve_cwd};
use crate::schemas::Workflow;
use crate::service::WorkflowService;
use crate::store::JsonWorkflowRepository;

/// Service over the store found from `cwd`
pub(crate) fn open_service(cwd: Option<&Path>) -> Result<WorkflowService<JsonWorkflowRepository>> {
    let root = find_store_root(&resolve_cwd(cwd))?;
    let config = load_config(&root)?;
    tracing::debug!(root = %root.display(), time_unit = %config.time_unit, "opened store");
    Ok(WorkflowService::new(JsonWorkflowRepository::new(root), config))
}

/// Read a JSON input file, resolved against `cwd` when relative
pub(crate) fn read_input<T: DeserializeOwned>(cwd: Option<&Path>, file: &Path) -> Result<T> {
    let path = if file.is_relative() {
        resolve_cwd(cwd).join(file)
    } else {
        file.to_path_buf()
    };
    read_json(&path)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| TicketflowError::wrap(e, "Failed to render JSON"))?;
    println!("{}", out);
    Ok(())
}

pub(crate) fn workflow_line(workflow: &Workflow) -> String {
    let owner = match (&workflow.owner_name, workflow.owner_id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("team {}", id),
        (None, None) => "global".to_string(),
    };
    let mut line = format!(
        "{:>5}  {}  [{}]  {}",
        workflow.id.map(|id| id.to_string()).unwrap_or_default(),
        workflow.name,
        workflow.visibility,
        owner
    );
    if let Some(source) = workflow.graph_source_id {
        line.push_str(&format!("  -> graph of {}", source));
    }
    line
}
