//! JSON file operations with schema validation
//!
//! Provides functions to read and write JSON files with serde validation.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{Result, TicketflowError};
use crate::schemas::{Config, EntityId, StoreIndex, WorkflowDetail};

use super::paths::{get_config_path, get_index_path, get_workflow_path, get_workflows_dir};

/// Read and deserialize a JSON file.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidJson` - If the file contains invalid JSON or does not match the schema
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TicketflowError::FileNotFound(format!("File not found: {}", path.display()))
        } else {
            TicketflowError::Io(e)
        }
    })?;

    serde_json::from_str(&content).map_err(|e| {
        TicketflowError::InvalidJson(format!("Invalid JSON in file {}: {}", path.display(), e))
    })
}

/// Write a value to a JSON file with pretty formatting.
///
/// Uses atomic write (write to temp file, then rename) to avoid partial writes.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| TicketflowError::InvalidJson(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read the config.json file, or defaults if it doesn't exist.
pub fn read_config(root: &Path) -> Result<Config> {
    let path = get_config_path(root);
    if !path.exists() {
        return Ok(Config::default());
    }
    read_json(&path)
}

/// Read the store index, or an empty one if it doesn't exist.
pub fn read_index(root: &Path) -> Result<StoreIndex> {
    let path = get_index_path(root);
    if !path.exists() {
        return Ok(StoreIndex::new());
    }
    read_json(&path)
}

pub fn write_index(root: &Path, index: &StoreIndex) -> Result<()> {
    write_json(&get_index_path(root), index)
}

/// Read a workflow detail file.
///
/// # Errors
/// * `NotFound` - If no workflow with this id is stored
pub fn read_workflow(root: &Path, id: EntityId) -> Result<WorkflowDetail> {
    match read_json(&get_workflow_path(root, id)) {
        Err(TicketflowError::FileNotFound(_)) => Err(TicketflowError::NotFound(id)),
        other => other,
    }
}

pub fn write_workflow(root: &Path, id: EntityId, detail: &WorkflowDetail) -> Result<()> {
    write_json(&get_workflow_path(root, id), detail)
}

/// Delete a workflow detail file. Returns false if it did not exist.
pub fn remove_workflow(root: &Path, id: EntityId) -> Result<bool> {
    match fs::remove_file(get_workflow_path(root, id)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Ids of every stored workflow, ascending
pub fn list_workflow_ids(root: &Path) -> Result<Vec<EntityId>> {
    let dir = get_workflows_dir(root);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut ids = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<EntityId>().ok())
        {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}
