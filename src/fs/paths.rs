//! Path resolution utilities for ticketflow
//!
//! Provides functions to locate the store root and construct paths
//! to the files kept inside `.ticketflow/`.

use std::path::{Path, PathBuf};

use crate::errors::{Result, TicketflowError};
use crate::schemas::EntityId;

/// Name of the data directory marking a store root
pub const STORE_DIR: &str = ".ticketflow";

/// Find the store root: the nearest ancestor directory containing `.ticketflow`.
///
/// # Arguments
/// * `start_cwd` - The directory to start searching from
///
/// # Errors
/// * `StoreNotFound` - If no ancestor contains a `.ticketflow` directory
pub fn find_store_root(start_cwd: &Path) -> Result<PathBuf> {
    let mut current = start_cwd
        .canonicalize()
        .map_err(|e| TicketflowError::StoreNotFound(format!("Cannot resolve path: {}", e)))?;

    loop {
        if current.join(STORE_DIR).is_dir() {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => {
                return Err(TicketflowError::StoreNotFound(
                    "Could not find a .ticketflow directory; run `ticketflow init` first"
                        .to_string(),
                ));
            }
        }
    }
}

/// Resolve the current working directory, optionally using an override.
pub fn resolve_cwd(cwd_option: Option<&Path>) -> PathBuf {
    match cwd_option {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Get the path to the .ticketflow directory.
pub fn get_store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

/// Get the path to the config.json file.
pub fn get_config_path(root: &Path) -> PathBuf {
    get_store_dir(root).join("config.json")
}

/// Get the path to the index.json file (id sequence and team links).
pub fn get_index_path(root: &Path) -> PathBuf {
    get_store_dir(root).join("index.json")
}

/// Get the path to the workflows directory.
pub fn get_workflows_dir(root: &Path) -> PathBuf {
    get_store_dir(root).join("workflows")
}

/// Get the path to a workflow's detail file.
pub fn get_workflow_path(root: &Path, id: EntityId) -> PathBuf {
    get_workflows_dir(root).join(format!("{}.json", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(STORE_DIR)).unwrap();
        temp
    }

    #[test]
    fn test_find_store_root_from_root() {
        let temp = setup_store();
        let root = find_store_root(temp.path()).unwrap();
        assert_eq!(root.canonicalize().unwrap(), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_find_store_root_from_subdir() {
        let temp = setup_store();
        let subdir = temp.path().join("tickets").join("deep");
        std::fs::create_dir_all(&subdir).unwrap();

        let root = find_store_root(&subdir).unwrap();
        assert_eq!(root.canonicalize().unwrap(), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_store_paths() {
        let root = PathBuf::from("/data");
        assert_eq!(get_store_dir(&root), PathBuf::from("/data/.ticketflow"));
        assert_eq!(get_config_path(&root), PathBuf::from("/data/.ticketflow/config.json"));
        assert_eq!(get_index_path(&root), PathBuf::from("/data/.ticketflow/index.json"));
        assert_eq!(
            get_workflow_path(&root, 12),
            PathBuf::from("/data/.ticketflow/workflows/12.json")
        );
    }

    #[test]
    fn test_resolve_cwd_with_override() {
        let path = PathBuf::from("/custom/path");
        let resolved = resolve_cwd(Some(&path));
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_resolve_cwd_without_override() {
        let resolved = resolve_cwd(None);
        assert!(!resolved.as_os_str().is_empty());
    }
}
