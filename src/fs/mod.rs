//! File system utilities for ticketflow
//!
//! Provides path resolution and JSON file operations.

mod json;
mod paths;

pub use json::{
    list_workflow_ids, read_config, read_index, read_json, read_workflow, remove_workflow,
    write_index, write_json, write_workflow,
};
pub use paths::{
    find_store_root, get_config_path, get_index_path, get_store_dir, get_workflow_path,
    get_workflows_dir, resolve_cwd, STORE_DIR,
};
