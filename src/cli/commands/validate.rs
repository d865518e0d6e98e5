//! Validate command - Check a workflow detail file

use crate::errors::Result;
use crate::schemas::WorkflowDetail;
use std::path::Path;

use super::read_input;

/// Report every structural violation in a detail file.
///
/// Needs no store.
pub async fn run(cwd: Option<&Path>, file: &Path) -> Result<()> {
    let detail: WorkflowDetail = read_input(cwd, file)?;
    let result = crate::domain::validate(&detail);
    if result.is_valid() {
        println!(
            "{} is valid ({} states, {} transitions)",
            file.display(),
            detail.states.len(),
            detail.transitions.len()
        );
    }
    result.into_result()
}
