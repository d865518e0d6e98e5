//! Configuration loading with defaults

use std::path::Path;

use crate::errors::{Result, TicketflowError};
use crate::fs;
use crate::schemas::{Config, MAX_TIME_AMOUNT};

/// Load configuration from the store, falling back to defaults.
///
/// If config.json exists, it will be read and merged with defaults.
/// If it doesn't exist, default configuration is returned.
///
/// # Errors
/// * `ConfigError` - If a value is out of range
pub fn load_config(root: &Path) -> Result<Config> {
    let config = fs::read_config(root)?;
    check_config(&config)?;
    Ok(config)
}

fn check_config(config: &Config) -> Result<()> {
    let escalation = &config.default_escalation;
    for (name, value) in [
        ("level1", escalation.level1),
        ("level2", escalation.level2),
        ("level3", escalation.level3),
    ] {
        if value < 0 {
            return Err(TicketflowError::ConfigError(format!(
                "default_escalation.{} must not be negative, got {}",
                name, value
            )));
        }
        if value > MAX_TIME_AMOUNT {
            return Err(TicketflowError::ConfigError(format!(
                "default_escalation.{} must be at most {}, got {}",
                name, MAX_TIME_AMOUNT, value
            )));
        }
    }
    Ok(())
}

/// Create the `.ticketflow` directory with a default config.json.
///
/// Returns false without touching anything if the store already exists and
/// `force` is not set.
pub fn init_store(root: &Path, force: bool) -> Result<bool> {
    let config_path = fs::get_config_path(root);
    if config_path.exists() && !force {
        return Ok(false);
    }

    std::fs::create_dir_all(fs::get_workflows_dir(root))?;
    fs::write_json(&config_path, &Config::default())?;
    tracing::info!(root = %root.display(), "initialized workflow store");
    Ok(true)
}
