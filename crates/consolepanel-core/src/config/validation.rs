//! Configuration validation logic.

use crate::config::types::PanelConfig;
use crate::errors::ConfigError;

/// Validate a PanelConfig, returning an error if any values are unusable.
///
/// # Validation Rules
///
/// - `tools.python` must not be empty
/// - `tools.timeout_ms` and every scheduler interval must be greater than zero
/// - `scheduler.thumbnail_interval_ms` must not be shorter than `expanded_interval_ms`
pub fn validate_config(config: &PanelConfig) -> Result<(), ConfigError> {
    if config.tools.python().trim().is_empty() {
        return Err(ConfigError::InvalidConfiguration {
            message: "tools.python must not be empty".to_string(),
        });
    }

    if config.tools.timeout_ms() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "tools.timeout_ms must be greater than zero".to_string(),
        });
    }

    let scheduler = &config.scheduler;
    for (name, value) in [
        ("expanded_interval_ms", scheduler.expanded_interval_ms()),
        ("thumbnail_interval_ms", scheduler.thumbnail_interval_ms()),
        ("list_interval_ms", scheduler.list_interval().as_millis() as u64),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("scheduler.{} must be greater than zero", name),
            });
        }
    }

    if scheduler.thumbnail_interval_ms() < scheduler.expanded_interval_ms() {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "scheduler.thumbnail_interval_ms ({}) must not be shorter than expanded_interval_ms ({})",
                scheduler.thumbnail_interval_ms(),
                scheduler.expanded_interval_ms()
            ),
        });
    }

    Ok(())
}
