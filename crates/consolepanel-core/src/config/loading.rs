//! Configuration loading and merging logic.
//!
//! Loads `~/.consolepanel/config.toml` then `./.consolepanel/config.toml`,
//! merges them (project wins), applies environment overrides and validates.

use crate::config::types::{
    PanelConfig, PreferencesConfig, SchedulerSettings, ServerConfig, ToolsConfig,
};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".consolepanel";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed, or
/// if the merged configuration fails validation. Missing files are skipped.
pub fn load_hierarchy() -> Result<PanelConfig, ConfigError> {
    let mut config = PanelConfig::default();

    for path in config_paths() {
        if let Some(layer) = load_config_file(&path)? {
            tracing::debug!(event = "core.config.layer_loaded", path = %path.display());
            config = merge_configs(config, layer);
        }
    }

    apply_env_overrides(&mut config, std::env::var("PORT").ok().as_deref());

    validate_config(&config)?;

    Ok(config)
}

/// User config first, then project config; later entries win.
fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    match dirs::home_dir() {
        Some(home) => paths.push(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)),
        None => tracing::warn!(
            event = "core.config.home_dir_not_found",
            "Skipping user config: home directory unknown"
        ),
    }
    match std::env::current_dir() {
        Ok(cwd) => paths.push(cwd.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)),
        Err(e) => tracing::warn!(
            event = "core.config.cwd_unavailable",
            error = %e,
            "Skipping project config"
        ),
    }
    paths
}

/// Load one configuration file. A missing file is `Ok(None)`.
pub fn load_config_file(path: &Path) -> Result<Option<PanelConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Apply the `PORT` environment override, ignoring values that are not a valid port.
pub fn apply_env_overrides(config: &mut PanelConfig, port_var: Option<&str>) {
    let Some(raw) = port_var else {
        return;
    };

    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => config.server.port = Some(port),
        _ => {
            tracing::warn!(
                event = "core.config.port_override_invalid",
                value = raw,
                "Ignoring invalid PORT environment variable"
            );
        }
    }
}

/// Merge two configurations, with `override_config` taking precedence field by field.
pub fn merge_configs(base: PanelConfig, override_config: PanelConfig) -> PanelConfig {
    PanelConfig {
        server: ServerConfig {
            bind: override_config.server.bind.or(base.server.bind),
            port: override_config.server.port.or(base.server.port),
        },
        tools: ToolsConfig {
            python: override_config.tools.python.or(base.tools.python),
            scripts_dir: override_config.tools.scripts_dir.or(base.tools.scripts_dir),
            capture_runtime: override_config
                .tools
                .capture_runtime
                .or(base.tools.capture_runtime),
            capture_program: override_config
                .tools
                .capture_program
                .or(base.tools.capture_program),
            timeout_ms: override_config.tools.timeout_ms.or(base.tools.timeout_ms),
            capture_dir: override_config.tools.capture_dir.or(base.tools.capture_dir),
        },
        scheduler: SchedulerSettings {
            expanded_interval_ms: override_config
                .scheduler
                .expanded_interval_ms
                .or(base.scheduler.expanded_interval_ms),
            thumbnail_interval_ms: override_config
                .scheduler
                .thumbnail_interval_ms
                .or(base.scheduler.thumbnail_interval_ms),
            stagger_unit_ms: override_config
                .scheduler
                .stagger_unit_ms
                .or(base.scheduler.stagger_unit_ms),
            list_interval_ms: override_config
                .scheduler
                .list_interval_ms
                .or(base.scheduler.list_interval_ms),
        },
        preferences: PreferencesConfig {
            max_starred: override_config
                .preferences
                .max_starred
                .or(base.preferences.max_starred),
            max_nicknames: override_config
                .preferences
                .max_nicknames
                .or(base.preferences.max_nicknames),
            max_history: override_config
                .preferences
                .max_history
                .or(base.preferences.max_history),
        },
    }
}
