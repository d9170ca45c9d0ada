//! # Configuration System
//!
//! Hierarchical TOML configuration for ConsolePanel.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.consolepanel/config.toml`
//! 3. **Project config** - `./.consolepanel/config.toml`
//! 4. **Environment** - `PORT` overrides `server.port`
//! 5. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.consolepanel/config.toml
//! [server]
//! port = 9000
//!
//! [tools]
//! python = "py"
//! timeout_ms = 10000
//!
//! [scheduler]
//! thumbnail_interval_ms = 30000
//! ```
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use consolepanel_core::config::PanelConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PanelConfig::load_hierarchy()?;
//!     let timeout = config.tools.timeout();
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{PanelConfig, PreferencesConfig, SchedulerSettings, ServerConfig, ToolsConfig};
pub use validation::validate_config;

impl PanelConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
