use std::error::Error;
use std::path::PathBuf;

/// Implemented by every ConsolePanel error enum.
///
/// `is_user_error` decides the HTTP status class (400 vs 500) and whether the
/// CLI treats a failure as a usage mistake.
pub trait PanelError: Error + Send + Sync + 'static {
    /// Stable machine-readable code, also sent to HTTP clients.
    fn error_code(&self) -> &'static str;

    fn is_user_error(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in '{}': {message}", .path.display())]
    ParseFailed { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl PanelError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ReadFailed { .. } => "CONFIG_READ_FAILED",
            ConfigError::ParseFailed { .. } => "CONFIG_PARSE_FAILED",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(self, ConfigError::ReadFailed { .. })
    }
}
