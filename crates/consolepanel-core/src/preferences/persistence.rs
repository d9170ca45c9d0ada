use std::path::{Path, PathBuf};

use super::errors::PreferencesError;
use super::types::Preferences;

/// Load preferences from `path`.
///
/// A missing file yields defaults. An unreadable or corrupted file also yields
/// defaults, with `load_error` describing what went wrong.
pub fn load_preferences_from(path: &Path) -> Preferences {
    if !path.exists() {
        return Preferences::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(
                    event = "core.preferences.json_parse_failed",
                    path = %path.display(),
                    error = %e,
                    "Preferences file exists but contains invalid JSON"
                );
                Preferences {
                    load_error: Some(format!(
                        "Preferences file corrupted ({}). Delete {} to reset.",
                        e,
                        path.display()
                    )),
                    ..Default::default()
                }
            }
        },
        Err(e) => {
            tracing::error!(
                event = "core.preferences.load_failed",
                path = %path.display(),
                error = %e
            );
            Preferences {
                load_error: Some(format!(
                    "Failed to read preferences file: {}. Check permissions on {}",
                    e,
                    path.display()
                )),
                ..Default::default()
            }
        }
    }
}

/// Save preferences to `path` as pretty JSON, creating parent directories.
pub fn save_preferences_to(path: &Path, data: &Preferences) -> Result<(), PreferencesError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PreferencesError::SaveFailed {
            message: format!("Failed to create directory ({}): {}", parent.display(), e),
        })?;
    }

    let json = serde_json::to_string_pretty(data).map_err(|e| PreferencesError::SaveFailed {
        message: format!("Failed to serialize preferences: {}", e),
    })?;

    // Readers never observe a partially written file
    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, json).map_err(|e| PreferencesError::SaveFailed {
        message: format!("Failed to write preferences file ({}): {}", staging.display(), e),
    })?;
    std::fs::rename(&staging, path).map_err(|e| PreferencesError::SaveFailed {
        message: format!("Failed to replace preferences file ({}): {}", path.display(), e),
    })?;

    tracing::info!(
        event = "core.preferences.saved",
        path = %path.display(),
        starred = data.starred.len(),
        nicknames = data.nicknames.len()
    );

    Ok(())
}

/// Load from the default location (`~/.consolepanel/preferences.json`).
pub fn load_preferences() -> Preferences {
    load_preferences_from(&preferences_file_path())
}

pub fn save_preferences(data: &Preferences) -> Result<(), PreferencesError> {
    save_preferences_to(&preferences_file_path(), data)
}

/// `CONSOLEPANEL_PREFERENCES_FILE` overrides the default location.
pub fn preferences_file_path() -> PathBuf {
    if let Ok(path_str) = std::env::var("CONSOLEPANEL_PREFERENCES_FILE")
        && !path_str.is_empty()
    {
        return PathBuf::from(path_str);
    }

    match dirs::home_dir() {
        Some(home) => home.join(".consolepanel").join("preferences.json"),
        None => {
            tracing::error!(
                event = "core.preferences.home_dir_not_found",
                fallback = ".",
                "Could not determine home directory - using current directory as fallback"
            );
            PathBuf::from(".")
                .join(".consolepanel")
                .join("preferences.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::types::NicknameEntry;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        let prefs = load_preferences_from(&tmp.path().join("preferences.json"));
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("preferences.json");

        let prefs = Preferences {
            starred: vec!["0x10".to_string()],
            nicknames: vec![NicknameEntry {
                handle: "0x10".to_string(),
                name: "build".to_string(),
            }],
            history: vec!["dir".to_string()],
            ..Default::default()
        };
        save_preferences_to(&path, &prefs).unwrap();

        let loaded = load_preferences_from(&path);
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.nickname("0x10"), Some("build"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupted_file_sets_load_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();

        let prefs = load_preferences_from(&path);
        assert!(prefs.starred.is_empty());
        let message = prefs.load_error.unwrap();
        assert!(message.contains("corrupted"));
        assert!(message.contains("preferences.json"));
    }
}
