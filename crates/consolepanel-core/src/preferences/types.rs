use serde::{Deserialize, Serialize};

/// Local operator preferences: annotations and recents, never core state.
///
/// Every collection is bounded by [`PreferenceLimits`]; the oldest entries are
/// evicted first. `history` and `recent_directories` are most-recent-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Starred window handles, oldest first
    #[serde(default)]
    pub starred: Vec<String>,
    /// Per-handle display names, oldest first
    #[serde(default)]
    pub nicknames: Vec<NicknameEntry>,
    /// Text sent to windows
    #[serde(default)]
    pub history: Vec<String>,
    /// Directories picked for new consoles
    #[serde(default)]
    pub recent_directories: Vec<String>,
    /// Set when the file on disk could not be read or parsed.
    #[serde(skip)]
    pub load_error: Option<String>,
}

impl Preferences {
    pub fn is_starred(&self, handle: &str) -> bool {
        self.starred.iter().any(|h| h == handle)
    }

    pub fn nickname(&self, handle: &str) -> Option<&str> {
        self.nicknames
            .iter()
            .find(|n| n.handle == handle)
            .map(|n| n.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicknameEntry {
    pub handle: String,
    pub name: String,
}

/// Collection bounds for [`Preferences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceLimits {
    pub max_starred: usize,
    pub max_nicknames: usize,
    pub max_history: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let prefs: Preferences = serde_json::from_str(r#"{"starred":["0x10"]}"#).unwrap();
        assert!(prefs.is_starred("0x10"));
        assert!(prefs.nicknames.is_empty());
        assert!(prefs.history.is_empty());
        assert_eq!(prefs.load_error, None);
    }

    #[test]
    fn test_load_error_not_serialized() {
        let prefs = Preferences {
            load_error: Some("corrupt".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&prefs).unwrap();
        assert!(!json.contains("corrupt"));
    }
}
