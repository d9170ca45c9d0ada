use tracing::debug;

use crate::preferences::errors::PreferencesError;
use crate::preferences::types::{NicknameEntry, PreferenceLimits, Preferences};

/// Bounded mutations over [`Preferences`].
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    data: Preferences,
    limits: PreferenceLimits,
}

impl PreferencesStore {
    /// Wrap loaded data, trimming anything already over the limits.
    pub fn new(data: Preferences, limits: PreferenceLimits) -> Self {
        let mut store = Self { data, limits };
        evict_front(&mut store.data.starred, limits.max_starred);
        evict_front(&mut store.data.nicknames, limits.max_nicknames);
        store.data.history.truncate(limits.max_history);
        store.data.recent_directories.truncate(limits.max_history);
        store
    }

    pub fn data(&self) -> &Preferences {
        &self.data
    }

    /// Star or unstar a handle. Returns whether anything changed.
    pub fn set_starred(&mut self, handle: &str, starred: bool) -> bool {
        let present = self.data.is_starred(handle);
        match (starred, present) {
            (true, false) => {
                self.data.starred.push(handle.to_string());
                let evicted = evict_front(&mut self.data.starred, self.limits.max_starred);
                if evicted > 0 {
                    debug!(event = "core.preferences.starred_evicted", count = evicted);
                }
                true
            }
            (false, true) => {
                self.data.starred.retain(|h| h != handle);
                true
            }
            _ => false,
        }
    }

    /// Flip a handle's star. Returns the new state.
    pub fn toggle_star(&mut self, handle: &str) -> bool {
        let starred = !self.data.is_starred(handle);
        self.set_starred(handle, starred);
        starred
    }

    /// Set a nickname, replacing any previous one. `None` clears it.
    pub fn set_nickname(&mut self, handle: &str, name: Option<&str>) -> Result<(), PreferencesError> {
        self.data.nicknames.retain(|n| n.handle != handle);

        let Some(name) = name else {
            return Ok(());
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(PreferencesError::BlankNickname {
                handle: handle.to_string(),
            });
        }

        self.data.nicknames.push(NicknameEntry {
            handle: handle.to_string(),
            name: name.to_string(),
        });
        evict_front(&mut self.data.nicknames, self.limits.max_nicknames);
        Ok(())
    }

    /// Record text sent to a window, most recent first, without duplicates.
    pub fn push_history(&mut self, text: &str) {
        push_recent(&mut self.data.history, text, self.limits.max_history);
    }

    pub fn remember_directory(&mut self, path: &str) {
        push_recent(
            &mut self.data.recent_directories,
            path,
            self.limits.max_history,
        );
    }

    /// Drop annotations for handles no longer worth keeping.
    pub fn forget(&mut self, handle: &str) {
        self.data.starred.retain(|h| h != handle);
        self.data.nicknames.retain(|n| n.handle != handle);
    }
}

fn evict_front<T>(items: &mut Vec<T>, max: usize) -> usize {
    let excess = items.len().saturating_sub(max);
    items.drain(..excess);
    excess
}

fn push_recent(items: &mut Vec<String>, value: &str, max: usize) {
    if value.trim().is_empty() {
        return;
    }
    items.retain(|v| v != value);
    items.insert(0, value.to_string());
    items.truncate(max);
}
