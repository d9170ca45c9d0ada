use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::preferences::Preferences;
use crate::reconcile::types::{DisplayEntry, MergeOutcome, MoveDirection};
use crate::windows::WindowDescriptor;

/// Merge a fresh snapshot into a previous display order.
///
/// Handles still present keep their relative order; handles new to the
/// snapshot are appended in snapshot order; everything else is dropped.
/// Duplicate handles in either input appear once in the result.
pub fn reconcile(previous: &[String], snapshot: &[WindowDescriptor]) -> Vec<String> {
    let present: HashSet<&str> = snapshot.iter().map(|w| w.handle.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.len());
    let mut order = Vec::with_capacity(snapshot.len());

    for handle in previous {
        if present.contains(handle.as_str()) && seen.insert(handle.as_str()) {
            order.push(handle.clone());
        }
    }

    for window in snapshot {
        if seen.insert(window.handle.as_str()) {
            order.push(window.handle.clone());
        }
    }

    order
}

/// The operator's arrangement of windows, independent of enumeration order.
///
/// Holds no duplicates. After [`DisplayOrder::merge`] it contains exactly the
/// handles of that snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOrder {
    handles: Vec<String>,
}

impl DisplayOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> &[String] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.position(handle).is_some()
    }

    pub fn position(&self, handle: &str) -> Option<usize> {
        self.handles.iter().position(|h| h == handle)
    }

    pub fn merge(&mut self, snapshot: &[WindowDescriptor]) -> MergeOutcome {
        let next = reconcile(&self.handles, snapshot);

        let before: HashSet<&str> = self.handles.iter().map(String::as_str).collect();
        let after: HashSet<&str> = next.iter().map(String::as_str).collect();

        let outcome = MergeOutcome {
            added: next
                .iter()
                .filter(|h| !before.contains(h.as_str()))
                .cloned()
                .collect(),
            removed: self
                .handles
                .iter()
                .filter(|h| !after.contains(h.as_str()))
                .cloned()
                .collect(),
        };

        if !outcome.is_unchanged() {
            debug!(
                event = "core.reconcile.merge_completed",
                added = outcome.added.len(),
                removed = outcome.removed.len(),
                total = next.len()
            );
        }

        self.handles = next;
        outcome
    }

    /// Move a handle one step or to an end. Returns false when the handle is
    /// unknown or already at that end.
    pub fn move_handle(&mut self, handle: &str, direction: MoveDirection) -> bool {
        let Some(from) = self.position(handle) else {
            return false;
        };
        let last = self.handles.len() - 1;

        let to = match direction {
            MoveDirection::Up => from.saturating_sub(1),
            MoveDirection::Down => (from + 1).min(last),
            MoveDirection::Top => 0,
            MoveDirection::Bottom => last,
        };
        if to == from {
            return false;
        }

        let item = self.handles.remove(from);
        self.handles.insert(to, item);
        true
    }

    /// Drop a handle at the operator's request. It returns, appended, if a
    /// later snapshot still lists it.
    pub fn remove(&mut self, handle: &str) -> bool {
        match self.position(handle) {
            Some(index) => {
                self.handles.remove(index);
                true
            }
            None => false,
        }
    }

    /// Snapshot windows in display order, annotated from preferences.
    ///
    /// Handles without a descriptor in `snapshot` are skipped.
    pub fn annotate(
        &self,
        snapshot: &[WindowDescriptor],
        preferences: &Preferences,
    ) -> Vec<DisplayEntry> {
        let by_handle: HashMap<&str, &WindowDescriptor> =
            snapshot.iter().map(|w| (w.handle.as_str(), w)).collect();

        self.handles
            .iter()
            .filter_map(|handle| by_handle.get(handle.as_str()))
            .map(|descriptor| DisplayEntry {
                descriptor: (*descriptor).clone(),
                starred: preferences.is_starred(&descriptor.handle),
                nickname: preferences.nickname(&descriptor.handle).map(str::to_string),
            })
            .collect()
    }
}

impl From<Vec<String>> for DisplayOrder {
    /// Build an order from handles, dropping duplicates.
    fn from(handles: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        Self {
            handles: handles
                .into_iter()
                .filter(|h| seen.insert(h.clone()))
                .collect(),
        }
    }
}
