use serde::Serialize;

use crate::windows::WindowDescriptor;

/// What changed in a [`super::DisplayOrder`] after merging a snapshot.
///
/// `removed` handles must have their per-window scheduler state released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl MergeOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Operator reorder actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
    Top,
    Bottom,
}

/// A window in display order with its local annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEntry {
    #[serde(flatten)]
    pub descriptor: WindowDescriptor,
    pub starred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl DisplayEntry {
    /// Nickname when set, else the window title.
    pub fn label(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.descriptor.title)
    }
}
