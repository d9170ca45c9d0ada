use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::defaults::{
    DEFAULT_EXPANDED_INTERVAL_MS, DEFAULT_STAGGER_UNIT_MS, DEFAULT_THUMBNAIL_INTERVAL_MS,
};
use crate::windows::CaptureMethod;

/// How prominently a window is shown, which sets its refresh interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityMode {
    Thumbnail,
    Expanded,
}

/// Per-window refresh state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Not visible; nothing scheduled
    Idle,
    /// Waiting out the initial stagger delay
    Staggering,
    /// Capturing, or waiting for the next interval
    Active,
    /// Performing a manually requested capture
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub expanded_interval: Duration,
    pub thumbnail_interval: Duration,
    pub stagger_unit: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            expanded_interval: Duration::from_millis(DEFAULT_EXPANDED_INTERVAL_MS),
            thumbnail_interval: Duration::from_millis(DEFAULT_THUMBNAIL_INTERVAL_MS),
            stagger_unit: Duration::from_millis(DEFAULT_STAGGER_UNIT_MS),
        }
    }
}

impl SchedulerConfig {
    pub fn interval_for(&self, mode: VisibilityMode) -> Duration {
        match mode {
            VisibilityMode::Expanded => self.expanded_interval,
            VisibilityMode::Thumbnail => self.thumbnail_interval,
        }
    }

    /// Delay before the first capture of the `index`-th visible window.
    /// Expanded windows are captured immediately.
    pub fn stagger_delay(&self, mode: VisibilityMode, index: usize) -> Duration {
        match mode {
            VisibilityMode::Expanded => Duration::ZERO,
            VisibilityMode::Thumbnail => {
                self.stagger_unit
                    .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Arc<[u8]>,
    pub method: Option<CaptureMethod>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Image(CapturedImage),
    /// Capture did not produce an image. Expected to be transient.
    Failed(String),
}

/// One settled capture, tagged with the slot generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureUpdate {
    pub handle: String,
    pub generation: u64,
    pub outcome: CaptureOutcome,
}
