//! Per-window capture scheduling.
//!
//! [`CaptureScheduler`] runs one control loop per visible window and
//! publishes [`CaptureUpdate`]s; [`CaptureGallery`] holds the last good image
//! for each window on the consuming side.

pub mod gallery;
pub mod runner;
pub mod types;

pub use gallery::CaptureGallery;
pub use runner::CaptureScheduler;
pub use types::{
    CaptureOutcome, CaptureUpdate, CapturedImage, RefreshState, SchedulerConfig, VisibilityMode,
};
