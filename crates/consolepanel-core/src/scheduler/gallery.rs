use std::collections::HashMap;

use crate::scheduler::types::{CaptureOutcome, CaptureUpdate, CapturedImage};

/// Last good image per window.
///
/// A failed capture leaves the previous image in place; hiding a window
/// releases its image.
#[derive(Debug, Default)]
pub struct CaptureGallery {
    images: HashMap<String, CapturedImage>,
    failures: HashMap<String, u32>,
}

impl CaptureGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a settled capture. Returns true when a new image was stored.
    pub fn apply(&mut self, update: &CaptureUpdate) -> bool {
        match &update.outcome {
            CaptureOutcome::Image(image) => {
                self.images.insert(update.handle.clone(), image.clone());
                self.failures.remove(&update.handle);
                true
            }
            CaptureOutcome::Failed(_) => {
                *self.failures.entry(update.handle.clone()).or_default() += 1;
                false
            }
        }
    }

    pub fn get(&self, handle: &str) -> Option<&CapturedImage> {
        self.images.get(handle)
    }

    /// Failed captures since the last good one.
    pub fn consecutive_failures(&self, handle: &str) -> u32 {
        self.failures.get(handle).copied().unwrap_or_default()
    }

    pub fn release(&mut self, handle: &str) -> Option<CapturedImage> {
        self.failures.remove(handle);
        self.images.remove(handle)
    }

    pub fn retain(&mut self, keep: &[String]) {
        self.images.retain(|h, _| keep.contains(h));
        self.failures.retain(|h, _| keep.contains(h));
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
